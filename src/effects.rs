use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Time-bounded modifiers granted by power-ups.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Walls and the snake's own body stop being fatal.
    Invincible,
    /// Food points are doubled. Power-up bonuses are not.
    DoublePoints,
    /// The tick interval is doubled.
    Freeze,
    /// The tick interval is halved.
    Speed,
}

impl EffectKind {
    pub const ALL: [Self; 4] = [
        Self::Invincible,
        Self::DoublePoints,
        Self::Freeze,
        Self::Speed,
    ];

    /// How long the effect lasts once picked up.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::Invincible => Duration::from_secs(5),
            Self::DoublePoints => Duration::from_secs(10),
            Self::Freeze => Duration::from_secs(5),
            Self::Speed => Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Invincible => "Invincible",
            Self::DoublePoints => "2x Points",
            Self::Freeze => "Freeze",
            Self::Speed => "Speed",
        }
    }
}

/// Active effects keyed by kind, at most one entry each.
///
/// Expiry is compared against the caller's clock on every query, so no
/// timer runs per effect.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    expiries: HashMap<EffectKind, Instant>,
}

impl EffectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `kind` for `duration` from `now`, replacing any earlier expiry.
    pub fn activate(&mut self, kind: EffectKind, duration: Duration, now: Instant) {
        self.expiries.insert(kind, now + duration);
    }

    #[must_use]
    pub fn is_active(&self, kind: EffectKind, now: Instant) -> bool {
        self.expiries.get(&kind).is_some_and(|expiry| *expiry > now)
    }

    /// Time left on `kind`, or `None` when it is not active.
    #[must_use]
    pub fn remaining(&self, kind: EffectKind, now: Instant) -> Option<Duration> {
        self.expiries
            .get(&kind)
            .and_then(|expiry| expiry.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }

    /// Drops expired entries and returns their kinds in a stable order.
    pub fn tick_expire(&mut self, now: Instant) -> Vec<EffectKind> {
        let mut expired: Vec<EffectKind> = self
            .expiries
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(kind, _)| *kind)
            .collect();
        expired.sort();

        for kind in &expired {
            self.expiries.remove(kind);
        }
        expired
    }

    /// Active effects with their remaining time, ordered by kind.
    #[must_use]
    pub fn active(&self, now: Instant) -> Vec<(EffectKind, Duration)> {
        EffectKind::ALL
            .iter()
            .filter_map(|kind| self.remaining(*kind, now).map(|left| (*kind, left)))
            .collect()
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{EffectKind, EffectRegistry};

    #[test]
    fn effect_is_active_until_expiry() {
        let start = Instant::now();
        let mut effects = EffectRegistry::new();
        effects.activate(EffectKind::Freeze, Duration::from_millis(500), start);

        assert!(effects.is_active(EffectKind::Freeze, start));
        assert!(effects.is_active(EffectKind::Freeze, start + Duration::from_millis(499)));
        assert!(!effects.is_active(EffectKind::Freeze, start + Duration::from_millis(500)));
        assert!(!effects.is_active(EffectKind::Speed, start));
    }

    #[test]
    fn reactivation_refreshes_instead_of_stacking() {
        let start = Instant::now();
        let mut effects = EffectRegistry::new();
        effects.activate(EffectKind::DoublePoints, Duration::from_secs(10), start);

        let later = start + Duration::from_secs(8);
        effects.activate(EffectKind::DoublePoints, Duration::from_secs(10), later);

        assert_eq!(
            effects.remaining(EffectKind::DoublePoints, later),
            Some(Duration::from_secs(10))
        );
        assert!(!effects.is_active(EffectKind::DoublePoints, later + Duration::from_secs(10)));
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn tick_expire_prunes_only_expired_entries() {
        let start = Instant::now();
        let mut effects = EffectRegistry::new();
        effects.activate(EffectKind::Invincible, Duration::from_secs(1), start);
        effects.activate(EffectKind::Speed, Duration::from_secs(3), start);

        let expired = effects.tick_expire(start + Duration::from_secs(2));

        assert_eq!(expired, vec![EffectKind::Invincible]);
        assert_eq!(effects.len(), 1);
        assert!(effects.is_active(EffectKind::Speed, start + Duration::from_secs(2)));
    }

    #[test]
    fn active_lists_live_effects_in_kind_order() {
        let start = Instant::now();
        let mut effects = EffectRegistry::new();
        effects.activate(EffectKind::Speed, Duration::from_secs(2), start);
        effects.activate(EffectKind::Invincible, Duration::from_secs(4), start);

        let kinds: Vec<EffectKind> = effects
            .active(start + Duration::from_secs(1))
            .into_iter()
            .map(|(kind, _)| kind)
            .collect();

        assert_eq!(kinds, vec![EffectKind::Invincible, EffectKind::Speed]);
    }
}
