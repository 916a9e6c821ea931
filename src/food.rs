use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::{GridSize, NORMAL_FOOD_POINTS, SPAWN_ATTEMPTS, SPECIAL_FOOD_POINTS};
use crate::effects::EffectKind;
use crate::snake::Position;

/// Food type and associated metadata.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FoodKind {
    Normal,
    Special,
}

/// Food entity currently active on the board.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Food {
    pub id: u64,
    pub position: Position,
    pub kind: FoodKind,
}

impl Food {
    /// Creates a normal food at `position`.
    #[must_use]
    pub fn normal(id: u64, position: Position) -> Self {
        Self {
            id,
            position,
            kind: FoodKind::Normal,
        }
    }

    /// Creates a special food at `position`.
    #[must_use]
    pub fn special(id: u64, position: Position) -> Self {
        Self {
            id,
            position,
            kind: FoodKind::Special,
        }
    }

    /// Returns the score value granted when eaten, before multipliers.
    #[must_use]
    pub fn points(self) -> u32 {
        match self.kind {
            FoodKind::Normal => NORMAL_FOOD_POINTS,
            FoodKind::Special => SPECIAL_FOOD_POINTS,
        }
    }
}

/// A pickup that grants a flat bonus and starts an effect.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PowerUp {
    pub id: u64,
    pub position: Position,
    pub kind: EffectKind,
}

/// Power-up spawn parameters for one roll.
#[derive(Debug, Clone, Copy)]
pub struct PowerUpRoll<'a> {
    pub kinds: &'a [EffectKind],
    pub live: usize,
    pub cap: usize,
    pub chance: f64,
}

/// Places food and power-ups on free cells and hands out entity ids.
#[derive(Debug, Clone, Default)]
pub struct Spawner {
    next_id: u64,
}

impl Spawner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Generates up to `count` food items on cells where `is_occupied` is false.
    ///
    /// Gives up after [`SPAWN_ATTEMPTS`] samples and returns the partial batch.
    pub fn spawn_food<R, F>(
        &mut self,
        rng: &mut R,
        bounds: GridSize,
        count: usize,
        special_chance: f64,
        is_occupied: F,
    ) -> Vec<Food>
    where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        let mut batch: Vec<Food> = Vec::with_capacity(count);
        let mut attempts = 0;

        while batch.len() < count && attempts < SPAWN_ATTEMPTS {
            attempts += 1;
            let position = random_cell(rng, bounds);
            if is_occupied(position) || batch.iter().any(|food| food.position == position) {
                continue;
            }

            let id = self.allocate_id();
            let food = if rng.gen_bool(special_chance) {
                Food::special(id, position)
            } else {
                Food::normal(id, position)
            };
            batch.push(food);
        }

        if batch.len() < count {
            tracing::debug!(
                requested = count,
                placed = batch.len(),
                "food spawn ran out of attempts"
            );
        }
        batch
    }

    /// Rolls for one power-up. Returns `None` when the cap is reached, the
    /// roll fails, or no free cell is found within the attempt budget.
    pub fn maybe_spawn_power_up<R, F>(
        &mut self,
        rng: &mut R,
        bounds: GridSize,
        roll: PowerUpRoll<'_>,
        is_occupied: F,
    ) -> Option<PowerUp>
    where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        if roll.live >= roll.cap || roll.kinds.is_empty() || !rng.gen_bool(roll.chance) {
            return None;
        }

        let kind = *roll.kinds.choose(rng)?;
        let position = sample_free_cell(rng, bounds, is_occupied)?;

        Some(PowerUp {
            id: self.allocate_id(),
            position,
            kind,
        })
    }
}

fn random_cell<R: Rng + ?Sized>(rng: &mut R, bounds: GridSize) -> Position {
    Position {
        x: rng.gen_range(0..i32::from(bounds.width)),
        y: rng.gen_range(0..i32::from(bounds.height)),
    }
}

/// Samples random cells until one is free, within the attempt budget.
pub fn sample_free_cell<R, F>(rng: &mut R, bounds: GridSize, is_occupied: F) -> Option<Position>
where
    R: Rng + ?Sized,
    F: Fn(Position) -> bool,
{
    (0..SPAWN_ATTEMPTS)
        .map(|_| random_cell(rng, bounds))
        .find(|position| !is_occupied(*position))
}
