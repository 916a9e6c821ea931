use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::EffectKind;
use crate::input::ControlScheme;

/// Logical grid dimensions passed through the game as a named type.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u16,
    pub height: u16,
}

impl GridSize {
    /// Returns a square grid of side `side`.
    #[must_use]
    pub fn square(side: u16) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    /// Returns the total number of cells in the grid.
    #[must_use]
    pub fn total_cells(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// Points for a normal food item.
pub const NORMAL_FOOD_POINTS: u32 = 10;

/// Points for a special food item.
pub const SPECIAL_FOOD_POINTS: u32 = 25;

/// Flat bonus for any power-up. Never multiplied.
pub const POWER_UP_BONUS_POINTS: u32 = 50;

/// Retry budget for one food batch or one power-up placement.
pub const SPAWN_ATTEMPTS: usize = 100;

/// Delay between the collision and leaving the play view.
pub const GAME_OVER_DISPLAY_DELAY: Duration = Duration::from_millis(1500);

/// Longest accepted player name, in characters.
pub const MAX_PLAYER_NAME_CHARS: usize = 20;

/// Rows shown on the post-game leaderboard.
pub const LEADERBOARD_TOP_ROWS: usize = 10;

/// Rows shown on the start menu.
pub const MENU_TOP_ROWS: usize = 5;

/// Built-in game variants. Each one is a preset of [`GameConfig`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// 20x20, one food, no power-ups, speeds up as you eat.
    #[default]
    Classic,
    /// 30x30, three food, one power-up at a time.
    Arcade,
    /// 40x40, five food, two power-ups at a time, eight-way pointer steering.
    Mega,
}

/// Everything that distinguishes one game variant from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_size: u16,
    /// Terminal columns drawn per grid cell.
    pub cell_width: u16,
    pub tick_interval_ms: u64,
    pub min_tick_interval_ms: u64,
    /// Base interval reduction per food eaten.
    pub speedup_per_food_ms: u64,
    pub food_target_count: usize,
    /// Replenish once live food drops below this.
    pub food_low_water_mark: usize,
    pub special_food_chance: f64,
    pub power_up_kinds: Vec<EffectKind>,
    pub power_up_cap: usize,
    pub power_up_spawn_chance: f64,
    /// Self-collision is ignored while the snake is shorter than this.
    pub self_collision_min_length: usize,
    pub control_scheme: ControlScheme,
    /// Minimum swipe length in grid cells.
    pub swipe_min_distance: f32,
    pub skin: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::preset(Variant::Classic)
    }
}

impl GameConfig {
    /// Returns the configuration for a built-in variant.
    #[must_use]
    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Classic => Self {
                grid_size: 20,
                cell_width: 2,
                tick_interval_ms: 150,
                min_tick_interval_ms: 50,
                speedup_per_food_ms: 2,
                food_target_count: 1,
                food_low_water_mark: 1,
                special_food_chance: 0.0,
                power_up_kinds: Vec::new(),
                power_up_cap: 0,
                power_up_spawn_chance: 0.0,
                self_collision_min_length: 4,
                control_scheme: ControlScheme::Swipe,
                swipe_min_distance: 2.0,
                skin: "classic".to_owned(),
            },
            Variant::Arcade => Self {
                grid_size: 30,
                cell_width: 2,
                tick_interval_ms: 120,
                min_tick_interval_ms: 60,
                speedup_per_food_ms: 0,
                food_target_count: 3,
                food_low_water_mark: 2,
                special_food_chance: 0.25,
                power_up_kinds: vec![
                    EffectKind::Invincible,
                    EffectKind::DoublePoints,
                    EffectKind::Freeze,
                ],
                power_up_cap: 1,
                power_up_spawn_chance: 0.01,
                self_collision_min_length: 4,
                control_scheme: ControlScheme::FollowFour,
                swipe_min_distance: 2.0,
                skin: "neon".to_owned(),
            },
            Variant::Mega => Self {
                grid_size: 40,
                cell_width: 1,
                tick_interval_ms: 100,
                min_tick_interval_ms: 50,
                speedup_per_food_ms: 0,
                food_target_count: 5,
                food_low_water_mark: 3,
                special_food_chance: 0.3,
                power_up_kinds: EffectKind::ALL.to_vec(),
                power_up_cap: 2,
                power_up_spawn_chance: 0.015,
                self_collision_min_length: 4,
                control_scheme: ControlScheme::FollowEight,
                swipe_min_distance: 2.0,
                skin: "dark".to_owned(),
            },
        }
    }

    /// Loads a JSON file of overrides on top of the `variant` preset.
    ///
    /// Fields missing from the file keep the preset value.
    pub fn load(path: &Path, variant: Variant) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut merged = serde_json::to_value(Self::preset(variant))?;
        let overrides: serde_json::Value = serde_json::from_str(&raw)?;
        if let (Some(base), serde_json::Value::Object(fields)) = (merged.as_object_mut(), overrides)
        {
            base.extend(fields);
        }

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_grid_size(mut self, side: u16) -> Self {
        self.grid_size = side;
        self
    }

    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn with_food(mut self, target_count: usize, low_water_mark: usize) -> Self {
        self.food_target_count = target_count;
        self.food_low_water_mark = low_water_mark;
        self
    }

    #[must_use]
    pub fn with_power_ups(mut self, kinds: Vec<EffectKind>, cap: usize, chance: f64) -> Self {
        self.power_up_kinds = kinds;
        self.power_up_cap = cap;
        self.power_up_spawn_chance = chance;
        self
    }

    #[must_use]
    pub fn with_self_collision_min_length(mut self, length: usize) -> Self {
        self.self_collision_min_length = length;
        self
    }

    #[must_use]
    pub fn with_control_scheme(mut self, scheme: ControlScheme) -> Self {
        self.control_scheme = scheme;
        self
    }

    #[must_use]
    pub fn with_skin(mut self, skin: impl Into<String>) -> Self {
        self.skin = skin.into();
        self
    }

    #[must_use]
    pub fn bounds(&self) -> GridSize {
        GridSize::square(self.grid_size)
    }

    /// Checks the ranges the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5..=100).contains(&self.grid_size) {
            return Err(ConfigError::Invalid(format!(
                "grid size must be between 5 and 100, got {}",
                self.grid_size
            )));
        }
        if self.cell_width == 0 {
            return Err(ConfigError::Invalid("cell width must be at least 1".into()));
        }
        if self.tick_interval_ms == 0 || self.min_tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick intervals must be positive".into()));
        }
        if self.food_target_count == 0 {
            return Err(ConfigError::Invalid("food target count must be at least 1".into()));
        }
        if self.food_low_water_mark > self.food_target_count {
            return Err(ConfigError::Invalid(format!(
                "food low-water mark {} exceeds target count {}",
                self.food_low_water_mark, self.food_target_count
            )));
        }
        for (name, chance) in [
            ("special food chance", self.special_food_chance),
            ("power-up spawn chance", self.power_up_spawn_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0.0 and 1.0, got {chance}"
                )));
            }
        }
        if self.power_up_cap > 0 && self.power_up_kinds.is_empty() {
            return Err(ConfigError::Invalid(
                "power-up cap is set but no power-up kinds are enabled".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
