use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{GameConfig, GridSize, POWER_UP_BONUS_POINTS};
use crate::effects::{EffectKind, EffectRegistry};
use crate::feedback::{Feedback, FeedbackSink};
use crate::food::{Food, PowerUp, PowerUpRoll, Spawner};
use crate::input::{
    Direction, DirectionInput, DirectionResolver, DirectionSlot, GameInput, propose,
};
use crate::snake::{Position, Snake};

/// Current high-level gameplay state.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GameStatus {
    Running,
    Paused,
    GameOver,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DeathReason {
    WallCollision,
    SelfCollision,
    /// The snake filled every cell.
    BoardFull,
}

/// Read-only view of the state after a tick, for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub bounds: GridSize,
    pub snake: Vec<Position>,
    pub direction: Direction,
    pub foods: Vec<Food>,
    pub power_ups: Vec<PowerUp>,
    pub score: u32,
    pub combo: u32,
    pub effects: Vec<(EffectKind, Duration)>,
    pub game_over: bool,
    pub is_paused: bool,
    pub snake_length: usize,
    pub death_reason: Option<DeathReason>,
    pub tick_interval: Duration,
}

/// Complete mutable game state for one session.
#[derive(Debug, Clone)]
pub struct GameState {
    pub snake: Snake,
    pub foods: Vec<Food>,
    pub power_ups: Vec<PowerUp>,
    pub score: u32,
    pub combo: u32,
    /// Ticks left on which the tail is kept.
    pub growth_queue: u32,
    pub effects: EffectRegistry,
    pub status: GameStatus,
    pub death_reason: Option<DeathReason>,
    pub tick_count: u64,
    pub foods_eaten: u32,
    pending: DirectionSlot,
    resolver: DirectionResolver,
    spawner: Spawner,
    config: GameConfig,
    rng: StdRng,
}

impl GameState {
    /// Creates a running session seeded from OS entropy.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Creates a deterministic state for tests and reproducible simulations.
    #[must_use]
    pub fn new_with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        let bounds = config.bounds();
        let start = Position {
            x: i32::from(bounds.width / 2),
            y: i32::from(bounds.height / 2),
        };

        let mut state = Self {
            snake: Snake::new(start, Direction::Right),
            foods: Vec::new(),
            power_ups: Vec::new(),
            score: 0,
            combo: 0,
            growth_queue: 0,
            effects: EffectRegistry::new(),
            status: GameStatus::Running,
            death_reason: None,
            tick_count: 0,
            foods_eaten: 0,
            pending: DirectionSlot::new(),
            resolver: DirectionResolver::new(config.control_scheme, config.swipe_min_distance),
            spawner: Spawner::new(),
            config,
            rng,
        };
        state.replenish_food();
        state
    }

    #[must_use]
    pub fn bounds(&self) -> GridSize {
        self.config.bounds()
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Handle for writing steering requests from another thread.
    #[must_use]
    pub fn direction_slot(&self) -> DirectionSlot {
        self.pending.clone()
    }

    /// Direction waiting for the next tick, if any.
    #[must_use]
    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending.peek()
    }

    /// Resolves raw steering input and queues it for the next tick.
    ///
    /// Returns `false` when the game is not running or the input was rejected.
    pub fn steer(&mut self, input: DirectionInput) -> bool {
        if self.status != GameStatus::Running {
            return false;
        }

        match self.resolver.resolve(self.snake.direction(), input) {
            Some(direction) => {
                self.pending.offer(direction);
                true
            }
            None => false,
        }
    }

    /// Applies one external input event.
    pub fn apply_input(&mut self, input: GameInput) {
        match input {
            GameInput::Direction(direction) => {
                let _ = self.steer(DirectionInput::Pressed(direction));
            }
            GameInput::Pause => self.toggle_pause(),
            GameInput::ToggleMute | GameInput::NextSkin | GameInput::Quit | GameInput::Confirm => {}
        }
    }

    /// Flips between running and paused. No effect once the game is over.
    pub fn toggle_pause(&mut self) {
        self.status = match self.status {
            GameStatus::Running => GameStatus::Paused,
            GameStatus::Paused => GameStatus::Running,
            GameStatus::GameOver => GameStatus::GameOver,
        };
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    /// Interval until the next tick: speed-up from food eaten, then
    /// doubled by `freeze` and halved by `speed`.
    #[must_use]
    pub fn effective_interval(&self, now: Instant) -> Duration {
        let speedup = self
            .config
            .speedup_per_food_ms
            .saturating_mul(u64::from(self.foods_eaten));
        let base_ms = self
            .config
            .tick_interval_ms
            .saturating_sub(speedup)
            .max(self.config.min_tick_interval_ms.min(self.config.tick_interval_ms));

        let mut interval = Duration::from_millis(base_ms);
        if self.effects.is_active(EffectKind::Freeze, now) {
            interval *= 2;
        }
        if self.effects.is_active(EffectKind::Speed, now) {
            interval /= 2;
        }
        interval
    }

    /// Advances simulation by one gameplay tick.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn FeedbackSink) {
        if self.status != GameStatus::Running {
            return;
        }

        self.tick_count += 1;
        for kind in self.effects.tick_expire(now) {
            tracing::debug!(?kind, "effect expired");
            sink.emit(Feedback::EffectExpired(kind));
        }

        self.commit_pending_direction(sink);

        let invincible = self.effects.is_active(EffectKind::Invincible, now);
        let next_head = self.snake.next_head_position();

        if !next_head.is_within_bounds(self.bounds()) {
            if invincible {
                // Pinned against the wall until the player turns away.
                self.combo = 0;
                self.roll_power_up();
                return;
            }
            let head = self.snake.head();
            self.end_game(DeathReason::WallCollision, head, sink);
            return;
        }

        if !invincible
            && self.snake.len() >= self.config.self_collision_min_length
            && self.snake.occupies(next_head)
        {
            self.end_game(DeathReason::SelfCollision, next_head, sink);
            return;
        }

        let ate_food = self.consume_food(next_head, now, sink);
        self.consume_power_up(next_head, now, sink);

        let keep_tail = self.growth_queue > 0;
        if keep_tail {
            self.growth_queue -= 1;
        }
        self.snake.advance(next_head, keep_tail);

        if self.snake.distinct_cells() >= self.bounds().total_cells() {
            self.end_game(DeathReason::BoardFull, next_head, sink);
            return;
        }

        if !ate_food {
            self.combo = 0;
        }
        // Also tops up batches that came back short on a crowded board.
        if self.foods.len() < self.config.food_low_water_mark {
            self.replenish_food();
        }

        self.roll_power_up();
    }

    /// Captures what a renderer needs after a tick.
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        GameSnapshot {
            bounds: self.bounds(),
            snake: self.snake.segments().copied().collect(),
            direction: self.snake.direction(),
            foods: self.foods.clone(),
            power_ups: self.power_ups.clone(),
            score: self.score,
            combo: self.combo,
            effects: self.effects.active(now),
            game_over: self.status == GameStatus::GameOver,
            is_paused: self.status == GameStatus::Paused,
            snake_length: self.snake.len(),
            death_reason: self.death_reason,
            tick_interval: self.effective_interval(now),
        }
    }

    fn commit_pending_direction(&mut self, sink: &mut dyn FeedbackSink) {
        let current = self.snake.direction();
        let Some(next) = self.pending.take().and_then(|next| propose(current, next)) else {
            return;
        };

        if next != current {
            self.snake.turn(next);
            sink.emit(Feedback::Turned);
        }
    }

    fn consume_food(&mut self, at: Position, now: Instant, sink: &mut dyn FeedbackSink) -> bool {
        let Some(index) = self.foods.iter().position(|food| food.position == at) else {
            return false;
        };

        let food = self.foods.swap_remove(index);
        let multiplier = if self.effects.is_active(EffectKind::DoublePoints, now) {
            2
        } else {
            1
        };

        self.growth_queue += 1;
        self.score += food.points() * multiplier;
        self.combo += 1;
        self.foods_eaten += 1;

        tracing::debug!(
            x = at.x,
            y = at.y,
            kind = ?food.kind,
            score = self.score,
            combo = self.combo,
            "food eaten"
        );
        sink.emit(Feedback::AteFood {
            position: at,
            kind: food.kind,
            combo: self.combo,
        });
        true
    }

    fn consume_power_up(&mut self, at: Position, now: Instant, sink: &mut dyn FeedbackSink) {
        let Some(index) = self.power_ups.iter().position(|power_up| power_up.position == at)
        else {
            return;
        };

        let power_up = self.power_ups.swap_remove(index);
        self.growth_queue += 1;
        self.score += POWER_UP_BONUS_POINTS;
        self.effects
            .activate(power_up.kind, power_up.kind.duration(), now);

        tracing::debug!(kind = ?power_up.kind, score = self.score, "power-up collected");
        sink.emit(Feedback::PowerUp {
            position: at,
            kind: power_up.kind,
        });
    }

    fn replenish_food(&mut self) {
        let missing = self.config.food_target_count.saturating_sub(self.foods.len());
        if missing == 0 {
            return;
        }

        let bounds = self.bounds();
        let snake = &self.snake;
        let foods = &self.foods;
        let power_ups = &self.power_ups;
        let batch = self.spawner.spawn_food(
            &mut self.rng,
            bounds,
            missing,
            self.config.special_food_chance,
            |cell| {
                snake.occupies(cell)
                    || foods.iter().any(|food| food.position == cell)
                    || power_ups.iter().any(|power_up| power_up.position == cell)
            },
        );
        self.foods.extend(batch);
    }

    fn roll_power_up(&mut self) {
        let bounds = self.bounds();
        let snake = &self.snake;
        let foods = &self.foods;
        let power_ups = &self.power_ups;
        let roll = PowerUpRoll {
            kinds: &self.config.power_up_kinds,
            live: power_ups.len(),
            cap: self.config.power_up_cap,
            chance: self.config.power_up_spawn_chance,
        };

        let spawned = self
            .spawner
            .maybe_spawn_power_up(&mut self.rng, bounds, roll, |cell| {
                snake.occupies(cell)
                    || foods.iter().any(|food| food.position == cell)
                    || power_ups.iter().any(|power_up| power_up.position == cell)
            });

        if let Some(power_up) = spawned {
            tracing::debug!(
                kind = ?power_up.kind,
                x = power_up.position.x,
                y = power_up.position.y,
                "power-up spawned"
            );
            self.power_ups.push(power_up);
        }
    }

    fn end_game(&mut self, reason: DeathReason, at: Position, sink: &mut dyn FeedbackSink) {
        self.status = GameStatus::GameOver;
        self.death_reason = Some(reason);
        self.combo = 0;

        tracing::info!(?reason, score = self.score, length = self.snake.len(), "game over");
        sink.emit(Feedback::Collision {
            position: at,
            reason,
        });
        sink.emit(Feedback::GameOver {
            final_score: self.score,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{DeathReason, GameState, GameStatus};
    use crate::config::GameConfig;
    use crate::effects::EffectKind;
    use crate::feedback::{Feedback, NullSink};
    use crate::food::{Food, PowerUp};
    use crate::input::{Direction, DirectionInput, GameInput};
    use crate::snake::{Position, Snake};

    fn quiet_config(grid: u16) -> GameConfig {
        GameConfig::default()
            .with_grid_size(grid)
            .with_food(1, 1)
            .with_power_ups(Vec::new(), 0, 0.0)
    }

    fn straight_snake(head: Position, length: i32, direction: Direction) -> Snake {
        let (dx, dy) = direction.delta();
        let segments = (0..length)
            .map(|i| Position::new(head.x - dx * i, head.y - dy * i))
            .collect();
        Snake::from_segments(segments, direction)
    }

    #[test]
    fn snake_grows_on_the_tick_it_eats() {
        let mut state = GameState::new_with_seed(quiet_config(10), 1);
        state.snake = Snake::new(Position::new(1, 1), Direction::Right);
        state.foods = vec![Food::normal(900, Position::new(2, 1))];

        state.tick(Instant::now(), &mut NullSink);

        assert_eq!(state.snake.len(), 2);
        assert_eq!(state.growth_queue, 0);
        assert_eq!(state.foods.len(), 1);
        assert_ne!(state.foods[0].position, Position::new(2, 1));
    }

    #[test]
    fn wall_collision_sets_game_over_and_keeps_score() {
        let mut state = GameState::new_with_seed(quiet_config(5), 2);
        state.snake = Snake::new(Position::new(4, 1), Direction::Right);
        state.score = 30;
        let mut events = Vec::new();

        state.tick(Instant::now(), &mut events);

        assert_eq!(state.status, GameStatus::GameOver);
        assert_eq!(state.death_reason, Some(DeathReason::WallCollision));
        assert_eq!(state.snake.head(), Position::new(4, 1));
        assert!(events.contains(&Feedback::GameOver { final_score: 30 }));
    }

    #[test]
    fn self_collision_sets_game_over() {
        let mut state = GameState::new_with_seed(quiet_config(6), 3);
        state.snake = Snake::from_segments(
            vec![
                Position::new(2, 2),
                Position::new(1, 2),
                Position::new(1, 3),
                Position::new(2, 3),
                Position::new(3, 3),
                Position::new(3, 2),
            ],
            Direction::Down,
        );
        state.foods.clear();

        state.tick(Instant::now(), &mut NullSink);

        assert_eq!(state.death_reason, Some(DeathReason::SelfCollision));
    }

    #[test]
    fn short_snakes_skip_self_collision() {
        let config = quiet_config(6).with_self_collision_min_length(4);
        let mut state = GameState::new_with_seed(config, 4);
        state.snake = Snake::from_segments(
            vec![Position::new(2, 2), Position::new(2, 3), Position::new(3, 3)],
            Direction::Down,
        );
        state.foods.clear();

        state.tick(Instant::now(), &mut NullSink);

        assert_eq!(state.status, GameStatus::Running);
        assert_eq!(state.snake.head(), Position::new(2, 3));
    }

    #[test]
    fn pending_reversal_is_ignored_at_commit() {
        let mut state = GameState::new_with_seed(quiet_config(20), 5);
        state.snake = straight_snake(Position::new(10, 10), 5, Direction::Right);
        state.foods.clear();

        state.direction_slot().offer(Direction::Left);
        state.tick(Instant::now(), &mut NullSink);

        assert_eq!(state.snake.direction(), Direction::Right);
        assert_eq!(state.snake.head(), Position::new(11, 10));
    }

    #[test]
    fn double_tap_cannot_reverse_within_one_tick() {
        let mut state = GameState::new_with_seed(quiet_config(20), 6);
        state.snake = straight_snake(Position::new(10, 10), 5, Direction::Right);
        state.foods.clear();

        // Up is accepted, then Left is judged against the applied Right.
        assert!(state.steer(DirectionInput::Pressed(Direction::Up)));
        assert!(!state.steer(DirectionInput::Pressed(Direction::Left)));
        state.tick(Instant::now(), &mut NullSink);

        assert_eq!(state.snake.head(), Position::new(10, 9));
        assert_eq!(state.status, GameStatus::Running);
    }

    #[test]
    fn steering_is_ignored_while_paused() {
        let mut state = GameState::new_with_seed(quiet_config(20), 7);
        state.apply_input(GameInput::Pause);

        assert!(!state.steer(DirectionInput::Pressed(Direction::Up)));
        assert_eq!(state.pending_direction(), None);

        let head = state.snake.head();
        state.tick(Instant::now(), &mut NullSink);
        assert_eq!(state.snake.head(), head);

        state.apply_input(GameInput::Pause);
        assert_eq!(state.status, GameStatus::Running);
    }

    #[test]
    fn invincible_snake_is_held_at_the_wall() {
        let now = Instant::now();
        let mut state = GameState::new_with_seed(quiet_config(5), 8);
        state.snake = straight_snake(Position::new(4, 2), 2, Direction::Right);
        state.foods.clear();
        state.combo = 3;
        state
            .effects
            .activate(EffectKind::Invincible, Duration::from_secs(5), now);

        state.tick(now, &mut NullSink);

        assert_eq!(state.status, GameStatus::Running);
        assert_eq!(state.snake.head(), Position::new(4, 2));
        assert_eq!(state.combo, 0);

        state.direction_slot().offer(Direction::Down);
        state.tick(now, &mut NullSink);
        assert_eq!(state.snake.head(), Position::new(4, 3));
    }

    #[test]
    fn invincible_snake_passes_through_itself() {
        let now = Instant::now();
        let mut state = GameState::new_with_seed(quiet_config(6), 9);
        state.snake = Snake::from_segments(
            vec![
                Position::new(2, 2),
                Position::new(1, 2),
                Position::new(1, 3),
                Position::new(2, 3),
                Position::new(3, 3),
            ],
            Direction::Down,
        );
        state.foods.clear();
        state
            .effects
            .activate(EffectKind::Invincible, Duration::from_secs(5), now);

        state.tick(now, &mut NullSink);

        assert_eq!(state.status, GameStatus::Running);
        assert_eq!(state.snake.head(), Position::new(2, 3));
        assert_eq!(state.snake.len(), 5);
    }

    #[test]
    fn combo_counts_consecutive_eating_ticks() {
        let mut state = GameState::new_with_seed(quiet_config(20).with_food(3, 0), 10);
        state.snake = Snake::new(Position::new(5, 5), Direction::Right);
        state.foods = vec![
            Food::normal(901, Position::new(6, 5)),
            Food::normal(902, Position::new(7, 5)),
        ];
        let now = Instant::now();

        state.tick(now, &mut NullSink);
        state.tick(now, &mut NullSink);
        assert_eq!(state.combo, 2);

        state.tick(now, &mut NullSink);
        assert_eq!(state.combo, 0);
    }

    #[test]
    fn power_up_grants_flat_bonus_and_effect() {
        let now = Instant::now();
        let mut state = GameState::new_with_seed(quiet_config(20), 11);
        state.snake = Snake::new(Position::new(5, 5), Direction::Right);
        state.foods.clear();
        state.power_ups = vec![PowerUp {
            id: 77,
            position: Position::new(6, 5),
            kind: EffectKind::Freeze,
        }];
        let base = state.effective_interval(now);

        state.tick(now, &mut NullSink);

        assert_eq!(state.score, 50);
        assert_eq!(state.snake.len(), 2);
        assert!(state.power_ups.is_empty());
        assert!(state.effects.is_active(EffectKind::Freeze, now));
        assert_eq!(state.effective_interval(now), base * 2);
    }

    #[test]
    fn speed_and_freeze_cancel_out() {
        let now = Instant::now();
        let mut state = GameState::new_with_seed(quiet_config(20), 12);
        let base = state.effective_interval(now);

        state.effects.activate(EffectKind::Speed, Duration::from_secs(1), now);
        assert_eq!(state.effective_interval(now), base / 2);

        state.effects.activate(EffectKind::Freeze, Duration::from_secs(1), now);
        assert_eq!(state.effective_interval(now), base);
    }

    #[test]
    fn eating_speeds_up_down_to_the_floor() {
        let now = Instant::now();
        let mut state = GameState::new_with_seed(GameConfig::default(), 13);
        assert_eq!(state.effective_interval(now), Duration::from_millis(150));

        state.foods_eaten = 10;
        assert_eq!(state.effective_interval(now), Duration::from_millis(130));

        state.foods_eaten = 1_000;
        assert_eq!(state.effective_interval(now), Duration::from_millis(50));
    }

    #[test]
    fn filling_the_board_ends_the_game() {
        let mut state = GameState::new_with_seed(quiet_config(5), 14);
        let corner = Position::new(0, 0);
        let head = Position::new(1, 0);

        // Every cell but the corner, head next to it.
        let mut segments = vec![head];
        for y in 0..5 {
            for x in 0..5 {
                let cell = Position::new(x, y);
                if cell != corner && cell != head {
                    segments.push(cell);
                }
            }
        }
        state.snake = Snake::from_segments(segments, Direction::Left);
        state.foods = vec![Food::normal(903, corner)];

        state.tick(Instant::now(), &mut NullSink);

        assert_eq!(state.status, GameStatus::GameOver);
        assert_eq!(state.death_reason, Some(DeathReason::BoardFull));
        assert_eq!(state.snake.len(), 25);
    }

    #[test]
    fn overlapping_snake_is_not_a_full_board() {
        let now = Instant::now();
        let mut state = GameState::new_with_seed(quiet_config(5), 15);
        // Folded onto itself while invincible: 25 segments, 3 cells.
        let mut segments = vec![Position::new(2, 2), Position::new(1, 2)];
        segments.extend(std::iter::repeat_n(Position::new(0, 2), 23));
        state.snake = Snake::from_segments(segments, Direction::Right);
        state.foods.clear();
        state
            .effects
            .activate(EffectKind::Invincible, Duration::from_secs(5), now);

        state.tick(now, &mut NullSink);

        assert_eq!(state.status, GameStatus::Running);
        assert_eq!(state.death_reason, None);
        assert_eq!(state.snake.head(), Position::new(3, 2));
    }

    #[test]
    fn short_food_batches_are_topped_up_on_later_ticks() {
        let mut state = GameState::new_with_seed(quiet_config(20).with_food(3, 2), 16);
        state.snake = Snake::new(Position::new(5, 5), Direction::Right);
        state.foods.clear();

        state.tick(Instant::now(), &mut NullSink);

        assert_eq!(state.status, GameStatus::Running);
        assert_eq!(state.foods.len(), 3);
        assert!(state.foods.iter().all(|food| !state.snake.occupies(food.position)));
    }
}
