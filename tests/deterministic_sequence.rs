use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snake_arcade::config::{GameConfig, Variant};
use snake_arcade::effects::EffectKind;
use snake_arcade::feedback::{Feedback, NullSink};
use snake_arcade::food::{Food, PowerUp};
use snake_arcade::game::{DeathReason, GameState, GameStatus};
use snake_arcade::input::{Direction, GameInput};
use snake_arcade::leaderboard::{MemoryStore, ScoreGateway, SubmitOutcome};
use snake_arcade::snake::{Position, Snake};

fn classic_state() -> GameState {
    GameState::new_with_seed(GameConfig::preset(Variant::Classic), 7)
}

#[test]
fn eating_scores_grows_and_replaces_food() {
    let now = Instant::now();
    let mut state = classic_state();
    state.snake = Snake::new(Position::new(10, 10), Direction::Right);
    state.foods = vec![Food::normal(900, Position::new(11, 10))];

    state.tick(now, &mut NullSink);

    assert_eq!(state.status, GameStatus::Running);
    assert_eq!(state.score, 10);
    assert_eq!(state.snake.len(), 2);
    assert_eq!(state.snake.head(), Position::new(11, 10));
    assert_eq!(state.foods.len(), 1);
    assert!(!state.snake.occupies(state.foods[0].position));
}

#[test]
fn reversal_into_the_body_is_rejected() {
    let now = Instant::now();
    let mut state = classic_state();
    state.foods.clear();
    state.snake = Snake::from_segments(
        (0..5).map(|i| Position::new(10 - i, 10)).collect(),
        Direction::Right,
    );

    state.apply_input(GameInput::Direction(Direction::Left));
    assert_eq!(state.pending_direction(), None);

    state.tick(now, &mut NullSink);

    assert_eq!(state.status, GameStatus::Running);
    assert_eq!(state.snake.direction(), Direction::Right);
    assert_eq!(state.snake.head(), Position::new(11, 10));
}

#[test]
fn wall_crash_submits_the_score_once() {
    let now = Instant::now();
    let mut state = classic_state();
    state.foods.clear();
    state.snake = Snake::new(Position::new(19, 10), Direction::Right);
    state.score = 70;

    let mut events: Vec<Feedback> = Vec::new();
    state.tick(now, &mut events);

    assert!(state.is_over());
    assert_eq!(state.death_reason, Some(DeathReason::WallCollision));
    assert_eq!(state.score, 70);
    let final_scores: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Feedback::GameOver { final_score } => Some(*final_score),
            _ => None,
        })
        .collect();
    assert_eq!(final_scores, vec![70]);

    let mut gateway = ScoreGateway::new(MemoryStore::new());
    assert_eq!(
        gateway.submit("ana", state.score, Utc::now()).expect("submit should work"),
        SubmitOutcome::Saved
    );
    assert_eq!(
        gateway.submit("ana", state.score, Utc::now()).expect("submit should work"),
        SubmitOutcome::AlreadySubmitted
    );
    let records = gateway.query_all().expect("read should work");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].score, 70);

    // Further ticks change nothing.
    state.tick(now + Duration::from_secs(1), &mut events);
    assert_eq!(state.snake.head(), Position::new(19, 10));
}

#[test]
fn double_points_doubles_food_but_not_the_power_up_bonus() {
    let now = Instant::now();
    let mut state = classic_state();
    state.snake = Snake::new(Position::new(10, 10), Direction::Right);
    state.foods = vec![Food::normal(900, Position::new(11, 10))];
    state.power_ups = vec![PowerUp {
        id: 901,
        position: Position::new(12, 10),
        kind: EffectKind::Freeze,
    }];
    state
        .effects
        .activate(EffectKind::DoublePoints, Duration::from_secs(10), now);

    state.tick(now, &mut NullSink);
    assert_eq!(state.score, 20);

    state.tick(now + Duration::from_millis(150), &mut NullSink);
    assert_eq!(state.score, 70);
    assert!(state.power_ups.is_empty());
    assert!(state.effects.is_active(EffectKind::Freeze, now + Duration::from_millis(150)));
}

#[test]
fn random_play_keeps_invariants() {
    let start = Instant::now();
    let mut inputs = StdRng::seed_from_u64(99);

    for seed in 0..20 {
        let mut state = GameState::new_with_seed(GameConfig::preset(Variant::Mega), seed);
        let bounds = state.bounds();
        let mut power_ups_taken = 0_u32;
        let mut now = start;

        for _ in 0..500 {
            if state.is_over() {
                break;
            }
            if inputs.gen_bool(0.3) {
                let direction = [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
                    [inputs.gen_range(0..4)];
                state.apply_input(GameInput::Direction(direction));
            }

            let before = state.snake.direction();
            let mut events: Vec<Feedback> = Vec::new();
            now += state.effective_interval(now);
            state.tick(now, &mut events);
            power_ups_taken += events
                .iter()
                .filter(|event| matches!(event, Feedback::PowerUp { .. }))
                .count() as u32;

            assert_ne!(state.snake.direction(), before.opposite());
            assert!(state.foods.len() <= state.config().food_target_count);
            assert!(state.power_ups.len() <= state.config().power_up_cap);
            assert_eq!(
                state.snake.len() as u32 + state.growth_queue,
                1 + state.foods_eaten + power_ups_taken
            );
            if !state.is_over() {
                assert!(state.snake.head().is_within_bounds(bounds));
            }
        }

        let score = state.score;
        state.tick(now + Duration::from_secs(1), &mut NullSink);
        assert_eq!(state.score, score);
    }
}
