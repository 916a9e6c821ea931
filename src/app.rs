use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::KeyCode;

use crate::config::{
    GAME_OVER_DISPLAY_DELAY, GameConfig, LEADERBOARD_TOP_ROWS, MAX_PLAYER_NAME_CHARS,
    MENU_TOP_ROWS,
};
use crate::feedback::Feedback;
use crate::game::{GameState, GameStatus};
use crate::input::{ControlScheme, DirectionInput, GameInput, InputEvent, game_input_for_key};
use crate::leaderboard::{
    LeaderboardStats, ScoreGateway, ScoreRecord, ScoreStore, SubmitOutcome, validate_player_name,
};
use crate::snake::Position;
use crate::theme::ThemeCatalog;

/// How long an eat or crash burst stays on screen.
pub const BURST_LIFETIME: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Screen {
    Menu,
    Playing,
    /// Collision visuals are showing; the leaderboard follows after a delay.
    GameOver { since: Instant },
    Leaderboard,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BurstKind {
    Eat,
    PowerUp,
    Crash,
}

/// Short-lived highlight around a grid cell.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Burst {
    pub position: Position,
    pub kind: BurstKind,
    pub started_at: Instant,
}

/// A leaderboard query result as the UI shows it.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardView {
    Empty,
    Loaded {
        top: Vec<ScoreRecord>,
        stats: LeaderboardStats,
    },
    Failed(String),
}

/// Where the play field sits on the terminal, for pointer input.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BoardGeometry {
    pub x: u16,
    pub y: u16,
    pub cell_width: u16,
}

impl BoardGeometry {
    /// Terminal cell to fractional grid coordinates (cell centres at .5).
    #[must_use]
    pub fn to_grid(self, column: u16, row: u16) -> (f32, f32) {
        let cell_width = f32::from(self.cell_width.max(1));
        let gx = (f32::from(column) - f32::from(self.x) + 0.5) / cell_width;
        let gy = f32::from(row) - f32::from(self.y) + 0.5;
        (gx, gy)
    }
}

/// Screen flow around the engine: menu, play, game over, leaderboard.
#[derive(Debug)]
pub struct App<S> {
    pub screen: Screen,
    pub player_name: String,
    pub config: GameConfig,
    pub themes: ThemeCatalog,
    pub game: GameState,
    pub gateway: ScoreGateway<S>,
    pub sound_enabled: bool,
    pub bursts: Vec<Burst>,
    pub menu_board: BoardView,
    pub results: BoardView,
    /// Last submission failure, shown as a retryable warning.
    pub submit_warning: Option<String>,
    pub board: Option<BoardGeometry>,
    last_tick: Instant,
    bell: bool,
    quit: bool,
}

impl<S: ScoreStore> App<S> {
    #[must_use]
    pub fn new(config: GameConfig, themes: ThemeCatalog, gateway: ScoreGateway<S>, now: Instant) -> Self {
        let mut app = Self {
            screen: Screen::Menu,
            player_name: String::new(),
            game: GameState::new(config.clone()),
            config,
            themes,
            gateway,
            sound_enabled: true,
            bursts: Vec::new(),
            menu_board: BoardView::Empty,
            results: BoardView::Empty,
            submit_warning: None,
            board: None,
            last_tick: now,
            bell: false,
            quit: false,
        };
        let skin = app.config.skin.clone();
        let _ = app.themes.select_by_id(&skin);
        app.menu_board = app.load_board(MENU_TOP_ROWS);
        app
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Returns and clears the pending audible cue.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    /// Starts a fresh session if the typed name is usable.
    pub fn start_game(&mut self, now: Instant) -> bool {
        let Ok(name) = validate_player_name(&self.player_name) else {
            return false;
        };

        self.player_name = name;
        self.game = GameState::new(self.config.clone());
        self.gateway.reset();
        self.submit_warning = None;
        self.results = BoardView::Empty;
        self.bursts.clear();
        self.last_tick = now;
        self.screen = Screen::Playing;
        tracing::info!(player = %self.player_name, "game started");
        true
    }

    pub fn handle_event(&mut self, event: InputEvent, now: Instant) {
        match self.screen {
            Screen::Menu => self.handle_menu_event(event, now),
            Screen::Playing => self.handle_play_event(event),
            Screen::GameOver { .. } => {
                if let InputEvent::Key(KeyCode::Char('q' | 'Q') | KeyCode::Esc) = event {
                    self.quit = true;
                }
            }
            Screen::Leaderboard => self.handle_leaderboard_event(event, now),
        }
    }

    /// Runs due ticks and screen timers.
    pub fn update(&mut self, now: Instant) {
        self.bursts
            .retain(|burst| now.saturating_duration_since(burst.started_at) < BURST_LIFETIME);

        match self.screen {
            Screen::Playing => {
                if self.game.is_over() {
                    return;
                }
                if self.game.status != GameStatus::Running {
                    self.last_tick = now;
                    return;
                }
                if now.saturating_duration_since(self.last_tick) < self.game.effective_interval(now) {
                    return;
                }

                let mut events: Vec<Feedback> = Vec::new();
                self.game.tick(now, &mut events);
                self.last_tick = now;
                for feedback in events {
                    self.react(feedback, now);
                }
            }
            Screen::GameOver { since } => {
                if now.saturating_duration_since(since) >= GAME_OVER_DISPLAY_DELAY {
                    self.show_results();
                }
            }
            Screen::Menu | Screen::Leaderboard => {}
        }
    }

    /// Stores the finished game's score unless it already has been.
    pub fn submit_score(&mut self) {
        match self
            .gateway
            .submit(&self.player_name, self.game.score, Utc::now())
        {
            Ok(SubmitOutcome::Saved | SubmitOutcome::AlreadySubmitted | SubmitOutcome::Skipped) => {
                self.submit_warning = None;
            }
            Err(error) => {
                self.submit_warning = Some(format!("Could not save score: {error}"));
            }
        }
    }

    fn show_results(&mut self) {
        self.submit_score();
        self.results = self.load_board(LEADERBOARD_TOP_ROWS);
        self.screen = Screen::Leaderboard;
    }

    fn load_board(&self, rows: usize) -> BoardView {
        let loaded = self
            .gateway
            .query_top(rows)
            .and_then(|top| self.gateway.stats().map(|stats| (top, stats)));

        match loaded {
            Ok((top, stats)) => BoardView::Loaded { top, stats },
            Err(error) => {
                tracing::warn!(%error, "leaderboard query failed");
                BoardView::Failed("Could not load the leaderboard".to_owned())
            }
        }
    }

    fn react(&mut self, feedback: Feedback, now: Instant) {
        tracing::trace!(?feedback, "feedback");
        match feedback {
            Feedback::AteFood { position, .. } => {
                self.push_burst(position, BurstKind::Eat, now);
                self.ring();
            }
            Feedback::PowerUp { position, .. } => {
                self.push_burst(position, BurstKind::PowerUp, now);
                self.ring();
            }
            Feedback::Collision { position, .. } => {
                self.push_burst(position, BurstKind::Crash, now);
            }
            Feedback::GameOver { .. } => {
                self.ring();
                self.screen = Screen::GameOver { since: now };
            }
            Feedback::Turned => self.ring(),
            Feedback::EffectExpired(_) => {}
        }
    }

    fn push_burst(&mut self, position: Position, kind: BurstKind, now: Instant) {
        self.bursts.push(Burst {
            position,
            kind,
            started_at: now,
        });
    }

    fn ring(&mut self) {
        if self.sound_enabled {
            self.bell = true;
        }
    }

    fn handle_menu_event(&mut self, event: InputEvent, now: Instant) {
        let InputEvent::Key(code) = event else {
            return;
        };

        match code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Enter => {
                let _ = self.start_game(now);
            }
            KeyCode::Tab | KeyCode::Right => self.themes.select_next(),
            KeyCode::BackTab | KeyCode::Left => self.themes.select_previous(),
            KeyCode::Backspace => {
                let _ = self.player_name.pop();
            }
            KeyCode::Char(c) if !c.is_control() => {
                if self.player_name.chars().count() < MAX_PLAYER_NAME_CHARS {
                    self.player_name.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_play_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key(code) => match game_input_for_key(code) {
                Some(GameInput::Quit) => self.quit = true,
                Some(GameInput::ToggleMute) => {
                    self.sound_enabled = !self.sound_enabled;
                    tracing::debug!(enabled = self.sound_enabled, "sound toggled");
                }
                Some(GameInput::NextSkin) => self.themes.select_next(),
                Some(input) => self.game.apply_input(input),
                None => {}
            },
            InputEvent::Pointer { column, row } => {
                if self.config.control_scheme == ControlScheme::Swipe {
                    return;
                }
                let Some(board) = self.board else {
                    return;
                };
                let (gx, gy) = board.to_grid(column, row);
                let head = self.game.snake.head();
                let _ = self.game.steer(DirectionInput::Pointer {
                    dx: gx - (head.x as f32 + 0.5),
                    dy: gy - (head.y as f32 + 0.5),
                });
            }
            InputEvent::Swipe { start, end } => {
                if self.config.control_scheme != ControlScheme::Swipe {
                    return;
                }
                let cell_width = self.board.map_or(self.config.cell_width, |b| b.cell_width);
                let dx = (f32::from(end.0) - f32::from(start.0)) / f32::from(cell_width.max(1));
                let dy = f32::from(end.1) - f32::from(start.1);
                let _ = self.game.steer(DirectionInput::Swipe { dx, dy });
            }
            InputEvent::Resize => {}
        }
    }

    fn handle_leaderboard_event(&mut self, event: InputEvent, now: Instant) {
        let InputEvent::Key(code) = event else {
            return;
        };

        match code {
            KeyCode::Enter | KeyCode::Char('r' | 'R') => {
                let _ = self.start_game(now);
            }
            KeyCode::Char('s' | 'S') if self.submit_warning.is_some() => {
                self.submit_score();
                self.results = self.load_board(LEADERBOARD_TOP_ROWS);
            }
            KeyCode::Char('m' | 'M') => {
                self.player_name.clear();
                self.menu_board = self.load_board(MENU_TOP_ROWS);
                self.screen = Screen::Menu;
            }
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crossterm::event::KeyCode;

    use super::{App, BoardGeometry, BoardView, BurstKind, Screen};
    use crate::config::{GAME_OVER_DISPLAY_DELAY, GameConfig};
    use crate::input::{ControlScheme, Direction, InputEvent};
    use crate::leaderboard::{MemoryStore, ScoreGateway};
    use crate::snake::{Position, Snake};
    use crate::theme::ThemeCatalog;

    fn app_with(store: MemoryStore, now: Instant) -> App<MemoryStore> {
        App::new(
            GameConfig::default(),
            ThemeCatalog::load_with_user_dir(None),
            ScoreGateway::new(store),
            now,
        )
    }

    fn type_name(app: &mut App<MemoryStore>, name: &str, now: Instant) {
        for c in name.chars() {
            app.handle_event(InputEvent::Key(KeyCode::Char(c)), now);
        }
    }

    /// Puts the snake one step from the right wall with `score` banked.
    fn doom_snake(app: &mut App<MemoryStore>, score: u32) {
        let bounds = app.game.bounds();
        app.game.snake = Snake::new(
            Position::new(i32::from(bounds.width) - 1, 0),
            Direction::Right,
        );
        app.game.foods.clear();
        app.game.score = score;
    }

    #[test]
    fn menu_requires_a_name_before_starting() {
        let now = Instant::now();
        let mut app = app_with(MemoryStore::new(), now);

        app.handle_event(InputEvent::Key(KeyCode::Enter), now);
        assert_eq!(app.screen, Screen::Menu);

        type_name(&mut app, "  ana", now);
        app.handle_event(InputEvent::Key(KeyCode::Enter), now);
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.player_name, "ana");
    }

    #[test]
    fn menu_name_is_capped() {
        let now = Instant::now();
        let mut app = app_with(MemoryStore::new(), now);

        type_name(&mut app, &"z".repeat(30), now);

        assert_eq!(app.player_name.chars().count(), 20);
    }

    #[test]
    fn configured_skin_is_preselected() {
        let now = Instant::now();
        let app = App::new(
            GameConfig::default().with_skin("dark"),
            ThemeCatalog::load_with_user_dir(None),
            ScoreGateway::new(MemoryStore::new()),
            now,
        );

        assert_eq!(app.themes.current_id(), "dark");
    }

    #[test]
    fn crash_submits_once_after_the_display_delay() {
        let start = Instant::now();
        let mut app = app_with(MemoryStore::new(), start);
        type_name(&mut app, "bo", start);
        assert!(app.start_game(start));
        doom_snake(&mut app, 40);

        let crash = start + Duration::from_secs(1);
        app.update(crash);
        assert!(matches!(app.screen, Screen::GameOver { .. }));
        assert!(app.bursts.iter().any(|b| b.kind == BurstKind::Crash));
        assert!(app.take_bell());
        assert!(app.gateway.query_all().expect("read should succeed").is_empty());

        app.update(crash + GAME_OVER_DISPLAY_DELAY);
        assert_eq!(app.screen, Screen::Leaderboard);
        app.submit_score();

        let records = app.gateway.query_all().expect("read should succeed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 40);
        assert!(matches!(app.results, BoardView::Loaded { ref top, .. } if top.len() == 1));
    }

    #[test]
    fn failed_submission_warns_and_can_be_retried() {
        let start = Instant::now();
        let mut store = MemoryStore::new();
        store.fail_appends = true;
        let mut app = app_with(store, start);
        type_name(&mut app, "cy", start);
        assert!(app.start_game(start));
        doom_snake(&mut app, 10);

        let crash = start + Duration::from_secs(1);
        app.update(crash);
        app.update(crash + GAME_OVER_DISPLAY_DELAY);
        assert_eq!(app.screen, Screen::Leaderboard);
        assert!(app.submit_warning.is_some());

        app.gateway.store_mut().fail_appends = false;
        app.handle_event(InputEvent::Key(KeyCode::Char('s')), crash);
        assert!(app.submit_warning.is_none());
        assert_eq!(app.gateway.query_all().expect("read should succeed").len(), 1);
    }

    #[test]
    fn unreadable_leaderboard_shows_failure_state() {
        let now = Instant::now();
        let mut store = MemoryStore::new();
        store.fail_reads = true;
        let app = app_with(store, now);

        assert!(matches!(app.menu_board, BoardView::Failed(_)));
    }

    #[test]
    fn no_ticks_run_while_paused() {
        let start = Instant::now();
        let mut app = app_with(MemoryStore::new(), start);
        type_name(&mut app, "dee", start);
        assert!(app.start_game(start));
        app.game.foods.clear();

        app.handle_event(InputEvent::Key(KeyCode::Char(' ')), start);
        let head = app.game.snake.head();
        app.update(start + Duration::from_secs(5));
        assert_eq!(app.game.snake.head(), head);
        assert_eq!(app.game.tick_count, 0);
    }

    #[test]
    fn mute_silences_cues() {
        let start = Instant::now();
        let mut app = app_with(MemoryStore::new(), start);
        type_name(&mut app, "eve", start);
        assert!(app.start_game(start));
        app.handle_event(InputEvent::Key(KeyCode::Char('m')), start);
        doom_snake(&mut app, 0);

        app.update(start + Duration::from_secs(1));

        assert!(matches!(app.screen, Screen::GameOver { .. }));
        assert!(!app.take_bell());
    }

    #[test]
    fn pointer_above_the_head_steers_up() {
        let now = Instant::now();
        let mut app = App::new(
            GameConfig::default().with_control_scheme(ControlScheme::FollowFour),
            ThemeCatalog::load_with_user_dir(None),
            ScoreGateway::new(MemoryStore::new()),
            now,
        );
        type_name(&mut app, "fay", now);
        assert!(app.start_game(now));
        app.board = Some(BoardGeometry {
            x: 1,
            y: 1,
            cell_width: 2,
        });
        let head = app.game.snake.head();
        let column = 1 + u16::try_from(head.x).expect("head on grid") * 2;
        let row = 1 + u16::try_from(head.y).expect("head on grid") - 3;

        app.handle_event(InputEvent::Pointer { column, row }, now);

        assert_eq!(app.game.pending_direction(), Some(Direction::Up));
    }

    #[test]
    fn turning_rings_unless_muted() {
        let start = Instant::now();
        let mut app = app_with(MemoryStore::new(), start);
        type_name(&mut app, "gil", start);
        assert!(app.start_game(start));
        app.game.foods.clear();

        app.handle_event(InputEvent::Key(KeyCode::Up), start);
        app.update(start + Duration::from_secs(1));
        assert_eq!(app.game.snake.direction(), Direction::Up);
        assert!(app.take_bell());

        app.handle_event(InputEvent::Key(KeyCode::Char('m')), start);
        app.handle_event(InputEvent::Key(KeyCode::Left), start);
        app.update(start + Duration::from_secs(2));
        assert_eq!(app.game.snake.direction(), Direction::Left);
        assert!(!app.take_bell());
    }
}
