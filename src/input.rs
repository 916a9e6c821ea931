use std::f32::consts::FRAC_PI_4;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use serde::{Deserialize, Serialize};

/// Canonical movement directions for snake input.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit vector in grid coordinates (y grows downwards).
    #[must_use]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    #[must_use]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Returns whether a direction change is legal (no immediate 180° turns).
#[must_use]
pub fn direction_change_is_valid(current: Direction, next: Direction) -> bool {
    next != current.opposite()
}

/// High-level input events consumed by the game loop.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GameInput {
    Direction(Direction),
    Pause,
    ToggleMute,
    NextSkin,
    Quit,
    Confirm,
}

/// Maps a key to its gameplay meaning. Unknown keys map to `None`.
#[must_use]
pub fn game_input_for_key(code: KeyCode) -> Option<GameInput> {
    let input = match code {
        KeyCode::Up | KeyCode::Char('w' | 'W') => GameInput::Direction(Direction::Up),
        KeyCode::Down | KeyCode::Char('s' | 'S') => GameInput::Direction(Direction::Down),
        KeyCode::Left | KeyCode::Char('a' | 'A') => GameInput::Direction(Direction::Left),
        KeyCode::Right | KeyCode::Char('d' | 'D') => GameInput::Direction(Direction::Right),
        KeyCode::Char(' ' | 'p' | 'P') => GameInput::Pause,
        KeyCode::Char('m' | 'M') => GameInput::ToggleMute,
        KeyCode::Char('t' | 'T') => GameInput::NextSkin,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => GameInput::Quit,
        KeyCode::Enter => GameInput::Confirm,
        _ => return None,
    };
    Some(input)
}

/// How pointer input steers the snake.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlScheme {
    /// Press, drag and release; the drag vector picks the direction.
    #[default]
    Swipe,
    /// The snake heads towards the pointer, four 90° sectors.
    FollowFour,
    /// As `FollowFour` with eight 45° sectors; diagonals turn the snake.
    FollowEight,
}

/// One raw steering request before reversal filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectionInput {
    Pressed(Direction),
    /// Drag vector in grid cells.
    Swipe { dx: f32, dy: f32 },
    /// Vector from the snake head to the pointer, in grid cells.
    Pointer { dx: f32, dy: f32 },
}

/// Turns raw input into a direction the snake may take next tick.
#[derive(Debug, Clone, Copy)]
pub struct DirectionResolver {
    scheme: ControlScheme,
    swipe_min_distance: f32,
}

impl DirectionResolver {
    #[must_use]
    pub fn new(scheme: ControlScheme, swipe_min_distance: f32) -> Self {
        Self {
            scheme,
            swipe_min_distance,
        }
    }

    /// Resolves `input` against the direction applied on the last tick.
    ///
    /// Returns `None` for ambiguous input and for exact reversals.
    #[must_use]
    pub fn resolve(&self, current: Direction, input: DirectionInput) -> Option<Direction> {
        let candidate = match input {
            DirectionInput::Pressed(direction) => Some(direction),
            DirectionInput::Swipe { dx, dy } => self.classify_swipe(dx, dy),
            DirectionInput::Pointer { dx, dy } => self.classify_pointer(current, dx, dy),
        }?;

        propose(current, candidate)
    }

    /// Classifies a drag by its dominant axis. Short drags are ignored.
    #[must_use]
    pub fn classify_swipe(&self, dx: f32, dy: f32) -> Option<Direction> {
        if !dx.is_finite() || !dy.is_finite() {
            return None;
        }
        if dx.abs() < self.swipe_min_distance && dy.abs() < self.swipe_min_distance {
            return None;
        }

        Some(dominant_axis(dx, dy))
    }

    /// Buckets the head-to-pointer vector into the scheme's sectors.
    #[must_use]
    pub fn classify_pointer(&self, current: Direction, dx: f32, dy: f32) -> Option<Direction> {
        if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
            return None;
        }

        match self.scheme {
            ControlScheme::Swipe | ControlScheme::FollowFour => Some(dominant_axis(dx, dy)),
            ControlScheme::FollowEight => Some(eight_sector(current, dx, dy)),
        }
    }
}

/// Accepts `candidate` unless it reverses `current`.
#[must_use]
pub fn propose(current: Direction, candidate: Direction) -> Option<Direction> {
    direction_change_is_valid(current, candidate).then_some(candidate)
}

fn dominant_axis(dx: f32, dy: f32) -> Direction {
    if dx.abs() > dy.abs() {
        if dx > 0.0 { Direction::Right } else { Direction::Left }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

fn eight_sector(current: Direction, dx: f32, dy: f32) -> Direction {
    let sector = (dy.atan2(dx) / FRAC_PI_4).round().rem_euclid(8.0) as u8;
    let horizontal = if dx > 0.0 { Direction::Right } else { Direction::Left };
    let vertical = if dy > 0.0 { Direction::Down } else { Direction::Up };

    match sector {
        0 => Direction::Right,
        2 => Direction::Down,
        4 => Direction::Left,
        6 => Direction::Up,
        // Diagonal: take the component that turns the snake.
        _ if current.is_horizontal() => vertical,
        _ => horizontal,
    }
}

/// Single-slot, last-write-wins mailbox for the next direction.
///
/// Input handlers write into it; the tick drains it exactly once.
#[derive(Debug, Clone, Default)]
pub struct DirectionSlot {
    inner: Arc<Mutex<Option<Direction>>>,
}

impl DirectionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `direction`, replacing anything not yet consumed.
    pub fn offer(&self, direction: Direction) {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(direction);
    }

    /// Removes and returns the stored direction.
    pub fn take(&self) -> Option<Direction> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    #[must_use]
    pub fn peek(&self) -> Option<Direction> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Terminal events after filtering, in terminal cell coordinates.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputEvent {
    Key(KeyCode),
    /// Button pressed or dragged at this cell.
    Pointer { column: u16, row: u16 },
    /// Button released; carries press and release cells.
    Swipe {
        start: (u16, u16),
        end: (u16, u16),
    },
    Resize,
}

/// Polls crossterm for keyboard and mouse input.
#[derive(Debug, Default)]
pub struct InputHandler {
    press_origin: Option<(u16, u16)>,
}

impl InputHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits up to `timeout` for the next relevant event.
    pub fn poll(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        let translated = match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => Some(InputEvent::Key(key.code)),
            Event::Mouse(mouse) => self.translate_mouse(mouse),
            Event::Resize(_, _) => Some(InputEvent::Resize),
            _ => None,
        };
        Ok(translated)
    }

    fn translate_mouse(&mut self, mouse: MouseEvent) -> Option<InputEvent> {
        let at = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.press_origin = Some(at);
                Some(InputEvent::Pointer {
                    column: at.0,
                    row: at.1,
                })
            }
            MouseEventKind::Drag(MouseButton::Left) => Some(InputEvent::Pointer {
                column: at.0,
                row: at.1,
            }),
            MouseEventKind::Up(MouseButton::Left) => self
                .press_origin
                .take()
                .map(|start| InputEvent::Swipe { start, end: at }),
            _ => None,
        }
    }
}
