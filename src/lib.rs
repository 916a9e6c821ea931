//! Arcade Snake: a headless game engine plus a ratatui front end.

pub mod app;
pub mod config;
pub mod effects;
pub mod feedback;
pub mod food;
pub mod game;
pub mod input;
pub mod leaderboard;
pub mod logging;
pub mod renderer;
pub mod snake;
pub mod terminal_runtime;
pub mod theme;

pub mod ui {
    pub mod hud;
    pub mod menu;
}
