use std::error::Error;
use std::panic;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use snake_arcade::app::App;
use snake_arcade::config::{GameConfig, Variant};
use snake_arcade::input::InputHandler;
use snake_arcade::leaderboard::{JsonFileStore, ScoreGateway, leaderboard_path};
use snake_arcade::logging;
use snake_arcade::renderer;
use snake_arcade::terminal_runtime::{TerminalSession, cleanup_terminal_best_effort};
use snake_arcade::theme::ThemeCatalog;

const FRAME_POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// Arcade Snake in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Game variant preset.
    #[arg(long, value_enum, default_value_t = Variant::Classic)]
    variant: Variant,

    /// JSON file with GameConfig overrides on top of the variant.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid side length in cells.
    #[arg(long)]
    grid_size: Option<u16>,

    /// Base tick interval in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Skin id to start with (classic, neon, dark or a user theme).
    #[arg(long)]
    skin: Option<String>,

    /// Prefill the player name.
    #[arg(long)]
    name: Option<String>,

    /// Leaderboard file location.
    #[arg(long)]
    leaderboard: Option<PathBuf>,

    /// Start with sound cues off.
    #[arg(long)]
    mute: bool,

    /// Log filter used when SNAKE_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let log_file = logging::log_path();
    if let Err(error) = logging::init(&log_file, &cli.log_level) {
        eprintln!("Logging disabled ({}): {error}", log_file.display());
    }

    let config = build_config(&cli)?;
    tracing::info!(variant = ?cli.variant, grid = config.grid_size, "starting");

    let store = JsonFileStore::new(cli.leaderboard.clone().unwrap_or_else(leaderboard_path));
    let mut app = App::new(
        config,
        ThemeCatalog::load(),
        ScoreGateway::new(store),
        Instant::now(),
    );
    if let Some(name) = cli.name {
        app.player_name = name;
    }
    app.sound_enabled = !cli.mute;

    install_panic_hook();
    run(&mut app)?;
    tracing::info!("exiting");
    Ok(())
}

fn build_config(cli: &Cli) -> Result<GameConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path, cli.variant)?,
        None => GameConfig::preset(cli.variant),
    };

    if let Some(side) = cli.grid_size {
        config = config.with_grid_size(side);
    }
    if let Some(ms) = cli.tick_ms {
        config = config.with_tick_interval_ms(ms);
    }
    if let Some(skin) = &cli.skin {
        config = config.with_skin(skin.clone());
    }

    config.validate()?;
    Ok(config)
}

fn run(app: &mut App<JsonFileStore>) -> Result<(), Box<dyn Error>> {
    let mut session = TerminalSession::enter()?;
    let mut input = InputHandler::new();

    while !app.should_quit() {
        let now = Instant::now();
        let mut geometry = None;
        session
            .terminal_mut()
            .draw(|frame| geometry = renderer::render(frame, app, now))?;
        app.board = geometry;

        if let Some(event) = input.poll(FRAME_POLL_TIMEOUT)? {
            app.handle_event(event, Instant::now());
        }

        app.update(Instant::now());

        if app.take_bell() {
            if let Err(error) = session.bell() {
                tracing::debug!(%error, "bell failed");
            }
        }
    }

    Ok(())
}

fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = cleanup_terminal_best_effort();
        default_hook(panic_info);
    }));
}
