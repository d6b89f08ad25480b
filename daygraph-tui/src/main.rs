//! Day Graph TUI - a day-paginated line graph kept in sync with a date picker
//!
//! Scrolling the strip of day panels moves the selected date; picking a date
//! scrolls its day into the middle of the view.

mod app;
mod loader;
mod picker;
mod theme;
mod timeline;
mod ui;

use std::fs::File;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use daygraph::config::{GraphConfig, LoggingSettings};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use loader::{run_data_worker, DataCommand, DataLoader, DataMessage};

/// Frame rate for animations (approximately 30 FPS)
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install().ok();

    // Optional config file path as the first argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = GraphConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_logging(&config.logging)?;
    info!(?config_path, "starting day graph");

    // Run the TUI
    run_tui(config).await
}

/// Send tracing output to a file so it never draws over the alternate screen
fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let path = settings.log_path();
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Run the TUI application
async fn run_tui(config: GraphConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Create communication channels
    let (data_tx, mut data_rx) = mpsc::channel::<DataMessage>(8);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<DataCommand>(8);

    // Spawn the data worker
    let loader = DataLoader::new(&config.data);
    let data_task = tokio::spawn(async move { run_data_worker(loader, data_tx, &mut cmd_rx).await });

    // Generate the initial data set
    cmd_tx.send(DataCommand::Generate).await.ok();

    // Create application state
    let mut app = App::new(&config);

    // Main event loop
    let result = run_event_loop(&mut terminal, &mut app, &mut data_rx, &cmd_tx).await;

    // Cleanup
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    // A generate run in progress is not waited for
    data_task.abort();
    info!("shut down");

    result
}

/// Run the main event loop
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    data_rx: &mut mpsc::Receiver<DataMessage>,
    cmd_tx: &mpsc::Sender<DataCommand>,
) -> Result<()> {
    loop {
        // Advance scroll animations
        app.tick();

        // Check for worker messages (non-blocking)
        while let Ok(msg) = data_rx.try_recv() {
            app.handle_data_message(msg);
        }

        // Place the day strip and sync the selected date before drawing
        let size = terminal.size()?;
        app.layout(Rect::new(0, 0, size.width, size.height));

        // Render the UI
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle input events with timeout for animation
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = app.handle_key(key) {
                        cmd_tx.send(cmd).await.ok();
                    }
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
