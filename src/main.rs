// Scoreboard entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not the terminal)
// 2. Load config
// 3. Build the color table (builtins + optional CSV overrides)
// 4. Open the snapshot recorder if enabled
// 5. Create mpsc channels and the controller
// 6. Spawn the controller task
// 7. Run the TUI event loop (blocking until the user quits)
// 8. Cleanup on exit

use std::sync::Arc;

use scorecast::app::{self, Controller};
use scorecast::colors::ColorTable;
use scorecast::config;
use scorecast::feed::StatsApiFeed;
use scorecast::record::Recorder;
use scorecast::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not the terminal)
    init_tracing()?;
    info!("scorecast starting up");

    // 2. Load config (path from the first CLI argument, or the default)
    let config_path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let config = config::load_config_from(&config_path).context("failed to load configuration")?;
    info!(
        "Config loaded: team_id={}, polling {}s live / {}s scheduled / {}s idle",
        config.team_id,
        config.polling.live_seconds,
        config.polling.scheduled_seconds,
        config.polling.idle_seconds
    );

    // 3. Color table
    let colors = match &config.colors.overrides {
        Some(path) => match ColorTable::with_overrides(std::path::Path::new(path)) {
            Ok(table) => table,
            Err(e) => {
                warn!("failed to load color overrides: {e}; using builtins");
                ColorTable::builtin()
            }
        },
        None => ColorTable::builtin(),
    };

    // 4. Snapshot recorder (optional)
    let recorder = if config.record.enabled {
        let recorder =
            Recorder::open(&config.record.path).context("failed to open snapshot recorder")?;
        info!("Recording snapshots to {}", config.record.path);
        Some(recorder)
    } else {
        None
    };

    // 5. Channels and controller
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);

    let feed = Arc::new(StatsApiFeed::new());
    let max_innings = config.ui.max_innings;
    let controller = Controller::new(config, feed, colors.clone(), recorder, ui_tx);

    // 6. Spawn the controller task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(controller, cmd_rx).await {
            error!("controller loop error: {e}");
        }
    });

    // 7. Run the TUI event loop (blocking until the user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx, colors, max_innings).await {
        error!("TUI error: {e}");
    }

    // 8. Cleanup: wait briefly for the controller task to finish
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("scorecast shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is owned
/// by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("scorecast.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scorecast=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
