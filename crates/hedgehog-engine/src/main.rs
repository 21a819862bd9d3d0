//! Alert processor binary for Hedgehog.
//!
//! Wires the simulated sensor feed, the decision pipeline, the responder
//! notifier, and the operator console together, then runs the pipeline
//! loop until the game ends, the cycle limit is hit, or an operator stops
//! the run.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `hedgehog-config.yaml`
//! 3. Build the responder roster and the decision arbiter
//! 4. Build the HTTP notification dispatcher
//! 5. Assemble the pipeline and the run control
//! 6. Start the operator console (unless disabled)
//! 7. Install the ctrl-c handler
//! 8. Run the pipeline loop
//! 9. Log the result

mod console_bridge;
mod error;
mod source;

use std::path::Path;
use std::sync::Arc;

use hedgehog_console::server::ServerConfig;
use hedgehog_console::state::{AppState, ConsoleBoard, GameSnapshot};
use hedgehog_core::arbiter::{AlertPublisher, DecisionArbiter, HeadlessPublisher};
use hedgehog_core::config::AlertConfig;
use hedgehog_core::control::RunControl;
use hedgehog_core::enricher::UNKNOWN_ZONE;
use hedgehog_core::pipeline::{CycleObserver, NoOpObserver, Pipeline, log_run_end};
use hedgehog_notify::NotificationDispatcher;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::console_bridge::ConsoleBridge;
use crate::error::EngineError;
use crate::source::SimulatedSource;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "hedgehog-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("hedgehog-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        decision_timeout_ms = config.arbiter.decision_timeout_ms,
        interval_min_ms = config.pipeline.interval_min_ms,
        interval_max_ms = config.pipeline.interval_max_ms,
        max_cycles = config.pipeline.max_cycles,
        console_enabled = config.console.enabled,
        "Configuration loaded"
    );

    // 3. Roster and arbiter.
    let roster = Arc::new(config.roster()?);
    let board = Arc::new(ConsoleBoard::new());
    let publisher: Arc<dyn AlertPublisher> = if config.console.enabled {
        Arc::clone(&board) as Arc<dyn AlertPublisher>
    } else {
        warn!("operator console disabled, every event resolves by fallback");
        Arc::new(HeadlessPublisher)
    };
    let arbiter = Arc::new(DecisionArbiter::new(Arc::clone(&roster), publisher));
    info!(
        responders = roster.len(),
        primary = %roster.primary(),
        "Decision arbiter ready"
    );

    // 4. Notification dispatcher.
    let dispatcher =
        Arc::new(NotificationDispatcher::http(&config.notifier).map_err(EngineError::from)?);
    info!(
        endpoints = config.notifier.endpoints.len(),
        request_timeout_ms = config.notifier.request_timeout_ms,
        "Notification dispatcher ready"
    );

    // 5. Pipeline and run control.
    let mut pipeline = Pipeline::from_config(&config, Arc::clone(&arbiter), dispatcher)
        .map_err(EngineError::from)?;
    let control = Arc::new(RunControl::new());

    // 6. Operator console.
    let mut observer: Box<dyn CycleObserver> = if config.console.enabled {
        let app_state = Arc::new(
            AppState::new(board, arbiter)
                .with_control(Arc::clone(&control))
                .with_game(GameSnapshot::new(pipeline.game_state())),
        );
        let server_config = ServerConfig::from(&config.console);
        let _console_handle =
            hedgehog_console::spawn_console(&server_config, Arc::clone(&app_state))
                .await
                .map_err(EngineError::from)?;
        info!(host = %server_config.host, port = server_config.port, "Operator console started");
        Box::new(ConsoleBridge::new(app_state))
    } else {
        Box::new(NoOpObserver)
    };

    // 7. Ctrl-c requests a clean stop; the current cycle still finishes.
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("ctrl-c received, stopping after the current cycle");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
            }
        });
    }

    // 8. Run.
    let locations: Vec<String> = config
        .zones
        .keys()
        .filter(|key| key.as_str() != UNKNOWN_ZONE)
        .cloned()
        .collect();
    let mut source = SimulatedSource::new(locations).ok_or_else(|| EngineError::Source {
        message: "no zones configured for the simulated sensors".to_owned(),
    })?;
    info!("Entering pipeline loop");

    let result = pipeline
        .run(&mut source, &control, observer.as_mut())
        .await
        .map_err(EngineError::from)?;

    // 9. Log results.
    log_run_end(&result);
    info!(
        end_reason = %result.end_reason,
        events = source.emitted(),
        "hedgehog-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from `hedgehog-config.yaml`, or defaults if absent.
fn load_config() -> Result<AlertConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(AlertConfig::from_file(config_path)?)
    } else {
        info!("Config file not found, using defaults");
        let mut config = AlertConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}
