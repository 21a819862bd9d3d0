//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the run so
//! that `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hedgehog_core::config::ConfigError,
    },

    /// The notification client could not be built.
    #[error("notifier error: {source}")]
    Delivery {
        /// The underlying delivery error.
        #[from]
        source: hedgehog_notify::DeliveryError,
    },

    /// The operator console failed to start.
    #[error("console error: {source}")]
    Console {
        /// The underlying startup error.
        #[from]
        source: hedgehog_console::startup::StartupError,
    },

    /// The pipeline loop failed.
    #[error("pipeline error: {source}")]
    Pipeline {
        /// The underlying pipeline error.
        #[from]
        source: hedgehog_core::pipeline::PipelineError,
    },

    /// The simulated source has nothing to report on.
    #[error("event source error: {message}")]
    Source {
        /// Description of the source failure.
        message: String,
    },
}
