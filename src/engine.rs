//! Synchronous facade over the external media engine.
//!
//! Every call may block and may fail. Callers drive the facade from background
//! tasks only; the interactive loop never calls it directly except for the
//! one-time `initialize`.
pub mod binding;
pub mod process;

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine initialization failed: {0}")]
    InitializationFailed(String),
    #[error("engine used before initialize")]
    NotInitialized,
    #[error("compatibility check failed: {0}")]
    CompatibilityCheckFailed(String),
    #[error("system conditioning failed: {0}")]
    ConditioningFailed(String),
    #[error("configuration load failed: {0}")]
    ConfigurationLoadFailed(String),
    #[error("service start failed: {0}")]
    ServiceStartFailed(String),
}

/// Context handed to `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineContext {
    /// Working area owned by the launcher; created on initialize.
    pub data_dir: PathBuf,
}

/// Opaque result of a configuration load.
///
/// The orchestrator only observes that a value was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupConfiguration {
    detail: String,
}

impl StartupConfiguration {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// The five engine operations.
///
/// Implementations are shared across threads but only one stage task touches
/// the engine at a time.
pub trait Engine: Send + Sync {
    /// One-time setup. Must precede every other call; repeated calls are no-ops.
    fn initialize(&self, context: &EngineContext) -> Result<(), EngineError>;

    /// `true` when the environment is ready without conditioning.
    fn check_compatibility(&self) -> Result<bool, EngineError>;

    /// Adjust the environment after a negative compatibility check.
    fn apply_conditioning(&self) -> Result<(), EngineError>;

    /// Fetch and install the startup configuration. Not idempotent.
    fn load_configuration(&self) -> Result<StartupConfiguration, EngineError>;

    /// Launch the service. `0` is success; any other code is an opaque failure.
    fn start_service(&self) -> Result<i32, EngineError>;
}
