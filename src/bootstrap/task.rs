use crate::engine::{Engine, EngineError, StartupConfiguration};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

/// One-shot background work for a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    CheckCompatibility,
    ApplyConditioning,
    LoadConfiguration,
    StartService,
}

/// Raw engine result posted back to the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Compatibility(Result<bool, EngineError>),
    Conditioning(Result<(), EngineError>),
    Configuration(Result<StartupConfiguration, EngineError>),
    Service(Result<i32, EngineError>),
}

/// Why a service start attempt did not reach `Running`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartFailure {
    #[error("service returned result code {0}")]
    ExitCode(i32),
    #[error(transparent)]
    Error(#[from] EngineError),
}

impl Task {
    pub fn name(self) -> &'static str {
        match self {
            Task::CheckCompatibility => "compatibility",
            Task::ApplyConditioning => "conditioning",
            Task::LoadConfiguration => "configuration",
            Task::StartService => "service",
        }
    }

    /// Run the engine call, converting a panic into this task's failure.
    pub fn run(self, engine: &dyn Engine) -> TaskOutcome {
        match catch_unwind(AssertUnwindSafe(|| self.call(engine))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(task = self.name(), %message, "engine call panicked");
                self.failed(format!("engine call panicked: {message}"))
            }
        }
    }

    /// The outcome reported when the task could not produce one itself.
    pub fn failed(self, detail: String) -> TaskOutcome {
        match self {
            Task::CheckCompatibility => {
                TaskOutcome::Compatibility(Err(EngineError::CompatibilityCheckFailed(detail)))
            }
            Task::ApplyConditioning => {
                TaskOutcome::Conditioning(Err(EngineError::ConditioningFailed(detail)))
            }
            Task::LoadConfiguration => {
                TaskOutcome::Configuration(Err(EngineError::ConfigurationLoadFailed(detail)))
            }
            Task::StartService => TaskOutcome::Service(Err(EngineError::ServiceStartFailed(detail))),
        }
    }

    fn call(self, engine: &dyn Engine) -> TaskOutcome {
        match self {
            Task::CheckCompatibility => TaskOutcome::Compatibility(engine.check_compatibility()),
            Task::ApplyConditioning => TaskOutcome::Conditioning(engine.apply_conditioning()),
            Task::LoadConfiguration => TaskOutcome::Configuration(engine.load_configuration()),
            Task::StartService => TaskOutcome::Service(engine.start_service()),
        }
    }
}

impl TaskOutcome {
    pub fn task(&self) -> Task {
        match self {
            TaskOutcome::Compatibility(_) => Task::CheckCompatibility,
            TaskOutcome::Conditioning(_) => Task::ApplyConditioning,
            TaskOutcome::Configuration(_) => Task::LoadConfiguration,
            TaskOutcome::Service(_) => Task::StartService,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        return (*text).to_string();
    }
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    "unknown panic".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineContext;

    struct PanickingEngine;

    impl Engine for PanickingEngine {
        fn initialize(&self, _context: &EngineContext) -> Result<(), EngineError> {
            Ok(())
        }

        fn check_compatibility(&self) -> Result<bool, EngineError> {
            panic!("probe exploded");
        }

        fn apply_conditioning(&self) -> Result<(), EngineError> {
            Ok(())
        }

        fn load_configuration(&self) -> Result<StartupConfiguration, EngineError> {
            Err(EngineError::ConfigurationLoadFailed("missing".to_string()))
        }

        fn start_service(&self) -> Result<i32, EngineError> {
            Ok(9)
        }
    }

    #[test]
    fn panic_becomes_stage_failure() {
        let outcome = Task::CheckCompatibility.run(&PanickingEngine);
        assert_eq!(
            outcome,
            TaskOutcome::Compatibility(Err(EngineError::CompatibilityCheckFailed(
                "engine call panicked: probe exploded".to_string()
            )))
        );
    }

    #[test]
    fn outcome_reports_its_task() {
        for task in [
            Task::CheckCompatibility,
            Task::ApplyConditioning,
            Task::LoadConfiguration,
            Task::StartService,
        ] {
            assert_eq!(task.run(&PanickingEngine).task(), task);
            assert_eq!(task.failed("x".to_string()).task(), task);
        }
    }

    #[test]
    fn engine_results_pass_through() {
        assert_eq!(
            Task::StartService.run(&PanickingEngine),
            TaskOutcome::Service(Ok(9))
        );
        assert_eq!(
            Task::LoadConfiguration.run(&PanickingEngine),
            TaskOutcome::Configuration(Err(EngineError::ConfigurationLoadFailed(
                "missing".to_string()
            )))
        );
    }
}
