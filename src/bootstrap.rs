//! Bootstrap orchestration.
//!
//! The `Orchestrator` is a pure state machine: it consumes timer, task-result,
//! and start events and returns the effects the interactive loop must apply.
//! It never calls the engine or touches the presenter itself; the `driver`
//! module owns threads, queues, and the presenter.
pub mod driver;
mod stage;
mod task;

pub use stage::{Stage, StatusMessage, UiControlState};
pub use task::{StartFailure, Task, TaskOutcome};

const STATUS_CHECKING: &str = "Checking system compatibility...";
const STATUS_CONDITIONING: &str = "Applying system optimizations...";
const STATUS_CHECK_FAILED: &str = "System check failed";
const STATUS_LOADING: &str = "Loading media configuration...";
const STATUS_LOADED: &str = "Configuration loaded successfully";
const STATUS_LOAD_FAILED: &str = "Configuration loading failed";
const STATUS_STARTING: &str = "Starting media center...";
const STATUS_STARTED: &str = "Media center started successfully";
const STATUS_START_FAILED: &str = "Failed to start media center";
const STATUS_START_ERROR: &str = "Startup error";

const NOTICE_CHECK_FAILED: &str = "Initialization failed";
const NOTICE_LOAD_FAILED: &str = "Configuration failed";
const NOTICE_START_FAILED: &str = "Startup failed";
const NOTICE_START_ERROR: &str = "Startup error";

/// Something the interactive loop must do on behalf of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Status(StatusMessage),
    Controls(UiControlState),
    FailureNotice(String),
    Dismiss,
    Dispatch(Task),
}

#[derive(Debug, Default)]
pub struct Orchestrator {
    stage: Stage,
    in_flight: Option<Task>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn in_flight(&self) -> Option<Task> {
        self.in_flight
    }

    pub fn controls(&self) -> UiControlState {
        UiControlState::for_stage(&self.stage)
    }

    /// The startup delay elapsed.
    pub fn on_timer(&mut self) -> Vec<Effect> {
        if self.stage != Stage::Idle {
            tracing::debug!(stage = %self.stage, "timer ignored");
            return Vec::new();
        }
        let mut effects = vec![status(STATUS_CHECKING)];
        self.transition(Stage::CheckingCompatibility, &mut effects);
        self.dispatch(Task::CheckCompatibility, &mut effects);
        effects
    }

    /// The user asked to start the service.
    pub fn on_start_requested(&mut self) -> Vec<Effect> {
        if self.stage != Stage::ReadyToStart {
            tracing::debug!(stage = %self.stage, "start request ignored");
            return Vec::new();
        }
        let mut effects = vec![status(STATUS_STARTING)];
        self.transition(Stage::StartingService, &mut effects);
        self.dispatch(Task::StartService, &mut effects);
        effects
    }

    /// The in-flight task posted its result.
    pub fn on_task_finished(&mut self, outcome: TaskOutcome) -> Vec<Effect> {
        let task = outcome.task();
        if self.in_flight != Some(task) {
            tracing::warn!(
                task = task.name(),
                stage = %self.stage,
                "result for a task that is not in flight"
            );
            return Vec::new();
        }
        self.in_flight = None;

        let mut effects = Vec::new();
        match (self.stage.clone(), outcome) {
            (Stage::CheckingCompatibility, TaskOutcome::Compatibility(Ok(true))) => {
                self.begin_configuration_load(&mut effects);
            }
            (Stage::CheckingCompatibility, TaskOutcome::Compatibility(Ok(false))) => {
                effects.push(status(STATUS_CONDITIONING));
                self.transition(Stage::ConditioningSystem, &mut effects);
                self.dispatch(Task::ApplyConditioning, &mut effects);
            }
            (Stage::CheckingCompatibility, TaskOutcome::Compatibility(Err(err))) => {
                tracing::error!(error = %err, "compatibility check failed");
                effects.push(status(STATUS_CHECK_FAILED));
                self.transition(Stage::Failed(err.to_string()), &mut effects);
                effects.push(Effect::FailureNotice(NOTICE_CHECK_FAILED.to_string()));
            }
            (Stage::ConditioningSystem, TaskOutcome::Conditioning(result)) => {
                if let Err(err) = result {
                    tracing::warn!(error = %err, "conditioning failed; continuing");
                }
                self.begin_configuration_load(&mut effects);
            }
            (Stage::LoadingConfiguration, TaskOutcome::Configuration(Ok(config))) => {
                tracing::debug!(detail = config.detail(), "configuration loaded");
                effects.push(status(STATUS_LOADED));
                self.transition(Stage::ReadyToStart, &mut effects);
            }
            (Stage::LoadingConfiguration, TaskOutcome::Configuration(Err(err))) => {
                tracing::error!(error = %err, "configuration load failed");
                effects.push(status(STATUS_LOAD_FAILED));
                self.transition(Stage::Failed(err.to_string()), &mut effects);
                effects.push(Effect::FailureNotice(NOTICE_LOAD_FAILED.to_string()));
            }
            (Stage::StartingService, TaskOutcome::Service(Ok(0))) => {
                effects.push(status(STATUS_STARTED));
                self.transition(Stage::Running, &mut effects);
                effects.push(Effect::Dismiss);
            }
            (Stage::StartingService, TaskOutcome::Service(Ok(code))) => {
                self.recover_from_start(StartFailure::ExitCode(code), &mut effects);
            }
            (Stage::StartingService, TaskOutcome::Service(Err(err))) => {
                self.recover_from_start(StartFailure::Error(err), &mut effects);
            }
            (stage, outcome) => {
                tracing::warn!(%stage, ?outcome, "unexpected task result");
            }
        }
        effects
    }

    fn begin_configuration_load(&mut self, effects: &mut Vec<Effect>) {
        effects.push(status(STATUS_LOADING));
        self.transition(Stage::LoadingConfiguration, effects);
        self.dispatch(Task::LoadConfiguration, effects);
    }

    fn recover_from_start(&mut self, failure: StartFailure, effects: &mut Vec<Effect>) {
        tracing::warn!(error = %failure, "service start failed; retry allowed");
        let (text, notice) = match failure {
            StartFailure::ExitCode(_) => (STATUS_START_FAILED, NOTICE_START_FAILED),
            StartFailure::Error(_) => (STATUS_START_ERROR, NOTICE_START_ERROR),
        };
        effects.push(status(text));
        self.transition(Stage::ReadyToStart, effects);
        effects.push(Effect::FailureNotice(notice.to_string()));
    }

    fn transition(&mut self, to: Stage, effects: &mut Vec<Effect>) {
        tracing::info!(from = %self.stage, to = %to, "stage transition");
        self.stage = to;
        effects.push(Effect::Controls(self.controls()));
    }

    fn dispatch(&mut self, task: Task, effects: &mut Vec<Effect>) {
        debug_assert!(self.in_flight.is_none(), "stage task already in flight");
        self.in_flight = Some(task);
        effects.push(Effect::Dispatch(task));
    }
}

fn status(text: &str) -> Effect {
    Effect::Status(StatusMessage::new(text))
}

#[cfg(test)]
#[path = "bootstrap/orchestrator_tests.rs"]
mod tests;
