use serde::Serialize;
use std::fmt;

/// Position in the bootstrap sequence.
///
/// ```text
/// Idle ─timer─► CheckingCompatibility ─true──► LoadingConfiguration ─ok──► ReadyToStart
///                                     ─false─► ConditioningSystem ─done─► LoadingConfiguration
///                                     ─error─► Failed
/// LoadingConfiguration ─error─► Failed
/// ReadyToStart ─start─► StartingService ─0─► Running
///                                       ─non-zero / error─► ReadyToStart
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "stage", content = "reason")]
pub enum Stage {
    #[default]
    Idle,
    CheckingCompatibility,
    ConditioningSystem,
    LoadingConfiguration,
    ReadyToStart,
    StartingService,
    Running,
    /// Setup failed; no in-place retry exists.
    Failed(String),
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::CheckingCompatibility => "checking compatibility",
            Stage::ConditioningSystem => "conditioning system",
            Stage::LoadingConfiguration => "loading configuration",
            Stage::ReadyToStart => "ready to start",
            Stage::StartingService => "starting service",
            Stage::Running => "running",
            Stage::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Failed(reason) => write!(f, "failed ({reason})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Display text tied to the current stage. Carries no control logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage(String);

impl StatusMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Control state derived from a stage; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiControlState {
    /// Start control shown (configuration has loaded).
    pub action_visible: bool,
    /// Start control accepts input.
    pub action_enabled: bool,
    /// Progress indicator shown.
    pub busy: bool,
}

impl UiControlState {
    pub fn for_stage(stage: &Stage) -> Self {
        let action_visible = matches!(
            stage,
            Stage::ReadyToStart | Stage::StartingService | Stage::Running
        );
        let busy = matches!(
            stage,
            Stage::Idle
                | Stage::CheckingCompatibility
                | Stage::ConditioningSystem
                | Stage::LoadingConfiguration
                | Stage::StartingService
        );
        Self {
            action_visible,
            action_enabled: *stage == Stage::ReadyToStart,
            busy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_stages() -> Vec<Stage> {
        vec![
            Stage::Idle,
            Stage::CheckingCompatibility,
            Stage::ConditioningSystem,
            Stage::LoadingConfiguration,
            Stage::ReadyToStart,
            Stage::StartingService,
            Stage::Running,
            Stage::Failed("boom".to_string()),
        ]
    }

    #[test]
    fn action_enabled_only_when_ready() {
        for stage in all_stages() {
            let controls = UiControlState::for_stage(&stage);
            assert_eq!(
                controls.action_enabled,
                stage == Stage::ReadyToStart,
                "stage {stage}"
            );
        }
    }

    #[test]
    fn failed_stage_hides_action_and_progress() {
        let controls = UiControlState::for_stage(&Stage::Failed("x".to_string()));
        assert!(!controls.action_visible);
        assert!(!controls.busy);
    }

    #[test]
    fn failed_stage_serializes_reason() {
        let json = serde_json::to_value(Stage::Failed("no config".to_string()))
            .expect("serialize stage");
        assert_eq!(
            json,
            serde_json::json!({"stage": "failed", "reason": "no config"})
        );
        let json = serde_json::to_value(Stage::ReadyToStart).expect("serialize stage");
        assert_eq!(json, serde_json::json!({"stage": "ready_to_start"}));
    }
}
