//! Run journal and the optional JSON run report.
//!
//! The report is an output artifact only; nothing reads it back.
use crate::bootstrap::driver::RunOutcome;
use crate::bootstrap::{Stage, StatusMessage};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub at_epoch_ms: u128,
    pub from: Stage,
    pub to: Stage,
}

/// Everything observable about a run, recorded on the interactive loop.
#[derive(Debug, Clone)]
pub struct RunJournal {
    started_at_epoch_ms: u128,
    transitions: Vec<TransitionRecord>,
    statuses: Vec<String>,
    notices: Vec<String>,
    start_attempts: u32,
}

impl RunJournal {
    pub fn start() -> Self {
        Self {
            started_at_epoch_ms: now_epoch_ms(),
            transitions: Vec::new(),
            statuses: Vec::new(),
            notices: Vec::new(),
            start_attempts: 0,
        }
    }

    pub fn record_transition(&mut self, from: &Stage, to: &Stage) {
        if from == to {
            return;
        }
        if *to == Stage::StartingService {
            self.start_attempts += 1;
        }
        self.transitions.push(TransitionRecord {
            at_epoch_ms: now_epoch_ms(),
            from: from.clone(),
            to: to.clone(),
        });
    }

    pub fn record_status(&mut self, status: &StatusMessage) {
        self.statuses.push(status.as_str().to_string());
    }

    pub fn record_notice(&mut self, notice: &str) {
        self.notices.push(notice.to_string());
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn start_attempts(&self) -> u32 {
        self.start_attempts
    }

    /// Stages in visiting order, starting with `Idle`.
    #[cfg(test)]
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![Stage::Idle];
        stages.extend(self.transitions.iter().map(|record| record.to.clone()));
        stages
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub started_at_epoch_ms: u128,
    pub finished_at_epoch_ms: u128,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub final_stage: Stage,
    pub start_attempts: u32,
    pub transitions: Vec<TransitionRecord>,
    pub statuses: Vec<String>,
    pub notices: Vec<String>,
}

impl RunReport {
    pub fn new(journal: &RunJournal, outcome: &RunOutcome, final_stage: &Stage) -> Self {
        let (label, failure_reason) = match outcome {
            RunOutcome::Dismissed => ("running", None),
            RunOutcome::Failed(reason) => ("failed", Some(reason.clone())),
            RunOutcome::Quit(_) => ("quit", None),
        };
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            started_at_epoch_ms: journal.started_at_epoch_ms,
            finished_at_epoch_ms: now_epoch_ms(),
            outcome: label.to_string(),
            failure_reason,
            final_stage: final_stage.clone(),
            start_attempts: journal.start_attempts(),
            transitions: journal.transitions().to_vec(),
            statuses: journal.statuses.clone(),
            notices: journal.notices.clone(),
        }
    }
}

/// Write the report as pretty JSON.
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("create report dir")?;
    }
    let text = serde_json::to_string_pretty(report).context("serialize run report")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn now_epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis()
}
