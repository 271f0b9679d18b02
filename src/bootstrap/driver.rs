//! Interactive-context event loop.
//!
//! The driver owns the only queue the orchestrator is fed from. Background
//! tasks post raw outcomes onto it; presenters and input pumps post user
//! events onto it through a `LauncherHandle`. Stage state is only ever touched
//! on the thread calling `Driver::run`.
use super::{Effect, Orchestrator, Stage, StatusMessage, Task, TaskOutcome};
use crate::engine::Engine;
use crate::report::RunJournal;
use crate::ui::Presenter;
use anyhow::Result;
use crossbeam_channel::{after, never, select, unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const STATUS_WAITING: &str = "Waiting for the current step to finish...";

/// Events delivered to the interactive loop.
#[derive(Debug)]
pub enum UiEvent {
    TaskFinished(TaskOutcome),
    StartRequested,
    QuitRequested,
}

/// Cloneable sender for user events.
#[derive(Debug, Clone)]
pub struct LauncherHandle {
    tx: Sender<UiEvent>,
}

impl LauncherHandle {
    /// Ask to start the service. Honored only while ready to start.
    ///
    /// Returns `false` once the loop has gone away.
    pub fn request_start(&self) -> bool {
        self.tx.send(UiEvent::StartRequested).is_ok()
    }

    pub fn request_quit(&self) -> bool {
        self.tx.send(UiEvent::QuitRequested).is_ok()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Delay before the first stage is dispatched.
    pub startup_delay: Duration,
    /// Keep the loop alive after a setup failure until the user quits.
    pub linger_on_failure: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The service started and the interactive context was dismissed.
    Dismissed,
    /// Setup failed with the recorded reason.
    Failed(String),
    /// The user quit; carries the stage at that moment.
    Quit(Stage),
}

pub struct Driver {
    engine: Arc<dyn Engine>,
    orchestrator: Orchestrator,
    options: DriverOptions,
    tx: Sender<UiEvent>,
    rx: Receiver<UiEvent>,
    in_flight: Option<JoinHandle<()>>,
    journal: RunJournal,
}

impl Driver {
    /// The engine must already be initialized.
    pub fn new(engine: Arc<dyn Engine>, options: DriverOptions) -> Self {
        let (tx, rx) = unbounded();
        Self {
            engine,
            orchestrator: Orchestrator::new(),
            options,
            tx,
            rx,
            in_flight: None,
            journal: RunJournal::start(),
        }
    }

    pub fn handle(&self) -> LauncherHandle {
        LauncherHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn stage(&self) -> &Stage {
        self.orchestrator.stage()
    }

    pub fn journal(&self) -> &RunJournal {
        &self.journal
    }

    /// Run the bootstrap until dismissal, quit, or (unless lingering) failure.
    ///
    /// Any in-flight task is waited for before returning.
    pub fn run(&mut self, presenter: &mut dyn Presenter) -> Result<RunOutcome> {
        let result = self.event_loop(presenter);
        self.reap();
        result
    }

    fn event_loop(&mut self, presenter: &mut dyn Presenter) -> Result<RunOutcome> {
        presenter.apply_controls(self.orchestrator.controls())?;
        tracing::debug!(
            delay_ms = self.options.startup_delay.as_millis(),
            "startup scheduled"
        );
        let mut timer = after(self.options.startup_delay);
        let rx = self.rx.clone();

        loop {
            let before = self.orchestrator.stage().clone();
            let effects = select! {
                recv(timer) -> _ => {
                    timer = never();
                    self.orchestrator.on_timer()
                }
                recv(rx) -> event => match event {
                    Ok(UiEvent::TaskFinished(outcome)) => {
                        self.reap();
                        self.orchestrator.on_task_finished(outcome)
                    }
                    Ok(UiEvent::StartRequested) => self.orchestrator.on_start_requested(),
                    Ok(UiEvent::QuitRequested) | Err(_) => {
                        tracing::info!(stage = %before, "quit requested");
                        if let Some(task) = self.orchestrator.in_flight() {
                            tracing::info!(task = task.name(), "waiting for in-flight task");
                            presenter.show_status(&StatusMessage::new(STATUS_WAITING))?;
                        }
                        return Ok(RunOutcome::Quit(before));
                    }
                }
            };
            self.journal
                .record_transition(&before, self.orchestrator.stage());
            if let Some(outcome) = self.apply(effects, presenter)? {
                return Ok(outcome);
            }
        }
    }

    fn apply(
        &mut self,
        effects: Vec<Effect>,
        presenter: &mut dyn Presenter,
    ) -> Result<Option<RunOutcome>> {
        let mut dismissed = false;
        for effect in effects {
            match effect {
                Effect::Status(message) => {
                    tracing::info!(status = %message, "status");
                    self.journal.record_status(&message);
                    presenter.show_status(&message)?;
                }
                Effect::Controls(controls) => presenter.apply_controls(controls)?,
                Effect::FailureNotice(notice) => {
                    self.journal.record_notice(&notice);
                    presenter.notify_failure(&notice)?;
                }
                Effect::Dismiss => {
                    presenter.dismiss()?;
                    dismissed = true;
                }
                Effect::Dispatch(task) => self.spawn(task),
            }
        }
        if dismissed {
            return Ok(Some(RunOutcome::Dismissed));
        }
        if let Stage::Failed(reason) = self.orchestrator.stage() {
            if !self.options.linger_on_failure {
                return Ok(Some(RunOutcome::Failed(reason.clone())));
            }
        }
        Ok(None)
    }

    fn spawn(&mut self, task: Task) {
        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("mlaunch-{}", task.name()))
            .spawn(move || {
                let outcome = task.run(engine.as_ref());
                // The driver joins every task before dropping the receiver.
                let _ = tx.send(UiEvent::TaskFinished(outcome));
            });
        match spawned {
            Ok(handle) => {
                tracing::debug!(task = task.name(), "task dispatched");
                self.in_flight = Some(handle);
            }
            Err(err) => {
                tracing::error!(task = task.name(), error = %err, "spawn task thread");
                let outcome = task.failed(format!("spawn task thread: {err}"));
                let _ = self.tx.send(UiEvent::TaskFinished(outcome));
            }
        }
    }

    fn reap(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if handle.join().is_err() {
                tracing::warn!("task thread exited abnormally");
            }
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
