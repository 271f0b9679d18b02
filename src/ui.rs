//! Interactive-context presenters.
//!
//! A presenter receives status text, control state, failure notices, and the
//! final dismissal from the driver. User input reaches the driver through a
//! `LauncherHandle`, never through the presenter methods.
mod input;
mod terminal;
mod text;
mod tui;

use crate::bootstrap::driver::LauncherHandle;
use crate::bootstrap::{StatusMessage, UiControlState};
use anyhow::Result;

pub use input::{spawn_line_pump, KeyPump};
pub use text::TextPresenter;
pub use tui::TuiPresenter;

/// Receives every state-visible effect, always on the interactive loop thread.
pub trait Presenter {
    fn show_status(&mut self, status: &StatusMessage) -> Result<()>;
    fn apply_controls(&mut self, controls: UiControlState) -> Result<()>;
    fn notify_failure(&mut self, notice: &str) -> Result<()>;
    fn dismiss(&mut self) -> Result<()>;
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn show_status(&mut self, status: &StatusMessage) -> Result<()> {
        (**self).show_status(status)
    }

    fn apply_controls(&mut self, controls: UiControlState) -> Result<()> {
        (**self).apply_controls(controls)
    }

    fn notify_failure(&mut self, notice: &str) -> Result<()> {
        (**self).notify_failure(notice)
    }

    fn dismiss(&mut self) -> Result<()> {
        (**self).dismiss()
    }
}

/// Issues start requests on the user's behalf.
///
/// Each time the start control becomes enabled one request is sent, up to
/// `attempts` times. Once exhausted the presenter optionally asks to quit, so
/// a run without an attached user cannot wait forever.
pub struct AutoStart<P> {
    inner: P,
    handle: LauncherHandle,
    remaining: u32,
    quit_when_exhausted: bool,
}

impl<P: Presenter> AutoStart<P> {
    pub fn new(inner: P, handle: LauncherHandle, attempts: u32, quit_when_exhausted: bool) -> Self {
        Self {
            inner,
            handle,
            remaining: attempts,
            quit_when_exhausted,
        }
    }
}

impl<P: Presenter> Presenter for AutoStart<P> {
    fn show_status(&mut self, status: &StatusMessage) -> Result<()> {
        self.inner.show_status(status)
    }

    fn apply_controls(&mut self, controls: UiControlState) -> Result<()> {
        self.inner.apply_controls(controls)?;
        if !controls.action_enabled {
            return Ok(());
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            tracing::info!(remaining = self.remaining, "auto-start requested");
            if !self.handle.request_start() {
                tracing::debug!("launcher loop gone; auto-start stopped");
                self.remaining = 0;
                self.quit_when_exhausted = false;
            }
        } else if self.quit_when_exhausted {
            tracing::info!("auto-start attempts exhausted");
            if !self.handle.request_quit() {
                tracing::debug!("launcher loop gone before quit");
            }
            self.quit_when_exhausted = false;
        }
        Ok(())
    }

    fn notify_failure(&mut self, notice: &str) -> Result<()> {
        self.inner.notify_failure(notice)
    }

    fn dismiss(&mut self) -> Result<()> {
        self.inner.dismiss()
    }
}
