//! Line-oriented presenter for non-TTY runs.
use super::Presenter;
use crate::bootstrap::{StatusMessage, UiControlState};
use anyhow::{Context, Result};
use std::io::{self, Write};

pub struct TextPresenter {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    action_label: String,
    prompt: bool,
    action_enabled: bool,
}

impl TextPresenter {
    /// Presenter on stdout/stderr. `prompt` prints input hints when the start
    /// control becomes available.
    pub fn stdio(action_label: &str, prompt: bool) -> Self {
        Self::new(
            Box::new(io::stdout()),
            Box::new(io::stderr()),
            action_label,
            prompt,
        )
    }

    pub fn new(
        out: Box<dyn Write>,
        err: Box<dyn Write>,
        action_label: &str,
        prompt: bool,
    ) -> Self {
        Self {
            out,
            err,
            action_label: action_label.to_string(),
            prompt,
            action_enabled: false,
        }
    }
}

impl Presenter for TextPresenter {
    fn show_status(&mut self, status: &StatusMessage) -> Result<()> {
        writeln!(self.out, "status: {status}").context("write status")?;
        self.out.flush().context("flush status")
    }

    fn apply_controls(&mut self, controls: UiControlState) -> Result<()> {
        let newly_enabled = controls.action_enabled && !self.action_enabled;
        self.action_enabled = controls.action_enabled;
        if newly_enabled && self.prompt {
            writeln!(
                self.out,
                "ready: press Enter to {} (or type quit)",
                self.action_label.to_lowercase()
            )
            .context("write prompt")?;
            self.out.flush().context("flush prompt")?;
        }
        Ok(())
    }

    fn notify_failure(&mut self, notice: &str) -> Result<()> {
        writeln!(self.err, "error: {notice}").context("write failure notice")?;
        self.err.flush().context("flush failure notice")
    }

    fn dismiss(&mut self) -> Result<()> {
        writeln!(self.out, "handed off to the media service").context("write dismissal")?;
        self.out.flush().context("flush dismissal")
    }
}
