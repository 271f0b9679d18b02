//! Input pumps translating user input into launcher events.
use crate::bootstrap::driver::LauncherHandle;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const KEY_POLL_MS: u64 = 100;

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Start,
    Quit,
}

/// Terminal key reader. Stops and joins on drop.
pub struct KeyPump {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyPump {
    pub fn spawn(launcher: LauncherHandle) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("mlaunch-keys".to_string())
            .spawn(move || key_loop(&launcher, &thread_stop))
            .context("spawn key reader")?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for KeyPump {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn key_loop(launcher: &LauncherHandle, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        match event::poll(Duration::from_millis(KEY_POLL_MS)) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                tracing::warn!(error = %err, "poll terminal events");
                return;
            }
        }
        let key = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
            Ok(_) => continue,
            Err(err) => {
                tracing::warn!(error = %err, "read terminal event");
                return;
            }
        };
        let delivered = match action_from_key(key) {
            Some(Action::Start) => launcher.request_start(),
            Some(Action::Quit) => launcher.request_quit(),
            None => true,
        };
        if !delivered {
            return;
        }
    }
}

fn action_from_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter | KeyCode::Char('s') => Some(Action::Start),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

/// Read stdin lines on a detached thread.
///
/// An empty line or `start` requests a start; `quit`, `q`, or end of input
/// requests a quit. The thread is left blocked on stdin when the run ends.
pub fn spawn_line_pump(launcher: LauncherHandle) -> Result<()> {
    thread::Builder::new()
        .name("mlaunch-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let delivered = match action_from_line(&line) {
                    Some(Action::Start) => launcher.request_start(),
                    Some(Action::Quit) => launcher.request_quit(),
                    None => {
                        tracing::debug!(input = line.trim(), "unrecognized input");
                        true
                    }
                };
                if !delivered {
                    return;
                }
            }
            launcher.request_quit();
        })
        .context("spawn stdin reader")?;
    Ok(())
}

fn action_from_line(line: &str) -> Option<Action> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "start" => Some(Action::Start),
        "q" | "quit" | "exit" => Some(Action::Quit),
        _ => None,
    }
}
