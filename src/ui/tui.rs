//! Full-screen launcher view.
//!
//! The view redraws after every effect; there is no frame timer because
//! nothing on screen changes between effects.
use super::terminal::TerminalGuard;
use super::Presenter;
use crate::bootstrap::{StatusMessage, UiControlState};
use anyhow::{Context, Result};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};

const TITLE: &str = "Media launcher";
/// Older notices are dropped beyond this many.
const MAX_NOTICES: usize = 3;

struct LauncherView {
    action_label: String,
    status: String,
    controls: UiControlState,
    notices: Vec<String>,
}

pub struct TuiPresenter<B: Backend> {
    terminal: Terminal<B>,
    guard: Option<TerminalGuard>,
    view: LauncherView,
}

impl TuiPresenter<CrosstermBackend<Stdout>> {
    /// Take over the terminal until the presenter is dismissed or dropped.
    pub fn stdout(action_label: &str, initial: UiControlState) -> Result<Self> {
        let guard = TerminalGuard::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend).context("init terminal")?;
        Ok(Self::with_terminal(terminal, Some(guard), action_label, initial))
    }
}

impl<B: Backend> TuiPresenter<B> {
    fn with_terminal(
        terminal: Terminal<B>,
        guard: Option<TerminalGuard>,
        action_label: &str,
        initial: UiControlState,
    ) -> Self {
        Self {
            terminal,
            guard,
            view: LauncherView {
                action_label: action_label.to_string(),
                status: "Preparing...".to_string(),
                controls: initial,
                notices: Vec::new(),
            },
        }
    }

    fn release(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            guard.restore();
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let view = &self.view;
        self.terminal
            .draw(|frame| render(view, frame))
            .context("draw launcher ui")?;
        Ok(())
    }
}

impl<B: Backend> Presenter for TuiPresenter<B> {
    fn show_status(&mut self, status: &StatusMessage) -> Result<()> {
        self.view.status = status.as_str().to_string();
        self.redraw()
    }

    fn apply_controls(&mut self, controls: UiControlState) -> Result<()> {
        self.view.controls = controls;
        self.redraw()
    }

    fn notify_failure(&mut self, notice: &str) -> Result<()> {
        self.view.notices.push(notice.to_string());
        let excess = self.view.notices.len().saturating_sub(MAX_NOTICES);
        self.view.notices.drain(..excess);
        self.redraw()
    }

    fn dismiss(&mut self) -> Result<()> {
        self.redraw()?;
        self.release();
        Ok(())
    }
}

fn render(view: &LauncherView, frame: &mut Frame) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(frame, layout[0]);
    draw_status(view, frame, layout[1]);
    draw_action(view, frame, layout[2]);
    draw_notices(view, frame, layout[3]);
    draw_footer(view, frame, layout[4]);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        TITLE,
        Style::default().add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_status(view: &LauncherView, frame: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from(view.status.as_str())];
    if view.controls.busy {
        lines.push(Line::from(Span::styled(
            "working...",
            Style::default().fg(Color::Cyan),
        )));
    }
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_action(view: &LauncherView, frame: &mut Frame, area: Rect) {
    if !view.controls.action_visible {
        return;
    }
    let style = if view.controls.action_enabled {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let label = format!("[ {} ]", view.action_label);
    let paragraph = Paragraph::new(Line::from(Span::styled(label, style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn draw_notices(view: &LauncherView, frame: &mut Frame, area: Rect) {
    if view.notices.is_empty() {
        return;
    }
    let items = view
        .notices
        .iter()
        .map(|notice| {
            ListItem::new(Line::from(Span::styled(
                notice.as_str(),
                Style::default().fg(Color::Red),
            )))
        })
        .collect::<Vec<_>>();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Notices"));
    frame.render_widget(list, area);
}

fn draw_footer(view: &LauncherView, frame: &mut Frame, area: Rect) {
    let hint = if view.controls.action_enabled {
        "Enter start | q quit"
    } else {
        "q quit"
    };
    let line = Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::Stage;
    use ratatui::backend::TestBackend;

    fn presenter(stage: &Stage) -> TuiPresenter<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(60, 14)).expect("test terminal");
        TuiPresenter::with_terminal(
            terminal,
            None,
            "Start media center",
            UiControlState::for_stage(stage),
        )
    }

    fn screen(presenter: &TuiPresenter<TestBackend>) -> String {
        let buffer = presenter.terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn start_control_hidden_during_setup() {
        let mut presenter = presenter(&Stage::Idle);
        presenter
            .show_status(&StatusMessage::new("Checking system compatibility..."))
            .expect("draw");
        let text = screen(&presenter);
        assert!(text.contains("Checking system compatibility..."));
        assert!(text.contains("working..."));
        assert!(!text.contains("Start media center"));
    }

    #[test]
    fn ready_stage_shows_start_control_and_notices() {
        let mut presenter = presenter(&Stage::Idle);
        presenter
            .apply_controls(UiControlState::for_stage(&Stage::ReadyToStart))
            .expect("draw");
        presenter.notify_failure("Startup failed").expect("draw");
        let text = screen(&presenter);
        assert!(text.contains("[ Start media center ]"));
        assert!(text.contains("Startup failed"));
        assert!(text.contains("Enter start | q quit"));
        assert!(!text.contains("working..."));
    }

    #[test]
    fn notices_keep_only_the_latest() {
        let mut presenter = presenter(&Stage::ReadyToStart);
        for attempt in 1..=6 {
            presenter
                .notify_failure(&format!("Startup failed (attempt {attempt})"))
                .expect("draw");
        }
        assert_eq!(presenter.view.notices.len(), MAX_NOTICES);
        assert_eq!(presenter.view.notices[0], "Startup failed (attempt 4)");
        let text = screen(&presenter);
        assert!(text.contains("Startup failed (attempt 6)"));
        assert!(!text.contains("Startup failed (attempt 1)"));
    }
}
