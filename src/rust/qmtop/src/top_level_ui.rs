//! The flow view. Owns the presenter state (filter, sort column and
//! direction), turns key presses into presenter commands and renders the
//! latest snapshot published by the poller.

use crate::widgets::{help_line, status_line, TableHelper};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use qosmate_config::Config;
use qosmate_flows::{FlowRow, FlowSnapshot, Presenter, SortColumn};
use ratatui::{prelude::*, Terminal};
use std::io::Stdout;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingFilter,
}

pub struct TopUi {
    presenter: Presenter,
    updates: watch::Receiver<FlowSnapshot>,
    snapshot: FlowSnapshot,
    rows: Vec<FlowRow>,
    mode: InputMode,
    dirty: bool,
}

impl TopUi {
    pub fn new(config: &Config, updates: watch::Receiver<FlowSnapshot>) -> Self {
        Self {
            presenter: Presenter::from_config(&config.display),
            updates,
            snapshot: FlowSnapshot::default(),
            rows: Vec::new(),
            mode: InputMode::Normal,
            dirty: true,
        }
    }

    /// Applies a key press. Returns true if the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match self.mode {
            InputMode::EditingFilter => match key.code {
                KeyCode::Enter | KeyCode::Esc => self.mode = InputMode::Normal,
                KeyCode::Backspace => {
                    let mut filter = self.presenter.filter().to_string();
                    filter.pop();
                    self.set_filter(filter);
                }
                KeyCode::Char(c) => {
                    let filter = format!("{}{c}", self.presenter.filter());
                    self.set_filter(filter);
                }
                _ => {}
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('/') => self.mode = InputMode::EditingFilter,
                KeyCode::Char('c') => self.set_filter(String::new()),
                KeyCode::Char(d @ '1'..='9') => {
                    let idx = d as usize - '1' as usize;
                    self.presenter.select_column(SortColumn::ALL[idx]);
                    self.dirty = true;
                }
                _ => {}
            },
        }
        false
    }

    fn set_filter(&mut self, filter: String) {
        self.presenter.set_filter(filter);
        self.dirty = true;
    }

    /// Picks up a new snapshot if the poller published one and re-renders
    /// the rows if anything changed.
    fn refresh(&mut self) {
        if self.updates.has_changed().unwrap_or(false) {
            self.snapshot = self.updates.borrow_and_update().clone();
            self.dirty = true;
        }
        if self.dirty {
            self.rows = self.presenter.render(&self.snapshot.flows);
            self.dirty = false;
        }
    }

    pub fn render(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        self.refresh();
        terminal.draw(|f| self.top_level_render(f))?;
        Ok(())
    }

    fn top_level_render(&self, frame: &mut Frame) {
        let main_layout = Layout::new(
            Direction::Vertical,
            [Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)],
        )
        .split(frame.size());

        frame.render_widget(
            status_line(&self.snapshot, &self.presenter, self.rows.len(), self.mode),
            main_layout[0],
        );

        let mut table = TableHelper::new(
            SortColumn::ALL.map(|c| format!("{}{}", c.title(), self.presenter.indicator(c))),
        );
        for row in self.rows.iter().take(main_layout[1].height as usize) {
            table.add_row(row.cells());
        }
        frame.render_widget(table.to_block(), main_layout[1]);

        frame.render_widget(help_line(self.mode), main_layout[2]);
    }
}
