//! Provides a basic system for the UI framework.
//! Upon starting the program, it performs basic initialization.
//! It tracks "drop", so when the program exits, it can perform cleanup.

use crate::top_level_ui::TopUi;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use qosmate_config::Config;
use qosmate_flows::FlowSnapshot;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::stdout,
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::{sync::watch, task::yield_now};
use tracing::warn;

pub static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);

pub struct UiBase {
    ui: TopUi,
}

impl UiBase {
    /// Create a new UiBase instance. This will initialize the UI framework.
    pub fn new(config: &Config, updates: watch::Receiver<FlowSnapshot>) -> Result<Self> {
        // Crossterm mode setup
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        // Setup Control-C Handler for graceful shutdown
        if let Err(e) = ctrlc::set_handler(move || {
            Self::cleanup();
            std::process::exit(0);
        }) {
            warn!("Unable to install the Control-C handler: {e}");
        }

        Ok(UiBase {
            ui: TopUi::new(config, updates),
        })
    }

    /// Runs until the user quits, redrawing whenever a key is pressed or
    /// the poller publishes new data.
    pub async fn event_loop(&mut self) -> Result<()> {
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        while !SHOULD_EXIT.load(Ordering::Relaxed) {
            if event::poll(std::time::Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.ui.handle_key(key) {
                        SHOULD_EXIT.store(true, Ordering::Relaxed);
                    }
                }
            }

            self.ui.render(&mut terminal)?;

            // Ensure that the poller gets a look in
            yield_now().await;
        }
        Ok(())
    }

    fn cleanup() {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

impl Drop for UiBase {
    fn drop(&mut self) {
        Self::cleanup();
    }
}
