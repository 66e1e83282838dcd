//! TUI application state and event loop.
//!
//! The source delivers on its own thread; the loop drains the driver on every
//! tick, so the dashboard is only ever mutated here.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use sensordash_core::{Dashboard, DriverState, Metric, SourceInfo, SubscriptionDriver};

/// How long the loop waits for a key before draining the driver again.
const TICK: Duration = Duration::from_millis(50);

pub struct App {
    dash: Dashboard,
    driver: SubscriptionDriver,
    running: bool,
    paused: bool,
    /// Last window export written with 's'.
    last_export: Option<PathBuf>,
    /// Last subscription or export error to surface in the TUI.
    error: Option<String>,
}

impl App {
    pub fn new(driver: SubscriptionDriver, metric: Metric, chart_visible: bool) -> Self {
        Self {
            dash: Dashboard::new(metric, chart_visible),
            driver,
            running: true,
            paused: false,
            last_export: None,
            error: None,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        self.driver.stop();
        if let Some(path) = &self.last_export {
            println!("Last window export: {}", path.display());
        }

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        self.resume();

        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(TICK)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }

            self.driver.pump(&mut self.dash);
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('g') | KeyCode::Char(' ') => self.dash.toggle_chart(),
            KeyCode::Right | KeyCode::Char('l') => self.dash.select_next(),
            KeyCode::Left | KeyCode::Char('h') => self.dash.select_prev(),
            KeyCode::Char(c @ '1'..='7') => {
                let idx = c as usize - '1' as usize;
                self.dash.select(Metric::PICKER_ORDER[idx]);
            }
            KeyCode::Char('p') => {
                if self.paused {
                    self.resume();
                } else {
                    self.driver.stop();
                    self.paused = true;
                }
            }
            KeyCode::Char('s') => self.export_window(Path::new(".")),
            _ => {}
        }
    }

    fn resume(&mut self) {
        match self.driver.start() {
            Ok(()) => {
                self.paused = false;
                self.error = None;
            }
            Err(e) => {
                log::error!("subscribe failed: {e}");
                self.paused = true;
                self.error = Some(e.to_string());
            }
        }
    }

    /// Write the current window to `sensordash-window-<epoch>.json` in `dir`.
    fn export_window(&mut self, dir: &Path) {
        let path = dir.join(format!("sensordash-window-{}.json", Utc::now().timestamp()));
        let written = serde_json::to_string_pretty(&self.dash.export())
            .map_err(io::Error::from)
            .and_then(|contents| std::fs::write(&path, contents));
        match written {
            Ok(()) => {
                log::info!("exported window to {}", path.display());
                self.last_export = Some(path);
                self.error = None;
            }
            Err(e) => self.error = Some(format!("export failed: {e}")),
        }
    }

    // --- Accessors for the renderer ---

    pub fn dashboard(&self) -> &Dashboard {
        &self.dash
    }

    pub fn source_info(&self) -> &SourceInfo {
        self.driver.source_info()
    }

    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    pub fn source_closed(&self) -> bool {
        self.driver.source_closed()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn last_export(&self) -> Option<&Path> {
        self.last_export.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
