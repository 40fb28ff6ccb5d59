//! Input and poll loop
//!
//! One thread does everything: drain pending keys, try to read one more
//! line of the log, and when the log is idle redraw the panels and back off
//! for a short, fixed time. Nothing else ever blocks.

use crate::events::EventKey;
use crate::monitor::Monitor;
use crate::render::Renderer;
use crate::tail::LogTail;
use crate::terminal::{Key, Refresh, Terminal};
use chrono::{NaiveDateTime, Utc};
use log::debug;
use std::fmt::{self, Display};
use std::io;
use std::time::Duration;

/// Default pause when the log has nothing new.
pub const DEFAULT_IDLE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub idle: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig { idle: DEFAULT_IDLE }
    }
}

/// What the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    /// The detail popup for this event is open.
    Detail(EventKey),
}

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Quit,
    /// A line was read; more may be waiting.
    Busy,
    /// Nothing new in the log; the panels were redrawn.
    Idle,
}

#[derive(Debug)]
pub enum ConsoleError {
    /// The display is unusable.
    Terminal(io::Error),
    /// The log could not be read.
    Log(io::Error),
}

impl Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Terminal(e) => write!(f, "terminal error: {}", e),
            ConsoleError::Log(e) => write!(f, "error reading log: {}", e),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Terminal(e) | ConsoleError::Log(e) => Some(e),
        }
    }
}

fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub struct Console<T: Terminal> {
    term: T,
    tail: LogTail,
    monitor: Monitor,
    renderer: Renderer,
    mode: Mode,
    config: ConsoleConfig,
    clock: fn() -> NaiveDateTime,
    full_refresh: bool,
}

impl<T: Terminal> Console<T> {
    /// The first `step` performs a full refresh.
    pub fn new(mut term: T, tail: LogTail, config: ConsoleConfig) -> Result<Self, ConsoleError> {
        let (width, height) = term.size().map_err(ConsoleError::Terminal)?;
        Ok(Console {
            term,
            tail,
            monitor: Monitor::new(),
            renderer: Renderer::new(width, height),
            mode: Mode::Browsing,
            config,
            clock: utc_now,
            full_refresh: true,
        })
    }

    /// Replaces the wall clock used for ages.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn terminal(&self) -> &T {
        &self.term
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.term
    }

    pub fn into_terminal(self) -> T {
        self.term
    }

    /// Reacts to one key. Returns true if the console should exit.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::Interrupt => return true,
            Key::Refresh => self.full_refresh = true,
            Key::Resize(width, height) => {
                self.renderer.resize(width, height);
                self.full_refresh = true;
            }
            _ => {}
        }

        match self.mode.clone() {
            Mode::Browsing => match key {
                Key::Char('q') => return true,
                Key::Char('c') => {
                    debug!("clearing {} events", self.monitor.events().len());
                    self.monitor.events_mut().clear_all();
                    self.renderer.invalidate_shortcuts();
                }
                Key::Char(ch) => {
                    if let Some(digit) = ch.to_digit(10) {
                        self.select(digit as usize);
                    }
                }
                _ => {}
            },
            Mode::Detail(selected) => match key {
                Key::Char(' ') => {
                    debug!("clearing event {}", selected);
                    self.monitor.events_mut().clear(&selected);
                    self.close_details();
                }
                Key::Esc => self.close_details(),
                _ => {}
            },
        }
        false
    }

    fn select(&mut self, digit: usize) {
        let key = match self.renderer.shortcut(digit) {
            Some(key) if self.monitor.events().contains(key) => key.clone(),
            _ => return,
        };
        debug!("showing details for {}", key);
        self.mode = Mode::Detail(key);
        self.full_refresh = true;
    }

    fn close_details(&mut self) {
        self.mode = Mode::Browsing;
        self.full_refresh = true;
    }

    pub fn render(&mut self, refresh: Refresh) -> Result<(), ConsoleError> {
        let now = (self.clock)();
        let selected = match &self.mode {
            Mode::Browsing => None,
            Mode::Detail(key) => Some(key),
        };
        self.renderer
            .render(&mut self.term, &self.monitor, selected, now, refresh)
            .map_err(ConsoleError::Terminal)
    }

    /// Decodes and applies one line, alerting once per raised event.
    pub fn ingest(&mut self, line: &[u8]) -> Result<(), ConsoleError> {
        if let Ok(applied) = self.monitor.apply_line(line) {
            for _ in &applied.triggered {
                self.term.alert().map_err(ConsoleError::Terminal)?;
            }
        }
        Ok(())
    }

    /// One iteration of the poll loop.
    pub fn step(&mut self) -> Result<Step, ConsoleError> {
        while let Some(key) = self.term.poll_key().map_err(ConsoleError::Terminal)? {
            if self.handle_key(key) {
                return Ok(Step::Quit);
            }
        }

        let (width, height) = self.term.size().map_err(ConsoleError::Terminal)?;
        if self.renderer.resize(width, height) {
            debug!("terminal resized to {}x{}", width, height);
            self.full_refresh = true;
        }

        if self.full_refresh {
            self.full_refresh = false;
            self.render(Refresh::Full)?;
        }

        match self.tail.next_line().map_err(ConsoleError::Log)? {
            Some(line) => {
                self.ingest(&line)?;
                Ok(Step::Busy)
            }
            None => {
                self.render(Refresh::Partial)?;
                Ok(Step::Idle)
            }
        }
    }

    /// Runs until the user quits or an error occurs.
    pub fn run(&mut self) -> Result<(), ConsoleError> {
        loop {
            match self.step()? {
                Step::Quit => return Ok(()),
                Step::Busy => {}
                Step::Idle => std::thread::sleep(self.config.idle),
            }
        }
    }
}
