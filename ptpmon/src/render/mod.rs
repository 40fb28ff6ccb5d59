//! Render engine
//!
//! Builds the four panels (nodes, current alarms, uncleared events and the
//! event detail popup) from the monitor state and hands them to a `Terminal`.

mod panels;

pub use panels::{alarms, details, events, format_age, nodes, EventsView};

use crate::events::EventKey;
use crate::monitor::Monitor;
use crate::terminal::{Panel, Refresh, Terminal};
use chrono::NaiveDateTime;
use std::io;

pub const NODES_TITLE: &str = "nodes";
pub const ALARMS_TITLE: &str = "current alarms";
pub const EVENTS_TITLE: &str = "uncleared events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Default,
    /// Selected and in sync.
    Synced,
    Alarmed,
    /// Key shortcut hint; drawn underlined.
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new() -> Line {
        Line::default()
    }

    pub fn plain(text: impl Into<String>) -> Line {
        Line::styled(text, Style::Default)
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Line {
        let mut line = Line::new();
        line.push(text, style);
        line
    }

    pub fn push(&mut self, text: impl Into<String>, style: Style) -> &mut Line {
        self.spans.push(Span {
            text: text.into(),
            style,
        });
        self
    }

    /// The line's text without styling.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// The area inside a one-cell border.
    pub fn interior(&self) -> Rect {
        Rect {
            x: self.x.saturating_add(1),
            y: self.y.saturating_add(1),
            width: self.width.saturating_sub(2),
            height: self.height.saturating_sub(2),
        }
    }
}

/// Panel geometry for a given screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub nodes: Rect,
    pub alarms: Rect,
    pub events: Rect,
    pub details: Rect,
}

impl Layout {
    /// Nodes across the top half, alarms and events splitting the bottom
    /// half, and the popup centred at three quarters of the screen.
    pub fn compute(width: u16, height: u16) -> Layout {
        let top = height / 2;
        let left = width / 2;
        Layout {
            nodes: Rect::new(0, 0, width, top),
            alarms: Rect::new(0, top, left, height - top),
            events: Rect::new(left, top, width - left, height - top),
            details: Rect::new(
                width / 8,
                height / 8,
                (width as u32 * 3 / 4) as u16,
                (height as u32 * 3 / 4) as u16,
            ),
        }
    }
}

pub fn details_title(key: &EventKey) -> String {
    format!("detail: {}: {}: {}", EVENTS_TITLE, key.kind, key.node)
}

/// Draws the console and remembers which event each shortcut digit selects.
pub struct Renderer {
    size: (u16, u16),
    layout: Layout,
    shortcuts: Vec<EventKey>,
}

impl Renderer {
    pub fn new(width: u16, height: u16) -> Renderer {
        Renderer {
            size: (width, height),
            layout: Layout::compute(width, height),
            shortcuts: Vec::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Recomputes the layout. Returns false if the size did not change.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        if self.size == (width, height) {
            return false;
        }
        self.size = (width, height);
        self.layout = Layout::compute(width, height);
        true
    }

    /// Events reachable with digit keys, as of the last render.
    pub fn shortcuts(&self) -> &[EventKey] {
        &self.shortcuts
    }

    pub fn shortcut(&self, digit: usize) -> Option<&EventKey> {
        self.shortcuts.get(digit)
    }

    pub fn invalidate_shortcuts(&mut self) {
        self.shortcuts.clear();
    }

    pub fn render<T: Terminal>(
        &mut self,
        term: &mut T,
        monitor: &Monitor,
        selected: Option<&EventKey>,
        now: NaiveDateTime,
        refresh: Refresh,
    ) -> io::Result<()> {
        let node_lines = nodes(monitor.nodes(), now);
        term.draw_panel(
            &Panel {
                area: self.layout.nodes,
                title: NODES_TITLE,
                lines: &node_lines,
            },
            refresh,
        )?;

        let alarm_lines = alarms(monitor.nodes());
        term.draw_panel(
            &Panel {
                area: self.layout.alarms,
                title: ALARMS_TITLE,
                lines: &alarm_lines,
            },
            refresh,
        )?;

        let view = events(monitor.events(), now);
        term.draw_panel(
            &Panel {
                area: self.layout.events,
                title: EVENTS_TITLE,
                lines: &view.lines,
            },
            refresh,
        )?;
        self.shortcuts = view.shortcuts;

        if let Some(key) = selected {
            if let Some(event) = monitor.events().get(key) {
                let title = details_title(key);
                let detail_lines = details(event);
                // The popup overlaps the other panels, so it is always redrawn whole.
                term.draw_panel(
                    &Panel {
                        area: self.layout.details,
                        title: &title,
                        lines: &detail_lines,
                    },
                    Refresh::Full,
                )?;
            }
        }

        term.flush()
    }
}
