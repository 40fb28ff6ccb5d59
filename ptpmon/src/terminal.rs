//! Abstract terminal
//!
//! The console only talks to the screen and keyboard through the `Terminal`
//! trait, so the poll loop and renderers can run against an in-memory
//! implementation as easily as a real one.

use crate::render::{Line, Rect};
use std::io;

/// Keyboard and window input, already reduced to what the console reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Esc,
    /// Ctrl-C. Raw mode turns it into an ordinary key press.
    Interrupt,
    /// Ctrl-L.
    Refresh,
    /// The window changed to the given columns and rows.
    Resize(u16, u16),
}

/// How much of a panel to redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Border, title and content.
    Full,
    /// Content only.
    Partial,
}

/// A bordered, titled box and the lines to show inside it.
#[derive(Debug, Clone, Copy)]
pub struct Panel<'a> {
    pub area: Rect,
    pub title: &'a str,
    pub lines: &'a [Line],
}

pub trait Terminal {
    /// Current size as (columns, rows).
    fn size(&mut self) -> io::Result<(u16, u16)>;

    /// Returns a pending key without blocking, or `None` if there is none.
    fn poll_key(&mut self) -> io::Result<Option<Key>>;

    /// Draws `panel`. Content is clipped to the area inside the border, and
    /// interior rows past the last line are blanked.
    fn draw_panel(&mut self, panel: &Panel, refresh: Refresh) -> io::Result<()>;

    /// Audible and/or visual notification of a new event.
    fn alert(&mut self) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}
