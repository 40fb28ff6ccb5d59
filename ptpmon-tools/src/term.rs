//! crossterm backend for the console.

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{
    self, Attribute, Color, ResetColor, SetAttribute, SetForegroundColor,
};
use crossterm::{cursor, terminal, ExecutableCommand, QueueableCommand};
use ptpmon::render::{Line, Rect, Style};
use ptpmon::{Key, Panel, Refresh, Terminal};
use std::io::{self, Write};
use std::time::Duration;

/// Full-screen raw-mode terminal. Dropping it restores the normal screen.
pub struct CrosstermTerminal {
    stdout: io::Stdout,
    active: bool,
}

impl CrosstermTerminal {
    pub fn setup() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on, drop restores the terminal if anything fails.
        let mut tui = CrosstermTerminal {
            stdout: io::stdout(),
            active: true,
        };
        tui.stdout.execute(terminal::EnterAlternateScreen)?;
        tui.stdout.execute(cursor::Hide)?;
        tui.stdout
            .execute(terminal::Clear(terminal::ClearType::All))?;
        Ok(tui)
    }

    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let _ = self.stdout.execute(ResetColor);
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }

    /// Makes a panic leave the terminal usable before the message is printed.
    pub fn install_panic_hook() {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let mut t = CrosstermTerminal {
                stdout: io::stdout(),
                active: true,
            };
            t.teardown();
            original_hook(panic_info);
        }));
    }

    fn set_style(&mut self, style: Style) -> io::Result<()> {
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        match style {
            Style::Default => {}
            Style::Synced => {
                self.stdout.queue(SetForegroundColor(Color::Green))?;
            }
            Style::Alarmed => {
                self.stdout.queue(SetForegroundColor(Color::Red))?;
            }
            Style::Link => {
                self.stdout.queue(SetForegroundColor(Color::Blue))?;
                self.stdout.queue(SetAttribute(Attribute::Underlined))?;
            }
        }
        Ok(())
    }

    fn draw_border(&mut self, area: Rect, title: &str) -> io::Result<()> {
        if area.width < 2 || area.height < 2 {
            return Ok(());
        }
        let inner = (area.width - 2) as usize;
        let right = area.x + area.width - 1;
        let bottom = area.y + area.height - 1;

        self.set_style(Style::Default)?;
        self.stdout.queue(cursor::MoveTo(area.x, area.y))?;
        self.stdout
            .queue(style::Print(format!("┌{}┐", "─".repeat(inner))))?;
        for y in area.y + 1..bottom {
            self.stdout.queue(cursor::MoveTo(area.x, y))?;
            self.stdout.queue(style::Print("│"))?;
            self.stdout.queue(cursor::MoveTo(right, y))?;
            self.stdout.queue(style::Print("│"))?;
        }
        self.stdout.queue(cursor::MoveTo(area.x, bottom))?;
        self.stdout
            .queue(style::Print(format!("└{}┘", "─".repeat(inner))))?;

        let room = (area.width as usize).saturating_sub(4);
        if room > 0 {
            let label: String = format!(" {} ", title).chars().take(room).collect();
            self.stdout.queue(cursor::MoveTo(area.x + 2, area.y))?;
            self.stdout.queue(SetAttribute(Attribute::Bold))?;
            self.stdout.queue(style::Print(label))?;
            self.stdout.queue(SetAttribute(Attribute::Reset))?;
        }
        Ok(())
    }

    fn draw_line(&mut self, line: Option<&Line>, width: usize) -> io::Result<()> {
        let mut used = 0;
        if let Some(line) = line {
            for span in &line.spans {
                if used >= width {
                    break;
                }
                let text: String = span.text.chars().take(width - used).collect();
                used += text.chars().count();
                self.set_style(span.style)?;
                self.stdout.queue(style::Print(text))?;
            }
        }
        self.set_style(Style::Default)?;
        if used < width {
            self.stdout
                .queue(style::Print(" ".repeat(width - used)))?;
        }
        Ok(())
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Char('c') if ctrl => Some(Key::Interrupt),
        KeyCode::Char('l') if ctrl => Some(Key::Refresh),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(ch) => Some(Key::Char(ch)),
        KeyCode::Esc => Some(Key::Esc),
        _ => None,
    }
}

impl Terminal for CrosstermTerminal {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn poll_key(&mut self) -> io::Result<Option<Key>> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    if let Some(key) = map_key(k.code, k.modifiers) {
                        return Ok(Some(key));
                    }
                }
                Event::Resize(width, height) => return Ok(Some(Key::Resize(width, height))),
                _ => {}
            }
        }
        Ok(None)
    }

    fn draw_panel(&mut self, panel: &Panel, refresh: Refresh) -> io::Result<()> {
        if refresh == Refresh::Full {
            self.draw_border(panel.area, panel.title)?;
        }
        let inner = panel.area.interior();
        for row in 0..inner.height {
            self.stdout.queue(cursor::MoveTo(inner.x, inner.y + row))?;
            self.draw_line(panel.lines.get(row as usize), inner.width as usize)?;
        }
        Ok(())
    }

    fn alert(&mut self) -> io::Result<()> {
        self.stdout.queue(style::Print('\x07'))?;
        self.stdout.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mapping() {
        assert_eq!(
            map_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Key::Interrupt)
        );
        assert_eq!(
            map_key(KeyCode::Char('l'), KeyModifiers::CONTROL),
            Some(Key::Refresh)
        );
        assert_eq!(
            map_key(KeyCode::Char('c'), KeyModifiers::NONE),
            Some(Key::Char('c'))
        );
        assert_eq!(
            map_key(KeyCode::Char('7'), KeyModifiers::SHIFT),
            Some(Key::Char('7'))
        );
        assert_eq!(map_key(KeyCode::Esc, KeyModifiers::NONE), Some(Key::Esc));
        assert_eq!(map_key(KeyCode::Up, KeyModifiers::NONE), None);
    }
}
