#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use ptpmon::{Key, Panel, Refresh, Terminal};
use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Write};

/// One `draw_panel` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawn {
    pub title: String,
    pub refresh: Refresh,
    pub lines: Vec<String>,
}

/// Terminal that records what was drawn and replays queued keys.
pub struct MemoryTerminal {
    pub size: (u16, u16),
    pub keys: VecDeque<Key>,
    pub drawn: Vec<Drawn>,
    /// Latest content of each panel, by title.
    pub screen: BTreeMap<String, Vec<String>>,
    pub alerts: usize,
}

impl MemoryTerminal {
    pub fn new(width: u16, height: u16) -> Self {
        MemoryTerminal {
            size: (width, height),
            keys: VecDeque::new(),
            drawn: Vec::new(),
            screen: BTreeMap::new(),
            alerts: 0,
        }
    }

    pub fn panel(&self, title: &str) -> Vec<String> {
        self.screen.get(title).cloned().unwrap_or_default()
    }

    pub fn full_refreshes(&self) -> Vec<&str> {
        self.drawn
            .iter()
            .filter(|d| d.refresh == Refresh::Full)
            .map(|d| d.title.as_str())
            .collect()
    }
}

impl Terminal for MemoryTerminal {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        Ok(self.size)
    }

    fn poll_key(&mut self) -> io::Result<Option<Key>> {
        Ok(self.keys.pop_front())
    }

    fn draw_panel(&mut self, panel: &Panel, refresh: Refresh) -> io::Result<()> {
        let inner = panel.area.interior();
        let lines: Vec<String> = panel
            .lines
            .iter()
            .take(inner.height as usize)
            .map(|l| l.text().chars().take(inner.width as usize).collect())
            .collect();
        self.screen.insert(panel.title.to_string(), lines.clone());
        self.drawn.push(Drawn {
            title: panel.title.to_string(),
            refresh,
            lines,
        });
        Ok(())
    }

    fn alert(&mut self) -> io::Result<()> {
        self.alerts += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

pub fn node_line(port: &str) -> String {
    format!(
        r#"{{ "node": {{"port-id": "{}", "domain": 0, "address": "10.0.0.1" }} }}"#,
        port
    )
}

pub fn status_line(port: &str, state: &str, in_sync: bool, alarms: &[&str], time: &str) -> String {
    let alarms: Vec<String> = alarms.iter().map(|a| format!("\"{}\"", a)).collect();
    format!(
        r#"{{ "slave-status": {{"monitor-seq-id": 1, "monitor-timestamp": "2024-05-01 {}", "node": "{}", "gm-id": "gm", "state": "{}", "bond-changed": false, "selected": true, "in-sync": {}, "msg-alarms": [], "alarms": [{}]}} }}"#,
        time,
        port,
        state,
        in_sync,
        alarms.join(",")
    )
}

pub fn append<W: Write>(file: &mut W, lines: &[String]) {
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
}
