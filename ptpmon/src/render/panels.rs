use super::{Line, Style};
use crate::events::{Event, EventKey, EventLog, EventType};
use crate::record::Timestamp;
use crate::store::NodeStore;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Number of events that can be selected with a digit key.
const SHORTCUTS: usize = 10;

/// How long ago `ts` was, in the largest whole unit that stays small:
/// `now`, `+Ns`, `+Nm`, `+Nh` or `+Nd`.
pub fn format_age(ts: Timestamp, now: NaiveDateTime) -> String {
    let secs = (now - ts.as_naive()).num_seconds().max(0);
    if secs == 0 {
        return "now".to_string();
    }
    if secs < 61 {
        return format!("+{}s", secs);
    }
    let mins = secs / 60;
    if mins < 61 {
        return format!("+{}m", mins);
    }
    let hours = mins / 60;
    if hours < 25 {
        return format!("+{}h", hours);
    }
    format!("+{}d", hours / 24)
}

fn metric(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{:.3}", v),
        _ => "nan".to_string(),
    }
}

fn flag(set: bool, on: &str, off: &str) -> String {
    let text = if set { on } else { off };
    text.to_string()
}

pub fn nodes(store: &NodeStore, now: NaiveDateTime) -> Vec<Line> {
    let mut lines = Vec::with_capacity(store.len() + 1);
    lines.push(Line::plain(format!(
        "{:<25} | {:<6} | {:>13} | {:>13} | {:>9} | {:>3} | {:>3} | {:>4} | {:>7} | {:>7} | {}",
        "port", "domain", "offset", "mpd", "state", "sel", "syn", "alrm", "last rx", "last st",
        "address"
    )));

    for node in store.iter() {
        let (offset, mpd, last_rx) = match &node.last_rx_computed {
            Some(rx) => (
                rx.offset_from_master,
                rx.mean_path_delay,
                format_age(rx.monitor_timestamp, now),
            ),
            None => (None, None, "never".to_string()),
        };

        let mut style = Style::Default;
        let (state, sel, syn, alrm, last_st) = match &node.last_slave_status {
            Some(status) => {
                if status.selected && status.in_sync {
                    style = Style::Synced;
                }
                if status.is_alarmed() {
                    style = Style::Alarmed;
                }
                (
                    status.state.to_string(),
                    flag(status.selected, "Sel", "---"),
                    flag(status.in_sync, "Syn", "---"),
                    flag(status.is_alarmed(), "ALRM", "----"),
                    format_age(status.monitor_timestamp, now),
                )
            }
            None => (
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                "never".to_string(),
            ),
        };

        lines.push(Line::styled(
            format!(
                "{:<25} | {:<6} | {:>13} | {:>13} | {:>9} | {:>3} | {:>3} | {:>4} | {:>7} | {:>7} | {}",
                node.port_id(),
                node.identity.domain,
                metric(offset),
                metric(mpd),
                state,
                sel,
                syn,
                alrm,
                last_rx,
                last_st,
                node.identity.address
            ),
            style,
        ));
    }
    lines
}

/// Current alarms, each followed by the nodes raising it.
pub fn alarms(store: &NodeStore) -> Vec<Line> {
    let mut by_alarm: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for node in store.iter() {
        if let Some(status) = &node.last_slave_status {
            for alarm in status.all_alarms() {
                let members = by_alarm.entry(alarm).or_default();
                if members.last() != Some(&node.port_id()) {
                    members.push(node.port_id());
                }
            }
        }
    }

    let mut lines = Vec::new();
    for (alarm, members) in by_alarm {
        lines.push(Line::plain(alarm));
        for port in members {
            lines.push(Line::plain(format!("    {}", port)));
        }
    }
    lines
}

/// Content of the events panel, and the event each digit now selects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventsView {
    pub lines: Vec<Line>,
    pub shortcuts: Vec<EventKey>,
}

pub fn events(log: &EventLog, now: NaiveDateTime) -> EventsView {
    let mut view = EventsView::default();
    let mut prev_kind: Option<EventType> = None;

    for (key, event) in log.iter() {
        if prev_kind != Some(key.kind) {
            view.lines.push(Line::plain(key.kind.name()));
            prev_kind = Some(key.kind);
        }

        let mut line = Line::new();
        if view.shortcuts.len() < SHORTCUTS {
            line.push(" ", Style::Default)
                .push(view.shortcuts.len().to_string(), Style::Link);
            view.shortcuts.push(key.clone());
        } else {
            line.push("  ", Style::Default);
        }

        let style = match key.kind {
            EventType::Alarmed => Style::Alarmed,
            _ => Style::Default,
        };
        let description = event
            .description
            .as_ref()
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        line.push(
            format!(
                "{:>24} {}{}",
                key.node,
                format_age(event.first_timestamp, now),
                description
            ),
            style,
        );
        view.lines.push(line);
    }

    if !log.is_empty() {
        view.lines.push(Line::new());
        let mut hint = Line::plain("press ");
        hint.push("c", Style::Link)
            .push(" to clear events", Style::Default);
        view.lines.push(hint);
    }
    view
}

/// Every recorded instance of one event, oldest first.
pub fn details(event: &Event) -> Vec<Line> {
    let mut lines = vec![Line::plain(format!(
        "{:>27} | {:>9} | {}",
        "time", "state", "alarms"
    ))];
    for status in event.instances_by_time() {
        lines.push(Line::plain(format!(
            "{:>27} | {:>9} | {}",
            status.monitor_timestamp.to_string(),
            status.state.as_str(),
            status.all_alarms().collect::<Vec<_>>().join(" ")
        )));
    }

    lines.push(Line::new());
    let mut clear = Line::plain(" press ");
    clear
        .push("space", Style::Link)
        .push(" to clear this event", Style::Default);
    lines.push(clear);
    let mut close = Line::plain(" press ");
    close.push("esc", Style::Link).push(" to close", Style::Default);
    lines.push(close);
    lines
}
