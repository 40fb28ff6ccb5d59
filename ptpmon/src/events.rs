//! Event deriver and event log
//!
//! Notable transitions between consecutive slave status reports of a node
//! become events. An event is identified by its node and type; repeated
//! triggers only add instances to it, and it stays until the user clears it.

use crate::record::{PortState, SlaveStatus, Timestamp};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Event types, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventType {
    Alarmed,
    BondChanged,
    LeftSlaveState,
    LostSync,
}

impl EventType {
    pub fn name(self) -> &'static str {
        match self {
            EventType::Alarmed => "alarmed",
            EventType::BondChanged => "bond-changed",
            EventType::LeftSlaveState => "left-slave-state",
            EventType::LostSync => "lost-sync",
        }
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Orders by event type first, then by node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub kind: EventType,
    pub node: String,
}

impl EventKey {
    pub fn new(node: impl Into<String>, kind: EventType) -> Self {
        EventKey {
            kind,
            node: node.into(),
        }
    }
}

impl Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.node)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub kind: EventType,
    pub description: Option<String>,
}

/// Compares two consecutive reports of the same node. Every rule is checked,
/// so one report can raise several events.
pub fn derive(previous: &SlaveStatus, current: &SlaveStatus) -> Vec<Trigger> {
    let mut triggers = Vec::new();

    if current.bond_changed {
        triggers.push(Trigger {
            kind: EventType::BondChanged,
            description: None,
        });
    }

    if current.is_alarmed() && !previous.is_alarmed() {
        triggers.push(Trigger {
            kind: EventType::Alarmed,
            description: Some(current.all_alarms().collect::<Vec<_>>().join(",")),
        });
    }

    if current.state != PortState::Slave && previous.state == PortState::Slave {
        triggers.push(Trigger {
            kind: EventType::LeftSlaveState,
            description: None,
        });
    }

    if !current.in_sync && previous.in_sync {
        triggers.push(Trigger {
            kind: EventType::LostSync,
            description: None,
        });
    }

    triggers
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub first_timestamp: Timestamp,
    pub description: Option<String>,
    pub instances: Vec<SlaveStatus>,
}

impl Event {
    /// Instances in ascending timestamp order.
    pub fn instances_by_time(&self) -> Vec<&SlaveStatus> {
        let mut instances: Vec<_> = self.instances.iter().collect();
        instances.sort_by_key(|s| s.monitor_timestamp);
        instances
    }
}

/// Uncleared events.
#[derive(Debug, Default)]
pub struct EventLog {
    events: BTreeMap<EventKey, Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the event for `(instance.node, trigger.kind)` or appends
    /// `instance` to the existing one. Returns the key.
    pub fn record(&mut self, trigger: Trigger, instance: SlaveStatus) -> EventKey {
        let key = EventKey::new(instance.node.clone(), trigger.kind);
        match self.events.get_mut(&key) {
            Some(event) => event.instances.push(instance),
            None => {
                self.events.insert(
                    key.clone(),
                    Event {
                        first_timestamp: instance.monitor_timestamp,
                        description: trigger.description,
                        instances: vec![instance],
                    },
                );
            }
        }
        key
    }

    pub fn get(&self, key: &EventKey) -> Option<&Event> {
        self.events.get(key)
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.events.contains_key(key)
    }

    pub fn clear(&mut self, key: &EventKey) -> Option<Event> {
        self.events.remove(key)
    }

    pub fn clear_all(&mut self) {
        self.events.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EventKey, &Event)> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: &str, in_sync: bool, alarms: &[&str]) -> SlaveStatus {
        SlaveStatus {
            monitor_seq_id: None,
            monitor_timestamp: Timestamp::parse("2024-05-01 12:00:00.000000").unwrap(),
            node: "eth0".into(),
            gm_id: None,
            state: PortState::from(state),
            bond_changed: false,
            selected: true,
            in_sync,
            msg_alarms: vec![],
            alarms: alarms.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn kinds(triggers: &[Trigger]) -> Vec<EventType> {
        triggers.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn no_change_no_events() {
        let s = status("SLAVE", true, &[]);
        assert!(derive(&s, &s).is_empty());
    }

    #[test]
    fn left_slave_without_losing_sync() {
        let prev = status("SLAVE", true, &[]);
        let cur = status("MASTER", true, &[]);
        assert_eq!(kinds(&derive(&prev, &cur)), vec![EventType::LeftSlaveState]);
    }

    #[test]
    fn all_rules_fire_together() {
        let prev = status("SLAVE", true, &[]);
        let mut cur = status("LISTENING", false, &["no-sync"]);
        cur.msg_alarms = vec!["no-announce".into()];
        cur.bond_changed = true;
        let triggers = derive(&prev, &cur);
        assert_eq!(
            kinds(&triggers),
            vec![
                EventType::BondChanged,
                EventType::Alarmed,
                EventType::LeftSlaveState,
                EventType::LostSync
            ]
        );
        assert_eq!(
            triggers[1].description.as_deref(),
            Some("no-announce,no-sync")
        );
        assert_eq!(triggers[0].description, None);
    }

    #[test]
    fn staying_alarmed_is_not_new() {
        let prev = status("SLAVE", true, &["a"]);
        let cur = status("SLAVE", true, &["b"]);
        assert!(derive(&prev, &cur).is_empty());
    }

    #[test]
    fn repeated_triggers_append_instances() {
        let mut log = EventLog::new();
        let mut first = status("MASTER", true, &["x"]);
        first.monitor_timestamp = Timestamp::parse("2024-05-01 12:00:05.000000").unwrap();
        let mut second = status("MASTER", true, &["y"]);
        second.monitor_timestamp = Timestamp::parse("2024-05-01 12:00:01.000000").unwrap();

        let trigger = |d: &str| Trigger {
            kind: EventType::Alarmed,
            description: Some(d.into()),
        };
        let key = log.record(trigger("x"), first.clone());
        assert_eq!(log.record(trigger("y"), second.clone()), key);

        assert_eq!(log.len(), 1);
        let event = log.get(&key).unwrap();
        assert_eq!(event.first_timestamp, first.monitor_timestamp);
        assert_eq!(event.description.as_deref(), Some("x"));
        assert_eq!(event.instances, vec![first.clone(), second.clone()]);
        assert_eq!(event.instances_by_time(), vec![&second, &first]);
    }

    #[test]
    fn iteration_orders_by_type_then_node() {
        let mut log = EventLog::new();
        for (node, kind) in [
            ("b", EventType::LostSync),
            ("a", EventType::LostSync),
            ("z", EventType::Alarmed),
            ("c", EventType::BondChanged),
        ] {
            let mut s = status("SLAVE", true, &[]);
            s.node = node.into();
            log.record(
                Trigger {
                    kind,
                    description: None,
                },
                s,
            );
        }
        let keys: Vec<String> = log.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["alarmed: z", "bond-changed: c", "lost-sync: a", "lost-sync: b"]
        );
    }

    #[test]
    fn clearing() {
        let mut log = EventLog::new();
        let s = status("SLAVE", true, &[]);
        let a = log.record(
            Trigger {
                kind: EventType::LostSync,
                description: None,
            },
            s.clone(),
        );
        let b = log.record(
            Trigger {
                kind: EventType::BondChanged,
                description: None,
            },
            s,
        );
        assert!(log.clear(&a).is_some());
        assert!(!log.contains(&a));
        assert!(log.contains(&b));
        log.clear_all();
        assert!(log.is_empty());
    }
}
