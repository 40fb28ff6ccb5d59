//! Applies decoded records to the node store and the event log.

use crate::events::{self, EventKey, EventLog};
use crate::record::{self, DecodeError, Record};
use crate::store::{NodeStore, StoreError};
use log::{debug, warn};

/// Outcome of applying one record.
#[derive(Debug, Default, PartialEq)]
pub struct Applied {
    /// Events raised, one entry per trigger.
    pub triggered: Vec<EventKey>,
    /// Updates skipped because the record did not fit the current state.
    pub warnings: Vec<StoreError>,
}

/// Running totals, kept for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub lines: u64,
    pub malformed: u64,
    pub integrity_warnings: u64,
    pub triggers: u64,
}

#[derive(Debug, Default)]
pub struct Monitor {
    nodes: NodeStore,
    events: EventLog,
    stats: Stats,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Decodes and applies one line of the log.
    pub fn apply_line<B: AsRef<[u8]>>(&mut self, line: B) -> Result<Applied, DecodeError> {
        self.stats.lines += 1;
        match record::decode_line(line) {
            Ok(rec) => Ok(self.apply(rec)),
            Err(e) => {
                self.stats.malformed += 1;
                match &e {
                    DecodeError::Blank => debug!("skipping blank line"),
                    DecodeError::Utf8(_) | DecodeError::Json(_) => {
                        warn!("discarding line: {}", e)
                    }
                }
                Err(e)
            }
        }
    }

    /// Applies every facet of `rec` in turn. A facet that refers to an
    /// unknown node is skipped without affecting the others.
    pub fn apply(&mut self, rec: Record) -> Applied {
        let mut applied = Applied::default();
        if rec.is_empty() {
            debug!("line carries no monitor record");
            return applied;
        }

        if let Some(identity) = rec.node {
            let port_id = identity.port_id.clone();
            if self.nodes.upsert_identity(identity) {
                debug!("new node {}", port_id);
            }
        }

        if let Some(rx) = rec.rx_event {
            if rx.has_computed_data() && rx.has_timing_data() {
                let res = self.nodes.update_rx_computed(rx.clone());
                self.note(res, &mut applied);
                let res = self.nodes.update_rx_timestamped(rx);
                self.note(res, &mut applied);
            } else if rx.has_computed_data() {
                let res = self.nodes.update_rx_computed(rx);
                self.note(res, &mut applied);
            } else if rx.has_timing_data() {
                let res = self.nodes.update_rx_timestamped(rx);
                self.note(res, &mut applied);
            }
        }

        if let Some(tx) = rec.tx_event {
            let res = self.nodes.update_tx(tx);
            self.note(res, &mut applied);
        }

        if let Some(status) = rec.slave_status {
            match self.nodes.update_slave_status(status.clone()) {
                Ok(Some(previous)) => {
                    for trigger in events::derive(&previous, &status) {
                        let key = self.events.record(trigger, status.clone());
                        debug!("event {}", key);
                        self.stats.triggers += 1;
                        applied.triggered.push(key);
                    }
                }
                Ok(None) => debug!("baseline slave status for {}", status.node),
                Err(e) => self.note::<()>(Err(e), &mut applied),
            }
        }

        applied
    }

    fn note<T>(&mut self, res: Result<T, StoreError>, applied: &mut Applied) {
        if let Err(e) = res {
            warn!("data integrity: {}", e);
            self.stats.integrity_warnings += 1;
            applied.warnings.push(e);
        }
    }
}
