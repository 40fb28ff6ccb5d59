//! Node state store
//!
//! Keeps the last known facts about every node seen in the log, keyed by
//! port id. The first identity record for a port is authoritative; the
//! event facets only ever refresh their own slot.

use crate::record::{NodeIdentity, RxEvent, SlaveStatus, TxEvent};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Which kind of update referenced the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    RxComputed,
    RxTimestamped,
    Tx,
    SlaveStatus,
}

impl Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Facet::RxComputed => "rx-event (computed)",
            Facet::RxTimestamped => "rx-event (timestamped)",
            Facet::Tx => "tx-event",
            Facet::SlaveStatus => "slave-status",
        })
    }
}

/// Data integrity problems found while applying an update. These are
/// warnings: the update is skipped and processing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The update refers to a port for which no identity record was seen.
    UnknownNode { port_id: String, facet: Facet },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UnknownNode { port_id, facet } => {
                write!(f, "{} for unknown node {}", facet, port_id)
            }
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub identity: NodeIdentity,
    pub last_rx_timestamped: Option<RxEvent>,
    pub last_rx_computed: Option<RxEvent>,
    pub last_tx: Option<TxEvent>,
    pub last_slave_status: Option<SlaveStatus>,
}

impl NodeRecord {
    fn new(identity: NodeIdentity) -> Self {
        NodeRecord {
            identity,
            last_rx_timestamped: None,
            last_rx_computed: None,
            last_tx: None,
            last_slave_status: None,
        }
    }

    pub fn port_id(&self) -> &str {
        &self.identity.port_id
    }

    /// Whether the latest slave status reports any alarm.
    pub fn is_alarmed(&self) -> bool {
        self.last_slave_status
            .as_ref()
            .map(SlaveStatus::is_alarmed)
            .unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: BTreeMap<String, NodeRecord>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the node if its port is not yet known. Returns whether it was inserted.
    pub fn upsert_identity(&mut self, identity: NodeIdentity) -> bool {
        if self.nodes.contains_key(&identity.port_id) {
            return false;
        }
        self.nodes
            .insert(identity.port_id.clone(), NodeRecord::new(identity));
        true
    }

    fn lookup(&mut self, port_id: &str, facet: Facet) -> Result<&mut NodeRecord, StoreError> {
        self.nodes
            .get_mut(port_id)
            .ok_or_else(|| StoreError::UnknownNode {
                port_id: port_id.to_string(),
                facet,
            })
    }

    pub fn update_rx_computed(&mut self, event: RxEvent) -> Result<(), StoreError> {
        let node = self.lookup(&event.node, Facet::RxComputed)?;
        node.last_rx_computed = Some(event);
        Ok(())
    }

    pub fn update_rx_timestamped(&mut self, event: RxEvent) -> Result<(), StoreError> {
        let node = self.lookup(&event.node, Facet::RxTimestamped)?;
        node.last_rx_timestamped = Some(event);
        Ok(())
    }

    pub fn update_tx(&mut self, event: TxEvent) -> Result<(), StoreError> {
        let node = self.lookup(&event.node, Facet::Tx)?;
        node.last_tx = Some(event);
        Ok(())
    }

    /// Stores `status` as the node's current slave status and returns the one
    /// it replaced. `None` means this is the baseline report for the node.
    pub fn update_slave_status(
        &mut self,
        status: SlaveStatus,
    ) -> Result<Option<SlaveStatus>, StoreError> {
        let node = self.lookup(&status.node, Facet::SlaveStatus)?;
        Ok(node.last_slave_status.replace(status))
    }

    pub fn get(&self, port_id: &str) -> Option<&NodeRecord> {
        self.nodes.get(port_id)
    }

    /// Nodes in ascending port id order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
