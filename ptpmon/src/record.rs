//! Record decoder
//!
//! The remote monitor writes one JSON object per line. Each object carries
//! any combination of the `node`, `rx-event`, `tx-event` and `slave-status`
//! facets, and each facet is decoded into its own typed struct so that a
//! missing required field fails the line here rather than later.

use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer};
use std::fmt::{self, Display};

/// Monitor timestamp as written by the daemon, e.g. `2024-05-01 12:00:00.123456`.
/// Interpreted as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    const PARSE_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S%.f";
    const DISPLAY_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S%.6f";

    pub fn parse(text: &str) -> Result<Timestamp, chrono::ParseError> {
        NaiveDateTime::parse_from_str(text.trim(), Self::PARSE_FORMAT).map(Timestamp)
    }

    pub fn from_naive(t: NaiveDateTime) -> Timestamp {
        Timestamp(t)
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::DISPLAY_FORMAT))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Timestamp::parse(&text)
            .map_err(|e| de::Error::custom(format!("invalid monitor timestamp {:?}: {}", text, e)))
    }
}

/// PTP port state, with the `PTP_` prefix already removed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum PortState {
    Initializing,
    Faulty,
    Disabled,
    Listening,
    PreMaster,
    Master,
    Passive,
    Uncalibrated,
    Slave,
    Invalid,
    Other(String),
}

impl PortState {
    pub fn as_str(&self) -> &str {
        match self {
            PortState::Initializing => "INITIALIZING",
            PortState::Faulty => "FAULTY",
            PortState::Disabled => "DISABLED",
            PortState::Listening => "LISTENING",
            PortState::PreMaster => "PRE_MASTER",
            PortState::Master => "MASTER",
            PortState::Passive => "PASSIVE",
            PortState::Uncalibrated => "UNCALIBRATED",
            PortState::Slave => "SLAVE",
            PortState::Invalid => "INVALID",
            PortState::Other(s) => s,
        }
    }
}

impl From<String> for PortState {
    fn from(s: String) -> PortState {
        match s.as_str() {
            "INITIALIZING" => PortState::Initializing,
            "FAULTY" => PortState::Faulty,
            "DISABLED" => PortState::Disabled,
            "LISTENING" => PortState::Listening,
            "PRE_MASTER" => PortState::PreMaster,
            "MASTER" => PortState::Master,
            "PASSIVE" => PortState::Passive,
            "UNCALIBRATED" => PortState::Uncalibrated,
            "SLAVE" => PortState::Slave,
            "INVALID" => PortState::Invalid,
            _ => PortState::Other(s),
        }
    }
}

impl From<&str> for PortState {
    fn from(s: &str) -> PortState {
        PortState::from(s.to_string())
    }
}

impl Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a remote node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeIdentity {
    pub port_id: String,
    pub domain: i64,
    pub address: String,
}

/// A received Sync, possibly carrying computed data and/or ingress timing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RxEvent {
    #[serde(default)]
    pub monitor_seq_id: Option<i64>,
    pub monitor_timestamp: Timestamp,
    pub node: String,
    #[serde(default)]
    pub parent_port: Option<String>,
    #[serde(default)]
    pub sync_seq: Option<i64>,
    #[serde(default)]
    pub offset_from_master: Option<f64>,
    #[serde(default)]
    pub mean_path_delay: Option<f64>,
    #[serde(default)]
    pub sync_ingress_timestamp: Option<f64>,
}

impl RxEvent {
    /// Offset or mean path delay was reported.
    pub fn has_computed_data(&self) -> bool {
        self.offset_from_master.is_some() || self.mean_path_delay.is_some()
    }

    /// Sync ingress timestamp was reported.
    pub fn has_timing_data(&self) -> bool {
        self.sync_ingress_timestamp.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TxEvent {
    #[serde(default)]
    pub monitor_seq_id: Option<i64>,
    pub monitor_timestamp: Timestamp,
    pub node: String,
    #[serde(default)]
    pub source_port: Option<String>,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub event_seq_id: Option<i64>,
    #[serde(default)]
    pub egress_timestamp: Option<f64>,
}

/// Periodic report of a node's synchronization role, state and alarms.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlaveStatus {
    #[serde(default)]
    pub monitor_seq_id: Option<i64>,
    pub monitor_timestamp: Timestamp,
    pub node: String,
    #[serde(default)]
    pub gm_id: Option<String>,
    pub state: PortState,
    pub bond_changed: bool,
    pub selected: bool,
    pub in_sync: bool,
    #[serde(default)]
    pub msg_alarms: Vec<String>,
    #[serde(default)]
    pub alarms: Vec<String>,
}

impl SlaveStatus {
    pub fn is_alarmed(&self) -> bool {
        !self.msg_alarms.is_empty() || !self.alarms.is_empty()
    }

    /// Message alarms followed by other alarms.
    pub fn all_alarms(&self) -> impl Iterator<Item = &str> {
        self.msg_alarms
            .iter()
            .chain(self.alarms.iter())
            .map(String::as_str)
    }
}

/// One decoded line. Any subset of the facets may be present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Record {
    #[serde(default)]
    pub node: Option<NodeIdentity>,
    #[serde(default)]
    pub rx_event: Option<RxEvent>,
    #[serde(default)]
    pub tx_event: Option<TxEvent>,
    #[serde(default)]
    pub slave_status: Option<SlaveStatus>,
}

impl Record {
    pub fn is_empty(&self) -> bool {
        self.node.is_none()
            && self.rx_event.is_none()
            && self.tx_event.is_none()
            && self.slave_status.is_none()
    }
}

#[derive(Debug)]
pub enum DecodeError {
    /// Nothing but whitespace on the line.
    Blank,
    /// The line is not UTF-8.
    Utf8(std::str::Utf8Error),
    /// Not valid JSON, or a facet is missing required fields.
    Json(serde_json::Error),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Blank => write!(f, "blank line"),
            DecodeError::Utf8(e) => write!(f, "line is not UTF-8: {}", e),
            DecodeError::Json(e) => write!(f, "malformed record: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Blank => None,
            DecodeError::Utf8(e) => Some(e),
            DecodeError::Json(e) => Some(e),
        }
    }
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(e: std::str::Utf8Error) -> Self {
        DecodeError::Utf8(e)
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Json(e)
    }
}

/// Decodes one line of the log. The line terminator, if any, is ignored.
pub fn decode_line<B: AsRef<[u8]>>(line: B) -> Result<Record, DecodeError> {
    let line = std::str::from_utf8(line.as_ref())?;
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return Err(DecodeError::Blank);
    }
    Ok(serde_json::from_str(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_node_identity() {
        let rec = decode_line(
            r#"{ "node": {"port-id": "0011:22ff:fe33:4455.1", "domain": 0, "address": "10.0.0.1" } }"#,
        )
        .unwrap();
        let node = rec.node.unwrap();
        assert_eq!(node.port_id, "0011:22ff:fe33:4455.1");
        assert_eq!(node.domain, 0);
        assert_eq!(node.address, "10.0.0.1");
        assert!(rec.rx_event.is_none());
    }

    #[test]
    fn rx_event_routing_flags() {
        let rec = decode_line(
            "{\"rx-event\": {\"monitor-timestamp\": \"2024-05-01 12:00:00.250000\", \
             \"node\": \"a\", \"offset-from-master\": 12.5}}\n",
        )
        .unwrap();
        let rx = rec.rx_event.unwrap();
        assert!(rx.has_computed_data());
        assert!(!rx.has_timing_data());
        assert_eq!(rx.mean_path_delay, None);

        let rec = decode_line(
            r#"{"rx-event": {"monitor-timestamp": "2024-05-01 12:00:00.250000", "node": "a",
                "mean-path-delay": 3.0, "sync-ingress-timestamp": 1714564800.000000123}}"#,
        )
        .unwrap();
        let rx = rec.rx_event.unwrap();
        assert!(rx.has_computed_data());
        assert!(rx.has_timing_data());
    }

    #[test]
    fn one_line_may_carry_several_facets() {
        let rec = decode_line(
            r#"{"node": {"port-id": "a", "domain": 3, "address": "h"},
                "slave-status": {"monitor-timestamp": "2024-05-01 12:00:00.000001", "node": "a",
                "state": "SLAVE", "bond-changed": false, "selected": true, "in-sync": true,
                "msg-alarms": [], "alarms": ["no-sync"]}}"#,
        )
        .unwrap();
        assert!(rec.node.is_some());
        let status = rec.slave_status.unwrap();
        assert_eq!(status.state, PortState::Slave);
        assert!(status.is_alarmed());
        assert_eq!(status.all_alarms().collect::<Vec<_>>(), vec!["no-sync"]);
    }

    #[test]
    fn unknown_state_is_kept_verbatim() {
        assert_eq!(PortState::from("WEIRD"), PortState::Other("WEIRD".into()));
        assert_eq!(PortState::from("PRE_MASTER").as_str(), "PRE_MASTER");
    }

    #[test]
    fn malformed_lines_fail_softly() {
        assert!(matches!(decode_line("   \n"), Err(DecodeError::Blank)));
        assert!(matches!(decode_line("{\"node\": "), Err(DecodeError::Json(_))));
        assert!(matches!(decode_line("[1, 2]"), Err(DecodeError::Json(_))));
        assert!(matches!(
            decode_line(b"{\"bad\": \"\xff\xfe\"}".as_slice()),
            Err(DecodeError::Utf8(_))
        ));
        // facet present but required field missing
        assert!(matches!(
            decode_line(r#"{"node": {"port-id": "a"}}"#),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode_line(
                r#"{"tx-event": {"monitor-timestamp": "yesterday", "node": "a"}}"#
            ),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn unrelated_objects_decode_empty() {
        let rec = decode_line(r#"{"instance": "ptp1", "stats": {}}"#).unwrap();
        assert!(rec.is_empty());
    }

    #[test]
    fn timestamp_display_keeps_microseconds() {
        let ts = Timestamp::parse("2024-05-01 12:00:00.5").unwrap();
        assert_eq!(ts.to_string(), "2024-05-01 12:00:00.500000");
    }
}
