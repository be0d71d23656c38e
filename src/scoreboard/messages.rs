//! Scoreboard Message Types
//!
//! Wire formats pushed by the scoreboard server on the game history socket,
//! plus the render-time history dataset (which shares the `history` shape).

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::{ProtocolError, ProtocolResult};

/// Unix timestamp in whole seconds, as used by history entries
///
/// The server emits integers, but float seconds are accepted and truncated
/// toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EpochSeconds(pub i64);

impl EpochSeconds {
    /// Milliseconds since the epoch, saturating on overflow
    pub fn to_millis(self) -> i64 {
        self.0.saturating_mul(1000)
    }
}

impl<'de> Deserialize<'de> for EpochSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SecondsVisitor;

        impl<'de> Visitor<'de> for SecondsVisitor {
            type Value = EpochSeconds;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a unix timestamp in seconds")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(EpochSeconds(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map(EpochSeconds)
                    .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                if v.is_finite() {
                    Ok(EpochSeconds(v.trunc() as i64))
                } else {
                    Err(E::invalid_value(Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_any(SecondsVisitor)
    }
}

/// Unix timestamp of a live update, fractional seconds kept
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateTimestamp(pub f64);

impl UpdateTimestamp {
    /// Milliseconds since the epoch, rounded to the nearest millisecond
    ///
    /// Out-of-range values saturate.
    pub fn to_millis(self) -> i64 {
        (self.0 * 1000.0).round() as i64
    }
}

/// One `[timestamp, flagCount]` pair from a team's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry(pub EpochSeconds, pub u64);

impl HistoryEntry {
    pub fn new(timestamp: i64, flags: u64) -> Self {
        Self(EpochSeconds(timestamp), flags)
    }

    pub fn timestamp(&self) -> EpochSeconds {
        self.0
    }

    pub fn flags(&self) -> u64 {
        self.1
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHistoryEntry {
    Entry(HistoryEntry),
    Malformed(Value),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTeamHistory {
    Entries(Vec<RawHistoryEntry>),
    Malformed(Value),
}

/// Flags-captured history for every team, oldest entry first
///
/// Teams keep the order the server sent them in. Decoding is lenient: an
/// entry that isn't a `[timestamp, flagCount]` pair is dropped, and so is a
/// team whose history isn't a list. Everything else still loads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryDataset {
    teams: IndexMap<String, Vec<HistoryEntry>>,
    skipped: usize,
}

impl<'de> Deserialize<'de> for HistoryDataset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        IndexMap::<String, RawTeamHistory>::deserialize(deserializer).map(HistoryDataset::from_raw)
    }
}

impl HistoryDataset {
    fn from_raw(raw: IndexMap<String, RawTeamHistory>) -> Self {
        let mut dataset = HistoryDataset::default();

        for (team, history) in raw {
            match history {
                RawTeamHistory::Entries(items) => {
                    let mut entries = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            RawHistoryEntry::Entry(entry) => entries.push(entry),
                            RawHistoryEntry::Malformed(value) => {
                                tracing::warn!(team = %team, entry = %value, "Skipping malformed history entry");
                                dataset.skipped += 1;
                            }
                        }
                    }
                    dataset.teams.insert(team, entries);
                }
                RawTeamHistory::Malformed(value) => {
                    tracing::warn!(team = %team, history = %value, "Skipping malformed team history");
                    dataset.skipped += 1;
                }
            }
        }

        dataset
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a render-time history document
    pub fn from_json(text: &str) -> ProtocolResult<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedPayload {
            kind: "history",
            error: e.to_string(),
        })
    }

    /// Builder method: add a team with its entries
    pub fn team(mut self, name: impl Into<String>, entries: Vec<HistoryEntry>) -> Self {
        self.teams.insert(name.into(), entries);
        self
    }

    /// Teams in the order they were received
    pub fn teams(&self) -> impl Iterator<Item = (&String, &Vec<HistoryEntry>)> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Entries and teams dropped while decoding
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Per-team scoreboard record; only the captured flags matter here
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamRecord {
    pub flags: Vec<Value>,
}

/// A scoreboard entry as received
///
/// Entries that don't look like a [`TeamRecord`] are kept as raw JSON so a
/// single bad team doesn't sink the rest of the update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TeamEntry {
    Record(TeamRecord),
    Malformed(Value),
}

impl TeamEntry {
    /// Number of captured flags, or `None` for a malformed entry
    pub fn flag_count(&self) -> Option<usize> {
        match self {
            TeamEntry::Record(record) => Some(record.flags.len()),
            TeamEntry::Malformed(_) => None,
        }
    }
}

/// A live scoreboard update
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateEvent {
    pub timestamp: UpdateTimestamp,
    pub scoreboard: IndexMap<String, TeamEntry>,
}

impl UpdateEvent {
    /// Create an empty update at `timestamp` seconds
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp: UpdateTimestamp(timestamp as f64),
            scoreboard: IndexMap::new(),
        }
    }

    /// Builder method: add a team with its captured flag ids
    pub fn team<S: Into<String>>(mut self, name: impl Into<String>, flags: Vec<S>) -> Self {
        let flags = flags.into_iter().map(|f| Value::String(f.into())).collect();
        self.scoreboard
            .insert(name.into(), TeamEntry::Record(TeamRecord { flags }));
        self
    }

    /// Builder method: add a raw entry exactly as it would arrive on the wire
    pub fn raw_team(mut self, name: impl Into<String>, entry: Value) -> Self {
        let entry = serde_json::from_value(entry.clone()).unwrap_or(TeamEntry::Malformed(entry));
        self.scoreboard.insert(name.into(), entry);
        self
    }
}

/// A decoded frame from the game history socket
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `{"error": ...}`: the server reported a problem
    Error(Value),
    /// `{"history": {...}}`: full dataset, replaces the chart
    History(HistoryDataset),
    /// `{"update": {...}}`: one scoreboard tick
    Update(UpdateEvent),
}

impl InboundMessage {
    /// Decode a text frame
    ///
    /// Opcodes are checked in the order `error`, `history`, `update`; the
    /// first key present wins.
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        let mut object = match value {
            Value::Object(object) => object,
            other => return Err(ProtocolError::NotAnObject(json_kind(&other))),
        };

        if let Some(error) = object.remove("error") {
            return Ok(InboundMessage::Error(error));
        }

        if let Some(history) = object.remove("history") {
            return serde_json::from_value(history)
                .map(InboundMessage::History)
                .map_err(|e| ProtocolError::MalformedPayload {
                    kind: "history",
                    error: e.to_string(),
                });
        }

        if let Some(update) = object.remove("update") {
            return serde_json::from_value(update)
                .map(InboundMessage::Update)
                .map_err(|e| ProtocolError::MalformedPayload {
                    kind: "update",
                    error: e.to_string(),
                });
        }

        Err(ProtocolError::UnknownOpcode {
            keys: object.keys().cloned().collect(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_error() {
        let msg = InboundMessage::decode(r#"{"error": "disconnected"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Error(json!("disconnected")));
    }

    #[test]
    fn test_decode_history() {
        let msg = InboundMessage::decode(r#"{"history": {"Red": [[1000, 2], [2000, 3]]}}"#)
            .unwrap();
        match msg {
            InboundMessage::History(history) => {
                let (name, entries) = history.teams().next().unwrap();
                assert_eq!(name, "Red");
                assert_eq!(
                    entries,
                    &vec![HistoryEntry::new(1000, 2), HistoryEntry::new(2000, 3)]
                );
            }
            other => panic!("Expected History, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_update() {
        let text = r#"{"update": {"timestamp": 3000, "scoreboard": {
            "Red": {"flags": ["a", "b", "c", "d"], "money": 500}
        }}}"#;
        match InboundMessage::decode(text).unwrap() {
            InboundMessage::Update(update) => {
                assert_eq!(update.timestamp, UpdateTimestamp(3000.0));
                assert_eq!(update.scoreboard["Red"].flag_count(), Some(4));
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn test_error_opcode_wins() {
        let msg = InboundMessage::decode(r#"{"update": {}, "error": "nope"}"#).unwrap();
        assert!(matches!(msg, InboundMessage::Error(_)));
    }

    #[test]
    fn test_unknown_opcode() {
        let err = InboundMessage::decode(r#"{"ping": 1}"#).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownOpcode {
                keys: vec!["ping".to_string()]
            }
        );
    }

    #[test]
    fn test_not_an_object() {
        let err = InboundMessage::decode("[1, 2]").unwrap_err();
        assert_eq!(err, ProtocolError::NotAnObject("array"));
    }

    #[test]
    fn test_invalid_json() {
        let err = InboundMessage::decode("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn test_update_missing_scoreboard() {
        let err = InboundMessage::decode(r#"{"update": {"timestamp": 10}}"#).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MalformedPayload { kind: "update", .. }
        ));
    }

    #[test]
    fn test_malformed_team_kept_raw() {
        let text = r#"{"update": {"timestamp": 10, "scoreboard": {
            "Red": {"flags": ["a"]},
            "Blue": {"money": 10},
            "Green": "garbage"
        }}}"#;
        match InboundMessage::decode(text).unwrap() {
            InboundMessage::Update(update) => {
                assert_eq!(update.scoreboard["Red"].flag_count(), Some(1));
                assert_eq!(update.scoreboard["Blue"].flag_count(), None);
                assert_eq!(update.scoreboard["Green"].flag_count(), None);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn test_float_history_timestamps_truncate() {
        let entry: HistoryEntry = serde_json::from_str("[1699000000.75, 3]").unwrap();
        assert_eq!(entry.timestamp(), EpochSeconds(1699000000));
        assert_eq!(entry.timestamp().to_millis(), 1_699_000_000_000);
    }

    #[test]
    fn test_float_update_timestamps_keep_fraction() {
        let update: UpdateEvent =
            serde_json::from_value(json!({"timestamp": 12.9, "scoreboard": {}})).unwrap();
        assert_eq!(update.timestamp.to_millis(), 12_900);

        let update: UpdateEvent =
            serde_json::from_value(json!({"timestamp": 1699000000, "scoreboard": {}})).unwrap();
        assert_eq!(update.timestamp.to_millis(), 1_699_000_000_000);
        assert_eq!(UpdateTimestamp(0.0005).to_millis(), 1);
    }

    #[test]
    fn test_to_millis_saturates() {
        assert_eq!(EpochSeconds(i64::MAX).to_millis(), i64::MAX);
        assert_eq!(EpochSeconds(-2).to_millis(), -2000);
        assert_eq!(UpdateTimestamp(f64::MAX).to_millis(), i64::MAX);
    }

    #[test]
    fn test_builder_matches_wire() {
        let built = UpdateEvent::new(3000).team("Red", vec!["a", "b"]);
        let wire: UpdateEvent = serde_json::from_value(json!({
            "timestamp": 3000,
            "scoreboard": {"Red": {"flags": ["a", "b"]}}
        }))
        .unwrap();
        assert_eq!(built, wire);

        let raw = UpdateEvent::new(1).raw_team("Blue", json!({"flags": 3}));
        assert_eq!(raw.scoreboard["Blue"].flag_count(), None);
    }

    #[test]
    fn test_history_from_json() {
        let history = HistoryDataset::from_json(r#"{"Red": [], "Blue": [[5, 1]]}"#).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.skipped(), 0);

        let err = HistoryDataset::from_json(r#"[["Red", []]]"#).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MalformedPayload { kind: "history", .. }
        ));
    }

    #[test]
    fn test_bad_history_entries_skipped_per_team() {
        let text = r#"{"history": {
            "Red": [[1000, 2], [2000, 3]],
            "Blue": [[1000, 2.5], [2000, 4]],
            "Green": "garbage",
            "Yellow": [[1000], "x", [3000, 1]]
        }}"#;
        let history = match InboundMessage::decode(text).unwrap() {
            InboundMessage::History(history) => history,
            other => panic!("Expected History, got {:?}", other),
        };

        let teams: Vec<_> = history.teams().collect();
        assert_eq!(teams.len(), 3);
        assert_eq!(
            teams[0],
            (
                &"Red".to_string(),
                &vec![HistoryEntry::new(1000, 2), HistoryEntry::new(2000, 3)]
            )
        );
        assert_eq!(teams[1].1, &vec![HistoryEntry::new(2000, 4)]);
        assert_eq!(teams[2].1, &vec![HistoryEntry::new(3000, 1)]);
        assert_eq!(history.skipped(), 4);
    }

    #[test]
    fn test_team_order_follows_wire() {
        let text = r#"{"history": {"Zulu": [], "Alpha": [], "Mike": []}}"#;
        match InboundMessage::decode(text).unwrap() {
            InboundMessage::History(history) => {
                let names: Vec<_> = history.teams().map(|(name, _)| name.as_str()).collect();
                assert_eq!(names, vec!["Zulu", "Alpha", "Mike"]);
            }
            other => panic!("Expected History, got {:?}", other),
        }

        let text = r#"{"update": {"timestamp": 1, "scoreboard": {"Zulu": {"flags": []}, "Alpha": {"flags": []}}}}"#;
        match InboundMessage::decode(text).unwrap() {
            InboundMessage::Update(update) => {
                let names: Vec<_> = update.scoreboard.keys().map(String::as_str).collect();
                assert_eq!(names, vec!["Zulu", "Alpha"]);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }
}
