//! # Real-Time Events
//!
//! Change kinds, the message envelope delivered by the transport, and
//! classification of dotted event paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of document change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Document created
    Create,
    /// Document updated
    Update,
    /// Document deleted
    Delete,
}

impl ChangeKind {
    /// All recognised kinds
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Create, ChangeKind::Update, ChangeKind::Delete];

    /// Returns the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }

    /// Classify a dotted event path by its last segment
    ///
    /// `databases.main.collections.orders.documents.abc.update` is an update.
    pub fn from_event_path(path: &str) -> Option<ChangeKind> {
        terminal_segment(path).parse().ok()
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(ChangeKind::Create),
            "update" => Ok(ChangeKind::Update),
            "delete" => Ok(ChangeKind::Delete),
            other => Err(other.to_string()),
        }
    }
}

/// Last dotted segment of an event path
pub fn terminal_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

static NULL: Value = Value::Null;

/// Read-only view of a raw message delivered by the transport
///
/// The transport may report several overlapping event paths per message;
/// only the first one is read. Later entries are never inspected, whatever
/// their type.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    raw: &'a Value,
}

impl<'a> Envelope<'a> {
    /// Wrap a raw message
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    /// First event path
    pub fn primary_event(&self) -> Result<&'a str, String> {
        let events = self
            .raw
            .get("events")
            .ok_or_else(|| "events: missing".to_string())?
            .as_array()
            .ok_or_else(|| "events: not a sequence".to_string())?;

        events
            .first()
            .ok_or_else(|| "events: empty".to_string())?
            .as_str()
            .ok_or_else(|| "events: first path is not a string".to_string())
    }

    /// Document payload; `null` when absent
    pub fn payload(&self) -> &'a Value {
        self.raw.get("payload").unwrap_or(&NULL)
    }

    /// The message as received
    pub fn raw(&self) -> &'a Value {
        self.raw
    }
}

/// Build the event path the backend emits for a document change
pub fn document_event_path(
    database_id: &str,
    collection_id: &str,
    document_id: &str,
    kind: ChangeKind,
) -> String {
    format!(
        "databases.{}.collections.{}.documents.{}.{}",
        database_id, collection_id, document_id, kind
    )
}
