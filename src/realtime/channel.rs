//! # Channels
//!
//! Wire channel names and the registry's channel keys.
//!
//! The wire name is what the transport subscribes to:
//! `databases.<databaseId>.collections.<collectionId>.documents`.
//! The channel key is the registry's own identifier: `<databaseId>.<collectionId>`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::errors::{RealtimeError, RealtimeResult};

/// Backend identifiers: alphanumeric start, then alphanumerics, `_` or `-`, 36 chars max.
///
/// `.` is refused so neither the channel key nor the event path can be ambiguous.
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_-]{0,35}$";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid"))
}

/// Check a database or collection id
pub fn validate_identifier(kind: &str, id: &str) -> RealtimeResult<()> {
    if identifier_regex().is_match(id) {
        Ok(())
    } else {
        Err(RealtimeError::InvalidIdentifier(format!("{} id '{}'", kind, id)))
    }
}

/// A database + collection pair whose document changes are broadcast
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    database_id: String,
    collection_id: String,
}

impl Channel {
    /// Create a channel after validating both ids
    pub fn new(database_id: &str, collection_id: &str) -> RealtimeResult<Self> {
        validate_identifier("database", database_id)?;
        validate_identifier("collection", collection_id)?;
        Ok(Self {
            database_id: database_id.to_string(),
            collection_id: collection_id.to_string(),
        })
    }

    /// Database id
    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Collection id
    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    /// Name the transport subscribes to
    pub fn wire_name(&self) -> String {
        format!(
            "databases.{}.collections.{}.documents",
            self.database_id, self.collection_id
        )
    }

    /// Registry key
    pub fn key(&self) -> String {
        format!("{}.{}", self.database_id, self.collection_id)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_name_and_key() {
        let channel = Channel::new("main", "orders").unwrap();
        assert_eq!(channel.wire_name(), "databases.main.collections.orders.documents");
        assert_eq!(channel.key(), "main.orders");
        assert_eq!(channel.to_string(), channel.wire_name());
    }

    #[test]
    fn test_keys_do_not_collide() {
        let a = Channel::new("main", "orders").unwrap();
        let b = Channel::new("mainorders", "x").unwrap();
        let c = Channel::new("main", "users").unwrap();
        assert_ne!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_dotted_ids_rejected() {
        let err = Channel::new("a.b", "c").unwrap_err();
        assert!(matches!(err, RealtimeError::InvalidIdentifier(_)));
        assert!(Channel::new("a", "b.c").is_err());
    }

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("collection", "orders_2024-v1").is_ok());
        assert!(validate_identifier("collection", "").is_err());
        assert!(validate_identifier("collection", "_hidden").is_err());
        assert!(validate_identifier("collection", &"x".repeat(36)).is_ok());
        assert!(validate_identifier("collection", &"x".repeat(37)).is_err());
        assert!(validate_identifier("collection", "with space").is_err());
    }
}
