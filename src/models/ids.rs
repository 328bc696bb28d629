//! Identifiers for tenants, players and fact rows.
//!
//! Tenant and player ids are opaque strings chosen upstream. Session ids are
//! derived from the row contents with SHA256 so that a row appended twice
//! collapses to one on read.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// An opaque entity identifier.
///
/// Ordering is plain lexicographic byte order on the underlying string; the
/// tier-3 tie-break relies on it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from a string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generate an EntityId from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let result = hasher.finalize();
        let hash = hex::encode(result);
        Self(hash[..16].to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for tenant (company) ids
pub type TenantId = EntityId;

/// Type alias for player ids
pub type PlayerId = EntityId;

/// Type alias for game session (fact row) ids
pub type SessionId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation_deterministic() {
        let id1 = EntityId::generate(&["acme", "Trivia", "quiz", "p1", "10"]);
        let id2 = EntityId::generate(&["acme", "Trivia", "quiz", "p1", "10"]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_entity_id_different_inputs() {
        let id1 = EntityId::generate(&["acme", "Trivia", "quiz", "p1", "10"]);
        let id2 = EntityId::generate(&["acme", "Trivia", "quiz", "p2", "10"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_field_boundaries_matter() {
        let id1 = EntityId::generate(&["ab", "c"]);
        let id2 = EntityId::generate(&["a", "bc"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entity_id_length_and_hex() {
        let id = EntityId::generate(&["test", "input"]);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let id = EntityId::from("acme");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"acme\"");
        let back: EntityId = serde_json::from_str("\"acme\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_entity_id_ordering_is_lexicographic() {
        let mut ids = vec![
            EntityId::from("p10"),
            EntityId::from("p2"),
            EntityId::from("alice"),
        ];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
        assert_eq!(names, vec!["alice", "p10", "p2"]);
    }

    #[test]
    fn test_is_blank() {
        assert!(EntityId::from("  ").is_blank());
        assert!(EntityId::from("").is_blank());
        assert!(!EntityId::from("acme").is_blank());
    }

    #[test]
    fn test_entity_id_debug() {
        let id = EntityId::new("debug-test".to_string());
        assert_eq!(format!("{:?}", id), "EntityId(debug-test)");
        assert_eq!(format!("{}", id), "debug-test");
    }
}
