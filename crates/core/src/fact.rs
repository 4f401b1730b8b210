//! Facts and derivation relationships.
//!
//! A fact is a typed observation recorded against a timeline action: a trait
//! (category string such as "host.process.id" or "host.file.path") and a
//! string value, even when the value is numeric. Relationships are directed
//! derivation edges between facts; the set of relationships for an operation
//! forms the graph the resolver walks back to a process id.

use serde::{Deserialize, Serialize};

/// Trait carried by canonical process-identifier facts. This is the
/// ground-truth join key between the two timelines.
pub const PROCESS_ID_TRAIT: &str = "host.process.id";

/// A single typed observation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    #[serde(rename = "trait")]
    pub trait_name: String,
    pub value: String,
}

impl Fact {
    pub fn new(trait_name: &str, value: &str) -> Self {
        Self {
            trait_name: trait_name.to_string(),
            value: value.to_string(),
        }
    }

    /// True when this fact carries the canonical process-identifier trait.
    pub fn is_process_id(&self) -> bool {
        self.trait_name == PROCESS_ID_TRAIT
    }
}

/// Directed derivation edge: `target` was derived from (explained by)
/// `source`. Recorded order is significant — when several relationships
/// target the same fact, the first recorded one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: Fact,
    pub target: Fact,
}

impl Relationship {
    pub fn new(source: Fact, target: Fact) -> Self {
        Self { source, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_trait_detection() {
        assert!(Fact::new(PROCESS_ID_TRAIT, "1234").is_process_id());
        assert!(!Fact::new("host.file.path", "/tmp/stage").is_process_id());
    }

    #[test]
    fn test_fact_serializes_trait_field_name() {
        let fact = Fact::new(PROCESS_ID_TRAIT, "42");
        let json = serde_json::to_string(&fact).unwrap();
        assert!(json.contains("\"trait\""));
        assert!(!json.contains("trait_name"));
    }
}
