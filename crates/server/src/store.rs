//! In-memory operation store.
//!
//! Stand-in for the external data service that owns timeline persistence.
//! The engine's contract with that service is narrow: hand over
//! already-materialized operations on demand. Pin overrides live here too,
//! since a manual correction must outlive the read that triggered it while
//! the engine itself stays stateless.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use thiserror::Error;
use uuid::Uuid;

use gameboard_core::{ChainLink, Fact, Operation, Relationship, PROCESS_ID_TRAIT};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown link: {0}")]
    UnknownLink(String),
}

/// Operations keyed by id, plus manual pin corrections keyed by link id.
#[derive(Debug, Default)]
pub struct OperationStore {
    operations: HashMap<String, Operation>,
    pin_overrides: HashMap<String, u32>,
}

impl OperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, op: Operation) {
        self.operations.insert(op.id.clone(), op);
    }

    pub fn get(&self, id: &str) -> Option<&Operation> {
        self.operations.get(id)
    }

    pub fn pin_overrides(&self) -> &HashMap<String, u32> {
        &self.pin_overrides
    }

    /// Record a manual correction for a link's resolved process id. The link
    /// must exist in some stored chain; an unknown id is rejected rather
    /// than silently recorded, since a typo here would otherwise vanish.
    pub fn set_pin_override(&mut self, link_id: &str, pin: u32) -> Result<(), StoreError> {
        let known = self
            .operations
            .values()
            .flat_map(|op| &op.chain)
            .any(|link| link.id == link_id);
        if !known {
            return Err(StoreError::UnknownLink(link_id.to_string()));
        }
        self.pin_overrides.insert(link_id.to_string(), pin);
        Ok(())
    }

    /// Seed a red and a blue operation for local runs and integration tests.
    /// The blue chain detects the red persistence action through a file-path
    /// fact two derivation hops away from the pid, and carries one detection
    /// the resolver cannot place.
    pub fn demo() -> Self {
        let t = |minute: u32| Utc.with_ymd_and_hms(2026, 8, 20, 14, minute, 0).unwrap();

        let red = Operation {
            id: "red-demo".to_string(),
            name: "demo red exercise".to_string(),
            state: "finished".to_string(),
            auto_collect: false,
            chain: vec![
                ChainLink {
                    id: Uuid::new_v4().to_string(),
                    finish: Some(t(0)),
                    cleanup: 0,
                    pid: 5566,
                    status: 0,
                    tactic: "persistence".to_string(),
                    visibility: 75,
                    used: vec![],
                    display: serde_json::json!({
                        "command": "schtasks /create /tn updater /tr C:\\stage\\run.exe",
                    }),
                },
                ChainLink {
                    id: Uuid::new_v4().to_string(),
                    finish: Some(t(3)),
                    cleanup: 0,
                    pid: 7001,
                    status: 0,
                    tactic: "collection".to_string(),
                    visibility: 30,
                    used: vec![],
                    display: serde_json::json!({
                        "command": "findstr /si password *.txt",
                    }),
                },
            ],
            relationships: vec![],
        };

        let detect_id = "blue-demo-detect".to_string();
        let hunt_id = "blue-demo-hunt".to_string();
        let blue = Operation {
            id: "blue-demo".to_string(),
            name: "demo blue response".to_string(),
            state: "running".to_string(),
            auto_collect: false,
            chain: vec![
                ChainLink {
                    id: detect_id,
                    finish: Some(t(10)),
                    cleanup: 0,
                    pid: 0,
                    status: 0,
                    tactic: "detection".to_string(),
                    visibility: 50,
                    used: vec![Fact::new("host.file.path", "C:\\stage\\run.exe")],
                    display: serde_json::json!({
                        "command": "Get-ScheduledTask | Where TaskName -eq updater",
                    }),
                },
                ChainLink {
                    id: hunt_id,
                    finish: Some(t(12)),
                    cleanup: 0,
                    pid: 0,
                    status: 0,
                    tactic: "hunt".to_string(),
                    visibility: 50,
                    used: vec![Fact::new("network.conn.dst", "203.0.113.7:8443")],
                    display: serde_json::json!({
                        "command": "netstat -ano | findstr 8443",
                    }),
                },
            ],
            relationships: vec![
                Relationship::new(
                    Fact::new("host.registry.key", "HKLM\\..\\Run\\updater"),
                    Fact::new("host.file.path", "C:\\stage\\run.exe"),
                ),
                Relationship::new(
                    Fact::new(PROCESS_ID_TRAIT, "5566"),
                    Fact::new("host.registry.key", "HKLM\\..\\Run\\updater"),
                ),
            ],
        };

        let mut store = Self::new();
        store.insert(red);
        store.insert(blue);
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_requires_known_link() {
        let mut store = OperationStore::demo();

        assert_eq!(
            store.set_pin_override("no-such-link", 42),
            Err(StoreError::UnknownLink("no-such-link".to_string()))
        );
        assert!(store.pin_overrides().is_empty());

        store.set_pin_override("blue-demo-hunt", 42).unwrap();
        assert_eq!(store.pin_overrides().get("blue-demo-hunt"), Some(&42));
    }

    #[test]
    fn test_demo_blue_detection_resolves_to_red_pid() {
        let store = OperationStore::demo();
        let blue = store.get("blue-demo").unwrap();
        let fact = &blue.chain[0].used[0];

        let pid = gameboard_core::find_original_pid(
            &blue.relationships,
            &fact.trait_name,
            &fact.value,
        );
        assert_eq!(pid, 5566);
    }
}
