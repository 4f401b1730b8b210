//! Chain links and operations.
//!
//! A `ChainLink` is one recorded action on a side's timeline. An `Operation`
//! is the whole timeline for one side: its ordered chain, the full
//! fact-derivation graph observed during the run, and the flags the engine
//! reads (lifecycle state, baseline-collector marker).
//!
//! Links are immutable inside the engine. The blue side's resolved process
//! id ("pin") lives in a separate map produced by `exchange::resolve_pins`,
//! never on the link itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fact::{Fact, Relationship};

/// A single recorded action from one side's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    /// Stable link identifier, used to address manual pin corrections.
    pub id: String,

    /// Completion timestamp. Links that never finished are excluded from the
    /// board entirely.
    pub finish: Option<DateTime<Utc>>,

    /// Non-zero marks a cleanup pass; cleanup links do not participate.
    #[serde(default)]
    pub cleanup: u8,

    /// Canonical OS process id, attached directly by the red agent.
    /// Blue links carry their local observation in `used` instead.
    #[serde(default)]
    pub pid: u32,

    /// Outcome code; 0 = success, anything else is non-success.
    #[serde(default)]
    pub status: i32,

    /// Tactic label, e.g. "persistence" or "detection". Drives the point
    /// tables.
    pub tactic: String,

    /// 0-100 confidence that the action was observable by the other side.
    #[serde(default)]
    pub visibility: u8,

    /// Facts this link consumed, in recorded order. Only the first seeds
    /// pin resolution.
    #[serde(default)]
    pub used: Vec<Fact>,

    /// Opaque payload forwarded unchanged to output.
    #[serde(default)]
    pub display: serde_json::Value,
}

impl ChainLink {
    /// True when this link participates in exchange building: it completed
    /// and is not part of a cleanup pass.
    pub fn qualifies(&self) -> bool {
        self.finish.is_some() && self.cleanup == 0
    }

    pub fn succeeded(&self) -> bool {
        self.status == 0
    }
}

/// One side's timeline: ordered chain, derivation graph, and run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub name: String,

    /// Lifecycle state, reported back to the caller ("running", "finished").
    pub state: String,

    /// True when this timeline came from an automated baseline collector
    /// rather than an active defense run. Baseline chains skip automatic
    /// pin resolution.
    #[serde(default)]
    pub auto_collect: bool,

    pub chain: Vec<ChainLink>,

    /// Every fact-to-fact derivation recorded during the run, in recorded
    /// order.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Operation {
    /// Qualifying links in finish order. The sort is stable, so links that
    /// finished at the same instant keep their original relative order.
    pub fn sorted_chain(&self) -> Vec<&ChainLink> {
        let mut links: Vec<&ChainLink> = self.chain.iter().filter(|l| l.qualifies()).collect();
        links.sort_by_key(|l| l.finish);
        links
    }
}
