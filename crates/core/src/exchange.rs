//! Exchange builder.
//!
//! Partitions the two timelines into exchanges keyed by canonical process
//! id. Red links carry the canonical pid directly; blue links are keyed
//! through a resolution pass (`resolve_pins`) that maps each link id to the
//! pid its first used fact derives from. Links the resolver cannot place
//! land in the catch-all exchange keyed 0 — a legitimate bucket the operator
//! can later correct with a pin override, never an error.

use std::collections::HashMap;

use serde::Serialize;

use crate::link::{ChainLink, Operation};
use crate::resolver::find_original_pid;

/// Resolved pin per blue link id. Kept separate from the links themselves so
/// the input chains stay immutable.
pub type PinMap = HashMap<String, u32>;

/// Red and blue links attributed to one canonical process. Either side may
/// be empty: a detection with nothing to detect, or an action nobody saw.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Exchange {
    pub red: Vec<ChainLink>,
    pub blue: Vec<ChainLink>,
}

/// Exchanges keyed by pid, in order of first key appearance. That insertion
/// order (red links first, then blue, each in finish order) is the order the
/// board reports exchanges in, so a plain HashMap will not do.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExchangeMap(Vec<(u32, Exchange)>);

impl ExchangeMap {
    pub fn get(&self, pid: u32) -> Option<&Exchange> {
        self.0.iter().find(|(p, _)| *p == pid).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u32, Exchange)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn entry(&mut self, pid: u32) -> &mut Exchange {
        if let Some(idx) = self.0.iter().position(|(p, _)| *p == pid) {
            return &mut self.0[idx].1;
        }
        self.0.push((pid, Exchange::default()));
        &mut self.0.last_mut().expect("just pushed").1
    }
}

/// Compute the resolved pin for every link in a blue operation.
///
/// A manual override always wins, even on an auto-collect baseline — the
/// operator's correction outranks automatic resolution. Otherwise, for an
/// active (non-baseline) run, the link's first used fact either carries the
/// canonical pid trait directly or seeds a resolver walk over the
/// operation's relationship graph. Everything else pins to 0.
pub fn resolve_pins(blue: &Operation, overrides: &HashMap<String, u32>) -> PinMap {
    blue.chain
        .iter()
        .map(|link| {
            let pin = match overrides.get(&link.id) {
                Some(&corrected) => corrected,
                None if blue.auto_collect => 0,
                None => auto_pin(blue, link),
            };
            (link.id.clone(), pin)
        })
        .collect()
}

fn auto_pin(blue: &Operation, link: &ChainLink) -> u32 {
    match link.used.first() {
        Some(fact) if fact.is_process_id() => fact.value.parse().unwrap_or(0),
        Some(fact) => find_original_pid(&blue.relationships, &fact.trait_name, &fact.value),
        None => 0,
    }
}

/// Partition both timelines into exchanges.
///
/// Qualifying links (finished, non-cleanup) are folded in finish order: red
/// first, keyed by `pid`, then blue, keyed by resolved pin. Missing sides
/// are valid and contribute nothing. Every qualifying link appears in
/// exactly one exchange, on exactly one side.
pub fn build_exchanges(
    red: Option<&Operation>,
    blue: Option<&Operation>,
    overrides: &HashMap<String, u32>,
) -> ExchangeMap {
    let mut exchanges = ExchangeMap::default();

    let pins = blue
        .map(|op| resolve_pins(op, overrides))
        .unwrap_or_default();

    if let Some(op) = red {
        for link in op.sorted_chain() {
            exchanges.entry(link.pid).red.push(link.clone());
        }
    }

    if let Some(op) = blue {
        for link in op.sorted_chain() {
            let pin = pins.get(&link.id).copied().unwrap_or(0);
            exchanges.entry(pin).blue.push(link.clone());
        }
    }

    exchanges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::{Fact, Relationship, PROCESS_ID_TRAIT};
    use chrono::{TimeZone, Utc};

    fn red_link(id: &str, pid: u32, minute: u32) -> ChainLink {
        ChainLink {
            id: id.to_string(),
            finish: Some(Utc.with_ymd_and_hms(2026, 1, 10, 12, minute, 0).unwrap()),
            cleanup: 0,
            pid,
            status: 0,
            tactic: "persistence".to_string(),
            visibility: 50,
            used: vec![],
            display: serde_json::json!({"link": id}),
        }
    }

    fn blue_link(id: &str, minute: u32, used: Vec<Fact>) -> ChainLink {
        ChainLink {
            id: id.to_string(),
            finish: Some(Utc.with_ymd_and_hms(2026, 1, 10, 13, minute, 0).unwrap()),
            cleanup: 0,
            pid: 0,
            status: 0,
            tactic: "detection".to_string(),
            visibility: 50,
            used,
            display: serde_json::json!({"link": id}),
        }
    }

    fn red_op(chain: Vec<ChainLink>) -> Operation {
        Operation {
            id: "red1".to_string(),
            name: "red exercise".to_string(),
            state: "running".to_string(),
            auto_collect: false,
            chain,
            relationships: vec![],
        }
    }

    fn blue_op(chain: Vec<ChainLink>, relationships: Vec<Relationship>) -> Operation {
        Operation {
            id: "blue1".to_string(),
            name: "blue response".to_string(),
            state: "running".to_string(),
            auto_collect: false,
            chain,
            relationships,
        }
    }

    #[test]
    fn test_red_links_keyed_by_own_pid() {
        let red = red_op(vec![red_link("a", 10, 0), red_link("b", 20, 1), red_link("c", 10, 2)]);
        let exchanges = build_exchanges(Some(&red), None, &HashMap::new());

        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges.get(10).unwrap().red.len(), 2);
        assert_eq!(exchanges.get(20).unwrap().red.len(), 1);
        assert!(exchanges.get(10).unwrap().blue.is_empty());
    }

    #[test]
    fn test_blue_links_join_via_resolver() {
        let red = red_op(vec![red_link("a", 555, 0)]);
        let rels = vec![Relationship::new(
            Fact::new(PROCESS_ID_TRAIT, "555"),
            Fact::new("host.file.path", "/tmp/stage"),
        )];
        let blue = blue_op(
            vec![blue_link("d", 0, vec![Fact::new("host.file.path", "/tmp/stage")])],
            rels,
        );

        let exchanges = build_exchanges(Some(&red), Some(&blue), &HashMap::new());
        let exchange = exchanges.get(555).unwrap();
        assert_eq!(exchange.red.len(), 1);
        assert_eq!(exchange.blue.len(), 1);
    }

    #[test]
    fn test_blue_link_with_direct_pid_fact_skips_resolver() {
        let blue = blue_op(
            vec![blue_link("d", 0, vec![Fact::new(PROCESS_ID_TRAIT, "321")])],
            vec![],
        );
        let exchanges = build_exchanges(None, Some(&blue), &HashMap::new());
        assert_eq!(exchanges.get(321).unwrap().blue.len(), 1);
    }

    #[test]
    fn test_unresolved_blue_links_share_catch_all_bucket() {
        let blue = blue_op(
            vec![
                blue_link("d", 0, vec![Fact::new("host.file.path", "/nowhere")]),
                blue_link("e", 1, vec![]),
            ],
            vec![],
        );
        let exchanges = build_exchanges(None, Some(&blue), &HashMap::new());
        assert_eq!(exchanges.len(), 1);
        assert_eq!(exchanges.get(0).unwrap().blue.len(), 2);
    }

    #[test]
    fn test_auto_collect_chain_skips_resolution() {
        let mut blue = blue_op(
            vec![blue_link("d", 0, vec![Fact::new(PROCESS_ID_TRAIT, "321")])],
            vec![],
        );
        blue.auto_collect = true;

        let exchanges = build_exchanges(None, Some(&blue), &HashMap::new());
        assert!(exchanges.get(321).is_none());
        assert_eq!(exchanges.get(0).unwrap().blue.len(), 1);
    }

    #[test]
    fn test_override_wins_over_resolution() {
        let blue = blue_op(
            vec![blue_link("d", 0, vec![Fact::new(PROCESS_ID_TRAIT, "321")])],
            vec![],
        );
        let overrides = HashMap::from([("d".to_string(), 42u32)]);

        let exchanges = build_exchanges(None, Some(&blue), &overrides);
        assert!(exchanges.get(321).is_none());
        assert_eq!(exchanges.get(42).unwrap().blue.len(), 1);
    }

    #[test]
    fn test_override_applies_even_on_auto_collect_baseline() {
        let mut blue = blue_op(vec![blue_link("d", 0, vec![])], vec![]);
        blue.auto_collect = true;
        let overrides = HashMap::from([("d".to_string(), 7u32)]);

        let exchanges = build_exchanges(None, Some(&blue), &overrides);
        assert_eq!(exchanges.get(7).unwrap().blue.len(), 1);
    }

    #[test]
    fn test_every_qualifying_link_lands_exactly_once() {
        let red = red_op(vec![red_link("a", 1, 0), red_link("b", 2, 1)]);
        let mut cleanup = red_link("x", 3, 2);
        cleanup.cleanup = 1;
        let red = red_op([red.chain, vec![cleanup]].concat());

        let blue = blue_op(
            vec![
                blue_link("c", 0, vec![Fact::new(PROCESS_ID_TRAIT, "1")]),
                blue_link("d", 1, vec![]),
            ],
            vec![],
        );

        let exchanges = build_exchanges(Some(&red), Some(&blue), &HashMap::new());
        let red_count: usize = exchanges.iter().map(|(_, e)| e.red.len()).sum();
        let blue_count: usize = exchanges.iter().map(|(_, e)| e.blue.len()).sum();
        assert_eq!(red_count, 2);
        assert_eq!(blue_count, 2);
    }

    #[test]
    fn test_exchange_order_follows_first_appearance() {
        let red = red_op(vec![red_link("a", 30, 0), red_link("b", 10, 1)]);
        let blue = blue_op(
            vec![blue_link("c", 0, vec![Fact::new(PROCESS_ID_TRAIT, "20")])],
            vec![],
        );

        let exchanges = build_exchanges(Some(&red), Some(&blue), &HashMap::new());
        let pids: Vec<u32> = exchanges.iter().map(|(p, _)| *p).collect();
        assert_eq!(pids, vec![30, 10, 20]);
    }

    #[test]
    fn test_missing_timelines_yield_empty_board() {
        let exchanges = build_exchanges(None, None, &HashMap::new());
        assert!(exchanges.is_empty());
    }
}
