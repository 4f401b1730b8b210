//! Scoring policy.
//!
//! Assigns a signed point value and a human-readable justification to every
//! link on the board, then aggregates per-side totals. The point tables are
//! closed `match` expressions so the whole policy stays auditable and total:
//! every tactic scores something, and every rule has a defined default.

use serde::Serialize;

use crate::exchange::{Exchange, ExchangeMap};
use crate::link::ChainLink;

/// Points a successful, unopposed red link earns for its tactic. Unlisted
/// tactics fall through to the 1-point floor.
fn red_tactic_points(tactic: &str) -> i64 {
    match tactic {
        "collection" => 2,
        "credential-access" => 3,
        "defense-evasion" => 4,
        "exfiltration" => 3,
        "impact" => 3,
        "lateral-movement" => 5,
        "persistence" => 6,
        "privilege-escalation" => 3,
        _ => 1,
    }
}

/// Points a successful blue link earns in a contested exchange. Same
/// 1-point floor for unlisted tactics.
fn blue_tactic_points(tactic: &str) -> i64 {
    match tactic {
        "detection" => 2,
        "hunt" => 3,
        "response" => 3,
        _ => 1,
    }
}

const REASON_DETECTED: &str = "defense detected this activity";
const REASON_NOT_OK: &str = "link not in an okay state";
const REASON_UNDETECTED: &str = "activity went undetected";
const REASON_FALSE_POSITIVE: &str = "activity not performed by offense team";
const REASON_MATCHED: &str = "defensive activity matched offense activity";
const REASON_MISSED_HIGH: &str = "high-visibility activity not detected";
const REASON_MISSED_LOW: &str = "low-visibility activity not detected";
const REASON_NO_RED_OP: &str = "no offense timeline present";

/// Links with visibility at or above this threshold cost the defense the
/// larger missed-detection penalty.
const HIGH_VISIBILITY: u8 = 50;

/// Signed point value plus its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointRecord {
    pub value: i64,
    pub reason: String,
}

impl PointRecord {
    fn new(value: i64, reason: &str) -> Self {
        Self {
            value,
            reason: reason.to_string(),
        }
    }
}

/// A link annotated with its point record. Synthesized missed-detection
/// entries carry no link at all, only the points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<ChainLink>,
    pub points: PointRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoredExchange {
    pub red: Vec<ScoredLink>,
    pub blue: Vec<ScoredLink>,
}

/// The fully scored board: exchanges in report order plus the
/// `[red_total, blue_total]` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredBoard {
    pub exchanges: Vec<(u32, ScoredExchange)>,
    pub points: [i64; 2],
}

fn score_red_link(link: &ChainLink, contested: bool) -> ScoredLink {
    let points = if contested {
        PointRecord::new(0, REASON_DETECTED)
    } else if !link.succeeded() {
        PointRecord::new(0, REASON_NOT_OK)
    } else {
        PointRecord::new(red_tactic_points(&link.tactic), REASON_UNDETECTED)
    };
    ScoredLink {
        link: Some(link.clone()),
        points,
    }
}

fn score_blue_link(link: &ChainLink, red_present: bool, opposed: bool) -> ScoredLink {
    let points = if !red_present {
        // Defense scoring only applies against an offense timeline.
        PointRecord::new(0, REASON_NO_RED_OP)
    } else if !opposed {
        // A detection with nothing to detect is a false positive.
        PointRecord::new(-1, REASON_FALSE_POSITIVE)
    } else if !link.succeeded() {
        PointRecord::new(0, REASON_NOT_OK)
    } else {
        PointRecord::new(blue_tactic_points(&link.tactic), REASON_MATCHED)
    };
    ScoredLink {
        link: Some(link.clone()),
        points,
    }
}

fn missed_detection(red_link: &ChainLink) -> ScoredLink {
    let points = if red_link.visibility >= HIGH_VISIBILITY {
        PointRecord::new(-2, REASON_MISSED_HIGH)
    } else {
        PointRecord::new(-1, REASON_MISSED_LOW)
    };
    ScoredLink { link: None, points }
}

fn score_exchange(red_present: bool, blue_present: bool, exchange: &Exchange) -> ScoredExchange {
    let contested = !exchange.blue.is_empty();
    let opposed = !exchange.red.is_empty();

    let red: Vec<ScoredLink> = exchange
        .red
        .iter()
        .map(|l| score_red_link(l, contested))
        .collect();

    let mut blue: Vec<ScoredLink> = exchange
        .blue
        .iter()
        .map(|l| score_blue_link(l, red_present, opposed))
        .collect();

    // One placeholder per undetected red link, so the totals account for
    // every miss. Placeholders are additive, never replacing real links.
    if blue_present && !contested && opposed {
        blue.extend(exchange.red.iter().map(missed_detection));
    }

    ScoredExchange { red, blue }
}

/// Score every exchange independently and aggregate the
/// `[red_total, blue_total]` pair. Pure: identical inputs always yield an
/// identical board.
pub fn score_exchanges(
    red_present: bool,
    blue_present: bool,
    exchanges: &ExchangeMap,
) -> ScoredBoard {
    let scored: Vec<(u32, ScoredExchange)> = exchanges
        .iter()
        .map(|(pid, exchange)| (*pid, score_exchange(red_present, blue_present, exchange)))
        .collect();

    let red_total: i64 = scored
        .iter()
        .flat_map(|(_, e)| &e.red)
        .map(|s| s.points.value)
        .sum();
    let blue_total: i64 = scored
        .iter()
        .flat_map(|(_, e)| &e.blue)
        .map(|s| s.points.value)
        .sum();

    ScoredBoard {
        exchanges: scored,
        points: [red_total, blue_total],
    }
}
