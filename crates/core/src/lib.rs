//! Gameboard Core
//!
//! Correlates two independently recorded operation timelines (a red/offense
//! chain and a blue/defense chain) against the same set of target processes
//! and turns the correlation into a running score.
//!
//! Three pieces, composed leaf-to-root:
//!
//! ```text
//!  timelines ──▶ ExchangeBuilder ──▶ exchanges ──▶ ScoringPolicy ──▶ board
//!                     │
//!                     └─ PidResolver (blue fact → canonical pid)
//! ```
//!
//! Every function here is pure given its inputs: no I/O, no shared state, no
//! retained state across invocations. Fetching timelines and serving results
//! is the server crate's job.

pub mod exchange;
pub mod fact;
pub mod link;
pub mod resolver;
pub mod scoring;

pub use exchange::{build_exchanges, resolve_pins, Exchange, ExchangeMap, PinMap};
pub use fact::{Fact, Relationship, PROCESS_ID_TRAIT};
pub use link::{ChainLink, Operation};
pub use resolver::find_original_pid;
pub use scoring::{score_exchanges, PointRecord, ScoredBoard, ScoredExchange, ScoredLink};
