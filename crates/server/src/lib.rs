//! Gameboard Server Library
//!
//! Exposes the board API router and the in-memory operation store for
//! in-process testing. The store stands in for the external data service:
//! the engine only ever sees already-materialized operations.

pub mod api;
pub mod store;

pub use api::{board_api_router, BoardApiState};
pub use store::{OperationStore, StoreError};
