//! `claimtrack-engine`: upsert and auto-status reconciliation engine.
//!
//! Receives normalized spreadsheet rows, decides per row whether to insert,
//! update, or reject, and derives follow-up statuses from payment and amount
//! fields after every batch. Synchronous and blocking; the caller owns
//! threading and must serialize operations against one store.

pub mod cascade;
pub mod columns;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;

pub use engine::Engine;
pub use error::EngineError;
pub use model::{CascadeReport, CascadeStatus, ImportReport, InsurerStatus, RowOutcome, SyncReport};
pub use normalize::RawTable;
