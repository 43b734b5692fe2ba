//! `claimtrack-io`: spreadsheet ingestion and report export.
//!
//! Import is a one-way conversion: worksheets become stringified
//! [`RawTable`](claimtrack_engine::RawTable)s for the normalizer. Export is a
//! presentation snapshot of the joined report, not a round-trip format.

pub mod error;
pub mod export;
pub mod xlsx;

pub use error::IoError;
pub use export::write_report;
pub use xlsx::read_table;
