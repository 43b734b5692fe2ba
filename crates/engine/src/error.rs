use std::fmt;

use claimtrack_store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    /// Required column(s) absent from the source header. Whole-file
    /// rejection, reported before any row is processed.
    MissingColumns(Vec<String>),
    /// The source sheet had a header but no data rows.
    EmptyTable,
    /// Store-level failure that is fatal for the whole batch (open, begin,
    /// commit).
    Store(StoreError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumns(cols) => write!(f, "missing columns: {}", cols.join(", ")),
            Self::EmptyTable => write!(f, "no valid rows to process"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
