use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum IoError {
    /// The workbook could not be opened or parsed at all.
    Open { path: PathBuf, message: String },
    /// The requested worksheet does not exist in the workbook.
    MissingSheet { path: PathBuf, sheet: String },
    /// The worksheet has no header row.
    EmptySheet { path: PathBuf },
    /// Export-side write failure.
    Write { path: PathBuf, message: String },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            Self::MissingSheet { path, sheet } => {
                write!(f, "worksheet '{sheet}' not found in {}", path.display())
            }
            Self::EmptySheet { path } => {
                write!(f, "no header row in {}", path.display())
            }
            Self::Write { path, message } => {
                write!(f, "cannot write {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for IoError {}
