//! CLI exit code registry.
//!
//! Single source of truth for all exit codes. They are part of the shell
//! contract; scheduled jobs branch on them.
//!
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | Success                                   |
//! | 1    | General error (unspecified)               |
//! | 2    | Usage error (bad args, missing file path) |
//! | 3    | Required columns missing from input       |
//! | 4    | Input file unreadable or not a workbook   |
//! | 5    | Store (database) error                    |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Required column(s) absent from the source sheet header.
pub const EXIT_MISSING_COLUMNS: u8 = 3;

/// Input file could not be opened or parsed as a workbook.
pub const EXIT_UNREADABLE_INPUT: u8 = 4;

/// Database open/transaction failure.
pub const EXIT_STORE: u8 = 5;
