use serde::Serialize;

use claimtrack_store::FollowUpFields;

// ---------------------------------------------------------------------------
// Insurer status
// ---------------------------------------------------------------------------

/// Canonical label for the terminal paid state.
pub const STATUS_PAID: &str = "Paid";
/// Canonical label for the zero/negative-amount state.
pub const STATUS_ZERO_OR_NEGATIVE: &str = "Zero or Negative";

/// Follow-up status: two automated sentinels plus whatever free text a clerk
/// typed into the tracking spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InsurerStatus {
    Paid,
    ZeroOrNegative,
    Other(String),
}

impl InsurerStatus {
    /// Sentinels match after trimming, case-insensitively; anything else is
    /// an in-progress free-text status.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(STATUS_PAID) {
            Self::Paid
        } else if trimmed.eq_ignore_ascii_case(STATUS_ZERO_OR_NEGATIVE) {
            Self::ZeroOrNegative
        } else {
            Self::Other(trimmed.to_string())
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Paid => STATUS_PAID,
            Self::ZeroOrNegative => STATUS_ZERO_OR_NEGATIVE,
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for InsurerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Per-row outcomes
// ---------------------------------------------------------------------------

/// What happened to one incoming row during an import batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Inserted,
    Updated,
    /// Existing claim is frozen by a terminal Paid follow-up.
    RejectedPaid,
    /// Blank `doc_number` after normalization.
    RejectedInvalidKey,
    Error(String),
}

// ---------------------------------------------------------------------------
// Tracking-sheet row
// ---------------------------------------------------------------------------

/// One normalized row of the tracking spreadsheet, keyed by document number.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRecord {
    pub doc_number: String,
    pub fields: FollowUpFields,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub updated: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// A cascade failure never fails the batch that triggered it; it is carried
/// separately into the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStatus {
    Completed { report: CascadeReport },
    Failed { message: String },
}

impl CascadeStatus {
    fn describe(&self, name: &str) -> String {
        match self {
            Self::Completed { report } => format!(
                "{name} cascade: {} updated, {} created, {} skipped",
                report.updated, report.inserted, report.skipped
            ),
            Self::Failed { message } => format!("{name} cascade failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub inserted: usize,
    pub updated: usize,
    pub rejected_paid: usize,
    pub errors: usize,
    pub payment: CascadeStatus,
    pub zero_negative: CascadeStatus,
}

impl ImportReport {
    /// The one human-readable line-per-concern summary shown once per
    /// operation, never per row.
    pub fn summary(&self) -> String {
        format!(
            "Inserted: {}, Updated: {}, Rejected (paid): {}, Errors: {}\n{}\n{}",
            self.inserted,
            self.updated,
            self.rejected_paid,
            self.errors,
            self.payment.describe("Payment"),
            self.zero_negative.describe("Zero/negative"),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub total_rows: usize,
    pub updated: usize,
    pub inserted: usize,
    pub errors: usize,
    pub skipped_paid: usize,
    pub payment: CascadeStatus,
    pub zero_negative: CascadeStatus,
}

impl SyncReport {
    pub fn summary(&self) -> String {
        format!(
            "Follow-ups updated: {}, created: {}, errors: {}, skipped (paid): {}\n{}\n{}",
            self.updated,
            self.inserted,
            self.errors,
            self.skipped_paid,
            self.payment.describe("Payment"),
            self.zero_negative.describe("Zero/negative"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_sentinels_parse_case_insensitively() {
        assert_eq!(InsurerStatus::parse("  paid "), InsurerStatus::Paid);
        assert_eq!(InsurerStatus::parse("PAID"), InsurerStatus::Paid);
        assert_eq!(
            InsurerStatus::parse("zero OR negative"),
            InsurerStatus::ZeroOrNegative
        );
        assert_eq!(
            InsurerStatus::parse("Sent to insurer"),
            InsurerStatus::Other("Sent to insurer".into())
        );
    }

    #[test]
    fn status_labels_are_canonical() {
        assert_eq!(InsurerStatus::parse("paid").label(), "Paid");
        assert_eq!(
            InsurerStatus::parse("ZERO OR NEGATIVE").label(),
            "Zero or Negative"
        );
    }
}
