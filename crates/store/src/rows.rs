use serde::Serialize;

// ---------------------------------------------------------------------------
// Claim detail
// ---------------------------------------------------------------------------

/// Canonical storage record for one billed claim document.
///
/// Dates are ISO-8601 text or `""` ("not yet set"); identity fields
/// (`doc_number`, `patient_record`, `payment_number`) are text end to end so
/// leading zeros survive. Amounts are signed integer cents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClaimRecord {
    pub doc_number: String,
    pub doc_date: String,
    pub patient_record: String,
    pub patient_name: String,
    pub employer: String,
    pub insurer: String,
    pub doc_type: String,
    pub service: String,
    pub total_cents: i64,
    pub invoice_number: String,
    pub invoice_date: String,
    pub payment_number: String,
    pub payment_date: String,
    pub system_user: String,
    pub diagnosis_code: String,
    pub biller: String,
    pub product: String,
}

// ---------------------------------------------------------------------------
// Follow-up
// ---------------------------------------------------------------------------

/// The five mutable fields of an insurer follow-up record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FollowUpFields {
    pub insurer_status: String,
    pub sent_date: String,
    pub received_date: String,
    pub notes: String,
    pub actions: String,
}

/// A follow-up row as stored, with its surrogate key and parent claim.
#[derive(Debug, Clone, Serialize)]
pub struct FollowUpRow {
    pub id: i64,
    pub claim_id: i64,
    pub fields: FollowUpFields,
}

// ---------------------------------------------------------------------------
// Cascade candidate selections
// ---------------------------------------------------------------------------

/// A claim selected by the payment cascade: payment reference present.
#[derive(Debug, Clone)]
pub struct PaymentCandidate {
    pub claim_id: i64,
    pub doc_number: String,
    pub payment_number: String,
    pub payment_date: String,
}

/// A claim selected by the zero/negative cascade: total_cents <= 0.
#[derive(Debug, Clone)]
pub struct AmountCandidate {
    pub claim_id: i64,
    pub doc_number: String,
    pub total_cents: i64,
}

// ---------------------------------------------------------------------------
// Report view
// ---------------------------------------------------------------------------

/// Which slice of the joined claim/follow-up data a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    /// Every claim (minus the data-quality sentinel filter).
    All,
    /// Unpaid claims with a positive amount.
    Pending,
}

/// One row of the consolidated report: claim fields joined with the
/// follow-up fields (blank when no follow-up exists yet).
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub doc_number: String,
    pub doc_date: String,
    pub patient_record: String,
    pub patient_name: String,
    pub employer: String,
    pub insurer: String,
    pub total_cents: i64,
    pub invoice_number: String,
    pub invoice_date: String,
    pub payment_number: String,
    pub payment_date: String,
    pub biller: String,
    pub insurer_status: String,
    pub sent_date: String,
    pub received_date: String,
    pub notes: String,
    pub actions: String,
}
