//! Auto-status cascades: derive follow-up status from claim payment and
//! amount fields after every import or sync.
//!
//! Ordering is load-bearing: the payment cascade runs before the
//! zero/negative cascade, and the zero/negative cascade never touches a
//! Paid follow-up, so an explicit payment always wins over an
//! automatically assigned zero-amount status. Both cascades are idempotent.

use chrono::{Local, NaiveDate};

use claimtrack_store::{FollowUpFields, Store};

use crate::error::EngineError;
use crate::model::{CascadeReport, CascadeStatus, InsurerStatus};
use crate::normalize::parse_date;

/// Auto-note appended when the payment cascade marks a claim paid.
pub const PAID_NOTE: &str = "Status updated automatically - invoice paid";
/// Default action recorded by the payment cascade.
pub const PAID_ACTION: &str = "Payment processed";
/// Auto-note for the zero/negative-amount cascade.
pub const ZERO_NEGATIVE_NOTE: &str = "Status updated automatically - zero or negative amount";
/// Default action for the zero/negative-amount cascade.
pub const ZERO_NEGATIVE_ACTION: &str = "Review document amount";

const NOTE_SEPARATOR: &str = " | ";

/// Append the auto-note after existing free text; never overwrite it.
fn append_note(existing: &str, note: &str) -> String {
    if existing.is_empty() {
        note.to_string()
    } else {
        format!("{existing}{NOTE_SEPARATOR}{note}")
    }
}

fn keep_or_default(existing: &str, default: &str) -> String {
    if existing.is_empty() {
        default.to_string()
    } else {
        existing.to_string()
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Payment cascade
// ---------------------------------------------------------------------------

/// Mark every claim carrying a payment reference as Paid in its follow-up,
/// creating the follow-up when none exists. Already-Paid records are skipped.
pub fn apply_payment_cascade(store: &Store) -> Result<CascadeReport, EngineError> {
    let candidates = store.payment_candidates()?;
    let mut report = CascadeReport::default();

    store.begin()?;
    let result = (|| -> Result<(), EngineError> {
        for candidate in &candidates {
            // Absent or garbled payment dates resolve to today.
            let paid_on = parse_date(&candidate.payment_date)
                .unwrap_or_else(|| Local::now().date_naive());

            match store.followup_by_claim(candidate.claim_id)? {
                Some(existing) => {
                    if InsurerStatus::parse(&existing.fields.insurer_status).is_paid() {
                        report.skipped += 1;
                        continue;
                    }
                    let fields = FollowUpFields {
                        insurer_status: InsurerStatus::Paid.label().to_string(),
                        sent_date: existing.fields.sent_date.clone(),
                        received_date: iso(paid_on),
                        notes: append_note(&existing.fields.notes, PAID_NOTE),
                        actions: keep_or_default(&existing.fields.actions, PAID_ACTION),
                    };
                    store.update_followup(existing.id, &fields)?;
                    report.updated += 1;
                }
                None => {
                    let fields = FollowUpFields {
                        insurer_status: InsurerStatus::Paid.label().to_string(),
                        sent_date: iso(paid_on),
                        received_date: iso(paid_on),
                        notes: PAID_NOTE.to_string(),
                        actions: PAID_ACTION.to_string(),
                    };
                    store.insert_followup(candidate.claim_id, &fields)?;
                    report.inserted += 1;
                }
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            store.commit()?;
            log::info!(
                "payment cascade: {} updated, {} created, {} skipped",
                report.updated,
                report.inserted,
                report.skipped
            );
            Ok(report)
        }
        Err(e) => {
            let _ = store.rollback();
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Zero/negative cascade
// ---------------------------------------------------------------------------

/// Flag every claim with a zero or negative total. Paid follow-ups are
/// frozen and never downgraded to the zero/negative sentinel.
pub fn apply_zero_negative_cascade(store: &Store) -> Result<CascadeReport, EngineError> {
    let candidates = store.zero_negative_candidates()?;
    let mut report = CascadeReport::default();

    store.begin()?;
    let result = (|| -> Result<(), EngineError> {
        for candidate in &candidates {
            match store.followup_by_claim(candidate.claim_id)? {
                Some(existing) => {
                    match InsurerStatus::parse(&existing.fields.insurer_status) {
                        InsurerStatus::Paid | InsurerStatus::ZeroOrNegative => {
                            report.skipped += 1;
                            continue;
                        }
                        InsurerStatus::Other(_) => {}
                    }
                    // No date coercion on update; only the status and texts move.
                    let fields = FollowUpFields {
                        insurer_status: InsurerStatus::ZeroOrNegative.label().to_string(),
                        sent_date: existing.fields.sent_date.clone(),
                        received_date: existing.fields.received_date.clone(),
                        notes: append_note(&existing.fields.notes, ZERO_NEGATIVE_NOTE),
                        actions: keep_or_default(&existing.fields.actions, ZERO_NEGATIVE_ACTION),
                    };
                    store.update_followup(existing.id, &fields)?;
                    report.updated += 1;
                }
                None => {
                    let today = iso(Local::now().date_naive());
                    let fields = FollowUpFields {
                        insurer_status: InsurerStatus::ZeroOrNegative.label().to_string(),
                        sent_date: today.clone(),
                        received_date: today,
                        notes: ZERO_NEGATIVE_NOTE.to_string(),
                        actions: ZERO_NEGATIVE_ACTION.to_string(),
                    };
                    store.insert_followup(candidate.claim_id, &fields)?;
                    report.inserted += 1;
                }
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            store.commit()?;
            log::info!(
                "zero/negative cascade: {} updated, {} created, {} skipped",
                report.updated,
                report.inserted,
                report.skipped
            );
            Ok(report)
        }
        Err(e) => {
            let _ = store.rollback();
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Combined post-batch run
// ---------------------------------------------------------------------------

/// Run both cascades in their required order, converting each failure into
/// a reportable status instead of aborting the batch that triggered it.
pub fn run_cascades(store: &Store) -> (CascadeStatus, CascadeStatus) {
    let payment = match apply_payment_cascade(store) {
        Ok(report) => CascadeStatus::Completed { report },
        Err(e) => {
            log::error!("payment cascade failed: {e}");
            CascadeStatus::Failed {
                message: e.to_string(),
            }
        }
    };

    let zero_negative = match apply_zero_negative_cascade(store) {
        Ok(report) => CascadeStatus::Completed { report },
        Err(e) => {
            log::error!("zero/negative cascade failed: {e}");
            CascadeStatus::Failed {
                message: e.to_string(),
            }
        }
    };

    (payment, zero_negative)
}
