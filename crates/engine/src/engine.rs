//! Batch upsert and tracking sync. One transaction per batch, committed once
//! after the loop; per-row failures are counted, never fatal.

use claimtrack_store::{ClaimRecord, Store};

use crate::cascade::run_cascades;
use crate::error::EngineError;
use crate::model::{ImportReport, InsurerStatus, RowOutcome, SyncReport, TrackingRecord};

/// Reconciliation engine over an explicitly injected store handle. The
/// caller owns the store's lifecycle and must serialize operations.
pub struct Engine<'a> {
    store: &'a Store,
}

impl<'a> Engine<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    // -----------------------------------------------------------------------
    // Primary import
    // -----------------------------------------------------------------------

    /// Upsert a batch of claim records in source order, then run both
    /// auto-status cascades. `progress` is called once per row with
    /// `(percent, message)`; percent reaches exactly 100 on the last row.
    pub fn import_claims<F>(
        &self,
        records: &[ClaimRecord],
        mut progress: F,
    ) -> Result<ImportReport, EngineError>
    where
        F: FnMut(f64, &str),
    {
        if records.is_empty() {
            return Err(EngineError::EmptyTable);
        }

        let total = records.len();
        let mut inserted = 0usize;
        let mut updated = 0usize;
        let mut rejected_paid = 0usize;
        let mut errors = 0usize;

        self.store.begin()?;
        for (index, record) in records.iter().enumerate() {
            match self.upsert_claim(record) {
                RowOutcome::Inserted => inserted += 1,
                RowOutcome::Updated => updated += 1,
                RowOutcome::RejectedPaid => rejected_paid += 1,
                RowOutcome::RejectedInvalidKey => errors += 1,
                RowOutcome::Error(reason) => {
                    log::warn!("row {index} ({}): {reason}", record.doc_number);
                    errors += 1;
                }
            }

            let percent = ((index + 1) as f64 / total as f64) * 100.0;
            progress(percent, &format!("Processing: {}", record.doc_number));
        }
        self.store.commit()?;

        let (payment, zero_negative) = run_cascades(self.store);
        let report = ImportReport {
            total_rows: total,
            inserted,
            updated,
            rejected_paid,
            errors,
            payment,
            zero_negative,
        };
        log::info!("import: {}", report.summary().replace('\n', "; "));
        Ok(report)
    }

    /// Decide insert/update/reject for one row. Every failure mode is a
    /// value, not an exception; the batch always continues.
    fn upsert_claim(&self, record: &ClaimRecord) -> RowOutcome {
        if record.doc_number.is_empty() {
            return RowOutcome::RejectedInvalidKey;
        }

        let existing = match self.store.claim_id_by_doc(&record.doc_number) {
            Ok(id) => id,
            Err(e) => return RowOutcome::Error(e.to_string()),
        };

        match existing {
            None => match self.store.insert_claim(record) {
                Ok(_) => RowOutcome::Inserted,
                Err(e) => RowOutcome::Error(e.to_string()),
            },
            Some(claim_id) => {
                // Paid-freeze: a claim whose follow-up reached the terminal
                // Paid state is immutable via bulk import.
                match self.store.followup_by_claim(claim_id) {
                    Ok(Some(fu))
                        if InsurerStatus::parse(&fu.fields.insurer_status).is_paid() =>
                    {
                        RowOutcome::RejectedPaid
                    }
                    Ok(_) => match self.store.update_claim(claim_id, record) {
                        Ok(()) => RowOutcome::Updated,
                        Err(e) => RowOutcome::Error(e.to_string()),
                    },
                    Err(e) => RowOutcome::Error(e.to_string()),
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tracking sync
    // -----------------------------------------------------------------------

    /// Overwrite follow-up fields from the tracking spreadsheet. Unknown
    /// document numbers count as errors; Paid follow-ups are skipped and
    /// counted separately. Cascades re-run afterwards (idempotent).
    pub fn sync_followups<F>(
        &self,
        records: &[TrackingRecord],
        mut progress: F,
    ) -> Result<SyncReport, EngineError>
    where
        F: FnMut(f64, &str),
    {
        if records.is_empty() {
            return Err(EngineError::EmptyTable);
        }

        let total = records.len();
        let mut updated = 0usize;
        let mut inserted = 0usize;
        let mut errors = 0usize;
        let mut skipped_paid = 0usize;

        self.store.begin()?;
        for (index, record) in records.iter().enumerate() {
            match self.sync_one(record) {
                SyncOutcome::Updated => updated += 1,
                SyncOutcome::Inserted => inserted += 1,
                SyncOutcome::SkippedPaid => skipped_paid += 1,
                SyncOutcome::Error(reason) => {
                    log::warn!("tracking row {index} ({}): {reason}", record.doc_number);
                    errors += 1;
                }
            }

            let percent = ((index + 1) as f64 / total as f64) * 100.0;
            progress(percent, &format!("Processing follow-up: {}", record.doc_number));
        }
        self.store.commit()?;

        let (payment, zero_negative) = run_cascades(self.store);
        let report = SyncReport {
            total_rows: total,
            updated,
            inserted,
            errors,
            skipped_paid,
            payment,
            zero_negative,
        };
        log::info!("sync: {}", report.summary().replace('\n', "; "));
        Ok(report)
    }

    fn sync_one(&self, record: &TrackingRecord) -> SyncOutcome {
        if record.doc_number.is_empty() {
            return SyncOutcome::Error("blank document number".into());
        }

        let claim_id = match self.store.claim_id_by_doc(&record.doc_number) {
            Ok(Some(id)) => id,
            Ok(None) => {
                return SyncOutcome::Error(format!("unknown document {}", record.doc_number))
            }
            Err(e) => return SyncOutcome::Error(e.to_string()),
        };

        match self.store.followup_by_claim(claim_id) {
            Ok(Some(existing)) => {
                if InsurerStatus::parse(&existing.fields.insurer_status).is_paid() {
                    return SyncOutcome::SkippedPaid;
                }
                // User-driven sync replaces fields verbatim; only the
                // automated cascades append.
                match self.store.update_followup(existing.id, &record.fields) {
                    Ok(()) => SyncOutcome::Updated,
                    Err(e) => SyncOutcome::Error(e.to_string()),
                }
            }
            Ok(None) => match self.store.insert_followup(claim_id, &record.fields) {
                Ok(_) => SyncOutcome::Inserted,
                Err(e) => SyncOutcome::Error(e.to_string()),
            },
            Err(e) => SyncOutcome::Error(e.to_string()),
        }
    }
}

enum SyncOutcome {
    Updated,
    Inserted,
    SkippedPaid,
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimtrack_store::FollowUpFields;

    fn claim(doc: &str, cents: i64) -> ClaimRecord {
        ClaimRecord {
            doc_number: doc.to_string(),
            total_cents: cents,
            patient_name: "Jane Roe".into(),
            ..Default::default()
        }
    }

    fn no_progress(_: f64, _: &str) {}

    #[test]
    fn import_inserts_then_updates() {
        let store = Store::open_in_memory().unwrap();
        let engine = Engine::new(&store);

        let report = engine.import_claims(&[claim("A100", 15_000)], no_progress).unwrap();
        assert_eq!((report.inserted, report.updated), (1, 0));

        let report = engine.import_claims(&[claim("A100", 20_000)], no_progress).unwrap();
        assert_eq!((report.inserted, report.updated), (0, 1));
        assert_eq!(store.claim_count().unwrap(), 1);
    }

    #[test]
    fn blank_doc_number_counts_as_error() {
        let store = Store::open_in_memory().unwrap();
        let engine = Engine::new(&store);

        let report = engine
            .import_claims(&[claim("", 15_000), claim("A100", 15_000)], no_progress)
            .unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(report.inserted, 1);
    }

    #[test]
    fn empty_batch_is_fatal() {
        let store = Store::open_in_memory().unwrap();
        let engine = Engine::new(&store);
        assert!(matches!(
            engine.import_claims(&[], no_progress),
            Err(EngineError::EmptyTable)
        ));
    }

    #[test]
    fn progress_is_monotone_and_ends_at_100() {
        let store = Store::open_in_memory().unwrap();
        let engine = Engine::new(&store);

        let batch: Vec<ClaimRecord> =
            (0..7).map(|i| claim(&format!("D{i}"), 1_000)).collect();

        let mut seen: Vec<f64> = Vec::new();
        engine
            .import_claims(&batch, |pct, _msg| seen.push(pct))
            .unwrap();

        assert_eq!(seen.len(), 7);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100.0);
    }

    #[test]
    fn sync_unknown_doc_is_an_error_and_creates_nothing() {
        let store = Store::open_in_memory().unwrap();
        let engine = Engine::new(&store);
        store.insert_claim(&claim("A100", 15_000)).unwrap();

        let rows = vec![TrackingRecord {
            doc_number: "Z999".into(),
            fields: FollowUpFields::default(),
        }];
        let report = engine.sync_followups(&rows, no_progress).unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(report.inserted, 0);
        assert_eq!(store.claim_count().unwrap(), 1);
    }

    #[test]
    fn sync_overwrites_followup_verbatim() {
        let store = Store::open_in_memory().unwrap();
        let engine = Engine::new(&store);
        let id = store.insert_claim(&claim("A100", 15_000)).unwrap();
        store
            .insert_followup(
                id,
                &FollowUpFields {
                    insurer_status: "Sent to insurer".into(),
                    notes: "old note".into(),
                    ..Default::default()
                },
            )
            .unwrap();

        let rows = vec![TrackingRecord {
            doc_number: "A100".into(),
            fields: FollowUpFields {
                insurer_status: "Under review".into(),
                sent_date: "2024-02-05".into(),
                received_date: String::new(),
                notes: "new note".into(),
                actions: "escalate".into(),
            },
        }];
        let report = engine.sync_followups(&rows, no_progress).unwrap();
        assert_eq!(report.updated, 1);

        let fu = store.followup_by_claim(id).unwrap().unwrap();
        assert_eq!(fu.fields.insurer_status, "Under review");
        assert_eq!(fu.fields.notes, "new note");
    }

    #[test]
    fn sync_skips_paid_followups() {
        let store = Store::open_in_memory().unwrap();
        let engine = Engine::new(&store);
        let id = store.insert_claim(&claim("A100", 15_000)).unwrap();
        store
            .insert_followup(
                id,
                &FollowUpFields {
                    insurer_status: "Paid".into(),
                    sent_date: "2024-03-01".into(),
                    ..Default::default()
                },
            )
            .unwrap();

        let rows = vec![TrackingRecord {
            doc_number: "A100".into(),
            fields: FollowUpFields {
                insurer_status: "Under review".into(),
                ..Default::default()
            },
        }];
        let report = engine.sync_followups(&rows, no_progress).unwrap();
        assert_eq!(report.skipped_paid, 1);
        assert_eq!(report.updated, 0);

        let fu = store.followup_by_claim(id).unwrap().unwrap();
        assert_eq!(fu.fields.insurer_status, "Paid");
        assert_eq!(fu.fields.sent_date, "2024-03-01");
    }
}
