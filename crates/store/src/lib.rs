//! `claimtrack-store`: SQLite persistence for claim details and follow-ups.
//!
//! Owns the schema, its constraints (unique `doc_number`, at most one
//! follow-up per claim, cascade delete from claim to follow-up), and every
//! SQL statement in the system. The
//! engine crate decides *what* to write; this crate knows *how*.
//!
//! Single-process, single writer. Callers serialize access; no locking is
//! implemented here.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

mod error;
mod rows;

pub use error::StoreError;
pub use rows::{
    AmountCandidate, ClaimRecord, FollowUpFields, FollowUpRow, PaymentCandidate, ReportRow,
    ReportView,
};

/// Placeholder patient name used by the upstream billing system for records
/// that should never reach a report.
pub const PATIENT_NOT_FOUND: &str = "No existe...";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS claim_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_number TEXT NOT NULL UNIQUE,
    doc_date TEXT NOT NULL,
    patient_record TEXT NOT NULL,
    patient_name TEXT NOT NULL,
    employer TEXT NOT NULL,
    insurer TEXT NOT NULL,
    doc_type TEXT NOT NULL,
    service TEXT NOT NULL,
    total_cents INTEGER NOT NULL,
    invoice_number TEXT NOT NULL,
    invoice_date TEXT NOT NULL,
    payment_number TEXT NOT NULL,
    payment_date TEXT NOT NULL,
    system_user TEXT NOT NULL,
    diagnosis_code TEXT NOT NULL,
    biller TEXT NOT NULL,
    product TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS follow_ups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    claim_id INTEGER NOT NULL UNIQUE,
    insurer_status TEXT NOT NULL,
    sent_date TEXT NOT NULL,
    received_date TEXT NOT NULL,
    notes TEXT NOT NULL,
    actions TEXT NOT NULL,
    FOREIGN KEY (claim_id) REFERENCES claim_details (id)
        ON DELETE CASCADE
);
"#;

#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        // SQLite does not enforce foreign keys unless asked; cascade delete
        // from claim_details to follow_ups depends on this pragma.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // -----------------------------------------------------------------------
    // Batch transaction control
    // -----------------------------------------------------------------------

    /// Begin the one-per-batch transaction. Per-row errors inside the batch
    /// are counted, not rolled back: whatever succeeded commits.
    pub fn begin(&self) -> Result<(), StoreError> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    pub fn commit(&self) -> Result<(), StoreError> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<(), StoreError> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Claim details
    // -----------------------------------------------------------------------

    pub fn claim_id_by_doc(&self, doc_number: &str) -> Result<Option<i64>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM claim_details WHERE doc_number = ?1",
                params![doc_number],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn insert_claim(&self, record: &ClaimRecord) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO claim_details \
             (doc_number, doc_date, patient_record, patient_name, employer, insurer, \
              doc_type, service, total_cents, invoice_number, invoice_date, \
              payment_number, payment_date, system_user, diagnosis_code, biller, product) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                record.doc_number,
                record.doc_date,
                record.patient_record,
                record.patient_name,
                record.employer,
                record.insurer,
                record.doc_type,
                record.service,
                record.total_cents,
                record.invoice_number,
                record.invoice_date,
                record.payment_number,
                record.payment_date,
                record.system_user,
                record.diagnosis_code,
                record.biller,
                record.product,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite every field except the natural key.
    pub fn update_claim(&self, claim_id: i64, record: &ClaimRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE claim_details SET \
             doc_date = ?1, patient_record = ?2, patient_name = ?3, employer = ?4, \
             insurer = ?5, doc_type = ?6, service = ?7, total_cents = ?8, \
             invoice_number = ?9, invoice_date = ?10, payment_number = ?11, \
             payment_date = ?12, system_user = ?13, diagnosis_code = ?14, \
             biller = ?15, product = ?16 \
             WHERE id = ?17",
            params![
                record.doc_date,
                record.patient_record,
                record.patient_name,
                record.employer,
                record.insurer,
                record.doc_type,
                record.service,
                record.total_cents,
                record.invoice_number,
                record.invoice_date,
                record.payment_number,
                record.payment_date,
                record.system_user,
                record.diagnosis_code,
                record.biller,
                record.product,
                claim_id,
            ],
        )?;
        Ok(())
    }

    pub fn claim_count(&self) -> Result<u64, StoreError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM claim_details", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Bulk wipe. Cascade delete covers follow_ups, but the explicit second
    /// delete also clears follow-ups orphaned before the FK pragma existed.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        self.conn.execute("DELETE FROM claim_details", [])?;
        self.conn.execute("DELETE FROM follow_ups", [])?;
        self.conn.execute("COMMIT", [])?;
        log::info!("store cleared");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Follow-ups
    // -----------------------------------------------------------------------

    pub fn followup_by_claim(&self, claim_id: i64) -> Result<Option<FollowUpRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, claim_id, insurer_status, sent_date, received_date, notes, actions \
                 FROM follow_ups WHERE claim_id = ?1",
                params![claim_id],
                |row| {
                    Ok(FollowUpRow {
                        id: row.get(0)?,
                        claim_id: row.get(1)?,
                        fields: FollowUpFields {
                            insurer_status: row.get(2)?,
                            sent_date: row.get(3)?,
                            received_date: row.get(4)?,
                            notes: row.get(5)?,
                            actions: row.get(6)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn insert_followup(
        &self,
        claim_id: i64,
        fields: &FollowUpFields,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO follow_ups \
             (claim_id, insurer_status, sent_date, received_date, notes, actions) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                claim_id,
                fields.insurer_status,
                fields.sent_date,
                fields.received_date,
                fields.notes,
                fields.actions,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_followup(
        &self,
        followup_id: i64,
        fields: &FollowUpFields,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE follow_ups SET \
             insurer_status = ?1, sent_date = ?2, received_date = ?3, notes = ?4, actions = ?5 \
             WHERE id = ?6",
            params![
                fields.insurer_status,
                fields.sent_date,
                fields.received_date,
                fields.notes,
                fields.actions,
                followup_id,
            ],
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Cascade candidate selections
    // -----------------------------------------------------------------------

    /// Claims carrying a payment reference. The `'nan'` guard keeps spreadsheet
    /// artifacts that predate the normalizer out of the cascade.
    pub fn payment_candidates(&self) -> Result<Vec<PaymentCandidate>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, doc_number, payment_number, payment_date \
             FROM claim_details \
             WHERE payment_number IS NOT NULL \
             AND payment_number != '' \
             AND payment_number != 'nan'",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PaymentCandidate {
                    claim_id: row.get(0)?,
                    doc_number: row.get(1)?,
                    payment_number: row.get(2)?,
                    payment_date: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Claims whose document total is zero or negative.
    pub fn zero_negative_candidates(&self) -> Result<Vec<AmountCandidate>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, doc_number, total_cents FROM claim_details WHERE total_cents <= 0",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AmountCandidate {
                    claim_id: row.get(0)?,
                    doc_number: row.get(1)?,
                    total_cents: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Report read path
    // -----------------------------------------------------------------------

    /// Joined claim/follow-up rows for export. Left join: claims without a
    /// follow-up still appear, with blank follow-up fields.
    pub fn report_rows(&self, view: ReportView) -> Result<Vec<ReportRow>, StoreError> {
        let base = "SELECT \
             d.doc_number, d.doc_date, d.patient_record, d.patient_name, d.employer, \
             d.insurer, d.total_cents, d.invoice_number, d.invoice_date, \
             d.payment_number, d.payment_date, d.biller, \
             COALESCE(s.insurer_status, ''), COALESCE(s.sent_date, ''), \
             COALESCE(s.received_date, ''), COALESCE(s.notes, ''), COALESCE(s.actions, '') \
             FROM claim_details d \
             LEFT JOIN follow_ups s ON d.id = s.claim_id \
             WHERE d.patient_name != ?1";
        let sql = match view {
            ReportView::All => base.to_string(),
            ReportView::Pending => format!(
                "{base} AND (d.payment_number = '' OR d.payment_number = 'nan') \
                 AND d.total_cents > 0"
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![PATIENT_NOT_FOUND], |row| {
                Ok(ReportRow {
                    doc_number: row.get(0)?,
                    doc_date: row.get(1)?,
                    patient_record: row.get(2)?,
                    patient_name: row.get(3)?,
                    employer: row.get(4)?,
                    insurer: row.get(5)?,
                    total_cents: row.get(6)?,
                    invoice_number: row.get(7)?,
                    invoice_date: row.get(8)?,
                    payment_number: row.get(9)?,
                    payment_date: row.get(10)?,
                    biller: row.get(11)?,
                    insurer_status: row.get(12)?,
                    sent_date: row.get(13)?,
                    received_date: row.get(14)?,
                    notes: row.get(15)?,
                    actions: row.get(16)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claim(doc: &str) -> ClaimRecord {
        ClaimRecord {
            doc_number: doc.to_string(),
            doc_date: "2024-01-10".into(),
            patient_record: "0001234".into(),
            patient_name: "Jane Roe".into(),
            employer: "Acme".into(),
            insurer: "Umbrella Health".into(),
            doc_type: "F".into(),
            service: "Outpatient".into(),
            total_cents: 15_000,
            invoice_number: "INV-9".into(),
            invoice_date: "2024-01-12".into(),
            payment_number: String::new(),
            payment_date: String::new(),
            system_user: "mlopez".into(),
            diagnosis_code: "J06.9".into(),
            biller: "back-office".into(),
            product: "ambulatory".into(),
        }
    }

    #[test]
    fn doc_number_is_unique() {
        let store = Store::open_in_memory().unwrap();
        store.insert_claim(&sample_claim("A100")).unwrap();
        assert!(store.insert_claim(&sample_claim("A100")).is_err());
        assert_eq!(store.claim_count().unwrap(), 1);
    }

    #[test]
    fn at_most_one_followup_per_claim() {
        let store = Store::open_in_memory().unwrap();
        let id = store.insert_claim(&sample_claim("A100")).unwrap();
        store
            .insert_followup(id, &FollowUpFields::default())
            .unwrap();
        assert!(store.insert_followup(id, &FollowUpFields::default()).is_err());
    }

    #[test]
    fn delete_cascades_to_followups() {
        let store = Store::open_in_memory().unwrap();
        let id = store.insert_claim(&sample_claim("A100")).unwrap();
        store
            .insert_followup(
                id,
                &FollowUpFields {
                    insurer_status: "Sent".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(store.followup_by_claim(id).unwrap().is_some());

        store.clear_all().unwrap();
        assert_eq!(store.claim_count().unwrap(), 0);
        assert!(store.followup_by_claim(id).unwrap().is_none());
    }

    #[test]
    fn report_left_join_includes_claims_without_followup() {
        let store = Store::open_in_memory().unwrap();
        store.insert_claim(&sample_claim("A100")).unwrap();
        let rows = store.report_rows(ReportView::All).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].insurer_status, "");
    }

    #[test]
    fn report_filters_placeholder_patients() {
        let store = Store::open_in_memory().unwrap();
        let mut ghost = sample_claim("G1");
        ghost.patient_name = PATIENT_NOT_FOUND.to_string();
        store.insert_claim(&ghost).unwrap();
        store.insert_claim(&sample_claim("A100")).unwrap();

        let rows = store.report_rows(ReportView::All).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].doc_number, "A100");
    }

    #[test]
    fn pending_view_excludes_paid_and_nonpositive() {
        let store = Store::open_in_memory().unwrap();
        let mut paid = sample_claim("P1");
        paid.payment_number = "PAY-1".into();
        store.insert_claim(&paid).unwrap();

        let mut credit = sample_claim("C1");
        credit.total_cents = -500;
        store.insert_claim(&credit).unwrap();

        store.insert_claim(&sample_claim("A100")).unwrap();

        let rows = store.report_rows(ReportView::Pending).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].doc_number, "A100");
    }

    #[test]
    fn open_on_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claims.db");
        {
            let store = Store::open(&path).unwrap();
            store.insert_claim(&sample_claim("A100")).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.claim_count().unwrap(), 1);
        assert!(store.claim_id_by_doc("A100").unwrap().is_some());
    }
}
