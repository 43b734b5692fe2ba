//! Row normalizer: raw spreadsheet cells → canonical typed records.
//!
//! Pure transformation. The only hard failure is a missing required column,
//! which rejects the whole file; every per-cell oddity degrades to a benign
//! default (empty string, zero amount) so downstream logic can route it.

use chrono::NaiveDate;

use claimtrack_store::{ClaimRecord, FollowUpFields};

use crate::columns::{PRIMARY_COLUMNS, TRACKING_COLUMNS};
use crate::error::EngineError;
use crate::model::TrackingRecord;

/// A worksheet read into memory: one header row plus stringified data cells.
/// Text cells arrive verbatim so identity fields keep their leading zeros.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Resolve every required column to its index, or report all the
    /// missing ones at once.
    fn resolve_columns(&self, required: &[&str]) -> Result<Vec<usize>, EngineError> {
        let mut idx = Vec::with_capacity(required.len());
        let mut missing = Vec::new();
        for name in required {
            match self.column_index(name) {
                Some(i) => idx.push(i),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(idx)
        } else {
            Err(EngineError::MissingColumns(missing))
        }
    }
}

// ---------------------------------------------------------------------------
// Cell-level cleaning
// ---------------------------------------------------------------------------

/// Trim, and collapse the spreadsheet not-a-number artifact to empty.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Best-effort date parse over the formats seen in source spreadsheets.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .or_else(|| {
            // Datetime formats need the full parse, then truncate.
            chrono::NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// ISO date text or `""`; empty means "not yet set", never an error.
pub fn normalize_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Signed decimal text → integer cents. Unparseable amounts become zero,
/// which routes the row into the zero/negative cascade instead of failing it.
pub fn parse_amount_cents(raw: &str) -> i64 {
    let cleaned: String = clean_text(raw)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => (v * 100.0).round() as i64,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Primary sheet
// ---------------------------------------------------------------------------

/// Normalize the primary claim-detail sheet. Fails fast on missing columns;
/// never fails on row content.
pub fn normalize_claims(table: &RawTable) -> Result<Vec<ClaimRecord>, EngineError> {
    let idx = table.resolve_columns(&PRIMARY_COLUMNS)?;

    let records = table
        .rows
        .iter()
        .map(|row| {
            let cell = |i: usize| -> &str { row.get(idx[i]).map(String::as_str).unwrap_or("") };
            ClaimRecord {
                doc_number: clean_text(cell(0)),
                doc_date: normalize_date(cell(1)),
                patient_record: clean_text(cell(2)),
                patient_name: clean_text(cell(3)),
                employer: clean_text(cell(4)),
                insurer: clean_text(cell(5)),
                doc_type: clean_text(cell(6)),
                service: clean_text(cell(7)),
                total_cents: parse_amount_cents(cell(8)),
                invoice_number: clean_text(cell(9)),
                invoice_date: normalize_date(cell(10)),
                payment_number: clean_text(cell(11)),
                payment_date: normalize_date(cell(12)),
                system_user: clean_text(cell(13)),
                diagnosis_code: clean_text(cell(14)),
                biller: clean_text(cell(15)),
                product: clean_text(cell(16)),
            }
        })
        .collect();

    Ok(records)
}

// ---------------------------------------------------------------------------
// Tracking sheet
// ---------------------------------------------------------------------------

/// Normalize the tracking sheet (friendly display headers).
pub fn normalize_tracking(table: &RawTable) -> Result<Vec<TrackingRecord>, EngineError> {
    let display_names: Vec<&str> = TRACKING_COLUMNS.iter().map(|(d, _)| *d).collect();
    let idx = table.resolve_columns(&display_names)?;

    let records = table
        .rows
        .iter()
        .map(|row| {
            let cell = |i: usize| -> &str { row.get(idx[i]).map(String::as_str).unwrap_or("") };
            TrackingRecord {
                doc_number: clean_text(cell(0)),
                fields: FollowUpFields {
                    insurer_status: clean_text(cell(1)),
                    sent_date: normalize_date(cell(2)),
                    received_date: normalize_date(cell(3)),
                    notes: clean_text(cell(4)),
                    actions: clean_text(cell(5)),
                },
            }
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary_table(rows: Vec<Vec<String>>) -> RawTable {
        RawTable {
            headers: PRIMARY_COLUMNS.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    fn full_row(doc: &str, amount: &str) -> Vec<String> {
        [
            doc, "2024-01-10", "0001234", "Jane Roe", "Acme", "Umbrella", "F", "Outpatient",
            amount, "INV-9", "2024-01-12", "", "", "mlopez", "J06.9", "back-office", "ambulatory",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn missing_columns_reject_whole_file() {
        let mut table = primary_table(vec![full_row("A100", "150.00")]);
        table.headers.retain(|h| h != "doc_number" && h != "biller");

        let err = normalize_claims(&table).unwrap_err();
        assert_eq!(err.to_string(), "missing columns: doc_number, biller");
    }

    #[test]
    fn leading_zeros_survive() {
        let table = primary_table(vec![full_row("0001200", "150.00")]);
        let records = normalize_claims(&table).unwrap();
        assert_eq!(records[0].doc_number, "0001200");
        assert_eq!(records[0].patient_record, "0001234");
    }

    #[test]
    fn nan_collapses_to_empty() {
        assert_eq!(clean_text("nan"), "");
        assert_eq!(clean_text(" NaN "), "");
        assert_eq!(clean_text(" P55 "), "P55");
    }

    #[test]
    fn dates_parse_permissively() {
        assert_eq!(normalize_date("2024-03-01"), "2024-03-01");
        assert_eq!(normalize_date("01/03/2024"), "2024-03-01");
        assert_eq!(normalize_date("01-03-2024"), "2024-03-01");
        assert_eq!(normalize_date("2024-03-01 00:00:00"), "2024-03-01");
        assert_eq!(normalize_date("not a date"), "");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn amounts_parse_to_cents() {
        assert_eq!(parse_amount_cents("150.00"), 15_000);
        assert_eq!(parse_amount_cents("-5.00"), -500);
        assert_eq!(parse_amount_cents("S/ 1,234.50"), 123_450);
        assert_eq!(parse_amount_cents("garbled"), 0);
        assert_eq!(parse_amount_cents(""), 0);
    }

    #[test]
    fn tracking_maps_display_headers() {
        let table = RawTable {
            headers: TRACKING_COLUMNS.iter().map(|(d, _)| d.to_string()).collect(),
            rows: vec![vec![
                "A100".into(),
                "Sent to insurer".into(),
                "05/02/2024".into(),
                "".into(),
                "awaiting response".into(),
                "call back".into(),
            ]],
        };
        let records = normalize_tracking(&table).unwrap();
        assert_eq!(records[0].doc_number, "A100");
        assert_eq!(records[0].fields.insurer_status, "Sent to insurer");
        assert_eq!(records[0].fields.sent_date, "2024-02-05");
        assert_eq!(records[0].fields.received_date, "");
    }

    #[test]
    fn tracking_missing_display_column() {
        let table = RawTable {
            headers: vec!["Document Number".into(), "Insurer Status".into()],
            rows: vec![],
        };
        let err = normalize_tracking(&table).unwrap_err();
        assert!(err.to_string().contains("Sent Date"));
    }
}
