//! Worksheet ingestion (xlsx, xls, xlsb, ods) via calamine.
//!
//! Every cell is stringified: text verbatim (leading zeros intact), floats
//! without a spurious `.0` when integral, date serials as ISO dates. The
//! normalizer owns all further interpretation.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use claimtrack_engine::RawTable;

use crate::error::IoError;

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals, so document numbers read back clean.
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Data::Int(n) => format!("{n}"),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{e:?}"),
        // as_datetime handles both date systems and the 1900 leap-year quirk.
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.date().format("%Y-%m-%d").to_string(),
            None => format!("{}", dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Read one worksheet into a [`RawTable`]. `sheet` of `None` means the first
/// worksheet in the workbook. The first row is the header; rows after it are
/// data, trailing fully-empty rows included (the normalizer tolerates them).
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<RawTable, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| IoError::EmptySheet {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|_| IoError::MissingSheet {
            path: path.to_path_buf(),
            sheet: sheet_name.clone(),
        })?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => {
            return Err(IoError::EmptySheet {
                path: path.to_path_buf(),
            })
        }
    };

    let data: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    log::debug!(
        "read {}!{}: {} columns, {} rows",
        path.display(),
        sheet_name,
        headers.len(),
        data.len()
    );

    Ok(RawTable { headers, rows: data })
}
