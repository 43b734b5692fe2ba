//! Formatted xlsx export of the consolidated claim/follow-up report.

use std::path::Path;

use rust_xlsxwriter::{Color, ExcelDateTime, Format, FormatAlign, Workbook};

use claimtrack_store::ReportRow;

use crate::error::IoError;

const SHEET_NAME: &str = "Billing_FollowUp";
const HEADER_FILL: u32 = 0x366092;
const MIN_COL_WIDTH: f64 = 10.0;
const MAX_COL_WIDTH: f64 = 50.0;

enum ColumnKind {
    Text,
    Date,
    Currency,
}

/// Column layout: header label, cell kind, and the row field it reads.
/// Order matches the operational spreadsheet users already know.
const COLUMNS: [(&str, ColumnKind); 17] = [
    ("Document Number", ColumnKind::Text),
    ("Document Date", ColumnKind::Date),
    ("Patient Record", ColumnKind::Text),
    ("Patient Name", ColumnKind::Text),
    ("Employer", ColumnKind::Text),
    ("Insurer", ColumnKind::Text),
    ("Total Amount", ColumnKind::Currency),
    ("Invoice Number", ColumnKind::Text),
    ("Invoice Date", ColumnKind::Date),
    ("Payment Number", ColumnKind::Text),
    ("Payment Date", ColumnKind::Date),
    ("Biller", ColumnKind::Text),
    ("Insurer Status", ColumnKind::Text),
    ("Sent Date", ColumnKind::Date),
    ("Received Date", ColumnKind::Date),
    ("Notes", ColumnKind::Text),
    ("Actions", ColumnKind::Text),
];

fn field<'a>(row: &'a ReportRow, col: usize) -> &'a str {
    match col {
        0 => &row.doc_number,
        1 => &row.doc_date,
        2 => &row.patient_record,
        3 => &row.patient_name,
        4 => &row.employer,
        5 => &row.insurer,
        7 => &row.invoice_number,
        8 => &row.invoice_date,
        9 => &row.payment_number,
        10 => &row.payment_date,
        11 => &row.biller,
        12 => &row.insurer_status,
        13 => &row.sent_date,
        14 => &row.received_date,
        15 => &row.notes,
        16 => &row.actions,
        _ => "",
    }
}

fn display_amount(cents: i64) -> String {
    format!("{:.2}", cents as f64 / 100.0)
}

/// Write the report to `path` as a single styled worksheet: bold white
/// header on a blue fill, autofilter over the full range, frozen header
/// row, DD/MM/YYYY dates, soles currency, content-sized column widths.
pub fn write_report(rows: &[ReportRow], path: &Path) -> Result<(), IoError> {
    let wrap = |e: rust_xlsxwriter::XlsxError| IoError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(wrap)?;

    let header_format = Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let money_format = Format::new().set_num_format("\"S/ \"#,##0.00");
    let date_format = Format::new().set_num_format("dd/mm/yyyy");

    let mut widths: Vec<usize> = COLUMNS.iter().map(|(label, _)| label.len()).collect();

    for (col, (label, _)) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *label, &header_format)
            .map_err(wrap)?;
    }

    for (i, report_row) in rows.iter().enumerate() {
        let excel_row = (i + 1) as u32;
        for (col, (_, kind)) in COLUMNS.iter().enumerate() {
            let excel_col = col as u16;
            let written_len = match kind {
                ColumnKind::Currency => {
                    let value = report_row.total_cents as f64 / 100.0;
                    worksheet
                        .write_number_with_format(excel_row, excel_col, value, &money_format)
                        .map_err(wrap)?;
                    display_amount(report_row.total_cents).len() + 4
                }
                ColumnKind::Date => {
                    // Typed date cells so Excel date filtering and sorting
                    // work; unset dates stay blank text.
                    let text = field(report_row, col);
                    match ExcelDateTime::parse_from_str(text) {
                        Ok(date) => {
                            worksheet
                                .write_datetime_with_format(
                                    excel_row,
                                    excel_col,
                                    &date,
                                    &date_format,
                                )
                                .map_err(wrap)?;
                            "dd/mm/yyyy".len()
                        }
                        Err(_) => {
                            worksheet
                                .write_string(excel_row, excel_col, text)
                                .map_err(wrap)?;
                            text.len()
                        }
                    }
                }
                ColumnKind::Text => {
                    let text = field(report_row, col);
                    worksheet
                        .write_string(excel_row, excel_col, text)
                        .map_err(wrap)?;
                    text.len()
                }
            };
            if written_len > widths[col] {
                widths[col] = written_len;
            }
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let sized = ((*width as f64) + 2.0).clamp(MIN_COL_WIDTH, MAX_COL_WIDTH);
        worksheet.set_column_width(col as u16, sized).map_err(wrap)?;
    }

    let last_row = rows.len() as u32;
    let last_col = (COLUMNS.len() - 1) as u16;
    worksheet.autofilter(0, 0, last_row, last_col).map_err(wrap)?;
    worksheet.set_freeze_panes(1, 0).map_err(wrap)?;

    workbook.save(path).map_err(wrap)?;
    log::info!("report written: {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::read_table;

    fn sample_row() -> ReportRow {
        ReportRow {
            doc_number: "0001200".into(),
            doc_date: "2024-01-10".into(),
            patient_record: "0001234".into(),
            patient_name: "Jane Roe".into(),
            employer: "Acme Corp".into(),
            insurer: "Umbrella Insurance".into(),
            total_cents: 15_000,
            invoice_number: "INV-9".into(),
            invoice_date: "2024-01-12".into(),
            payment_number: String::new(),
            payment_date: String::new(),
            biller: "back-office".into(),
            insurer_status: "Sent to insurer".into(),
            sent_date: "2024-02-05".into(),
            received_date: String::new(),
            notes: "awaiting response".into(),
            actions: String::new(),
        }
    }

    #[test]
    fn report_round_trips_through_calamine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        write_report(&[sample_row()], &path).unwrap();

        let table = read_table(&path, Some(SHEET_NAME)).unwrap();
        assert_eq!(table.headers.len(), 17);
        assert_eq!(table.headers[0], "Document Number");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "0001200");
        assert_eq!(table.rows[0][1], "2024-01-10");
        assert_eq!(table.rows[0][6], "150");
    }

    #[test]
    fn date_cells_are_typed_dates_not_text() {
        use calamine::{open_workbook_auto, Data, Reader};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.xlsx");

        write_report(&[sample_row()], &path).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let doc_date = range.get_value((1, 1));
        assert!(
            matches!(doc_date, Some(Data::DateTime(_))),
            "doc_date cell should be a typed date, got {doc_date:?}"
        );
        // Unset dates stay blank, never a bogus epoch date.
        let received = range.get_value((1, 14));
        assert!(
            matches!(received, None | Some(Data::Empty))
                || matches!(received, Some(Data::String(s)) if s.is_empty())
        );
    }

    #[test]
    fn empty_report_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        write_report(&[], &path).unwrap();

        let table = read_table(&path, None).unwrap();
        assert_eq!(table.headers.len(), 17);
        assert!(table.rows.is_empty());
    }
}
