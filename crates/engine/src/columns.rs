//! Static column tables: the spreadsheet contract is fixed, so the mappings
//! are compiled in rather than read from a config file.

/// Header names the primary claim-detail worksheet must carry, in storage
/// order. Missing any of these rejects the whole file before row processing.
pub const PRIMARY_COLUMNS: [&str; 17] = [
    "doc_number",
    "doc_date",
    "patient_record",
    "patient_name",
    "employer",
    "insurer",
    "doc_type",
    "service",
    "total_amount",
    "invoice_number",
    "invoice_date",
    "payment_number",
    "payment_date",
    "system_user",
    "diagnosis_code",
    "biller",
    "product",
];

/// Tracking spreadsheet: friendly display header → storage field.
pub const TRACKING_COLUMNS: [(&str, &str); 6] = [
    ("Document Number", "doc_number"),
    ("Insurer Status", "insurer_status"),
    ("Sent Date", "sent_date"),
    ("Received Date", "received_date"),
    ("Notes", "notes"),
    ("Actions", "actions"),
];
