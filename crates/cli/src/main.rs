// claimtrack CLI - headless claim reconciliation operations

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use claimtrack_engine::normalize::{normalize_claims, normalize_tracking};
use claimtrack_engine::{Engine, EngineError};
use claimtrack_io::{read_table, write_report, IoError};
use claimtrack_store::{ReportView, Store};

use exit_codes::{
    EXIT_ERROR, EXIT_MISSING_COLUMNS, EXIT_STORE, EXIT_SUCCESS, EXIT_UNREADABLE_INPUT, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "claimtrack")]
#[command(about = "Insurance claim reconciliation (import, sync, export)")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "claims.db", env = "CLAIMTRACK_DB")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the primary claim-detail spreadsheet (insert or update per row)
    #[command(after_help = "\
Examples:
  claimtrack import claims.xlsx
  claimtrack import claims.xlsx --sheet Sheet2
  claimtrack import claims.xlsx --json | jq .inserted")]
    Import {
        /// Workbook to import (xlsx, xls, xlsb, ods)
        file: PathBuf,

        /// Worksheet name (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Output JSON report to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Suppress per-row progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Sync follow-up fields from the tracking spreadsheet
    #[command(after_help = "\
Examples:
  claimtrack sync tracking.xlsx
  claimtrack sync tracking.xlsx --json")]
    Sync {
        /// Tracking workbook with the six display columns
        file: PathBuf,

        /// Worksheet name (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Output JSON report to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Suppress per-row progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Export the consolidated report as a formatted xlsx workbook
    #[command(after_help = "\
Examples:
  claimtrack export report.xlsx
  claimtrack export pending.xlsx --pending")]
    Export {
        /// Output path (.xlsx)
        output: PathBuf,

        /// Only unpaid claims with a positive amount
        #[arg(long)]
        pending: bool,
    },

    /// Delete every claim and follow-up from the database
    Clear {
        /// Required confirmation; clear is not reversible
        #[arg(long)]
        yes: bool,
    },

    /// Print the number of stored claims
    Count {
        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import { file, sheet, json, quiet } => {
            cmd_import(&cli.db, &file, sheet.as_deref(), json, quiet)
        }
        Commands::Sync { file, sheet, json, quiet } => {
            cmd_sync(&cli.db, &file, sheet.as_deref(), json, quiet)
        }
        Commands::Export { output, pending } => cmd_export(&cli.db, &output, pending),
        Commands::Clear { yes } => cmd_clear(&cli.db, yes),
        Commands::Count { json } => cmd_count(&cli.db, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// -----------------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------------

fn cmd_import(
    db: &Path,
    file: &Path,
    sheet: Option<&str>,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let table = read_table(file, sheet).map_err(CliError::input)?;
    let records = normalize_claims(&table).map_err(CliError::engine)?;

    let store = Store::open(db).map_err(CliError::store)?;
    let engine = Engine::new(&store);

    let report = engine
        .import_claims(&records, |pct, msg| progress(pct, msg, quiet))
        .map_err(CliError::engine)?;
    if !quiet {
        eprintln!();
    }

    if json {
        println!("{}", to_json(&report)?);
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}

fn cmd_sync(
    db: &Path,
    file: &Path,
    sheet: Option<&str>,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let table = read_table(file, sheet).map_err(CliError::input)?;
    let records = normalize_tracking(&table).map_err(CliError::engine)?;

    let store = Store::open(db).map_err(CliError::store)?;
    let engine = Engine::new(&store);

    let report = engine
        .sync_followups(&records, |pct, msg| progress(pct, msg, quiet))
        .map_err(CliError::engine)?;
    if !quiet {
        eprintln!();
    }

    if json {
        println!("{}", to_json(&report)?);
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}

fn cmd_export(db: &Path, output: &Path, pending: bool) -> Result<(), CliError> {
    let store = Store::open(db).map_err(CliError::store)?;
    let view = if pending { ReportView::Pending } else { ReportView::All };
    let rows = store.report_rows(view).map_err(CliError::store)?;

    write_report(&rows, output).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: e.to_string(),
        hint: None,
    })?;

    println!("Exported {} rows to {}", rows.len(), output.display());
    Ok(())
}

fn cmd_clear(db: &Path, yes: bool) -> Result<(), CliError> {
    if !yes {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "clear deletes every claim and follow-up".into(),
            hint: Some("re-run with --yes to confirm".into()),
        });
    }

    let store = Store::open(db).map_err(CliError::store)?;
    let before = store.claim_count().map_err(CliError::store)?;
    store.clear_all().map_err(CliError::store)?;

    println!("Deleted {} claims", before);
    Ok(())
}

fn cmd_count(db: &Path, json: bool) -> Result<(), CliError> {
    let store = Store::open(db).map_err(CliError::store)?;
    let count = store.claim_count().map_err(CliError::store)?;

    if json {
        println!("{}", serde_json::json!({ "claims": count }));
    } else {
        println!("{} claims", count);
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn progress(pct: f64, msg: &str, quiet: bool) {
    if !quiet {
        eprint!("\r[{:>3.0}%] {:<50}", pct, msg);
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("cannot serialize report: {e}"),
        hint: None,
    })
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn input(err: IoError) -> Self {
        Self {
            code: EXIT_UNREADABLE_INPUT,
            message: err.to_string(),
            hint: None,
        }
    }

    fn store(err: claimtrack_store::StoreError) -> Self {
        Self {
            code: EXIT_STORE,
            message: err.to_string(),
            hint: None,
        }
    }

    fn engine(err: EngineError) -> Self {
        match err {
            EngineError::MissingColumns(_) => Self {
                code: EXIT_MISSING_COLUMNS,
                message: err.to_string(),
                hint: Some("check the sheet header row against the expected column names".into()),
            },
            EngineError::EmptyTable => Self {
                code: EXIT_ERROR,
                message: err.to_string(),
                hint: None,
            },
            EngineError::Store(_) => Self {
                code: EXIT_STORE,
                message: err.to_string(),
                hint: None,
            },
        }
    }
}
