use std::fmt::Display;
use std::path::Path;

use anyhow::Result;
use serde_json::json;

use crate::models::ReportEnvelope;
use crate::sqlite::SqliteSource;

pub mod report;
pub mod schema;
pub mod step;

/// Progress lines go to stdout, or to stderr when stdout carries JSON.
pub fn progress(json: bool, message: impl Display) {
    if json {
        eprintln!("{message}");
    } else {
        println!("{message}");
    }
}

pub(crate) fn print_envelope(envelope: &ReportEnvelope) -> Result<()> {
    let encoded = serde_json::to_string_pretty(envelope)?;
    println!("{encoded}");
    Ok(())
}

/// Opens the dataset read-only. In JSON mode a failure is also reported as
/// an error envelope on stdout.
pub(crate) fn open_dataset(command: &str, json: bool, path: &Path) -> Result<SqliteSource> {
    SqliteSource::open(path).inspect_err(|error| report_open_failure(command, json, path, error))
}

pub(crate) fn report_open_failure(command: &str, json: bool, path: &Path, error: &anyhow::Error) {
    if !json {
        return;
    }
    let envelope = ReportEnvelope::error(command, "dataset_unavailable", "unable to open dataset")
        .with_error_details(json!({
            "dataset_path": path.display().to_string(),
            "cause": format!("{error:#}"),
        }));
    if let Err(encode_error) = print_envelope(&envelope) {
        eprintln!("{command}: failed to encode error envelope: {encode_error:#}");
    }
}
