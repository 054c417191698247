use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Args;

use super::{print_envelope, progress, report_open_failure};
use crate::models::ReportEnvelope;
use crate::report::report_json_schema;
use crate::sqlite::{SchemaOverview, list_schema_objects, open_read_only_connection};

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &SchemaArgs, dataset_path: &Path) -> Result<()> {
    progress(
        args.json,
        format_args!(
            "schema: start dataset={}",
            dataset_path.display()
        ),
    );
    let connection = open_read_only_connection(dataset_path)
        .inspect_err(|error| report_open_failure("schema", args.json, dataset_path, error))?;
    let overview = list_schema_objects(&connection)?;

    if args.json {
        let data = serde_json::to_value(&overview).context("failed to encode schema overview")?;
        let mut envelope = ReportEnvelope::ok("schema", data);
        for table in &overview.missing_tables {
            envelope =
                envelope.with_warning("missing_table", format!("required table `{table}` is absent"));
        }
        envelope.ok = overview.is_complete();
        print_envelope(&envelope)?;
    } else {
        println!("{}", render_text_overview(&overview));
    }

    if !overview.is_complete() {
        bail!(
            "dataset is missing required tables: {}",
            overview.missing_tables.join(", ")
        );
    }
    progress(
        args.json,
        format_args!("schema: complete objects={}", overview.objects.len()),
    );
    Ok(())
}

pub fn run_report_schema() -> Result<()> {
    let encoded = serde_json::to_string_pretty(&report_json_schema())
        .context("failed to encode report JSON schema")?;
    println!("{encoded}");
    Ok(())
}

#[must_use]
pub fn render_text_overview(overview: &SchemaOverview) -> String {
    let mut lines = vec![format!("objects: {}", overview.objects.len())];
    lines.extend(
        overview
            .objects
            .iter()
            .map(|object| format!("- {} {}", object.kind, object.name)),
    );
    if overview.missing_tables.is_empty() {
        lines.push("missing_tables: none".to_string());
    } else {
        lines.push(format!(
            "missing_tables: {}",
            overview.missing_tables.join(",")
        ));
    }
    lines.join("\n")
}
