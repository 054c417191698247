use std::path::Path;

use anyhow::{Error, Result};
use clap::Args;
use serde_json::json;

use super::{open_dataset, print_envelope, progress};
use crate::analysis::{DEFAULT_GENRE_COUNTRY, GenreSalesQuery};
use crate::models::{ReportEnvelope, StepFailures};
use crate::report::{
    ReportOptions, SectionOutcome, build_report_with_progress, render_markdown_report,
    report_json,
};

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Country whose genre sales are ranked
    #[arg(long, default_value = DEFAULT_GENRE_COUNTRY)]
    pub country: String,

    /// Keep only the top N genres
    #[arg(long, value_name = "N")]
    pub genre_limit: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl ReportArgs {
    #[must_use]
    pub fn options(&self) -> ReportOptions {
        ReportOptions {
            genre_query: GenreSalesQuery {
                country: self.country.clone(),
                limit: self.genre_limit,
            },
        }
    }
}

pub fn run(args: &ReportArgs, dataset_path: &Path) -> Result<()> {
    let options = args.options();
    progress(
        args.json,
        format_args!(
            "report: start dataset={} country={}",
            dataset_path.display(),
            options.genre_query.country
        ),
    );

    let source = open_dataset("report", args.json, dataset_path)?;
    let report = build_report_with_progress(&source, &options, |step, outcome| match outcome {
        SectionOutcome::Completed { .. } => {
            progress(args.json, format_args!("report: stage {} completed", step.key()));
        }
        SectionOutcome::Failed { error } => {
            eprintln!("report: stage {} failed: {error}", step.key());
        }
    });

    let failed_steps = report
        .failed_steps()
        .into_iter()
        .map(|step| step.key().to_string())
        .collect::<Vec<_>>();

    if args.json {
        let mut envelope = ReportEnvelope::ok("report", report_json(&report)?)
            .with_meta("country", json!(options.genre_query.country))
            .with_meta("genre_limit", json!(options.genre_query.limit))
            .with_meta(
                "dataset_path",
                json!(dataset_path.display().to_string()),
            );
        for step in &failed_steps {
            envelope = envelope.with_warning("step_failed", format!("{step} did not complete"));
        }
        envelope.ok = failed_steps.is_empty();
        print_envelope(&envelope)?;
    } else {
        println!("{}", render_markdown_report(&report));
    }

    progress(
        args.json,
        format_args!(
            "report: complete sections={} failed={}",
            report.sections.len(),
            failed_steps.len()
        ),
    );

    if failed_steps.is_empty() {
        Ok(())
    } else {
        Err(Error::new(StepFailures::new(failed_steps)))
    }
}
