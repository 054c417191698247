use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Value, json};

use super::{open_dataset, print_envelope, progress};
use crate::analysis::{DEFAULT_GENRE_COUNTRY, GenreSalesQuery, classify_invoices};
use crate::models::{ReportEnvelope, StepFailures};
use crate::report::{
    AnalysisStep, ReportOptions, ReportSection, SectionOutcome, render_classifications,
    render_section, run_step,
};
use crate::sqlite::SqliteSource;

#[derive(Debug, Clone, Args)]
pub struct StepArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct GenresArgs {
    #[arg(long, default_value = DEFAULT_GENRE_COUNTRY)]
    pub country: String,

    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct AlbumsArgs {
    /// Also list the classification of every invoice
    #[arg(long, default_value_t = false)]
    pub invoices: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run_genres(args: &GenresArgs, dataset_path: &Path) -> Result<()> {
    let options = ReportOptions {
        genre_query: GenreSalesQuery {
            country: args.country.clone(),
            limit: args.limit,
        },
    };
    let (_, section) = run_single_step(
        "genres",
        AnalysisStep::GenreSales,
        &options,
        args.json,
        dataset_path,
    )?;
    emit_section("genres", &section, Vec::new(), args.json)
}

pub fn run_employees(args: &StepArgs, dataset_path: &Path) -> Result<()> {
    let (_, section) = run_single_step(
        "employees",
        AnalysisStep::EmployeeSales,
        &ReportOptions::default(),
        args.json,
        dataset_path,
    )?;
    emit_section("employees", &section, Vec::new(), args.json)
}

pub fn run_countries(args: &StepArgs, dataset_path: &Path) -> Result<()> {
    let (_, section) = run_single_step(
        "countries",
        AnalysisStep::CountrySales,
        &ReportOptions::default(),
        args.json,
        dataset_path,
    )?;
    emit_section("countries", &section, Vec::new(), args.json)
}

pub fn run_albums(args: &AlbumsArgs, dataset_path: &Path) -> Result<()> {
    let (source, section) = run_single_step(
        "albums",
        AnalysisStep::AlbumPurchases,
        &ReportOptions::default(),
        args.json,
        dataset_path,
    )?;
    if !args.invoices {
        return emit_section("albums", &section, Vec::new(), args.json);
    }

    let classifications = classify_invoices(&source)
        .map_err(|error| step_failure("albums", AnalysisStep::AlbumPurchases, args.json, error))?;
    if args.json {
        let encoded = serde_json::to_value(&classifications)
            .context("failed to encode invoice classifications as JSON")?;
        emit_section("albums", &section, vec![("invoices", encoded)], true)
    } else {
        emit_section("albums", &section, Vec::new(), false)?;
        println!("\n{}", render_classifications(&classifications));
        Ok(())
    }
}

fn run_single_step(
    command: &str,
    step: AnalysisStep,
    options: &ReportOptions,
    json: bool,
    dataset_path: &Path,
) -> Result<(SqliteSource, ReportSection)> {
    progress(
        json,
        format_args!(
            "{command}: start dataset={}",
            dataset_path.display()
        ),
    );
    let source = open_dataset(command, json, dataset_path)?;

    progress(json, format_args!("{command}: stage {}", step.key()));
    let table =
        run_step(&source, step, options).map_err(|error| step_failure(command, step, json, error))?;

    Ok((
        source,
        ReportSection {
            step,
            outcome: SectionOutcome::Completed { table },
        },
    ))
}

fn step_failure(command: &str, step: AnalysisStep, json: bool, error: anyhow::Error) -> anyhow::Error {
    if json {
        let envelope = ReportEnvelope::error(command, "step_failed", format!("{} failed", step.key()))
            .with_error_details(json!({
                "step": step.key(),
                "cause": format!("{error:#}"),
            }));
        if let Err(encode_error) = print_envelope(&envelope) {
            eprintln!("{command}: failed to encode error envelope: {encode_error:#}");
        }
    }
    error.context(StepFailures::new(vec![step.key().to_string()]))
}

fn emit_section(
    command: &str,
    section: &ReportSection,
    extra: Vec<(&str, Value)>,
    json: bool,
) -> Result<()> {
    if json {
        let mut data = serde_json::to_value(section)
            .with_context(|| format!("failed to encode {command} result as JSON"))?;
        if let Value::Object(map) = &mut data {
            for (key, value) in extra {
                map.insert(key.to_string(), value);
            }
        }
        print_envelope(&ReportEnvelope::ok(command, data))?;
    } else {
        println!("{}", render_section(section));
    }

    progress(json, format_args!("{command}: complete step={}", section.step.key()));
    Ok(())
}
