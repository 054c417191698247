use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    report::ReportArgs,
    schema::SchemaArgs,
    step::{AlbumsArgs, GenresArgs, StepArgs},
};

#[derive(Debug, Parser)]
#[command(
    name = "chinook-report",
    version,
    about = "Business questions answered over the Chinook media-store database"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    /// SQLite dataset to read (defaults to `chinook.db` in the working directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run all four analyses and print them together
    Report(ReportArgs),
    /// Tracks sold per genre for one country
    Genres(GenresArgs),
    /// Sales totals per support agent
    Employees(StepArgs),
    /// Sales per country, single-customer countries grouped as `Other`
    Countries(StepArgs),
    /// Share of invoices that are whole-album purchases
    Albums(AlbumsArgs),
    /// List tables and views and check the required tables exist
    Schema(SchemaArgs),
    /// Print the JSON Schema of `report --json` data
    ReportSchema,
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Report(_) => "report",
            Self::Genres(_) => "genres",
            Self::Employees(_) => "employees",
            Self::Countries(_) => "countries",
            Self::Albums(_) => "albums",
            Self::Schema(_) => "schema",
            Self::ReportSchema => "report-schema",
        }
    }

    /// Whether stdout is reserved for a JSON document.
    #[must_use]
    pub fn emits_json(&self) -> bool {
        match self {
            Self::Report(args) => args.json,
            Self::Genres(args) => args.json,
            Self::Employees(args) | Self::Countries(args) => args.json,
            Self::Albums(args) => args.json,
            Self::Schema(args) => args.json,
            Self::ReportSchema => true,
        }
    }
}
