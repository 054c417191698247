#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::Result;
use chinook_report::cli::app::{Cli, Command, RuntimeArgs};
use chinook_report::cli::commands::{self, progress};
use chinook_report::models::StepFailures;
use clap::Parser;
use clap::error::ErrorKind;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_STEP_FAILURE: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    let command_name = cli.command.name();
    let json = cli.command.emits_json();
    progress(json, format_args!("chinook-report: starting `{command_name}`"));

    match execute(cli) {
        Ok(()) => {
            progress(
                json,
                format_args!(
                    "chinook-report: completed `{command_name}` (exit_code={EXIT_SUCCESS})"
                ),
            );
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            eprintln!("chinook-report: failed `{command_name}` (exit_code={exit_code})");
            eprintln!("{error:#}");
            exit_code
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::ReportSchema => commands::schema::run_report_schema(),
        Command::Report(args) => {
            let dataset_path = resolve_dataset_path(&cli.runtime)?;
            commands::report::run(&args, &dataset_path)
        }
        Command::Genres(args) => {
            let dataset_path = resolve_dataset_path(&cli.runtime)?;
            commands::step::run_genres(&args, &dataset_path)
        }
        Command::Employees(args) => {
            let dataset_path = resolve_dataset_path(&cli.runtime)?;
            commands::step::run_employees(&args, &dataset_path)
        }
        Command::Countries(args) => {
            let dataset_path = resolve_dataset_path(&cli.runtime)?;
            commands::step::run_countries(&args, &dataset_path)
        }
        Command::Albums(args) => {
            let dataset_path = resolve_dataset_path(&cli.runtime)?;
            commands::step::run_albums(&args, &dataset_path)
        }
        Command::Schema(args) => {
            let dataset_path = resolve_dataset_path(&cli.runtime)?;
            commands::schema::run(&args, &dataset_path)
        }
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<StepFailures>().is_some() {
        EXIT_STEP_FAILURE
    } else {
        EXIT_RUNTIME_FAILURE
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn resolve_dataset_path(args: &RuntimeArgs) -> Result<PathBuf> {
    let home_dir = args
        .home_dir
        .clone()
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from));
    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    chinook_report::config::resolve_dataset_path(args.db.as_deref(), &cwd, home_dir.as_deref())
}
