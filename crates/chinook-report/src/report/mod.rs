use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::analysis::{
    AlbumPurchaseTable, CountrySalesTable, EmployeeSalesTable, GenreSalesQuery, GenreSalesTable,
    album_purchases, country_sales, employee_sales, genre_sales,
};
use crate::store::DataSource;

pub mod markdown;

pub use markdown::{render_classifications, render_markdown_report, render_section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStep {
    GenreSales,
    EmployeeSales,
    CountrySales,
    AlbumPurchases,
}

impl AnalysisStep {
    pub const ALL: [Self; 4] = [
        Self::GenreSales,
        Self::EmployeeSales,
        Self::CountrySales,
        Self::AlbumPurchases,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::GenreSales => "genre_sales",
            Self::EmployeeSales => "employee_sales",
            Self::CountrySales => "country_sales",
            Self::AlbumPurchases => "album_purchases",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::GenreSales => "Genre sales",
            Self::EmployeeSales => "Sales by support agent",
            Self::CountrySales => "Sales by country",
            Self::AlbumPurchases => "Album vs individual track purchases",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub genre_query: GenreSalesQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum SectionTable {
    GenreSales(GenreSalesTable),
    EmployeeSales(EmployeeSalesTable),
    CountrySales(CountrySalesTable),
    AlbumPurchases(AlbumPurchaseTable),
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    Completed { table: SectionTable },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ReportSection {
    pub step: AnalysisStep,
    #[serde(flatten)]
    pub outcome: SectionOutcome,
}

impl ReportSection {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SectionOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Report {
    pub sections: Vec<ReportSection>,
}

impl Report {
    #[must_use]
    pub fn failed_steps(&self) -> Vec<AnalysisStep> {
        self.sections
            .iter()
            .filter(|section| section.is_failed())
            .map(|section| section.step)
            .collect()
    }

    #[must_use]
    pub fn section(&self, step: AnalysisStep) -> Option<&ReportSection> {
        self.sections.iter().find(|section| section.step == step)
    }
}

/// Runs one analysis step against `source`.
pub fn run_step(
    source: &dyn DataSource,
    step: AnalysisStep,
    options: &ReportOptions,
) -> Result<SectionTable> {
    let table = match step {
        AnalysisStep::GenreSales => {
            SectionTable::GenreSales(genre_sales(source, &options.genre_query)?)
        }
        AnalysisStep::EmployeeSales => SectionTable::EmployeeSales(employee_sales(source)?),
        AnalysisStep::CountrySales => SectionTable::CountrySales(country_sales(source)?),
        AnalysisStep::AlbumPurchases => SectionTable::AlbumPurchases(album_purchases(source)?),
    };
    Ok(table)
}

/// Runs every step in order. A failing step is recorded in its section and
/// does not stop the remaining steps.
#[must_use]
pub fn build_report(source: &dyn DataSource, options: &ReportOptions) -> Report {
    build_report_with_progress(source, options, |_, _| {})
}

/// Same as [`build_report`], calling `on_step` after each step completes or
/// fails.
pub fn build_report_with_progress(
    source: &dyn DataSource,
    options: &ReportOptions,
    mut on_step: impl FnMut(AnalysisStep, &SectionOutcome),
) -> Report {
    let sections = AnalysisStep::ALL
        .into_iter()
        .map(|step| {
            let outcome = match run_step(source, step, options) {
                Ok(table) => SectionOutcome::Completed { table },
                Err(error) => SectionOutcome::Failed {
                    error: format!("{error:#}"),
                },
            };
            on_step(step, &outcome);
            ReportSection { step, outcome }
        })
        .collect();

    Report { sections }
}

pub fn report_json(report: &Report) -> Result<Value> {
    serde_json::to_value(report).context("failed to encode report as JSON")
}

#[must_use]
pub fn report_json_schema() -> Value {
    let schema = schemars::schema_for!(Report);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated report schema: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, bail};
    use serde_json::json;

    use super::{AnalysisStep, ReportOptions, SectionOutcome, build_report, report_json};
    use crate::models::{Customer, Employee, Genre, Invoice, InvoiceLine, Track};
    use crate::store::{DataSource, MemorySource};

    struct BrokenGenres(MemorySource);

    impl DataSource for BrokenGenres {
        fn customers(&self) -> Result<Vec<Customer>> {
            self.0.customers()
        }
        fn invoices(&self) -> Result<Vec<Invoice>> {
            self.0.invoices()
        }
        fn invoice_lines(&self) -> Result<Vec<InvoiceLine>> {
            self.0.invoice_lines()
        }
        fn tracks(&self) -> Result<Vec<Track>> {
            self.0.tracks()
        }
        fn genres(&self) -> Result<Vec<Genre>> {
            bail!("no such table: genre")
        }
        fn employees(&self) -> Result<Vec<Employee>> {
            self.0.employees()
        }
    }

    #[test]
    fn failing_step_does_not_hide_other_sections() {
        let source = BrokenGenres(
            MemorySource::new()
                .with_customer(1, "USA", None)
                .with_invoice(Invoice::new(1, 1, 99)),
        );
        let report = build_report(&source, &ReportOptions::default());

        assert_eq!(report.sections.len(), 4);
        assert_eq!(report.failed_steps(), vec![AnalysisStep::GenreSales]);
        let countries = report
            .section(AnalysisStep::CountrySales)
            .expect("country section should exist");
        assert!(matches!(countries.outcome, SectionOutcome::Completed { .. }));
    }

    #[test]
    fn json_sections_carry_step_and_status() {
        let source = BrokenGenres(MemorySource::new());
        let report = build_report(&source, &ReportOptions::default());
        let encoded = report_json(&report).expect("report should encode");

        assert_eq!(encoded["sections"][0]["step"], json!("genre_sales"));
        assert_eq!(encoded["sections"][0]["status"], json!("failed"));
        assert_eq!(encoded["sections"][0]["error"], json!("no such table: genre"));
        assert_eq!(encoded["sections"][1]["status"], json!("completed"));
        assert_eq!(encoded["sections"][1]["table"]["rows"], json!([]));
    }
}
