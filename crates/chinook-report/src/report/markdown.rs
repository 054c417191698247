use super::{AnalysisStep, Report, ReportSection, SectionOutcome, SectionTable};
use crate::analysis::albums::PURCHASE_SHARE_DECIMALS;
use crate::analysis::genres::GENRE_SHARE_DECIMALS;
use crate::analysis::{
    AlbumPurchaseTable, CountrySalesTable, EmployeeSalesTable, GenreSalesTable,
    InvoiceClassification,
};

const REPORT_TITLE: &str = "# Chinook business questions";
const NOT_AVAILABLE: &str = "n/a";

#[must_use]
pub fn render_markdown_report(report: &Report) -> String {
    let mut blocks = vec![REPORT_TITLE.to_string()];
    blocks.extend(report.sections.iter().map(render_section));
    blocks.join("\n\n")
}

#[must_use]
pub fn render_section(section: &ReportSection) -> String {
    match &section.outcome {
        SectionOutcome::Completed { table } => {
            let heading = section_heading(section.step, table);
            format!("{heading}\n\n{}", render_table(table))
        }
        SectionOutcome::Failed { error } => {
            format!("## {}\n\nstep failed: {error}", section.step.title())
        }
    }
}

fn section_heading(step: AnalysisStep, table: &SectionTable) -> String {
    match table {
        SectionTable::GenreSales(genres) => format!("## {} ({})", step.title(), genres.country),
        _ => format!("## {}", step.title()),
    }
}

fn render_table(table: &SectionTable) -> String {
    match table {
        SectionTable::GenreSales(table) => genre_table(table),
        SectionTable::EmployeeSales(table) => employee_table(table),
        SectionTable::CountrySales(table) => country_table(table),
        SectionTable::AlbumPurchases(table) => album_table(table),
    }
}

fn genre_table(table: &GenreSalesTable) -> String {
    markdown_table(
        &["genre", "tracks_sold", "percentage_sold"],
        table
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.genre.clone(),
                    row.tracks_sold.to_string(),
                    format_decimal(row.percentage_sold, GENRE_SHARE_DECIMALS),
                ]
            })
            .collect(),
    )
}

fn employee_table(table: &EmployeeSalesTable) -> String {
    markdown_table(
        &["employee", "hire_date", "tenure_days", "customers", "total_sales"],
        table
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.employee.clone(),
                    row.hire_date.clone(),
                    row.tenure_days
                        .map_or_else(|| NOT_AVAILABLE.to_string(), |days| days.to_string()),
                    row.customers.to_string(),
                    format_decimal(row.total_sales, 2),
                ]
            })
            .collect(),
    )
}

fn country_table(table: &CountrySalesTable) -> String {
    markdown_table(
        &[
            "country",
            "total_customers",
            "total_orders",
            "total_sales",
            "sales_per_customer",
            "sales_per_order",
        ],
        table
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.country.clone(),
                    row.total_customers.to_string(),
                    row.total_orders.to_string(),
                    format_decimal(row.total_sales, 2),
                    format_optional(row.sales_per_customer, 2),
                    format_optional(row.sales_per_order, 2),
                ]
            })
            .collect(),
    )
}

fn album_table(table: &AlbumPurchaseTable) -> String {
    markdown_table(
        &["album_purchase", "invoices", "percentage"],
        table
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.album_purchase.clone(),
                    row.invoices.to_string(),
                    format_decimal(row.percentage, PURCHASE_SHARE_DECIMALS),
                ]
            })
            .collect(),
    )
}

/// Per-invoice listing behind the album purchase summary.
#[must_use]
pub fn render_classifications(classifications: &[InvoiceClassification]) -> String {
    markdown_table(
        &["invoice_id", "representative_track_id", "album_id", "album_purchase"],
        classifications
            .iter()
            .map(|classification| {
                vec![
                    classification.invoice_id.to_string(),
                    format_id(classification.representative_track_id),
                    format_id(classification.album_id),
                    classification.kind.answer().to_string(),
                ]
            })
            .collect(),
    )
}

fn markdown_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "_no rows_".to_string();
    }

    let mut lines = vec![
        format!("| {} |", headers.join(" | ")),
        format!("|{}", " --- |".repeat(headers.len())),
    ];
    lines.extend(
        rows.iter()
            .map(|cells| format!("| {} |", cells.join(" | "))),
    );
    lines.join("\n")
}

fn format_decimal(value: f64, places: u32) -> String {
    format!("{value:.prec$}", prec = places as usize)
}

fn format_id(value: Option<i64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |id| id.to_string())
}

fn format_optional(value: Option<f64>, places: u32) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |value| format_decimal(value, places))
}
