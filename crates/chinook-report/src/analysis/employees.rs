use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use schemars::JsonSchema;
use serde::Serialize;

use crate::models::cents_to_amount;
use crate::store::DataSource;
use crate::utils::time::{days_between, format_calendar_date, parse_calendar_date};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct EmployeeSalesRow {
    pub employee_id: i64,
    pub employee: String,
    pub hire_date: String,
    /// Days from hire date to the latest invoice in the dataset.
    pub tenure_days: Option<i64>,
    pub customers: usize,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct EmployeeSalesTable {
    /// Latest invoice date seen, used as the tenure reference point.
    pub as_of: Option<String>,
    pub rows: Vec<EmployeeSalesRow>,
}

#[derive(Debug, Default)]
struct RepTotals {
    customers: usize,
    total_cents: i64,
}

/// Sums invoice totals per customer, then per assigned sales
/// representative. Customers without a representative, and representatives
/// missing from the employee table, do not contribute rows.
pub fn employee_sales(source: &dyn DataSource) -> Result<EmployeeSalesTable> {
    let invoices = source.invoices()?;
    let mut customer_totals = BTreeMap::<i64, i64>::new();
    for invoice in &invoices {
        *customer_totals.entry(invoice.customer_id).or_insert(0) += invoice.total_cents;
    }

    let support_reps = source
        .customers()?
        .into_iter()
        .filter_map(|customer| {
            customer
                .support_rep_id
                .map(|rep_id| (customer.customer_id, rep_id))
        })
        .collect::<HashMap<_, _>>();

    let mut rep_totals = BTreeMap::<i64, RepTotals>::new();
    for (customer_id, total_cents) in customer_totals {
        let Some(rep_id) = support_reps.get(&customer_id) else {
            continue;
        };
        let totals = rep_totals.entry(*rep_id).or_default();
        totals.customers += 1;
        totals.total_cents += total_cents;
    }

    let as_of = invoices
        .iter()
        .filter_map(|invoice| parse_calendar_date(&invoice.invoice_date).ok())
        .max();

    let mut rows = source
        .employees()?
        .into_iter()
        .filter_map(|employee| {
            let totals = rep_totals.get(&employee.employee_id)?;
            let hired = parse_calendar_date(&employee.hire_date).ok();
            Some(EmployeeSalesRow {
                employee_id: employee.employee_id,
                employee: employee.display_name(),
                hire_date: hired.map_or_else(|| employee.hire_date.clone(), format_calendar_date),
                tenure_days: hired.zip(as_of).map(|(start, end)| days_between(start, end)),
                customers: totals.customers,
                total_sales: cents_to_amount(totals.total_cents),
            })
        })
        .collect::<Vec<_>>();
    rows.sort_by(compare_rows);

    Ok(EmployeeSalesTable {
        as_of: as_of.map(format_calendar_date),
        rows,
    })
}

fn compare_rows(left: &EmployeeSalesRow, right: &EmployeeSalesRow) -> Ordering {
    right
        .total_sales
        .total_cmp(&left.total_sales)
        .then_with(|| left.employee.cmp(&right.employee))
        .then_with(|| left.employee_id.cmp(&right.employee_id))
}

#[cfg(test)]
mod tests {
    use super::employee_sales;
    use crate::models::Invoice;
    use crate::store::MemorySource;

    fn fixture() -> MemorySource {
        MemorySource::new()
            .with_employee(3, "Jane", "Peacock", "2017-04-01 00:00:00")
            .with_employee(4, "Margaret", "Park", "2017-05-03 00:00:00")
            .with_employee(5, "Steve", "Johnson", "2017-10-17 00:00:00")
            .with_customer(1, "USA", Some(3))
            .with_customer(2, "USA", Some(3))
            .with_customer(3, "Canada", Some(4))
            .with_customer(4, "Chile", None)
            .with_invoice(Invoice::new(1, 1, 1000).with_date("2017-01-03 00:00:00"))
            .with_invoice(Invoice::new(2, 1, 250).with_date("2017-06-01 00:00:00"))
            .with_invoice(Invoice::new(3, 2, 500).with_date("2017-03-01 00:00:00"))
            .with_invoice(Invoice::new(4, 3, 1750).with_date("2017-12-31 00:00:00"))
            .with_invoice(Invoice::new(5, 4, 9999).with_date("2018-01-01 00:00:00"))
    }

    #[test]
    fn sums_sales_per_representative() {
        let table = employee_sales(&fixture()).expect("aggregator should run");

        let rows = table
            .rows
            .iter()
            .map(|row| (row.employee.as_str(), row.customers, row.total_sales))
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![("Jane Peacock", 2, 17.5), ("Margaret Park", 1, 17.5)]
        );
    }

    #[test]
    fn tenure_is_measured_against_latest_invoice() {
        let table = employee_sales(&fixture()).expect("aggregator should run");

        assert_eq!(table.as_of.as_deref(), Some("2018-01-01"));
        let jane = &table.rows[0];
        assert_eq!(jane.hire_date, "2017-04-01");
        assert_eq!(jane.tenure_days, Some(275));
    }

    #[test]
    fn unparseable_hire_date_leaves_tenure_empty() {
        let source = MemorySource::new()
            .with_employee(3, "Jane", "Peacock", "sometime")
            .with_customer(1, "USA", Some(3))
            .with_invoice(Invoice::new(1, 1, 100).with_date("2017-01-03"));
        let table = employee_sales(&source).expect("aggregator should run");

        assert_eq!(table.rows[0].hire_date, "sometime");
        assert_eq!(table.rows[0].tenure_days, None);
    }
}
