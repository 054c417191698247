use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use schemars::JsonSchema;
use serde::Serialize;

use super::rounding::cents_ratio;
use crate::models::{Customer, cents_to_amount};
use crate::store::DataSource;

pub const OTHER_BUCKET_LABEL: &str = "Other";

/// Grouping key for the country summary. Countries with a single customer
/// collapse into `Other`, which is kept distinct from any country that
/// happens to carry the same name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CountryBucket {
    Named(String),
    Other,
}

impl CountryBucket {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Named(country) => country,
            Self::Other => OTHER_BUCKET_LABEL,
        }
    }

    #[must_use]
    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CountrySalesRow {
    pub country: String,
    pub other_bucket: bool,
    pub total_customers: usize,
    pub total_orders: usize,
    pub total_sales: f64,
    pub sales_per_customer: Option<f64>,
    pub sales_per_order: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CountrySalesTable {
    pub rows: Vec<CountrySalesRow>,
}

#[derive(Debug, Default)]
struct BucketTotals {
    customers: BTreeSet<i64>,
    orders: usize,
    total_cents: i64,
}

/// Labels each customer's country, counting every customer on file, and
/// returns the bucket for each customer id. Customers without a country get
/// no bucket.
#[must_use]
pub fn bucket_customers(customers: &[Customer]) -> HashMap<i64, CountryBucket> {
    let mut per_country = HashMap::<&str, usize>::new();
    for country in customers.iter().filter_map(|customer| customer.country.as_deref()) {
        *per_country.entry(country).or_insert(0) += 1;
    }

    customers
        .iter()
        .filter_map(|customer| {
            let country = customer.country.as_deref()?;
            let bucket = if per_country.get(country).copied() == Some(1) {
                CountryBucket::Other
            } else {
                CountryBucket::Named(country.to_string())
            };
            Some((customer.customer_id, bucket))
        })
        .collect()
}

/// Summarizes customers and invoices per country bucket.
///
/// Only customers with at least one invoice are counted in a bucket, so a
/// bucket whose customers never purchased does not appear. Named buckets are
/// ordered by total sales (descending, then label); `Other` is always last.
pub fn country_sales(source: &dyn DataSource) -> Result<CountrySalesTable> {
    let buckets = bucket_customers(&source.customers()?);

    let mut totals = BTreeMap::<CountryBucket, BucketTotals>::new();
    for invoice in source.invoices()? {
        let Some(bucket) = buckets.get(&invoice.customer_id) else {
            continue;
        };
        let entry = totals.entry(bucket.clone()).or_default();
        entry.customers.insert(invoice.customer_id);
        entry.orders += 1;
        entry.total_cents += invoice.total_cents;
    }

    let mut rows = totals
        .into_iter()
        .map(|(bucket, totals)| {
            let customers = totals.customers.len();
            CountrySalesRow {
                country: bucket.label().to_string(),
                other_bucket: bucket.is_other(),
                total_customers: customers,
                total_orders: totals.orders,
                total_sales: cents_to_amount(totals.total_cents),
                sales_per_customer: cents_ratio(totals.total_cents, customers, 2),
                sales_per_order: cents_ratio(totals.total_cents, totals.orders, 2),
            }
        })
        .collect::<Vec<_>>();
    rows.sort_by(compare_rows);

    Ok(CountrySalesTable { rows })
}

fn compare_rows(left: &CountrySalesRow, right: &CountrySalesRow) -> Ordering {
    left.other_bucket
        .cmp(&right.other_bucket)
        .then_with(|| right.total_sales.total_cmp(&left.total_sales))
        .then_with(|| left.country.cmp(&right.country))
}
