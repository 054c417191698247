use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use schemars::JsonSchema;
use serde::Serialize;

use super::rounding::ratio;
use crate::store::DataSource;

pub const DEFAULT_GENRE_COUNTRY: &str = "USA";
pub const GENRE_SHARE_DECIMALS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreSalesQuery {
    pub country: String,
    pub limit: Option<usize>,
}

impl Default for GenreSalesQuery {
    fn default() -> Self {
        Self {
            country: DEFAULT_GENRE_COUNTRY.to_string(),
            limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct GenreSalesRow {
    pub genre: String,
    pub tracks_sold: u64,
    pub percentage_sold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct GenreSalesTable {
    pub country: String,
    /// Every line sold in the country, including lines without a genre.
    pub total_tracks_sold: u64,
    pub rows: Vec<GenreSalesRow>,
}

/// Ranks genres by the number of invoice lines sold to customers in
/// `query.country`.
///
/// Shares are taken against all lines sold in the country, so lines whose
/// track has no named genre lower every share without producing a row of
/// their own. Genres with no sales are absent. Ties are ordered by genre
/// name.
pub fn genre_sales(source: &dyn DataSource, query: &GenreSalesQuery) -> Result<GenreSalesTable> {
    let customer_ids = source
        .customers()?
        .into_iter()
        .filter(|customer| customer.country.as_deref() == Some(query.country.as_str()))
        .map(|customer| customer.customer_id)
        .collect::<HashSet<_>>();
    let invoice_ids = source
        .invoices()?
        .into_iter()
        .filter(|invoice| customer_ids.contains(&invoice.customer_id))
        .map(|invoice| invoice.invoice_id)
        .collect::<HashSet<_>>();
    let track_genres = source
        .tracks()?
        .into_iter()
        .filter_map(|track| track.genre_id.map(|genre_id| (track.track_id, genre_id)))
        .collect::<HashMap<_, _>>();
    let genre_names = source
        .genres()?
        .into_iter()
        .filter_map(|genre| genre.name.map(|name| (genre.genre_id, name)))
        .collect::<HashMap<_, _>>();

    let mut total_tracks_sold = 0u64;
    let mut counts = BTreeMap::<&str, u64>::new();
    for line in source
        .invoice_lines()?
        .iter()
        .filter(|line| invoice_ids.contains(&line.invoice_id))
    {
        total_tracks_sold += 1;
        let genre_name = track_genres
            .get(&line.track_id)
            .and_then(|genre_id| genre_names.get(genre_id));
        if let Some(name) = genre_name {
            *counts.entry(name.as_str()).or_insert(0) += 1;
        }
    }

    let mut rows = counts
        .into_iter()
        .filter_map(|(genre, tracks_sold)| {
            ratio(
                i64::try_from(tracks_sold).ok()?,
                i64::try_from(total_tracks_sold).ok()?,
                GENRE_SHARE_DECIMALS,
            )
            .map(|percentage_sold| GenreSalesRow {
                genre: genre.to_string(),
                tracks_sold,
                percentage_sold,
            })
        })
        .collect::<Vec<_>>();
    rows.sort_by(compare_rows);
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }

    Ok(GenreSalesTable {
        country: query.country.clone(),
        total_tracks_sold,
        rows,
    })
}

fn compare_rows(left: &GenreSalesRow, right: &GenreSalesRow) -> Ordering {
    right
        .tracks_sold
        .cmp(&left.tracks_sold)
        .then_with(|| left.genre.cmp(&right.genre))
}
