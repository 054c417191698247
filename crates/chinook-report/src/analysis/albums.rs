use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use schemars::JsonSchema;
use serde::Serialize;

use super::rounding::ratio;
use crate::store::DataSource;

pub const PURCHASE_SHARE_DECIMALS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    IndividualTracks,
    AlbumPurchase,
}

impl PurchaseKind {
    #[must_use]
    pub const fn answer(self) -> &'static str {
        match self {
            Self::AlbumPurchase => "Yes",
            Self::IndividualTracks => "No",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct InvoiceClassification {
    pub invoice_id: i64,
    /// Lowest track id on the invoice; `None` for invoices without lines.
    pub representative_track_id: Option<i64>,
    pub album_id: Option<i64>,
    pub kind: PurchaseKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct AlbumPurchaseRow {
    pub album_purchase: String,
    pub invoices: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct AlbumPurchaseTable {
    pub total_invoices: usize,
    pub rows: Vec<AlbumPurchaseRow>,
}

/// True when the invoice holds exactly the album's tracks: nothing from the
/// album is missing and nothing outside it was bought. An empty album set
/// never matches.
#[must_use]
pub fn is_album_purchase(invoice_tracks: &BTreeSet<i64>, album_tracks: &BTreeSet<i64>) -> bool {
    !album_tracks.is_empty() && invoice_tracks == album_tracks
}

/// Classifies every invoice, ordered by invoice id.
///
/// The album compared against is the album of the invoice's lowest track id.
/// Invoices with no lines, and invoices whose representative track has no
/// album (or is not in the track table), are individual-track purchases.
pub fn classify_invoices(source: &dyn DataSource) -> Result<Vec<InvoiceClassification>> {
    let tracks = source.tracks()?;
    let track_albums = tracks
        .iter()
        .map(|track| (track.track_id, track.album_id))
        .collect::<HashMap<_, _>>();
    let mut album_tracks = HashMap::<i64, BTreeSet<i64>>::new();
    for track in &tracks {
        if let Some(album_id) = track.album_id {
            album_tracks.entry(album_id).or_default().insert(track.track_id);
        }
    }

    let mut invoice_tracks = HashMap::<i64, BTreeSet<i64>>::new();
    for line in source.invoice_lines()? {
        invoice_tracks
            .entry(line.invoice_id)
            .or_default()
            .insert(line.track_id);
    }

    let invoice_ids = source
        .invoices()?
        .into_iter()
        .map(|invoice| invoice.invoice_id)
        .collect::<BTreeSet<_>>();

    let empty = BTreeSet::new();
    Ok(invoice_ids
        .into_iter()
        .map(|invoice_id| {
            let purchased = invoice_tracks.get(&invoice_id).unwrap_or(&empty);
            let representative_track_id = purchased.first().copied();
            let album_id = representative_track_id
                .and_then(|track_id| track_albums.get(&track_id).copied().flatten());
            let album = album_id
                .and_then(|album_id| album_tracks.get(&album_id))
                .unwrap_or(&empty);
            let kind = if is_album_purchase(purchased, album) {
                PurchaseKind::AlbumPurchase
            } else {
                PurchaseKind::IndividualTracks
            };

            InvoiceClassification {
                invoice_id,
                representative_track_id,
                album_id,
                kind,
            }
        })
        .collect())
}

/// Counts invoices per purchase kind. Both kinds are always listed ("No"
/// first) unless the dataset has no invoices at all.
pub fn album_purchases(source: &dyn DataSource) -> Result<AlbumPurchaseTable> {
    let classifications = classify_invoices(source)?;
    let total_invoices = classifications.len();

    let mut counts = BTreeMap::from([
        (PurchaseKind::IndividualTracks, 0usize),
        (PurchaseKind::AlbumPurchase, 0usize),
    ]);
    for classification in &classifications {
        *counts.entry(classification.kind).or_insert(0) += 1;
    }

    let rows = counts
        .into_iter()
        .filter_map(|(kind, invoices)| {
            ratio(
                i64::try_from(invoices).ok()?,
                i64::try_from(total_invoices).ok()?,
                PURCHASE_SHARE_DECIMALS,
            )
            .map(|percentage| AlbumPurchaseRow {
                album_purchase: kind.answer().to_string(),
                invoices,
                percentage,
            })
        })
        .collect();

    Ok(AlbumPurchaseTable {
        total_invoices,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{PurchaseKind, album_purchases, classify_invoices, is_album_purchase};
    use crate::models::Invoice;
    use crate::store::MemorySource;

    fn set(ids: &[i64]) -> BTreeSet<i64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn set_equality_is_symmetric() {
        let album = set(&[5, 6, 7]);
        assert!(is_album_purchase(&set(&[7, 5, 6]), &album));
        assert!(!is_album_purchase(&set(&[5, 6]), &album));
        assert!(!is_album_purchase(&set(&[5, 6, 7, 9]), &album));
        assert!(!is_album_purchase(&BTreeSet::new(), &BTreeSet::new()));
    }

    #[test]
    fn track_without_album_is_not_an_album_purchase() {
        let source = MemorySource::new()
            .with_track(1, None, None)
            .with_track(2, None, None)
            .with_invoice(Invoice::new(10, 1, 198))
            .with_lines(10, &[1, 2]);
        let classifications = classify_invoices(&source).expect("classifier should run");

        assert_eq!(classifications.len(), 1);
        assert_eq!(classifications[0].representative_track_id, Some(1));
        assert_eq!(classifications[0].album_id, None);
        assert_eq!(classifications[0].kind, PurchaseKind::IndividualTracks);
    }

    #[test]
    fn invoice_without_lines_counts_as_individual_tracks() {
        let source = MemorySource::new()
            .with_track(5, Some(1), None)
            .with_invoice(Invoice::new(10, 1, 99))
            .with_invoice(Invoice::new(11, 1, 0))
            .with_lines(10, &[5]);
        let table = album_purchases(&source).expect("classifier should run");

        assert_eq!(table.total_invoices, 2);
        let rows = table
            .rows
            .iter()
            .map(|row| (row.album_purchase.as_str(), row.invoices, row.percentage))
            .collect::<Vec<_>>();
        assert_eq!(rows, vec![("No", 1, 0.5), ("Yes", 1, 0.5)]);
    }

    #[test]
    fn shares_round_exact_halves_up() {
        let mut source = MemorySource::new().with_track(1, Some(1), None);
        for invoice_id in 1..=16 {
            source = source.with_invoice(Invoice::new(invoice_id, 1, 99));
        }
        source = source.with_lines(1, &[1]);
        let table = album_purchases(&source).expect("classifier should run");

        let rows = table
            .rows
            .iter()
            .map(|row| (row.album_purchase.as_str(), row.invoices, row.percentage))
            .collect::<Vec<_>>();
        assert_eq!(rows, vec![("No", 15, 0.938), ("Yes", 1, 0.063)]);
    }

    #[test]
    fn empty_dataset_has_no_rows() {
        let table = album_purchases(&MemorySource::new()).expect("classifier should run");
        assert_eq!(table.total_invoices, 0);
        assert!(table.rows.is_empty());
    }
}
