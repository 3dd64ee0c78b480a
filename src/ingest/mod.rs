// src/ingest/mod.rs
//
// CSV ingest for sale listings and rental comparables.

mod models;

use crate::domain::{ListingRecord, RentalComparable};
use crate::errors::{StoreError, ValidationError};
use models::{RawListingRow, RawRentalRow};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const MAX_SAMPLES: usize = 10;

/// Accepted/rejected counts for one input file, reported once per run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: usize,
    /// First few rejections as (1-based row, message).
    pub samples: Vec<(u64, String)>,
}

impl IngestReport {
    fn reject(&mut self, row: u64, message: String) {
        self.rejected += 1;
        if self.samples.len() < MAX_SAMPLES {
            self.samples.push((row, message));
        }
    }

    pub fn log_summary(&self, what: &str) {
        info!(accepted = self.accepted, rejected = self.rejected, "{what} ingested");
        if self.rejected > 0 {
            warn!(rejected = self.rejected, samples = ?self.samples, "{what} rows rejected");
        }
    }
}

pub fn read_listings(path: &Path) -> Result<(Vec<ListingRecord>, IngestReport), StoreError> {
    let file = File::open(path)
        .map_err(|e| StoreError::Io(format!("cannot open listings {}: {e}", path.display())))?;
    read_listings_from(file)
}

/// Reads sale listings. Rows that fail validation are counted, not fatal;
/// each accepted listing keeps its 1-based row number as identifier.
pub fn read_listings_from<R: Read>(input: R) -> Result<(Vec<ListingRecord>, IngestReport), StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);
    let mut report = IngestReport::default();
    let mut listings = Vec::new();

    for (idx, row) in reader.deserialize::<RawListingRow>().enumerate() {
        let row_no = idx as u64 + 1;
        let raw = match row {
            Ok(raw) => raw,
            Err(e) => {
                report.reject(row_no, format!("unreadable row: {e}"));
                continue;
            }
        };

        match listing_from_row(row_no, &raw) {
            Ok(listing) => {
                report.accepted += 1;
                listings.push(listing);
            }
            Err(e) => report.reject(row_no, e.to_string()),
        }
    }

    Ok((listings, report))
}

fn listing_from_row(row_no: u64, raw: &RawListingRow) -> Result<ListingRecord, ValidationError> {
    ListingRecord::from_raw(
        row_no,
        raw.title.as_deref().unwrap_or(""),
        raw.location.as_deref().unwrap_or(""),
        raw.price_raw.as_deref().unwrap_or(""),
        raw.price_value.as_deref(),
        raw.bhk.as_deref(),
        raw.area.as_deref(),
    )
}

pub fn read_comparables(path: &Path) -> Result<(Vec<RentalComparable>, IngestReport), StoreError> {
    let file = File::open(path)
        .map_err(|e| StoreError::Io(format!("cannot open rentals {}: {e}", path.display())))?;
    read_comparables_from(file)
}

pub fn read_comparables_from<R: Read>(
    input: R,
) -> Result<(Vec<RentalComparable>, IngestReport), StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);
    let mut report = IngestReport::default();
    let mut comparables = Vec::new();

    for (idx, row) in reader.deserialize::<RawRentalRow>().enumerate() {
        let row_no = idx as u64 + 1;
        let parsed = row
            .map_err(|e| format!("unreadable row: {e}"))
            .and_then(|raw| {
                RentalComparable::from_raw(
                    raw.location.as_deref().unwrap_or(""),
                    raw.bhk.as_deref(),
                    raw.rent.as_deref().unwrap_or(""),
                    raw.area.as_deref(),
                )
                .map_err(|e| e.to_string())
            });

        match parsed {
            Ok(comp) => {
                report.accepted += 1;
                comparables.push(comp);
            }
            Err(msg) => report.reject(row_no, msg),
        }
    }

    Ok((comparables, report))
}
