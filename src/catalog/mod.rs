// src/catalog/mod.rs
//
// The frozen, enriched catalog and the snapshot handle it is served through.

mod snapshot;

pub use snapshot::{CatalogHandle, Snapshot};

use crate::domain::rent_match::MatchTier;
use crate::domain::EnrichedRecord;
use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;

/// Immutable, ordered set of enriched records from one pipeline run.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<EnrichedRecord>,
    positions: HashMap<u64, usize>,
    fingerprint: String,
}

impl Catalog {
    pub fn new(records: Vec<EnrichedRecord>) -> Self {
        let positions = records
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id(), pos))
            .collect();
        let fingerprint = fingerprint(&records);
        Self {
            records,
            positions,
            fingerprint,
        }
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&EnrichedRecord> {
        self.positions.get(&id).map(|&pos| &self.records[pos])
    }

    /// SHA-256 over every field of every record, in catalog order.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Writes the catalog as CSV with one row per record.
    /// Identical catalogs always render to identical bytes.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_writer(out);
        for record in &self.records {
            writer.serialize(CatalogRow::from(record))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Flat row shape of the exported catalog.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: u64,
    pub title: String,
    pub location: String,
    pub price_raw: String,
    pub price_value: f64,
    pub bhk: Option<u32>,
    pub area: Option<f64>,
    pub rent: f64,
    pub match_tier: MatchTier,
    pub comparables_used: usize,
    pub interest_rate: f64,
    pub down_payment_percent: f64,
    pub down_payment: f64,
    pub loan_amount: f64,
    pub monthly_emi: f64,
    pub total_tax_buy: f64,
    pub total_tax_rent: f64,
    pub final_buying_cost: f64,
    pub final_renting_cost: f64,
    pub decision: String,
}

impl From<&EnrichedRecord> for CatalogRow {
    fn from(r: &EnrichedRecord) -> Self {
        let p = &r.projection;
        CatalogRow {
            id: r.listing.id,
            title: r.listing.title.clone(),
            location: r.listing.location.clone(),
            price_raw: r.listing.price_raw.clone(),
            price_value: r.listing.price_value,
            bhk: r.listing.bhk,
            area: r.listing.area,
            rent: r.imputed_rent,
            match_tier: r.match_tier,
            comparables_used: r.comparables_used,
            interest_rate: r.interest_rate,
            down_payment_percent: r.down_payment_fraction,
            down_payment: p.down_payment,
            loan_amount: p.loan_amount,
            monthly_emi: p.monthly_emi,
            total_tax_buy: p.total_tax_buy,
            total_tax_rent: p.total_tax_rent,
            final_buying_cost: p.final_buying_cost,
            final_renting_cost: p.final_renting_cost,
            decision: r.decision().to_string(),
        }
    }
}

fn fingerprint(records: &[EnrichedRecord]) -> String {
    fn put_f64(h: &mut Sha256, v: f64) {
        h.update(v.to_bits().to_le_bytes());
    }

    let mut hasher = Sha256::new();
    for r in records {
        let l = &r.listing;
        hasher.update(l.id.to_le_bytes());
        for text in [&l.title, &l.location, &l.price_raw] {
            hasher.update((text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        put_f64(&mut hasher, l.price_value);
        hasher.update(l.bhk.map_or(u64::MAX, u64::from).to_le_bytes());
        put_f64(&mut hasher, l.area.unwrap_or(-1.0));
        put_f64(&mut hasher, r.imputed_rent);
        hasher.update(r.match_tier.as_str().as_bytes());
        hasher.update((r.comparables_used as u64).to_le_bytes());
        put_f64(&mut hasher, r.interest_rate);
        put_f64(&mut hasher, r.down_payment_fraction);

        let p = &r.projection;
        for v in [
            p.down_payment,
            p.loan_amount,
            p.monthly_emi,
            p.total_tax_buy,
            p.total_tax_rent,
            p.final_buying_cost,
            p.final_renting_cost,
        ] {
            put_f64(&mut hasher, v);
        }
    }

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
