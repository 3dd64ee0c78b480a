// src/domain/pipeline.rs

use crate::catalog::Catalog;
use crate::domain::enriched::EnrichedRecord;
use crate::domain::listing::{ListingRecord, RentalComparable};
use crate::domain::projection::{project, ProjectionConfig};
use crate::domain::rent_match::{MatchTier, RentMatcher};
use crate::errors::ValidationError;
use tracing::{info, warn};

/// How many individual rejection messages are kept for the run summary.
const MAX_REPORTED_REJECTIONS: usize = 10;

/// Aggregated outcome of one enrichment run, reported once.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineReport {
    pub input_listings: usize,
    pub matched_exact: usize,
    pub matched_area_banded: usize,
    pub matched_bedroom_only: usize,
    /// Listings with no comparable at any tier; excluded from the catalog.
    pub unmatched: usize,
    pub projection_rejected: usize,
    pub sample_rejections: Vec<(u64, ValidationError)>,
}

impl PipelineReport {
    pub fn matched(&self) -> usize {
        self.matched_exact + self.matched_area_banded + self.matched_bedroom_only
    }

    fn count_tier(&mut self, tier: MatchTier) {
        match tier {
            MatchTier::Exact => self.matched_exact += 1,
            MatchTier::AreaBanded => self.matched_area_banded += 1,
            MatchTier::BedroomOnly => self.matched_bedroom_only += 1,
        }
    }

    pub fn log_summary(&self) {
        info!(
            input = self.input_listings,
            matched = self.matched(),
            exact = self.matched_exact,
            area_banded = self.matched_area_banded,
            bedroom_only = self.matched_bedroom_only,
            "rent imputation finished"
        );
        if self.unmatched > 0 {
            warn!(
                unmatched = self.unmatched,
                "listings excluded: no rental comparable at any tier"
            );
        }
        if self.projection_rejected > 0 {
            warn!(
                rejected = self.projection_rejected,
                samples = ?self.sample_rejections,
                "listings rejected by projection input validation"
            );
        }
    }
}

pub struct PipelineOutput {
    pub catalog: Catalog,
    pub report: PipelineReport,
}

/// Rent imputation, projection and classification over the whole input.
///
/// Per-record failures are counted, never fatal. Output order follows input order.
pub fn run(
    listings: Vec<ListingRecord>,
    comparables: &[RentalComparable],
    cfg: &ProjectionConfig,
) -> PipelineOutput {
    let matcher = RentMatcher::new(comparables);
    let mut report = PipelineReport {
        input_listings: listings.len(),
        ..PipelineReport::default()
    };
    let mut records = Vec::with_capacity(listings.len());

    for listing in listings {
        let Some(rent) = matcher.impute(&listing) else {
            report.unmatched += 1;
            continue;
        };

        match project(listing.price_value, rent.rent, cfg) {
            Ok(projection) => {
                report.count_tier(rent.tier);
                records.push(EnrichedRecord::new(listing, rent, cfg, projection));
            }
            Err(e) => {
                report.projection_rejected += 1;
                if report.sample_rejections.len() < MAX_REPORTED_REJECTIONS {
                    report.sample_rejections.push((listing.id, e));
                }
            }
        }
    }

    PipelineOutput {
        catalog: Catalog::new(records),
        report,
    }
}
