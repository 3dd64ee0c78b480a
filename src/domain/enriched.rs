// src/domain/enriched.rs

use crate::domain::decision::Decision;
use crate::domain::listing::ListingRecord;
use crate::domain::projection::{Projection, ProjectionConfig};
use crate::domain::rent_match::{MatchTier, RentMatch};
use serde::{Deserialize, Serialize};

/// A listing with imputed rent, financing and cost figures.
///
/// The verdict is not a stored field: `decision()` always re-derives it from
/// the two final costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub listing: ListingRecord,
    pub imputed_rent: f64,
    pub match_tier: MatchTier,
    pub comparables_used: usize,
    pub interest_rate: f64,
    pub down_payment_fraction: f64,
    pub projection: Projection,
}

impl EnrichedRecord {
    pub fn new(
        listing: ListingRecord,
        rent: RentMatch,
        cfg: &ProjectionConfig,
        projection: Projection,
    ) -> Self {
        Self {
            listing,
            imputed_rent: rent.rent,
            match_tier: rent.tier,
            comparables_used: rent.comparables,
            interest_rate: cfg.annual_interest_rate,
            down_payment_fraction: cfg.down_payment_fraction,
            projection,
        }
    }

    pub fn id(&self) -> u64 {
        self.listing.id
    }

    pub fn decision(&self) -> Decision {
        Decision::classify(
            self.projection.final_buying_cost,
            self.projection.final_renting_cost,
        )
    }
}
