// src/domain/rent_match.rs

use crate::domain::listing::{ListingRecord, RentalComparable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Inclusive relative band applied around the listing's floor area.
pub const AREA_TOLERANCE: f64 = 0.15;

/// Which tier of the join produced an imputed rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Same location and bedroom count.
    Exact,
    /// Exact match further narrowed to comparables within the area band.
    AreaBanded,
    /// Every comparable with the same bedroom count, any location.
    BedroomOnly,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::AreaBanded => "area_banded",
            MatchTier::BedroomOnly => "bedroom_only",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "exact" => Some(MatchTier::Exact),
            "area_banded" => Some(MatchTier::AreaBanded),
            "bedroom_only" => Some(MatchTier::BedroomOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentMatch {
    pub rent: f64,
    pub tier: MatchTier,
    pub comparables: usize,
}

/// Joins sale listings against rental comparables.
///
/// Tiers, first non-empty wins:
/// 1. exact location + bedroom count, narrowed by ±15% area when both sides expose area,
/// 2. bedroom count only.
///
/// If neither tier has candidates the listing is unmatched.
pub struct RentMatcher<'a> {
    comparables: &'a [RentalComparable],
    by_location_bhk: HashMap<(String, u32), Vec<usize>>,
    bhk_medians: BTreeMap<u32, (f64, usize)>,
}

impl<'a> RentMatcher<'a> {
    pub fn new(comparables: &'a [RentalComparable]) -> Self {
        let mut by_location_bhk: HashMap<(String, u32), Vec<usize>> = HashMap::new();
        let mut by_bhk: BTreeMap<u32, Vec<f64>> = BTreeMap::new();

        for (idx, comp) in comparables.iter().enumerate() {
            by_location_bhk
                .entry((comp.location.clone(), comp.bhk))
                .or_default()
                .push(idx);
            by_bhk.entry(comp.bhk).or_default().push(comp.rent);
        }

        let bhk_medians = by_bhk
            .into_iter()
            .filter_map(|(bhk, mut rents)| {
                let n = rents.len();
                median(&mut rents).map(|m| (bhk, (m, n)))
            })
            .collect();

        Self {
            comparables,
            by_location_bhk,
            bhk_medians,
        }
    }

    /// Exact-tier candidates: same location and bedroom count.
    pub fn exact_candidates(&self, location: &str, bhk: u32) -> Vec<&'a RentalComparable> {
        self.by_location_bhk
            .get(&(location.to_string(), bhk))
            .map(|idxs| idxs.iter().map(|&i| &self.comparables[i]).collect())
            .unwrap_or_default()
    }

    /// Imputes a monthly rent, or `None` when no tier has data.
    /// Listings without a bedroom count cannot be matched at any tier.
    pub fn impute(&self, listing: &ListingRecord) -> Option<RentMatch> {
        let bhk = listing.bhk?;

        let exact = self.exact_candidates(&listing.location, bhk);
        let (candidates, tier) = match listing.area {
            Some(area) if exact.iter().any(|c| c.area.is_some()) => {
                (narrow_by_area(&exact, area), MatchTier::AreaBanded)
            }
            _ => (exact, MatchTier::Exact),
        };

        if !candidates.is_empty() {
            let mut rents: Vec<f64> = candidates.iter().map(|c| c.rent).collect();
            return median(&mut rents).map(|rent| RentMatch {
                rent,
                tier,
                comparables: candidates.len(),
            });
        }

        self.bhk_medians.get(&bhk).map(|&(rent, n)| RentMatch {
            rent,
            tier: MatchTier::BedroomOnly,
            comparables: n,
        })
    }
}

/// Keeps comparables whose area lies within the inclusive tolerance band.
/// Comparables without an area never survive narrowing.
pub fn narrow_by_area<'a>(
    candidates: &[&'a RentalComparable],
    area: f64,
) -> Vec<&'a RentalComparable> {
    let slack = area * AREA_TOLERANCE;
    let (low, high) = (area - slack, area + slack);
    candidates
        .iter()
        .copied()
        .filter(|c| matches!(c.area, Some(a) if a >= low && a <= high))
        .collect()
}

/// Median with even-count sets averaging the two middle values.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
