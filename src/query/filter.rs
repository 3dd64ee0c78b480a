// src/query/filter.rs

use crate::catalog::Catalog;
use crate::domain::listing::normalize_location;
use crate::domain::{Decision, EnrichedRecord};
use crate::errors::QueryError;

/// Maximum records returned per filter page.
pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionFilter {
    Any,
    Only(Decision),
}

impl DecisionFilter {
    /// Accepts "All"/"Any" plus the decision labels, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ALL" | "ANY" | "" => Ok(DecisionFilter::Any),
            other => other
                .parse::<Decision>()
                .map(DecisionFilter::Only)
                .map_err(|e| QueryError::new("decision_type", e)),
        }
    }

    pub fn admits(&self, decision: Decision) -> bool {
        match self {
            DecisionFilter::Any => true,
            DecisionFilter::Only(wanted) => *wanted == decision,
        }
    }
}

/// Normalized location tokens from a query.
///
/// A record matches when its location contains at least one token.
/// No tokens means no location constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationSet {
    tokens: Vec<String>,
}

impl LocationSet {
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens: Vec<String> = Vec::new();
        for loc in raw {
            let token = normalize_location(loc.as_ref());
            if !token.is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        Self { tokens }
    }

    pub fn matches(&self, location: &str) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let location = normalize_location(location);
        self.tokens.iter().any(|t| location.contains(t.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    pub locations: LocationSet,
    pub min_price: f64,
    pub max_price: f64,
    pub decision: DecisionFilter,
}

impl FilterQuery {
    pub fn new(
        locations: LocationSet,
        min_price: f64,
        max_price: f64,
        decision: DecisionFilter,
    ) -> Result<Self, QueryError> {
        if !min_price.is_finite() {
            return Err(QueryError::new("min_price", "must be a finite number"));
        }
        if !max_price.is_finite() {
            return Err(QueryError::new("max_price", "must be a finite number"));
        }
        if min_price > max_price {
            return Err(QueryError::new(
                "min_price",
                format!("min_price {min_price} exceeds max_price {max_price}"),
            ));
        }
        Ok(Self {
            locations,
            min_price,
            max_price,
            decision,
        })
    }

    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        let price = record.listing.price_value;
        self.locations.matches(&record.listing.location)
            && price >= self.min_price
            && price <= self.max_price
            && self.decision.admits(record.decision())
    }
}

#[derive(Debug)]
pub struct FilterPage<'a> {
    pub records: Vec<&'a EnrichedRecord>,
    pub total_matches: usize,
    /// Offset of the following page, if any records remain.
    pub next_offset: Option<usize>,
}

/// Matching records in catalog order, skipping `offset` matches and
/// returning at most `PAGE_SIZE`.
pub fn filter<'a>(catalog: &'a Catalog, query: &FilterQuery, offset: usize) -> FilterPage<'a> {
    let mut records = Vec::new();
    let mut total_matches = 0;

    for record in catalog.records().iter().filter(|r| query.matches(r)) {
        if total_matches >= offset && records.len() < PAGE_SIZE {
            records.push(record);
        }
        total_matches += 1;
    }

    let served = offset + records.len();
    FilterPage {
        records,
        total_matches,
        next_offset: (served < total_matches).then_some(served),
    }
}
