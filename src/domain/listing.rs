// src/domain/listing.rs

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;

/// One property for sale, as accepted by ingest.
///
/// `price_value` is always a positive, finite amount: rows whose price cannot
/// be resolved never become a `ListingRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: u64,
    pub title: String,
    /// Normalized (trimmed, lower-case, single-spaced).
    pub location: String,
    pub bhk: Option<u32>,
    pub area: Option<f64>,
    pub price_raw: String,
    pub price_value: f64,
}

impl ListingRecord {
    /// Builds a validated listing from loosely-typed ingest fields.
    ///
    /// A numeric `price_value` wins when present; otherwise `price_raw` is parsed
    /// using the Crore/Lakh suffixes the listing sites print.
    pub fn from_raw(
        id: u64,
        title: &str,
        location: &str,
        price_raw: &str,
        price_value: Option<&str>,
        bhk: Option<&str>,
        area: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let location = normalize_location(location);
        if location.is_empty() {
            return Err(ValidationError::new("location", "missing or empty location"));
        }

        let price_value = match price_value.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => text
                .parse::<f64>()
                .map_err(|_| ValidationError::new("price_value", format!("not a number: '{text}'")))?,
            None => parse_price_text(price_raw).ok_or_else(|| {
                ValidationError::new("price", format!("unparseable price text: '{}'", price_raw.trim()))
            })?,
        };

        if !price_value.is_finite() || price_value <= 0.0 {
            return Err(ValidationError::new(
                "price",
                format!("price must be a positive amount, got {price_value}"),
            ));
        }

        Ok(ListingRecord {
            id,
            title: title.trim().to_string(),
            location,
            bhk: bhk.and_then(parse_leading_int),
            area: area.and_then(parse_area),
            price_raw: price_raw.trim().to_string(),
            price_value,
        })
    }

    /// Text embedded for semantic lookups: title plus location.
    pub fn display_text(&self) -> String {
        format!("{} located in {}", self.title, self.location)
    }
}

/// A rental listing used only to calibrate imputed rents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalComparable {
    pub location: String,
    pub bhk: u32,
    pub rent: f64,
    pub area: Option<f64>,
}

impl RentalComparable {
    pub fn from_raw(
        location: &str,
        bhk: Option<&str>,
        rent: &str,
        area: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let location = normalize_location(location);
        if location.is_empty() {
            return Err(ValidationError::new("location", "missing or empty location"));
        }

        let bhk = bhk
            .and_then(parse_leading_int)
            .ok_or_else(|| ValidationError::new("bhk", "missing bedroom count"))?;

        let rent = rent
            .trim()
            .parse::<f64>()
            .ok()
            .or_else(|| parse_price_text(rent))
            .filter(|r| r.is_finite() && *r > 0.0)
            .ok_or_else(|| ValidationError::new("rent", format!("rent must be positive: '{}'", rent.trim())))?;

        Ok(RentalComparable {
            location,
            bhk,
            rent,
            area: area.and_then(parse_area),
        })
    }
}

/// Trim, collapse inner whitespace and lower-case a location name.
pub fn normalize_location(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parses listing price text such as "₹1.2 Cr", "85 Lac", "45,000".
pub fn parse_price_text(raw: &str) -> Option<f64> {
    let text = raw
        .to_lowercase()
        .replace('₹', "")
        .replace(',', "")
        .trim()
        .to_string();

    if text.is_empty() {
        return None;
    }

    let (number, multiplier) = if let Some(idx) = text.find("cr") {
        (&text[..idx], CRORE)
    } else if let Some(idx) = text.find("lac").or_else(|| text.find("lakh")) {
        (&text[..idx], LAKH)
    } else {
        (text.as_str(), 1.0)
    };

    let value = number.trim().parse::<f64>().ok()? * multiplier;
    value.is_finite().then_some(value)
}

/// "3", "3 BHK", " 2BHK " -> the leading integer.
fn parse_leading_int(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// "1200 sqft", "1,050", "950.5" -> positive area, anything else -> unknown.
fn parse_area(raw: &str) -> Option<f64> {
    let cleaned = raw.to_lowercase().replace(',', "").replace("sqft", "");
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a > 0.0)
}
