use serde::Deserialize;

// Raw CSV rows, kept loosely typed. Conversion into domain records happens
// in `ListingRecord::from_raw` / `RentalComparable::from_raw`, which own
// all validation.

#[derive(Debug, Deserialize)]
pub struct RawListingRow {
    #[serde(default, alias = "Title", alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "Location", alias = "address")]
    pub location: Option<String>,
    #[serde(default, alias = "Price")]
    pub price_raw: Option<String>,
    #[serde(default, alias = "price")]
    pub price_value: Option<String>,
    #[serde(default, alias = "bedrooms", alias = "Bedrooms(BHK)")]
    pub bhk: Option<String>,
    #[serde(default, alias = "super_area_sqft", alias = "Super Area")]
    pub area: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawRentalRow {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bhk: Option<String>,
    #[serde(default)]
    pub rent: Option<String>,
    #[serde(default, alias = "super_area_sqft")]
    pub area: Option<String>,
}
