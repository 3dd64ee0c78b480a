use crate::domain::projection::ProjectionConfig;
use crate::domain::rent_match::MatchTier;
use crate::domain::Decision;
use crate::ingest;
use crate::tests::utils::{run_pipeline, sample_catalog, LISTINGS_CSV};

#[test]
fn ingest_counts_rejected_rows() {
    let (listings, report) = ingest::read_listings_from(LISTINGS_CSV.as_bytes()).unwrap();
    assert_eq!(listings.len(), 5);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.samples[0].0, 6);
}

#[test]
fn report_counts_every_tier() {
    let out = run_pipeline(&ProjectionConfig::default());
    let report = &out.report;

    assert_eq!(report.input_listings, 5);
    assert_eq!(report.matched_exact, 0);
    assert_eq!(report.matched_area_banded, 3);
    assert_eq!(report.matched_bedroom_only, 1);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.projection_rejected, 0);
    assert_eq!(out.catalog.len(), report.matched());
}

#[test]
fn hebbal_listing_end_to_end() {
    let catalog = sample_catalog();
    let hebbal = catalog.get(1).unwrap();

    assert_eq!(hebbal.listing.location, "hebbal");
    assert_eq!(hebbal.imputed_rent, 26_000.0);
    assert_eq!(hebbal.match_tier, MatchTier::AreaBanded);
    assert_eq!(hebbal.comparables_used, 2);

    // 6.5M * 1.15 against 26k * (240 + 60)
    assert!((hebbal.projection.final_buying_cost - 7_475_000.0).abs() < 1e-6);
    assert!((hebbal.projection.final_renting_cost - 7_800_000.0).abs() < 1e-6);
    assert_eq!(hebbal.decision(), Decision::Buy);
}

#[test]
fn emi_with_twenty_percent_down() {
    let cfg = ProjectionConfig {
        down_payment_fraction: 0.20,
        ..ProjectionConfig::default()
    };
    let catalog = run_pipeline(&cfg).catalog;
    let hebbal = catalog.get(1).unwrap();

    assert!((hebbal.projection.loan_amount - 5_200_000.0).abs() < 1e-6);
    assert!((hebbal.projection.monthly_emi - 45_127.0).abs() <= 1.0);
}

#[test]
fn unknown_location_falls_back_to_bedroom_median() {
    let catalog = sample_catalog();
    let marathahalli = catalog.get(4).unwrap();

    assert_eq!(marathahalli.match_tier, MatchTier::BedroomOnly);
    // all 2 BHK rents: 25k, 27k, 60k
    assert_eq!(marathahalli.imputed_rent, 27_000.0);
    assert_eq!(marathahalli.comparables_used, 3);
}

#[test]
fn catalog_keeps_input_order_and_drops_unmatched() {
    let catalog = sample_catalog();
    let ids: Vec<u64> = catalog.records().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert!(catalog.get(5).is_none());
    assert_eq!(catalog.get(2).unwrap().decision(), Decision::Rent);
}

#[test]
fn reruns_are_byte_identical() {
    let first = sample_catalog();
    let second = sample_catalog();
    assert_eq!(first.fingerprint(), second.fingerprint());

    let mut a = Vec::new();
    let mut b = Vec::new();
    first.write_csv(&mut a).unwrap();
    second.write_csv(&mut b).unwrap();
    assert_eq!(a, b);

    let text = String::from_utf8(a).unwrap();
    assert!(text.starts_with("id,title,location,price_raw,price_value"));
    assert_eq!(text.lines().count(), 5);
}

#[test]
fn different_assumptions_change_the_fingerprint() {
    let base = sample_catalog();
    let cfg = ProjectionConfig {
        annual_interest_rate: 0.09,
        ..ProjectionConfig::default()
    };
    let other = run_pipeline(&cfg).catalog;
    assert_ne!(base.fingerprint(), other.fingerprint());
}
