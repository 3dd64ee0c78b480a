// src/tests/router_tests/admin_tests.rs

use crate::catalog::Catalog;
use crate::db::index_blob;
use crate::errors::ServerError;
use crate::query::SemanticIndex;
use crate::responses::error_to_response;
use crate::router::dispatch;
use crate::tests::utils::{body_bytes, body_json, embedder, sample_catalog, test_state};

#[test]
fn unknown_route_is_not_found() {
    let (state, _scratch) = test_state();
    let err = dispatch(&state, "GET", "/nope", None, &[]).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
    assert_eq!(error_to_response(err).status(), 404);

    // right path, wrong method
    let err = dispatch(&state, "GET", "/filter", None, &[]).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
}

#[test]
fn health_reports_the_current_snapshot() {
    let (state, _scratch) = test_state();
    let mut resp = dispatch(&state, "GET", "/health", None, &[]).unwrap();
    assert_eq!(resp.status(), 200);

    let body = body_json(&mut resp);
    assert_eq!(body["version"], 1);
    assert_eq!(body["records"], 4);
    assert_eq!(body["fingerprint"], sample_catalog().fingerprint());
    assert_eq!(body["model"], "hashing-64");
}

#[test]
fn export_returns_an_xlsx_workbook() {
    let (state, _scratch) = test_state();
    let mut resp = dispatch(&state, "GET", "/export.xlsx", None, &[]).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );

    let bytes = body_bytes(&mut resp);
    // xlsx is a zip archive
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn reload_swaps_in_rebuilt_artifacts() {
    let (state, scratch) = test_state();

    let smaller = Catalog::new(sample_catalog().records()[..2].to_vec());
    scratch.save(&smaller, &embedder());

    // the running snapshot is untouched until reload
    assert_eq!(state.catalog.current().catalog.len(), 4);

    let mut resp = dispatch(&state, "POST", "/reload", None, &[]).unwrap();
    let body = body_json(&mut resp);
    assert_eq!(body["version"], 2);
    assert_eq!(body["records"], 2);

    let snapshot = state.catalog.current();
    assert_eq!(snapshot.version, 2);
    assert_eq!(snapshot.catalog.fingerprint(), smaller.fingerprint());
    assert_eq!(snapshot.index.catalog_fingerprint(), smaller.fingerprint());
}

#[test]
fn failed_reload_keeps_serving_the_old_snapshot() {
    let (state, scratch) = test_state();

    let other = Catalog::new(sample_catalog().records()[1..].to_vec());
    let stale = SemanticIndex::build(&other, &embedder()).unwrap();
    index_blob::write_index(&scratch.index_path, &stale).unwrap();

    let err = dispatch(&state, "POST", "/reload", None, &[]).unwrap_err();
    assert_eq!(error_to_response(err).status(), 500);

    let snapshot = state.catalog.current();
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.catalog.len(), 4);
}
