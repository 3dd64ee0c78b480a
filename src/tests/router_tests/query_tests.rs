// src/tests/router_tests/query_tests.rs

use crate::advisor::{AnswerGenerator, GenerateError, FALLBACK_ANSWER};
use crate::responses::error_to_response;
use crate::router::dispatch;
use crate::tests::utils::{body_json, test_state};
use serde_json::{json, Value};
use std::sync::Arc;

fn post(state: &crate::router::AppState, path: &str, body: Value) -> (u16, Value) {
    let bytes = serde_json::to_vec(&body).unwrap();
    let mut resp = match dispatch(state, "POST", path, None, &bytes) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    };
    (resp.status().as_u16(), body_json(&mut resp))
}

fn ids(records: &Value) -> Vec<u64> {
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect()
}

fn id_list(values: &Value) -> Vec<u64> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect()
}

#[test]
fn filter_by_location_and_decision() {
    let (state, _scratch) = test_state();

    let (status, body) = post(
        &state,
        "/filter",
        json!({"locations": ["Hebbal"], "decision_type": "BUY"}),
    );
    assert_eq!(status, 200);
    assert_eq!(ids(&body["records"]), vec![1]);
    assert_eq!(body["total_matches"], 1);
    assert_eq!(body["next_offset"], Value::Null);

    let row = &body["records"][0];
    assert_eq!(row["price_raw"], "₹65 Lac");
    assert_eq!(row["decision"], "BUY");
    assert!(row["monthly_emi"].as_f64().unwrap() > 0.0);
}

#[test]
fn filter_without_constraints_returns_everything_in_order() {
    let (state, _scratch) = test_state();
    let (status, body) = post(&state, "/filter", json!({"decision_type": "All"}));
    assert_eq!(status, 200);
    assert_eq!(ids(&body["records"]), vec![1, 2, 3, 4]);
}

#[test]
fn filter_price_range_is_inclusive() {
    let (state, _scratch) = test_state();
    let (_, body) = post(
        &state,
        "/filter",
        json!({"min_price": 4_500_000.0, "max_price": 6_500_000.0}),
    );
    assert_eq!(ids(&body["records"]), vec![1, 3]);

    let (_, body) = post(&state, "/filter", json!({"decision_type": "rent"}));
    assert_eq!(ids(&body["records"]), vec![2]);
}

#[test]
fn filter_rejects_inverted_range_and_unknown_decision() {
    let (state, _scratch) = test_state();

    let (status, body) = post(
        &state,
        "/filter",
        json!({"min_price": 9_000_000.0, "max_price": 1_000_000.0}),
    );
    assert_eq!(status, 400);
    assert_eq!(body["field"], "min_price");

    let (status, body) = post(&state, "/filter", json!({"decision_type": "MAYBE"}));
    assert_eq!(status, 400);
    assert_eq!(body["field"], "decision_type");
}

#[test]
fn malformed_json_is_a_bad_request() {
    let (state, _scratch) = test_state();
    let err = dispatch(&state, "POST", "/filter", None, b"{not json").unwrap_err();
    assert_eq!(error_to_response(err).status(), 400);
}

#[test]
fn search_finds_a_record_by_its_own_text() {
    let (state, _scratch) = test_state();
    let (status, body) = post(
        &state,
        "/search",
        json!({"query": "3 BHK Villa in Whitefield located in whitefield", "k": 2}),
    );
    assert_eq!(status, 200);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], 2);
    assert!(results[0]["distance"].as_f64().unwrap() < 1e-5);
    assert!(results[0]["distance"].as_f64() <= results[1]["distance"].as_f64());
}

#[test]
fn search_defaults_k_and_never_exceeds_catalog() {
    let (state, _scratch) = test_state();
    let (status, body) = post(&state, "/search", json!({"query": "flat"}));
    assert_eq!(status, 200);
    // default k is 5, the catalog has 4 records
    assert_eq!(body["results"].as_array().unwrap().len(), 4);
}

#[test]
fn search_validates_k_and_query() {
    let (state, _scratch) = test_state();

    for k in [0, -3, 11] {
        let (status, body) = post(&state, "/search", json!({"query": "villa", "k": k}));
        assert_eq!(status, 400, "k = {k}");
        assert_eq!(body["field"], "k");
    }

    let (status, body) = post(&state, "/search", json!({"query": "   "}));
    assert_eq!(status, 400);
    assert_eq!(body["field"], "query");
}

#[test]
fn chat_answers_from_retrieved_records() {
    let (state, _scratch) = test_state();
    let (status, body) = post(
        &state,
        "/chat",
        json!({"query": "2 BHK Apartment in Hebbal located in hebbal"}),
    );
    assert_eq!(status, 200);

    let found = id_list(&body["properties_found"]);
    assert_eq!(found[0], 1);
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.contains("₹65 Lac"));
    assert!(answer.contains("Verdict: BUY"));
}

struct DownGenerator;

impl AnswerGenerator for DownGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Err(GenerateError::Status {
            status: 503,
            body: "overloaded".into(),
        })
    }
}

#[test]
fn chat_degrades_when_the_generator_fails() {
    let (mut state, _scratch) = test_state();
    state.generator = Arc::new(DownGenerator);

    let (status, body) = post(&state, "/chat", json!({"query": "villa in whitefield"}));
    assert_eq!(status, 200);
    assert_eq!(body["answer"], FALLBACK_ANSWER);
    assert!(!body["properties_found"].as_array().unwrap().is_empty());
}

#[test]
fn calculator_matches_amortization_formula() {
    let (state, _scratch) = test_state();
    let mut resp = dispatch(
        &state,
        "GET",
        "/calculator",
        Some("price=6500000&down_payment_pct=20&rate=8.5&years=20"),
        &[],
    )
    .unwrap();
    assert_eq!(resp.status(), 200);

    let body = body_json(&mut resp);
    assert_eq!(body["loan_amount"].as_f64().unwrap(), 5_200_000.0);
    assert!((body["monthly_emi"].as_f64().unwrap() - 45_127.0).abs() <= 1.0);
    assert!(body["total_interest"].as_f64().unwrap() > 0.0);
}

#[test]
fn calculator_requires_a_price() {
    let (state, _scratch) = test_state();
    let err = dispatch(&state, "GET", "/calculator", Some("rate=8.5"), &[]).unwrap_err();
    let mut resp = error_to_response(err);
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(&mut resp)["field"], "price");
}
