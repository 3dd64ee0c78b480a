use crate::advisor::{self, AnswerGenerator};
use crate::catalog::CatalogHandle;
use crate::db;
use crate::domain::projection::monthly_installment;
use crate::embedder::Embedder;
use crate::errors::{QueryError, ServerError};
use crate::query::{self, DecisionFilter, FilterQuery, LocationSet, DEFAULT_TOP_K};
use crate::responses::{json_response, ResultResp};
use crate::spreadsheets::export_catalog_xlsx;
use astra::Request;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Everything a request handler may touch. Shared by all server workers.
pub struct AppState {
    pub catalog: CatalogHandle,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn AnswerGenerator>,
    pub db_path: PathBuf,
    pub index_path: PathBuf,
    pub max_top_k: usize,
}

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let mut body = Vec::new();
    if method == "POST" {
        req.body_mut()
            .reader()
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut body)
            .map_err(|e| ServerError::BadRequest(format!("unreadable body: {e}")))?;
    }

    debug!(%method, %path, "request");
    dispatch(state, &method, &path, query.as_deref(), &body)
}

/// Routes a request that has already been read off the wire.
pub fn dispatch(
    state: &AppState,
    method: &str,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> ResultResp {
    match (method, path) {
        ("GET", "/health") => health(state),
        ("POST", "/filter") => filter(state, body),
        ("POST", "/search") => search(state, body),
        ("POST", "/chat") => chat(state, body),
        ("GET", "/calculator") => calculator(query),
        ("GET", "/export.xlsx") => export_catalog_xlsx(&state.catalog.current().catalog),
        ("POST", "/reload") => reload(state),
        _ => Err(ServerError::NotFound),
    }
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, ServerError> {
    serde_json::from_slice(body).map_err(|e| ServerError::BadRequest(format!("invalid JSON: {e}")))
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    version: u64,
    records: usize,
    fingerprint: &'a str,
    model: &'a str,
    dimensions: usize,
    installed_at: String,
}

fn health(state: &AppState) -> ResultResp {
    let snapshot = state.catalog.current();
    json_response(
        200,
        &HealthResponse {
            version: snapshot.version,
            records: snapshot.catalog.len(),
            fingerprint: snapshot.catalog.fingerprint(),
            model: snapshot.index.model_id(),
            dimensions: snapshot.index.dimensions(),
            installed_at: snapshot.installed_at.to_rfc3339(),
        },
    )
}

#[derive(Deserialize)]
struct FilterRequest {
    #[serde(default)]
    locations: Vec<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    decision_type: Option<String>,
    #[serde(default)]
    offset: usize,
}

#[derive(Serialize)]
struct FilterRow<'a> {
    id: u64,
    title: &'a str,
    location: &'a str,
    price_raw: &'a str,
    price_value: f64,
    monthly_emi: f64,
    decision: &'static str,
}

#[derive(Serialize)]
struct FilterResponse<'a> {
    records: Vec<FilterRow<'a>>,
    total_matches: usize,
    next_offset: Option<usize>,
}

fn filter(state: &AppState, body: &[u8]) -> ResultResp {
    let req: FilterRequest = parse_json(body)?;
    let decision = match req.decision_type.as_deref() {
        Some(raw) => DecisionFilter::parse(raw)?,
        None => DecisionFilter::Any,
    };
    let query = FilterQuery::new(
        LocationSet::new(&req.locations),
        req.min_price.unwrap_or(0.0),
        req.max_price.unwrap_or(f64::MAX),
        decision,
    )?;

    let snapshot = state.catalog.current();
    let page = query::filter(&snapshot.catalog, &query, req.offset);

    let records = page
        .records
        .iter()
        .map(|r| FilterRow {
            id: r.id(),
            title: &r.listing.title,
            location: &r.listing.location,
            price_raw: &r.listing.price_raw,
            price_value: r.listing.price_value,
            monthly_emi: r.projection.monthly_emi,
            decision: r.decision().as_str(),
        })
        .collect();

    json_response(
        200,
        &FilterResponse {
            records,
            total_matches: page.total_matches,
            next_offset: page.next_offset,
        },
    )
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    k: Option<i64>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<query::Neighbor>,
}

fn search(state: &AppState, body: &[u8]) -> ResultResp {
    let req: SearchRequest = parse_json(body)?;
    let snapshot = state.catalog.current();
    let results = query::search(
        &snapshot,
        state.embedder.as_ref(),
        &req.query,
        req.k.unwrap_or(DEFAULT_TOP_K as i64),
        state.max_top_k,
    )?;
    json_response(200, &SearchResponse { results })
}

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
}

fn chat(state: &AppState, body: &[u8]) -> ResultResp {
    let req: ChatRequest = parse_json(body)?;
    let snapshot = state.catalog.current();
    let reply = advisor::answer(
        &req.query,
        &snapshot,
        state.embedder.as_ref(),
        state.generator.as_ref(),
    )?;
    json_response(200, &reply)
}

#[derive(Debug, Serialize, PartialEq)]
struct CalculatorResponse {
    price: f64,
    down_payment: f64,
    loan_amount: f64,
    monthly_emi: f64,
    total_payment: f64,
    total_interest: f64,
}

fn number_param(
    params: &HashMap<String, String>,
    field: &'static str,
    default: Option<f64>,
) -> Result<f64, QueryError> {
    let value = match params.get(field) {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| QueryError::new(field, format!("'{raw}' is not a number")))?,
        None => default.ok_or_else(|| QueryError::new(field, "is required"))?,
    };
    if !value.is_finite() {
        return Err(QueryError::new(field, "must be a finite number"));
    }
    Ok(value)
}

/// Standalone mortgage calculator: percent inputs, same amortization
/// formula as the catalog projections.
fn calculator(query: Option<&str>) -> ResultResp {
    let params = parse_query(query);
    let price = number_param(&params, "price", None)?;
    let down_pct = number_param(&params, "down_payment_pct", Some(20.0))?;
    let rate_pct = number_param(&params, "rate", Some(8.5))?;
    let years = number_param(&params, "years", Some(20.0))?;

    if price <= 0.0 {
        return Err(QueryError::new("price", "must be positive").into());
    }
    if !(0.0..=100.0).contains(&down_pct) {
        return Err(QueryError::new("down_payment_pct", "must be between 0 and 100").into());
    }
    if !(0.0..100.0).contains(&rate_pct) {
        return Err(QueryError::new("rate", "must be between 0 and 100").into());
    }
    if years < 1.0 || years > 50.0 || years.fract() != 0.0 {
        return Err(QueryError::new("years", "must be a whole number of years from 1 to 50").into());
    }

    let down_payment = price * down_pct / 100.0;
    let loan_amount = price - down_payment;
    let installments = years as u32 * 12;
    let monthly_emi = monthly_installment(loan_amount, rate_pct / 100.0 / 12.0, installments);
    let total_payment = monthly_emi * installments as f64;

    json_response(
        200,
        &CalculatorResponse {
            price,
            down_payment,
            loan_amount,
            monthly_emi,
            total_payment,
            total_interest: total_payment - loan_amount,
        },
    )
}

#[derive(Serialize)]
struct ReloadResponse {
    version: u64,
    records: usize,
}

/// Loads the artifacts from disk and swaps them in. A failed load leaves the
/// current snapshot serving.
fn reload(state: &AppState) -> ResultResp {
    let (catalog, index) =
        db::load_artifacts(&state.db_path, &state.index_path, state.embedder.model_id())?;
    let records = catalog.len();
    let version = state.catalog.swap(catalog, index);
    info!(version, records, "reloaded artifacts");
    json_response(200, &ReloadResponse { version, records })
}
