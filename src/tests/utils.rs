use crate::advisor::TemplateGenerator;
use crate::catalog::{Catalog, CatalogHandle};
use crate::db::{self, Database};
use crate::domain::pipeline::{self, PipelineOutput};
use crate::domain::ProjectionConfig;
use crate::embedder::{Embedder, HashingEmbedder};
use crate::ingest;
use crate::query::SemanticIndex;
use crate::router::AppState;
use astra::Response;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_DIMENSIONS: usize = 64;

/// Six rows: four that enrich, one without bedrooms (unmatched) and one
/// without a usable price (rejected at ingest).
pub const LISTINGS_CSV: &str = "\
title,location,price_raw,price_value,bhk,area
2 BHK Apartment in Hebbal,Hebbal,₹65 Lac,6500000,2,1000
3 BHK Villa in Whitefield,Whitefield,₹1.5 Cr,,3,1800
1 BHK Flat in Koramangala,Koramangala,₹45 Lac,,1,600
2 BHK Flat in Marathahalli,Marathahalli,₹70 Lac,,2,1100
Plot in Devanahalli,Devanahalli,₹30 Lac,,,
Penthouse in Hebbal,Hebbal,Price on request,,4,3000
";

pub const RENTALS_CSV: &str = "\
location,bhk,rent,area
Hebbal,2,25000,950
Hebbal,2,27000,1100
Hebbal,2,60000,2000
Whitefield,3,45000,1700
Koramangala,1,30000,550
";

pub fn run_pipeline(cfg: &ProjectionConfig) -> PipelineOutput {
    let (listings, _) = ingest::read_listings_from(LISTINGS_CSV.as_bytes()).unwrap();
    let (comparables, _) = ingest::read_comparables_from(RENTALS_CSV.as_bytes()).unwrap();
    pipeline::run(listings, &comparables, cfg)
}

pub fn sample_catalog() -> Catalog {
    run_pipeline(&ProjectionConfig::default()).catalog
}

pub fn embedder() -> HashingEmbedder {
    HashingEmbedder::new(TEST_DIMENSIONS)
}

/// Artifact paths inside a scratch directory that lives as long as this value.
pub struct Scratch {
    _dir: TempDir,
    pub db_path: PathBuf,
    pub index_path: PathBuf,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("catalog.sqlite3");
        let index_path = dir.path().join("catalog.index");
        Self {
            _dir: dir,
            db_path,
            index_path,
        }
    }

    pub fn db(&self) -> Database {
        Database::new(&self.db_path)
    }

    pub fn save(&self, catalog: &Catalog, embedder: &dyn Embedder) -> SemanticIndex {
        let index = SemanticIndex::build(catalog, embedder).unwrap();
        db::save_artifacts(&self.db(), &self.index_path, catalog, &index).unwrap();
        index
    }
}

/// Server state over the sample catalog, persisted to a scratch directory
/// so `/reload` has something to read.
pub fn test_state() -> (AppState, Scratch) {
    let scratch = Scratch::new();
    let embedder = embedder();
    let catalog = sample_catalog();
    let index = scratch.save(&catalog, &embedder);

    let state = AppState {
        catalog: CatalogHandle::new(catalog, index),
        embedder: Arc::new(embedder),
        generator: Arc::new(TemplateGenerator),
        db_path: scratch.db_path.clone(),
        index_path: scratch.index_path.clone(),
        max_top_k: 10,
    };
    (state, scratch)
}

pub fn body_bytes(resp: &mut Response) -> Vec<u8> {
    let mut bytes = Vec::new();
    resp.body_mut().reader().read_to_end(&mut bytes).unwrap();
    bytes
}

pub fn body_json(resp: &mut Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp)).unwrap()
}
