// src/db/mod.rs
//
// Persisted build artifacts: the enriched catalog in SQLite and the vector
// index as a bincode blob. The two are only ever loaded as a pair.

pub mod catalog_store;
pub mod connection;
pub mod index_blob;

pub use connection::{init_db, Database};

use crate::catalog::Catalog;
use crate::errors::StoreError;
use crate::query::SemanticIndex;
use std::path::Path;
use tracing::info;

pub fn save_artifacts(
    db: &Database,
    index_path: &Path,
    catalog: &Catalog,
    index: &SemanticIndex,
) -> Result<(), StoreError> {
    if index.catalog_fingerprint() != catalog.fingerprint() {
        return Err(StoreError::ArtifactMismatch(
            "index was built from a different catalog".into(),
        ));
    }

    init_db(db)?;
    index_blob::write_index(index_path, index)?;
    catalog_store::save_catalog(db, catalog, index.model_id())?;

    info!(
        records = catalog.len(),
        fingerprint = catalog.fingerprint(),
        db = %db.path().display(),
        index = %index_path.display(),
        "artifacts saved"
    );
    Ok(())
}

/// Loads the catalog and index and refuses to pair them unless they come
/// from the same build and the index was produced by `expected_model`.
pub fn load_artifacts(
    db_path: &Path,
    index_path: &Path,
    expected_model: &str,
) -> Result<(Catalog, SemanticIndex), StoreError> {
    // Opening a missing SQLite file would silently create an empty one.
    if !db_path.is_file() {
        return Err(StoreError::ArtifactMismatch(format!(
            "catalog database {} is missing",
            db_path.display()
        )));
    }
    if !index_path.is_file() {
        return Err(StoreError::ArtifactMismatch(format!(
            "index {} is missing",
            index_path.display()
        )));
    }

    let db = Database::new(db_path);
    let (catalog, meta) = catalog_store::load_catalog(&db)?;
    let index = index_blob::read_index(index_path)?;

    if index.catalog_fingerprint() != catalog.fingerprint() {
        return Err(StoreError::ArtifactMismatch(format!(
            "index fingerprint {} does not match catalog {}",
            index.catalog_fingerprint(),
            catalog.fingerprint()
        )));
    }
    if !index.ids().iter().copied().eq(catalog.records().iter().map(|r| r.id())) {
        return Err(StoreError::ArtifactMismatch(
            "index ids do not follow catalog order".into(),
        ));
    }
    if meta.model_id != index.model_id() {
        return Err(StoreError::ArtifactMismatch(format!(
            "catalog recorded model '{}' but index was built with '{}'",
            meta.model_id,
            index.model_id()
        )));
    }
    if index.model_id() != expected_model {
        return Err(StoreError::ArtifactMismatch(format!(
            "index built with model '{}' but the server embeds with '{expected_model}'",
            index.model_id()
        )));
    }

    info!(
        records = catalog.len(),
        model = index.model_id(),
        built_at = %meta.built_at,
        "artifacts loaded"
    );
    Ok((catalog, index))
}
