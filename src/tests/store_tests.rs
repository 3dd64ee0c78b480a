use crate::catalog::Catalog;
use crate::db::{self, index_blob};
use crate::embedder::{Embedder, HashingEmbedder};
use crate::errors::StoreError;
use crate::query::SemanticIndex;
use crate::tests::utils::{embedder, sample_catalog, Scratch};

#[test]
fn saved_artifacts_load_back_unchanged() {
    let scratch = Scratch::new();
    let catalog = sample_catalog();
    let embedder = embedder();
    let index = scratch.save(&catalog, &embedder);

    let (loaded, loaded_index) =
        db::load_artifacts(&scratch.db_path, &scratch.index_path, embedder.model_id()).unwrap();

    assert_eq!(loaded.fingerprint(), catalog.fingerprint());
    assert_eq!(loaded.records(), catalog.records());
    assert_eq!(loaded_index, index);
}

#[test]
fn saving_twice_replaces_the_catalog() {
    let scratch = Scratch::new();
    let embedder = embedder();
    scratch.save(&sample_catalog(), &embedder);

    let smaller = Catalog::new(sample_catalog().records()[..2].to_vec());
    scratch.save(&smaller, &embedder);

    let (loaded, _) =
        db::load_artifacts(&scratch.db_path, &scratch.index_path, embedder.model_id()).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.fingerprint(), smaller.fingerprint());
}

#[test]
fn missing_artifacts_are_a_mismatch() {
    let scratch = Scratch::new();
    let err = db::load_artifacts(&scratch.db_path, &scratch.index_path, "hashing-64").unwrap_err();
    assert!(matches!(err, StoreError::ArtifactMismatch(_)));
    assert!(!scratch.db_path.exists());

    scratch.save(&sample_catalog(), &embedder());
    std::fs::remove_file(&scratch.index_path).unwrap();
    let err = db::load_artifacts(&scratch.db_path, &scratch.index_path, "hashing-64").unwrap_err();
    assert!(matches!(err, StoreError::ArtifactMismatch(_)));
}

#[test]
fn refuses_to_save_an_index_from_another_catalog() {
    let scratch = Scratch::new();
    let catalog = sample_catalog();
    let other = Catalog::new(catalog.records()[1..].to_vec());
    let index = SemanticIndex::build(&other, &embedder()).unwrap();

    let err = db::save_artifacts(&scratch.db(), &scratch.index_path, &catalog, &index).unwrap_err();
    assert!(matches!(err, StoreError::ArtifactMismatch(_)));
}

#[test]
fn stale_index_on_disk_is_detected() {
    let scratch = Scratch::new();
    let catalog = sample_catalog();
    scratch.save(&catalog, &embedder());

    let other = Catalog::new(catalog.records()[1..].to_vec());
    let stale = SemanticIndex::build(&other, &embedder()).unwrap();
    index_blob::write_index(&scratch.index_path, &stale).unwrap();

    let err = db::load_artifacts(&scratch.db_path, &scratch.index_path, "hashing-64").unwrap_err();
    assert!(matches!(err, StoreError::ArtifactMismatch(_)));
}

#[test]
fn serving_model_must_match_the_index() {
    let scratch = Scratch::new();
    scratch.save(&sample_catalog(), &embedder());

    let other_model = HashingEmbedder::new(32);
    let err = db::load_artifacts(&scratch.db_path, &scratch.index_path, other_model.model_id())
        .unwrap_err();
    assert!(matches!(err, StoreError::ArtifactMismatch(_)));
}

#[test]
fn tampered_decision_is_detected() {
    let scratch = Scratch::new();
    scratch.save(&sample_catalog(), &embedder());

    scratch
        .db()
        .with_conn(|conn| {
            conn.execute("UPDATE properties SET decision = 'RENT' WHERE id = 1", [])?;
            Ok(())
        })
        .unwrap();

    let err = db::load_artifacts(&scratch.db_path, &scratch.index_path, "hashing-64").unwrap_err();
    assert!(matches!(err, StoreError::ArtifactMismatch(_)));
}

#[test]
fn tampered_costs_break_the_fingerprint() {
    let scratch = Scratch::new();
    scratch.save(&sample_catalog(), &embedder());

    scratch
        .db()
        .with_conn(|conn| {
            conn.execute(
                "UPDATE properties SET final_buying_cost = final_buying_cost + 1 WHERE id = 1",
                [],
            )?;
            Ok(())
        })
        .unwrap();

    let err = db::load_artifacts(&scratch.db_path, &scratch.index_path, "hashing-64").unwrap_err();
    assert!(matches!(err, StoreError::ArtifactMismatch(_)));
}

#[test]
fn truncated_index_is_corrupt() {
    let scratch = Scratch::new();
    scratch.save(&sample_catalog(), &embedder());

    let bytes = std::fs::read(&scratch.index_path).unwrap();
    std::fs::write(&scratch.index_path, &bytes[..bytes.len() / 2]).unwrap();

    let err = db::load_artifacts(&scratch.db_path, &scratch.index_path, "hashing-64").unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}
