// src/query/semantic.rs

use crate::catalog::Catalog;
use crate::embedder::{embed_all, EmbedError, Embedder};
use crate::errors::QueryError;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub id: u64,
    pub distance: f32,
}

/// Exact (flat) L2 nearest-neighbour index over record display text.
///
/// Built once per catalog as a batch; there is no incremental insert or delete.
/// `ids[i]` owns the vector stored at `vectors[i * dimensions..]`, and ids follow
/// catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticIndex {
    model_id: String,
    catalog_fingerprint: String,
    dimensions: usize,
    ids: Vec<u64>,
    vectors: Vec<f32>,
}

impl SemanticIndex {
    /// Embeds every record's display text. Any embedding failure fails the
    /// whole build; no partially populated index is ever returned.
    pub fn build(catalog: &Catalog, embedder: &dyn Embedder) -> Result<Self, EmbedError> {
        let texts: Vec<String> = catalog
            .records()
            .iter()
            .map(|r| r.listing.display_text())
            .collect();

        let embedded = embed_all(embedder, &texts)?;

        let dimensions = embedded.first().map_or(0, Vec::len);
        if !embedded.is_empty() && dimensions == 0 {
            return Err(EmbedError::UnexpectedShape("zero-length embedding".into()));
        }

        let mut vectors = Vec::with_capacity(dimensions * embedded.len());
        for (i, v) in embedded.into_iter().enumerate() {
            if v.len() != dimensions {
                return Err(EmbedError::UnexpectedShape(format!(
                    "embedding {i} has {} dimensions, expected {dimensions}",
                    v.len()
                )));
            }
            vectors.extend(v);
        }

        info!(
            records = catalog.len(),
            dimensions,
            model = embedder.model_id(),
            "semantic index built"
        );

        Ok(Self {
            model_id: embedder.model_id().to_string(),
            catalog_fingerprint: catalog.fingerprint().to_string(),
            dimensions,
            ids: catalog.records().iter().map(|r| r.id()).collect(),
            vectors,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn catalog_fingerprint(&self) -> &str {
        &self.catalog_fingerprint
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Internal consistency of a deserialized index.
    pub fn is_well_formed(&self) -> bool {
        self.vectors.len() == self.ids.len() * self.dimensions
            && (self.ids.is_empty() || self.dimensions > 0)
    }

    /// The `k` closest records by Euclidean distance, closest first.
    /// Equal distances keep catalog order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, QueryError> {
        if k == 0 {
            return Err(QueryError::new("k", "k must be at least 1"));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(QueryError::new(
                "query",
                format!(
                    "query embedding has {} dimensions, index has {}",
                    query.len(),
                    self.dimensions
                ),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimensions)
            .map(|v| l2_distance(v, query))
            .enumerate()
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(pos, distance)| Neighbor {
                id: self.ids[pos],
                distance,
            })
            .collect())
    }
}

pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::projection::{project, ProjectionConfig};
    use crate::domain::rent_match::{MatchTier, RentMatch};
    use crate::domain::{EnrichedRecord, ListingRecord};
    use crate::embedder::HashingEmbedder;

    fn record(id: u64, title: &str, location: &str) -> EnrichedRecord {
        let cfg = ProjectionConfig::default();
        let listing = ListingRecord {
            id,
            title: title.to_string(),
            location: location.to_string(),
            bhk: Some(2),
            area: None,
            price_raw: "80 Lac".to_string(),
            price_value: 8_000_000.0,
        };
        let rent = RentMatch {
            rent: 25_000.0,
            tier: MatchTier::Exact,
            comparables: 1,
        };
        let projection = project(listing.price_value, rent.rent, &cfg).unwrap();
        EnrichedRecord::new(listing, rent, &cfg, projection)
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            record(10, "2 BHK Apartment in Hebbal", "hebbal"),
            record(11, "3 BHK Villa in Whitefield", "whitefield"),
            record(12, "1 BHK Flat in Koramangala", "koramangala"),
        ])
    }

    #[test]
    fn own_text_is_nearest_with_zero_distance() {
        let cat = catalog();
        let embedder = HashingEmbedder::new(128);
        let index = SemanticIndex::build(&cat, &embedder).unwrap();

        for r in cat.records() {
            let q = embedder.embed_text(&r.listing.display_text());
            let hits = index.nearest(&q, 1).unwrap();
            assert_eq!(hits[0].id, r.id());
            assert!(hits[0].distance.abs() < 1e-6);
        }
    }

    #[test]
    fn results_are_sorted_and_capped() {
        let cat = catalog();
        let embedder = HashingEmbedder::new(128);
        let index = SemanticIndex::build(&cat, &embedder).unwrap();

        let q = embedder.embed_text("villa whitefield");
        let hits = index.nearest(&q, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 11);
        assert!(hits[0].distance <= hits[1].distance);

        assert_eq!(index.nearest(&q, 10).unwrap().len(), 3);
    }

    #[test]
    fn ties_follow_catalog_order() {
        let cat = Catalog::new(vec![
            record(5, "same text", "x"),
            record(3, "same text", "x"),
            record(9, "same text", "x"),
        ]);
        let embedder = HashingEmbedder::new(16);
        let index = SemanticIndex::build(&cat, &embedder).unwrap();

        let q = embedder.embed_text("same text located in x");
        let ids: Vec<u64> = index.nearest(&q, 3).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 3, 9]);
    }

    #[test]
    fn rejects_zero_k_and_wrong_dimensions() {
        let cat = catalog();
        let embedder = HashingEmbedder::new(8);
        let index = SemanticIndex::build(&cat, &embedder).unwrap();

        assert_eq!(index.nearest(&[0.0; 8], 0).unwrap_err().field, "k");
        assert_eq!(index.nearest(&[0.0; 3], 1).unwrap_err().field, "query");
    }

    #[test]
    fn zero_dimensions_with_ids_is_malformed() {
        let index = SemanticIndex {
            model_id: "m".into(),
            catalog_fingerprint: String::new(),
            dimensions: 0,
            ids: vec![1],
            vectors: Vec::new(),
        };
        assert!(!index.is_well_formed());

        let empty = SemanticIndex { ids: Vec::new(), ..index };
        assert!(empty.is_well_formed());
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn model_id(&self) -> &str {
            "failing"
        }
        fn batch_size(&self) -> usize {
            2
        }
        fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            if inputs.iter().any(|t| t.contains("Koramangala")) {
                Err(EmbedError::Network("connection refused".into()))
            } else {
                Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
            }
        }
    }

    #[test]
    fn embedding_outage_fails_the_whole_build() {
        let err = SemanticIndex::build(&catalog(), &FailingEmbedder).unwrap_err();
        assert!(matches!(err, EmbedError::Network(_)));
    }
}
