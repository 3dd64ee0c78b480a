pub mod filter;
pub mod semantic;

pub use filter::{filter, DecisionFilter, FilterQuery, LocationSet};
pub use semantic::{Neighbor, SemanticIndex};

use crate::catalog::Snapshot;
use crate::embedder::{EmbedError, Embedder};
use crate::errors::{QueryError, ServerError};

pub const DEFAULT_TOP_K: usize = 5;

/// Free-text lookup against a snapshot: embed the query with the same model
/// that built the index, then return the `k` nearest records.
pub fn search(
    snapshot: &Snapshot,
    embedder: &dyn Embedder,
    query_text: &str,
    k: i64,
    max_k: usize,
) -> Result<Vec<Neighbor>, ServerError> {
    if query_text.trim().is_empty() {
        return Err(QueryError::new("query", "query text is empty").into());
    }
    if k <= 0 {
        return Err(QueryError::new("k", format!("k must be positive, got {k}")).into());
    }
    let k = k as usize;
    if k > max_k {
        return Err(QueryError::new("k", format!("k must not exceed {max_k}")).into());
    }
    if embedder.model_id() != snapshot.index.model_id() {
        return Err(EmbedError::Config(format!(
            "index built with model '{}' but queries use '{}'",
            snapshot.index.model_id(),
            embedder.model_id()
        ))
        .into());
    }

    let vector = embedder.embed_one(query_text)?;
    Ok(snapshot.index.nearest(&vector, k)?)
}
