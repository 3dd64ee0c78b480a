use crate::catalog::Catalog;
use crate::query::semantic::SemanticIndex;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// A catalog and its matching vector index, served read-only.
pub struct Snapshot {
    pub version: u64,
    pub catalog: Catalog,
    pub index: SemanticIndex,
    pub installed_at: DateTime<Utc>,
}

/// Process-wide pointer to the current snapshot.
///
/// Readers clone the `Arc` and then query without holding the lock, so a
/// concurrent `swap` never exposes a half-updated catalog: a reader sees
/// either the old snapshot or the new one.
pub struct CatalogHandle {
    current: RwLock<Arc<Snapshot>>,
    next_version: AtomicU64,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog, index: SemanticIndex) -> Self {
        let first = Arc::new(Snapshot {
            version: 1,
            catalog,
            index,
            installed_at: Utc::now(),
        });
        Self {
            current: RwLock::new(first),
            next_version: AtomicU64::new(2),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Installs a new snapshot wholesale and returns its version.
    pub fn swap(&self, catalog: Catalog, index: SemanticIndex) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let next = Arc::new(Snapshot {
            version,
            catalog,
            index,
            installed_at: Utc::now(),
        });
        info!(
            version,
            records = next.catalog.len(),
            fingerprint = next.catalog.fingerprint(),
            "catalog snapshot swapped in"
        );
        *self.current.write() = next;
        version
    }
}
