// File: streambot-core/src/catalog/store.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use streambot_common::models::Catalog;

use crate::Error;

/// Where a slice of the catalog came from. Merge order follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CatalogSource {
    Playlist,
    Inventory,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Playlist => write!(f, "playlist"),
            CatalogSource::Inventory => write!(f, "inventory"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub total_entries: usize,
    pub refreshed: Vec<CatalogSource>,
    /// Sources that failed this round and still serve their previous entries.
    pub kept_last_good: Vec<CatalogSource>,
}

/// Process-wide catalog.
///
/// Readers take an `Arc` snapshot; a refresh builds the next catalog off to
/// the side and swaps the pointer, so nobody sees a half-built catalog.
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
    last_good: Mutex<BTreeMap<CatalogSource, Catalog>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Catalog::new())),
            last_good: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().clone()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the whole catalog and forgets per-source history.
    pub fn replace(&self, catalog: Catalog) {
        self.last_good.lock().clear();
        *self.current.write() = Arc::new(catalog);
    }

    /// Applies one refresh round. A failed source keeps serving its last
    /// good entries; a successful one replaces them, even when empty.
    pub fn apply_refresh(
        &self,
        results: Vec<(CatalogSource, Result<Catalog, Error>)>,
    ) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let mut last_good = self.last_good.lock();

        for (source, result) in results {
            match result {
                Ok(catalog) => {
                    info!("Catalog source '{source}' refreshed => {} entries", catalog.len());
                    last_good.insert(source, catalog);
                    summary.refreshed.push(source);
                }
                Err(e) => {
                    warn!("Catalog source '{source}' failed, keeping last good entries: {e}");
                    summary.kept_last_good.push(source);
                }
            }
        }

        let mut merged = Catalog::new();
        for catalog in last_good.values() {
            merged.merge(catalog);
        }
        summary.total_entries = merged.len();

        *self.current.write() = Arc::new(merged);
        summary
    }
}
