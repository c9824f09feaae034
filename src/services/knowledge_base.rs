use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;

use crate::core::index::KnowledgeIndex;
use crate::core::matcher::{search, MatchResult};
use crate::models::ListingRecord;

/// Errors that can occur while loading the listing source
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("Failed to read knowledge base {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed knowledge base {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read listings from a JSON array document
pub fn load_listings<P: AsRef<Path>>(path: P) -> Result<Vec<ListingRecord>, KnowledgeBaseError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_listings(&raw).map_err(|source| KnowledgeBaseError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_listings(raw: &str) -> Result<Vec<ListingRecord>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Read listings, degrading to an empty set when the source is unusable
///
/// The assistant must keep answering greetings and the default prompt
/// even without data, so a load failure is only a warning.
pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Vec<ListingRecord> {
    match load_listings(path) {
        Ok(listings) => {
            tracing::info!("Loaded {} listings", listings.len());
            listings
        }
        Err(e) => {
            tracing::warn!("{}, continuing with an empty knowledge base", e);
            Vec::new()
        }
    }
}

/// Listings together with the index derived from them
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    listings: Vec<ListingRecord>,
    index: KnowledgeIndex,
}

impl Catalog {
    pub fn new(listings: Vec<ListingRecord>) -> Self {
        let index = KnowledgeIndex::build(&listings);
        Self { listings, index }
    }

    pub fn listings(&self) -> &[ListingRecord] {
        &self.listings
    }

    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    pub fn search(&self, query: &str) -> MatchResult {
        search(query, &self.index, &self.listings)
    }
}

/// Shared, swappable reference to the current catalog
///
/// Readers take a cheap `Arc` snapshot; rebuilding happens outside the lock
/// and only the pointer swap is serialized.
#[derive(Debug, Clone, Default)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Arc<Catalog>>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// Snapshot of the current catalog
    pub fn current(&self) -> Arc<Catalog> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, catalog: Catalog) {
        let catalog = Arc::new(catalog);
        match self.inner.write() {
            Ok(mut guard) => *guard = catalog,
            Err(poisoned) => *poisoned.into_inner() = catalog,
        }
    }

    /// Rebuild from `path`. A failed read keeps the current catalog.
    pub fn reload<P: AsRef<Path>>(&self, path: P) -> Result<usize, KnowledgeBaseError> {
        let listings = load_listings(path)?;
        let count = listings.len();
        self.replace(Catalog::new(listings));
        Ok(count)
    }
}

/// Periodically rebuild the catalog from disk
pub fn spawn_reload_task(handle: CatalogHandle, path: PathBuf, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick fires immediately; the catalog was just loaded
        ticker.tick().await;
        loop {
            ticker.tick().await;
            // File reads and the index rebuild stay off the async workers
            let reloaded = {
                let handle = handle.clone();
                let path = path.clone();
                tokio::task::spawn_blocking(move || handle.reload(&path)).await
            };
            match reloaded {
                Ok(Ok(count)) => tracing::debug!("Reloaded knowledge base: {} listings", count),
                Ok(Err(e)) => tracing::warn!("Knowledge base reload failed, keeping previous catalog: {}", e),
                Err(e) => tracing::error!("Knowledge base reload task failed: {}", e),
            }
        }
    })
}
