//! The surface other layers (HTTP routes, startup, health checks) use to reach the catalog.
//!
//! [`CatalogInterface`] wires a [`CatalogStore`] to the [`CatalogLoader`]
//! that fills it, and answers queries against whatever snapshot is live when
//! the call starts. Queries never wait on a running load: they keep reading
//! the previous generation until the new one is swapped in.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::config::CatalogSettings;
use crate::error::{LoadError, QueryError};
use crate::fetch::{PlaceholderPolicy, RemoteFetcher};
use crate::loader::{CatalogLoader, LoadOutcome};
use crate::query::{self, Page, SearchResult};
use crate::store::CatalogStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub healthy: bool,
    pub records_loaded: usize,
}

pub struct CatalogInterface {
    store: Arc<CatalogStore>,
    loader: CatalogLoader,
}

impl CatalogInterface {
    pub fn new(settings: &CatalogSettings) -> Result<Self, LoadError> {
        let fetcher = RemoteFetcher::new(settings)?;
        Ok(Self::with_fetcher(settings, fetcher))
    }

    /// Same as [`CatalogInterface::new`] but judging data files with `policy`.
    pub fn with_policy(
        settings: &CatalogSettings,
        policy: Arc<dyn PlaceholderPolicy>,
    ) -> Result<Self, LoadError> {
        let fetcher = RemoteFetcher::new(settings)?.with_policy(policy);
        Ok(Self::with_fetcher(settings, fetcher))
    }

    fn with_fetcher(settings: &CatalogSettings, fetcher: RemoteFetcher) -> Self {
        let store = Arc::new(CatalogStore::new());
        let loader = CatalogLoader::new(settings, fetcher, Arc::clone(&store));
        Self { store, loader }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Loads (or reloads) the catalog, reporting only whether it worked.
    /// Details are logged by the loader.
    pub async fn load_catalog(&self) -> bool {
        self.reload().await.is_ok()
    }

    pub async fn reload(&self) -> Result<LoadOutcome, LoadError> {
        self.loader.load().await
    }

    pub fn list_page(&self, page: i64, limit: i64) -> Result<Page, QueryError> {
        let catalog = self.store.snapshot();
        query::paginate(catalog.records(), page, limit).inspect_err(|e| report(e))
    }

    pub fn search<K, V>(&self, criteria: &[(K, V)]) -> Result<SearchResult, QueryError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let catalog = self.store.snapshot();
        query::filter(catalog.records(), criteria).inspect_err(|e| report(e))
    }

    pub fn health(&self) -> Health {
        let records_loaded = self.store.len();
        Health {
            healthy: records_loaded > 0,
            records_loaded,
        }
    }
}

fn report(e: &QueryError) {
    match e {
        QueryError::InvalidField(field) => warn!(%field, "invalid search field attempted"),
        QueryError::NoData => warn!("query against an unloaded catalog"),
        QueryError::EmptyCriteria => (),
    }
}
