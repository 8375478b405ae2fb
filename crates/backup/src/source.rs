//! Where extensions come from.
//!
//! Installing an extension and refreshing the listing advertised by the
//! configured repositories are someone else's job (a package manager, a
//! background worker...). The restore engine only needs the narrow
//! [`ExtensionSource`] capability.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use derive_more::Display;
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use shelf_archive::models::normalize_url;
use shelf_store::StoreHandle;
use shelf_store::models::AvailableExtension;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

pub type SourceHandle = Arc<dyn ExtensionSource + Send + Sync>;

/// State of the externally scheduled listing refresh.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum TaskState {
    #[default]
    #[display("pending")]
    Pending,
    #[display("running")]
    Running,
    /// Waiting on a precondition (connectivity, another task...).
    #[display("blocked")]
    Blocked,
    #[display("succeeded")]
    Succeeded,
    #[display("failed")]
    Failed,
    #[display("cancelled")]
    Cancelled,
}

impl TaskState {
    /// Returns `true` once the task will not change state any more.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// What an installation did besides installing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstallFlags {
    /// An older install of the same extension was replaced.
    pub replaced: bool,
}

#[async_trait]
pub trait ExtensionSource: Send + Sync {
    /// Start refreshing the listing advertised by the configured
    /// repositories. Progress is reported by
    /// [`refresh_state`](Self::refresh_state).
    async fn refresh(&self) -> Result<()>;

    async fn refresh_state(&self) -> Result<TaskState>;

    async fn install(&self, extension: &AvailableExtension) -> Result<InstallFlags>;
}

/// An extension a repository advertises, as listed in a catalog file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// URL of the advertising repository.
    pub repository: String,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

/// Extension source backed by the library store itself.
///
/// Installing an extension only records it as installed. Refreshing
/// completes before [`refresh`](ExtensionSource::refresh) returns: when a
/// catalog is configured it replaces the advertised listing with the
/// catalog entries whose repository is configured in the library, otherwise
/// the listing is left as it is.
pub struct LocalSource {
    store: StoreHandle,
    catalog: Option<Vec<CatalogEntry>>,
    state: RwLock<TaskState>,
}

impl LocalSource {
    pub fn new(store: StoreHandle) -> Self {
        Self { store, catalog: None, state: RwLock::new(TaskState::Pending) }
    }

    pub fn with_catalog(mut self, catalog: Vec<CatalogEntry>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Parse a JSON array of [`CatalogEntry`].
    pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<CatalogEntry>> {
        serde_json::from_slice(bytes).or_raise(|| ErrorKind::Source)
    }

    async fn replace_listing(&self) -> Result<()> {
        let Some(catalog) = &self.catalog else {
            return Ok(());
        };
        let repositories = self.store.list_repositories().await.or_raise(|| ErrorKind::Source)?;
        let repo_ids: HashMap<String, i64> = repositories.into_iter().map(|r| (r.url, r.id)).collect();
        let listing: Vec<AvailableExtension> = catalog
            .iter()
            .filter_map(|entry| match repo_ids.get(&normalize_url(&entry.repository)) {
                Some(&repo_id) => Some(AvailableExtension {
                    id: entry.id,
                    repo_id,
                    name: entry.name.clone(),
                    version: entry.version.clone(),
                }),
                None => {
                    tracing::debug!(id = entry.id, repository = %entry.repository, "repository not configured");
                    None
                },
            })
            .collect();
        tracing::info!(available = listing.len(), "replacing extension listing");
        self.store.replace_available_extensions(&listing).await.or_raise(|| ErrorKind::Source)
    }
}

#[async_trait]
impl ExtensionSource for LocalSource {
    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<()> {
        *self.state.write().await = TaskState::Running;
        let result = self.replace_listing().await;
        *self.state.write().await = match &result {
            Ok(()) => TaskState::Succeeded,
            Err(_) => TaskState::Failed,
        };
        result
    }

    async fn refresh_state(&self) -> Result<TaskState> {
        Ok(*self.state.read().await)
    }

    #[instrument(skip_all, fields(id = extension.id, name = %extension.name))]
    async fn install(&self, extension: &AvailableExtension) -> Result<InstallFlags> {
        let install = || ErrorKind::Install(extension.id);
        let replaced = self.store.is_extension_installed(extension.id).await.or_raise(install)?;
        self.store.record_installed(extension).await.or_raise(install)?;
        Ok(InstallFlags { replaced })
    }
}
