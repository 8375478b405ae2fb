use serde::{Deserialize, Serialize};

/// An extension advertised by one of the configured repositories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableExtension {
    /// Catalog id, identical across every library that installs it.
    pub id: i64,
    pub repo_id: i64,
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstalledExtension {
    pub id: i64,
    pub repo_id: i64,
    pub name: String,
    pub version: String,
}

impl From<&AvailableExtension> for InstalledExtension {
    fn from(ext: &AvailableExtension) -> Self {
        Self { id: ext.id, repo_id: ext.repo_id, name: ext.name.clone(), version: ext.version.clone() }
    }
}
