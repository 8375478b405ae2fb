use serde::{Deserialize, Serialize};

/// An extension repository the archived library installed extensions from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub url: String,
    pub name: String,
}

impl RepositoryRecord {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self { url: url.into(), name: name.into() }
    }

    /// The identity key of the repository.
    pub fn key(&self) -> String {
        normalize_url(&self.url)
    }
}

/// Normalize a repository URL for identity comparisons.
///
/// Surrounding whitespace and trailing slashes are not significant; scheme
/// and path case are left alone.
///
/// # Examples
///
/// ```
/// use shelf_archive::models::normalize_url;
///
/// assert_eq!(normalize_url(" https://repo.example/dist/ "), "https://repo.example/dist");
/// ```
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
