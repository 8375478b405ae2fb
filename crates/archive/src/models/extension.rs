use super::NovelRecord;
use serde::{Deserialize, Serialize};

/// An installed extension and the bookmarked novels that came from it.
///
/// `id` is the catalog id advertised by the repository, stable across
/// installs, not a local row id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub id: i64,
    #[serde(default)]
    pub novels: Vec<NovelRecord>,
}
