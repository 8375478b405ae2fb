//! Records stored inside an archive.
//!
//! Records are keyed by natural keys (URLs, names, catalog ids) rather than
//! local row ids, so an archive can be merged into any library. Field names
//! on the wire match the JSON written by older clients.

mod category;
mod chapter;
mod extension;
mod novel;
mod repository;
mod settings;
mod status;

pub use self::category::CategoryRecord;
pub use self::chapter::ChapterRecord;
pub use self::extension::ExtensionRecord;
pub use self::novel::NovelRecord;
pub use self::repository::{RepositoryRecord, normalize_url};
pub use self::settings::NovelSettingRecord;
pub use self::status::{ChapterSortType, NovelStatus, ReadingStatus};
use serde::{Deserialize, Serialize};

/// The decoded payload of an archive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTree {
    #[serde(rename = "repos", default)]
    pub repositories: Vec<RepositoryRecord>,
    #[serde(default)]
    pub extensions: Vec<ExtensionRecord>,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
}

impl RecordTree {
    pub fn novel_count(&self) -> usize {
        self.extensions.iter().map(|e| e.novels.len()).sum()
    }

    pub fn chapter_count(&self) -> usize {
        self.extensions.iter().flat_map(|e| &e.novels).map(|n| n.chapters.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty() && self.extensions.is_empty() && self.categories.is_empty()
    }
}
