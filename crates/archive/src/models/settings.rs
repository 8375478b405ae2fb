use super::{ChapterSortType, ReadingStatus};
use serde::{Deserialize, Serialize};

/// Per-novel chapter list preferences.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NovelSettingRecord {
    pub sort_type: ChapterSortType,
    pub show_only_reading_status_of: Option<ReadingStatus>,
    pub show_only_bookmarked: bool,
    pub show_only_downloaded: bool,
    pub reverse_order: bool,
}
