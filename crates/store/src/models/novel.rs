use super::{ChapterSortType, NovelStatus, ReadingStatus};
use shelf_archive::models::{NovelRecord, NovelSettingRecord};

/// Descriptive fields of a novel, as scraped from its source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NovelDetails {
    pub title: String,
    pub image_url: String,
    pub description: String,
    pub language: String,
    pub genres: Vec<String>,
    pub authors: Vec<String>,
    pub artists: Vec<String>,
    pub tags: Vec<String>,
    pub status: NovelStatus,
}

impl From<&NovelRecord> for NovelDetails {
    fn from(record: &NovelRecord) -> Self {
        Self {
            title: record.title.clone(),
            image_url: record.image_url.clone(),
            description: record.description.clone(),
            language: record.language.clone(),
            genres: record.genres.clone(),
            authors: record.authors.clone(),
            artists: record.artists.clone(),
            tags: record.tags.clone(),
            status: record.status,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Novel {
    pub id: i64,
    pub url: String,
    pub extension_id: i64,
    pub bookmarked: bool,
    pub loaded: bool,
    pub details: NovelDetails,
}

/// A novel that has not been written to a store yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNovel {
    pub url: String,
    pub extension_id: i64,
    pub bookmarked: bool,
    pub loaded: bool,
    pub details: NovelDetails,
}

impl NewNovel {
    pub fn from_record(extension_id: i64, record: &NovelRecord) -> Self {
        Self {
            url: record.url.clone(),
            extension_id,
            bookmarked: record.bookmarked,
            loaded: record.loaded,
            details: NovelDetails::from(record),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NovelSettings {
    pub novel_id: i64,
    pub sort_type: ChapterSortType,
    pub show_only_reading_status_of: Option<ReadingStatus>,
    pub show_only_bookmarked: bool,
    pub show_only_downloaded: bool,
    pub reverse_order: bool,
}

impl NovelSettings {
    pub fn from_record(novel_id: i64, record: &NovelSettingRecord) -> Self {
        Self {
            novel_id,
            sort_type: record.sort_type,
            show_only_reading_status_of: record.show_only_reading_status_of,
            show_only_bookmarked: record.show_only_bookmarked,
            show_only_downloaded: record.show_only_downloaded,
            reverse_order: record.reverse_order,
        }
    }

    pub fn to_record(&self) -> NovelSettingRecord {
        NovelSettingRecord {
            sort_type: self.sort_type,
            show_only_reading_status_of: self.show_only_reading_status_of,
            show_only_bookmarked: self.show_only_bookmarked,
            show_only_downloaded: self.show_only_downloaded,
            reverse_order: self.reverse_order,
        }
    }
}
