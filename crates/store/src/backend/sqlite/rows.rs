//! Row types and their conversions to and from models.
//!
//! List fields are stored as JSON arrays in `TEXT` columns, enumerations by
//! their wire names.

use crate::error::{Error, ErrorKind, Result};
use crate::models::{
    AvailableExtension, Category, Chapter, ChapterHistory, ChapterSortType, InstalledExtension, Novel, NovelDetails,
    NovelSettings, NovelStatus, ReadingStatus, Repository,
};
use exn::ResultExt;

fn to_json(list: &[String], field: &'static str) -> Result<String> {
    serde_json::to_string(list).or_raise(|| ErrorKind::InvalidData(field))
}

fn from_json(text: &str, field: &'static str) -> Result<Vec<String>> {
    serde_json::from_str(text).or_raise(|| ErrorKind::InvalidData(field))
}

fn parse_enum<T: std::str::FromStr>(text: &str, field: &'static str) -> Result<T> {
    text.parse().map_err(|_| Error::from(ErrorKind::InvalidData(field)))
}

#[derive(sqlx::FromRow)]
pub(super) struct CategoryRow {
    id: i64,
    name: String,
    sort_order: i32,
}
impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self { id: row.id, name: row.name, order: row.sort_order }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct RepositoryRow {
    id: i64,
    url: String,
    name: String,
}
impl From<RepositoryRow> for Repository {
    fn from(row: RepositoryRow) -> Self {
        Self { id: row.id, url: row.url, name: row.name }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ExtensionRow {
    id: i64,
    repo_id: i64,
    name: String,
    version: String,
}
impl From<ExtensionRow> for InstalledExtension {
    fn from(row: ExtensionRow) -> Self {
        Self { id: row.id, repo_id: row.repo_id, name: row.name, version: row.version }
    }
}
impl From<ExtensionRow> for AvailableExtension {
    fn from(row: ExtensionRow) -> Self {
        Self { id: row.id, repo_id: row.repo_id, name: row.name, version: row.version }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct NovelRow {
    id: i64,
    url: String,
    extension_id: i64,
    bookmarked: bool,
    loaded: bool,
    title: String,
    image_url: String,
    description: String,
    language: String,
    genres: String,
    authors: String,
    artists: String,
    tags: String,
    status: String,
}
impl TryFrom<NovelRow> for Novel {
    type Error = Error;
    fn try_from(row: NovelRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            url: row.url,
            extension_id: row.extension_id,
            bookmarked: row.bookmarked,
            loaded: row.loaded,
            details: NovelDetails {
                title: row.title,
                image_url: row.image_url,
                description: row.description,
                language: row.language,
                genres: from_json(&row.genres, "genres")?,
                authors: from_json(&row.authors, "authors")?,
                artists: from_json(&row.artists, "artists")?,
                tags: from_json(&row.tags, "tags")?,
                // Unknown statuses from newer clients are not worth failing a backup over.
                status: row.status.parse().unwrap_or(NovelStatus::Unknown),
            },
        })
    }
}

/// Encoded list columns of a novel, in insert order.
pub(super) struct NovelLists {
    pub genres: String,
    pub authors: String,
    pub artists: String,
    pub tags: String,
}
impl TryFrom<&NovelDetails> for NovelLists {
    type Error = Error;
    fn try_from(details: &NovelDetails) -> Result<Self> {
        Ok(Self {
            genres: to_json(&details.genres, "genres")?,
            authors: to_json(&details.authors, "authors")?,
            artists: to_json(&details.artists, "artists")?,
            tags: to_json(&details.tags, "tags")?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ChapterRow {
    id: i64,
    novel_id: i64,
    extension_id: i64,
    url: String,
    title: String,
    release_date: Option<String>,
    sort_order: f64,
    reading_position: f64,
    reading_status: String,
    bookmarked: bool,
}
impl TryFrom<ChapterRow> for Chapter {
    type Error = Error;
    fn try_from(row: ChapterRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            novel_id: row.novel_id,
            extension_id: row.extension_id,
            url: row.url,
            title: row.title,
            release_date: row.release_date,
            order: row.sort_order,
            reading_position: row.reading_position,
            reading_status: parse_enum::<ReadingStatus>(&row.reading_status, "reading status")?,
            bookmarked: row.bookmarked,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct HistoryRow {
    chapter_id: i64,
    novel_id: i64,
    started_reading_at: i64,
    ended_reading_at: Option<i64>,
}
impl From<HistoryRow> for ChapterHistory {
    fn from(row: HistoryRow) -> Self {
        Self {
            chapter_id: row.chapter_id,
            novel_id: row.novel_id,
            started_reading_at: row.started_reading_at,
            ended_reading_at: row.ended_reading_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct SettingsRow {
    novel_id: i64,
    sort_type: String,
    show_only_reading_status_of: Option<String>,
    show_only_bookmarked: bool,
    show_only_downloaded: bool,
    reverse_order: bool,
}
impl TryFrom<SettingsRow> for NovelSettings {
    type Error = Error;
    fn try_from(row: SettingsRow) -> Result<Self> {
        Ok(Self {
            novel_id: row.novel_id,
            sort_type: parse_enum::<ChapterSortType>(&row.sort_type, "sort type")?,
            show_only_reading_status_of: row
                .show_only_reading_status_of
                .as_deref()
                .map(|s| parse_enum::<ReadingStatus>(s, "reading status filter"))
                .transpose()?,
            show_only_bookmarked: row.show_only_bookmarked,
            show_only_downloaded: row.show_only_downloaded,
            reverse_order: row.reverse_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_novel_row_to_model() {
        let row = NovelRow {
            id: 1,
            url: "/n/1".to_string(),
            extension_id: 7,
            bookmarked: true,
            loaded: false,
            title: "T".to_string(),
            image_url: String::new(),
            description: String::new(),
            language: "en".to_string(),
            genres: r#"["Fantasy","Drama"]"#.to_string(),
            authors: "[]".to_string(),
            artists: "[]".to_string(),
            tags: "[]".to_string(),
            status: "SOMETHING_NEW".to_string(),
        };
        let novel = Novel::try_from(row).unwrap();
        assert_eq!(novel.details.genres, vec!["Fantasy", "Drama"]);
        assert_eq!(novel.details.status, NovelStatus::Unknown);
    }

    #[test]
    fn test_corrupt_list_column() {
        let row = NovelRow {
            id: 1,
            url: "/n/1".to_string(),
            extension_id: 7,
            bookmarked: true,
            loaded: false,
            title: "T".to_string(),
            image_url: String::new(),
            description: String::new(),
            language: String::new(),
            genres: "Fantasy, Drama".to_string(),
            authors: "[]".to_string(),
            artists: "[]".to_string(),
            tags: "[]".to_string(),
            status: "UNKNOWN".to_string(),
        };
        let err = Novel::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("genres"));
    }

    #[test]
    fn test_settings_row_to_model() {
        let row = SettingsRow {
            novel_id: 3,
            sort_type: "UPLOAD".to_string(),
            show_only_reading_status_of: Some("READ".to_string()),
            show_only_bookmarked: true,
            show_only_downloaded: false,
            reverse_order: true,
        };
        let settings = NovelSettings::try_from(row).unwrap();
        assert_eq!(settings.sort_type, ChapterSortType::Upload);
        assert_eq!(settings.show_only_reading_status_of, Some(ReadingStatus::Read));
    }
}
