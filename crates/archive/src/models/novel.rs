use super::{ChapterRecord, NovelSettingRecord, NovelStatus};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A bookmarked novel.
///
/// Identified by `(url, extension id)`; the extension id comes from the
/// enclosing [`ExtensionRecord`](super::ExtensionRecord). `categories` holds
/// category *orders*, resolved against the archive's own category list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelRecord {
    pub url: String,
    #[serde(rename = "name")]
    pub title: String,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: NovelStatus,
    #[serde(default = "default_true")]
    pub bookmarked: bool,
    #[serde(default)]
    pub loaded: bool,
    #[serde(default)]
    pub chapters: Vec<ChapterRecord>,
    #[serde(default)]
    pub settings: NovelSettingRecord,
    #[serde(default)]
    pub categories: Vec<i32>,
    #[serde(default)]
    pub pinned: bool,
}

impl NovelRecord {
    /// A bookmarked novel with no details, chapters or categories.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            image_url: String::new(),
            description: String::new(),
            language: String::new(),
            genres: Vec::new(),
            authors: Vec::new(),
            artists: Vec::new(),
            tags: Vec::new(),
            status: NovelStatus::default(),
            bookmarked: true,
            loaded: false,
            chapters: Vec::new(),
            settings: NovelSettingRecord::default(),
            categories: Vec::new(),
            pinned: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_takes_defaults() {
        let novel: NovelRecord = serde_json::from_str(r#"{"url":"/n/1","name":"A Title"}"#).unwrap();
        assert_eq!(novel, NovelRecord::new("/n/1", "A Title"));
        assert!(novel.bookmarked);
        assert_eq!(novel.status, NovelStatus::Unknown);
    }

    #[test]
    fn test_wire_names() {
        let mut novel = NovelRecord::new("/n/1", "A Title");
        novel.image_url = "https://img.example/1.png".to_string();
        novel.categories = vec![0, 2];
        let json = serde_json::to_value(&novel).unwrap();
        assert_eq!(json["name"], "A Title");
        assert_eq!(json["imageURL"], "https://img.example/1.png");
        assert_eq!(json["categories"], serde_json::json!([0, 2]));
        assert_eq!(json["settings"]["sortType"], "SOURCE");
        assert!(json.get("title").is_none());
    }
}
