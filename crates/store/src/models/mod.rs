//! Live library entities.

mod chapter;
mod extension;
mod novel;

pub use self::chapter::{Chapter, ChapterHistory, NewChapter};
pub use self::extension::{AvailableExtension, InstalledExtension};
pub use self::novel::{NewNovel, Novel, NovelDetails, NovelSettings};
pub use shelf_archive::models::{ChapterSortType, NovelStatus, ReadingStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub id: i64,
    pub url: String,
    pub name: String,
}

/// Link between a novel and one of the user's categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NovelCategory {
    pub novel_id: i64,
    pub category_id: i64,
}
