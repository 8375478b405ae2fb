//! Store traits and implementations.
//!
//! Each trait covers one kind of entity so that callers (and test doubles)
//! only need to care about what they touch. [`LibraryStore`] is implemented
//! automatically for anything implementing all of them.
//!
//! Writes that would duplicate an existing natural key fail with
//! [`ErrorKind::Constraint`](crate::error::ErrorKind::Constraint) unless the
//! method documents otherwise.

#[cfg(feature = "mock")]
mod mock;
mod sqlite;

#[cfg(feature = "mock")]
pub use self::mock::{Fault, MockStore};
pub use self::sqlite::{Database, SqliteStore};
use crate::error::Result;
use crate::models::{
    AvailableExtension, Category, Chapter, ChapterHistory, InstalledExtension, NewChapter, NewNovel, Novel,
    NovelCategory, NovelSettings, Repository,
};
use async_trait::async_trait;
use shelf_archive::models::ChapterRecord;

/// Archived chapter state paired with the live chapter it applies to.
pub type ChapterPair<'a> = (&'a ChapterRecord, &'a Chapter);

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories, by ascending order.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Create a category after the current last one.
    async fn add_category(&self, name: &str) -> Result<Category>;
}

#[async_trait]
pub trait RepositoryStore: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    /// Add a repository. The URL is stored normalized (see
    /// [`normalize_url`](shelf_archive::models::normalize_url)).
    async fn add_repository(&self, url: &str, name: &str) -> Result<Repository>;
}

#[async_trait]
pub trait ExtensionStore: Send + Sync {
    async fn list_installed_extensions(&self) -> Result<Vec<InstalledExtension>>;

    async fn get_installed_extension(&self, id: i64) -> Result<Option<InstalledExtension>>;

    async fn is_extension_installed(&self, id: i64) -> Result<bool> {
        Ok(self.get_installed_extension(id).await?.is_some())
    }

    /// The extension listing advertised by the configured repositories, as
    /// of the last refresh.
    async fn list_available_extensions(&self) -> Result<Vec<AvailableExtension>>;

    /// Replace the advertised listing.
    async fn replace_available_extensions(&self, extensions: &[AvailableExtension]) -> Result<()>;

    /// Record an extension as installed, replacing any older install of the
    /// same id.
    async fn record_installed(&self, extension: &AvailableExtension) -> Result<InstalledExtension>;
}

#[async_trait]
pub trait NovelStore: Send + Sync {
    async fn list_bookmarked_novels(&self) -> Result<Vec<Novel>>;

    async fn find_novel_id(&self, url: &str, extension_id: i64) -> Result<Option<i64>>;

    async fn get_novel(&self, id: i64) -> Result<Option<Novel>>;

    /// Insert a novel, returning its new id.
    async fn insert_novel(&self, novel: &NewNovel) -> Result<i64>;
}

#[async_trait]
pub trait ChapterStore: Send + Sync {
    /// Chapters of a novel, by ascending order.
    async fn list_chapters(&self, novel_id: i64) -> Result<Vec<Chapter>>;

    /// Insert chapters in bulk. A chapter whose `(novel_id, url)` already
    /// exists has its title, release date and order replaced; its reading
    /// state is kept.
    async fn insert_chapters(&self, chapters: &[NewChapter]) -> Result<()>;

    /// Apply archived bookmark and reading state to live chapters following
    /// [`Chapter::apply_record`]. Never creates chapters.
    async fn restore_chapter_state(&self, pairs: &[ChapterPair<'_>]) -> Result<()>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get_history(&self, chapter_id: i64) -> Result<Option<ChapterHistory>>;

    /// Apply archived reading times to live chapters following
    /// [`ChapterHistory::merged`].
    async fn restore_history(&self, pairs: &[ChapterPair<'_>]) -> Result<()>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_settings(&self, novel_id: i64) -> Result<Option<NovelSettings>>;

    async fn insert_settings(&self, settings: &NovelSettings) -> Result<()>;

    /// Overwrite existing settings. Fails with
    /// [`ErrorKind::NotFound`](crate::error::ErrorKind::NotFound) when the
    /// novel has none.
    async fn update_settings(&self, settings: &NovelSettings) -> Result<()>;
}

#[async_trait]
pub trait NovelCategoryStore: Send + Sync {
    async fn list_novel_categories(&self, novel_id: i64) -> Result<Vec<NovelCategory>>;

    /// Add category links. Links that already exist are left alone.
    async fn add_novel_categories(&self, links: &[NovelCategory]) -> Result<()>;
}

#[async_trait]
pub trait PinStore: Send + Sync {
    async fn is_pinned(&self, novel_id: i64) -> Result<bool>;

    async fn upsert_pin(&self, novel_id: i64, pinned: bool) -> Result<()>;
}

/// Everything the backup engine needs from a library.
pub trait LibraryStore:
    CategoryStore
    + RepositoryStore
    + ExtensionStore
    + NovelStore
    + ChapterStore
    + HistoryStore
    + SettingsStore
    + NovelCategoryStore
    + PinStore
{
}

impl<T> LibraryStore for T where
    T: CategoryStore
        + RepositoryStore
        + ExtensionStore
        + NovelStore
        + ChapterStore
        + HistoryStore
        + SettingsStore
        + NovelCategoryStore
        + PinStore
{
}
