//! SQLite library store.

mod db;
mod rows;

pub use self::db::Database;
use self::rows::{
    CategoryRow, ChapterRow, ExtensionRow, HistoryRow, NovelLists, NovelRow, RepositoryRow, SettingsRow,
};
use super::{
    CategoryStore, ChapterPair, ChapterStore, ExtensionStore, HistoryStore, NovelCategoryStore, NovelStore, PinStore,
    RepositoryStore, SettingsStore,
};
use crate::error::{ErrorKind, Result, raise_sqlx};
use crate::models::{
    AvailableExtension, Category, Chapter, ChapterHistory, InstalledExtension, NewChapter, NewNovel, Novel,
    NovelCategory, NovelSettings, Repository,
};
use async_trait::async_trait;
use exn::ResultExt;
use shelf_archive::models::normalize_url;
use sqlx::SqlitePool;
use time::UtcDateTime;

/// Library store backed by a [`Database`].
///
/// Bulk writes (chapters, history, links) run in a single transaction each,
/// so a failure leaves none of the batch behind.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl From<&Database> for SqliteStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// =========================================================================
// Categories & Repositories
// =========================================================================

#[async_trait]
impl CategoryStore for SqliteStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(include_str!("../../../queries/list_categories.sql"))
            .fetch_all(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn add_category(&self, name: &str) -> Result<Category> {
        let row: CategoryRow = sqlx::query_as(include_str!("../../../queries/add_category.sql"))
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(row.into())
    }
}

#[async_trait]
impl RepositoryStore for SqliteStore {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let rows: Vec<RepositoryRow> = sqlx::query_as(include_str!("../../../queries/list_repositories.sql"))
            .fetch_all(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(rows.into_iter().map(Repository::from).collect())
    }

    async fn add_repository(&self, url: &str, name: &str) -> Result<Repository> {
        let row: RepositoryRow = sqlx::query_as(include_str!("../../../queries/add_repository.sql"))
            .bind(normalize_url(url))
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(row.into())
    }
}

// =========================================================================
// Extensions
// =========================================================================

#[async_trait]
impl ExtensionStore for SqliteStore {
    async fn list_installed_extensions(&self) -> Result<Vec<InstalledExtension>> {
        let rows: Vec<ExtensionRow> = sqlx::query_as(include_str!("../../../queries/list_installed_extensions.sql"))
            .fetch_all(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(rows.into_iter().map(InstalledExtension::from).collect())
    }

    async fn get_installed_extension(&self, id: i64) -> Result<Option<InstalledExtension>> {
        let row: Option<ExtensionRow> = sqlx::query_as(include_str!("../../../queries/get_installed_extension.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(row.map(InstalledExtension::from))
    }

    async fn list_available_extensions(&self) -> Result<Vec<AvailableExtension>> {
        let rows: Vec<ExtensionRow> = sqlx::query_as(include_str!("../../../queries/list_available_extensions.sql"))
            .fetch_all(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(rows.into_iter().map(AvailableExtension::from).collect())
    }

    async fn replace_available_extensions(&self, extensions: &[AvailableExtension]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../../../queries/clear_available_extensions.sql"))
            .execute(&mut *tx)
            .await
            .map_err(raise_sqlx)?;
        for ext in extensions {
            sqlx::query(include_str!("../../../queries/insert_available_extension.sql"))
                .bind(ext.id)
                .bind(ext.repo_id)
                .bind(&ext.name)
                .bind(&ext.version)
                .execute(&mut *tx)
                .await
                .map_err(raise_sqlx)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    async fn record_installed(&self, extension: &AvailableExtension) -> Result<InstalledExtension> {
        sqlx::query(include_str!("../../../queries/upsert_installed_extension.sql"))
            .bind(extension.id)
            .bind(extension.repo_id)
            .bind(&extension.name)
            .bind(&extension.version)
            .bind(UtcDateTime::now().unix_timestamp())
            .execute(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(InstalledExtension::from(extension))
    }
}

// =========================================================================
// Novels & Chapters
// =========================================================================

#[async_trait]
impl NovelStore for SqliteStore {
    async fn list_bookmarked_novels(&self) -> Result<Vec<Novel>> {
        let rows: Vec<NovelRow> = sqlx::query_as(include_str!("../../../queries/list_bookmarked_novels.sql"))
            .fetch_all(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        rows.into_iter().map(Novel::try_from).collect()
    }

    async fn find_novel_id(&self, url: &str, extension_id: i64) -> Result<Option<i64>> {
        sqlx::query_scalar(include_str!("../../../queries/find_novel_id.sql"))
            .bind(url)
            .bind(extension_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(raise_sqlx)
    }

    async fn get_novel(&self, id: i64) -> Result<Option<Novel>> {
        let row: Option<NovelRow> = sqlx::query_as(include_str!("../../../queries/get_novel.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        row.map(Novel::try_from).transpose()
    }

    async fn insert_novel(&self, novel: &NewNovel) -> Result<i64> {
        let lists = NovelLists::try_from(&novel.details)?;
        sqlx::query_scalar(include_str!("../../../queries/insert_novel.sql"))
            .bind(&novel.url)
            .bind(novel.extension_id)
            .bind(novel.bookmarked)
            .bind(novel.loaded)
            .bind(&novel.details.title)
            .bind(&novel.details.image_url)
            .bind(&novel.details.description)
            .bind(&novel.details.language)
            .bind(lists.genres)
            .bind(lists.authors)
            .bind(lists.artists)
            .bind(lists.tags)
            .bind(novel.details.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(raise_sqlx)
    }
}

#[async_trait]
impl ChapterStore for SqliteStore {
    async fn list_chapters(&self, novel_id: i64) -> Result<Vec<Chapter>> {
        let rows: Vec<ChapterRow> = sqlx::query_as(include_str!("../../../queries/list_chapters.sql"))
            .bind(novel_id)
            .fetch_all(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        rows.into_iter().map(Chapter::try_from).collect()
    }

    async fn insert_chapters(&self, chapters: &[NewChapter]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for chapter in chapters {
            sqlx::query(include_str!("../../../queries/upsert_chapter.sql"))
                .bind(chapter.novel_id)
                .bind(chapter.extension_id)
                .bind(&chapter.url)
                .bind(&chapter.title)
                .bind(&chapter.release_date)
                .bind(chapter.order)
                .execute(&mut *tx)
                .await
                .map_err(raise_sqlx)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    async fn restore_chapter_state(&self, pairs: &[ChapterPair<'_>]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for (record, live) in pairs {
            let mut chapter = (*live).clone();
            chapter.apply_record(record);
            sqlx::query(include_str!("../../../queries/update_chapter_state.sql"))
                .bind(&chapter.title)
                .bind(chapter.bookmarked)
                .bind(chapter.reading_status.as_str())
                .bind(chapter.reading_position)
                .bind(chapter.id)
                .execute(&mut *tx)
                .await
                .map_err(raise_sqlx)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }
}

// =========================================================================
// Per-novel state
// =========================================================================

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn get_history(&self, chapter_id: i64) -> Result<Option<ChapterHistory>> {
        let row: Option<HistoryRow> = sqlx::query_as(include_str!("../../../queries/get_history.sql"))
            .bind(chapter_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(row.map(ChapterHistory::from))
    }

    async fn restore_history(&self, pairs: &[ChapterPair<'_>]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for (record, chapter) in pairs {
            let current: Option<HistoryRow> = sqlx::query_as(include_str!("../../../queries/get_history.sql"))
                .bind(chapter.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(raise_sqlx)?;
            let current = current.map(ChapterHistory::from);
            let Some(history) = ChapterHistory::merged(current.as_ref(), chapter, record) else {
                continue;
            };
            sqlx::query(include_str!("../../../queries/upsert_history.sql"))
                .bind(history.chapter_id)
                .bind(history.novel_id)
                .bind(history.started_reading_at)
                .bind(history.ended_reading_at)
                .execute(&mut *tx)
                .await
                .map_err(raise_sqlx)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }
}

#[async_trait]
impl SettingsStore for SqliteStore {
    async fn get_settings(&self, novel_id: i64) -> Result<Option<NovelSettings>> {
        let row: Option<SettingsRow> = sqlx::query_as(include_str!("../../../queries/get_settings.sql"))
            .bind(novel_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        row.map(NovelSettings::try_from).transpose()
    }

    async fn insert_settings(&self, settings: &NovelSettings) -> Result<()> {
        sqlx::query(include_str!("../../../queries/insert_settings.sql"))
            .bind(settings.novel_id)
            .bind(settings.sort_type.as_str())
            .bind(settings.show_only_reading_status_of.map(|s| s.as_str()))
            .bind(settings.show_only_bookmarked)
            .bind(settings.show_only_downloaded)
            .bind(settings.reverse_order)
            .execute(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(())
    }

    async fn update_settings(&self, settings: &NovelSettings) -> Result<()> {
        let result = sqlx::query(include_str!("../../../queries/update_settings.sql"))
            .bind(settings.sort_type.as_str())
            .bind(settings.show_only_reading_status_of.map(|s| s.as_str()))
            .bind(settings.show_only_bookmarked)
            .bind(settings.show_only_downloaded)
            .bind(settings.reverse_order)
            .bind(settings.novel_id)
            .execute(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(format!("settings for novel {}", settings.novel_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl NovelCategoryStore for SqliteStore {
    async fn list_novel_categories(&self, novel_id: i64) -> Result<Vec<NovelCategory>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(include_str!("../../../queries/list_novel_categories.sql"))
            .bind(novel_id)
            .fetch_all(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(rows.into_iter().map(|(novel_id, category_id)| NovelCategory { novel_id, category_id }).collect())
    }

    async fn add_novel_categories(&self, links: &[NovelCategory]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for link in links {
            sqlx::query(include_str!("../../../queries/add_novel_category.sql"))
                .bind(link.novel_id)
                .bind(link.category_id)
                .execute(&mut *tx)
                .await
                .map_err(raise_sqlx)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }
}

#[async_trait]
impl PinStore for SqliteStore {
    async fn is_pinned(&self, novel_id: i64) -> Result<bool> {
        let pinned: Option<bool> = sqlx::query_scalar(include_str!("../../../queries/is_pinned.sql"))
            .bind(novel_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(pinned.unwrap_or(false))
    }

    async fn upsert_pin(&self, novel_id: i64, pinned: bool) -> Result<()> {
        sqlx::query(include_str!("../../../queries/upsert_pin.sql"))
            .bind(novel_id)
            .bind(pinned)
            .execute(&self.pool)
            .await
            .map_err(raise_sqlx)?;
        Ok(())
    }
}
