//! In-memory library store for testing.

use super::{
    CategoryStore, ChapterPair, ChapterStore, ExtensionStore, HistoryStore, NovelCategoryStore, NovelStore, PinStore,
    RepositoryStore, SettingsStore,
};
use crate::error::{ErrorKind, Result};
use crate::models::{
    AvailableExtension, Category, Chapter, ChapterHistory, InstalledExtension, NewChapter, NewNovel, Novel,
    NovelCategory, NovelSettings, ReadingStatus, Repository,
};
use async_trait::async_trait;
use shelf_archive::models::normalize_url;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// An operation of [`MockStore`] that can be made to fail.
///
/// Variants carrying a key only fail for that key (a novel URL, a category
/// name, an extension id...); the others fail for every call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fault {
    ListCategories,
    AddCategory(String),
    ListRepositories,
    AddRepository(String),
    ListAvailable,
    RecordInstalled(i64),
    ListBookmarked,
    FindNovel(String),
    InsertNovel(String),
    ListChapters,
    InsertChapters,
    RestoreChapterState,
    GetHistory,
    RestoreHistory,
    GetSettings,
    /// Writing the settings of the novel with this URL.
    WriteSettings(String),
    ListNovelCategories,
    AddNovelCategories,
    IsPinned,
    UpsertPin,
}

#[derive(Default)]
struct State {
    next_id: i64,
    categories: Vec<Category>,
    repositories: Vec<Repository>,
    available: Vec<AvailableExtension>,
    installed: Vec<InstalledExtension>,
    novels: Vec<Novel>,
    chapters: Vec<Chapter>,
    history: HashMap<i64, ChapterHistory>,
    settings: HashMap<i64, NovelSettings>,
    novel_categories: Vec<NovelCategory>,
    pins: HashMap<i64, bool>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory library store for testing.
///
/// All state lives behind a single [`RwLock`], so trait methods operate on
/// `&self` and a store can be shared as a
/// [`StoreHandle`](crate::StoreHandle). Any operation can be made to fail
/// with [`with_fault`](Self::with_fault).
///
/// # Examples
///
/// ```
/// use shelf_store::{CategoryStore, Fault, MockStore};
/// use shelf_store::error::ErrorKind;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MockStore::default()
///     .with_category("Reading", 0)
///     .with_fault(Fault::AddCategory("Broken".to_string()), ErrorKind::Database);
/// assert_eq!(store.list_categories().await.unwrap().len(), 1);
/// assert!(store.add_category("Later").await.is_ok());
/// assert!(store.add_category("Broken").await.is_err());
/// # }
/// ```
#[derive(Default)]
pub struct MockStore {
    state: RwLock<State>,
    faults: RwLock<HashMap<Fault, ErrorKind>>,
}

impl MockStore {
    pub fn with_category(mut self, name: impl Into<String>, order: i32) -> Self {
        let state = self.state.get_mut();
        let id = state.next_id();
        state.categories.push(Category { id, name: name.into(), order });
        self
    }

    pub fn with_repository(mut self, url: &str, name: impl Into<String>) -> Self {
        let state = self.state.get_mut();
        let id = state.next_id();
        state.repositories.push(Repository { id, url: normalize_url(url), name: name.into() });
        self
    }

    /// Advertise an extension in the repository listing.
    pub fn with_available(mut self, id: i64, repo_id: i64, name: impl Into<String>) -> Self {
        self.state.get_mut().available.push(AvailableExtension {
            id,
            repo_id,
            name: name.into(),
            version: "1.0.0".to_string(),
        });
        self
    }

    /// Mark an extension as installed without advertising it.
    pub fn with_installed(mut self, id: i64, repo_id: i64, name: impl Into<String>) -> Self {
        self.state.get_mut().installed.push(InstalledExtension {
            id,
            repo_id,
            name: name.into(),
            version: "1.0.0".to_string(),
        });
        self
    }

    /// Make an operation fail with the given error kind.
    pub fn with_fault(mut self, fault: Fault, kind: ErrorKind) -> Self {
        self.faults.get_mut().insert(fault, kind);
        self
    }

    /// Stop an injected fault from firing.
    pub async fn clear_fault(&self, fault: &Fault) {
        self.faults.write().await.remove(fault);
    }

    /// Every novel, bookmarked or not.
    pub async fn all_novels(&self) -> Vec<Novel> {
        self.state.read().await.novels.clone()
    }

    /// Every chapter of every novel.
    pub async fn all_chapters(&self) -> Vec<Chapter> {
        self.state.read().await.chapters.clone()
    }

    /// Overwrite the reading state of a chapter, as a reader would.
    pub async fn set_progress(&self, chapter_id: i64, status: ReadingStatus, position: f64) {
        let mut state = self.state.write().await;
        if let Some(chapter) = state.chapters.iter_mut().find(|c| c.id == chapter_id) {
            chapter.reading_status = status;
            chapter.reading_position = position;
        }
    }

    /// Mark an existing novel as no longer bookmarked.
    pub async fn unbookmark(&self, novel_id: i64) {
        let mut state = self.state.write().await;
        if let Some(novel) = state.novels.iter_mut().find(|n| n.id == novel_id) {
            novel.bookmarked = false;
        }
    }

    async fn novel_url(&self, novel_id: i64) -> String {
        let state = self.state.read().await;
        state.novels.iter().find(|n| n.id == novel_id).map(|n| n.url.clone()).unwrap_or_default()
    }

    async fn check(&self, fault: Fault) -> Result<()> {
        match self.faults.read().await.get(&fault) {
            Some(kind) => exn::bail!(kind.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CategoryStore for MockStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.check(Fault::ListCategories).await?;
        let mut categories = self.state.read().await.categories.clone();
        categories.sort_by_key(|c| c.order);
        Ok(categories)
    }

    async fn add_category(&self, name: &str) -> Result<Category> {
        self.check(Fault::AddCategory(name.to_string())).await?;
        let mut state = self.state.write().await;
        if state.categories.iter().any(|c| c.name == name) {
            exn::bail!(ErrorKind::Constraint);
        }
        let order = state.categories.iter().map(|c| c.order + 1).max().unwrap_or(0);
        let category = Category { id: state.next_id(), name: name.to_string(), order };
        state.categories.push(category.clone());
        Ok(category)
    }
}

#[async_trait]
impl RepositoryStore for MockStore {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.check(Fault::ListRepositories).await?;
        Ok(self.state.read().await.repositories.clone())
    }

    async fn add_repository(&self, url: &str, name: &str) -> Result<Repository> {
        let url = normalize_url(url);
        self.check(Fault::AddRepository(url.clone())).await?;
        let mut state = self.state.write().await;
        if state.repositories.iter().any(|r| r.url == url) {
            exn::bail!(ErrorKind::Constraint);
        }
        let repository = Repository { id: state.next_id(), url, name: name.to_string() };
        state.repositories.push(repository.clone());
        Ok(repository)
    }
}

#[async_trait]
impl ExtensionStore for MockStore {
    async fn list_installed_extensions(&self) -> Result<Vec<InstalledExtension>> {
        Ok(self.state.read().await.installed.clone())
    }

    async fn get_installed_extension(&self, id: i64) -> Result<Option<InstalledExtension>> {
        Ok(self.state.read().await.installed.iter().find(|e| e.id == id).cloned())
    }

    async fn list_available_extensions(&self) -> Result<Vec<AvailableExtension>> {
        self.check(Fault::ListAvailable).await?;
        Ok(self.state.read().await.available.clone())
    }

    async fn replace_available_extensions(&self, extensions: &[AvailableExtension]) -> Result<()> {
        self.state.write().await.available = extensions.to_vec();
        Ok(())
    }

    async fn record_installed(&self, extension: &AvailableExtension) -> Result<InstalledExtension> {
        self.check(Fault::RecordInstalled(extension.id)).await?;
        let installed = InstalledExtension::from(extension);
        let mut state = self.state.write().await;
        state.installed.retain(|e| e.id != extension.id);
        state.installed.push(installed.clone());
        Ok(installed)
    }
}

#[async_trait]
impl NovelStore for MockStore {
    async fn list_bookmarked_novels(&self) -> Result<Vec<Novel>> {
        self.check(Fault::ListBookmarked).await?;
        Ok(self.state.read().await.novels.iter().filter(|n| n.bookmarked).cloned().collect())
    }

    async fn find_novel_id(&self, url: &str, extension_id: i64) -> Result<Option<i64>> {
        self.check(Fault::FindNovel(url.to_string())).await?;
        let state = self.state.read().await;
        Ok(state.novels.iter().find(|n| n.url == url && n.extension_id == extension_id).map(|n| n.id))
    }

    async fn get_novel(&self, id: i64) -> Result<Option<Novel>> {
        Ok(self.state.read().await.novels.iter().find(|n| n.id == id).cloned())
    }

    async fn insert_novel(&self, novel: &NewNovel) -> Result<i64> {
        self.check(Fault::InsertNovel(novel.url.clone())).await?;
        let mut state = self.state.write().await;
        if state.novels.iter().any(|n| n.url == novel.url && n.extension_id == novel.extension_id) {
            exn::bail!(ErrorKind::Constraint);
        }
        let id = state.next_id();
        state.novels.push(Novel {
            id,
            url: novel.url.clone(),
            extension_id: novel.extension_id,
            bookmarked: novel.bookmarked,
            loaded: novel.loaded,
            details: novel.details.clone(),
        });
        Ok(id)
    }
}

#[async_trait]
impl ChapterStore for MockStore {
    async fn list_chapters(&self, novel_id: i64) -> Result<Vec<Chapter>> {
        self.check(Fault::ListChapters).await?;
        let mut chapters: Vec<_> =
            self.state.read().await.chapters.iter().filter(|c| c.novel_id == novel_id).cloned().collect();
        chapters.sort_by(|a, b| a.order.total_cmp(&b.order));
        Ok(chapters)
    }

    async fn insert_chapters(&self, chapters: &[NewChapter]) -> Result<()> {
        self.check(Fault::InsertChapters).await?;
        let mut state = self.state.write().await;
        for new in chapters {
            if let Some(existing) = state.chapters.iter_mut().find(|c| c.novel_id == new.novel_id && c.url == new.url) {
                existing.title.clone_from(&new.title);
                existing.release_date.clone_from(&new.release_date);
                existing.order = new.order;
                continue;
            }
            let id = state.next_id();
            state.chapters.push(Chapter {
                id,
                novel_id: new.novel_id,
                extension_id: new.extension_id,
                url: new.url.clone(),
                title: new.title.clone(),
                release_date: new.release_date.clone(),
                order: new.order,
                reading_position: 0.0,
                reading_status: ReadingStatus::Unread,
                bookmarked: false,
            });
        }
        Ok(())
    }

    async fn restore_chapter_state(&self, pairs: &[ChapterPair<'_>]) -> Result<()> {
        self.check(Fault::RestoreChapterState).await?;
        let mut state = self.state.write().await;
        for (record, live) in pairs {
            if let Some(chapter) = state.chapters.iter_mut().find(|c| c.id == live.id) {
                chapter.apply_record(record);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MockStore {
    async fn get_history(&self, chapter_id: i64) -> Result<Option<ChapterHistory>> {
        self.check(Fault::GetHistory).await?;
        Ok(self.state.read().await.history.get(&chapter_id).cloned())
    }

    async fn restore_history(&self, pairs: &[ChapterPair<'_>]) -> Result<()> {
        self.check(Fault::RestoreHistory).await?;
        let mut state = self.state.write().await;
        for (record, chapter) in pairs {
            let merged = ChapterHistory::merged(state.history.get(&chapter.id), chapter, record);
            if let Some(history) = merged {
                state.history.insert(chapter.id, history);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MockStore {
    async fn get_settings(&self, novel_id: i64) -> Result<Option<NovelSettings>> {
        self.check(Fault::GetSettings).await?;
        Ok(self.state.read().await.settings.get(&novel_id).cloned())
    }

    async fn insert_settings(&self, settings: &NovelSettings) -> Result<()> {
        self.check(Fault::WriteSettings(self.novel_url(settings.novel_id).await)).await?;
        let mut state = self.state.write().await;
        if state.settings.contains_key(&settings.novel_id) {
            exn::bail!(ErrorKind::Constraint);
        }
        state.settings.insert(settings.novel_id, settings.clone());
        Ok(())
    }

    async fn update_settings(&self, settings: &NovelSettings) -> Result<()> {
        self.check(Fault::WriteSettings(self.novel_url(settings.novel_id).await)).await?;
        let mut state = self.state.write().await;
        let Some(current) = state.settings.get_mut(&settings.novel_id) else {
            exn::bail!(ErrorKind::NotFound(format!("settings for novel {}", settings.novel_id)));
        };
        *current = settings.clone();
        Ok(())
    }
}

#[async_trait]
impl NovelCategoryStore for MockStore {
    async fn list_novel_categories(&self, novel_id: i64) -> Result<Vec<NovelCategory>> {
        self.check(Fault::ListNovelCategories).await?;
        let state = self.state.read().await;
        Ok(state.novel_categories.iter().filter(|l| l.novel_id == novel_id).copied().collect())
    }

    async fn add_novel_categories(&self, links: &[NovelCategory]) -> Result<()> {
        self.check(Fault::AddNovelCategories).await?;
        let mut state = self.state.write().await;
        for link in links {
            if !state.novel_categories.contains(link) {
                state.novel_categories.push(*link);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PinStore for MockStore {
    async fn is_pinned(&self, novel_id: i64) -> Result<bool> {
        self.check(Fault::IsPinned).await?;
        Ok(self.state.read().await.pins.get(&novel_id).copied().unwrap_or(false))
    }

    async fn upsert_pin(&self, novel_id: i64, pinned: bool) -> Result<()> {
        self.check(Fault::UpsertPin).await?;
        self.state.write().await.pins.insert(novel_id, pinned);
        Ok(())
    }
}
