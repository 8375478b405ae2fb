use crate::export::ExportOptions;
use crate::export::error::{ErrorKind, Result};
use exn::ResultExt;
use shelf_archive::RecordTree;
use shelf_archive::models::{CategoryRecord, ChapterRecord, ExtensionRecord, NovelRecord, RepositoryRecord};
use shelf_store::StoreHandle;
use shelf_store::models::{Category, Chapter, ChapterHistory, InstalledExtension, Novel};
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// Counts describing what went into an archive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub novels: usize,
    pub chapters: usize,
    pub extensions: usize,
    /// Extensions referenced by bookmarked novels but not installed.
    pub missing_extensions: Vec<i64>,
    /// Bookmarked novels left out because their extension is missing.
    pub dropped_novels: usize,
    pub categories: usize,
    pub repositories: usize,
}

/// A record tree ready for encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct Assembled {
    pub tree: RecordTree,
    pub stats: ExportStats,
}

/// A bookmarked novel together with its exported chapters.
pub(super) struct LoadedNovel {
    novel: Novel,
    chapters: Vec<ChapterRecord>,
}

/// Installed extensions of the bookmarked novels.
#[derive(Default)]
pub(super) struct Resolved {
    pub(super) extensions: Vec<InstalledExtension>,
    pub(super) missing: Vec<i64>,
}

/// Collects the exportable state of a library into a [`RecordTree`].
///
/// [`build`](Self::build) runs every stage in order. The stages are also
/// run one at a time by [`export`](super::export) to report progress.
pub struct ArchiveBuilder<'a> {
    store: &'a StoreHandle,
    options: ExportOptions,
}

impl<'a> ArchiveBuilder<'a> {
    pub fn new(store: &'a StoreHandle, options: ExportOptions) -> Self {
        Self { store, options }
    }

    pub async fn build(&self) -> Result<Assembled> {
        let novels = self.load_novels().await?;
        let resolved = self.resolve_extensions(&novels).await;
        let categories = self.collect_categories().await;
        let repositories = self.collect_repositories(&resolved.extensions).await?;
        self.assemble(novels, resolved, categories, repositories).await
    }

    /// Load every bookmarked novel and, if enabled, its chapters.
    #[instrument(skip(self), fields(include_chapters = self.options.include_chapters))]
    pub(super) async fn load_novels(&self) -> Result<Vec<LoadedNovel>> {
        let novels = self.store.list_bookmarked_novels().await.or_raise(|| ErrorKind::Novels)?;
        tracing::info!(count = novels.len(), "loaded bookmarked novels");
        let mut loaded = Vec::with_capacity(novels.len());
        for novel in novels {
            let chapters = match self.options.include_chapters {
                true => self.export_chapters(&novel).await?,
                false => Vec::new(),
            };
            loaded.push(LoadedNovel { novel, chapters });
        }
        Ok(loaded)
    }

    async fn export_chapters(&self, novel: &Novel) -> Result<Vec<ChapterRecord>> {
        let chapters =
            self.store.list_chapters(novel.id).await.or_raise(|| ErrorKind::NovelState(novel.url.clone()))?;
        let mut records = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            // History is a nice-to-have; a chapter without one is still worth exporting.
            let history = match self.store.get_history(chapter.id).await {
                Ok(history) => history,
                Err(err) => {
                    tracing::debug!(chapter = chapter.id, error = ?err, "could not read chapter history");
                    None
                },
            };
            records.push(chapter_record(chapter, history));
        }
        Ok(records)
    }

    /// Look up the installed extension of every distinct extension id, in
    /// the order novels reference them.
    #[instrument(skip_all)]
    pub(super) async fn resolve_extensions(&self, novels: &[LoadedNovel]) -> Resolved {
        let mut seen = HashSet::new();
        let mut resolved = Resolved::default();
        for id in novels.iter().map(|n| n.novel.extension_id) {
            if !seen.insert(id) {
                continue;
            }
            match self.store.get_installed_extension(id).await {
                Ok(Some(extension)) => resolved.extensions.push(extension),
                Ok(None) => {
                    tracing::warn!(id, "extension of bookmarked novels is not installed");
                    resolved.missing.push(id);
                },
                Err(err) => {
                    tracing::warn!(id, error = ?err, "could not resolve extension");
                    resolved.missing.push(id);
                },
            }
        }
        resolved
    }

    #[instrument(skip_all)]
    pub(super) async fn collect_categories(&self) -> Vec<Category> {
        match self.store.list_categories().await {
            Ok(categories) => categories,
            Err(err) => {
                tracing::warn!(error = ?err, "could not load categories, exporting none");
                Vec::new()
            },
        }
    }

    /// Repositories that at least one exported extension was installed from.
    #[instrument(skip_all)]
    pub(super) async fn collect_repositories(
        &self,
        extensions: &[InstalledExtension],
    ) -> Result<Vec<RepositoryRecord>> {
        let used: HashSet<i64> = extensions.iter().map(|e| e.repo_id).collect();
        let repositories = self.store.list_repositories().await.or_raise(|| ErrorKind::Repositories)?;
        Ok(repositories
            .into_iter()
            .filter(|r| used.contains(&r.id))
            .map(|r| RepositoryRecord::new(r.url, r.name))
            .collect())
    }

    /// Group novels under their extension and fill in per-novel state.
    ///
    /// Takes the loaded novels by value: they are gone once the tree exists.
    #[instrument(skip_all, fields(novels = novels.len()))]
    pub(super) async fn assemble(
        &self,
        novels: Vec<LoadedNovel>,
        resolved: Resolved,
        categories: Vec<Category>,
        repositories: Vec<RepositoryRecord>,
    ) -> Result<Assembled> {
        let orders: HashMap<i64, i32> = categories.iter().map(|c| (c.id, c.order)).collect();
        let mut stats = ExportStats {
            extensions: resolved.extensions.len(),
            missing_extensions: resolved.missing,
            categories: categories.len(),
            repositories: repositories.len(),
            ..ExportStats::default()
        };
        let mut extensions: Vec<ExtensionRecord> =
            resolved.extensions.iter().map(|e| ExtensionRecord { id: e.id, novels: Vec::new() }).collect();
        let slots: HashMap<i64, usize> = extensions.iter().enumerate().map(|(i, e)| (e.id, i)).collect();

        for LoadedNovel { novel, chapters } in novels {
            let Some(&slot) = slots.get(&novel.extension_id) else {
                stats.dropped_novels += 1;
                continue;
            };
            stats.novels += 1;
            stats.chapters += chapters.len();
            let record = self.novel_record(novel, chapters, &orders).await?;
            extensions[slot].novels.push(record);
        }
        if stats.dropped_novels > 0 {
            tracing::warn!(dropped = stats.dropped_novels, "left out novels of missing extensions");
        }

        let tree = RecordTree {
            repositories,
            extensions,
            categories: categories.into_iter().map(|c| CategoryRecord::new(c.name, c.order)).collect(),
        };
        Ok(Assembled { tree, stats })
    }

    async fn novel_record(
        &self,
        novel: Novel,
        chapters: Vec<ChapterRecord>,
        orders: &HashMap<i64, i32>,
    ) -> Result<NovelRecord> {
        let failed = || ErrorKind::NovelState(novel.url.clone());
        let settings = match self.options.include_settings {
            true => self.store.get_settings(novel.id).await.or_raise(failed)?.map(|s| s.to_record()).unwrap_or_default(),
            false => Default::default(),
        };
        // Links to categories that were not exported mean nothing in the archive.
        let categories = self
            .store
            .list_novel_categories(novel.id)
            .await
            .or_raise(failed)?
            .into_iter()
            .filter_map(|link| orders.get(&link.category_id).copied())
            .collect();
        let pinned = self.store.is_pinned(novel.id).await.or_raise(failed)?;

        let details = novel.details;
        Ok(NovelRecord {
            url: novel.url,
            title: details.title,
            image_url: details.image_url,
            description: details.description,
            language: details.language,
            genres: details.genres,
            authors: details.authors,
            artists: details.artists,
            tags: details.tags,
            status: details.status,
            bookmarked: novel.bookmarked,
            loaded: novel.loaded,
            chapters,
            settings,
            categories,
            pinned,
        })
    }
}

fn chapter_record(chapter: Chapter, history: Option<ChapterHistory>) -> ChapterRecord {
    ChapterRecord {
        url: chapter.url,
        title: chapter.title,
        bookmarked: chapter.bookmarked,
        reading_status: chapter.reading_status,
        reading_position: chapter.reading_position,
        started_reading_at: history.as_ref().map(|h| h.started_reading_at),
        ended_reading_at: history.and_then(|h| h.ended_reading_at),
        release_date: chapter.release_date,
        order: Some(chapter.order),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use shelf_archive::models::ReadingStatus;
    use shelf_store::error::ErrorKind as StoreErrorKind;
    use shelf_store::models::{NewChapter, NewNovel, NovelCategory, NovelSettings};
    use shelf_store::{
        ChapterStore, Fault, HistoryStore, MockStore, NovelCategoryStore, NovelStore, PinStore, SettingsStore,
    };
    use std::sync::Arc;

    /// Repositories 1 and 2, categories 3 and 4, extension 7 installed from
    /// repository 1. Novel `/n/1` of extension 7 has one read chapter, is in
    /// category "Reading" and pinned. Novel `/n/orphan` comes from an
    /// extension that is not installed.
    async fn library(fault: Option<Fault>) -> StoreHandle {
        let mut store = MockStore::default()
            .with_repository("https://repo.example", "Main")
            .with_repository("https://unused.example", "Unused")
            .with_category("Reading", 0)
            .with_category("Later", 1)
            .with_installed(7, 1, "Seven");

        let novel_id = store.insert_novel(&NewNovel::from_record(7, &NovelRecord::new("/n/1", "T"))).await.unwrap();
        let record = ChapterRecord::new("/c/1", "One");
        store.insert_chapters(&[NewChapter::from_record(novel_id, 7, 0, &record)]).await.unwrap();
        let chapter = store.list_chapters(novel_id).await.unwrap().remove(0);
        let archived = ChapterRecord {
            reading_status: ReadingStatus::Read,
            started_reading_at: Some(1_000),
            ended_reading_at: Some(2_000),
            ..record
        };
        store.restore_chapter_state(&[(&archived, &chapter)]).await.unwrap();
        store.restore_history(&[(&archived, &chapter)]).await.unwrap();
        store.add_novel_categories(&[NovelCategory { novel_id, category_id: 3 }]).await.unwrap();
        store.upsert_pin(novel_id, true).await.unwrap();
        let mut settings = NovelSettings::from_record(novel_id, &Default::default());
        settings.reverse_order = true;
        store.insert_settings(&settings).await.unwrap();

        store.insert_novel(&NewNovel::from_record(9, &NovelRecord::new("/n/orphan", "O"))).await.unwrap();
        if let Some(fault) = fault {
            store = store.with_fault(fault, StoreErrorKind::Database);
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_exports_minimal_subset() {
        let store = library(None).await;
        let Assembled { tree, stats } = ArchiveBuilder::new(&store, ExportOptions::default()).build().await.unwrap();

        assert_eq!(tree.repositories, vec![RepositoryRecord::new("https://repo.example", "Main")]);
        assert_eq!(tree.categories, vec![CategoryRecord::new("Reading", 0), CategoryRecord::new("Later", 1)]);
        assert_eq!(tree.extensions.len(), 1);
        assert_eq!(tree.extensions[0].id, 7);

        let novel = &tree.extensions[0].novels[0];
        assert_eq!(novel.url, "/n/1");
        assert_eq!(novel.categories, vec![0]);
        assert!(novel.pinned);
        assert!(novel.settings.reverse_order);
        assert_eq!(novel.chapters.len(), 1);
        let chapter = &novel.chapters[0];
        assert_eq!(chapter.reading_status, ReadingStatus::Read);
        assert_eq!((chapter.started_reading_at, chapter.ended_reading_at), (Some(1_000), Some(2_000)));
        assert_eq!(chapter.order, Some(0.0));

        assert_eq!(stats.novels, 1);
        assert_eq!(stats.chapters, 1);
        assert_eq!(stats.missing_extensions, vec![9]);
        assert_eq!(stats.dropped_novels, 1);
    }

    #[tokio::test]
    async fn test_history_failure_exports_chapter_without_dates() {
        let store = library(Some(Fault::GetHistory)).await;
        let Assembled { tree, .. } = ArchiveBuilder::new(&store, ExportOptions::default()).build().await.unwrap();
        let chapter = &tree.extensions[0].novels[0].chapters[0];
        assert_eq!(chapter.started_reading_at, None);
        assert_eq!(chapter.ended_reading_at, None);
        assert_eq!(chapter.reading_status, ReadingStatus::Read);
    }

    #[tokio::test]
    async fn test_category_failure_exports_none() {
        let store = library(Some(Fault::ListCategories)).await;
        let Assembled { tree, stats } = ArchiveBuilder::new(&store, ExportOptions::default()).build().await.unwrap();
        assert!(tree.categories.is_empty());
        assert!(tree.extensions[0].novels[0].categories.is_empty());
        assert_eq!(stats.categories, 0);
    }

    #[tokio::test]
    async fn test_chapters_and_settings_can_be_left_out() {
        let store = library(None).await;
        let options = ExportOptions { include_chapters: false, include_settings: false, ..Default::default() };
        let Assembled { tree, stats } = ArchiveBuilder::new(&store, options).build().await.unwrap();
        let novel = &tree.extensions[0].novels[0];
        assert!(novel.chapters.is_empty());
        assert!(!novel.settings.reverse_order);
        assert_eq!(stats.chapters, 0);
    }

    #[rstest]
    #[case(Fault::ListBookmarked, ErrorKind::Novels)]
    #[case(Fault::ListRepositories, ErrorKind::Repositories)]
    #[case(Fault::ListChapters, ErrorKind::NovelState("/n/1".to_string()))]
    #[case(Fault::IsPinned, ErrorKind::NovelState("/n/1".to_string()))]
    #[tokio::test]
    async fn test_fatal_failures(#[case] fault: Fault, #[case] expected: ErrorKind) {
        let store = library(Some(fault)).await;
        let err = ArchiveBuilder::new(&store, ExportOptions::default()).build().await.unwrap_err();
        assert_eq!(*err, expected);
    }
}
