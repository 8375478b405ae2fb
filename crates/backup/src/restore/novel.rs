use crate::restore::engine::{CategoryMap, Reconciler};
use crate::restore::error::{NovelErrorKind, NovelResult};
use crate::restore::summary::NovelOutcome;
use exn::ResultExt;
use shelf_archive::models::NovelRecord;
use shelf_store::backend::ChapterPair;
use shelf_store::error::ErrorKind as StoreErrorKind;
use shelf_store::models::{NewChapter, NewNovel, NovelCategory, NovelSettings};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::instrument;

impl Reconciler<'_> {
    /// Merge one archived novel into the library.
    ///
    /// A novel that already exists keeps its details; only user state
    /// (chapter progress, history, settings, categories, pin) is applied.
    #[instrument(skip(self, record, categories), fields(url = %record.url))]
    pub(super) async fn restore_novel(
        &self,
        extension_id: i64,
        record: &NovelRecord,
        categories: &CategoryMap,
    ) -> NovelResult<NovelOutcome> {
        let existing =
            self.store.find_novel_id(&record.url, extension_id).await.or_raise(|| NovelErrorKind::Lookup)?;
        let (novel_id, inserted, chapter_insert_failed) = match existing {
            Some(id) => (id, false, false),
            None => {
                let id = self
                    .store
                    .insert_novel(&NewNovel::from_record(extension_id, record))
                    .await
                    .or_raise(|| NovelErrorKind::Insert)?;
                let failed = !self.insert_chapters(id, extension_id, record).await;
                (id, true, failed)
            },
        };

        let chapters = self.restore_chapters(novel_id, record).await?;
        self.restore_settings(novel_id, record).await?;
        self.restore_links(novel_id, record, categories).await?;
        self.restore_pin(novel_id, record).await?;

        Ok(match inserted {
            true => NovelOutcome::Inserted { chapters, chapter_insert_failed },
            false => NovelOutcome::Existing { chapters },
        })
    }

    /// Returns `false` if the chapters could not be inserted. The novel then
    /// stays in the library with whatever chapters the next update fetches.
    async fn insert_chapters(&self, novel_id: i64, extension_id: i64, record: &NovelRecord) -> bool {
        if record.chapters.is_empty() {
            return true;
        }
        let chapters: Vec<_> = record
            .chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| NewChapter::from_record(novel_id, extension_id, index, chapter))
            .collect();
        match self.store.insert_chapters(&chapters).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = ?err, "could not insert chapters");
                false
            },
        }
    }

    /// Apply archived chapter state to the live chapters with the same URL.
    /// Archived chapters the library doesn't have are dropped.
    async fn restore_chapters(&self, novel_id: i64, record: &NovelRecord) -> NovelResult<usize> {
        if record.chapters.is_empty() {
            return Ok(0);
        }
        let live = self.store.list_chapters(novel_id).await.or_raise(|| NovelErrorKind::Chapters)?;
        let by_url: HashMap<&str, _> = live.iter().map(|c| (c.url.as_str(), c)).collect();
        let pairs: Vec<ChapterPair<'_>> =
            record.chapters.iter().filter_map(|r| by_url.get(r.url.as_str()).map(|&c| (r, c))).collect();
        let dropped = record.chapters.len() - pairs.len();
        if dropped > 0 {
            tracing::debug!(dropped, "archived chapters not found in library");
        }
        if pairs.is_empty() {
            return Ok(0);
        }
        self.store.restore_chapter_state(&pairs).await.or_raise(|| NovelErrorKind::Chapters)?;
        self.store.restore_history(&pairs).await.or_raise(|| NovelErrorKind::History)?;
        Ok(pairs.len())
    }

    async fn restore_settings(&self, novel_id: i64, record: &NovelRecord) -> NovelResult<()> {
        let settings = NovelSettings::from_record(novel_id, &record.settings);
        let current = self.store.get_settings(novel_id).await.or_raise(|| NovelErrorKind::Settings)?;
        match current {
            Some(current) if current == settings => Ok(()),
            Some(_) => self.store.update_settings(&settings).await.or_raise(|| NovelErrorKind::Settings),
            None => self.store.insert_settings(&settings).await.or_raise(|| NovelErrorKind::Settings),
        }
    }

    /// Link the novel to the archived categories it is not already in.
    async fn restore_links(&self, novel_id: i64, record: &NovelRecord, categories: &CategoryMap) -> NovelResult<()> {
        let wanted: BTreeSet<i64> = record
            .categories
            .iter()
            .filter_map(|order| {
                let id = categories.get(order).copied();
                if id.is_none() {
                    tracing::debug!(order, "novel refers to an unknown category");
                }
                id
            })
            .collect();
        if wanted.is_empty() {
            return Ok(());
        }
        let current: HashSet<i64> = self
            .store
            .list_novel_categories(novel_id)
            .await
            .or_raise(|| NovelErrorKind::Categories)?
            .into_iter()
            .map(|l| l.category_id)
            .collect();
        let links: Vec<_> = wanted
            .into_iter()
            .filter(|id| !current.contains(id))
            .map(|category_id| NovelCategory { novel_id, category_id })
            .collect();
        if links.is_empty() {
            return Ok(());
        }
        self.store.add_novel_categories(&links).await.or_raise(|| NovelErrorKind::Categories)
    }

    async fn restore_pin(&self, novel_id: i64, record: &NovelRecord) -> NovelResult<()> {
        if !record.pinned {
            return Ok(());
        }
        match self.store.upsert_pin(novel_id, true).await {
            Ok(()) => Ok(()),
            Err(err) if *err == StoreErrorKind::Constraint => {
                tracing::debug!("pin already present");
                Ok(())
            },
            Err(err) => Err(err.raise(NovelErrorKind::Pin)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::RestoreOptions;
    use crate::source::{LocalSource, SourceHandle};
    use rstest::rstest;
    use shelf_archive::models::{ChapterRecord, NovelSettingRecord, ReadingStatus};
    use shelf_store::{
        ChapterStore, Fault, HistoryStore, MockStore, NovelCategoryStore, NovelStore, PinStore, SettingsStore,
        StoreHandle,
    };
    use std::sync::Arc;

    struct Fixture {
        mock: Arc<MockStore>,
        store: StoreHandle,
        source: SourceHandle,
        options: RestoreOptions,
    }

    impl Fixture {
        fn new(store: MockStore) -> Self {
            let mock = Arc::new(store);
            let store: StoreHandle = mock.clone();
            let source: SourceHandle = Arc::new(LocalSource::new(store.clone()));
            Self { mock, store, source, options: RestoreOptions::default() }
        }

        fn reconciler(&self) -> Reconciler<'_> {
            Reconciler::new(&self.store, &self.source, &self.options)
        }
    }

    fn record() -> NovelRecord {
        let mut novel = NovelRecord::new("/n/1", "Archived");
        let mut first = ChapterRecord::new("/c/1", "One");
        first.reading_status = ReadingStatus::Read;
        first.reading_position = 1.0;
        first.started_reading_at = Some(1_000);
        first.ended_reading_at = Some(2_000);
        let mut second = ChapterRecord::new("/c/2", "Two");
        second.bookmarked = true;
        novel.chapters = vec![first, second];
        novel.categories = vec![0, 3];
        novel.settings = NovelSettingRecord { reverse_order: true, ..Default::default() };
        novel.pinned = true;
        novel
    }

    fn categories() -> CategoryMap {
        CategoryMap::from([(0, 100), (3, 101)])
    }

    #[tokio::test]
    async fn test_new_novel_is_inserted_with_state() {
        let fixture = Fixture::new(MockStore::default());
        let outcome = fixture.reconciler().restore_novel(7, &record(), &categories()).await.unwrap();
        assert_eq!(outcome, NovelOutcome::Inserted { chapters: 2, chapter_insert_failed: false });

        let novel_id = fixture.mock.find_novel_id("/n/1", 7).await.unwrap().unwrap();
        let chapters = fixture.mock.list_chapters(novel_id).await.unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].reading_status, ReadingStatus::Read);
        assert!(chapters[1].bookmarked);

        let history = fixture.mock.get_history(chapters[0].id).await.unwrap().unwrap();
        assert_eq!((history.started_reading_at, history.ended_reading_at), (1_000, Some(2_000)));
        assert!(fixture.mock.get_history(chapters[1].id).await.unwrap().is_none());

        assert!(fixture.mock.get_settings(novel_id).await.unwrap().unwrap().reverse_order);
        let links = fixture.mock.list_novel_categories(novel_id).await.unwrap();
        assert_eq!(links.iter().map(|l| l.category_id).collect::<Vec<_>>(), vec![100, 101]);
        assert!(fixture.mock.is_pinned(novel_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_novel_keeps_local_state() {
        let fixture = Fixture::new(MockStore::default());
        let novel_id = fixture
            .mock
            .insert_novel(&NewNovel::from_record(7, &NovelRecord::new("/n/1", "Local")))
            .await
            .unwrap();
        let local = [ChapterRecord::new("/c/1", "Local One")];
        let chapters: Vec<_> =
            local.iter().enumerate().map(|(i, c)| NewChapter::from_record(novel_id, 7, i, c)).collect();
        fixture.mock.insert_chapters(&chapters).await.unwrap();
        let chapter_id = fixture.mock.list_chapters(novel_id).await.unwrap()[0].id;
        fixture.mock.set_progress(chapter_id, ReadingStatus::Reading, 0.3).await;

        let outcome = fixture.reconciler().restore_novel(7, &record(), &categories()).await.unwrap();
        // "/c/2" is not in the library and is dropped.
        assert_eq!(outcome, NovelOutcome::Existing { chapters: 1 });

        let novel = fixture.mock.get_novel(novel_id).await.unwrap().unwrap();
        assert_eq!(novel.details.title, "Local");
        let chapters = fixture.mock.list_chapters(novel_id).await.unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!((chapters[0].reading_status, chapters[0].reading_position), (ReadingStatus::Reading, 0.3));
    }

    #[tokio::test]
    async fn test_links_are_added_once() {
        let fixture = Fixture::new(MockStore::default());
        let reconciler = fixture.reconciler();
        reconciler.restore_novel(7, &record(), &categories()).await.unwrap();
        reconciler.restore_novel(7, &record(), &categories()).await.unwrap();
        let novel_id = fixture.mock.find_novel_id("/n/1", 7).await.unwrap().unwrap();
        assert_eq!(fixture.mock.list_novel_categories(novel_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_local_links_are_kept() {
        let fixture = Fixture::new(MockStore::default());
        let novel_id = fixture
            .mock
            .insert_novel(&NewNovel::from_record(7, &NovelRecord::new("/n/1", "Local")))
            .await
            .unwrap();
        fixture.mock.add_novel_categories(&[NovelCategory { novel_id, category_id: 55 }]).await.unwrap();

        let mut uncategorized = record();
        uncategorized.categories.clear();
        fixture.reconciler().restore_novel(7, &uncategorized, &categories()).await.unwrap();
        let links = fixture.mock.list_novel_categories(novel_id).await.unwrap();
        assert_eq!(links.iter().map(|l| l.category_id).collect::<Vec<_>>(), vec![55]);

        fixture.reconciler().restore_novel(7, &record(), &categories()).await.unwrap();
        let mut linked: Vec<_> =
            fixture.mock.list_novel_categories(novel_id).await.unwrap().into_iter().map(|l| l.category_id).collect();
        linked.sort_unstable();
        assert_eq!(linked, vec![55, 100, 101]);
    }

    #[tokio::test]
    async fn test_chapter_insert_failure_keeps_novel() {
        let fixture = Fixture::new(MockStore::default().with_fault(Fault::InsertChapters, StoreErrorKind::Database));
        let outcome = fixture.reconciler().restore_novel(7, &record(), &categories()).await.unwrap();
        assert_eq!(outcome, NovelOutcome::Inserted { chapters: 0, chapter_insert_failed: true });
        assert_eq!(fixture.mock.all_novels().await.len(), 1);
    }

    #[tokio::test]
    async fn test_pin_constraint_is_ignored() {
        let fixture = Fixture::new(MockStore::default().with_fault(Fault::UpsertPin, StoreErrorKind::Constraint));
        let outcome = fixture.reconciler().restore_novel(7, &record(), &categories()).await;
        assert!(outcome.is_ok());
    }

    #[rstest]
    #[case(Fault::FindNovel("/n/1".to_string()), NovelErrorKind::Lookup)]
    #[case(Fault::InsertNovel("/n/1".to_string()), NovelErrorKind::Insert)]
    #[case(Fault::RestoreChapterState, NovelErrorKind::Chapters)]
    #[case(Fault::RestoreHistory, NovelErrorKind::History)]
    #[case(Fault::WriteSettings("/n/1".to_string()), NovelErrorKind::Settings)]
    #[case(Fault::AddNovelCategories, NovelErrorKind::Categories)]
    #[case(Fault::UpsertPin, NovelErrorKind::Pin)]
    #[tokio::test]
    async fn test_step_failures(#[case] fault: Fault, #[case] expected: NovelErrorKind) {
        let fixture = Fixture::new(MockStore::default().with_fault(fault, StoreErrorKind::Database));
        let err = fixture.reconciler().restore_novel(7, &record(), &categories()).await.unwrap_err();
        assert_eq!(*err, expected);
    }
}
