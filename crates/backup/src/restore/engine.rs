use crate::restore::RestoreOptions;
use crate::restore::error::{ErrorKind, Result};
use crate::restore::summary::{
    CategoryStats, ExtensionStatus, ListingOutcome, ListingReport, RepositoryOutcome,
};
use crate::source::{SourceHandle, TaskState};
use crate::wait::{WaitOutcome, wait_until_terminal};
use exn::ResultExt;
use shelf_archive::models::{CategoryRecord, RepositoryRecord};
use shelf_archive::{RecordTree, Validator, VersionTag};
use shelf_store::StoreHandle;
use shelf_store::error::ErrorKind as StoreErrorKind;
use shelf_store::models::AvailableExtension;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// Archived category order to live category id.
pub(super) type CategoryMap = HashMap<i32, i64>;

/// The extension listing, by catalog id.
pub(super) struct Listing {
    pub(super) report: ListingReport,
    extensions: HashMap<i64, AvailableExtension>,
}

/// Shared state of the reconciliation stages.
pub(super) struct Reconciler<'a> {
    pub(super) store: &'a StoreHandle,
    source: &'a SourceHandle,
    pub(super) options: &'a RestoreOptions,
}

impl<'a> Reconciler<'a> {
    pub(super) fn new(store: &'a StoreHandle, source: &'a SourceHandle, options: &'a RestoreOptions) -> Self {
        Self { store, source, options }
    }

    /// Remove the envelope around the archive bytes.
    pub(super) fn open<'b>(&self, bytes: &'b [u8]) -> Result<Cow<'b, [u8]>> {
        let envelope = self.options.envelope.unwrap_or_else(|| shelf_archive::Envelope::sniff(bytes));
        tracing::debug!(%envelope, "opening archive");
        envelope.open(bytes).map_err(|err| {
            let kind = ErrorKind::from(&*err);
            err.raise(kind)
        })
    }

    /// Pass 1: check the version tag without decoding the records.
    pub(super) fn validate(&self, container: &[u8]) -> Result<VersionTag> {
        Validator::new(self.options.supported).validate(container).map_err(|err| {
            let kind = ErrorKind::from(&*err);
            err.raise(kind)
        })
    }

    pub(super) fn decode(&self, container: &[u8]) -> Result<RecordTree> {
        shelf_archive::decode_tree(container).or_raise(|| ErrorKind::Archive)
    }

    /// Match archived categories to live ones by name, creating the missing
    /// ones in ascending archived order.
    #[instrument(skip_all, fields(count = records.len()))]
    pub(super) async fn restore_categories(&self, records: &[CategoryRecord]) -> Result<(CategoryMap, CategoryStats)> {
        let live = self.store.list_categories().await.or_raise(|| ErrorKind::Categories)?;
        let mut ids: HashMap<String, i64> = live.into_iter().map(|c| (c.name, c.id)).collect();
        let mut sorted: Vec<&CategoryRecord> = records.iter().collect();
        sorted.sort_by_key(|c| c.order);

        let mut map = CategoryMap::with_capacity(records.len());
        let mut stats = CategoryStats::default();
        for record in sorted {
            let id = match ids.get(&record.name) {
                Some(&id) => {
                    stats.reused += 1;
                    id
                },
                None => {
                    let category = self.store.add_category(&record.name).await.or_raise(|| ErrorKind::Categories)?;
                    stats.created += 1;
                    ids.insert(category.name, category.id);
                    category.id
                },
            };
            map.insert(record.order, id);
        }
        tracing::info!(reused = stats.reused, created = stats.created, "categories restored");
        Ok((map, stats))
    }

    /// Normalized URLs of the repositories already configured. Failing to
    /// list them only means duplicates are found the hard way.
    pub(super) async fn known_repositories(&self) -> HashSet<String> {
        match self.store.list_repositories().await {
            Ok(repositories) => repositories.into_iter().map(|r| r.url).collect(),
            Err(err) => {
                tracing::warn!(error = ?err, "could not list repositories");
                HashSet::new()
            },
        }
    }

    #[instrument(skip(self, known, record), fields(url = %record.url))]
    pub(super) async fn restore_repository(
        &self,
        known: &mut HashSet<String>,
        record: &RepositoryRecord,
    ) -> RepositoryOutcome {
        let key = record.key();
        if known.contains(&key) {
            return RepositoryOutcome::AlreadyPresent;
        }
        match self.store.add_repository(&key, &record.name).await {
            Ok(_) => {
                known.insert(key);
                RepositoryOutcome::Added
            },
            Err(err) if *err == StoreErrorKind::Constraint => {
                tracing::debug!("repository already present");
                known.insert(key);
                RepositoryOutcome::AlreadyPresent
            },
            Err(err) => {
                tracing::warn!(error = ?err, "could not add repository");
                RepositoryOutcome::Failed
            },
        }
    }

    /// Refresh the extension listing and load it.
    ///
    /// Only failing to load the listing is fatal; a refresh that fails or
    /// takes too long is reported and the current listing is used.
    #[instrument(skip(self))]
    pub(super) async fn refresh_listing(&self) -> Result<Listing> {
        let outcome = self.await_refresh().await;
        let available = self.store.list_available_extensions().await.or_raise(|| ErrorKind::Listing)?;
        let report = ListingReport { outcome, available: available.len() };
        tracing::info!(%outcome, available = report.available, "extension listing loaded");
        Ok(Listing { report, extensions: available.into_iter().map(|e| (e.id, e)).collect() })
    }

    async fn await_refresh(&self) -> ListingOutcome {
        if let Err(err) = self.source.refresh().await {
            tracing::warn!(error = ?err, "could not refresh extension listing");
            return ListingOutcome::Unavailable;
        }
        let waited =
            wait_until_terminal(self.source.as_ref(), self.options.poll_interval, self.options.refresh_timeout).await;
        match waited {
            Ok(WaitOutcome::Finished(TaskState::Succeeded)) => ListingOutcome::Refreshed,
            Ok(WaitOutcome::Finished(state)) => {
                tracing::warn!(%state, "extension listing refresh did not succeed");
                ListingOutcome::Ended(state)
            },
            Ok(WaitOutcome::TimedOut { .. }) => ListingOutcome::TimedOut,
            Err(err) => {
                tracing::warn!(error = ?err, "could not follow extension listing refresh");
                ListingOutcome::Unavailable
            },
        }
    }

    /// Make sure an archived extension is installed before restoring its
    /// novels.
    #[instrument(skip(self, listing))]
    pub(super) async fn prepare_extension(&self, listing: &Listing, id: i64) -> std::result::Result<(), ExtensionStatus> {
        let Some(extension) = listing.extensions.get(&id) else {
            tracing::warn!("extension is not advertised by any configured repository, skipping its novels");
            return Err(ExtensionStatus::Unresolved);
        };
        match self.store.is_extension_installed(id).await {
            Ok(true) => {
                tracing::debug!("extension already installed");
                return Ok(());
            },
            Ok(false) => {},
            Err(err) => tracing::warn!(error = ?err, "could not check installed extensions, installing"),
        }
        match self.source.install(extension).await {
            Ok(flags) => {
                tracing::info!(name = %extension.name, replaced = flags.replaced, "extension installed");
                Ok(())
            },
            Err(err) => {
                tracing::warn!(error = ?err, "could not install extension, skipping its novels");
                Err(ExtensionStatus::InstallFailed)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LocalSource;
    use shelf_store::{CategoryStore, ExtensionStore, Fault, MockStore, RepositoryStore};
    use std::sync::Arc;

    fn handles(store: MockStore) -> (Arc<MockStore>, StoreHandle, SourceHandle) {
        let mock = Arc::new(store);
        let store: StoreHandle = mock.clone();
        let source: SourceHandle = Arc::new(LocalSource::new(store.clone()));
        (mock, store, source)
    }

    #[tokio::test]
    async fn test_categories_are_additive() {
        let (mock, store, source) = handles(MockStore::default().with_category("Reading", 0));
        let options = RestoreOptions::default();
        let reconciler = Reconciler::new(&store, &source, &options);
        let records = vec![CategoryRecord::new("Later", 5), CategoryRecord::new("Reading", 2)];
        let (map, stats) = reconciler.restore_categories(&records).await.unwrap();

        let live = mock.list_categories().await.unwrap();
        let names: Vec<_> = live.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Reading", "Later"]);
        assert_eq!(stats, CategoryStats { reused: 1, created: 1 });
        assert_eq!(map[&2], live[0].id);
        assert_eq!(map[&5], live[1].id);
    }

    #[tokio::test]
    async fn test_category_failure_is_fatal() {
        let (_, store, source) =
            handles(MockStore::default().with_fault(Fault::AddCategory("Later".to_string()), StoreErrorKind::Database));
        let options = RestoreOptions::default();
        let reconciler = Reconciler::new(&store, &source, &options);
        let err = reconciler.restore_categories(&[CategoryRecord::new("Later", 0)]).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Categories);
    }

    #[tokio::test]
    async fn test_repository_duplicates_are_not_errors() {
        let (mock, store, source) = handles(
            MockStore::default()
                .with_repository("https://repo.example", "Main")
                .with_fault(Fault::AddRepository("https://broken.example".to_string()), StoreErrorKind::Database),
        );
        let options = RestoreOptions::default();
        let reconciler = Reconciler::new(&store, &source, &options);
        let mut known = reconciler.known_repositories().await;

        let outcomes = [
            reconciler.restore_repository(&mut known, &RepositoryRecord::new("https://repo.example/", "Main")).await,
            reconciler.restore_repository(&mut known, &RepositoryRecord::new("https://new.example", "New")).await,
            reconciler.restore_repository(&mut known, &RepositoryRecord::new("https://new.example/", "New")).await,
            reconciler.restore_repository(&mut known, &RepositoryRecord::new("https://broken.example", "B")).await,
        ];
        assert_eq!(
            outcomes,
            [
                RepositoryOutcome::AlreadyPresent,
                RepositoryOutcome::Added,
                RepositoryOutcome::AlreadyPresent,
                RepositoryOutcome::Failed
            ]
        );
        assert_eq!(mock.list_repositories().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_repository_constraint_counts_as_present() {
        // Listing fails, so the duplicate is only noticed by the store.
        let (_, store, source) = handles(
            MockStore::default()
                .with_repository("https://repo.example", "Main")
                .with_fault(Fault::ListRepositories, StoreErrorKind::Database),
        );
        let options = RestoreOptions::default();
        let reconciler = Reconciler::new(&store, &source, &options);
        let mut known = reconciler.known_repositories().await;
        assert!(known.is_empty());
        let outcome =
            reconciler.restore_repository(&mut known, &RepositoryRecord::new("https://repo.example", "Main")).await;
        assert_eq!(outcome, RepositoryOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let (_, store, source) = handles(MockStore::default().with_fault(Fault::ListAvailable, StoreErrorKind::Database));
        let options = RestoreOptions::default();
        let reconciler = Reconciler::new(&store, &source, &options);
        let err = reconciler.refresh_listing().await.err().unwrap();
        assert_eq!(*err, ErrorKind::Listing);
    }

    #[tokio::test]
    async fn test_extension_preparation() {
        let (mock, store, source) = handles(
            MockStore::default()
                .with_available(7, 1, "Seven")
                .with_available(8, 1, "Eight")
                .with_fault(Fault::RecordInstalled(8), StoreErrorKind::Database),
        );
        let options = RestoreOptions::default();
        let reconciler = Reconciler::new(&store, &source, &options);
        let listing = reconciler.refresh_listing().await.unwrap();
        assert_eq!(listing.report, ListingReport { outcome: ListingOutcome::Refreshed, available: 2 });

        assert_eq!(reconciler.prepare_extension(&listing, 7).await, Ok(()));
        assert_eq!(reconciler.prepare_extension(&listing, 7).await, Ok(()));
        assert_eq!(reconciler.prepare_extension(&listing, 8).await, Err(ExtensionStatus::InstallFailed));
        assert_eq!(reconciler.prepare_extension(&listing, 9).await, Err(ExtensionStatus::Unresolved));
        assert_eq!(mock.list_installed_extensions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pass_one_errors() {
        let (_, store, source) = handles(MockStore::default());
        let options = RestoreOptions::default();
        let reconciler = Reconciler::new(&store, &source, &options);
        assert_eq!(*reconciler.validate(b"not an archive").unwrap_err(), ErrorKind::Archive);

        let newer = shelf_archive::encode(&RecordTree::default(), VersionTag::new(2, 0, 0), Default::default()).unwrap();
        let err = reconciler.validate(&newer).unwrap_err();
        assert!(matches!(*err, ErrorKind::IncompatibleVersion { .. }));

        let older = shelf_archive::encode(&RecordTree::default(), VersionTag::new(1, 0, 3), Default::default()).unwrap();
        assert_eq!(reconciler.validate(&older).unwrap(), VersionTag::new(1, 0, 3));
    }
}
