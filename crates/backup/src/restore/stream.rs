use crate::error::{ErrorKind as BackupErrorKind, Result as BackupResult};
use crate::restore::engine::Reconciler;
use crate::restore::error::Result;
use crate::restore::summary::{
    CategoryStats, ExtensionStatus, ExtensionSummary, ListingReport, NovelOutcome, RepositoryReport, RepositoryStats,
    RestoreSummary,
};
use crate::restore::{MAX_PACING, RestoreOptions};
use crate::source::SourceHandle;
use async_stream::try_stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use shelf_archive::VersionTag;
use shelf_store::StoreHandle;

/// Progress events emitted by [`restore`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started)
/// 2. [`Validated`](Self::Validated), once the version tag was accepted.
/// 3. [`Decoded`](Self::Decoded)
/// 4. [`CategoriesRestored`](Self::CategoriesRestored)
/// 5. [`RepositoryRestored`](Self::RepositoryRestored), once per archived
///    repository.
/// 6. [`ListingRefreshed`](Self::ListingRefreshed)
/// 7. For each archived extension, [`ExtensionStarted`](Self::ExtensionStarted)
///    followed by either [`ExtensionSkipped`](Self::ExtensionSkipped) or one
///    [`NovelRestored`](Self::NovelRestored) per archived novel.
/// 8. [`Complete`](Self::Complete)
///
/// An error terminates the stream early. If it happens before
/// [`Validated`](Self::Validated) the library was not touched.
#[derive(Clone, Debug, PartialEq)]
pub enum RestoreEvent {
    Started,
    Validated(VersionTag),
    Decoded { extensions: usize, novels: usize },
    CategoriesRestored(CategoryStats),
    RepositoryRestored(RepositoryReport),
    ListingRefreshed(ListingReport),
    ExtensionStarted { id: i64 },
    ExtensionSkipped { id: i64, reason: ExtensionStatus },
    NovelRestored { url: String, outcome: NovelOutcome },
    Complete(RestoreSummary),
}

/// Streams [`RestoreEvent`]s while merging the archive in `bytes` into the
/// library behind `store`.
pub fn restore<'a>(
    store: &'a StoreHandle,
    source: &'a SourceHandle,
    bytes: &'a [u8],
    options: RestoreOptions,
) -> impl Stream<Item = BackupResult<RestoreEvent>> + 'a {
    // `rustfmt` does not format macro-specific syntax such as `for await`.
    async_stream::stream! {
        for await event in restore_inner(store, source, bytes, options) {
            yield event.or_raise(|| BackupErrorKind::Restore);
        }
    }
}

fn restore_inner<'a>(
    store: &'a StoreHandle,
    source: &'a SourceHandle,
    bytes: &'a [u8],
    options: RestoreOptions,
) -> impl Stream<Item = Result<RestoreEvent>> + 'a {
    try_stream!({
        yield RestoreEvent::Started;
        let reconciler = Reconciler::new(store, source, &options);

        let container = reconciler.open(bytes)?;
        let version = reconciler.validate(&container)?;
        yield RestoreEvent::Validated(version);

        let tree = reconciler.decode(&container)?;
        drop(container);
        yield RestoreEvent::Decoded { extensions: tree.extensions.len(), novels: tree.novel_count() };

        let (categories, category_stats) = reconciler.restore_categories(&tree.categories).await?;
        yield RestoreEvent::CategoriesRestored(category_stats);

        let mut known = reconciler.known_repositories().await;
        let mut repositories = RepositoryStats::default();
        for record in &tree.repositories {
            let outcome = reconciler.restore_repository(&mut known, record).await;
            repositories.record(outcome);
            yield RestoreEvent::RepositoryRestored(RepositoryReport { url: record.key(), outcome });
        }

        let listing = reconciler.refresh_listing().await?;
        yield RestoreEvent::ListingRefreshed(listing.report);

        let pacing = options.pacing.min(MAX_PACING);
        let mut attempted = 0usize;
        let mut extensions = Vec::with_capacity(tree.extensions.len());
        for extension in &tree.extensions {
            yield RestoreEvent::ExtensionStarted { id: extension.id };
            if let Err(reason) = reconciler.prepare_extension(&listing, extension.id).await {
                extensions.push(ExtensionSummary::skipped(extension.id, reason, extension.novels.len()));
                yield RestoreEvent::ExtensionSkipped { id: extension.id, reason };
                continue;
            }

            let mut summary = ExtensionSummary::restored(extension.id);
            for novel in &extension.novels {
                if attempted > 0 && !pacing.is_zero() {
                    tokio::time::sleep(pacing).await;
                }
                attempted += 1;
                let outcome = match reconciler.restore_novel(extension.id, novel, &categories).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        tracing::warn!(url = %novel.url, error = ?err, "could not restore novel, skipping");
                        NovelOutcome::Failed(*err)
                    },
                };
                summary.record(&outcome);
                yield RestoreEvent::NovelRestored { url: novel.url.clone(), outcome };
            }
            extensions.push(summary);
        }

        let summary = RestoreSummary {
            version,
            categories: category_stats,
            repositories,
            listing: listing.report,
            extensions,
        };
        tracing::info!(%summary, "restore finished");
        yield RestoreEvent::Complete(summary);
    })
}

/// Merge the archive in `bytes` into the library behind `store`, returning
/// what was restored.
pub async fn restore_archive(
    store: &StoreHandle,
    source: &SourceHandle,
    bytes: &[u8],
    options: RestoreOptions,
) -> BackupResult<RestoreSummary> {
    let mut events = std::pin::pin!(restore(store, source, bytes, options));
    while let Some(event) = events.next().await {
        if let RestoreEvent::Complete(summary) = event? {
            return Ok(summary);
        }
    }
    exn::bail!(BackupErrorKind::Restore)
}
