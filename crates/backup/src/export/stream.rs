use crate::error::{ErrorKind as BackupErrorKind, Result as BackupResult};
use crate::export::builder::{ArchiveBuilder, Assembled, ExportStats};
use crate::export::error::{ErrorKind, Result};
use crate::export::ExportOptions;
use async_stream::try_stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use shelf_archive::{CURRENT_VERSION, VersionTag};
use shelf_store::StoreHandle;

/// Progress events emitted by [`export`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started)
/// 2. [`NovelsLoaded`](Self::NovelsLoaded), with the number of bookmarked
///    novels (including those that will be left out).
/// 3. [`ExtensionsResolved`](Self::ExtensionsResolved)
/// 4. [`CategoriesCollected`](Self::CategoriesCollected)
/// 5. [`RepositoriesCollected`](Self::RepositoriesCollected)
/// 6. [`Encoded`](Self::Encoded)
/// 7. [`Complete`](Self::Complete), carrying the archive.
///
/// Each is emitted exactly once. An error terminates the stream early, in
/// which case [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum ExportEvent {
    Started,
    NovelsLoaded(usize),
    ExtensionsResolved { found: usize, missing: usize },
    CategoriesCollected(usize),
    RepositoriesCollected(usize),
    Encoded { bytes: usize },
    Complete(ExportedArchive),
}

/// An encoded archive, envelope applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedArchive {
    pub bytes: Vec<u8>,
    pub version: VersionTag,
    pub stats: ExportStats,
}

/// Streams [`ExportEvent`]s while exporting the library behind `store`.
pub fn export<'a>(
    store: &'a StoreHandle,
    options: ExportOptions,
) -> impl Stream<Item = BackupResult<ExportEvent>> + 'a {
    // `rustfmt` does not format macro-specific syntax such as `for await`.
    async_stream::stream! {
        for await event in export_inner(store, options) {
            yield event.or_raise(|| BackupErrorKind::Export);
        }
    }
}

fn export_inner<'a>(store: &'a StoreHandle, options: ExportOptions) -> impl Stream<Item = Result<ExportEvent>> + 'a {
    try_stream!({
        yield ExportEvent::Started;
        let builder = ArchiveBuilder::new(store, options);

        let novels = builder.load_novels().await?;
        yield ExportEvent::NovelsLoaded(novels.len());

        let resolved = builder.resolve_extensions(&novels).await;
        yield ExportEvent::ExtensionsResolved { found: resolved.extensions.len(), missing: resolved.missing.len() };

        let categories = builder.collect_categories().await;
        yield ExportEvent::CategoriesCollected(categories.len());

        let repositories = builder.collect_repositories(&resolved.extensions).await?;
        yield ExportEvent::RepositoriesCollected(repositories.len());

        let Assembled { tree, stats } = builder.assemble(novels, resolved, categories, repositories).await?;
        let encoded = shelf_archive::encode(&tree, CURRENT_VERSION, options.compression).or_raise(|| ErrorKind::Encode)?;
        drop(tree);
        let bytes = options.envelope.seal(encoded);
        tracing::info!(bytes = bytes.len(), novels = stats.novels, "archive encoded");
        yield ExportEvent::Encoded { bytes: bytes.len() };

        yield ExportEvent::Complete(ExportedArchive { bytes, version: CURRENT_VERSION, stats });
    })
}

/// Export the library behind `store`, returning the finished archive.
pub async fn export_archive(store: &StoreHandle, options: ExportOptions) -> BackupResult<ExportedArchive> {
    let mut events = std::pin::pin!(export(store, options));
    while let Some(event) = events.next().await {
        if let ExportEvent::Complete(archive) = event? {
            return Ok(archive);
        }
    }
    exn::bail!(BackupErrorKind::Export)
}
