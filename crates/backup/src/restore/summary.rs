use crate::restore::error::NovelErrorKind;
use crate::source::TaskState;
use derive_more::Display;
use shelf_archive::VersionTag;
use std::fmt::{Formatter, Result as FmtResult};

/// Archived categories matched to live ones by name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub reused: usize,
    pub created: usize,
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum RepositoryOutcome {
    #[display("added")]
    Added,
    #[display("already present")]
    AlreadyPresent,
    #[display("failed")]
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryReport {
    pub url: String,
    pub outcome: RepositoryOutcome,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub added: usize,
    pub existing: usize,
    pub failed: usize,
}

impl RepositoryStats {
    pub(super) fn record(&mut self, outcome: RepositoryOutcome) {
        match outcome {
            RepositoryOutcome::Added => self.added += 1,
            RepositoryOutcome::AlreadyPresent => self.existing += 1,
            RepositoryOutcome::Failed => self.failed += 1,
        }
    }
}

/// How the extension listing refresh went. Anything but
/// [`Refreshed`](Self::Refreshed) means extensions were resolved against the
/// listing as it stood before the restore.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ListingOutcome {
    #[display("refreshed")]
    Refreshed,
    /// The refresh finished without succeeding.
    #[display("refresh ended as {_0}")]
    Ended(TaskState),
    #[display("refresh timed out")]
    TimedOut,
    /// The refresh could not be started or its state could not be read.
    #[display("refresh unavailable")]
    Unavailable,
}

impl ListingOutcome {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Refreshed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListingReport {
    pub outcome: ListingOutcome,
    /// Number of extensions in the listing used for the restore.
    pub available: usize,
}

/// What happened to a single archived novel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NovelOutcome {
    /// The novel was new to this library and was inserted.
    Inserted {
        /// Archived chapters whose state was applied.
        chapters: usize,
        /// Inserting the novel's chapters failed; the novel itself is there.
        chapter_insert_failed: bool,
    },
    /// The novel already existed; only user state was applied.
    Existing { chapters: usize },
    Failed(NovelErrorKind),
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ExtensionStatus {
    #[display("restored")]
    Restored,
    /// Not advertised by any configured repository.
    #[display("not in extension listing")]
    Unresolved,
    #[display("installation failed")]
    InstallFailed,
}

/// Per-extension novel counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionSummary {
    pub id: i64,
    pub status: ExtensionStatus,
    pub inserted: usize,
    pub existing: usize,
    pub failed: usize,
    /// Novels never attempted because the extension could not be used.
    pub skipped: usize,
}

impl ExtensionSummary {
    pub(super) fn restored(id: i64) -> Self {
        Self { id, status: ExtensionStatus::Restored, inserted: 0, existing: 0, failed: 0, skipped: 0 }
    }

    pub(super) fn skipped(id: i64, status: ExtensionStatus, novels: usize) -> Self {
        Self { id, status, inserted: 0, existing: 0, failed: 0, skipped: novels }
    }

    pub(super) fn record(&mut self, outcome: &NovelOutcome) {
        match outcome {
            NovelOutcome::Inserted { .. } => self.inserted += 1,
            NovelOutcome::Existing { .. } => self.existing += 1,
            NovelOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Result of a restore that ran to the end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreSummary {
    pub version: VersionTag,
    pub categories: CategoryStats,
    pub repositories: RepositoryStats,
    pub listing: ListingReport,
    pub extensions: Vec<ExtensionSummary>,
}

impl RestoreSummary {
    pub fn inserted(&self) -> usize {
        self.extensions.iter().map(|e| e.inserted).sum()
    }

    pub fn existing(&self) -> usize {
        self.extensions.iter().map(|e| e.existing).sum()
    }

    /// Archived novels that are not (or not fully) in the library: failed
    /// ones and those of unusable extensions.
    pub fn skipped(&self) -> usize {
        self.extensions.iter().map(|e| e.failed + e.skipped).sum()
    }

    /// Returns `true` if every archived novel was restored.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped() == 0
    }
}

impl std::fmt::Display for RestoreSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "archive {}: {} novel(s) inserted, {} already present, {} skipped; {} categor{} created; listing {}",
            self.version,
            self.inserted(),
            self.existing(),
            self.skipped(),
            self.categories.created,
            if self.categories.created == 1 { "y" } else { "ies" },
            self.listing.outcome,
        )
    }
}
