//! Merging an archive back into a live library.
//!
//! A restore runs in two passes. The first only reads the archive's version
//! tag and refuses anything written by a different major version. The
//! second decodes the record tree and reconciles it stage by stage (see the
//! [crate documentation](crate)). Every write is additive: nothing that
//! exists locally is ever deleted, and local edits to novels and reading
//! progress win over the archive.

mod engine;
pub mod error;
mod novel;
mod stream;
mod summary;

pub use self::stream::{RestoreEvent, restore, restore_archive};
pub use self::summary::{
    CategoryStats, ExtensionStatus, ExtensionSummary, ListingOutcome, ListingReport, NovelOutcome, RepositoryOutcome,
    RepositoryReport, RepositoryStats, RestoreSummary,
};
use shelf_archive::{CURRENT_VERSION, Envelope, VersionTag};
use std::time::Duration;

/// Longest pause allowed between two novels.
pub const MAX_PACING: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Envelope around the archive bytes; guessed from the bytes if `None`.
    pub envelope: Option<Envelope>,
    /// Pause between two novels, capped at [`MAX_PACING`].
    pub pacing: Duration,
    /// How often to check on the extension listing refresh.
    pub poll_interval: Duration,
    /// How long to wait for the extension listing refresh.
    pub refresh_timeout: Duration,
    /// Archives must share this version's major component.
    pub supported: VersionTag,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            envelope: None,
            pacing: Duration::ZERO,
            poll_interval: Duration::from_millis(250),
            refresh_timeout: Duration::from_secs(60),
            supported: CURRENT_VERSION,
        }
    }
}
