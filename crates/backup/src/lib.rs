//! Backup and restore of a shelf library.
//!
//! [`export`] walks the live library and writes everything a bookmarked
//! novel depends on into a versioned archive. [`restore`] checks an archive's
//! version, then merges its records back into a (possibly non-empty) library
//! in a fixed order:
//!
//! 1. categories
//! 2. repositories
//! 3. extension listing refresh
//! 4. extensions, then each of their novels
//!
//! Records are matched by natural keys (URLs, names, catalog ids), so the
//! same archive can be restored twice without creating duplicates. A single
//! broken novel is recorded in the [`RestoreSummary`](restore::RestoreSummary)
//! and skipped; only a handful of failures end a restore early.
//!
//! Both directions are exposed as streams of progress events and as plain
//! async functions ([`export::export_archive`], [`restore::restore_archive`]).

pub mod error;
pub mod export;
pub mod restore;
mod source;
mod wait;

pub use crate::source::{CatalogEntry, ExtensionSource, InstallFlags, LocalSource, SourceHandle, TaskState};
pub use crate::wait::{WaitOutcome, wait_until_terminal};
