//! Persistence layer of a shelf library.
//!
//! The backup engine never talks to a database directly. It consumes the
//! narrow per-entity traits in [`backend`], bundled together as
//! [`LibraryStore`], and shared as a [`StoreHandle`]. Two implementations
//! ship with the crate:
//!
//! - [`SqliteStore`]: the on-disk library database, with embedded migrations.
//! - `MockStore` (feature `mock`): in-memory, with fault injection for tests.
//!
//! Live entities ([`models`]) are keyed by database-assigned ids, except
//! extensions which keep their catalog id.

pub mod backend;
pub mod error;
pub mod models;

#[cfg(feature = "mock")]
pub use crate::backend::{Fault, MockStore};
pub use crate::backend::{
    CategoryStore, ChapterStore, Database, ExtensionStore, HistoryStore, LibraryStore, NovelCategoryStore, NovelStore,
    PinStore, RepositoryStore, SettingsStore, SqliteStore,
};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn LibraryStore + Send + Sync>;
