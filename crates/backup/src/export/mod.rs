//! Export of a live library into an archive.
//!
//! Only what bookmarked novels depend on is exported: the extensions they
//! come from, the repositories those extensions were installed from, and
//! the user's categories. [`ArchiveBuilder`] gathers those records stage by
//! stage; [`export`] runs the stages, encodes the result and reports
//! progress along the way.

mod builder;
pub mod error;
mod stream;

pub use self::builder::{ArchiveBuilder, Assembled, ExportStats};
pub use self::stream::{ExportEvent, ExportedArchive, export, export_archive};
use shelf_archive::{Compression, Envelope};

/// What to put in an archive, and how to write it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    /// Export chapters (with reading state and history). Without them a
    /// restore only brings back the novels themselves.
    pub include_chapters: bool,
    /// Export per-novel settings; otherwise every novel gets the defaults.
    pub include_settings: bool,
    pub compression: Compression,
    pub envelope: Envelope,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_chapters: true,
            include_settings: true,
            compression: Compression::default(),
            envelope: Envelope::default(),
        }
    }
}
