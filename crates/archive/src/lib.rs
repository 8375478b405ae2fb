//! Backup container for a shelf library.
//!
//! An archive is a single byte blob holding the whole exportable library
//! state (the [`RecordTree`]) together with a format [`VersionTag`]. The tag
//! lives in a small header in front of the compressed payload, so an archive
//! can be checked for compatibility ([`Validator`]) without decompressing or
//! parsing the records themselves.
//!
//! ```text
//! "SHELFBAK" | u32 BE header length | JSON header | compressed JSON payload
//! ```
//!
//! Archives written by older clients (a bare compressed JSON document with a
//! top-level `"version"` key, usually wrapped in Base64) are still readable.
//!
//! The crate knows nothing about how records are merged back into a live
//! library; that lives in `shelf-backup`.

mod compression;
pub mod container;
mod envelope;
pub mod error;
pub mod models;
mod validate;
mod version;

pub use crate::compression::Compression;
pub use crate::container::{ContainerFormat, ContainerInfo, decode_tree, decode_version, encode, inspect};
pub use crate::envelope::Envelope;
pub use crate::models::RecordTree;
pub use crate::validate::Validator;
pub use crate::version::{CURRENT_VERSION, VersionTag};
