//! Payload compression with magic-byte detection.
//!
//! Gzip and Bzip2 are always available. Optional formats (Brotli, XZ, Zstd)
//! are behind feature flags. All compression uses the highest available
//! level for each format; archives are written rarely and kept for a long
//! time.

mod construct;
mod ops;
mod util;

/// A supported payload compression format.
///
/// Defaults to [`Gzip`](Self::Gzip), the format every older client wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    None,
    /// Brotli compression
    #[cfg(feature = "brotli")]
    Brotli,
    /// Bzip2 compression
    Bzip2,
    /// Gzip compression
    #[default]
    Gzip,
    /// XZ/LZMA compression
    #[cfg(feature = "xz")]
    Xz,
    /// Zstd compression
    #[cfg(feature = "zstd")]
    Zstd,
}
