use crate::Compression;
use crate::container::MAGIC;
use crate::error::{Error, ErrorKind, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::ResultExt;
use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Byte encoding wrapped around a container for transport or storage.
///
/// Older clients wrote their archives Base64-encoded, with line breaks every
/// 76 characters. [`open`](Self::open) therefore ignores ASCII whitespace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Envelope {
    /// Container bytes as-is.
    #[default]
    Raw,
    /// Standard-alphabet, padded Base64 text.
    Base64,
}

impl Envelope {
    /// Wrap container bytes.
    pub fn seal(&self, bytes: Vec<u8>) -> Vec<u8> {
        match self {
            Self::Raw => bytes,
            Self::Base64 => STANDARD.encode(bytes).into_bytes(),
        }
    }

    /// Unwrap container bytes.
    pub fn open<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        match self {
            Self::Raw => Ok(Cow::Borrowed(bytes)),
            Self::Base64 => {
                let compact: Vec<u8> = bytes.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
                let decoded = STANDARD.decode(compact).or_raise(|| ErrorKind::Envelope)?;
                Ok(Cow::Owned(decoded))
            },
        }
    }

    /// Guess the envelope of stored bytes.
    ///
    /// Anything starting with the container magic or a known compression
    /// magic is raw. Otherwise, non-empty input made up only of Base64
    /// alphabet characters and whitespace is Base64. Everything else is
    /// reported as raw and left for the container decoder to reject.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf_archive::Envelope;
    ///
    /// assert_eq!(Envelope::sniff(b"SHELFBAK\x00\x00\x00\x02{}"), Envelope::Raw);
    /// assert_eq!(Envelope::sniff(b"U0hFTEZCQUsAAAACe30=\n"), Envelope::Base64);
    /// ```
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(MAGIC) || Compression::from_magic_bytes(bytes).is_some() {
            return Self::Raw;
        }
        let mut significant = bytes.iter().filter(|b| !b.is_ascii_whitespace()).peekable();
        if significant.peek().is_none() {
            return Self::Raw;
        }
        match significant.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')) {
            true => Self::Base64,
            false => Self::Raw,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Base64 => "base64",
        }
    }
}

impl Display for Envelope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Envelope {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" | "binary" => Ok(Self::Raw),
            "base64" | "b64" => Ok(Self::Base64),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}
