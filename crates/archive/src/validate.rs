use crate::container::decode_version;
use crate::error::{ErrorKind, Result};
use crate::version::{CURRENT_VERSION, VersionTag};
use tracing::instrument;

/// Major-version gate run before anything is restored.
///
/// Validation only reads the container header (see [`decode_version`]) and
/// never has side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validator {
    supported: VersionTag,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(CURRENT_VERSION)
    }
}

impl Validator {
    pub fn new(supported: VersionTag) -> Self {
        Self { supported }
    }

    pub fn supported(&self) -> VersionTag {
        self.supported
    }

    /// Check an already decoded version tag.
    pub fn check(&self, found: VersionTag) -> Result<VersionTag> {
        if !found.is_compatible_with(&self.supported) {
            exn::bail!(ErrorKind::IncompatibleMajorVersion { found, supported: self.supported });
        }
        Ok(found)
    }

    /// Read the version tag of a container and check it.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf_archive::{Compression, RecordTree, Validator, VersionTag, encode};
    ///
    /// let old = encode(&RecordTree::default(), VersionTag::new(1, 0, 0), Compression::Gzip).unwrap();
    /// let new = encode(&RecordTree::default(), VersionTag::new(2, 0, 0), Compression::Gzip).unwrap();
    /// let validator = Validator::default();
    /// assert!(validator.validate(&old).is_ok());
    /// assert!(validator.validate(&new).is_err());
    /// ```
    #[instrument(skip(self, bytes), fields(supported = %self.supported, found))]
    pub fn validate(&self, bytes: &[u8]) -> Result<VersionTag> {
        let found = decode_version(bytes)?;
        tracing::Span::current().record("found", tracing::field::display(found));
        self.check(found)
    }
}
