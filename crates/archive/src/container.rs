//! Encoding and decoding of archive containers.
//!
//! The version tag sits in a length-prefixed JSON header ahead of the
//! compressed payload, so [`decode_version`] never touches the payload of a
//! framed container. Legacy containers (a bare compressed JSON document) are
//! recognised by their compression magic bytes and have to be decompressed
//! to find their version.

use crate::Compression;
use crate::error::{ErrorKind, Result};
use crate::models::RecordTree;
use crate::version::VersionTag;
use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::instrument;

/// Leading bytes of every framed container.
pub const MAGIC: &[u8; 8] = b"SHELFBAK";
// Generous; real headers are a couple of hundred bytes.
const MAX_HEADER_SIZE: usize = 64 * 1024;

/// How the container was laid out on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Magic, length-prefixed header, then payload.
    Framed,
    /// A bare compressed JSON document carrying its own `"version"` key.
    Legacy,
}

/// Everything that can be learned about a container without decoding its
/// record tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerInfo {
    pub format: ContainerFormat,
    pub version: VersionTag,
    pub compression: Compression,
    pub created: Option<OffsetDateTime>,
    /// Size of the (still compressed) payload in bytes.
    pub payload_size: usize,
}

#[derive(Serialize)]
struct HeaderOut<'a> {
    version: String,
    compression: &'a str,
    created: String,
    digest: String,
}

// Every field is optional so that a missing version tag can be told apart
// from an unreadable header.
#[derive(Deserialize)]
struct HeaderIn {
    version: Option<String>,
    compression: Option<String>,
    created: Option<String>,
    digest: Option<String>,
}

#[derive(Serialize)]
struct PayloadOut<'a> {
    version: String,
    #[serde(flatten)]
    tree: &'a RecordTree,
}

#[derive(Deserialize)]
struct VersionOnly {
    version: Option<String>,
}

struct Frame<'a> {
    header: HeaderIn,
    payload: &'a [u8],
}

/// Serialize, compress and frame a record tree.
///
/// The output only varies between calls by the creation timestamp in the
/// header.
///
/// # Examples
///
/// ```
/// use shelf_archive::{CURRENT_VERSION, Compression, RecordTree, decode_tree, decode_version, encode};
///
/// let tree = RecordTree::default();
/// let bytes = encode(&tree, CURRENT_VERSION, Compression::Gzip).unwrap();
/// assert_eq!(decode_version(&bytes).unwrap(), CURRENT_VERSION);
/// assert_eq!(decode_tree(&bytes).unwrap(), tree);
/// ```
#[instrument(skip(tree), fields(version = %version, compression = %compression, size))]
pub fn encode(tree: &RecordTree, version: VersionTag, compression: Compression) -> Result<Vec<u8>> {
    let payload = PayloadOut { version: version.to_string(), tree };
    let json = serde_json::to_vec(&payload).or_raise(|| ErrorKind::Encoding)?;
    let payload = compression.compress(&json)?;
    let header = HeaderOut {
        version: version.to_string(),
        compression: compression.as_str(),
        created: OffsetDateTime::now_utc().format(&Rfc3339).or_raise(|| ErrorKind::Encoding)?,
        digest: blake3::hash(&payload).to_hex().to_string(),
    };
    let header = serde_json::to_vec(&header).or_raise(|| ErrorKind::Encoding)?;
    let header_len = u32::try_from(header.len()).or_raise(|| ErrorKind::Encoding)?;

    let mut output = Vec::with_capacity(MAGIC.len() + 4 + header.len() + payload.len());
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(&header_len.to_be_bytes());
    output.extend_from_slice(&header);
    output.extend_from_slice(&payload);
    tracing::Span::current().record("size", output.len());
    Ok(output)
}

/// Read only the version tag of a container.
///
/// For framed containers the payload is not touched at all.
pub fn decode_version(bytes: &[u8]) -> Result<VersionTag> {
    inspect(bytes).map(|info| info.version)
}

/// Describe a container without decoding its record tree.
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn inspect(bytes: &[u8]) -> Result<ContainerInfo> {
    if let Some(frame) = split_frame(bytes)? {
        let version = frame.header.version.as_deref().ok_or_raise(|| ErrorKind::MissingVersionTag)?.parse()?;
        let compression = frame_compression(&frame)?;
        let created = frame.header.created.as_deref().and_then(|c| OffsetDateTime::parse(c, &Rfc3339).ok());
        return Ok(ContainerInfo {
            format: ContainerFormat::Framed,
            version,
            compression,
            created,
            payload_size: frame.payload.len(),
        });
    }
    let compression = legacy_compression(bytes)?;
    let json = compression.decompress(bytes)?;
    let legacy: VersionOnly = serde_json::from_slice(&json).or_raise(|| ErrorKind::MalformedContainer)?;
    let version = legacy.version.ok_or_raise(|| ErrorKind::MissingVersionTag)?;
    Ok(ContainerInfo {
        format: ContainerFormat::Legacy,
        version: version.parse()?,
        compression,
        created: None,
        payload_size: bytes.len(),
    })
}

/// Decompress and parse the full record tree of a container.
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn decode_tree(bytes: &[u8]) -> Result<RecordTree> {
    let (compression, payload) = match split_frame(bytes)? {
        Some(frame) => {
            if let Some(expected) = frame.header.digest.as_deref() {
                let actual = blake3::hash(frame.payload).to_hex();
                if !expected.eq_ignore_ascii_case(actual.as_str()) {
                    tracing::warn!(expected, actual = %actual, "archive payload digest mismatch");
                    exn::bail!(ErrorKind::MalformedContainer);
                }
            }
            (frame_compression(&frame)?, frame.payload)
        },
        None => (legacy_compression(bytes)?, bytes),
    };
    let json = compression.decompress(payload)?;
    serde_json::from_slice(&json).or_raise(|| ErrorKind::MalformedContainer)
}

fn split_frame(bytes: &[u8]) -> Result<Option<Frame<'_>>> {
    let Some(rest) = bytes.strip_prefix(MAGIC.as_slice()) else {
        return Ok(None);
    };
    let (length, rest) = rest.split_first_chunk::<4>().ok_or_raise(|| ErrorKind::MalformedContainer)?;
    let length = usize::try_from(u32::from_be_bytes(*length)).or_raise(|| ErrorKind::MalformedContainer)?;
    if length > MAX_HEADER_SIZE || length > rest.len() {
        exn::bail!(ErrorKind::MalformedContainer);
    }
    let (header, payload) = rest.split_at(length);
    let header: HeaderIn = serde_json::from_slice(header).or_raise(|| ErrorKind::MalformedContainer)?;
    Ok(Some(Frame { header, payload }))
}

fn frame_compression(frame: &Frame<'_>) -> Result<Compression> {
    match frame.header.compression.as_deref() {
        Some(name) => name.parse(),
        None => Compression::from_magic_bytes(frame.payload).ok_or_raise(|| ErrorKind::MalformedContainer),
    }
}

fn legacy_compression(bytes: &[u8]) -> Result<Compression> {
    if let Some(compression) = Compression::from_magic_bytes(bytes) {
        return Ok(compression);
    }
    // Uncompressed JSON, as written by hand or by debugging tools.
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(Compression::None),
        _ => exn::bail!(ErrorKind::MalformedContainer),
    }
}
