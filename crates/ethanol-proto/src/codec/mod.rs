// ── Wire codec ──
//
// Every message starts with the same header:
//
//   type: i32 | id: i32 | version_len: i32 | version: bytes | total_size: i32
//
// followed by the payload layout selected by the type tag. All integers
// are little-endian.

mod kind;
mod payload;
pub mod schema;
pub mod wire;

pub use kind::MessageType;
pub use payload::{Payload, Schema};

use bytes::Bytes;
use serde::Serialize;

use crate::error::Error;
use wire::{Reader, Wire, Writer};

/// Protocol version spoken by this implementation.
pub const PROTOCOL_VERSION: &str = "1.0.3";

/// Largest message accepted from a peer.
pub const MAX_MESSAGE_SIZE: usize = 65_536;

/// Fixed bytes of the header, excluding the version string.
pub const HEADER_FIXED_LEN: usize = 16;

/// Offset of `version_len` within the header.
const VERSION_LEN_OFFSET: usize = 8;

// ── Header ───────────────────────────────────────────────────────────

/// The shared header, decoded on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub message_type: MessageType,
    pub id: i32,
    pub version: String,
    /// Declared total message size; 0 when the sender did not fill it in.
    pub total_size: i32,
    /// Encoded length of the header itself.
    pub header_len: usize,
}

/// Header fields read without interpreting the type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawHeader {
    pub tag: i32,
    pub id: i32,
    pub version: String,
    pub total_size: i32,
    pub header_len: usize,
}

impl RawHeader {
    pub(crate) fn read(buf: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(buf);
        let tag = i32::take(&mut r)?;
        let id = i32::take(&mut r)?;
        let version = String::take(&mut r)?;
        let total_size = i32::take(&mut r)?;
        Ok(Self {
            tag,
            id,
            version,
            total_size,
            header_len: r.position(),
        })
    }
}

/// Number of bytes needed before the header length is known.
pub(crate) fn header_prefix_len() -> usize {
    VERSION_LEN_OFFSET + 4
}

/// Header length given its first 12 bytes, if they are available.
pub(crate) fn header_len_from_prefix(prefix: &[u8]) -> Option<usize> {
    let raw = prefix.get(VERSION_LEN_OFFSET..VERSION_LEN_OFFSET + 4)?;
    let version_len = i32::from_le_bytes(raw.try_into().ok()?);
    let version_len = usize::try_from(version_len).unwrap_or(0);
    Some(HEADER_FIXED_LEN + version_len)
}

/// Decode only the shared header.
///
/// Succeeds for any catalog type regardless of payload; the version is
/// reported, not checked.
pub fn decode_header(buf: &[u8]) -> Result<Header, Error> {
    let raw = RawHeader::read(buf)?;
    Ok(Header {
        message_type: MessageType::from_tag(raw.tag)?,
        id: raw.id,
        version: raw.version,
        total_size: raw.total_size,
        header_len: raw.header_len,
    })
}

// ── Message ──────────────────────────────────────────────────────────

/// A complete protocol message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub message_type: MessageType,
    pub id: i32,
    pub payload: Payload,
}

impl Message {
    pub fn new(message_type: MessageType, id: i32, payload: Payload) -> Self {
        Self {
            message_type,
            id,
            payload,
        }
    }

    /// ERR reply with the given reason, echoing the request id.
    pub fn error(id: i32, code: crate::error::ErrorCode) -> Self {
        Self::new(
            MessageType::Error,
            id,
            Payload::Error(schema::ErrorReport {
                error_type: code.as_wire(),
            }),
        )
    }

    pub fn is_error(&self) -> bool {
        self.message_type == MessageType::Error
    }
}

/// Encode a message, filling in the declared total size.
pub fn encode(message: &Message) -> Result<Bytes, Error> {
    let expected = message.message_type.schema();
    let actual = message.payload.schema();
    if expected != actual {
        return Err(Error::malformed(format!(
            "{} carries a {actual} payload, expected {expected}",
            message.message_type
        )));
    }

    let mut w = Writer::new();
    message.message_type.tag().put(&mut w)?;
    message.id.put(&mut w)?;
    PROTOCOL_VERSION.to_owned().put(&mut w)?;
    let size_offset = w.len();
    0_i32.put(&mut w)?;
    message.payload.put(&mut w)?;

    let total = i32::try_from(w.len())
        .map_err(|_| Error::malformed(format!("message of {} bytes exceeds i32", w.len())))?;
    w.patch_i32(size_offset, total);
    Ok(w.into_bytes().freeze())
}

/// Decode a full message.
///
/// Fails with `UnknownType` for tags outside the catalog, `VersionMismatch`
/// when the sender speaks another protocol version, and `Malformed` when the
/// buffer is shorter than the header, the declared size, or the payload.
pub fn decode(buf: &[u8]) -> Result<Message, Error> {
    let header = decode_header(buf)?;
    if header.version != PROTOCOL_VERSION {
        return Err(Error::VersionMismatch {
            expected: PROTOCOL_VERSION,
            got: header.version,
        });
    }

    let declared = usize::try_from(header.total_size)
        .map_err(|_| Error::malformed(format!("negative total size {}", header.total_size)))?;
    if declared > buf.len() {
        return Err(Error::malformed(format!(
            "declared size {declared} exceeds {} received bytes",
            buf.len()
        )));
    }
    // Legacy senders leave the size at 0; decode whatever arrived.
    let end = if declared == 0 { buf.len() } else { declared };
    let body = buf
        .get(header.header_len..end)
        .ok_or_else(|| Error::malformed("declared size shorter than header"))?;

    let mut r = Reader::new(body);
    let payload = Payload::take(header.message_type.schema(), &mut r)?;
    Ok(Message {
        message_type: header.message_type,
        id: header.id,
        payload,
    })
}
