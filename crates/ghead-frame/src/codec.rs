use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (4) + log id (4) + body length (4) = 12 bytes.
pub const HEADER_SIZE: usize = 12;

/// Protocol magic, the first field of every header.
pub const MAGIC: u32 = 0x0E8C_4A59;

/// Default maximum body size for owned reads: 16 MiB.
pub const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;

/// Fixed-size frame header.
///
/// Wire format (all fields big-endian):
/// ```text
/// ┌──────────────┬──────────────┬──────────────┬──────────────────┐
/// │ Magic (4B)   │ Log ID (4B)  │ Body length  │ Body             │
/// │ 0x0E8C4A59   │              │ (4B)         │ (length bytes)   │
/// └──────────────┴──────────────┴──────────────┴──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    /// Correlation id, only used in diagnostics.
    pub log_id: u32,
    pub body_len: u32,
}

impl Header {
    /// A header carrying the protocol magic.
    pub fn new(log_id: u32, body_len: u32) -> Self {
        Self {
            magic: MAGIC,
            log_id,
            body_len,
        }
    }

    /// Parse a header. The magic is not checked here.
    pub fn decode(src: &[u8; HEADER_SIZE]) -> Self {
        let mut src = &src[..];
        Self {
            magic: src.get_u32(),
            log_id: src.get_u32(),
            body_len: src.get_u32(),
        }
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_u32(self.magic);
        dst.put_u32(self.log_id);
        dst.put_u32(self.body_len);
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Header plus body size on the wire.
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.body_len as usize
    }
}

/// A complete frame with an owned body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub body: Bytes,
}

impl Frame {
    pub fn log_id(&self) -> u32 {
        self.header.log_id
    }

    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }
}

/// Encode a header and body into the wire format.
///
/// This only produces bytes; sending them is up to the caller.
pub fn encode_frame(log_id: u32, body: &[u8], dst: &mut BytesMut) -> Result<()> {
    let body_len = u32::try_from(body.len()).map_err(|_| FrameError::BodyTooLarge {
        body_len: body.len(),
        capacity: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + body.len());
    Header::new(log_id, body_len).encode(dst);
    dst.put_slice(body);
    Ok(())
}

/// Configuration for owned frame reads.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest body accepted before allocating. Default: 16 MiB.
    pub max_body_len: usize,
    /// Budget for each read phase. `None` blocks indefinitely.
    pub read_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_body_len: DEFAULT_MAX_BODY,
            read_timeout: None,
        }
    }
}
