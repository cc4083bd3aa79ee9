//! Bounded-time reader for length-prefixed frames.
//!
//! Every frame starts with a 12-byte big-endian header:
//! - A 4-byte magic number (`0x0E8C4A59`) for stream synchronization
//! - A 4-byte log id, carried through for diagnostics
//! - A 4-byte body length
//!
//! The header is validated in full before a single body byte is requested,
//! and a read either yields a whole frame or a precise [`FrameError`].

pub mod codec;
pub mod error;
#[cfg(unix)]
pub mod reader;

pub use codec::{encode_frame, Frame, FrameConfig, Header, DEFAULT_MAX_BODY, HEADER_SIZE, MAGIC};
pub use error::{FrameError, FrameErrorKind, Result};
#[cfg(unix)]
pub use reader::{read_frame, read_frame_from, FrameReader};
