use ghead_transport::TransportError;

use crate::codec::MAGIC;

/// Errors that can occur while reading a frame.
///
/// Every variant is terminal for the current read. Whether to retry with a
/// fresh budget or drop the connection is up to the caller.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Unusable descriptor or a destination smaller than a header.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The header phase ended before a whole header arrived.
    #[error("incomplete header ({received} of {expected} bytes)")]
    IncompleteHeader { received: usize, expected: usize },

    /// The header does not start with the protocol magic.
    #[error("invalid frame magic {found:#010x} (expected {:#010x})", MAGIC)]
    BadMagic { found: u32 },

    /// The declared body does not fit the destination.
    #[error("body too large ({body_len} bytes, capacity {capacity})")]
    BodyTooLarge { body_len: usize, capacity: usize },

    /// The body phase ended before the whole body arrived.
    #[error("incomplete body ({received} of {expected} bytes)")]
    IncompleteBody { received: usize, expected: usize },

    /// An I/O error occurred while waiting on or reading the socket.
    #[error("frame read error: {0}")]
    Io(std::io::Error),

    /// The peer closed the connection before any requested byte arrived.
    #[error("connection closed by peer")]
    PeerClosed,

    /// The read budget ran out before any requested byte arrived.
    #[error("timed out waiting for frame")]
    TimedOut,
}

/// Discriminant of [`FrameError`], for mapping onto codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameErrorKind {
    InvalidArgument,
    IncompleteHeader,
    BadMagic,
    BodyTooLarge,
    ReadFailed,
    PeerClosed,
    TimedOut,
}

impl FrameError {
    pub fn kind(&self) -> FrameErrorKind {
        match self {
            FrameError::InvalidArgument(_) => FrameErrorKind::InvalidArgument,
            FrameError::IncompleteHeader { .. } => FrameErrorKind::IncompleteHeader,
            FrameError::BadMagic { .. } => FrameErrorKind::BadMagic,
            FrameError::BodyTooLarge { .. } => FrameErrorKind::BodyTooLarge,
            FrameError::IncompleteBody { .. } | FrameError::Io(_) => FrameErrorKind::ReadFailed,
            FrameError::PeerClosed => FrameErrorKind::PeerClosed,
            FrameError::TimedOut => FrameErrorKind::TimedOut,
        }
    }

    /// True when a fresh budget might succeed on the same connection.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FrameError::TimedOut)
    }
}

impl From<TransportError> for FrameError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidArgument(msg) => FrameError::InvalidArgument(msg),
            TransportError::Poll(io) | TransportError::Io(io) => FrameError::Io(io),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
