//! Bounded-time frame reading for a magic-checked, length-prefixed protocol.
//!
//! # Crate Structure
//!
//! - [`transport`] — Deadline-aware readiness wait and accumulating reads
//! - [`frame`] — Header codec, error taxonomy and the frame reader

/// Re-export transport types.
pub mod transport {
    pub use ghead_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ghead_frame::*;
}

pub use ghead_frame::{Frame, FrameError, Header};
#[cfg(unix)]
pub use ghead_frame::{read_frame, FrameReader};
