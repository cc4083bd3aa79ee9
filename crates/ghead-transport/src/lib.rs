//! Deadline-aware socket reads.
//!
//! This is the lowest layer of ghead. It provides two building blocks:
//! - [`wait_readable`]: a readiness wait that survives signal interruption
//!   without overrunning the caller's timeout
//! - [`read_exact_timeout`]: an accumulating read that fills a buffer, stopping
//!   early on timeout or orderly peer close
//!
//! Timeouts are expressed in milliseconds the way `poll(2)` takes them:
//! negative blocks indefinitely, zero polls once, positive bounds the wait.

pub mod error;
pub mod read;
pub mod traits;

#[cfg(unix)]
pub mod poll;

pub use error::{Result, TransportError};
pub use read::{read_exact_timeout, ReadOutcome, ReadStop};
pub use traits::{timeout_ms, Readiness, ReadableSource};

#[cfg(unix)]
pub use poll::wait_readable;
#[cfg(unix)]
pub use traits::FdSource;
