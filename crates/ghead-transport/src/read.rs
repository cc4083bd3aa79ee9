use std::io::ErrorKind;

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{Readiness, ReadableSource};

/// Why an accumulating read stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStop {
    /// Every requested byte arrived.
    Complete,
    /// A readiness wait ran out of time.
    TimedOut,
    /// The peer closed the connection (a read returned zero).
    PeerClosed,
}

/// Result of [`read_exact_timeout`]: how many bytes landed and why it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    pub filled: usize,
    pub stop: ReadStop,
}

impl ReadOutcome {
    pub fn is_complete(&self) -> bool {
        self.stop == ReadStop::Complete
    }
}

/// Fill `dst` from `src`, waiting for readiness before every read.
///
/// Each wait gets the full `timeout_ms`; the budget is not carried over
/// between waits. The loop stops early when a wait times out or when the peer
/// closes, and reports the bytes gathered so far. Interrupted reads are
/// retried without waiting again. Any other read or poll failure is an error.
pub fn read_exact_timeout<S>(src: &mut S, dst: &mut [u8], timeout_ms: i32) -> Result<ReadOutcome>
where
    S: ReadableSource + ?Sized,
{
    if dst.is_empty() {
        trace!("read rejected: empty destination");
        return Err(TransportError::InvalidArgument("destination buffer is empty"));
    }

    let wanted = dst.len();
    let mut filled = 0usize;

    while filled < wanted {
        if src.wait_readable(timeout_ms)? == Readiness::TimedOut {
            trace!(filled, wanted, "read stopped: timed out");
            return Ok(ReadOutcome {
                filled,
                stop: ReadStop::TimedOut,
            });
        }

        let read = loop {
            match src.read_some(&mut dst[filled..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {
                    trace!("read interrupted, retrying");
                    continue;
                }
                Err(err) => {
                    trace!(error = %err, filled, wanted, "read failed");
                    return Err(TransportError::Io(err));
                }
            }
        };

        if read == 0 {
            trace!(filled, wanted, "read stopped: peer closed");
            return Ok(ReadOutcome {
                filled,
                stop: ReadStop::PeerClosed,
            });
        }

        filled += read;
        trace!(read, left = wanted - filled, "read progress");
    }

    Ok(ReadOutcome {
        filled,
        stop: ReadStop::Complete,
    })
}
