//! Readiness wait over `poll(2)` that keeps its timeout across `EINTR`.

use std::io::ErrorKind;
use std::os::fd::RawFd;
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::error::{Result, TransportError};
use crate::traits::Readiness;

/// Wait until `fd` is readable, or until `timeout_ms` elapses.
///
/// A negative timeout blocks indefinitely and zero polls once. When a signal
/// interrupts the wait it is re-issued with whatever budget is left; once the
/// budget is gone the result is [`Readiness::TimedOut`], never a retry.
pub fn wait_readable(fd: RawFd, timeout_ms: i32) -> Result<Readiness> {
    if fd < 0 {
        return Err(TransportError::InvalidArgument(
            "descriptor must be non-negative",
        ));
    }

    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };

    wait_with(timeout_ms, |remaining| {
        pfd.revents = 0;
        // SAFETY: `pfd` is a valid, exclusively borrowed pollfd and nfds is 1.
        let rc = unsafe { libc::poll(&mut pfd, 1, remaining) };
        if rc < 0 {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(rc > 0)
        }
    })
}

/// Retry loop behind [`wait_readable`].
///
/// `poll_once` receives the remaining budget and returns `Ok(true)` when ready,
/// `Ok(false)` on timeout, or the raw error.
pub(crate) fn wait_with<F>(timeout_ms: i32, mut poll_once: F) -> Result<Readiness>
where
    F: FnMut(i32) -> std::io::Result<bool>,
{
    let start = Instant::now();
    let mut remaining = timeout_ms;

    loop {
        match poll_once(remaining) {
            Ok(true) => return Ok(Readiness::Ready),
            Ok(false) => {
                trace!(timeout_ms, "poll timed out");
                return Ok(Readiness::TimedOut);
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => {
                if timeout_ms < 0 {
                    trace!("poll interrupted, waiting again");
                    continue;
                }
                remaining = remaining_budget(timeout_ms, start.elapsed());
                if remaining > 0 {
                    trace!(remaining, "poll interrupted, retrying");
                    continue;
                }
                trace!(timeout_ms, "poll interrupted after budget ran out");
                return Ok(Readiness::TimedOut);
            }
            Err(err) => {
                warn!(error = %err, "poll failed");
                return Err(TransportError::Poll(err));
            }
        }
    }
}

fn remaining_budget(timeout_ms: i32, elapsed: Duration) -> i32 {
    let elapsed_ms = i32::try_from(elapsed.as_millis()).unwrap_or(i32::MAX);
    timeout_ms.saturating_sub(elapsed_ms)
}
