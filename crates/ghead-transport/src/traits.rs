use std::time::Duration;

use crate::error::Result;

/// Outcome of a single readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The descriptor has data (or a pending close) to read.
    Ready,
    /// The timeout elapsed before the descriptor became readable.
    TimedOut,
}

/// A byte source that can be waited on before reading.
///
/// On Unix this is [`FdSource`]. The accumulating read is written against
/// this trait so it never touches the descriptor directly.
pub trait ReadableSource {
    /// Block until readable or until `timeout_ms` elapses.
    fn wait_readable(&mut self, timeout_ms: i32) -> Result<Readiness>;

    /// Perform one read into `buf`, returning the raw result.
    ///
    /// `Ok(0)` means the peer closed the connection.
    fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

impl<S: ReadableSource + ?Sized> ReadableSource for &mut S {
    fn wait_readable(&mut self, timeout_ms: i32) -> Result<Readiness> {
        (**self).wait_readable(timeout_ms)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        (**self).read_some(buf)
    }
}

/// A raw socket descriptor used as a [`ReadableSource`].
///
/// The descriptor is not owned: closing it remains the caller's job, and it
/// must stay open for as long as reads are issued through this value.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdSource {
    fd: std::os::fd::RawFd,
}

#[cfg(unix)]
impl FdSource {
    /// Wrap a raw descriptor. Negative descriptors are rejected.
    pub fn new(fd: std::os::fd::RawFd) -> Result<Self> {
        if fd < 0 {
            return Err(crate::error::TransportError::InvalidArgument(
                "descriptor must be non-negative",
            ));
        }
        Ok(Self { fd })
    }

    /// Borrow the descriptor of an open stream.
    pub fn of<T: std::os::fd::AsRawFd>(stream: &T) -> Self {
        Self {
            fd: stream.as_raw_fd(),
        }
    }

    /// The wrapped descriptor.
    pub fn fd(&self) -> std::os::fd::RawFd {
        self.fd
    }
}

#[cfg(unix)]
impl ReadableSource for FdSource {
    fn wait_readable(&mut self, timeout_ms: i32) -> Result<Readiness> {
        crate::poll::wait_readable(self.fd, timeout_ms)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        // SAFETY: `buf` is a valid writable region of `buf.len()` bytes for the
        // duration of the call. A stale descriptor yields EBADF, not UB.
        let rc = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast::<libc::c_void>(), buf.len()) };
        if rc < 0 {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(rc as usize)
        }
    }
}

/// Convert an optional duration into a `poll(2)` style millisecond budget.
///
/// `None` maps to `-1` (block indefinitely); long durations saturate.
pub fn timeout_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(duration) => i32::try_from(duration.as_millis()).unwrap_or(i32::MAX),
    }
}
