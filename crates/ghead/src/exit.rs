use std::fmt;
use std::io;

use ghead_frame::{FrameError, FrameErrorKind};

// Exit code constants aligned with sysexits / coreutils `timeout` semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = match err.kind() {
        FrameErrorKind::TimedOut => TIMEOUT,
        FrameErrorKind::BadMagic
        | FrameErrorKind::BodyTooLarge
        | FrameErrorKind::IncompleteHeader => DATA_INVALID,
        FrameErrorKind::PeerClosed => FAILURE,
        FrameErrorKind::InvalidArgument => USAGE,
        FrameErrorKind::ReadFailed => match err {
            FrameError::Io(source) => return io_error(context, source),
            _ => DATA_INVALID,
        },
    };
    CliError::new(code, format!("{context}: {err}"))
}
