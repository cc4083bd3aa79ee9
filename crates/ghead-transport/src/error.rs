/// Errors that can occur while waiting on or reading from a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The caller passed an unusable descriptor or destination.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The readiness primitive failed with something other than an interrupt.
    #[error("poll failed: {0}")]
    Poll(std::io::Error),

    /// The read itself failed with something other than an interrupt.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
