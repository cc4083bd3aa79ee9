use ghead_frame::FrameErrorKind;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GheadResult {
    Ok = 0,
    InvalidArgument = 1,
    IncompleteHeader = 2,
    BadMagic = 3,
    BodyTooLarge = 4,
    ReadFailed = 5,
    PeerClosed = 6,
    TimedOut = 7,
    Internal = 99,
}

impl From<FrameErrorKind> for GheadResult {
    fn from(kind: FrameErrorKind) -> Self {
        match kind {
            FrameErrorKind::InvalidArgument => GheadResult::InvalidArgument,
            FrameErrorKind::IncompleteHeader => GheadResult::IncompleteHeader,
            FrameErrorKind::BadMagic => GheadResult::BadMagic,
            FrameErrorKind::BodyTooLarge => GheadResult::BodyTooLarge,
            FrameErrorKind::ReadFailed => GheadResult::ReadFailed,
            FrameErrorKind::PeerClosed => GheadResult::PeerClosed,
            FrameErrorKind::TimedOut => GheadResult::TimedOut,
        }
    }
}

#[allow(dead_code)]
pub const GHEAD_OK: GheadResult = GheadResult::Ok;
#[allow(dead_code)]
pub const GHEAD_ERR_INVALID_ARGUMENT: GheadResult = GheadResult::InvalidArgument;
#[allow(dead_code)]
pub const GHEAD_ERR_INCOMPLETE_HEADER: GheadResult = GheadResult::IncompleteHeader;
#[allow(dead_code)]
pub const GHEAD_ERR_BAD_MAGIC: GheadResult = GheadResult::BadMagic;
#[allow(dead_code)]
pub const GHEAD_ERR_BODY_TOO_LARGE: GheadResult = GheadResult::BodyTooLarge;
#[allow(dead_code)]
pub const GHEAD_ERR_READ: GheadResult = GheadResult::ReadFailed;
#[allow(dead_code)]
pub const GHEAD_ERR_PEER_CLOSED: GheadResult = GheadResult::PeerClosed;
#[allow(dead_code)]
pub const GHEAD_ERR_TIMED_OUT: GheadResult = GheadResult::TimedOut;
#[allow(dead_code)]
pub const GHEAD_ERR_INTERNAL: GheadResult = GheadResult::Internal;

/// Header fields reported back to C callers.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GheadHeader {
    pub magic: u32,
    pub log_id: u32,
    pub body_len: u32,
}

impl From<ghead_frame::Header> for GheadHeader {
    fn from(header: ghead_frame::Header) -> Self {
        Self {
            magic: header.magic,
            log_id: header.log_id,
            body_len: header.body_len,
        }
    }
}
