use std::os::fd::{AsRawFd, RawFd};

use bytes::BytesMut;
use ghead_transport::{read_exact_timeout, timeout_ms, FdSource, ReadStop, ReadableSource};
use tracing::{debug, error, trace, warn};

use crate::codec::{Frame, FrameConfig, Header, HEADER_SIZE, MAGIC};
use crate::error::{FrameError, Result};

/// Read one frame from `fd` into `buf` within `timeout_ms`.
///
/// On success the header is returned and `buf[..header.frame_len()]` holds
/// the header followed by the body. The capacity is `buf.len()`; a body that
/// would not fit is rejected before any of it is read. The header and body
/// phases each get the full `timeout_ms`.
pub fn read_frame(fd: RawFd, buf: &mut [u8], timeout_ms: i32) -> Result<Header> {
    if fd < 0 {
        warn!(fd, "read frame rejected: negative descriptor");
        return Err(FrameError::InvalidArgument("descriptor must be non-negative"));
    }
    let mut src = FdSource::new(fd)?;
    read_frame_from(&mut src, buf, timeout_ms)
}

/// [`read_frame`] over any [`ReadableSource`].
pub fn read_frame_from<S>(src: &mut S, buf: &mut [u8], timeout_ms: i32) -> Result<Header>
where
    S: ReadableSource + ?Sized,
{
    if buf.len() < HEADER_SIZE {
        warn!(
            capacity = buf.len(),
            header_size = HEADER_SIZE,
            "read frame rejected: buffer smaller than header"
        );
        return Err(FrameError::InvalidArgument(
            "buffer smaller than a frame header",
        ));
    }

    let (head, rest) = buf.split_at_mut(HEADER_SIZE);
    let head: &mut [u8; HEADER_SIZE] = head
        .try_into()
        .map_err(|_| FrameError::InvalidArgument("buffer smaller than a frame header"))?;

    let header = read_header(src, head, timeout_ms)?;
    check_body_fits(&header, rest.len())?;
    read_body(src, &header, &mut rest[..header.body_len as usize], timeout_ms)?;
    Ok(header)
}

fn read_header<S>(src: &mut S, head: &mut [u8; HEADER_SIZE], timeout_ms: i32) -> Result<Header>
where
    S: ReadableSource + ?Sized,
{
    let outcome = read_exact_timeout(src, head, timeout_ms).map_err(|err| {
        warn!(error = %err, "read header failed");
        FrameError::from(err)
    })?;

    match (outcome.filled, outcome.stop) {
        (_, ReadStop::Complete) => {}
        (0, ReadStop::PeerClosed) => {
            debug!("peer closed before header");
            return Err(FrameError::PeerClosed);
        }
        (0, ReadStop::TimedOut) => {
            warn!(timeout_ms, "timed out waiting for header");
            return Err(FrameError::TimedOut);
        }
        (received, stop) => {
            warn!(
                received,
                expected = HEADER_SIZE,
                ?stop,
                "read header incomplete"
            );
            return Err(FrameError::IncompleteHeader {
                received,
                expected: HEADER_SIZE,
            });
        }
    }

    let header = Header::decode(head);
    trace!(
        log_id = header.log_id,
        body_len = header.body_len,
        "read header succeeded"
    );

    if !header.has_valid_magic() {
        error!(
            log_id = header.log_id,
            found = %format_args!("{:#x}", header.magic),
            expected = %format_args!("{:#x}", MAGIC),
            "magic mismatch"
        );
        return Err(FrameError::BadMagic {
            found: header.magic,
        });
    }

    Ok(header)
}

fn check_body_fits(header: &Header, capacity: usize) -> Result<()> {
    let body_len = header.body_len as usize;
    if body_len > capacity {
        warn!(
            log_id = header.log_id,
            body_len, capacity, "body too large for buffer"
        );
        return Err(FrameError::BodyTooLarge { body_len, capacity });
    }
    trace!(log_id = header.log_id, body_len, capacity, "body fits");
    Ok(())
}

fn read_body<S>(src: &mut S, header: &Header, body: &mut [u8], timeout_ms: i32) -> Result<()>
where
    S: ReadableSource + ?Sized,
{
    if body.is_empty() {
        return Ok(());
    }

    let outcome = read_exact_timeout(src, body, timeout_ms).map_err(|err| {
        warn!(log_id = header.log_id, error = %err, "read body failed");
        FrameError::from(err)
    })?;

    match (outcome.filled, outcome.stop) {
        (_, ReadStop::Complete) => {
            trace!(log_id = header.log_id, "read body succeeded");
            Ok(())
        }
        (0, ReadStop::PeerClosed) => {
            warn!(log_id = header.log_id, "peer closed before body");
            Err(FrameError::PeerClosed)
        }
        (0, ReadStop::TimedOut) => {
            warn!(log_id = header.log_id, timeout_ms, "timed out waiting for body");
            Err(FrameError::TimedOut)
        }
        (received, stop) => {
            warn!(
                log_id = header.log_id,
                received,
                expected = body.len(),
                ?stop,
                "read body incomplete"
            );
            Err(FrameError::IncompleteBody {
                received,
                expected: body.len(),
            })
        }
    }
}

/// Reads complete frames from a socket into owned buffers.
///
/// The body is allocated only after the header passes the magic and size
/// checks, so a hostile length never turns into a large allocation.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: AsRawFd> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame (blocking, bounded by `read_timeout`).
    pub fn read_frame(&mut self) -> Result<Frame> {
        let timeout_ms = timeout_ms(self.config.read_timeout);
        let mut src = FdSource::of(&self.inner);

        let mut head = [0u8; HEADER_SIZE];
        let header = read_header(&mut src, &mut head, timeout_ms)?;
        check_body_fits(&header, self.config.max_body_len)?;

        let mut body = BytesMut::zeroed(header.body_len as usize);
        read_body(&mut src, &header, &mut body, timeout_ms)?;

        Ok(Frame {
            header,
            body: body.freeze(),
        })
    }

    /// Read the next frame into a caller-owned buffer. See [`read_frame`].
    pub fn read_frame_into(&mut self, buf: &mut [u8]) -> Result<Header> {
        let timeout_ms = timeout_ms(self.config.read_timeout);
        read_frame_from(&mut FdSource::of(&self.inner), buf, timeout_ms)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum body size for subsequent reads.
    pub fn set_max_body_len(&mut self, max_body_len: usize) {
        self.config.max_body_len = max_body_len;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;
    use std::time::{Duration, Instant};

    use bytes::{BufMut, BytesMut};
    use ghead_transport::{Readiness, TransportError};

    use super::*;
    use crate::codec::encode_frame;
    use crate::error::FrameErrorKind;

    fn wire(log_id: u32, body: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(log_id, body, &mut buf).unwrap();
        buf.to_vec()
    }

    fn raw_header(magic: u32, log_id: u32, body_len: u32) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u32(magic);
        buf.put_u32(log_id);
        buf.put_u32(body_len);
        buf.to_vec()
    }

    #[test]
    fn reads_header_and_body_into_buffer() {
        let (mut left, right) = UnixStream::pair().unwrap();
        let bytes = wire(7, b"hello");
        left.write_all(&bytes).unwrap();

        let mut buf = [0u8; 64];
        let header = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap();

        assert_eq!(header, Header::new(7, 5));
        assert_eq!(&buf[..header.frame_len()], bytes.as_slice());
        assert_eq!(&buf[HEADER_SIZE..header.frame_len()], b"hello");
    }

    #[test]
    fn exact_capacity_is_enough() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&wire(1, b"12345678")).unwrap();

        let mut buf = [0u8; HEADER_SIZE + 8];
        let header = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap();
        assert_eq!(header.body_len, 8);
        assert_eq!(&buf[HEADER_SIZE..], b"12345678");
    }

    #[test]
    fn empty_body_skips_body_read() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&wire(3, b"")).unwrap();

        let mut buf = [0u8; HEADER_SIZE];
        let header = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap();
        assert_eq!(header.body_len, 0);
    }

    #[test]
    fn body_arriving_in_pieces() {
        let (mut left, right) = UnixStream::pair().unwrap();
        let bytes = wire(11, b"split body");
        let writer = std::thread::spawn(move || {
            for chunk in bytes.chunks(3) {
                left.write_all(chunk).unwrap();
                std::thread::sleep(Duration::from_millis(5));
            }
        });

        let mut buf = [0u8; 64];
        let header = read_frame(right.as_raw_fd(), &mut buf, 500).unwrap();
        writer.join().unwrap();

        assert_eq!(&buf[HEADER_SIZE..header.frame_len()], b"split body");
    }

    #[test]
    fn stalled_body_times_out_within_budget() {
        let (mut left, right) = UnixStream::pair().unwrap();
        let mut bytes = wire(7, b"hello");
        bytes.truncate(HEADER_SIZE + 3);
        left.write_all(&bytes).unwrap();

        let start = Instant::now();
        let mut buf = [0u8; 64];
        let err = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(
            err,
            FrameError::IncompleteBody {
                received: 3,
                expected: 5
            }
        ));
        assert!(elapsed >= Duration::from_millis(90), "took {elapsed:?}");
        assert!(elapsed < Duration::from_millis(190), "took {elapsed:?}");
        drop(left);
    }

    #[test]
    fn bad_magic_does_not_wait_for_body() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&raw_header(0xDEAD_BEEF, 4, 1000)).unwrap();

        let start = Instant::now();
        let mut buf = [0u8; 2048];
        let err = read_frame(right.as_raw_fd(), &mut buf, 5_000).unwrap_err();

        assert!(matches!(err, FrameError::BadMagic { found: 0xDEAD_BEEF }));
        assert!(start.elapsed() < Duration::from_secs(1));
        drop(left);
    }

    #[test]
    fn bad_magic_wins_over_body_size() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&raw_header(0, 4, u32::MAX)).unwrap();

        let mut buf = [0u8; HEADER_SIZE];
        let err = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap_err();
        assert_eq!(err.kind(), FrameErrorKind::BadMagic);
    }

    #[test]
    fn oversized_body_is_left_on_the_socket() {
        let (mut left, mut right) = UnixStream::pair().unwrap();
        let body = [0xAB; 64];
        left.write_all(&wire(5, &body)).unwrap();

        let mut buf = [0u8; HEADER_SIZE + 8];
        let err = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap_err();
        assert!(matches!(
            err,
            FrameError::BodyTooLarge {
                body_len: 64,
                capacity: 8
            }
        ));

        right
            .set_read_timeout(Some(Duration::from_millis(100)))
            .unwrap();
        let mut rest = [0u8; 64];
        right.read_exact(&mut rest).unwrap();
        assert_eq!(rest, body);
    }

    #[test]
    fn close_before_any_byte_is_peer_closed() {
        let (left, right) = UnixStream::pair().unwrap();
        drop(left);

        let mut buf = [0u8; 64];
        let err = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap_err();
        assert!(matches!(err, FrameError::PeerClosed));
    }

    #[test]
    fn close_mid_header_is_incomplete() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&wire(1, b"abc")[..5]).unwrap();
        drop(left);

        let mut buf = [0u8; 64];
        let err = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteHeader {
                received: 5,
                expected: HEADER_SIZE
            }
        ));
    }

    #[test]
    fn stall_mid_header_is_incomplete_after_timeout() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&wire(1, b"abc")[..6]).unwrap();

        let start = Instant::now();
        let mut buf = [0u8; 64];
        let err = read_frame(right.as_raw_fd(), &mut buf, 50).unwrap_err();

        assert_eq!(err.kind(), FrameErrorKind::IncompleteHeader);
        assert!(start.elapsed() < Duration::from_millis(150));
        drop(left);
    }

    #[test]
    fn silence_is_timed_out() {
        let (_left, right) = UnixStream::pair().unwrap();
        let mut buf = [0u8; 64];
        let err = read_frame(right.as_raw_fd(), &mut buf, 30).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn close_before_body_is_peer_closed() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&raw_header(MAGIC, 2, 4)).unwrap();
        drop(left);

        let mut buf = [0u8; 64];
        let err = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap_err();
        assert!(matches!(err, FrameError::PeerClosed));
    }

    #[test]
    fn rejects_bad_arguments() {
        let mut buf = [0u8; 64];
        let err = read_frame(-1, &mut buf, 100).unwrap_err();
        assert!(matches!(err, FrameError::InvalidArgument(_)));

        let (_left, right) = UnixStream::pair().unwrap();
        let mut small = [0u8; HEADER_SIZE - 1];
        let err = read_frame(right.as_raw_fd(), &mut small, 100).unwrap_err();
        assert!(matches!(err, FrameError::InvalidArgument(_)));
    }

    #[test]
    fn same_stream_same_result() {
        let bytes = wire(21, b"deterministic");
        let mut results = Vec::new();
        for _ in 0..2 {
            let (mut left, right) = UnixStream::pair().unwrap();
            left.write_all(&bytes).unwrap();
            let mut buf = [0u8; 64];
            let header = read_frame(right.as_raw_fd(), &mut buf, 100).unwrap();
            results.push((header, buf[..header.frame_len()].to_vec()));
        }
        assert_eq!(results[0], results[1]);
    }

    enum Step {
        Chunk(Vec<u8>),
        Stall,
        Interrupt,
        Close,
    }

    /// Hands out scripted chunks; records every wait budget it was given.
    struct Scripted {
        steps: VecDeque<Step>,
        waits: Vec<i32>,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                waits: Vec::new(),
            }
        }
    }

    impl ReadableSource for Scripted {
        fn wait_readable(&mut self, timeout_ms: i32) -> ghead_transport::Result<Readiness> {
            self.waits.push(timeout_ms);
            if matches!(self.steps.front(), Some(Step::Stall)) {
                self.steps.pop_front();
                return Ok(Readiness::TimedOut);
            }
            if self.steps.is_empty() {
                return Err(TransportError::Poll(std::io::Error::other("script exhausted")));
            }
            Ok(Readiness::Ready)
        }

        fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.steps.pop_front() {
                Some(Step::Chunk(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.steps.push_front(Step::Chunk(chunk.split_off(n)));
                    }
                    Ok(n)
                }
                Some(Step::Interrupt) => Err(std::io::Error::from(std::io::ErrorKind::Interrupted)),
                Some(Step::Close) | None => Ok(0),
                Some(Step::Stall) => unreachable!("stall is consumed by wait_readable"),
            }
        }
    }

    #[test]
    fn body_phase_gets_the_full_timeout_again() {
        let bytes = wire(8, b"body");
        let mut src = Scripted::new(vec![
            Step::Chunk(bytes[..4].to_vec()),
            Step::Chunk(bytes[4..HEADER_SIZE].to_vec()),
            Step::Chunk(bytes[HEADER_SIZE..].to_vec()),
        ]);
        let mut buf = [0u8; 32];
        let header = read_frame_from(&mut src, &mut buf, 40).unwrap();

        assert_eq!(header.body_len, 4);
        assert_eq!(src.waits, vec![40, 40, 40]);
    }

    #[test]
    fn interrupted_reads_still_produce_the_frame() {
        let bytes = wire(9, b"retry");
        let mut src = Scripted::new(vec![
            Step::Interrupt,
            Step::Chunk(bytes[..HEADER_SIZE].to_vec()),
            Step::Interrupt,
            Step::Chunk(bytes[HEADER_SIZE..].to_vec()),
        ]);
        let mut buf = [0u8; 32];
        let header = read_frame_from(&mut src, &mut buf, 100).unwrap();
        assert_eq!(&buf[HEADER_SIZE..header.frame_len()], b"retry");
    }

    #[test]
    fn body_timeout_before_any_byte_is_timed_out() {
        let bytes = wire(9, b"late");
        let mut src = Scripted::new(vec![Step::Chunk(bytes[..HEADER_SIZE].to_vec()), Step::Stall]);
        let mut buf = [0u8; 32];
        let err = read_frame_from(&mut src, &mut buf, 100).unwrap_err();
        assert!(matches!(err, FrameError::TimedOut));
    }

    #[test]
    fn body_close_after_some_bytes_is_incomplete() {
        let bytes = wire(9, b"truncated");
        let mut src = Scripted::new(vec![
            Step::Chunk(bytes[..HEADER_SIZE + 2].to_vec()),
            Step::Close,
        ]);
        let mut buf = [0u8; 32];
        let err = read_frame_from(&mut src, &mut buf, 100).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteBody {
                received: 2,
                expected: 9
            }
        ));
        assert_eq!(err.kind(), FrameErrorKind::ReadFailed);
    }

    #[test]
    fn poll_failure_is_a_read_failure() {
        let mut src = Scripted::new(Vec::new());
        let mut buf = [0u8; 32];
        let err = read_frame_from(&mut src, &mut buf, 100).unwrap_err();
        assert!(matches!(err, FrameError::Io(_)));
    }

    #[test]
    fn owned_reader_reads_consecutive_frames() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&wire(1, b"one")).unwrap();
        left.write_all(&wire(2, b"")).unwrap();
        left.write_all(&wire(3, b"three")).unwrap();

        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(100)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(right, cfg);

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!((f1.log_id(), f1.body.as_ref()), (1, b"one".as_ref()));
        assert_eq!((f2.log_id(), f2.body.as_ref()), (2, b"".as_ref()));
        assert_eq!((f3.log_id(), f3.body.as_ref()), (3, b"three".as_ref()));

        drop(left);
        assert!(matches!(reader.read_frame(), Err(FrameError::PeerClosed)));
    }

    #[test]
    fn owned_reader_enforces_max_body_len() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&raw_header(MAGIC, 6, 1 << 30)).unwrap();

        let mut reader = FrameReader::new(right);
        reader.set_max_body_len(1024);
        assert_eq!(reader.config().max_body_len, 1024);

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::BodyTooLarge {
                body_len: 1_073_741_824,
                capacity: 1024
            }
        ));
    }

    #[test]
    fn owned_reader_into_caller_buffer() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&wire(4, b"into")).unwrap();

        let mut reader = FrameReader::new(right);
        let mut buf = [0u8; 32];
        let header = reader.read_frame_into(&mut buf).unwrap();
        assert_eq!(&buf[HEADER_SIZE..header.frame_len()], b"into");

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[test]
    fn concurrent_readers_on_separate_sockets() {
        let handles: Vec<_> = (0..4u32)
            .map(|id| {
                let (mut left, right) = UnixStream::pair().unwrap();
                std::thread::spawn(move || {
                    let body = format!("msg-{id}");
                    left.write_all(&wire(id, body.as_bytes())).unwrap();
                    let mut reader = FrameReader::new(right);
                    let frame = reader.read_frame().unwrap();
                    assert_eq!(frame.log_id(), id);
                    assert_eq!(frame.body.as_ref(), body.as_bytes());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
