use std::os::raw::c_int;

use ghead_frame::read_frame;

use crate::error;
use crate::types::{GheadHeader, GheadResult};

/// Read one frame from `fd` into `buf` within `timeout_ms` milliseconds.
///
/// On success `buf` holds the header followed by `body_len` body bytes, and
/// `out_header` (when non-null) receives the decoded header fields. On
/// failure the code names the reason and [`crate::ghead_last_error`] has the
/// message; any bytes already placed in `buf` are meaningless.
///
/// # Safety
/// `buf` must be null or writable for `buflen` bytes and not aliased for the
/// duration of the call. `out_header` must be null or a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ghead_read(
    fd: c_int,
    buf: *mut u8,
    buflen: usize,
    timeout_ms: c_int,
    out_header: *mut GheadHeader,
) -> GheadResult {
    crate::ffi_boundary(GheadResult::Internal, || {
        error::clear_error_state();
        if buf.is_null() {
            return error::set_invalid_argument("buf cannot be null");
        }

        let dst = {
            // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
            unsafe { std::slice::from_raw_parts_mut(buf, buflen) }
        };

        match read_frame(fd, dst, timeout_ms) {
            Ok(header) => {
                if !out_header.is_null() {
                    // SAFETY: Pointer validity is guaranteed by the caller.
                    unsafe { *out_header = header.into() };
                }
                GheadResult::Ok
            }
            Err(err) => error::map_frame_error(&err),
        }
    })
}
