//! ghead-ffi: C-ABI exports for the ghead frame reader.

mod error;
#[cfg(unix)]
mod frame;
mod types;

use std::panic::AssertUnwindSafe;

#[cfg(unix)]
pub use frame::ghead_read;
pub use types::{
    GheadHeader, GheadResult, GHEAD_ERR_BAD_MAGIC, GHEAD_ERR_BODY_TOO_LARGE,
    GHEAD_ERR_INCOMPLETE_HEADER, GHEAD_ERR_INTERNAL, GHEAD_ERR_INVALID_ARGUMENT,
    GHEAD_ERR_PEER_CLOSED, GHEAD_ERR_READ, GHEAD_ERR_TIMED_OUT, GHEAD_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Size in bytes of the fixed frame header.
#[no_mangle]
pub extern "C" fn ghead_header_size() -> usize {
    ghead_frame::HEADER_SIZE
}

/// The protocol magic expected at the start of every header.
#[no_mangle]
pub extern "C" fn ghead_magic() -> u32 {
    ghead_frame::MAGIC
}

#[no_mangle]
pub extern "C" fn ghead_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
