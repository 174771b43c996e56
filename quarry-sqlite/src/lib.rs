mod cbox;
mod connection;
mod driver;
mod error_log;
mod extract;
mod prepared;
mod sql_writer;

use std::ffi::{CStr, c_char};

pub(crate) use cbox::*;
pub use connection::*;
pub use driver::*;
pub use error_log::ERROR_LOG_TARGET;
pub(crate) use error_log::register_error_log;
pub use prepared::*;
pub use sql_writer::*;

pub(crate) fn error_message_from_ptr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return "Unknown error (could not extract the error message)".into();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}
