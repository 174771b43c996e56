use crate::error_message_from_ptr;
use libsqlite3_sys::*;
use std::{
    ffi::{c_char, c_int, c_void},
    ptr,
    sync::Once,
};

/// Target of the records coming from the SQLite error log.
pub const ERROR_LOG_TARGET: &str = "sqlite";

static REGISTER: Once = Once::new();

extern "C" fn error_log(_state: *mut c_void, code: c_int, message: *const c_char) {
    let message = error_message_from_ptr(message);
    match code & 0xff {
        SQLITE_NOTICE => log::info!(target: ERROR_LOG_TARGET, "({}) {}", code, message),
        SQLITE_WARNING => log::warn!(target: ERROR_LOG_TARGET, "({}) {}", code, message),
        _ => log::error!(target: ERROR_LOG_TARGET, "({}) {}", code, message),
    }
}

/// Routes the SQLite error log to the `log` facade.
///
/// SQLite only accepts it before the library is initialized, so it runs once, ahead of the first
/// `sqlite3_open_v2`.
pub(crate) fn register_error_log() {
    REGISTER.call_once(|| {
        let rc = unsafe {
            sqlite3_config(
                SQLITE_CONFIG_LOG,
                error_log as extern "C" fn(*mut c_void, c_int, *const c_char),
                ptr::null_mut::<c_void>(),
            )
        };
        if rc != SQLITE_OK {
            log::warn!(
                "Could not route the SQLite error log, sqlite3_config returned {}",
                rc
            );
        }
    });
}
