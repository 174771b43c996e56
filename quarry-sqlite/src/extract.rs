use libsqlite3_sys::*;
use quarry_core::{ErrorKind, Result, Value};
use std::{
    ffi::{CStr, c_int},
    slice,
};

/// Bytes of a TEXT or BLOB column, `pointer` must be read before `sqlite3_column_bytes`.
unsafe fn column_bytes<'a>(statement: *mut sqlite3_stmt, index: c_int, pointer: *const u8) -> &'a [u8] {
    let len = unsafe { sqlite3_column_bytes(statement, index) } as usize;
    if len == 0 || pointer.is_null() {
        return &[];
    }
    unsafe { slice::from_raw_parts(pointer, len) }
}

pub(crate) fn extract_value(statement: *mut sqlite3_stmt, index: c_int) -> Result<Value> {
    unsafe {
        let column_type = sqlite3_column_type(statement, index);
        Ok(match column_type {
            SQLITE_NULL => Value::Null,
            SQLITE_INTEGER => Value::Integer(sqlite3_column_int64(statement, index)),
            SQLITE_FLOAT => Value::Real(sqlite3_column_double(statement, index)),
            SQLITE_TEXT => {
                let pointer = sqlite3_column_text(statement, index);
                let bytes = column_bytes(statement, index, pointer);
                Value::Text(String::from_utf8(bytes.to_vec()).map_err(|e| {
                    ErrorKind::Decode.error(format!("Column {} is not valid UTF-8: {}", index, e))
                })?)
            }
            SQLITE_BLOB => {
                let pointer = sqlite3_column_blob(statement, index) as *const u8;
                Value::Blob(column_bytes(statement, index, pointer).into())
            }
            _ => {
                return Err(ErrorKind::Provider.error(format!(
                    "Unexpected column type {}",
                    column_type
                )));
            }
        })
    }
}

pub(crate) fn extract_name(statement: *mut sqlite3_stmt, index: c_int) -> Result<String> {
    let name = unsafe { sqlite3_column_name(statement, index) };
    if name.is_null() {
        return Err(ErrorKind::Provider.error(format!("Cannot read the name of column {}", index)));
    }
    Ok(unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
}
