use crate::{CBox, error_message_from_ptr};
use libsqlite3_sys::*;
use quarry_core::{ErrorKind, Prepared, Result, Value, truncate_long};
use std::{
    ffi::{CStr, c_char, c_int, c_void},
    fmt::{self, Debug, Display},
};

pub struct SqlitePrepared {
    pub(crate) statement: CBox<sqlite3_stmt>,
    pub(crate) index: u64,
}

impl SqlitePrepared {
    pub(crate) fn new(statement: CBox<sqlite3_stmt>) -> Self {
        Self {
            statement,
            index: 0,
        }
    }

    /// SQL text the statement was prepared from.
    pub fn sql(&self) -> String {
        let sql = unsafe { sqlite3_sql(*self.statement) };
        if sql.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(sql) }.to_string_lossy().into_owned()
    }

    /// Rewinds the statement to its first step, keeping the bindings.
    pub(crate) fn reset(&mut self) {
        unsafe {
            sqlite3_reset(*self.statement);
        }
    }
}

fn length(len: usize) -> Result<c_int> {
    c_int::try_from(len).map_err(|_| {
        ErrorKind::Provider.error(format!("Value of {} bytes is too large for SQLite", len))
    })
}

impl Prepared for SqlitePrepared {
    fn clear_bindings(&mut self) -> Result<&mut Self> {
        self.reset();
        unsafe {
            sqlite3_clear_bindings(*self.statement);
        }
        self.index = 0;
        Ok(self)
    }

    fn bind(&mut self, value: Value) -> Result<&mut Self> {
        let index = self.index;
        self.bind_index(value, index)
    }

    fn bind_index(&mut self, value: Value, index: u64) -> Result<&mut Self> {
        let position = (index + 1) as c_int;
        let statement = *self.statement;
        let rc = unsafe {
            match &value {
                Value::Null => sqlite3_bind_null(statement, position),
                Value::Boolean(v) => sqlite3_bind_int(statement, position, *v as c_int),
                Value::Integer(v) => sqlite3_bind_int64(statement, position, *v),
                Value::Real(v) => sqlite3_bind_double(statement, position, *v),
                Value::Text(v) => sqlite3_bind_text(
                    statement,
                    position,
                    v.as_ptr() as *const c_char,
                    length(v.len())?,
                    SQLITE_TRANSIENT(),
                ),
                Value::Blob(v) => sqlite3_bind_blob(
                    statement,
                    position,
                    v.as_ptr() as *const c_void,
                    length(v.len())?,
                    SQLITE_TRANSIENT(),
                ),
            }
        };
        if rc != SQLITE_OK {
            let message = error_message_from_ptr(unsafe {
                sqlite3_errmsg(sqlite3_db_handle(statement))
            });
            let error = ErrorKind::Provider.error(message).context(format!(
                "Cannot bind parameter {} to query:\n{}",
                position,
                truncate_long!(self.sql())
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        self.index = index + 1;
        Ok(self)
    }

    fn parameters(&self) -> usize {
        unsafe { sqlite3_bind_parameter_count(*self.statement) as usize }
    }
}

impl Display for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql()))
    }
}

impl Debug for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlitePrepared")
            .field("statement", &*self.statement)
            .field("sql", &self.sql())
            .finish()
    }
}
