use crate::{
    CBox, SqliteDriver, SqlitePrepared, error_message_from_ptr,
    extract::{extract_name, extract_value},
    register_error_log,
};
use async_stream::try_stream;
use libsqlite3_sys::*;
use quarry_core::{
    CommitEvent, Config, Connection, Context, Driver, ErrorKind, Executor, Identifier, Query,
    QueryResult, Result, Row, RowLabeled, RowNames, RowsAffected,
    stream::Stream,
    truncate_long,
};
use std::{
    collections::BTreeSet,
    ffi::{CStr, CString, c_char, c_int, c_void},
    mem,
    ptr,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicPtr, Ordering},
    },
};
use tokio::{sync::broadcast, task::spawn_blocking};

// Exported by the bundled sqlite library but omitted from the libsqlite3-sys bindings.
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

/// Milliseconds a statement waits for a lock held by another connection.
const BUSY_TIMEOUT: c_int = 5_000;
/// Commit events buffered for each live query.
const NOTIFICATION_CAPACITY: usize = 64;

/// Connection to a SQLite database.
///
/// Every committed write transaction is published on [`notifications`](Connection::notifications)
/// together with the tables it changed.
pub struct SqliteConnection {
    pub(crate) connection: CBox<sqlite3>,
    hooks: Box<HookState>,
    config: Config,
}

/// Shared with the SQLite hooks, lives at a stable address until the hooks are removed.
struct HookState {
    pending: Mutex<BTreeSet<Identifier>>,
    sender: broadcast::Sender<CommitEvent>,
}

impl HookState {
    fn pending(&self) -> MutexGuard<'_, BTreeSet<Identifier>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

unsafe extern "C" fn update_hook(
    state: *mut c_void,
    _operation: c_int,
    _database: *const c_char,
    table: *const c_char,
    _rowid: sqlite3_int64,
) {
    let state = unsafe { &*(state as *const HookState) };
    if table.is_null() {
        return;
    }
    let table = unsafe { CStr::from_ptr(table) }.to_string_lossy();
    if let Ok(table) = Identifier::new(table) {
        state.pending().insert(table);
    }
}

unsafe extern "C" fn commit_hook(state: *mut c_void) -> c_int {
    let state = unsafe { &*(state as *const HookState) };
    let tables = mem::take(&mut *state.pending());
    // No receivers is not an error: nothing is subscribed
    let _ = state.sender.send(CommitEvent { tables });
    0
}

unsafe extern "C" fn rollback_hook(state: *mut c_void) {
    let state = unsafe { &*(state as *const HookState) };
    state.pending().clear();
}

/// Resets the statement when the row stream is done or dropped early.
struct Stepping<'a> {
    prepared: &'a mut SqlitePrepared,
}

impl Stepping<'_> {
    fn statement(&self) -> *mut sqlite3_stmt {
        *self.prepared.statement
    }
}

impl Drop for Stepping<'_> {
    fn drop(&mut self) {
        self.prepared.reset();
    }
}

fn prepare_sync(connection: *mut sqlite3, sql: &str) -> Result<CBox<sqlite3_stmt>> {
    let context = || format!("While preparing the query:\n{}", truncate_long!(sql));
    let len = c_int::try_from(sql.len())
        .map_err(|_| ErrorKind::Provider.error("The query is too long"))
        .with_context(context)?;
    let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
        sqlite3_finalize(p);
    });
    let mut tail: *const c_char = ptr::null();
    let rc = unsafe {
        sqlite3_prepare_v2(
            connection,
            sql.as_ptr() as *const c_char,
            len,
            &mut *statement,
            &mut tail,
        )
    };
    if rc != SQLITE_OK {
        let error = ErrorKind::Provider
            .error(error_message_from_ptr(unsafe { sqlite3_errmsg(connection) }))
            .context(context());
        log::error!("{:#}", error);
        return Err(error);
    }
    if statement.is_null() {
        let error = ErrorKind::Build
            .error("The query does not contain a statement")
            .context(context());
        log::error!("{:#}", error);
        return Err(error);
    }
    let consumed = if tail.is_null() {
        sql.len()
    } else {
        (tail as usize).saturating_sub(sql.as_ptr() as usize)
    };
    if !sql
        .as_bytes()
        .iter()
        .skip(consumed)
        .all(u8::is_ascii_whitespace)
    {
        let error = ErrorKind::Build
            .error("Cannot prepare more than one statement at a time")
            .context(context());
        log::error!("{:#}", error);
        return Err(error);
    }
    Ok(statement)
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &SqliteDriver {}
    }

    async fn prepare(&mut self, sql: String) -> Result<SqlitePrepared> {
        let connection = AtomicPtr::new(*self.connection);
        let statement =
            spawn_blocking(move || prepare_sync(connection.load(Ordering::Relaxed), &sql))
                .await??;
        Ok(SqlitePrepared::new(statement))
    }

    fn run<'s>(
        &'s mut self,
        query: Query<'s, SqliteDriver>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        try_stream! {
            let mut owned;
            let prepared = match query {
                Query::Raw(sql) => {
                    owned = self.prepare(sql).await?;
                    &mut owned
                }
                Query::Prepared(prepared) => prepared,
            };
            let stepping = Stepping { prepared };
            let before = unsafe { sqlite3_total_changes64(*self.connection) };
            let count = unsafe { sqlite3_column_count(stepping.statement()) };
            let labels = (0..count)
                .map(|i| extract_name(stepping.statement(), i))
                .collect::<Result<RowNames>>()?;
            loop {
                let rc = unsafe { sqlite3_step(stepping.statement()) };
                match rc {
                    SQLITE_ROW => {
                        let values = (0..count)
                            .map(|i| extract_value(stepping.statement(), i))
                            .collect::<Result<Row>>()?;
                        yield QueryResult::Row(RowLabeled::new(labels.clone(), values));
                    }
                    SQLITE_DONE => break,
                    SQLITE_BUSY => {
                        tokio::task::yield_now().await;
                    }
                    _ => {
                        let error = ErrorKind::Provider
                            .error(error_message_from_ptr(unsafe {
                                sqlite3_errmsg(*self.connection)
                            }))
                            .context(format!(
                                "While executing the query:\n{}",
                                truncate_long!(stepping.prepared.sql())
                            ));
                        log::error!("{:#}", error);
                        Err::<(), _>(error)?;
                    }
                }
            }
            if count == 0 {
                let changes = unsafe { sqlite3_total_changes64(*self.connection) } - before;
                yield QueryResult::Affected(RowsAffected {
                    rows_affected: changes.max(0) as u64,
                    last_affected_id: (changes > 0)
                        .then(|| unsafe { sqlite3_last_insert_rowid(*self.connection) }),
                });
            }
        }
    }
}

impl Connection for SqliteConnection {
    async fn connect(url: &str) -> Result<SqliteConnection> {
        let context = || format!("While connecting to `{}`", url);
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = ErrorKind::Build
                .error(format!(
                    "Expected the sqlite connection url to start with `{}`",
                    prefix
                ))
                .context(context());
            log::error!("{:#}", error);
            return Err(error);
        };
        let (config, location) = Config::extract_from_url(location).with_context(context)?;
        let path = CString::new(format!("file:{}", location)).with_context(context)?;
        let flags =
            SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI | SQLITE_OPEN_FULLMUTEX;
        register_error_log();
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close_v2(p);
        });
        let rc = unsafe { sqlite3_open_v2(path.as_ptr(), &mut *connection, flags, ptr::null()) };
        if rc != SQLITE_OK {
            let message = if connection.is_null() {
                "Out of memory".to_string()
            } else {
                error_message_from_ptr(unsafe { sqlite3_errmsg(*connection) })
            };
            let error = ErrorKind::Provider.error(message).context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let hooks = Box::new(HookState {
            pending: Default::default(),
            sender: broadcast::channel(NOTIFICATION_CAPACITY).0,
        });
        unsafe {
            sqlite3_busy_timeout(*connection, BUSY_TIMEOUT);
            let state = &*hooks as *const HookState as *mut c_void;
            sqlite3_update_hook(*connection, Some(update_hook), state);
            sqlite3_commit_hook(*connection, Some(commit_hook), state);
            sqlite3_rollback_hook(*connection, Some(rollback_hook), state);
        }
        log::debug!("Connected to `{}`", location);
        Ok(Self {
            connection,
            hooks,
            config,
        })
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn notifications(&self) -> broadcast::Receiver<CommitEvent> {
        self.hooks.sender.subscribe()
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        unsafe {
            sqlite3_update_hook(*self.connection, None, ptr::null_mut());
            sqlite3_commit_hook(*self.connection, None, ptr::null_mut());
            sqlite3_rollback_hook(*self.connection, None, ptr::null_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::prepare_sync;
    use crate::SqliteConnection;
    use quarry_core::{Connection, ErrorKind};

    #[tokio::test]
    async fn single_statement_only() {
        let connection = SqliteConnection::connect("sqlite://:memory:").await.unwrap();
        assert!(prepare_sync(*connection.connection, "SELECT 1;  \n").is_ok());
        let error = prepare_sync(*connection.connection, "SELECT 1; SELECT 2").unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
        let error = prepare_sync(*connection.connection, "SELEC 1").unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Provider));
        assert!(prepare_sync(*connection.connection, "  ").is_err());
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("connection", &*self.connection)
            .field("config", &self.config)
            .finish()
    }
}
