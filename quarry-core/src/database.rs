use crate::{
    CompiledStatement, Config, Connection, Driver, ErrorKind, LiveQuery, Parameters,
    Prepared, PreparedCache, PreparedStatement, Query, Result, RowDecoder, RowsAffected,
    SqlWriter, Statement, Transaction, TypedStatement, live, parameters_of,
    stream::{Stream, TryStreamExt},
    tables_of, truncate_long,
};
use async_stream::try_stream;
use futures::future::BoxFuture;
use std::{
    fmt::{self, Debug, Formatter},
    pin::pin,
    sync::Arc,
};
use tokio::sync::Mutex;

/// Shared handle to a connection and its prepared statement cache.
///
/// Cloning is cheap, clones use the same connection. Operations are serialized on the connection:
/// a statement runs to completion (or until its row stream is dropped) before the next one starts.
pub struct Database<C: Connection> {
    pub(crate) inner: Arc<DatabaseInner<C>>,
}

pub(crate) struct DatabaseInner<C: Connection> {
    pub(crate) cache: PreparedCache<C::Driver>,
    pub(crate) connection: Arc<Mutex<C>>,
    pub(crate) config: Config,
}

impl<C: Connection> Clone for Database<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Connection> Debug for Database<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("driver", &<C::Driver as Driver>::NAME)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<C: Connection> Database<C> {
    /// Connects to `url`, see [`Config::extract_from_url`] for the recognized parameters.
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(C::connect(url).await?))
    }

    pub fn new(connection: C) -> Self {
        let config = *connection.config();
        Self {
            inner: Arc::new(DatabaseInner {
                cache: PreparedCache::new(config.cache_capacity),
                connection: Arc::new(Mutex::new(connection)),
                config,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Compiles and prepares `statement`.
    ///
    /// With `cached` the handle comes from (or is stored in) the statement cache, two statements
    /// with the same hash key get the same handle. Without, every call prepares a new handle.
    pub async fn prepare<S: Statement + ?Sized>(
        &self,
        statement: &S,
        cached: bool,
    ) -> Result<Arc<PreparedStatement<C::Driver>>> {
        let mut connection = self.inner.connection.lock().await;
        self.inner
            .cache
            .get_or_compile(&mut *connection, statement, &self.inner.config, cached)
            .await
    }

    /// Runs `statement` and decodes every row.
    pub async fn fetch_all<S: TypedStatement + ?Sized>(&self, statement: &S) -> Result<Vec<S::Row>> {
        let mut connection = self.inner.connection.lock().await;
        fetch_rows(&mut *connection, &self.inner, statement, None).await
    }

    /// Runs `statement` and decodes the first row, if any.
    pub async fn fetch_one<S: TypedStatement + ?Sized>(
        &self,
        statement: &S,
    ) -> Result<Option<S::Row>> {
        let mut connection = self.inner.connection.lock().await;
        let rows = fetch_rows(&mut *connection, &self.inner, statement, Some(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Runs `statement` and decodes the rows as they are produced.
    ///
    /// The connection stays busy until the stream is exhausted or dropped.
    pub fn fetch<S>(&self, statement: S) -> impl Stream<Item = Result<S::Row>> + Send + 'static
    where
        S: TypedStatement + 'static,
    {
        let database = self.clone();
        try_stream! {
            let inner = &database.inner;
            let mut connection = inner.connection.lock().await;
            let connection = &mut *connection;
            let prepared = inner
                .cache
                .get_or_compile(connection, &statement, &inner.config, inner.config.cache_statements)
                .await?;
            let mut handle = prepared.prepared.lock().await;
            bind_parameters(&prepared.compiled, &mut *handle, parameters_of(&statement))?;
            let mut rows = pin!(connection.fetch(Query::Prepared(&mut *handle)));
            while let Some(mut row) = rows.try_next().await? {
                let decoded = statement.decode_row(&mut RowDecoder::new(&mut row.values))?;
                yield decoded;
            }
        }
    }

    /// Runs a statement that does not produce rows.
    pub async fn execute<S: Statement + ?Sized>(&self, statement: &S) -> Result<RowsAffected> {
        let mut connection = self.inner.connection.lock().await;
        execute_statement(&mut *connection, &self.inner, statement).await
    }

    /// Starts a transaction, holding the connection until it is committed or rolled back.
    pub async fn begin(&self) -> Result<Transaction<C>> {
        Transaction::begin(self.clone()).await
    }

    /// Runs `body` inside a transaction: commits when it returns `Ok`, rolls back otherwise.
    ///
    /// ```rust,ignore
    /// let total = db
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             tx.execute(&insert(&person).value(&alice)).await?;
    ///             tx.fetch_one(&select(count_all()).from(&person)).await
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn transaction<T, F>(&self, body: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t mut Transaction<C>) -> BoxFuture<'t, Result<T>>,
    {
        let mut transaction = self.begin().await?;
        match body(&mut transaction).await {
            Ok(value) => {
                transaction.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(e) = transaction.rollback().await {
                    log::error!("{:#}", e.context("While rolling back a failed transaction"));
                }
                Err(error)
            }
        }
    }

    /// Keeps the result of `statement` up to date.
    ///
    /// The statement runs once before this returns, and again after every commit that writes one
    /// of the tables it reads. Failures are published like results.
    pub async fn subscribe<S>(&self, statement: S) -> LiveQuery<S::Row>
    where
        S: TypedStatement + 'static,
        S::Row: Sync,
    {
        let events = self.inner.connection.lock().await.notifications();
        let tables = tables_of(&statement);
        let initial = self.fetch_all(&statement).await;
        live::spawn_refresh(self.clone(), statement, tables, events, initial)
    }

    /// Number of statements in the cache.
    pub async fn cached_statements(&self) -> usize {
        self.inner.cache.len().await
    }

    /// Finalizes every cached statement.
    pub async fn clear_cache(&self) {
        self.inner.cache.clear().await
    }
}

pub(crate) async fn fetch_rows<C, S>(
    connection: &mut C,
    inner: &DatabaseInner<C>,
    statement: &S,
    limit: Option<usize>,
) -> Result<Vec<S::Row>>
where
    C: Connection,
    S: TypedStatement + ?Sized,
{
    let prepared = inner
        .cache
        .get_or_compile(
            connection,
            statement,
            &inner.config,
            inner.config.cache_statements,
        )
        .await?;
    let mut handle = prepared.prepared.lock().await;
    bind_parameters(&prepared.compiled, &mut *handle, parameters_of(statement))?;
    let mut result = Vec::new();
    let mut rows = pin!(connection.fetch(Query::Prepared(&mut *handle)));
    while let Some(mut row) = rows.try_next().await? {
        result.push(statement.decode_row(&mut RowDecoder::new(&mut row.values))?);
        if limit.is_some_and(|v| result.len() >= v) {
            break;
        }
    }
    Ok(result)
}

pub(crate) async fn execute_statement<C, S>(
    connection: &mut C,
    inner: &DatabaseInner<C>,
    statement: &S,
) -> Result<RowsAffected>
where
    C: Connection,
    S: Statement + ?Sized,
{
    let prepared = inner
        .cache
        .get_or_compile(
            connection,
            statement,
            &inner.config,
            inner.config.cache_statements,
        )
        .await?;
    if statement.is_unrestricted_write() {
        log::warn!(
            "Statement writes every row of the table:\n{}",
            truncate_long!(prepared.compiled.sql)
        );
    }
    let mut handle = prepared.prepared.lock().await;
    bind_parameters(&prepared.compiled, &mut *handle, parameters_of(statement))?;
    connection.execute(Query::Prepared(&mut *handle)).await
}

/// Runs the transaction control statement produced by `write`.
pub(crate) async fn execute_control<C, F>(connection: &mut C, write: F) -> Result<RowsAffected>
where
    C: Connection,
    F: FnOnce(&dyn SqlWriter, &mut String),
{
    let mut sql = String::with_capacity(16);
    write(connection.driver().sql_writer().as_dyn(), &mut sql);
    connection.execute(Query::Raw(sql)).await
}

/// Clears `prepared` and binds `parameters` in placeholder order.
pub(crate) fn bind_parameters<P: Prepared>(
    compiled: &CompiledStatement,
    prepared: &mut P,
    parameters: Parameters,
) -> Result<()> {
    check_arity(compiled, prepared.parameters(), parameters.len())?;
    prepared.clear_bindings()?;
    for (index, value) in parameters.into_inner().into_iter().enumerate() {
        prepared.bind_index(value, index as u64)?;
    }
    Ok(())
}

fn check_arity(compiled: &CompiledStatement, provider: usize, bound: usize) -> Result<()> {
    if compiled.parameters == bound && provider == bound {
        return Ok(());
    }
    let error = ErrorKind::Arity
        .error(format!(
            "The statement has {} placeholders ({} according to the provider) but {} values were bound",
            compiled.parameters, provider, bound,
        ))
        .context(format!(
            "While binding the parameters of:\n{}",
            truncate_long!(compiled.sql)
        ));
    log::error!("{:#}", error);
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::check_arity;
    use crate::{CompiledStatement, ErrorKind, HashKey};
    use std::sync::Arc;

    fn compiled(parameters: usize) -> CompiledStatement {
        CompiledStatement {
            sql: "SELECT ? AS c0".into(),
            hash_key: HashKey::Symbol("SELECT"),
            parameters,
            columns: Arc::new([]),
            tables: Default::default(),
        }
    }

    #[test]
    fn arity_matches() {
        assert!(check_arity(&compiled(1), 1, 1).is_ok());
        assert!(check_arity(&compiled(0), 0, 0).is_ok());
    }

    #[test]
    fn arity_mismatch() {
        let error = check_arity(&compiled(1), 1, 2).unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Arity));
        let error = check_arity(&compiled(2), 1, 2).unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Arity));
    }
}
