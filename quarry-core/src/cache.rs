use crate::{
    CompiledStatement, Config, Driver, Executor, HashKey, Result, SqlWriter, Statement, compile,
    statement_hash, truncate_long,
};
use anyhow::Context;
use lru::LruCache;
use std::{
    fmt::{self, Debug, Formatter},
    num::NonZeroUsize,
    sync::Arc,
};
use tokio::sync::Mutex;

/// Compiled statement with its provider handle.
///
/// The handle is behind a mutex: one execution at a time binds and steps it.
pub struct PreparedStatement<D: Driver> {
    pub compiled: CompiledStatement,
    pub prepared: Mutex<D::Prepared>,
}

impl<D: Driver> Debug for PreparedStatement<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("compiled", &self.compiled)
            .finish_non_exhaustive()
    }
}

/// Prepared statements of one connection, indexed by [`HashKey`].
///
/// Least recently used entries are dropped (and their handles finalized) once the capacity is
/// reached. A statement still executing keeps its handle alive until it completes.
pub struct PreparedCache<D: Driver> {
    entries: Mutex<LruCache<HashKey, Arc<PreparedStatement<D>>>>,
}

impl<D: Driver> PreparedCache<D> {
    /// Cache holding up to `capacity` statements, `0` for no limit.
    pub fn new(capacity: usize) -> Self {
        let entries = match NonZeroUsize::new(capacity) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// The prepared statement for `statement`.
    ///
    /// With `cached` the statement is looked up by its hash key and compiled and prepared only on
    /// a miss. Without, a new handle is prepared and the cache is neither read nor written.
    pub async fn get_or_compile<E, S>(
        &self,
        executor: &mut E,
        statement: &S,
        config: &Config,
        cached: bool,
    ) -> Result<Arc<PreparedStatement<D>>>
    where
        E: Executor<Driver = D>,
        S: Statement + ?Sized,
    {
        if !cached {
            return Self::prepare(executor, statement, config).await.map(Arc::new);
        }
        let hash_key = statement_hash(config, statement);
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(&hash_key) {
            log::trace!("Statement cache hit:\n{}", truncate_long!(entry.compiled.sql));
            return Ok(entry.clone());
        }
        let entry = Arc::new(Self::prepare(executor, statement, config).await?);
        if let Some((_, evicted)) = entries.push(hash_key, entry.clone()) {
            log::debug!(
                "Evicted from the statement cache:\n{}",
                truncate_long!(evicted.compiled.sql)
            );
        }
        Ok(entry)
    }

    async fn prepare<E, S>(
        executor: &mut E,
        statement: &S,
        config: &Config,
    ) -> Result<PreparedStatement<D>>
    where
        E: Executor<Driver = D>,
        S: Statement + ?Sized,
    {
        let compiled = {
            let writer = executor.driver().sql_writer();
            compile(writer.as_dyn(), config, statement)
        };
        let prepared = executor
            .prepare(compiled.sql.to_string())
            .await
            .with_context(|| format!("While preparing:\n{}", truncate_long!(compiled.sql)))?;
        Ok(PreparedStatement {
            compiled,
            prepared: Mutex::new(prepared),
        })
    }

    /// Number of statements currently cached.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Drops every cached statement.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl<D: Driver> Debug for PreparedCache<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedCache").finish_non_exhaustive()
    }
}
