use crate::{
    Driver, Query, QueryResult, Result, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

/// Something that runs queries: a connection, or a transaction borrowing one.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Compiles `sql` into a provider handle.
    fn prepare(
        &mut self,
        sql: String,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Prepared>> + Send;

    /// General method to send any query and return any result type (either row or count).
    fn run<'s>(
        &'s mut self,
        query: Query<'s, Self::Driver>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's;

    /// Execute the query and returns the rows.
    fn fetch<'s>(
        &'s mut self,
        query: Query<'s, Self::Driver>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        self.run(query).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the query and return the total number of rows affected.
    fn execute<'s>(
        &'s mut self,
        query: Query<'s, Self::Driver>,
    ) -> impl Future<Output = Result<RowsAffected>> + Send + 's {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }
}
