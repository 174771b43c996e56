use crate::{
    Connection, Database, ErrorKind, Result, RowsAffected, Statement, TypedStatement,
    database::{execute_control, execute_statement, fetch_rows},
};
use std::fmt::{self, Debug, Formatter};
use tokio::sync::OwnedMutexGuard;

/// Transaction holding the connection of a [`Database`].
///
/// Other users of the database wait until it is committed or rolled back. Dropping it without
/// either rolls back in the background.
pub struct Transaction<C: Connection> {
    connection: Option<OwnedMutexGuard<C>>,
    database: Database<C>,
}

impl<C: Connection> Transaction<C> {
    pub(crate) async fn begin(database: Database<C>) -> Result<Self> {
        let mut connection = database.inner.connection.clone().lock_owned().await;
        execute_control(&mut *connection, |writer, out| {
            writer.write_transaction_begin(out)
        })
        .await?;
        Ok(Self {
            connection: Some(connection),
            database,
        })
    }

    fn connection(&mut self) -> Result<&mut C> {
        match self.connection.as_mut() {
            Some(connection) => Ok(&mut **connection),
            None => Err(ErrorKind::Build.error("The transaction is already finished")),
        }
    }

    pub async fn fetch_all<S: TypedStatement + ?Sized>(&mut self, statement: &S) -> Result<Vec<S::Row>> {
        let database = self.database.clone();
        fetch_rows(self.connection()?, &database.inner, statement, None).await
    }

    pub async fn fetch_one<S: TypedStatement + ?Sized>(
        &mut self,
        statement: &S,
    ) -> Result<Option<S::Row>> {
        let database = self.database.clone();
        let rows = fetch_rows(self.connection()?, &database.inner, statement, Some(1)).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn execute<S: Statement + ?Sized>(&mut self, statement: &S) -> Result<RowsAffected> {
        let database = self.database.clone();
        execute_statement(self.connection()?, &database.inner, statement).await
    }

    /// Makes the changes visible and notifies the live queries reading the written tables.
    pub async fn commit(mut self) -> Result<()> {
        execute_control(self.connection()?, |writer, out| {
            writer.write_transaction_commit(out)
        })
        .await?;
        self.connection = None;
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<()> {
        let result = execute_control(self.connection()?, |writer, out| {
            writer.write_transaction_rollback(out)
        })
        .await;
        self.connection = None;
        result.map(|_| ())
    }
}

impl<C: Connection> Debug for Transaction<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("finished", &self.connection.is_none())
            .finish_non_exhaustive()
    }
}

impl<C: Connection> Drop for Transaction<C> {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        log::warn!("Transaction dropped without commit or rollback, rolling back");
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let result = execute_control(&mut *connection, |writer, out| {
                        writer.write_transaction_rollback(out)
                    })
                    .await;
                    if let Err(e) = result {
                        log::error!("{:#}", e.context("While rolling back a dropped transaction"));
                    }
                });
            }
            Err(..) => log::error!("Cannot roll back a dropped transaction outside a tokio runtime"),
        }
    }
}
