use crate::{Connection, Prepared, SqlWriter};
use std::fmt::Debug;

/// Execution provider: ties together the connection, the SQL dialect and the prepared handle.
pub trait Driver: Debug + Send + Sync + Sized + 'static {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;
    type Prepared: Prepared;

    /// Name of the provider, also the URL scheme it accepts.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
