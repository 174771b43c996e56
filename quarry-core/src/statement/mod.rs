mod compound;
mod create;
mod delete;
mod insert;
mod select;
mod update;
mod with;

pub use compound::*;
pub use create::*;
pub use delete::*;
pub use insert::*;
pub use select::*;
pub use update::*;
pub use with::*;

use crate::{
    ColumnPlan, HashKey, Identifier, Parameters, Result, RowDecoder, SqlWriter,
    writer::Context,
};
use std::{collections::BTreeSet, fmt::Debug, sync::Arc};

/// Complete SQL statement that can be compiled and executed.
pub trait Statement: Send + Sync + Debug {
    /// Serialize the statement, without trailing semicolon.
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String);
    /// Structural key, equal for statements that compile to the same SQL text.
    fn hash_key(&self, context: &mut Context) -> HashKey;
    /// Append the bound values in placeholder order.
    fn bind_parameters(&self, parameters: &mut Parameters);
    /// Names of the tables the statement reads or writes.
    fn related_tables(&self, tables: &mut BTreeSet<Identifier>);
    /// Result columns.
    fn columns(&self) -> Vec<ColumnPlan> {
        Vec::new()
    }
    /// Whether the statement writes every row of its table (update or delete without filter).
    fn is_unrestricted_write(&self) -> bool {
        false
    }
}

/// Statement with a typed result row.
pub trait TypedStatement: Statement {
    type Row: Send + 'static;

    fn decode_row(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row>;
}

/// Statement producing rows: usable as subquery, derived table or CTE body.
pub trait SelectStatement: TypedStatement {}

/// Select that can appear on either side of `UNION`, `INTERSECT` or `EXCEPT`.
///
/// Excludes selects with `ORDER BY` or `LIMIT`, which SQLite only accepts at the end of the
/// compound.
pub trait CompoundOperand: SelectStatement {
    /// Clauses of the operand, written after the compound operator.
    fn into_body(self) -> SelectBody;
}

impl<S: Statement + ?Sized> Statement for Arc<S> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        (**self).write_query(writer, context, out)
    }
    fn hash_key(&self, context: &mut Context) -> HashKey {
        (**self).hash_key(context)
    }
    fn bind_parameters(&self, parameters: &mut Parameters) {
        (**self).bind_parameters(parameters)
    }
    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        (**self).related_tables(tables)
    }
    fn columns(&self) -> Vec<ColumnPlan> {
        (**self).columns()
    }
    fn is_unrestricted_write(&self) -> bool {
        (**self).is_unrestricted_write()
    }
}

impl<S: TypedStatement + ?Sized> TypedStatement for Arc<S> {
    type Row = S::Row;

    fn decode_row(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        (**self).decode_row(row)
    }
}

/// Collects the values bound to the placeholders of `statement`.
pub fn parameters_of<S: Statement + ?Sized>(statement: &S) -> Parameters {
    let mut parameters = Parameters::new();
    statement.bind_parameters(&mut parameters);
    parameters
}

/// Collects the tables `statement` depends on.
pub fn tables_of<S: Statement + ?Sized>(statement: &S) -> BTreeSet<Identifier> {
    let mut tables = BTreeSet::new();
    statement.related_tables(&mut tables);
    tables
}
