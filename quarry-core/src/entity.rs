use crate::{
    ColumnDef, DataSet, Identifier, Result, RowDecoder, SelectStatement, TableRef, TableSource,
    Value,
};
use std::{
    fmt::{self, Debug, Formatter},
    ops::Deref,
    sync::Arc,
};

/// Schema level definition of a table.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: Identifier,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: Identifier, columns: Vec<ColumnDef>) -> Self {
        Self { name, columns }
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|v| v.primary_key)
    }

}

/// Rust type mapped to a table. Implemented by the [`entity!`](crate::entity) macro.
pub trait Entity: Sized + Send + Sync + 'static {
    /// Struct holding one typed column per field.
    type Columns: Send + Sync + 'static;

    fn table_def() -> &'static TableDef;
    /// Columns bound to the given table reference.
    fn columns(table: &TableRef) -> Self::Columns;
    /// Reads the fields in declaration order.
    fn from_row(row: &mut RowDecoder<'_>) -> Result<Self>;
    /// Values of the fields in declaration order.
    fn row_values(&self) -> Vec<Value>;

    /// New reference to the table of this entity.
    fn table() -> Table<Self> {
        Table::new()
    }
}

/// Reference to a table (or CTE, or nested select) shaped like the entity `E`.
///
/// Dereferences to the entity columns, so fields are accessed as `person.name`.
pub struct Table<E: Entity> {
    handle: TableRef,
    bound_columns: Arc<E::Columns>,
}

impl<E: Entity> Table<E> {
    pub fn new() -> Self {
        let def = E::table_def();
        Self::with_source(TableSource::Table(def.name.clone()))
    }

    /// Reads from a nested select producing `E` rows, `(SELECT ...) AS t0`.
    pub fn derived<S>(statement: S) -> Self
    where
        S: SelectStatement<Row = E> + 'static,
    {
        Self::with_source(TableSource::Derived(Arc::new(statement)))
    }

    pub(crate) fn with_source(source: TableSource) -> Self {
        let handle = TableRef::new(source);
        let bound_columns = Arc::new(E::columns(&handle));
        Self {
            handle,
            bound_columns,
        }
    }

    pub fn reference(&self) -> &TableRef {
        &self.handle
    }

    pub fn columns(&self) -> &E::Columns {
        &self.bound_columns
    }

    /// Same reference projected as `Option<E>`, `None` when all its columns are NULL.
    pub fn nullable(&self) -> OptionalTable<E> {
        OptionalTable(self.clone())
    }
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for Table<E> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            bound_columns: self.bound_columns.clone(),
        }
    }
}

impl<E: Entity> Deref for Table<E> {
    type Target = E::Columns;
    fn deref(&self) -> &Self::Target {
        &self.bound_columns
    }
}

impl<E: Entity> Debug for Table<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.handle.fmt(f)
    }
}

impl<E: Entity> DataSet for Table<E> {
    fn table_ref(&self) -> &TableRef {
        &self.handle
    }
}

/// Table projected as `Option<E>`, typically the right side of a `LEFT JOIN`.
pub struct OptionalTable<E: Entity>(pub(crate) Table<E>);

impl<E: Entity> OptionalTable<E> {
    pub fn table(&self) -> &Table<E> {
        &self.0
    }
}

impl<E: Entity> Clone for OptionalTable<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<E: Entity> Debug for OptionalTable<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Optional({:?})", self.0)
    }
}

impl<E: Entity> DataSet for OptionalTable<E> {
    fn table_ref(&self) -> &TableRef {
        &self.0.handle
    }
}
