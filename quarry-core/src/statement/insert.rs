use crate::{
    ColumnDef, Entity, ErrorKind, Expression, HashKey, Identifier, Operand, Parameters, Result,
    RowDecoder, SelectStatement, SqlWriter, Statement, Table, TypedStatement, WithClause,
    writer::Context,
};
use std::{collections::BTreeSet, fmt::Debug, marker::PhantomData, sync::Arc};

#[derive(Debug, Clone)]
pub enum InsertSource {
    /// One list of expressions per row, aligned with the columns.
    Values(Vec<Vec<Arc<dyn Expression>>>),
    Select(Arc<dyn Statement>),
}

#[derive(Debug, Clone)]
pub struct InsertBody {
    pub with: Option<WithClause>,
    pub replace: bool,
    pub table: Identifier,
    pub columns: Vec<ColumnDef>,
    pub source: InsertSource,
}

/// `INSERT INTO` waiting for its rows.
pub struct InsertRoot<E: Entity> {
    with: Option<WithClause>,
    replace: bool,
    table: Identifier,
    _entity: PhantomData<fn() -> E>,
}

/// Starts an insert into the table of `E`.
pub fn insert<E: Entity>(table: &Table<E>) -> InsertRoot<E> {
    InsertRoot::new(table, None)
}

impl<E: Entity> InsertRoot<E> {
    pub(crate) fn new(table: &Table<E>, with: Option<WithClause>) -> Self {
        let table = table
            .reference()
            .table_name()
            .cloned()
            .unwrap_or_else(|| E::table_def().name.clone());
        Self {
            with,
            replace: false,
            table,
            _entity: PhantomData,
        }
    }

    /// `INSERT OR REPLACE`, rows conflicting on a unique constraint are replaced.
    pub fn or_replace(mut self) -> Self {
        self.replace = true;
        self
    }

    fn finish(self, source: InsertSource) -> Insert<E> {
        Insert {
            body: InsertBody {
                with: self.with,
                replace: self.replace,
                table: self.table,
                columns: E::table_def().columns.clone(),
                source,
            },
            _entity: PhantomData,
        }
    }

    fn row(entity: &E) -> Vec<Arc<dyn Expression>> {
        E::table_def()
            .columns
            .iter()
            .zip(entity.row_values())
            .map(|(column, value)| (column.write_wrapper)(Arc::new(Operand::Parameter(value))))
            .collect()
    }

    pub fn value(self, entity: &E) -> Insert<E> {
        let rows = vec![Self::row(entity)];
        self.finish(InsertSource::Values(rows))
    }

    /// Multiple rows in a single statement, at least one is required.
    pub fn values<'a>(self, entities: impl IntoIterator<Item = &'a E>) -> Result<Insert<E>> {
        let rows: Vec<_> = entities.into_iter().map(Self::row).collect();
        if rows.is_empty() {
            return Err(ErrorKind::Build.error(format!(
                "Insert into {:?} requires at least one row",
                self.table
            )));
        }
        Ok(self.finish(InsertSource::Values(rows)))
    }

    /// `INSERT INTO .. SELECT ..`, the select must produce the columns of `E` in order.
    pub fn select<S: SelectStatement<Row = E> + 'static>(self, statement: S) -> Insert<E> {
        self.finish(InsertSource::Select(Arc::new(statement)))
    }
}

/// Complete insert statement.
pub struct Insert<E: Entity> {
    body: InsertBody,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Insert<E> {
    pub fn body(&self) -> &InsertBody {
        &self.body
    }
}

impl<E: Entity> Debug for Insert<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Insert").field("body", &self.body).finish()
    }
}

impl<E: Entity> Statement for Insert<E> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_insert(context, out, &self.body)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        let body = &self.body;
        let mut parts = Vec::new();
        if let Some(with) = &body.with {
            parts.push(with.hash_key(context));
        }
        parts.push(HashKey::Symbol(if body.replace {
            "INSERT OR REPLACE INTO"
        } else {
            "INSERT INTO"
        }));
        parts.push(HashKey::identifier(&body.table));
        parts.push(HashKey::list(
            body.columns.iter().map(|v| HashKey::identifier(&v.name)),
        ));
        match &body.source {
            InsertSource::Values(rows) => {
                parts.push(HashKey::Symbol("VALUES"));
                for row in rows {
                    parts.push(HashKey::list(row.iter().map(|v| v.hash_key(context))));
                }
            }
            InsertSource::Select(statement) => parts.push(statement.hash_key(context)),
        }
        HashKey::composite(parts)
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        if let Some(with) = &self.body.with {
            with.bind_parameters(parameters);
        }
        match &self.body.source {
            InsertSource::Values(rows) => {
                for value in rows.iter().flatten() {
                    value.bind_parameters(parameters);
                }
            }
            InsertSource::Select(statement) => statement.bind_parameters(parameters),
        }
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        if let Some(with) = &self.body.with {
            with.related_tables(tables);
        }
        tables.insert(self.body.table.clone());
        if let InsertSource::Select(statement) = &self.body.source {
            statement.related_tables(tables);
        }
    }
}

impl<E: Entity> TypedStatement for Insert<E> {
    type Row = ();

    fn decode_row(&self, _row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        Ok(())
    }
}
