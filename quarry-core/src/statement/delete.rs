use crate::{
    Condition, Entity, Expression, HashKey, Identifier, Parameters, Result, RowDecoder, SqlWriter,
    Statement, Table, TableRef, TypedStatement, WithClause, writer::Context,
};
use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    sync::Arc,
};

#[derive(Debug, Clone)]
pub struct DeleteBody {
    pub with: Option<WithClause>,
    pub table: TableRef,
    pub filter: Option<Arc<dyn Expression>>,
}

/// `DELETE FROM` every row of the table.
pub struct DeleteRoot<E: Entity> {
    body: DeleteBody,
    _entity: PhantomData<fn() -> E>,
}

/// `DELETE FROM .. WHERE ..`.
pub struct DeleteWhere<E: Entity> {
    body: DeleteBody,
    _entity: PhantomData<fn() -> E>,
}

/// Starts a delete from the table of `E`.
///
/// The statement is complete as is and removes every row, restrict it with
/// [`where_`](DeleteRoot::where_).
pub fn delete<E: Entity>(table: &Table<E>) -> DeleteRoot<E> {
    DeleteRoot::new(table, None)
}

impl<E: Entity> DeleteRoot<E> {
    pub(crate) fn new(table: &Table<E>, with: Option<WithClause>) -> Self {
        Self {
            body: DeleteBody {
                with,
                table: table.reference().clone(),
                filter: None,
            },
            _entity: PhantomData,
        }
    }

    pub fn where_(mut self, condition: impl Condition) -> DeleteWhere<E> {
        self.body.filter = Some(condition.into_condition());
        DeleteWhere {
            body: self.body,
            _entity: PhantomData,
        }
    }
}

macro_rules! impl_delete_statement {
    ($($ty:ident),+) => {
        $(
            impl<E: Entity> $ty<E> {
                pub fn body(&self) -> &DeleteBody {
                    &self.body
                }
            }

            impl<E: Entity> Debug for $ty<E> {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($ty)).field("body", &self.body).finish()
                }
            }

            impl<E: Entity> Statement for $ty<E> {
                fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
                    writer.write_delete(context, out, &self.body)
                }

                fn hash_key(&self, context: &mut Context) -> HashKey {
                    let mut parts = Vec::new();
                    if let Some(with) = &self.body.with {
                        parts.push(with.hash_key(context));
                    }
                    parts.push(HashKey::Symbol("DELETE FROM"));
                    parts.push(self.body.table.declaration_hash(context));
                    if let Some(filter) = &self.body.filter {
                        parts.push(HashKey::Symbol("WHERE"));
                        parts.push(filter.hash_key(context));
                    }
                    HashKey::composite(parts)
                }

                fn bind_parameters(&self, parameters: &mut Parameters) {
                    if let Some(with) = &self.body.with {
                        with.bind_parameters(parameters);
                    }
                    if let Some(filter) = &self.body.filter {
                        filter.bind_parameters(parameters);
                    }
                }

                fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
                    if let Some(with) = &self.body.with {
                        with.related_tables(tables);
                    }
                    self.body.table.related_tables(tables);
                    if let Some(filter) = &self.body.filter {
                        filter.related_tables(tables);
                    }
                }

                fn is_unrestricted_write(&self) -> bool {
                    self.body.filter.is_none()
                }
            }

            impl<E: Entity> TypedStatement for $ty<E> {
                type Row = ();

                fn decode_row(&self, _row: &mut RowDecoder<'_>) -> Result<Self::Row> {
                    Ok(())
                }
            }
        )+
    };
}

impl_delete_statement!(DeleteRoot, DeleteWhere);
