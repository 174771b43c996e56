use crate::{
    AsValue, Column, Condition, Entity, Expression, HashKey, Identifier, IntoExpr, Operand,
    Parameters, Result, RowDecoder, Scalar, SqlWriter, Statement, Table, TableRef, TypedStatement,
    WithClause, writer::Context,
};
use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    sync::Arc,
};

#[derive(Debug, Clone)]
pub struct UpdateBody {
    pub with: Option<WithClause>,
    pub table: TableRef,
    pub assignments: Vec<(Identifier, Arc<dyn Expression>)>,
    pub filter: Option<Arc<dyn Expression>>,
}

impl UpdateBody {
    fn hash_key(&self, context: &mut Context) -> HashKey {
        let mut parts = Vec::new();
        if let Some(with) = &self.with {
            parts.push(with.hash_key(context));
        }
        parts.push(HashKey::Symbol("UPDATE"));
        parts.push(self.table.declaration_hash(context));
        parts.push(HashKey::Symbol("SET"));
        parts.push(HashKey::list(self.assignments.iter().map(|(name, value)| {
            HashKey::composite([HashKey::identifier(name), value.hash_key(context)])
        })));
        if let Some(filter) = &self.filter {
            parts.push(HashKey::Symbol("WHERE"));
            parts.push(filter.hash_key(context));
        }
        HashKey::composite(parts)
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        if let Some(with) = &self.with {
            with.bind_parameters(parameters);
        }
        self.table.bind_parameters(parameters);
        for (_, value) in &self.assignments {
            value.bind_parameters(parameters);
        }
        if let Some(filter) = &self.filter {
            filter.bind_parameters(parameters);
        }
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        if let Some(with) = &self.with {
            with.related_tables(tables);
        }
        self.table.related_tables(tables);
        for (_, value) in &self.assignments {
            value.related_tables(tables);
        }
        if let Some(filter) = &self.filter {
            filter.related_tables(tables);
        }
    }
}

/// `UPDATE` without assignments yet.
pub struct UpdateRoot<E: Entity> {
    body: UpdateBody,
    _entity: PhantomData<fn() -> E>,
}

/// Update with at least one assignment. Without [`where_`](Self::where_) it writes every row.
pub struct UpdateSet<E: Entity> {
    body: UpdateBody,
    _entity: PhantomData<fn() -> E>,
}

/// Update restricted by a `WHERE` clause.
pub struct UpdateWhere<E: Entity> {
    body: UpdateBody,
    _entity: PhantomData<fn() -> E>,
}

/// Starts an update of the table of `E`.
pub fn update<E: Entity>(table: &Table<E>) -> UpdateRoot<E> {
    UpdateRoot::new(table, None)
}

fn assignment<T: AsValue>(value: impl IntoExpr<T>) -> Arc<dyn Expression> {
    <T::Base as Scalar>::unwrap_for_write(value.into_expr().into_node())
}

impl<E: Entity> UpdateRoot<E> {
    pub(crate) fn new(table: &Table<E>, with: Option<WithClause>) -> Self {
        Self {
            body: UpdateBody {
                with,
                table: table.reference().clone(),
                assignments: Vec::new(),
                filter: None,
            },
            _entity: PhantomData,
        }
    }

    /// `SET column = value`.
    pub fn set<T: AsValue>(mut self, column: &Column<T>, value: impl IntoExpr<T>) -> UpdateSet<E> {
        self.body
            .assignments
            .push((column.name().clone(), assignment(value)));
        UpdateSet {
            body: self.body,
            _entity: PhantomData,
        }
    }

    /// Assigns every column except the primary key from `entity`.
    pub fn set_all(mut self, entity: &E) -> UpdateSet<E> {
        self.body.assignments = E::table_def()
            .columns
            .iter()
            .zip(entity.row_values())
            .filter(|(column, _)| !column.primary_key)
            .map(|(column, value)| {
                (
                    column.name.clone(),
                    (column.write_wrapper)(Arc::new(Operand::Parameter(value))),
                )
            })
            .collect();
        UpdateSet {
            body: self.body,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> UpdateSet<E> {
    pub fn set<T: AsValue>(mut self, column: &Column<T>, value: impl IntoExpr<T>) -> Self {
        self.body
            .assignments
            .push((column.name().clone(), assignment(value)));
        self
    }

    pub fn where_(mut self, condition: impl Condition) -> UpdateWhere<E> {
        self.body.filter = Some(condition.into_condition());
        UpdateWhere {
            body: self.body,
            _entity: PhantomData,
        }
    }
}

macro_rules! impl_update_statement {
    ($($ty:ident),+) => {
        $(
            impl<E: Entity> $ty<E> {
                pub fn body(&self) -> &UpdateBody {
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
                    writer.write_update(context, out, &self.body)
                }

                fn hash_key(&self, context: &mut Context) -> HashKey {
                    self.body.hash_key(context)
                }

                fn bind_parameters(&self, parameters: &mut Parameters) {
                    self.body.bind_parameters(parameters)
                }

                fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
                    self.body.related_tables(tables)
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

impl_update_statement!(UpdateSet, UpdateWhere);
