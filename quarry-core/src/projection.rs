use crate::{
    AsValue, Column, Entity, Expr, Expression, FieldRef, Identifier, Nullability, OptionalTable,
    Result, RowDecoder, Table, ValueKind,
};
use std::sync::Arc;

/// Column of a select list, `expression AS name`.
#[derive(Debug, Clone)]
pub struct ProjectedColumn {
    pub expression: Arc<dyn Expression>,
    pub name: Identifier,
    /// Positional name (`c0`), written without quotes whatever the identifier quoting.
    pub generated: bool,
    pub kind: ValueKind,
    pub nullable: bool,
}

/// Shape of a result column, part of the compiled statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    pub name: Identifier,
    pub kind: ValueKind,
    pub nullable: bool,
}

impl From<&ProjectedColumn> for ColumnPlan {
    fn from(value: &ProjectedColumn) -> Self {
        Self {
            name: value.name.clone(),
            kind: value.kind,
            nullable: value.nullable,
        }
    }
}

/// What a select produces: the select list and the decoding of each row.
///
/// Entity tables project their fields by name, standalone expressions are named after their
/// position (`c0`, `c1`, ...).
pub trait Projection: Send + Sync + 'static {
    type Row: Send + 'static;

    fn project(&self, columns: &mut Vec<ProjectedColumn>);
    fn decode(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row>;
}

/// Conversion into a projection, lets selects take references and columns directly.
pub trait IntoProjection {
    type Projection: Projection;
    fn into_projection(self) -> Self::Projection;
}

impl<T: AsValue> Projection for Expr<T> {
    type Row = T;

    fn project(&self, columns: &mut Vec<ProjectedColumn>) {
        let name = Identifier::generated(format!("c{}", columns.len()));
        columns.push(ProjectedColumn {
            expression: self.node().clone(),
            name,
            generated: true,
            kind: T::kind(),
            nullable: <T::Nullability as Nullability>::NULLABLE,
        });
    }

    fn decode(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        row.decode::<T>()
    }
}

/// Projects the fields of the entity in declaration order, `nullable` marks every column as
/// nullable (outer join side).
fn project_table<E: Entity>(table: &Table<E>, nullable: bool, columns: &mut Vec<ProjectedColumn>) {
    let reference = table.reference();
    for column in &E::table_def().columns {
        columns.push(ProjectedColumn {
            expression: Arc::new(FieldRef {
                table: reference.clone(),
                name: column.name.clone(),
                kind: column.kind,
            }),
            name: column.name.clone(),
            generated: false,
            kind: column.kind,
            nullable: nullable || column.nullable,
        });
    }
}

impl<E: Entity> Projection for Table<E> {
    type Row = E;

    fn project(&self, columns: &mut Vec<ProjectedColumn>) {
        project_table(self, false, columns);
    }

    fn decode(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        E::from_row(row)
    }
}

impl<E: Entity> Projection for OptionalTable<E> {
    type Row = Option<E>;

    fn project(&self, columns: &mut Vec<ProjectedColumn>) {
        project_table(&self.0, true, columns);
    }

    fn decode(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        let count = E::table_def().columns.len();
        if row.peek_all_null(count) {
            row.skip(count);
            return Ok(None);
        }
        E::from_row(row).map(Some)
    }
}

impl<T: AsValue> IntoProjection for Expr<T> {
    type Projection = Self;
    fn into_projection(self) -> Self::Projection {
        self
    }
}

impl<T: AsValue> IntoProjection for &Expr<T> {
    type Projection = Expr<T>;
    fn into_projection(self) -> Self::Projection {
        self.clone()
    }
}

impl<T: AsValue> IntoProjection for Column<T> {
    type Projection = Expr<T>;
    fn into_projection(self) -> Self::Projection {
        self.expr()
    }
}

impl<T: AsValue> IntoProjection for &Column<T> {
    type Projection = Expr<T>;
    fn into_projection(self) -> Self::Projection {
        self.expr()
    }
}

impl<E: Entity> IntoProjection for Table<E> {
    type Projection = Self;
    fn into_projection(self) -> Self::Projection {
        self
    }
}

impl<E: Entity> IntoProjection for &Table<E> {
    type Projection = Table<E>;
    fn into_projection(self) -> Self::Projection {
        self.clone()
    }
}

impl<E: Entity> IntoProjection for OptionalTable<E> {
    type Projection = Self;
    fn into_projection(self) -> Self::Projection {
        self
    }
}

macro_rules! impl_projection_for_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Projection),+> Projection for ($($name,)+) {
            type Row = ($($name::Row,)+);

            fn project(&self, columns: &mut Vec<ProjectedColumn>) {
                $(self.$idx.project(columns);)+
            }

            fn decode(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row> {
                Ok(($(self.$idx.decode(row)?,)+))
            }
        }

        impl<$($name: IntoProjection),+> IntoProjection for ($($name,)+) {
            type Projection = ($($name::Projection,)+);

            fn into_projection(self) -> Self::Projection {
                ($(self.$idx.into_projection(),)+)
            }
        }
    };
}

impl_projection_for_tuple!(A 0);
impl_projection_for_tuple!(A 0, B 1);
impl_projection_for_tuple!(A 0, B 1, C 2);
impl_projection_for_tuple!(A 0, B 1, C 2, D 3);
impl_projection_for_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_projection_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_projection_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_projection_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
