use crate::{
    AsValue, Condition, Expr, Expression, ExpressionList, FieldRef, Identifier, IntoExpr, Nullability,
    Scalar, Value, ValueKind,
};
use std::{
    fmt::{self, Debug, Formatter},
    ops::Deref,
    sync::Arc,
};

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Identifier,
    pub name: Identifier,
}

/// Schema level definition of a column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: Identifier,
    pub kind: ValueKind,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub references: Option<ColumnRef>,
    pub default: Option<Value>,
    /// Applied to every value written into the column.
    pub write_wrapper: fn(Arc<dyn Expression>) -> Arc<dyn Expression>,
}

impl ColumnDef {
    pub fn new<T: AsValue>(name: &'static str) -> Self {
        Self {
            name: Identifier::from_static(name),
            kind: T::kind(),
            nullable: <T::Nullability as Nullability>::NULLABLE,
            primary_key: false,
            unique: false,
            references: None,
            default: None,
            write_wrapper: <T::Base as Scalar>::unwrap_for_write,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, table: &'static str, name: &'static str) -> Self {
        self.references = Some(ColumnRef {
            table: Identifier::from_static(table),
            name: Identifier::from_static(name),
        });
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Typed field of a table reference, dereferences to its expression.
pub struct Column<T> {
    field: FieldRef,
    expr: Expr<T>,
}

impl<T> Column<T> {
    pub fn new(field: FieldRef) -> Self {
        Self {
            expr: Expr::new(field.clone()),
            field,
        }
    }

    pub fn field(&self) -> &FieldRef {
        &self.field
    }

    pub fn name(&self) -> &Identifier {
        &self.field.name
    }

    pub fn expr(&self) -> Expr<T> {
        self.expr.clone()
    }
}

impl<T> Deref for Column<T> {
    type Target = Expr<T>;
    fn deref(&self) -> &Self::Target {
        &self.expr
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            expr: self.expr.clone(),
        }
    }
}

impl<T> Debug for Column<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.field.fmt(f)
    }
}

impl<T> IntoExpr<T> for Column<T> {
    fn into_expr(self) -> Expr<T> {
        self.expr
    }
}

impl<T> IntoExpr<T> for &Column<T> {
    fn into_expr(self) -> Expr<T> {
        self.expr.clone()
    }
}

impl<T> ExpressionList for &Column<T> {
    fn expressions(self) -> Vec<Arc<dyn Expression>> {
        vec![self.expr.node().clone()]
    }
}

impl<T: AsValue<Base = bool>> Condition for &Column<T> {
    fn into_condition(self) -> Arc<dyn Expression> {
        self.expr.node().clone()
    }
}
