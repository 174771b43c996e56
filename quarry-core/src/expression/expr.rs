use crate::{
    AsValue, BinaryOp, BinaryOpType, Case, Cast, Expression, Function, HashKey, Identifier,
    InList, Nullability, Numeric, Operand, Order, Ordered, Parameters, Promoted, Scalar,
    SelectStatement, SqlWriter, Subquery, SubqueryKind, UnaryOp, UnaryOpType, writer::Context,
};
use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    ops::{BitAnd, BitOr, Neg, Not},
    sync::Arc,
};
use time::Date;

/// Expression producing values of the Rust type `T`.
///
/// `T` carries both the scalar kind and the nullability: `Expr<i64>` is never NULL while
/// `Expr<Option<i64>>` may be. Operators combine the nullability of their operands, comparing an
/// optional column with anything yields `Expr<Option<bool>>`.
pub struct Expr<T> {
    node: Arc<dyn Expression>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Expr<T> {
    pub fn from_node(node: Arc<dyn Expression>) -> Self {
        Self {
            node,
            _type: PhantomData,
        }
    }

    pub fn new(node: impl Expression + 'static) -> Self {
        Self::from_node(Arc::new(node))
    }

    pub fn node(&self) -> &Arc<dyn Expression> {
        &self.node
    }

    pub fn into_node(self) -> Arc<dyn Expression> {
        self.node
    }

    /// Same expression viewed as another Rust type.
    pub(crate) fn retype<U>(self) -> Expr<U> {
        Expr::from_node(self.node)
    }
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<T> Debug for Expr<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

impl<T> Expression for Expr<T> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        self.node.write_query(writer, context, out)
    }
    fn hash_key(&self, context: &mut Context) -> HashKey {
        self.node.hash_key(context)
    }
    fn bind_parameters(&self, parameters: &mut Parameters) {
        self.node.bind_parameters(parameters)
    }
    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.node.related_tables(tables)
    }
}

fn binary<O>(op: BinaryOpType, lhs: Arc<dyn Expression>, rhs: Arc<dyn Expression>) -> Expr<O> {
    Expr::new(BinaryOp { op, lhs, rhs })
}

fn call<O>(name: &'static str, args: Vec<Arc<dyn Expression>>) -> Expr<O> {
    Expr::new(Function::new(name, args))
}

impl<T: AsValue> Expr<T> {
    fn compare<R: AsValue<Base = T::Base>>(
        &self,
        op: BinaryOpType,
        rhs: Expr<R>,
    ) -> Expr<Promoted<T, R, bool>> {
        binary(
            op,
            <T::Base as Scalar>::wrap_for_read(self.node.clone()),
            <T::Base as Scalar>::wrap_for_read(rhs.node),
        )
    }

    pub fn eq<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.compare(BinaryOpType::Equal, rhs.into_expr())
    }

    pub fn ne<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.compare(BinaryOpType::NotEqual, rhs.into_expr())
    }

    pub fn lt<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.compare(BinaryOpType::Less, rhs.into_expr())
    }

    pub fn le<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.compare(BinaryOpType::LessEqual, rhs.into_expr())
    }

    pub fn gt<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.compare(BinaryOpType::Greater, rhs.into_expr())
    }

    pub fn ge<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.compare(BinaryOpType::GreaterEqual, rhs.into_expr())
    }

    /// `IS`, equality treating NULL as a comparable value. Never NULL itself.
    pub fn is<R, E>(&self, rhs: E) -> Expr<bool>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.compare::<R>(BinaryOpType::Is, rhs.into_expr()).retype()
    }

    pub fn is_not<R, E>(&self, rhs: E) -> Expr<bool>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.compare::<R>(BinaryOpType::IsNot, rhs.into_expr()).retype()
    }

    pub fn is_in<R, E>(&self, values: impl IntoIterator<Item = E>) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        Expr::new(InList {
            arg: <T::Base as Scalar>::wrap_for_read(self.node.clone()),
            list: values
                .into_iter()
                .map(|v| <T::Base as Scalar>::wrap_for_read(v.into_expr().node))
                .collect(),
            negated: false,
        })
    }

    pub fn not_in<R, E>(&self, values: impl IntoIterator<Item = E>) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        Expr::new(InList {
            arg: <T::Base as Scalar>::wrap_for_read(self.node.clone()),
            list: values
                .into_iter()
                .map(|v| <T::Base as Scalar>::wrap_for_read(v.into_expr().node))
                .collect(),
            negated: true,
        })
    }

    /// `self IN (SELECT ...)` over a single column select of the same scalar.
    pub fn in_query<S>(&self, statement: S) -> Expr<Promoted<T, T, bool>>
    where
        S: SelectStatement + 'static,
        S::Row: AsValue<Base = T::Base>,
    {
        Expr::new(Subquery {
            kind: SubqueryKind::In(self.node.clone()),
            statement: Arc::new(statement),
        })
    }

    pub fn asc(&self) -> Ordered {
        Ordered {
            expression: <T::Base as Scalar>::wrap_for_read(self.node.clone()),
            order: Order::Asc,
        }
    }

    pub fn desc(&self) -> Ordered {
        Ordered {
            expression: <T::Base as Scalar>::wrap_for_read(self.node.clone()),
            order: Order::Desc,
        }
    }

    /// `COUNT(self)`, the number of non NULL values.
    pub fn count(&self) -> Expr<i64> {
        call("COUNT", vec![self.node.clone()])
    }

    pub fn count_distinct(&self) -> Expr<i64> {
        Expr::new(Function::new("COUNT", vec![self.node.clone()]).distinct())
    }

    pub fn min(&self) -> Expr<Option<T::Base>> {
        call("MIN", vec![self.node.clone()])
    }

    pub fn max(&self) -> Expr<Option<T::Base>> {
        call("MAX", vec![self.node.clone()])
    }

    pub fn cast<U: Scalar>(&self) -> Expr<<T::Nullability as Nullability>::Apply<U>> {
        Expr::new(Cast {
            arg: self.node.clone(),
            kind: U::KIND,
        })
    }
}

impl<T: AsValue<Base = bool>> Expr<T> {
    pub fn and<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = bool>,
        E: IntoExpr<R>,
    {
        binary(BinaryOpType::And, self.node.clone(), rhs.into_expr().node)
    }

    pub fn or<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = bool>,
        E: IntoExpr<R>,
    {
        binary(BinaryOpType::Or, self.node.clone(), rhs.into_expr().node)
    }
}

impl<T: AsValue<Base = bool>> Not for Expr<T> {
    type Output = Expr<T>;
    fn not(self) -> Self::Output {
        Expr::new(UnaryOp {
            op: UnaryOpType::Not,
            arg: self.node,
        })
    }
}

impl<T: AsValue<Base = bool>> Not for &Expr<T> {
    type Output = Expr<T>;
    fn not(self) -> Self::Output {
        !self.clone()
    }
}

impl<T: AsValue<Base = bool>, R: AsValue<Base = bool>> BitAnd<Expr<R>> for Expr<T> {
    type Output = Expr<Promoted<T, R, bool>>;
    fn bitand(self, rhs: Expr<R>) -> Self::Output {
        self.and(rhs)
    }
}

impl<T: AsValue<Base = bool>, R: AsValue<Base = bool>> BitOr<Expr<R>> for Expr<T> {
    type Output = Expr<Promoted<T, R, bool>>;
    fn bitor(self, rhs: Expr<R>) -> Self::Output {
        self.or(rhs)
    }
}

impl<T: AsValue> Expr<T>
where
    T::Base: Numeric,
{
    fn arithmetic<R: AsValue<Base = T::Base>>(
        &self,
        op: BinaryOpType,
        rhs: Expr<R>,
    ) -> Expr<Promoted<T, R, T::Base>> {
        binary(op, self.node.clone(), rhs.node)
    }

    pub fn add<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, T::Base>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.arithmetic(BinaryOpType::Addition, rhs.into_expr())
    }

    pub fn sub<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, T::Base>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.arithmetic(BinaryOpType::Subtraction, rhs.into_expr())
    }

    pub fn mul<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, T::Base>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.arithmetic(BinaryOpType::Multiplication, rhs.into_expr())
    }

    /// Division, NULL when the divisor is zero.
    pub fn div<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, T::Base>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.arithmetic(BinaryOpType::Division, rhs.into_expr())
    }

    pub fn rem<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, T::Base>>
    where
        R: AsValue<Base = T::Base>,
        E: IntoExpr<R>,
    {
        self.arithmetic(BinaryOpType::Remainder, rhs.into_expr())
    }

    pub fn abs(&self) -> Expr<T> {
        call("ABS", vec![self.node.clone()])
    }

    /// `SUM(self)`, NULL over an empty set.
    pub fn sum(&self) -> Expr<Option<T::Base>> {
        call("SUM", vec![self.node.clone()])
    }

    /// `TOTAL(self)`, `0.0` over an empty set.
    pub fn total(&self) -> Expr<f64> {
        call("TOTAL", vec![self.node.clone()])
    }

    pub fn avg(&self) -> Expr<Option<f64>> {
        call("AVG", vec![self.node.clone()])
    }
}

impl<T: AsValue> Neg for Expr<T>
where
    T::Base: Numeric,
{
    type Output = Expr<T>;
    fn neg(self) -> Self::Output {
        Expr::new(UnaryOp {
            op: UnaryOpType::Negative,
            arg: self.node,
        })
    }
}

impl<T: AsValue<Base = String>> Expr<T> {
    pub fn like<R, E>(&self, pattern: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = String>,
        E: IntoExpr<R>,
    {
        binary(BinaryOpType::Like, self.node.clone(), pattern.into_expr().node)
    }

    pub fn not_like<R, E>(&self, pattern: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = String>,
        E: IntoExpr<R>,
    {
        binary(
            BinaryOpType::NotLike,
            self.node.clone(),
            pattern.into_expr().node,
        )
    }

    /// Case sensitive Unix style pattern match.
    pub fn glob<R, E>(&self, pattern: E) -> Expr<Promoted<T, R, bool>>
    where
        R: AsValue<Base = String>,
        E: IntoExpr<R>,
    {
        binary(BinaryOpType::Glob, self.node.clone(), pattern.into_expr().node)
    }

    pub fn concat<R, E>(&self, rhs: E) -> Expr<Promoted<T, R, String>>
    where
        R: AsValue<Base = String>,
        E: IntoExpr<R>,
    {
        binary(BinaryOpType::Concat, self.node.clone(), rhs.into_expr().node)
    }

    pub fn lower(&self) -> Expr<T> {
        call("LOWER", vec![self.node.clone()])
    }

    pub fn upper(&self) -> Expr<T> {
        call("UPPER", vec![self.node.clone()])
    }

    pub fn trim(&self) -> Expr<T> {
        call("TRIM", vec![self.node.clone()])
    }

    pub fn length(&self) -> Expr<<T::Nullability as Nullability>::Apply<i64>> {
        call("LENGTH", vec![self.node.clone()])
    }
}

impl<B: Scalar> Expr<Option<B>> {
    pub fn is_null(&self) -> Expr<bool> {
        Expr::new(UnaryOp {
            op: UnaryOpType::IsNull,
            arg: self.node.clone(),
        })
    }

    pub fn is_not_null(&self) -> Expr<bool> {
        Expr::new(UnaryOp {
            op: UnaryOpType::IsNotNull,
            arg: self.node.clone(),
        })
    }

    /// `COALESCE(self, fallback)`, the first non NULL value.
    pub fn coalesce<E: IntoExpr<B>>(&self, fallback: E) -> Expr<B> {
        call("COALESCE", vec![self.node.clone(), fallback.into_expr().node])
    }
}

/// Value bound as a statement parameter.
pub fn value<T: AsValue>(value: T) -> Expr<T> {
    Expr::new(Operand::Parameter(value.as_value()))
}

/// Value printed inline in the SQL text, it becomes part of the statement identity.
pub fn literal<T: AsValue>(value: T) -> Expr<T> {
    Expr::new(Operand::Literal(value.as_value()))
}

pub fn null<T: Scalar>() -> Expr<Option<T>> {
    Expr::new(Operand::Null)
}

/// `COUNT(*)`.
pub fn count_all() -> Expr<i64> {
    call("COUNT", vec![Arc::new(Operand::Asterisk)])
}

/// `EXISTS (SELECT ...)`.
pub fn exists<S: SelectStatement + 'static>(statement: S) -> Expr<bool> {
    Expr::new(Subquery {
        kind: SubqueryKind::Exists,
        statement: Arc::new(statement),
    })
}

/// `(SELECT ...)` used as a value. NULL when the select produces no row.
pub fn scalar<S>(statement: S) -> Expr<Option<<S::Row as AsValue>::Base>>
where
    S: SelectStatement + 'static,
    S::Row: AsValue,
{
    Expr::new(Subquery {
        kind: SubqueryKind::Scalar,
        statement: Arc::new(statement),
    })
}

/// `CASE WHEN condition THEN then ELSE otherwise END`.
pub fn iif<C, T, EC, ET, EO>(condition: EC, then: ET, otherwise: EO) -> Expr<T>
where
    C: AsValue<Base = bool>,
    T: AsValue,
    EC: IntoExpr<C>,
    ET: IntoExpr<T>,
    EO: IntoExpr<T>,
{
    case().when(condition, then).otherwise(otherwise)
}

/// Searched `CASE` expression builder.
pub fn case<T: AsValue>() -> CaseBuilder<T> {
    CaseBuilder {
        branches: Vec::new(),
        _type: PhantomData,
    }
}

pub struct CaseBuilder<T> {
    branches: Vec<(Arc<dyn Expression>, Arc<dyn Expression>)>,
    _type: PhantomData<fn() -> T>,
}

impl<T: AsValue> CaseBuilder<T> {
    pub fn when<C, EC, EV>(mut self, condition: EC, value: EV) -> Self
    where
        C: AsValue<Base = bool>,
        EC: IntoExpr<C>,
        EV: IntoExpr<T>,
    {
        self.branches
            .push((condition.into_expr().node, value.into_expr().node));
        self
    }

    pub fn otherwise<E: IntoExpr<T>>(self, value: E) -> Expr<T> {
        Expr::new(Case {
            branches: self.branches,
            otherwise: Some(value.into_expr().node),
        })
    }

    /// Close the expression without `ELSE`, unmatched rows produce NULL.
    pub fn end(self) -> Expr<Option<T::Base>> {
        Expr::new(Case {
            branches: self.branches,
            otherwise: None,
        })
    }
}

/// Anything usable where an `Expr<T>` is expected: expressions, columns and plain values.
pub trait IntoExpr<T> {
    fn into_expr(self) -> Expr<T>;
}

impl<T> IntoExpr<T> for Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self
    }
}

impl<T> IntoExpr<T> for &Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self.clone()
    }
}

macro_rules! impl_into_expr_for_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoExpr<$ty> for $ty {
                fn into_expr(self) -> Expr<$ty> {
                    value(self)
                }
            }
            impl IntoExpr<Option<$ty>> for Option<$ty> {
                fn into_expr(self) -> Expr<Option<$ty>> {
                    value(self)
                }
            }
        )+
    };
}

impl_into_expr_for_value!(bool, i64, f64, String, Vec<u8>, Date);

impl IntoExpr<String> for &str {
    fn into_expr(self) -> Expr<String> {
        value(self.to_owned())
    }
}

impl IntoExpr<Option<String>> for Option<&str> {
    fn into_expr(self) -> Expr<Option<String>> {
        value(self.map(ToOwned::to_owned))
    }
}

impl IntoExpr<Vec<u8>> for &[u8] {
    fn into_expr(self) -> Expr<Vec<u8>> {
        value(self.to_vec())
    }
}

/// Boolean expression accepted by `WHERE`, `HAVING` and `JOIN .. ON`, nullable or not.
pub trait Condition {
    fn into_condition(self) -> Arc<dyn Expression>;
}

impl<T: AsValue<Base = bool>> Condition for Expr<T> {
    fn into_condition(self) -> Arc<dyn Expression> {
        self.node
    }
}

impl<T: AsValue<Base = bool>> Condition for &Expr<T> {
    fn into_condition(self) -> Arc<dyn Expression> {
        self.node.clone()
    }
}

impl Condition for bool {
    fn into_condition(self) -> Arc<dyn Expression> {
        Arc::new(Operand::Literal(self.into()))
    }
}

/// Expressions accepted by `GROUP BY`: a single expression or a tuple of them.
pub trait ExpressionList {
    fn expressions(self) -> Vec<Arc<dyn Expression>>;
}

impl<T> ExpressionList for Expr<T> {
    fn expressions(self) -> Vec<Arc<dyn Expression>> {
        vec![self.node]
    }
}

impl<T> ExpressionList for &Expr<T> {
    fn expressions(self) -> Vec<Arc<dyn Expression>> {
        vec![self.node.clone()]
    }
}

macro_rules! impl_expression_list_for_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: ExpressionList),+> ExpressionList for ($($name,)+) {
            fn expressions(self) -> Vec<Arc<dyn Expression>> {
                let mut result = Vec::new();
                $(result.extend(self.$idx.expressions());)+
                result
            }
        }
    };
}

impl_expression_list_for_tuple!(A 0);
impl_expression_list_for_tuple!(A 0, B 1);
impl_expression_list_for_tuple!(A 0, B 1, C 2);
impl_expression_list_for_tuple!(A 0, B 1, C 2, D 3);
impl_expression_list_for_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_expression_list_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
