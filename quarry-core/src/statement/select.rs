use crate::{
    ColumnPlan, Compound, CompoundOperand, CompoundOperator, Condition, DataSet, ErrorKind,
    Expression, ExpressionList, HashKey, Identifier, IntoProjection, Join, JoinType, Ordered,
    Parameters, ProjectedColumn, Projection, Result, RowDecoder, SelectStatement, SqlWriter,
    Statement, TableRef, TypedStatement, Value, WithClause, writer::Context,
};
use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    sync::Arc,
};

/// Clauses accumulated by a select, in writing order.
#[derive(Default, Debug, Clone)]
pub struct SelectBody {
    pub with: Option<WithClause>,
    pub distinct: bool,
    pub columns: Vec<ProjectedColumn>,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    pub filter: Option<Arc<dyn Expression>>,
    pub group_by: Vec<Arc<dyn Expression>>,
    pub having: Option<Arc<dyn Expression>>,
    pub order_by: Vec<Ordered>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SelectBody {
    /// Allocates the aliases of the tables read by this select before the select list refers to
    /// them, so `SELECT t0."name"` and `FROM "person" AS t0` agree.
    pub fn declare_sources(&self, context: &mut Context) {
        if let Some(from) = &self.from {
            context.table_alias(from);
        }
        for join in &self.joins {
            context.table_alias(&join.table);
        }
    }

    pub fn hash_key(&self, context: &mut Context) -> HashKey {
        let mut parts = Vec::new();
        if let Some(with) = &self.with {
            parts.push(with.hash_key(context));
        }
        parts.push(HashKey::Symbol(if self.distinct {
            "SELECT DISTINCT"
        } else {
            "SELECT"
        }));
        self.declare_sources(context);
        parts.push(HashKey::list(self.columns.iter().map(|v| {
            HashKey::composite([v.expression.hash_key(context), HashKey::identifier(&v.name)])
        })));
        if let Some(from) = &self.from {
            parts.push(HashKey::Symbol("FROM"));
            parts.push(from.declaration_hash(context));
        }
        parts.extend(self.joins.iter().map(|v| v.hash_key(context)));
        if let Some(filter) = &self.filter {
            parts.push(HashKey::Symbol("WHERE"));
            parts.push(filter.hash_key(context));
        }
        if !self.group_by.is_empty() {
            parts.push(HashKey::Symbol("GROUP BY"));
            parts.push(HashKey::list(self.group_by.iter().map(|v| v.hash_key(context))));
        }
        if let Some(having) = &self.having {
            parts.push(HashKey::Symbol("HAVING"));
            parts.push(having.hash_key(context));
        }
        if !self.order_by.is_empty() {
            parts.push(HashKey::Symbol("ORDER BY"));
            parts.push(HashKey::list(self.order_by.iter().map(|v| v.hash_key(context))));
        }
        if self.limit.is_some() {
            parts.push(HashKey::Symbol("LIMIT ?"));
        }
        if self.offset.is_some() {
            parts.push(HashKey::Symbol("OFFSET ?"));
        }
        HashKey::composite(parts)
    }

    pub fn bind_parameters(&self, parameters: &mut Parameters) {
        if let Some(with) = &self.with {
            with.bind_parameters(parameters);
        }
        for column in &self.columns {
            column.expression.bind_parameters(parameters);
        }
        if let Some(from) = &self.from {
            from.bind_parameters(parameters);
        }
        for join in &self.joins {
            join.bind_parameters(parameters);
        }
        if let Some(filter) = &self.filter {
            filter.bind_parameters(parameters);
        }
        for expression in &self.group_by {
            expression.bind_parameters(parameters);
        }
        if let Some(having) = &self.having {
            having.bind_parameters(parameters);
        }
        for ordered in &self.order_by {
            ordered.bind_parameters(parameters);
        }
        if let Some(limit) = self.limit {
            parameters.push(Value::Integer(limit));
        }
        if let Some(offset) = self.offset {
            parameters.push(Value::Integer(offset));
        }
    }

    pub fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        if let Some(with) = &self.with {
            with.related_tables(tables);
        }
        for column in &self.columns {
            column.expression.related_tables(tables);
        }
        if let Some(from) = &self.from {
            from.related_tables(tables);
        }
        for join in &self.joins {
            join.related_tables(tables);
        }
        for expression in self
            .filter
            .iter()
            .chain(self.group_by.iter())
            .chain(self.having.iter())
        {
            expression.related_tables(tables);
        }
        for ordered in &self.order_by {
            ordered.related_tables(tables);
        }
    }

    pub fn plan(&self) -> Vec<ColumnPlan> {
        self.columns.iter().map(ColumnPlan::from).collect()
    }
}

/// Stages of a select. Each stage only exposes the clauses that can legally follow it.
pub mod stage {
    /// Select list only, not executable yet.
    #[derive(Debug)]
    pub struct Root;
    #[derive(Debug)]
    pub struct From;
    #[derive(Debug)]
    pub struct Where;
    #[derive(Debug)]
    pub struct GroupBy;
    #[derive(Debug)]
    pub struct Having;
    #[derive(Debug)]
    pub struct OrderBy;
    #[derive(Debug)]
    pub struct Limit;
    #[derive(Debug)]
    pub struct Offset;
}

pub trait AllowGroupBy {}
impl AllowGroupBy for stage::From {}
impl AllowGroupBy for stage::Where {}

pub trait AllowOrderBy {}
impl AllowOrderBy for stage::From {}
impl AllowOrderBy for stage::Where {}
impl AllowOrderBy for stage::GroupBy {}
impl AllowOrderBy for stage::Having {}

pub trait AllowLimit {}
impl AllowLimit for stage::From {}
impl AllowLimit for stage::Where {}
impl AllowLimit for stage::GroupBy {}
impl AllowLimit for stage::Having {}
impl AllowLimit for stage::OrderBy {}

/// Stages that form a complete statement.
pub trait Executable: Send + Sync + 'static {}
impl Executable for stage::From {}
impl Executable for stage::Where {}
impl Executable for stage::GroupBy {}
impl Executable for stage::Having {}
impl Executable for stage::OrderBy {}
impl Executable for stage::Limit {}
impl Executable for stage::Offset {}

/// Stages that can be an operand of `UNION`, `INTERSECT` and `EXCEPT`.
pub trait AllowCompound: Executable {}
impl AllowCompound for stage::From {}
impl AllowCompound for stage::Where {}
impl AllowCompound for stage::GroupBy {}
impl AllowCompound for stage::Having {}

/// Typed select statement producing `P::Row` values, at stage `S`.
pub struct Select<P, S> {
    body: SelectBody,
    projection: P,
    _stage: PhantomData<fn() -> S>,
}

pub type SelectRoot<P> = Select<P, stage::Root>;
pub type SelectFrom<P> = Select<P, stage::From>;
pub type SelectWhere<P> = Select<P, stage::Where>;
pub type SelectGrouped<P> = Select<P, stage::GroupBy>;
pub type SelectHaving<P> = Select<P, stage::Having>;
pub type SelectOrdered<P> = Select<P, stage::OrderBy>;
pub type SelectLimited<P> = Select<P, stage::Limit>;
pub type SelectOffset<P> = Select<P, stage::Offset>;

/// Starts a select statement.
///
/// ```rust,ignore
/// let person = Person::table();
/// let adults = select((&person.name, &person.age))
///     .from(&person)
///     .where_(person.age.ge(18))
///     .order_by([person.name.asc()]);
/// ```
pub fn select<P: IntoProjection>(projection: P) -> SelectRoot<P::Projection> {
    Select::with_clause(projection, None)
}

impl<P, S> Select<P, S> {
    pub fn body(&self) -> &SelectBody {
        &self.body
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    fn advance<N>(self) -> Select<P, N> {
        Select {
            body: self.body,
            projection: self.projection,
            _stage: PhantomData,
        }
    }
}

impl<P: Projection> Select<P, stage::Root> {
    pub(crate) fn with_clause<I>(projection: I, with: Option<WithClause>) -> Self
    where
        I: IntoProjection<Projection = P>,
    {
        let projection = projection.into_projection();
        let mut columns = Vec::new();
        projection.project(&mut columns);
        Self {
            body: SelectBody {
                with,
                columns,
                ..Default::default()
            },
            projection,
            _stage: PhantomData,
        }
    }

    /// `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.body.distinct = true;
        self
    }

    pub fn from(mut self, table: impl DataSet) -> SelectFrom<P> {
        self.body.from = Some(table.table_ref().clone());
        self.advance()
    }
}

impl<P: Projection> Select<P, stage::From> {
    fn push_join(
        mut self,
        kind: JoinType,
        table: &impl DataSet,
        on: Option<Arc<dyn Expression>>,
    ) -> Self {
        self.body.joins.push(Join {
            kind,
            table: table.table_ref().clone(),
            on,
        });
        self
    }

    /// `JOIN table ON condition`.
    pub fn join(self, table: impl DataSet, on: impl Condition) -> Self {
        self.push_join(JoinType::Inner, &table, Some(on.into_condition()))
    }

    /// `LEFT JOIN table ON condition`. Project the table with
    /// [`Table::nullable`](crate::Table::nullable) to decode missing rows as `None`.
    pub fn left_join(self, table: impl DataSet, on: impl Condition) -> Self {
        self.push_join(JoinType::Left, &table, Some(on.into_condition()))
    }

    pub fn cross_join(self, table: impl DataSet) -> Self {
        self.push_join(JoinType::Cross, &table, None)
    }

    pub fn where_(mut self, condition: impl Condition) -> SelectWhere<P> {
        self.body.filter = Some(condition.into_condition());
        self.advance()
    }
}

impl<P: Projection, S: AllowGroupBy> Select<P, S> {
    pub fn group_by(mut self, expressions: impl ExpressionList) -> SelectGrouped<P> {
        self.body.group_by = expressions.expressions();
        self.advance()
    }
}

impl<P: Projection> Select<P, stage::GroupBy> {
    pub fn having(mut self, condition: impl Condition) -> SelectHaving<P> {
        self.body.having = Some(condition.into_condition());
        self.advance()
    }
}

impl<P: Projection, S: AllowOrderBy> Select<P, S> {
    pub fn order_by(mut self, items: impl IntoIterator<Item = Ordered>) -> SelectOrdered<P> {
        self.body.order_by = items.into_iter().collect();
        self.advance()
    }
}

impl<P: Projection, S: AllowLimit> Select<P, S> {
    pub fn limit(mut self, limit: i64) -> SelectLimited<P> {
        self.body.limit = Some(limit);
        self.advance()
    }

    /// Optional limit and offset known at runtime, an offset without a limit is an error.
    pub fn paginate(mut self, limit: Option<i64>, offset: Option<i64>) -> Result<SelectOffset<P>> {
        if offset.is_some() && limit.is_none() {
            return Err(ErrorKind::Build.error("OFFSET requires a LIMIT"));
        }
        self.body.limit = limit;
        self.body.offset = offset;
        Ok(self.advance())
    }
}

impl<P: Projection> Select<P, stage::Limit> {
    pub fn offset(mut self, offset: i64) -> SelectOffset<P> {
        self.body.offset = Some(offset);
        self.advance()
    }
}

impl<P: Projection, S: AllowCompound> Select<P, S> {
    fn compound<R>(self, operator: CompoundOperator, rhs: R) -> Compound<P>
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        Compound::new(self.body, self.projection).push(operator, rhs)
    }

    pub fn union<R>(self, rhs: R) -> Compound<P>
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        self.compound(CompoundOperator::Union, rhs)
    }

    pub fn union_all<R>(self, rhs: R) -> Compound<P>
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        self.compound(CompoundOperator::UnionAll, rhs)
    }

    pub fn intersect<R>(self, rhs: R) -> Compound<P>
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        self.compound(CompoundOperator::Intersect, rhs)
    }

    pub fn except<R>(self, rhs: R) -> Compound<P>
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        self.compound(CompoundOperator::Except, rhs)
    }
}

impl<P, S> Debug for Select<P, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select").field("body", &self.body).finish()
    }
}

impl<P: Projection, S: Executable> Statement for Select<P, S> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_select(context, out, &self.body)
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

    fn columns(&self) -> Vec<ColumnPlan> {
        self.body.plan()
    }
}

impl<P: Projection, S: Executable> TypedStatement for Select<P, S> {
    type Row = P::Row;

    fn decode_row(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        self.projection.decode(row)
    }
}

impl<P: Projection, S: Executable> SelectStatement for Select<P, S> {}

impl<P: Projection, S: AllowCompound> CompoundOperand for Select<P, S> {
    fn into_body(self) -> SelectBody {
        self.body
    }
}
