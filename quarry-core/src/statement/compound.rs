use crate::{
    ColumnPlan, CompoundOperand, HashKey, Identifier, Parameters, Projection, Result, RowDecoder,
    SelectBody, SelectStatement, SqlWriter, Statement, TypedStatement, WithClause,
    writer::Context,
};
use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Formatter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl CompoundOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            CompoundOperator::Union => "UNION",
            CompoundOperator::UnionAll => "UNION ALL",
            CompoundOperator::Intersect => "INTERSECT",
            CompoundOperator::Except => "EXCEPT",
        }
    }
}

/// First select of a compound followed by the other operands, evaluated left to right.
///
/// Only the first select carries a `WITH` clause, the expressions declared by the other operands
/// are moved there.
#[derive(Debug, Clone)]
pub struct CompoundBody {
    pub first: SelectBody,
    pub rest: Vec<(CompoundOperator, SelectBody)>,
}

/// `a UNION b INTERSECT c ...`, rows shaped like the first select.
pub struct Compound<P> {
    body: CompoundBody,
    projection: P,
}

impl<P: Projection> Compound<P> {
    pub(crate) fn new(first: SelectBody, projection: P) -> Self {
        Self {
            body: CompoundBody {
                first,
                rest: Vec::new(),
            },
            projection,
        }
    }

    pub(crate) fn push<R>(mut self, operator: CompoundOperator, rhs: R) -> Self
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        let mut rhs = rhs.into_body();
        if let Some(with) = rhs.with.take() {
            self.body
                .first
                .with
                .get_or_insert_with(WithClause::default)
                .merge(with);
        }
        self.body.rest.push((operator, rhs));
        self
    }

    pub fn body(&self) -> &CompoundBody {
        &self.body
    }

    pub fn union<R>(self, rhs: R) -> Self
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        self.push(CompoundOperator::Union, rhs)
    }

    pub fn union_all<R>(self, rhs: R) -> Self
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        self.push(CompoundOperator::UnionAll, rhs)
    }

    pub fn intersect<R>(self, rhs: R) -> Self
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        self.push(CompoundOperator::Intersect, rhs)
    }

    pub fn except<R>(self, rhs: R) -> Self
    where
        R: CompoundOperand<Row = P::Row> + 'static,
    {
        self.push(CompoundOperator::Except, rhs)
    }
}

impl<P> Debug for Compound<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compound").field("body", &self.body).finish()
    }
}

impl<P: Projection> Statement for Compound<P> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_compound(context, out, &self.body)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        let mut parts = vec![self.body.first.hash_key(context)];
        for (operator, body) in &self.body.rest {
            parts.push(HashKey::Symbol(operator.keyword()));
            parts.push(body.hash_key(context));
        }
        HashKey::composite(parts)
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        self.body.first.bind_parameters(parameters);
        for (_, body) in &self.body.rest {
            body.bind_parameters(parameters);
        }
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.body.first.related_tables(tables);
        for (_, body) in &self.body.rest {
            body.related_tables(tables);
        }
    }

    fn columns(&self) -> Vec<ColumnPlan> {
        self.body.first.plan()
    }
}

impl<P: Projection> TypedStatement for Compound<P> {
    type Row = P::Row;

    fn decode_row(&self, row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        self.projection.decode(row)
    }
}

impl<P: Projection> SelectStatement for Compound<P> {}
