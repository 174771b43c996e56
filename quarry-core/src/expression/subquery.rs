use crate::{Expression, HashKey, Identifier, Parameters, SqlWriter, Statement, writer::Context};
use std::{collections::BTreeSet, sync::Arc};

#[derive(Debug, Clone)]
pub enum SubqueryKind {
    /// `(SELECT ...)` producing a single value.
    Scalar,
    /// `EXISTS (SELECT ...)`.
    Exists,
    /// `arg IN (SELECT ...)`.
    In(Arc<dyn Expression>),
}

/// Select statement nested inside an expression.
#[derive(Debug, Clone)]
pub struct Subquery {
    pub kind: SubqueryKind,
    pub statement: Arc<dyn Statement>,
}

impl Expression for Subquery {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_subquery(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        let mut parts = Vec::with_capacity(3);
        match &self.kind {
            SubqueryKind::Scalar => parts.push(HashKey::Symbol("SUBQUERY")),
            SubqueryKind::Exists => parts.push(HashKey::Symbol("EXISTS")),
            SubqueryKind::In(arg) => {
                parts.push(arg.hash_key(context));
                parts.push(HashKey::Symbol("IN"));
            }
        }
        parts.push(self.statement.hash_key(context));
        HashKey::composite(parts)
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        if let SubqueryKind::In(arg) = &self.kind {
            arg.bind_parameters(parameters);
        }
        self.statement.bind_parameters(parameters);
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        if let SubqueryKind::In(arg) = &self.kind {
            arg.related_tables(tables);
        }
        self.statement.related_tables(tables);
    }
}
