use crate::{Expression, HashKey, Identifier, Parameters, SqlWriter, ValueKind, writer::Context};
use std::{collections::BTreeSet, sync::Arc};

/// Call of a SQL function, `name(args...)`.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: &'static str,
    pub args: Vec<Arc<dyn Expression>>,
    pub distinct: bool,
}

impl Function {
    pub fn new(name: &'static str, args: Vec<Arc<dyn Expression>>) -> Self {
        Self {
            name,
            args,
            distinct: false,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

impl Expression for Function {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_function(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        let mut parts = vec![HashKey::Symbol(self.name)];
        if self.distinct {
            parts.push(HashKey::Symbol("DISTINCT"));
        }
        parts.push(HashKey::list(self.args.iter().map(|v| v.hash_key(context))));
        HashKey::composite(parts)
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        for arg in &self.args {
            arg.bind_parameters(parameters);
        }
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        for arg in &self.args {
            arg.related_tables(tables);
        }
    }
}

/// `CAST(arg AS type)`.
#[derive(Debug, Clone)]
pub struct Cast {
    pub arg: Arc<dyn Expression>,
    pub kind: ValueKind,
}

impl Expression for Cast {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_cast(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        HashKey::composite([
            HashKey::Symbol("CAST"),
            self.arg.hash_key(context),
            HashKey::Symbol(self.kind.name()),
        ])
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        self.arg.bind_parameters(parameters);
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.arg.related_tables(tables);
    }
}

/// `CASE WHEN .. THEN .. [ELSE ..] END`.
#[derive(Debug, Clone)]
pub struct Case {
    pub branches: Vec<(Arc<dyn Expression>, Arc<dyn Expression>)>,
    pub otherwise: Option<Arc<dyn Expression>>,
}

impl Expression for Case {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_case(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        let mut parts = vec![HashKey::Symbol("CASE")];
        for (condition, value) in &self.branches {
            parts.push(HashKey::Symbol("WHEN"));
            parts.push(condition.hash_key(context));
            parts.push(HashKey::Symbol("THEN"));
            parts.push(value.hash_key(context));
        }
        if let Some(otherwise) = &self.otherwise {
            parts.push(HashKey::Symbol("ELSE"));
            parts.push(otherwise.hash_key(context));
        }
        parts.push(HashKey::Symbol("END"));
        HashKey::composite(parts)
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        for (condition, value) in &self.branches {
            condition.bind_parameters(parameters);
            value.bind_parameters(parameters);
        }
        if let Some(otherwise) = &self.otherwise {
            otherwise.bind_parameters(parameters);
        }
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        for (condition, value) in &self.branches {
            condition.related_tables(tables);
            value.related_tables(tables);
        }
        if let Some(otherwise) = &self.otherwise {
            otherwise.related_tables(tables);
        }
    }
}
