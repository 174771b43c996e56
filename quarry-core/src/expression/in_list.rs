use crate::{Expression, HashKey, Identifier, Parameters, SqlWriter, writer::Context};
use std::{collections::BTreeSet, sync::Arc};

/// `arg [NOT] IN (a, b, ...)`.
///
/// The length of the list is part of the hash key, each distinct length is a distinct statement.
#[derive(Debug, Clone)]
pub struct InList {
    pub arg: Arc<dyn Expression>,
    pub list: Vec<Arc<dyn Expression>>,
    pub negated: bool,
}

impl Expression for InList {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_in_list(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        HashKey::composite([
            self.arg.hash_key(context),
            HashKey::Symbol(if self.negated { "NOT IN" } else { "IN" }),
            HashKey::list(self.list.iter().map(|v| v.hash_key(context))),
        ])
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        self.arg.bind_parameters(parameters);
        for v in &self.list {
            v.bind_parameters(parameters);
        }
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.arg.related_tables(tables);
        for v in &self.list {
            v.related_tables(tables);
        }
    }
}
