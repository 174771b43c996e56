use crate::{Expression, HashKey, Identifier, Parameters, SqlWriter, writer::Context};
use std::{collections::BTreeSet, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    Asc,
    Desc,
}

/// `ORDER BY` item.
#[derive(Debug, Clone)]
pub struct Ordered {
    pub expression: Arc<dyn Expression>,
    pub order: Order,
}

impl Expression for Ordered {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_ordered(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        HashKey::composite([
            self.expression.hash_key(context),
            HashKey::Symbol(match self.order {
                Order::Asc => "ASC",
                Order::Desc => "DESC",
            }),
        ])
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        self.expression.bind_parameters(parameters);
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.expression.related_tables(tables);
    }
}
