use crate::{Expression, HashKey, Identifier, Parameters, SqlWriter, writer::Context};
use std::{collections::BTreeSet, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOpType {
    Not,
    Negative,
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone)]
pub struct UnaryOp {
    pub op: UnaryOpType,
    pub arg: Arc<dyn Expression>,
}

impl Expression for UnaryOp {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_unary_op(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        HashKey::composite([
            HashKey::Symbol(match self.op {
                UnaryOpType::Not => "NOT",
                UnaryOpType::Negative => "-",
                UnaryOpType::IsNull => "ISNULL",
                UnaryOpType::IsNotNull => "NOTNULL",
            }),
            self.arg.hash_key(context),
        ])
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        self.arg.bind_parameters(parameters);
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.arg.related_tables(tables);
    }
}
