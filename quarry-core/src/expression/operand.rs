use crate::{Expression, HashKey, Identifier, Parameters, SqlWriter, Value, writer::Context};
use std::collections::BTreeSet;

/// Leaf of the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Value bound to a `?` placeholder.
    Parameter(Value),
    /// Value printed inline (only used where placeholders are not allowed, e.g. `DEFAULT`).
    Literal(Value),
    Null,
    Asterisk,
}

impl Expression for Operand {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_operand(context, out, self)
    }

    fn hash_key(&self, _context: &mut Context) -> HashKey {
        match self {
            Operand::Parameter(..) => HashKey::Symbol("?"),
            Operand::Literal(v) => HashKey::List("literal", vec![format!("{:?}", v)]),
            Operand::Null => HashKey::Symbol("NULL"),
            Operand::Asterisk => HashKey::Symbol("*"),
        }
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        if let Operand::Parameter(v) = self {
            parameters.push(v.clone());
        }
    }

    fn related_tables(&self, _tables: &mut BTreeSet<Identifier>) {}
}
