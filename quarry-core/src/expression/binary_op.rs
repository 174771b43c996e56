use crate::{Expression, HashKey, Identifier, Parameters, SqlWriter, writer::Context};
use std::{collections::BTreeSet, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOpType {
    Multiplication,
    Division,
    Remainder,
    Addition,
    Subtraction,
    Concat,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Is,
    IsNot,
    Like,
    NotLike,
    Glob,
    And,
    Or,
}

impl BinaryOpType {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOpType::Multiplication => "*",
            BinaryOpType::Division => "/",
            BinaryOpType::Remainder => "%",
            BinaryOpType::Addition => "+",
            BinaryOpType::Subtraction => "-",
            BinaryOpType::Concat => "||",
            BinaryOpType::Equal => "=",
            BinaryOpType::NotEqual => "!=",
            BinaryOpType::Less => "<",
            BinaryOpType::Greater => ">",
            BinaryOpType::LessEqual => "<=",
            BinaryOpType::GreaterEqual => ">=",
            BinaryOpType::Is => "IS",
            BinaryOpType::IsNot => "IS NOT",
            BinaryOpType::Like => "LIKE",
            BinaryOpType::NotLike => "NOT LIKE",
            BinaryOpType::Glob => "GLOB",
            BinaryOpType::And => "AND",
            BinaryOpType::Or => "OR",
        }
    }
}

/// Binary operation, always printed fully parenthesized.
#[derive(Debug, Clone)]
pub struct BinaryOp {
    pub op: BinaryOpType,
    pub lhs: Arc<dyn Expression>,
    pub rhs: Arc<dyn Expression>,
}

impl Expression for BinaryOp {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_binary_op(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        HashKey::composite([
            HashKey::Symbol(self.op.symbol()),
            self.lhs.hash_key(context),
            self.rhs.hash_key(context),
        ])
    }

    fn bind_parameters(&self, parameters: &mut Parameters) {
        self.lhs.bind_parameters(parameters);
        self.rhs.bind_parameters(parameters);
    }

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.lhs.related_tables(tables);
        self.rhs.related_tables(tables);
    }
}
