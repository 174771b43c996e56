mod binary_op;
mod expr;
mod function;
mod in_list;
mod operand;
mod ordered;
mod subquery;
mod unary_op;

pub use binary_op::*;
pub use expr::*;
pub use function::*;
pub use in_list::*;
pub use operand::*;
pub use ordered::*;
pub use subquery::*;
pub use unary_op::*;

use crate::{HashKey, Identifier, Value, writer::Context, writer::SqlWriter};
use std::{collections::BTreeSet, fmt::Debug};

/// Node of the expression tree.
///
/// Rendering and hashing walk the tree in the same order, so table aliases allocated through the
/// context match between the SQL text and the hash key.
pub trait Expression: Send + Sync + Debug {
    /// Serialize the expression into the output buffer.
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String);
    /// Structural key of the expression, literals hash as placeholders.
    fn hash_key(&self, context: &mut Context) -> HashKey;
    /// Append the values bound to the placeholders, in rendering order.
    fn bind_parameters(&self, parameters: &mut Parameters);
    /// Collect the names of the tables this expression reads.
    fn related_tables(&self, tables: &mut BTreeSet<Identifier>);
}

/// Values bound to the placeholders of a statement, in order.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Parameters {
    values: Vec<Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
    pub fn into_inner(self) -> Vec<Value> {
        self.values
    }
}
