use crate::{Expression, HashKey, Identifier, Parameters, TableRef, writer::Context};
use std::{collections::BTreeSet, sync::Arc};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Cross,
}

impl JoinType {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// Table joined to the `FROM` clause of a select.
#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinType,
    pub table: TableRef,
    pub on: Option<Arc<dyn Expression>>,
}

impl Join {
    pub fn hash_key(&self, context: &mut Context) -> HashKey {
        let mut parts = vec![
            HashKey::Symbol(self.kind.keyword()),
            self.table.declaration_hash(context),
        ];
        if let Some(on) = &self.on {
            parts.push(HashKey::Symbol("ON"));
            parts.push(on.hash_key(context));
        }
        HashKey::composite(parts)
    }

    pub fn bind_parameters(&self, parameters: &mut Parameters) {
        self.table.bind_parameters(parameters);
        if let Some(on) = &self.on {
            on.bind_parameters(parameters);
        }
    }

    pub fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.table.related_tables(tables);
        if let Some(on) = &self.on {
            on.related_tables(tables);
        }
    }
}
