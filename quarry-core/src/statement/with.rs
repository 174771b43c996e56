use crate::{
    DeleteRoot, Entity, HashKey, Identifier, InsertRoot, IntoProjection, Parameters, Select,
    SelectRoot, SelectStatement, Statement, Table, TableSource, UpdateRoot, table_ref::next_id,
    writer::Context,
};
use std::{collections::BTreeSet, marker::PhantomData, sync::Arc};

/// Common table expression as it appears in the `WITH` clause, `cte0("id", "name") AS (...)`.
#[derive(Debug, Clone)]
pub struct CteDefinition {
    pub id: u64,
    pub columns: Vec<Identifier>,
    pub body: Arc<dyn Statement>,
}

#[derive(Default, Debug, Clone)]
pub struct WithClause {
    pub recursive: bool,
    pub ctes: Vec<CteDefinition>,
}

impl WithClause {
    pub fn hash_key(&self, context: &mut Context) -> HashKey {
        let mut parts = vec![HashKey::Symbol(if self.recursive {
            "WITH RECURSIVE"
        } else {
            "WITH"
        })];
        for cte in &self.ctes {
            parts.push(HashKey::identifier(&context.cte_alias(cte.id)));
            parts.push(HashKey::list(cte.columns.iter().map(HashKey::identifier)));
            parts.push(cte.body.hash_key(context));
        }
        HashKey::composite(parts)
    }

    pub fn bind_parameters(&self, parameters: &mut Parameters) {
        for cte in &self.ctes {
            cte.body.bind_parameters(parameters);
        }
    }

    pub fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        for cte in &self.ctes {
            cte.body.related_tables(tables);
        }
    }

    /// Appends the expressions of `other` that are not declared here yet.
    pub(crate) fn merge(&mut self, other: WithClause) {
        self.recursive |= other.recursive;
        for cte in other.ctes {
            if !self.ctes.iter().any(|v| v.id == cte.id) {
                self.ctes.push(cte);
            }
        }
    }

    fn push<E: Entity>(&mut self, id: u64, body: Arc<dyn Statement>) {
        self.ctes.push(CteDefinition {
            id,
            columns: E::table_def()
                .columns
                .iter()
                .map(|v| v.name.clone())
                .collect(),
            body,
        });
    }
}

/// Named select producing `E` rows, readable as a table by the statement that declares it.
pub struct Cte<E: Entity> {
    id: u64,
    body: Arc<dyn Statement>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Cte<E> {
    pub fn new<S: SelectStatement<Row = E> + 'static>(body: S) -> Self {
        Self {
            id: next_id(),
            body: Arc::new(body),
            _entity: PhantomData,
        }
    }

    /// New reference to the expression, each call gets its own table alias.
    pub fn table(&self) -> Table<E> {
        Table::with_source(TableSource::Cte(self.id))
    }
}

/// Name of a recursive common table expression, available before its body exists so the body
/// can refer to it.
pub struct CteDeclaration<E: Entity> {
    id: u64,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> CteDeclaration<E> {
    pub fn table(&self) -> Table<E> {
        Table::with_source(TableSource::Cte(self.id))
    }

    /// Completes the declaration, usually with `seed.union_all(step)` where `step` reads
    /// [`table`](Self::table).
    pub fn define<S: SelectStatement<Row = E> + 'static>(self, body: S) -> RecursiveCte<E> {
        RecursiveCte {
            id: self.id,
            body: Arc::new(body),
            _entity: PhantomData,
        }
    }
}

/// Common table expression whose body refers to itself.
///
/// ```rust,ignore
/// let chain = RecursiveCte::<Person>::declare();
/// let (root, member, boss) = (Person::table(), Person::table(), chain.table());
/// let chain = chain.define(
///     select(&root)
///         .from(&root)
///         .where_(root.name.eq("Alice"))
///         .union_all(select(&member).from(&member).join(&boss, member.manager.eq(&boss.id))),
/// );
/// let everyone = chain.table();
/// let query = with().recursive(&chain).select(&everyone).from(&everyone);
/// ```
pub struct RecursiveCte<E: Entity> {
    id: u64,
    body: Arc<dyn Statement>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> RecursiveCte<E> {
    pub fn declare() -> CteDeclaration<E> {
        CteDeclaration {
            id: next_id(),
            _entity: PhantomData,
        }
    }

    pub fn table(&self) -> Table<E> {
        Table::with_source(TableSource::Cte(self.id))
    }
}

/// Starts a statement preceded by common table expressions.
pub fn with() -> With {
    With {
        clause: WithClause::default(),
    }
}

/// `WITH` clause being built. Plain expressions come first, a recursive one closes the list.
#[derive(Debug, Clone)]
pub struct With {
    clause: WithClause,
}

impl With {
    pub fn cte<E: Entity>(mut self, cte: &Cte<E>) -> Self {
        self.clause.push::<E>(cte.id, cte.body.clone());
        self
    }

    pub fn recursive<E: Entity>(mut self, cte: &RecursiveCte<E>) -> WithRecursive {
        self.clause.recursive = true;
        self.clause.push::<E>(cte.id, cte.body.clone());
        WithRecursive {
            clause: self.clause,
        }
    }
}

/// `WITH RECURSIVE` clause, complete: only the main statement can follow.
#[derive(Debug, Clone)]
pub struct WithRecursive {
    clause: WithClause,
}

macro_rules! impl_with_starters {
    ($($ty:ty),+) => {
        $(
            impl $ty {
                pub fn select<P: IntoProjection>(self, projection: P) -> SelectRoot<P::Projection> {
                    Select::with_clause(projection, Some(self.clause))
                }

                pub fn insert<E: Entity>(self, table: &Table<E>) -> InsertRoot<E> {
                    InsertRoot::new(table, Some(self.clause))
                }

                pub fn update<E: Entity>(self, table: &Table<E>) -> UpdateRoot<E> {
                    UpdateRoot::new(table, Some(self.clause))
                }

                pub fn delete<E: Entity>(self, table: &Table<E>) -> DeleteRoot<E> {
                    DeleteRoot::new(table, Some(self.clause))
                }
            }
        )+
    };
}

impl_with_starters!(With, WithRecursive);
