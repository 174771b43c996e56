use crate::{Identifier, IdentifierQuoting, TableRef};
use std::ops::{Deref, DerefMut};

/// Clause currently being written.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlWith,
    SqlSelect,
    SqlSelectFrom,
    SqlJoin,
    SqlSelectWhere,
    SqlSelectGroupBy,
    SqlSelectHaving,
    SqlSelectOrderBy,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlUpdate,
    SqlUpdateSet,
    SqlDeleteFrom,
    SqlCreateTable,
    SqlDropTable,
    SqlSubquery,
}

impl Fragment {
    /// Whether table references written in this fragment declare their alias (`"person" AS t0`).
    pub fn alias_declaration(&self) -> bool {
        matches!(
            self,
            Fragment::SqlSelectFrom | Fragment::SqlJoin | Fragment::SqlUpdate | Fragment::SqlDeleteFrom
        )
    }
}

/// State of one compile pass.
///
/// Table aliases are allocated in the order references are first met: the nth distinct reference
/// is `t<n>`, the nth common table expression `cte<n>`. A new context restarts both sequences, so
/// the hash pass and the write pass of a statement agree on every alias.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub fragment: Fragment,
    pub quoting: IdentifierQuoting,
    /// Placeholders written so far.
    pub placeholders: usize,
    tables: Vec<u64>,
    ctes: Vec<u64>,
}

impl Context {
    pub fn new(quoting: IdentifierQuoting) -> Self {
        Self {
            quoting,
            ..Default::default()
        }
    }

    pub fn table_alias(&mut self, table: &TableRef) -> Identifier {
        let index = Self::position(&mut self.tables, table.id());
        Identifier::generated(format!("t{}", index))
    }

    pub fn cte_alias(&mut self, id: u64) -> Identifier {
        let index = Self::position(&mut self.ctes, id);
        Identifier::generated(format!("cte{}", index))
    }

    fn position(ids: &mut Vec<u64>, id: u64) -> usize {
        match ids.iter().position(|v| *v == id) {
            Some(index) => index,
            None => {
                ids.push(id);
                ids.len() - 1
            }
        }
    }

    /// Number of aliases allocated so far, tables and common table expressions.
    pub fn aliases(&self) -> (usize, usize) {
        (self.tables.len(), self.ctes.len())
    }

    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        let previous = self.fragment;
        self.fragment = fragment;
        ContextUpdater {
            context: self,
            previous,
        }
    }
}

/// Restores the previous fragment when dropped.
pub struct ContextUpdater<'a> {
    context: &'a mut Context,
    previous: Fragment,
}

impl Deref for ContextUpdater<'_> {
    type Target = Context;
    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ContextUpdater<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ContextUpdater<'_> {
    fn drop(&mut self) {
        self.context.fragment = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, Fragment};
    use crate::{Identifier, IdentifierQuoting, TableRef, TableSource};

    #[test]
    fn aliases_are_sequential_and_stable() {
        let person = TableRef::new(TableSource::Table(Identifier::from_static("person")));
        let pet = TableRef::new(TableSource::Table(Identifier::from_static("pet")));
        let mut context = Context::new(IdentifierQuoting::Quoted);
        assert_eq!(context.table_alias(&pet), "t0");
        assert_eq!(context.table_alias(&person), "t1");
        assert_eq!(context.table_alias(&pet), "t0");
        assert_eq!(context.cte_alias(42), "cte0");
        assert_eq!(context.aliases(), (2, 1));
        let mut fresh = Context::new(IdentifierQuoting::Quoted);
        assert_eq!(fresh.table_alias(&person), "t0");
    }

    #[test]
    fn fragment_restored() {
        let mut context = Context::default();
        {
            let mut context = context.switch_fragment(Fragment::SqlSelect);
            {
                let context = context.switch_fragment(Fragment::SqlSelectWhere);
                assert_eq!(context.fragment, Fragment::SqlSelectWhere);
            }
            assert_eq!(context.fragment, Fragment::SqlSelect);
            context.placeholders += 1;
        }
        assert_eq!(context.fragment, Fragment::None);
        assert_eq!(context.placeholders, 1);
    }
}
