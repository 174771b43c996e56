use crate::{ErrorKind, Result};
use std::{
    borrow::Borrow,
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};

/// Validated, non-empty SQL name (table, column, alias).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(Arc<str>);

impl Identifier {
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(ErrorKind::Build.error("Identifier cannot be empty"));
        }
        if name.contains('\0') {
            return Err(ErrorKind::Build.error(format!(
                "Identifier `{}` contains a NUL character",
                name.escape_debug()
            )));
        }
        Ok(Self(name.into()))
    }

    /// Identifier from a name known at compile time, used by `entity!`.
    pub fn from_static(name: &'static str) -> Self {
        debug_assert!(!name.is_empty() && !name.contains('\0'));
        Self(name.into())
    }

    /// Internal constructor for generated names like `t0` or `c1`.
    pub(crate) fn generated(name: String) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name can appear in SQL without double quotes.
    pub fn is_bare_safe(&self) -> bool {
        let mut chars = self.0.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !is_keyword(&self.0)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// How identifiers are printed in the generated SQL.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierQuoting {
    /// Always wrap names in double quotes.
    #[default]
    Quoted,
    /// Print names as they are, quoting only keywords and names with special characters.
    Bare,
}

static KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "KEY",
    "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT", "NOTHING",
    "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS", "OUTER", "OVER",
    "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE", "RANGE",
    "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE", "RESTRICT",
    "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET", "TABLE",
    "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED", "UNION",
    "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE",
    "WINDOW", "WITH", "WITHOUT",
];

/// Whether `name` is a SQLite keyword (case insensitive).
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::{Identifier, is_keyword};
    use crate::ErrorKind;

    #[test]
    fn rejects_empty_names() {
        let error = Identifier::new("").unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
        assert!(Identifier::new("a\0b").is_err());
        assert_eq!(Identifier::new("person").unwrap().as_str(), "person");
    }

    #[test]
    fn bare_safety() {
        assert!(Identifier::new("person").unwrap().is_bare_safe());
        assert!(Identifier::new("_hidden1").unwrap().is_bare_safe());
        assert!(!Identifier::new("order").unwrap().is_bare_safe());
        assert!(!Identifier::new("first name").unwrap().is_bare_safe());
        assert!(!Identifier::new("1st").unwrap().is_bare_safe());
        assert!(is_keyword("Select"));
        assert!(!is_keyword("selected"));
    }
}
