use crate::Identifier;
use std::{
    fmt::{self, Display, Formatter, Write},
    hash::{DefaultHasher, Hash, Hasher},
};

/// Structural fingerprint of a statement.
///
/// Two statements built the same way (same shape, same tables in the same positions, same
/// projected fields) produce equal keys regardless of the literal values they bind, because every
/// literal is bound as a parameter and hashes to the `?` symbol. The key is what the prepared
/// statement cache is indexed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    /// Keyword, operator or placeholder.
    Symbol(&'static str),
    /// Schema name (table, column, projected alias).
    Identifier(Identifier),
    /// Field of an aliased table, `t0."name"`.
    Qualified(Identifier, Identifier),
    /// Sequence of keys joined by a separator.
    Composite(Vec<HashKey>, &'static str),
    /// Tagged list of opaque strings (inline literals).
    List(&'static str, Vec<String>),
}

impl HashKey {
    pub fn composite(parts: impl IntoIterator<Item = HashKey>) -> Self {
        HashKey::Composite(parts.into_iter().collect(), " ")
    }

    pub fn list(parts: impl IntoIterator<Item = HashKey>) -> Self {
        HashKey::Composite(parts.into_iter().collect(), ", ")
    }

    pub fn identifier(name: &Identifier) -> Self {
        HashKey::Identifier(name.clone())
    }

    /// Compact 64 bit digest of the key, handy in log lines.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            HashKey::Symbol(v) => out.push_str(v),
            HashKey::Identifier(v) => {
                let _ = write!(out, "\"{}\"", v);
            }
            HashKey::Qualified(table, field) => {
                let _ = write!(out, "{}.\"{}\"", table, field);
            }
            HashKey::Composite(parts, separator) => {
                out.push('(');
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        out.push_str(separator);
                    }
                    part.write_canonical(out);
                }
                out.push(')');
            }
            HashKey::List(tag, values) => {
                let _ = write!(out, "{}[{}]", tag, values.join(", "));
            }
        }
    }
}

impl Display for HashKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_canonical(&mut out);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::HashKey;
    use crate::Identifier;

    #[test]
    fn canonical_form() {
        let key = HashKey::composite([
            HashKey::Symbol("SELECT"),
            HashKey::Qualified(
                Identifier::new("t0").unwrap(),
                Identifier::new("name").unwrap(),
            ),
            HashKey::Symbol("FROM"),
            HashKey::Identifier(Identifier::new("person").unwrap()),
        ]);
        assert_eq!(key.to_string(), r#"(SELECT t0."name" FROM "person")"#);
    }

    #[test]
    fn symbol_differs_from_identifier() {
        let a = HashKey::Symbol("person");
        let b = HashKey::Identifier(Identifier::new("person").unwrap());
        assert_ne!(a, b);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn nesting_is_structural() {
        let flat = HashKey::composite([HashKey::Symbol("a"), HashKey::Symbol("b")]);
        let nested = HashKey::composite([HashKey::composite([
            HashKey::Symbol("a"),
            HashKey::Symbol("b"),
        ])]);
        assert_ne!(flat, nested);
    }
}
