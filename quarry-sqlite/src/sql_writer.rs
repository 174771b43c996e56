use quarry_core::{Affinity, SqlWriter, ValueKind, writer::Context};

/// SQLite dialect: column types are declared through their storage affinity.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, kind: ValueKind) {
        out.push_str(match kind.affinity() {
            Affinity::Integer => "INTEGER",
            Affinity::Real => "REAL",
            Affinity::Text => "TEXT",
            Affinity::Blob => "BLOB",
        });
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN IMMEDIATE");
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSqlWriter;
    use quarry_core::{Affinity, IdentifierQuoting, SqlWriter, ValueKind, writer::Context};

    #[test]
    fn column_types_use_affinity() {
        let writer = SqliteSqlWriter {};
        let mut context = Context::new(IdentifierQuoting::Quoted);
        let mut out = String::new();
        for kind in [
            ValueKind::Boolean,
            ValueKind::Real,
            ValueKind::Custom("DATE", Affinity::Text),
        ] {
            writer.write_column_type(&mut context, &mut out, kind);
            out.push(' ');
        }
        assert_eq!(out, "INTEGER REAL TEXT ");
    }
}
