use crate::{
    ColumnPlan, Config, HashKey, Identifier, SqlWriter, Statement, tables_of, truncate_long,
    writer::Context,
};
use std::{collections::BTreeSet, sync::Arc};

/// SQL text of a statement together with what is needed to run it and decode its rows.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    pub sql: Arc<str>,
    pub hash_key: HashKey,
    /// Number of `?` placeholders in `sql`.
    pub parameters: usize,
    pub columns: Arc<[ColumnPlan]>,
    /// Tables the statement reads or writes.
    pub tables: Arc<BTreeSet<Identifier>>,
}

/// Structural key of `statement`, the same for every statement compiling to the same SQL.
pub fn statement_hash<S: Statement + ?Sized>(config: &Config, statement: &S) -> HashKey {
    statement.hash_key(&mut Context::new(config.quoting))
}

/// Renders `statement` with `writer`.
///
/// Aliases are assigned while writing, in the order tables and common table expressions are
/// declared, so compiling the same statement twice gives the same text.
pub fn compile<S: Statement + ?Sized>(
    writer: &dyn SqlWriter,
    config: &Config,
    statement: &S,
) -> CompiledStatement {
    let mut context = Context::new(config.quoting);
    let mut sql = String::with_capacity(256);
    statement.write_query(writer, &mut context, &mut sql);
    log::debug!("Compiled:\n{}", truncate_long!(sql));
    CompiledStatement {
        sql: sql.into(),
        hash_key: statement_hash(config, statement),
        parameters: context.placeholders,
        columns: statement.columns().into(),
        tables: Arc::new(tables_of(statement)),
    }
}

#[cfg(test)]
mod tests {
    use super::{compile, statement_hash};
    use crate::{Config, Entity, GenericSqlWriter, IdentifierQuoting, parameters_of, select};

    crate::entity! {
        #[derive(Debug, Clone, PartialEq)]
        struct Book as BookColumns in "book" {
            id: i64 => primary_key(),
            title: String,
            year: Option<i64>,
        }
    }

    #[test]
    fn compile_select() {
        let book = Book::table();
        let query = select(&book)
            .from(&book)
            .where_(book.title.eq("Dune"))
            .order_by([book.year.desc()])
            .limit(10);
        let compiled = compile(&GenericSqlWriter::new(), &Config::default(), &query);
        assert_eq!(
            &*compiled.sql,
            "SELECT t0.\"id\" AS \"id\", t0.\"title\" AS \"title\", t0.\"year\" AS \"year\"\n\
             FROM \"book\" AS t0\n\
             WHERE (t0.\"title\" = ?)\n\
             ORDER BY t0.\"year\" DESC\n\
             LIMIT ?"
        );
        assert_eq!(compiled.parameters, 2);
        assert_eq!(compiled.parameters, parameters_of(&query).len());
        assert_eq!(compiled.columns.len(), 3);
        assert!(compiled.columns[2].nullable);
        assert_eq!(
            compiled.tables.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            ["book"]
        );
    }

    #[test]
    fn compile_is_stable() {
        let book = Book::table();
        let query = select(&book.title).from(&book).where_(book.id.gt(3i64));
        let writer = GenericSqlWriter::new();
        let config = Config::default();
        let first = compile(&writer, &config, &query);
        let second = compile(&writer, &config, &query);
        assert_eq!(first.sql, second.sql);
        assert_eq!(first.hash_key, second.hash_key);
        assert_eq!(first.hash_key, statement_hash(&config, &query));
    }

    #[test]
    fn bare_identifiers() {
        let book = Book::table();
        let query = select(&book.title).from(&book);
        let config = Config {
            quoting: IdentifierQuoting::Bare,
            ..Default::default()
        };
        let compiled = compile(&GenericSqlWriter::new(), &config, &query);
        assert_eq!(&*compiled.sql, "SELECT t0.title AS c0\nFROM book AS t0");
    }

    #[test]
    fn result_names_ignore_quoting() {
        let book = Book::table();
        let writer = GenericSqlWriter::new();
        let quoted = Config::default();
        let bare = Config {
            quoting: IdentifierQuoting::Bare,
            ..Default::default()
        };
        let names = |config: &Config, query: &dyn crate::Statement| {
            compile(&writer, config, query)
                .columns
                .iter()
                .map(|v| v.name.to_string())
                .collect::<Vec<_>>()
        };

        let query = select((&book.title, book.year.add(1i64))).from(&book);
        assert_eq!(
            &*compile(&writer, &quoted, &query).sql,
            "SELECT t0.\"title\" AS c0, (t0.\"year\" + ?) AS c1\nFROM \"book\" AS t0"
        );
        assert_eq!(names(&quoted, &query), ["c0", "c1"]);
        assert_eq!(names(&bare, &query), ["c0", "c1"]);

        let query = select(&book).from(&book);
        assert_eq!(
            &*compile(&writer, &bare, &query).sql,
            "SELECT t0.id AS id, t0.title AS title, t0.year AS year\nFROM book AS t0"
        );
        assert_eq!(names(&quoted, &query), ["id", "title", "year"]);
        assert_eq!(names(&bare, &query), ["id", "title", "year"]);
    }
}
