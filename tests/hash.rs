#[cfg(test)]
mod tests {
    use quarry::{
        Config, Cte, Entity, GenericSqlWriter, Statement, Value, compile,
        count_all, parameters_of, select, statement_hash, tables_of, with,
    };

    quarry::entity! {
        #[derive(Debug, Clone, PartialEq)]
        struct Book as BookColumns in "book" {
            id: i64 => primary_key(),
            title: String,
            author: Option<i64> => references("author", "id"),
            price: f64,
        }
    }

    quarry::entity! {
        #[derive(Debug, Clone, PartialEq)]
        struct Author as AuthorColumns in "author" {
            id: i64 => primary_key(),
            name: String,
        }
    }

    // Same columns as Book under another type
    quarry::entity! {
        #[derive(Debug, Clone, PartialEq)]
        struct Volume as VolumeColumns in "book" {
            id: i64 => primary_key(),
            title: String,
            author: Option<i64>,
            price: f64,
        }
    }

    fn hash<S: Statement>(statement: &S) -> quarry::HashKey {
        statement_hash(&Config::default(), statement)
    }

    #[test]
    fn independent_references_share_the_key() {
        let (first, second) = (Book::table(), Book::table());
        let a = select(&first).from(&first).where_(first.title.eq("Dune"));
        let b = select(&second)
            .from(&second)
            .where_(second.title.eq("Solaris"));
        assert_eq!(hash(&a), hash(&b));
        assert_eq!(hash(&a).fingerprint(), hash(&b).fingerprint());

        let volume = Volume::table();
        let c = select(&volume)
            .from(&volume)
            .where_(volume.title.eq("Ubik"));
        assert_eq!(hash(&a), hash(&c));
    }

    #[test]
    fn limit_value_is_a_parameter() {
        let book = Book::table();
        let a = select(&book.title).from(&book).limit(1);
        let b = select(&book.title).from(&book).limit(50);
        assert_eq!(hash(&a), hash(&b));
        let unlimited = select(&book.title).from(&book);
        assert_ne!(hash(&a), hash(&unlimited));
    }

    #[test]
    fn structure_changes_the_key() {
        let book = Book::table();
        let author = Author::table();
        let base = hash(&select(&book.title).from(&book).where_(book.id.eq(1i64)));
        let variants = [
            hash(&select(&book.title).from(&book).where_(book.price.eq(1.0))),
            hash(&select(&book.title).from(&book).where_(book.id.gt(1i64))),
            hash(&select(&book.price).from(&book).where_(book.id.eq(1i64))),
            hash(&select(&book.title).distinct().from(&book).where_(book.id.eq(1i64))),
            hash(
                &select(&book.title)
                    .from(&book)
                    .join(&author, book.author.eq(&author.id))
                    .where_(book.id.eq(1i64)),
            ),
            hash(
                &select(&book.title)
                    .from(&book)
                    .left_join(&author, book.author.eq(&author.id))
                    .where_(book.id.eq(1i64)),
            ),
            hash(
                &select(&book.title)
                    .from(&book)
                    .where_(book.id.eq(quarry::literal(1i64))),
            ),
            hash(
                &select(&book.title)
                    .from(&book)
                    .where_(book.id.eq(1i64))
                    .order_by([book.title.asc()]),
            ),
        ];
        for (i, variant) in variants.iter().enumerate() {
            assert_ne!(&base, variant, "variant {} collides with the base", i);
            for other in &variants[i + 1..] {
                assert_ne!(variant, other);
            }
        }
    }

    #[test]
    fn literals_are_part_of_the_key() {
        let book = Book::table();
        let a = select(&book.id)
            .from(&book)
            .where_(book.title.eq(quarry::literal("Dune".to_string())));
        let b = select(&book.id)
            .from(&book)
            .where_(book.title.eq(quarry::literal("Emma".to_string())));
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn aliases_follow_declaration_order() {
        let book = Book::table();
        let author = Author::table();
        let query = select((&author.name, &book.title))
            .from(&book)
            .join(&author, book.author.eq(&author.id));
        let compiled = compile(&GenericSqlWriter, &Config::default(), &query);
        assert!(compiled.sql.starts_with("SELECT t1.\"name\" AS c0, t0.\"title\" AS c1\n"));
        let again = compile(&GenericSqlWriter, &Config::default(), &query);
        assert_eq!(compiled.sql, again.sql);
    }

    #[test]
    fn parameters_in_placeholder_order() {
        let book = Book::table();
        let author = Author::table();
        let query = select(&book.title)
            .from(&book)
            .join(&author, author.name.eq("Lem").and(book.author.eq(&author.id)))
            .where_(book.price.lt(20.0))
            .limit(3)
            .offset(6);
        let compiled = compile(&GenericSqlWriter, &Config::default(), &query);
        let parameters = parameters_of(&query).into_inner();
        assert_eq!(compiled.parameters, parameters.len());
        assert_eq!(
            parameters,
            [
                Value::Text("Lem".into()),
                Value::Real(20.0),
                Value::Integer(3),
                Value::Integer(6),
            ]
        );
    }

    #[test]
    fn tables_and_nullability() {
        let book = Book::table();
        let author = Author::table();
        let query = select((
            &book.title,
            book.author.add(1i64),
            book.price.sum(),
            count_all(),
            author.nullable(),
        ))
        .from(&book)
        .left_join(&author, book.author.eq(&author.id));
        let compiled = compile(&GenericSqlWriter, &Config::default(), &query);
        assert_eq!(
            compiled
                .columns
                .iter()
                .map(|v| v.nullable)
                .collect::<Vec<_>>(),
            [false, true, true, false, true, true]
        );
        assert_eq!(
            compiled.tables.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            ["author", "book"]
        );

        let cheap = Cte::new(select(&book).from(&book).where_(book.price.lt(5.0)));
        let deal = cheap.table();
        let query = with().cte(&cheap).select(&deal.title).from(&deal);
        assert_eq!(
            tables_of(&query).iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            ["book"]
        );
    }
}
