#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry::{
        Config, Cte, Entity, ErrorKind, GenericSqlWriter, RecursiveCte, Statement, Table, case,
        compile, count_all, create_table, delete, drop_table, exists, insert, literal, scalar,
        select, update, with,
    };
    use time::{Date, macros::date};

    quarry::entity! {
        #[derive(Debug, Clone, PartialEq)]
        struct Employee as EmployeeColumns in "employee" {
            id: i64 => primary_key(),
            name: String => unique(),
            salary: f64,
            manager: Option<i64> => references("employee", "id"),
            hired: Date,
        }
    }

    quarry::entity! {
        #[derive(Debug)]
        struct Membership as MembershipColumns in "membership" {
            team: i64 => primary_key(),
            player: i64 => primary_key(),
            active: bool => default_value(true),
            since: Option<Date>,
        }
    }

    quarry::entity! {
        #[derive(Debug)]
        struct Node as NodeColumns in "node" {
            id: i64 => primary_key(),
            parent: Option<i64>,
        }
    }

    const WRITER: GenericSqlWriter = GenericSqlWriter;

    fn sql<S: Statement>(statement: &S) -> String {
        compile(&WRITER, &Config::default(), statement).sql.to_string()
    }

    #[test]
    fn create_and_drop() {
        assert_eq!(
            sql(&create_table::<Employee>()),
            indoc! {r#"
                CREATE TABLE "employee" (
                "id" INTEGER PRIMARY KEY,
                "name" TEXT NOT NULL UNIQUE,
                "salary" REAL NOT NULL,
                "manager" INTEGER REFERENCES "employee"("id"),
                "hired" DATE NOT NULL
                )
            "#}
            .trim()
        );
        assert_eq!(
            sql(&create_table::<Membership>().if_not_exists()),
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "membership" (
                "team" INTEGER NOT NULL,
                "player" INTEGER NOT NULL,
                "active" BOOLEAN NOT NULL DEFAULT 1,
                "since" DATE,
                PRIMARY KEY ("team", "player")
                )
            "#}
            .trim()
        );
        assert_eq!(sql(&drop_table::<Employee>()), r#"DROP TABLE "employee""#);
        assert_eq!(
            sql(&drop_table::<Membership>().if_exists()),
            r#"DROP TABLE IF EXISTS "membership""#
        );
    }

    #[test]
    fn select_filter_order_page() {
        let employee = Employee::table();
        let query = select((&employee.name, employee.salary.mul(1.1)))
            .from(&employee)
            .where_(employee.manager.is_null().and(employee.salary.gt(1000.0)))
            .order_by([employee.name.asc(), employee.id.desc()])
            .limit(5)
            .offset(10);
        let compiled = compile(&WRITER, &Config::default(), &query);
        assert_eq!(
            &*compiled.sql,
            indoc! {r#"
                SELECT t0."name" AS c0, (t0."salary" * ?) AS c1
                FROM "employee" AS t0
                WHERE ((t0."manager" IS NULL) AND (t0."salary" > ?))
                ORDER BY t0."name" ASC, t0."id" DESC
                LIMIT ?
                OFFSET ?
            "#}
            .trim()
        );
        assert_eq!(compiled.parameters, 4);
    }

    #[test]
    fn dates_compare_as_days() {
        let employee = Employee::table();
        let query = select(&employee.id)
            .from(&employee)
            .where_(employee.hired.ge(date!(2020 - 01 - 01)))
            .order_by([employee.hired.asc()]);
        assert_eq!(
            sql(&query),
            indoc! {r#"
                SELECT t0."id" AS c0
                FROM "employee" AS t0
                WHERE (julianday(t0."hired") >= julianday(?))
                ORDER BY julianday(t0."hired") ASC
            "#}
            .trim()
        );
    }

    #[test]
    fn literals_are_inlined() {
        let employee = Employee::table();
        let query = select(&employee.id)
            .from(&employee)
            .where_(employee.name.eq(literal("O'Brien".to_string())));
        let compiled = compile(&WRITER, &Config::default(), &query);
        assert_eq!(
            &*compiled.sql,
            indoc! {r#"
                SELECT t0."id" AS c0
                FROM "employee" AS t0
                WHERE (t0."name" = 'O''Brien')
            "#}
            .trim()
        );
        assert_eq!(compiled.parameters, 0);
    }

    #[test]
    fn self_join() {
        let employee = Employee::table();
        let boss = Employee::table();
        let query = select((&employee.name, &boss.name))
            .from(&employee)
            .left_join(&boss, employee.manager.eq(&boss.id))
            .order_by([employee.id.asc()]);
        assert_eq!(
            sql(&query),
            indoc! {r#"
                SELECT t0."name" AS c0, t1."name" AS c1
                FROM "employee" AS t0
                LEFT JOIN "employee" AS t1 ON (t0."manager" = t1."id")
                ORDER BY t0."id" ASC
            "#}
            .trim()
        );
    }

    #[test]
    fn group_and_having() {
        let employee = Employee::table();
        let query = select((&employee.manager, count_all(), employee.salary.sum()))
            .distinct()
            .from(&employee)
            .group_by(&employee.manager)
            .having(count_all().gt(2i64));
        assert_eq!(
            sql(&query),
            indoc! {r#"
                SELECT DISTINCT t0."manager" AS c0, COUNT(*) AS c1, SUM(t0."salary") AS c2
                FROM "employee" AS t0
                GROUP BY t0."manager"
                HAVING (COUNT(*) > ?)
            "#}
            .trim()
        );
    }

    #[test]
    fn subqueries() {
        let employee = Employee::table();
        let report = Employee::table();
        let query = select((
            &employee.name,
            scalar(
                select(count_all())
                    .from(&report)
                    .where_(report.manager.eq(&employee.id)),
            ),
        ))
        .from(&employee)
        .where_(exists(
            select(&report.id)
                .from(&report)
                .where_(report.manager.eq(&employee.id)),
        ));
        assert_eq!(
            sql(&query),
            indoc! {r#"
                SELECT t0."name" AS c0, (SELECT COUNT(*) AS c0
                FROM "employee" AS t1
                WHERE (t1."manager" = t0."id")) AS c1
                FROM "employee" AS t0
                WHERE (EXISTS (SELECT t1."id" AS c0
                FROM "employee" AS t1
                WHERE (t1."manager" = t0."id")))
            "#}
            .trim()
        );

        let inner = Employee::table();
        let seniors = Table::<Employee>::derived(
            select(&inner)
                .from(&inner)
                .where_(inner.hired.lt(date!(2000 - 01 - 01))),
        );
        let query = select(&seniors.name)
            .from(&seniors)
            .where_(seniors.id.is_in([1i64, 2, 3]));
        assert_eq!(
            sql(&query),
            indoc! {r#"
                SELECT t0."name" AS c0
                FROM (SELECT t1."id" AS "id", t1."name" AS "name", t1."salary" AS "salary", t1."manager" AS "manager", t1."hired" AS "hired"
                FROM "employee" AS t1
                WHERE (julianday(t1."hired") < julianday(?))) AS t0
                WHERE (t0."id" IN (?, ?, ?))
            "#}
            .trim()
        );
    }

    #[test]
    fn expressions() {
        let employee = Employee::table();
        let query = select((
            case::<String>()
                .when(employee.salary.gt(100.0), "high")
                .otherwise("low"),
            employee.manager.coalesce(0i64),
            employee.name.upper().concat("!"),
            employee.salary.cast::<i64>(),
        ))
        .from(&employee)
        .where_(!employee.name.like("A%"));
        assert_eq!(
            sql(&query),
            indoc! {r#"
                SELECT CASE WHEN (t0."salary" > ?) THEN ? ELSE ? END AS c0, COALESCE(t0."manager", ?) AS c1, (UPPER(t0."name") || ?) AS c2, CAST(t0."salary" AS INTEGER) AS c3
                FROM "employee" AS t0
                WHERE (NOT (t0."name" LIKE ?))
            "#}
            .trim()
        );
    }

    #[test]
    fn writes() {
        let employee = Employee::table();
        let alice = Employee {
            id: 1,
            name: "Alice".into(),
            salary: 1500.0,
            manager: None,
            hired: date!(2019 - 03 - 04),
        };
        let compiled = compile(
            &WRITER,
            &Config::default(),
            &insert(&employee).value(&alice),
        );
        assert_eq!(
            &*compiled.sql,
            indoc! {r#"
                INSERT INTO "employee" ("id", "name", "salary", "manager", "hired")
                VALUES (?, ?, ?, ?, date(?))
            "#}
            .trim()
        );
        assert_eq!(compiled.parameters, 5);
        assert_eq!(
            sql(&insert(&employee)
                .or_replace()
                .values([&alice, &alice])
                .expect("Failed to build the insert")),
            indoc! {r#"
                INSERT OR REPLACE INTO "employee" ("id", "name", "salary", "manager", "hired")
                VALUES (?, ?, ?, ?, date(?)), (?, ?, ?, ?, date(?))
            "#}
            .trim()
        );
        assert_eq!(
            sql(&update(&employee)
                .set(&employee.salary, employee.salary.mul(2.0))
                .where_(employee.id.eq(1i64))),
            indoc! {r#"
                UPDATE "employee" AS t0
                SET "salary" = (t0."salary" * ?)
                WHERE (t0."id" = ?)
            "#}
            .trim()
        );
        assert_eq!(
            sql(&update(&employee).set_all(&alice)),
            indoc! {r#"
                UPDATE "employee" AS t0
                SET "name" = ?, "salary" = ?, "manager" = ?, "hired" = date(?)
            "#}
            .trim()
        );
        assert_eq!(
            sql(&delete(&employee).where_(employee.hired.lt(date!(2000 - 01 - 01)))),
            indoc! {r#"
                DELETE FROM "employee" AS t0
                WHERE (julianday(t0."hired") < julianday(?))
            "#}
            .trim()
        );
    }

    #[test]
    fn compounds() {
        let employee = Employee::table();
        let boss = Employee::table();
        let unpaid = Employee::table();
        let query = select(&employee.name)
            .from(&employee)
            .where_(employee.salary.gt(10.0))
            .union(select(&boss.name).from(&boss))
            .except(
                select(&unpaid.name)
                    .from(&unpaid)
                    .where_(unpaid.salary.le(literal(0.0))),
            );
        assert_eq!(
            sql(&query),
            indoc! {r#"
                SELECT t0."name" AS c0
                FROM "employee" AS t0
                WHERE (t0."salary" > ?)
                UNION
                SELECT t1."name" AS c0
                FROM "employee" AS t1
                EXCEPT
                SELECT t2."name" AS c0
                FROM "employee" AS t2
                WHERE (t2."salary" <= 0.0)
            "#}
            .trim()
        );
    }

    #[test]
    fn compound_operand_ctes_lead_the_statement() {
        let employee = Employee::table();
        let staff = Employee::table();
        let rich = Cte::new(select(&staff).from(&staff).where_(staff.salary.gt(100.0)));
        let wealthy = rich.table();
        let query = select(&employee.name)
            .from(&employee)
            .where_(employee.salary.gt(10.0))
            .union(with().cte(&rich).select(&wealthy.name).from(&wealthy));
        let compiled = compile(&WRITER, &Config::default(), &query);
        assert_eq!(
            &*compiled.sql,
            indoc! {r#"
                WITH cte0 ("id", "name", "salary", "manager", "hired") AS (SELECT t0."id" AS "id", t0."name" AS "name", t0."salary" AS "salary", t0."manager" AS "manager", t0."hired" AS "hired"
                FROM "employee" AS t0
                WHERE (t0."salary" > ?))
                SELECT t1."name" AS c0
                FROM "employee" AS t1
                WHERE (t1."salary" > ?)
                UNION
                SELECT t2."name" AS c0
                FROM cte0 AS t2
            "#}
            .trim()
        );
        assert_eq!(compiled.parameters, 2);
        assert_eq!(
            compiled.tables.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            ["employee"]
        );

        // Declared once when both operands use it
        let (left, right) = (rich.table(), rich.table());
        let query = with()
            .cte(&rich)
            .select(&left.name)
            .from(&left)
            .intersect(with().cte(&rich).select(&right.name).from(&right));
        let text = sql(&query);
        assert_eq!(text.matches("WITH").count(), 1);
        assert!(text.starts_with("WITH cte0 "));
        assert!(text.ends_with("INTERSECT\nSELECT t2.\"name\" AS c0\nFROM cte0 AS t2"));
    }

    #[test]
    fn recursive_cte() {
        let tree = RecursiveCte::<Node>::declare();
        let (root, child, parent) = (Node::table(), Node::table(), tree.table());
        let tree = tree.define(
            select(&root)
                .from(&root)
                .where_(root.parent.is_null())
                .union_all(
                    select(&child)
                        .from(&child)
                        .join(&parent, child.parent.eq(&parent.id)),
                ),
        );
        let nodes = tree.table();
        let query = with().recursive(&tree).select(count_all()).from(&nodes);
        assert_eq!(
            sql(&query),
            indoc! {r#"
                WITH RECURSIVE cte0 ("id", "parent") AS (SELECT t0."id" AS "id", t0."parent" AS "parent"
                FROM "node" AS t0
                WHERE (t0."parent" IS NULL)
                UNION ALL
                SELECT t1."id" AS "id", t1."parent" AS "parent"
                FROM "node" AS t1
                JOIN cte0 AS t2 ON (t1."parent" = t2."id"))
                SELECT COUNT(*) AS c0
                FROM cte0 AS t3
            "#}
            .trim()
        );
    }

    #[test]
    fn offset_requires_limit() {
        let employee = Employee::table();
        let error = select(&employee)
            .from(&employee)
            .paginate(None, Some(5))
            .expect_err("An offset without a limit is rejected");
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
        let query = select(&employee.id)
            .from(&employee)
            .paginate(Some(3), None)
            .expect("Failed to paginate");
        assert_eq!(
            sql(&query),
            indoc! {r#"
                SELECT t0."id" AS c0
                FROM "employee" AS t0
                LIMIT ?
            "#}
            .trim()
        );
    }
}
