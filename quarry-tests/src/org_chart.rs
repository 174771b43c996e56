use quarry::{
    Connection, Cte, Database, Entity, RecursiveCte, count_all, create_table, drop_table, insert,
    select, with,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Member as MemberColumns in "member" {
        id: i64 => primary_key(),
        name: String,
        manager: Option<i64> => references("member", "id"),
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn org_chart<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Member>().if_exists())
        .await
        .expect("Failed to drop the member table");
    database
        .execute(&create_table::<Member>())
        .await
        .expect("Failed to create the member table");
    let member = Member::table();
    let members = [
        ("Alice", None),
        ("Jane", Some(1)),
        ("Cindy", Some(2)),
        ("Dick", None),
        ("Bob", Some(4)),
    ]
    .into_iter()
    .zip(1..)
    .map(|((name, manager), id)| Member {
        id,
        name: name.into(),
        manager,
    })
    .collect::<Vec<_>>();
    database
        .execute(
            &insert(&member)
                .values(&members)
                .expect("Failed to build the member insert"),
        )
        .await
        .expect("Failed to insert the members");

    // Everyone under Alice, Alice included
    let chain = RecursiveCte::<Member>::declare();
    let (root, report, boss) = (Member::table(), Member::table(), chain.table());
    let chain = chain.define(
        select(&root)
            .from(&root)
            .where_(root.name.eq("Alice"))
            .union_all(
                select(&report)
                    .from(&report)
                    .join(&boss, report.manager.eq(&boss.id)),
            ),
    );
    let team = chain.table();
    let names = database
        .fetch_all(
            &with()
                .recursive(&chain)
                .select(&team.name)
                .from(&team)
                .order_by([team.id.asc()]),
        )
        .await
        .expect("Failed to select the team of Alice");
    assert_eq!(names, ["Alice", "Jane", "Cindy"]);

    // Plain common table expression
    let top = Member::table();
    let heads = Cte::new(select(&top).from(&top).where_(top.manager.is_null()));
    let head = heads.table();
    let names = database
        .fetch_all(
            &with()
                .cte(&heads)
                .select(&head.name)
                .from(&head)
                .order_by([head.name.asc()]),
        )
        .await
        .expect("Failed to select the heads");
    assert_eq!(names, ["Alice", "Dick"]);

    // Common table expression driving a delete
    let candidate = Member::table();
    let leavers = Cte::new(
        select(&candidate)
            .from(&candidate)
            .where_(candidate.name.eq("Dick").or(candidate.manager.eq(4i64))),
    );
    let leaver = leavers.table();
    let result = database
        .execute(
            &with()
                .cte(&leavers)
                .delete(&member)
                .where_(member.id.in_query(select(&leaver.id).from(&leaver))),
        )
        .await
        .expect("Failed to delete the team of Dick");
    assert_eq!(result.rows_affected, 2);
    let remaining = database
        .fetch_one(&select(count_all()).from(&member))
        .await
        .expect("Failed to count the members")
        .expect("Count always produces a row");
    assert_eq!(remaining, 3);
}
