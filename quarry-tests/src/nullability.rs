use quarry::{Connection, Database, Entity, create_table, drop_table, insert, select};
use std::sync::LazyLock;
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Chore as ChoreColumns in "chore" {
        id: i64 => primary_key(),
        title: String,
        assignee: Option<String>,
        estimate: Option<i64>,
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn nullability<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Chore>().if_exists())
        .await
        .expect("Failed to drop the chore table");
    database
        .execute(&create_table::<Chore>())
        .await
        .expect("Failed to create the chore table");
    let chore = Chore::table();
    database
        .execute(
            &insert(&chore)
                .values(&[
                    Chore {
                        id: 1,
                        title: "dishes".into(),
                        assignee: Some("ann".into()),
                        estimate: Some(2),
                    },
                    Chore {
                        id: 2,
                        title: "laundry".into(),
                        assignee: None,
                        estimate: Some(5),
                    },
                    Chore {
                        id: 3,
                        title: "garden".into(),
                        assignee: Some("bob".into()),
                        estimate: None,
                    },
                    Chore {
                        id: 4,
                        title: "windows".into(),
                        assignee: None,
                        estimate: None,
                    },
                ])
                .expect("Failed to build the chore insert"),
        )
        .await
        .expect("Failed to insert the chores");

    // `= NULL` is never true
    let titles = database
        .fetch_all(
            &select(&chore.title)
                .from(&chore)
                .where_(chore.assignee.eq(None::<String>)),
        )
        .await
        .expect("Failed to compare with NULL");
    assert!(titles.is_empty());

    // `IS NULL` and `IS` treat NULL as a value
    let unassigned = database
        .fetch_all(
            &select(&chore.title)
                .from(&chore)
                .where_(chore.assignee.is(None::<String>))
                .order_by([chore.id.asc()]),
        )
        .await
        .expect("Failed to select with IS");
    assert_eq!(unassigned, ["laundry", "windows"]);
    let unassigned = database
        .fetch_all(
            &select(&chore.title)
                .from(&chore)
                .where_(chore.assignee.is_null())
                .order_by([chore.id.asc()]),
        )
        .await
        .expect("Failed to select with IS NULL");
    assert_eq!(unassigned, ["laundry", "windows"]);

    // Inequality excludes the NULL rows as well
    let others = database
        .fetch_all(
            &select(&chore.title)
                .from(&chore)
                .where_(chore.assignee.ne("ann"))
                .order_by([chore.id.asc()]),
        )
        .await
        .expect("Failed to select with <>");
    assert_eq!(others, ["garden"]);
    let others = database
        .fetch_all(
            &select(&chore.title)
                .from(&chore)
                .where_(!chore.assignee.eq("ann"))
                .order_by([chore.id.asc()]),
        )
        .await
        .expect("Failed to select with NOT");
    assert_eq!(others, ["garden"]);

    // Nullable comparison projected
    let long = database
        .fetch_all(
            &select((&chore.title, chore.estimate.gt(3i64)))
                .from(&chore)
                .order_by([chore.id.asc()]),
        )
        .await
        .expect("Failed to project a nullable comparison");
    assert_eq!(
        long,
        [
            ("dishes".to_string(), Some(false)),
            ("laundry".to_string(), Some(true)),
            ("garden".to_string(), None),
            ("windows".to_string(), None),
        ]
    );

    // Aggregates over nothing
    let (sum, total, count) = database
        .fetch_one(
            &select((
                chore.estimate.sum(),
                chore.estimate.total(),
                chore.estimate.count(),
            ))
            .from(&chore)
            .where_(chore.id.gt(100i64)),
        )
        .await
        .expect("Failed to aggregate an empty set")
        .expect("Aggregates always produce a row");
    assert_eq!(sum, None);
    assert_eq!(total, 0.0);
    assert_eq!(count, 0);
    let (sum, count) = database
        .fetch_one(&select((chore.estimate.sum(), chore.estimate.count())).from(&chore))
        .await
        .expect("Failed to aggregate the estimates")
        .expect("Aggregates always produce a row");
    assert_eq!(sum, Some(7));
    assert_eq!(count, 2);
}
