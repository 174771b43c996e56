use quarry::{Connection, Database, Entity, ErrorKind, create_table, drop_table, insert, select};
use std::sync::LazyLock;
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Counter as CounterColumns in "counter" {
        value: i64 => primary_key(),
        even: bool,
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn pagination<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Counter>().if_exists())
        .await
        .expect("Failed to drop the counter table");
    database
        .execute(&create_table::<Counter>())
        .await
        .expect("Failed to create the counter table");
    let counter = Counter::table();
    let counters = (1..=10)
        .map(|value| Counter {
            value,
            even: value % 2 == 0,
        })
        .collect::<Vec<_>>();
    database
        .execute(
            &insert(&counter)
                .values(&counters)
                .expect("Failed to build the counter insert"),
        )
        .await
        .expect("Failed to insert the counters");

    let page = |limit: Option<i64>, offset: Option<i64>| {
        select(&counter.value)
            .from(&counter)
            .order_by([counter.value.asc()])
            .paginate(limit, offset)
    };

    let values = database
        .fetch_all(
            &select(&counter.value)
                .from(&counter)
                .order_by([counter.value.asc()])
                .limit(3),
        )
        .await
        .expect("Failed to select the first 3 counters");
    assert_eq!(values, [1, 2, 3]);

    let values = database
        .fetch_all(
            &select(&counter.value)
                .from(&counter)
                .order_by([counter.value.asc()])
                .limit(3)
                .offset(2),
        )
        .await
        .expect("Failed to select counters 3 to 5");
    assert_eq!(values, [3, 4, 5]);

    let values = database
        .fetch_all(&page(Some(2), Some(8)).expect("Failed to paginate"))
        .await
        .expect("Failed to select the last page");
    assert_eq!(values, [9, 10]);

    let values = database
        .fetch_all(&page(None, None).expect("Failed to paginate"))
        .await
        .expect("Failed to select every counter");
    assert_eq!(values.len(), 10);

    let values = database
        .fetch_all(&page(Some(0), None).expect("Failed to paginate"))
        .await
        .expect("Failed to select an empty page");
    assert!(values.is_empty());

    let error = page(None, Some(1)).expect_err("An offset without limit should not build");
    assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));

    // Filter, order and limit together
    let values = database
        .fetch_all(
            &select(&counter)
                .from(&counter)
                .where_(&counter.even)
                .order_by([counter.value.desc()])
                .limit(2),
        )
        .await
        .expect("Failed to select the largest even counters");
    assert_eq!(values, [counters[9].clone(), counters[7].clone()]);

    let last = database
        .fetch_one(
            &select(&counter.value)
                .from(&counter)
                .order_by([counter.value.desc()]),
        )
        .await
        .expect("Failed to select the last counter");
    assert_eq!(last, Some(10));
}
