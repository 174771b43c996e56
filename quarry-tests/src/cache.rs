use quarry::{
    Connection, Database, Entity, create_table, drop_table, insert, select, statement_hash,
};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Widget as WidgetColumns in "widget" {
        id: i64 => primary_key(),
        name: String,
        weight: f64,
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn cache<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Widget>().if_exists())
        .await
        .expect("Failed to drop the widget table");
    database
        .execute(&create_table::<Widget>())
        .await
        .expect("Failed to create the widget table");
    let widget = Widget::table();
    database
        .execute(
            &insert(&widget)
                .values(&[
                    Widget {
                        id: 1,
                        name: "gear".into(),
                        weight: 0.5,
                    },
                    Widget {
                        id: 2,
                        name: "spring".into(),
                        weight: 0.1,
                    },
                ])
                .expect("Failed to build the widget insert"),
        )
        .await
        .expect("Failed to insert the widgets");
    database.clear_cache().await;
    assert_eq!(database.cached_statements().await, 0);

    // Same shape from independent table references
    let (first, second) = (Widget::table(), Widget::table());
    let by_id_1 = select(&first).from(&first).where_(first.id.eq(1i64));
    let by_id_2 = select(&second).from(&second).where_(second.id.eq(2i64));
    assert_eq!(
        statement_hash(database.config(), &by_id_1),
        statement_hash(database.config(), &by_id_2)
    );
    let prepared_1 = database
        .prepare(&by_id_1, true)
        .await
        .expect("Failed to prepare the first select");
    let prepared_2 = database
        .prepare(&by_id_2, true)
        .await
        .expect("Failed to prepare the second select");
    assert!(Arc::ptr_eq(&prepared_1, &prepared_2));
    assert_eq!(database.cached_statements().await, 1);

    // Shared handle, own parameters
    let gear = database
        .fetch_one(&by_id_1)
        .await
        .expect("Failed to select the gear")
        .expect("Failed to find the gear");
    let spring = database
        .fetch_one(&by_id_2)
        .await
        .expect("Failed to select the spring")
        .expect("Failed to find the spring");
    assert_eq!(gear.name, "gear");
    assert_eq!(spring.name, "spring");
    assert_eq!(database.cached_statements().await, 1);

    // Uncached preparation leaves the cache alone
    let uncached = database
        .prepare(&by_id_1, false)
        .await
        .expect("Failed to prepare without the cache");
    assert!(!Arc::ptr_eq(&prepared_1, &uncached));
    assert_eq!(uncached.compiled.sql, prepared_1.compiled.sql);
    assert_eq!(database.cached_statements().await, 1);

    // Any structural difference is a different statement
    let by_name = select(&first).from(&first).where_(first.name.eq("gear"));
    let names = select(&first.name).from(&first).where_(first.id.eq(1i64));
    let heavier = select(&first).from(&first).where_(first.weight.gt(0.2));
    for statement in [&by_name as &dyn quarry::Statement, &names, &heavier] {
        assert_ne!(
            statement_hash(database.config(), statement),
            prepared_1.compiled.hash_key
        );
    }
    database
        .fetch_all(&by_name)
        .await
        .expect("Failed to select by name");
    database
        .fetch_all(&names)
        .await
        .expect("Failed to select the names");
    let heavy = database
        .fetch_all(&heavier)
        .await
        .expect("Failed to select the heavy widgets");
    assert_eq!(heavy.len(), 1);
    assert_eq!(database.cached_statements().await, 4);

    database.clear_cache().await;
    assert_eq!(database.cached_statements().await, 0);
    let gear = database
        .fetch_one(&by_id_1)
        .await
        .expect("Failed to select the gear after clearing the cache");
    assert!(gear.is_some());
}
