use quarry::{
    Connection, Database, Entity, LiveQuery, Published, count_all, create_table, drop_table,
    insert, select, stream::StreamExt,
};
use std::{
    pin::pin,
    sync::{Arc, LazyLock},
    time::Duration,
};
use tokio::{sync::Mutex, time::timeout};

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct LiveItem as LiveItemColumns in "live_item" {
        id: i64 => primary_key(),
        label: String,
    }
}

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct LiveOther as LiveOtherColumns in "live_other" {
        id: i64 => primary_key(),
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

const WAIT: Duration = Duration::from_secs(5);

async fn next<R: Send + Sync + 'static>(live: &mut LiveQuery<R>) -> Arc<Published<R>> {
    timeout(WAIT, live.changed())
        .await
        .expect("Timed out waiting for the live query")
        .expect("Failed to receive the live query result")
}

pub async fn live<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    for result in [
        database.execute(&drop_table::<LiveItem>().if_exists()).await,
        database.execute(&drop_table::<LiveOther>().if_exists()).await,
        database.execute(&create_table::<LiveItem>()).await,
        database.execute(&create_table::<LiveOther>()).await,
    ] {
        result.expect("Failed to set up the live tables");
    }
    let item = LiveItem::table();
    let other = LiveOther::table();
    let insert_item = |id: i64| {
        insert(&item).value(&LiveItem {
            id,
            label: format!("item {}", id),
        })
    };

    let mut items = database
        .subscribe(select(&item).from(&item).order_by([item.id.asc()]))
        .await;
    let initial = items.latest();
    assert_eq!(initial.generation, 0);
    assert!(initial.rows().expect("The initial execution failed").is_empty());

    // Writes to other tables do not refresh it
    database
        .execute(&insert(&other).value(&LiveOther { id: 1 }))
        .await
        .expect("Failed to insert into the other table");
    database
        .execute(&insert_item(1))
        .await
        .expect("Failed to insert the first item");
    let published = next(&mut items).await;
    assert_eq!(published.generation, 1);
    let rows = published.rows().expect("The refresh failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "item 1");

    // Close commits may be coalesced, the last result is always the current one
    for id in 2..=4 {
        database
            .execute(&insert_item(id))
            .await
            .expect("Failed to insert an item");
    }
    let mut generation = published.generation;
    loop {
        let published = next(&mut items).await;
        assert!(published.generation > generation);
        generation = published.generation;
        let rows = published.rows().expect("The refresh failed");
        if rows.len() == 4 {
            assert_eq!(
                rows.iter().map(|v| v.id).collect::<Vec<_>>(),
                [1, 2, 3, 4]
            );
            break;
        }
    }
    assert_eq!(items.latest().generation, generation);

    // Committed transactions refresh once the lock is released
    let mut transaction = database.begin().await.expect("Failed to begin");
    transaction
        .execute(&insert_item(5))
        .await
        .expect("Failed to insert inside the transaction");
    transaction
        .execute(&insert_item(6))
        .await
        .expect("Failed to insert inside the transaction");
    transaction.commit().await.expect("Failed to commit");
    let published = next(&mut items).await;
    assert!(published.generation > generation);
    assert_eq!(published.rows().expect("The refresh failed").len(), 6);

    // Stream of a second subscription
    let others = database
        .subscribe(select(count_all()).from(&other))
        .await;
    let mut others = pin!(others.into_stream());
    let first = timeout(WAIT, others.next())
        .await
        .expect("Timed out waiting for the stream")
        .expect("The stream ended");
    assert_eq!(first.generation, 0);
    assert_eq!(first.rows().expect("The count failed"), [1]);
    database
        .execute(&insert(&other).value(&LiveOther { id: 2 }))
        .await
        .expect("Failed to insert into the other table");
    let second = timeout(WAIT, others.next())
        .await
        .expect("Timed out waiting for the stream")
        .expect("The stream ended");
    assert_eq!(second.generation, 1);
    assert_eq!(second.rows().expect("The count failed"), [2]);

    // Schema changes refresh every subscription, failures are published
    crate::silent_logs! {
        database
            .execute(&drop_table::<LiveItem>())
            .await
            .expect("Failed to drop the live item table");
        loop {
            let published = next(&mut items).await;
            if published.rows().is_err() {
                break;
            }
        }
    }
}
