use quarry::{
    Connection, Database, Entity, ErrorKind, count_all, create_table, delete, drop_table, insert,
    select, update,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Part as PartColumns in "part" {
        id: i64 => primary_key(),
        name: String => unique(),
        stock: i64,
        tag: Option<String>,
    }
}

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct LogLine as LogLineColumns in "log_line" {
        message: String,
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

async fn count<C: Connection>(database: &Database<C>) -> i64 {
    let part = Part::table();
    database
        .fetch_one(&select(count_all()).from(&part))
        .await
        .expect("Failed to count the parts")
        .expect("Count always produces a row")
}

pub async fn writes<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Part>().if_exists())
        .await
        .expect("Failed to drop the part table");
    database
        .execute(&create_table::<Part>().if_not_exists())
        .await
        .expect("Failed to create the part table");
    let part = Part::table();

    // Insert
    let error = insert(&part)
        .values(&Vec::<Part>::new())
        .expect_err("An insert without rows should not build");
    assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
    let result = database
        .execute(
            &insert(&part)
                .values(&[
                    Part {
                        id: 1,
                        name: "bolt".into(),
                        stock: 40,
                        tag: None,
                    },
                    Part {
                        id: 2,
                        name: "nut".into(),
                        stock: 3,
                        tag: None,
                    },
                    Part {
                        id: 3,
                        name: "washer".into(),
                        stock: 120,
                        tag: Some("bulk".into()),
                    },
                ])
                .expect("Failed to build the part insert"),
        )
        .await
        .expect("Failed to insert the parts");
    assert_eq!(result.rows_affected, 3);
    assert_eq!(result.last_affected_id, Some(3));

    // Unique constraint
    crate::silent_logs! {
        let error = database
            .execute(&insert(&part).value(&Part {
                id: 4,
                name: "bolt".into(),
                stock: 1,
                tag: None,
            }))
            .await
            .expect_err("A duplicated name should violate the unique constraint");
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Provider));
    }
    assert_eq!(count(database).await, 3);

    // Update with filter
    let result = database
        .execute(
            &update(&part)
                .set(&part.stock, part.stock.add(10i64))
                .set(&part.tag, Some("restocked"))
                .where_(part.name.eq("bolt")),
        )
        .await
        .expect("Failed to restock the bolts");
    assert_eq!(result.rows_affected, 1);
    let bolt = database
        .fetch_one(&select(&part).from(&part).where_(part.id.eq(1i64)))
        .await
        .expect("Failed to select the bolt")
        .expect("Failed to find the bolt");
    assert_eq!(bolt.stock, 50);
    assert_eq!(bolt.tag.as_deref(), Some("restocked"));

    // Update every column but the key
    let nut = Part {
        id: 2,
        name: "hex nut".into(),
        stock: 8,
        tag: Some("metric".into()),
    };
    database
        .execute(&update(&part).set_all(&nut).where_(part.id.eq(nut.id)))
        .await
        .expect("Failed to update the nut");
    let loaded = database
        .fetch_one(&select(&part).from(&part).where_(part.id.eq(2i64)))
        .await
        .expect("Failed to select the nut")
        .expect("Failed to find the nut");
    assert_eq!(loaded, nut);

    // Replace on conflict
    database
        .execute(&insert(&part).or_replace().value(&Part {
            id: 3,
            name: "washer".into(),
            stock: 100,
            tag: None,
        }))
        .await
        .expect("Failed to replace the washer");
    assert_eq!(count(database).await, 3);

    // Whole table update
    let result = database
        .execute(&update(&part).set(&part.tag, Some("audited")))
        .await
        .expect("Failed to update every part");
    assert_eq!(result.rows_affected, 3);
    let tags = database
        .fetch_all(&select(&part.tag).from(&part))
        .await
        .expect("Failed to select the tags");
    assert!(tags.iter().all(|v| v.as_deref() == Some("audited")));

    // Delete with filter
    let result = database
        .execute(&delete(&part).where_(part.stock.lt(10i64)))
        .await
        .expect("Failed to delete the scarce parts");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(count(database).await, 2);

    // Whole table delete
    let result = database
        .execute(&delete(&part))
        .await
        .expect("Failed to delete every part");
    assert_eq!(result.rows_affected, 2);
    assert_eq!(count(database).await, 0);

    // Insert from a select of the same shape
    database
        .execute(&drop_table::<LogLine>().if_exists())
        .await
        .expect("Failed to drop the log_line table");
    database
        .execute(&create_table::<LogLine>())
        .await
        .expect("Failed to create the log_line table");
    let log = LogLine::table();
    database
        .execute(
            &insert(&log)
                .values(&[
                    LogLine {
                        message: "started".into(),
                    },
                    LogLine {
                        message: "stopped".into(),
                    },
                ])
                .expect("Failed to build the log insert"),
        )
        .await
        .expect("Failed to insert the log lines");
    let copy = LogLine::table();
    let result = database
        .execute(&insert(&log).select(select(&copy).from(&copy)))
        .await
        .expect("Failed to duplicate the log lines");
    assert_eq!(result.rows_affected, 2);
    let mut lines = database
        .fetch_all(&select(&log.message).from(&log))
        .await
        .expect("Failed to select the log lines");
    lines.sort();
    assert_eq!(lines, ["started", "started", "stopped", "stopped"]);
}
