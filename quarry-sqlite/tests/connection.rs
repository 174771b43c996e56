#[cfg(test)]
mod tests {
    use quarry_core::{
        Connection, Database, Entity, ErrorKind, IdentifierQuoting, create_table, select,
    };
    use quarry_sqlite::SqliteConnection;
    use quarry_tests::{init_logs, silent_logs};
    use std::{
        path::Path,
        sync::{Arc, Mutex},
    };
    use tokio::fs;

    quarry_core::entity! {
        #[derive(Debug, Clone, PartialEq)]
        struct Gauge as GaugeColumns in "gauge" {
            id: i64 => primary_key(),
            reading: f64,
        }
    }

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH))
            .await
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH))
                    .await
                    .is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            let error = SqliteConnection::connect("postgres://some_value")
                .await
                .expect_err("Only sqlite urls are accepted");
            assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
            let error = SqliteConnection::connect("sqlite://:memory:?quarry_cache_capacity=many")
                .await
                .expect_err("The capacity must be a number");
            assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
        };
    }

    #[tokio::test]
    async fn url_configuration() {
        init_logs();
        let connection = SqliteConnection::connect(
            "sqlite://:memory:?quarry_cache_capacity=7&quarry_cache=false&quarry_quote_identifiers=false",
        )
        .await
        .expect("Could not open the in memory database");
        let config = connection.config();
        assert_eq!(config.cache_capacity, 7);
        assert!(!config.cache_statements);
        assert_eq!(config.quoting, IdentifierQuoting::Bare);

        // Statements run without touching the cache
        let database = Database::new(connection);
        database
            .execute(&create_table::<Gauge>())
            .await
            .expect("Failed to create the gauge table");
        let gauge = Gauge::table();
        let readings = database
            .fetch_all(&select(&gauge.reading).from(&gauge))
            .await
            .expect("Failed to select the readings");
        assert!(readings.is_empty());
        assert_eq!(database.cached_statements().await, 0);
    }

    #[tokio::test]
    async fn cache_eviction() {
        init_logs();
        let database =
            Database::<SqliteConnection>::connect("sqlite://:memory:?quarry_cache_capacity=2")
                .await
                .expect("Could not open the in memory database");
        database
            .execute(&create_table::<Gauge>())
            .await
            .expect("Failed to create the gauge table");
        let gauge = Gauge::table();
        let by_id = select(&gauge).from(&gauge).where_(gauge.id.eq(1i64));
        let by_reading = select(&gauge).from(&gauge).where_(gauge.reading.gt(0.5));
        let ids = select(&gauge.id).from(&gauge);

        let first = database
            .prepare(&by_id, true)
            .await
            .expect("Failed to prepare by id");
        let second = database
            .prepare(&by_reading, true)
            .await
            .expect("Failed to prepare by reading");
        // Touch the first so the second is the least recently used
        let again = database
            .prepare(&by_id, true)
            .await
            .expect("Failed to prepare by id again");
        assert!(Arc::ptr_eq(&first, &again));
        database
            .prepare(&ids, true)
            .await
            .expect("Failed to prepare the ids");
        assert_eq!(database.cached_statements().await, 2);

        let still = database
            .prepare(&by_id, true)
            .await
            .expect("Failed to prepare by id after the eviction");
        assert!(Arc::ptr_eq(&first, &still));
        let replaced = database
            .prepare(&by_reading, true)
            .await
            .expect("Failed to prepare by reading after the eviction");
        assert!(!Arc::ptr_eq(&second, &replaced));
        assert_eq!(database.cached_statements().await, 2);

        drop(second);
        let rows = database
            .fetch_all(&by_reading)
            .await
            .expect("Failed to select after the eviction");
        assert!(rows.is_empty());
    }
}
