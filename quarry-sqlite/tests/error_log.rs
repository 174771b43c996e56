#[cfg(test)]
mod tests {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use quarry_core::{Database, ErrorKind, drop_table};
    use quarry_sqlite::{ERROR_LOG_TARGET, SqliteConnection};
    use std::sync::Mutex;

    quarry_core::entity! {
        #[derive(Debug)]
        struct Ghost as GhostColumns in "ghost" {
            id: i64 => primary_key(),
        }
    }

    /// Keeps the records written by the SQLite error log.
    struct Recorder(Mutex<Vec<(Level, String)>>);

    impl Log for Recorder {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if record.target() == ERROR_LOG_TARGET {
                self.0
                    .lock()
                    .unwrap()
                    .push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static RECORDER: Recorder = Recorder(Mutex::new(Vec::new()));

    #[tokio::test]
    async fn sqlite_errors_reach_the_logger() {
        log::set_logger(&RECORDER).expect("Failed to install the recorder");
        log::set_max_level(LevelFilter::Trace);

        let database = Database::<SqliteConnection>::connect("sqlite://:memory:")
            .await
            .expect("Could not open the database");
        let error = database
            .execute(&drop_table::<Ghost>())
            .await
            .expect_err("Dropping a missing table fails");
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Provider));

        let records = RECORDER.0.lock().unwrap();
        assert!(
            records
                .iter()
                .any(|(level, message)| *level == Level::Error
                    && message.contains("no such table: ghost")),
            "The SQLite error log was not forwarded: {:?}",
            records
        );
    }
}
