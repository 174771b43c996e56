use quarry::{
    Connection, Database, Entity, ErrorKind, case, create_table, drop_table, insert, select,
    stream::TryStreamExt,
};
use std::sync::LazyLock;
use time::{Date, macros::date};
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Sample as SampleColumns in "sample" {
        id: i64 => primary_key(),
        label: String,
        ratio: f64,
        active: bool,
        payload: Vec<u8>,
        note: Option<String>,
        born: Date,
        score: Option<i64>,
    }
}

quarry::entity! {
    #[derive(Debug)]
    struct LooseNote as LooseNoteColumns in "sample_note" {
        id: i64 => primary_key(),
        body: Option<String>,
    }
}

// Same table, read as if the body could not be NULL
quarry::entity! {
    #[derive(Debug)]
    struct StrictNote as StrictNoteColumns in "sample_note" {
        id: i64 => primary_key(),
        body: String,
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn simple<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Sample>().if_exists())
        .await
        .expect("Failed to drop the sample table");
    database
        .execute(&create_table::<Sample>())
        .await
        .expect("Failed to create the sample table");

    let samples = vec![
        Sample {
            id: 1,
            label: "alpha".into(),
            ratio: 0.25,
            active: true,
            payload: vec![0xCA, 0xFE],
            note: None,
            born: date!(1999 - 12 - 31),
            score: Some(-7),
        },
        Sample {
            id: 2,
            label: "bravo".into(),
            ratio: -1.5e10,
            active: false,
            payload: Vec::new(),
            note: Some("it's quoted".into()),
            born: date!(2024 - 02 - 29),
            score: None,
        },
        Sample {
            id: 3,
            label: "charlie".into(),
            ratio: 3.0,
            active: true,
            payload: vec![0, 1, 2, 3],
            note: Some("".into()),
            born: date!(2001 - 01 - 01),
            score: Some(i64::MAX),
        },
    ];
    let sample = Sample::table();
    let result = database
        .execute(
            &insert(&sample)
                .values(&samples)
                .expect("Failed to build the sample insert"),
        )
        .await
        .expect("Failed to insert the samples");
    assert_eq!(result.rows_affected, 3);

    // Round trip
    let loaded = database
        .fetch_all(&select(&sample).from(&sample).order_by([sample.id.asc()]))
        .await
        .expect("Failed to select the samples");
    assert_eq!(loaded, samples);

    // Single row
    let bravo = database
        .fetch_one(&select(&sample).from(&sample).where_(sample.id.eq(2i64)))
        .await
        .expect("Failed to select sample 2")
        .expect("Failed to find sample 2");
    assert_eq!(bravo, samples[1]);
    let missing = database
        .fetch_one(&select(&sample).from(&sample).where_(sample.id.eq(42i64)))
        .await
        .expect("Failed to select sample 42");
    assert!(missing.is_none());

    // Dates compare as dates, not as text
    let labels = database
        .fetch_all(
            &select(&sample.label)
                .from(&sample)
                .where_(sample.born.gt(date!(2000 - 06 - 15)))
                .order_by([sample.born.desc()]),
        )
        .await
        .expect("Failed to select by date");
    assert_eq!(labels, ["bravo", "charlie"]);

    // Expressions
    let rows = database
        .fetch_all(
            &select((
                sample.label.upper(),
                sample.ratio.mul(2.0),
                sample.label.length(),
                case::<String>().when(&sample.active, "on").otherwise("off"),
                sample.score.coalesce(0i64),
            ))
            .from(&sample)
            .where_(sample.label.like("%a%"))
            .order_by([sample.id.asc()]),
        )
        .await
        .expect("Failed to select the expressions");
    assert_eq!(
        rows,
        [
            ("ALPHA".to_string(), 0.5, 5, "on".to_string(), -7),
            ("BRAVO".to_string(), -3.0e10, 5, "off".to_string(), 0),
            ("CHARLIE".to_string(), 6.0, 7, "on".to_string(), i64::MAX),
        ]
    );

    // Boolean column as condition, rows streamed
    let active = database
        .fetch(
            select(&sample.id)
                .from(&sample)
                .where_(&sample.active)
                .order_by([sample.id.asc()]),
        )
        .try_collect::<Vec<_>>()
        .await
        .expect("Failed to stream the active samples");
    assert_eq!(active, [1, 3]);

    // NULL into a non nullable field
    database
        .execute(&drop_table::<LooseNote>().if_exists())
        .await
        .expect("Failed to drop the sample_note table");
    database
        .execute(&create_table::<LooseNote>())
        .await
        .expect("Failed to create the sample_note table");
    let loose = LooseNote::table();
    database
        .execute(&insert(&loose).value(&LooseNote { id: 1, body: None }))
        .await
        .expect("Failed to insert the note");
    let strict = StrictNote::table();
    let error = database
        .fetch_all(&select(&strict).from(&strict))
        .await
        .expect_err("A NULL body should not decode into String");
    assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Decode));
    let notes = database
        .fetch_all(&select(&loose).from(&loose))
        .await
        .expect("Failed to select the notes");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].body, None);
}
