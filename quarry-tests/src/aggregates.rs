use quarry::{Connection, Database, Entity, count_all, create_table, drop_table, insert, select};
use std::sync::LazyLock;
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Sale as SaleColumns in "sale" {
        id: i64 => primary_key(),
        region: String,
        amount: i64,
        discount: Option<f64>,
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn aggregates<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Sale>().if_exists())
        .await
        .expect("Failed to drop the sale table");
    database
        .execute(&create_table::<Sale>())
        .await
        .expect("Failed to create the sale table");
    let sales = [
        ("north", 10, Some(0.5)),
        ("north", 20, None),
        ("north", 30, Some(1.5)),
        ("south", 5, None),
        ("west", 7, Some(0.25)),
        ("west", 8, None),
    ]
    .into_iter()
    .zip(1..)
    .map(|((region, amount, discount), id)| Sale {
        id,
        region: region.into(),
        amount,
        discount,
    })
    .collect::<Vec<_>>();
    let sale = Sale::table();
    database
        .execute(&insert(&sale).values(&sales).expect("Failed to build the sale insert"))
        .await
        .expect("Failed to insert the sales");

    // Group by with having
    let regions = database
        .fetch_all(
            &select((
                &sale.region,
                sale.amount.sum(),
                count_all(),
                sale.amount.avg(),
            ))
            .from(&sale)
            .group_by(&sale.region)
            .having(count_all().gt(1i64))
            .order_by([sale.region.asc()]),
        )
        .await
        .expect("Failed to group the sales by region");
    assert_eq!(
        regions,
        [
            ("north".to_string(), Some(60), 3, Some(20.0)),
            ("west".to_string(), Some(15), 2, Some(7.5)),
        ]
    );
    let regions = database
        .fetch_all(
            &select(&sale.region)
                .from(&sale)
                .where_(sale.amount.ge(6i64))
                .group_by(&sale.region)
                .having(sale.amount.sum().gt(20i64)),
        )
        .await
        .expect("Failed to filter the groups by their sum");
    assert_eq!(regions, ["north"]);

    // Whole table aggregates
    let (min, max, regions, discount) = database
        .fetch_one(&select((
            sale.amount.min(),
            sale.amount.max(),
            sale.region.count_distinct(),
            sale.discount.avg(),
        ))
        .from(&sale))
        .await
        .expect("Failed to aggregate the sales")
        .expect("Aggregates always produce a row");
    assert_eq!(min, Some(5));
    assert_eq!(max, Some(30));
    assert_eq!(regions, 3);
    assert_eq!(discount, Some(0.75));

    // Distinct
    let regions = database
        .fetch_all(
            &select(&sale.region)
                .distinct()
                .from(&sale)
                .order_by([sale.region.asc()]),
        )
        .await
        .expect("Failed to select the distinct regions");
    assert_eq!(regions, ["north", "south", "west"]);

    // Arithmetic after a cast
    let halves = database
        .fetch_all(
            &select(sale.amount.cast::<f64>().div(2.0))
                .from(&sale)
                .where_(sale.region.eq("west"))
                .order_by([sale.id.asc()]),
        )
        .await
        .expect("Failed to halve the amounts");
    assert_eq!(halves, [3.5, 4.0]);
}
