use quarry::{
    Connection, Cte, Database, Entity, create_table, drop_table, insert, select, with,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Customer as CustomerColumns in "customer" {
        id: i64 => primary_key(),
        name: String,
    }
}

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Supplier as SupplierColumns in "supplier" {
        id: i64 => primary_key(),
        name: String,
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

pub async fn compound<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Customer>().if_exists())
        .await
        .expect("Failed to drop the customer table");
    database
        .execute(&drop_table::<Supplier>().if_exists())
        .await
        .expect("Failed to drop the supplier table");
    database
        .execute(&create_table::<Customer>())
        .await
        .expect("Failed to create the customer table");
    database
        .execute(&create_table::<Supplier>())
        .await
        .expect("Failed to create the supplier table");
    let customer = Customer::table();
    let supplier = Supplier::table();
    let customers = ["Ann", "Ben", "Cat"]
        .into_iter()
        .zip(1..)
        .map(|(name, id)| Customer {
            id,
            name: name.into(),
        })
        .collect::<Vec<_>>();
    let suppliers = ["Ben", "Dan"]
        .into_iter()
        .zip(1..)
        .map(|(name, id)| Supplier {
            id,
            name: name.into(),
        })
        .collect::<Vec<_>>();
    database
        .execute(
            &insert(&customer)
                .values(&customers)
                .expect("Failed to build the customer insert"),
        )
        .await
        .expect("Failed to insert the customers");
    database
        .execute(
            &insert(&supplier)
                .values(&suppliers)
                .expect("Failed to build the supplier insert"),
        )
        .await
        .expect("Failed to insert the suppliers");

    let customers = || select(&customer.name).from(&customer);
    let suppliers = || select(&supplier.name).from(&supplier);

    let names = database
        .fetch_all(&customers().union(suppliers()))
        .await
        .expect("Failed to select the union");
    assert_eq!(sorted(names), ["Ann", "Ben", "Cat", "Dan"]);

    let names = database
        .fetch_all(&customers().union_all(suppliers()))
        .await
        .expect("Failed to select the union all");
    assert_eq!(sorted(names), ["Ann", "Ben", "Ben", "Cat", "Dan"]);

    let names = database
        .fetch_all(&customers().intersect(suppliers()))
        .await
        .expect("Failed to select the intersection");
    assert_eq!(names, ["Ben"]);

    let names = database
        .fetch_all(&customers().except(suppliers()))
        .await
        .expect("Failed to select the difference");
    assert_eq!(sorted(names), ["Ann", "Cat"]);

    // Left associative: (customers UNION suppliers) EXCEPT Ann
    let ann = Customer::table();
    let names = database
        .fetch_all(
            &customers()
                .union(suppliers())
                .except(select(&ann.name).from(&ann).where_(ann.name.eq("Ann"))),
        )
        .await
        .expect("Failed to select the chained compound");
    assert_eq!(sorted(names), ["Ben", "Cat", "Dan"]);

    // Parameters of both sides bound in order
    let names = database
        .fetch_all(
            &select(&customer.name)
                .from(&customer)
                .where_(customer.id.gt(1i64))
                .union(
                    select(&supplier.name)
                        .from(&supplier)
                        .where_(supplier.name.ne("Dan")),
                ),
        )
        .await
        .expect("Failed to select the filtered union");
    assert_eq!(sorted(names), ["Ben", "Cat"]);

    // Common table expressions of the right operand
    let source = Supplier::table();
    let late = Cte::new(select(&source).from(&source).where_(source.id.gt(1i64)));
    let vendor = late.table();
    let names = database
        .fetch_all(
            &select(&customer.name)
                .from(&customer)
                .where_(customer.name.eq("Ann"))
                .union(with().cte(&late).select(&vendor.name).from(&vendor)),
        )
        .await
        .expect("Failed to select the union with a common table expression");
    assert_eq!(sorted(names), ["Ann", "Dan"]);
}
