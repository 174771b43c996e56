use quarry::{
    Connection, Database, Entity, ErrorKind, create_table, drop_table, insert, select, update,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Account as AccountColumns in "account" {
        id: i64 => primary_key(),
        holder: String,
        balance: i64,
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

async fn balance<C: Connection>(database: &Database<C>, id: i64) -> i64 {
    let account = Account::table();
    database
        .fetch_one(
            &select(&account.balance)
                .from(&account)
                .where_(account.id.eq(id)),
        )
        .await
        .expect("Failed to select the balance")
        .expect("Failed to find the account")
}

pub async fn transactions<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Account>().if_exists())
        .await
        .expect("Failed to drop the account table");
    database
        .execute(&create_table::<Account>())
        .await
        .expect("Failed to create the account table");
    let account = Account::table();
    database
        .execute(
            &insert(&account)
                .values(&[
                    Account {
                        id: 1,
                        holder: "ann".into(),
                        balance: 100,
                    },
                    Account {
                        id: 2,
                        holder: "ben".into(),
                        balance: 50,
                    },
                ])
                .expect("Failed to build the account insert"),
        )
        .await
        .expect("Failed to insert the accounts");
    let withdraw = |amount: i64| {
        update(&account)
            .set(&account.balance, account.balance.sub(amount))
            .where_(account.id.eq(1i64))
    };

    // Commit
    let mut transaction = database.begin().await.expect("Failed to begin");
    transaction
        .execute(&withdraw(10))
        .await
        .expect("Failed to withdraw inside the transaction");
    let inside = transaction
        .fetch_one(
            &select(&account.balance)
                .from(&account)
                .where_(account.id.eq(1i64)),
        )
        .await
        .expect("Failed to select inside the transaction");
    assert_eq!(inside, Some(90));
    transaction.commit().await.expect("Failed to commit");
    assert_eq!(balance(database, 1).await, 90);

    // Rollback
    let mut transaction = database.begin().await.expect("Failed to begin");
    transaction
        .execute(&withdraw(40))
        .await
        .expect("Failed to withdraw inside the transaction");
    transaction.rollback().await.expect("Failed to roll back");
    assert_eq!(balance(database, 1).await, 90);

    // Dropped without an outcome
    crate::silent_logs! {
        let mut transaction = database.begin().await.expect("Failed to begin");
        transaction
            .execute(&withdraw(40))
            .await
            .expect("Failed to withdraw inside the transaction");
        drop(transaction);
        assert_eq!(balance(database, 1).await, 90);
    }

    // Closure that succeeds
    let total = database
        .transaction(|transaction| {
            Box::pin(async move {
                let account = Account::table();
                for (id, amount) in [(1i64, -25i64), (2, 25)] {
                    transaction
                        .execute(
                            &update(&account)
                                .set(&account.balance, account.balance.add(amount))
                                .where_(account.id.eq(id)),
                        )
                        .await?;
                }
                transaction
                    .fetch_one(&select(account.balance.sum()).from(&account))
                    .await
            })
        })
        .await
        .expect("Failed to run the transfer");
    assert_eq!(total, Some(Some(140)));
    assert_eq!(balance(database, 1).await, 65);
    assert_eq!(balance(database, 2).await, 75);

    // Closure that fails
    let result = database
        .transaction::<(), _>(|transaction| {
            Box::pin(async move {
                let account = Account::table();
                transaction
                    .execute(
                        &update(&account)
                            .set(&account.balance, account.balance.sub(1000i64))
                            .where_(account.id.eq(2i64)),
                    )
                    .await?;
                Err(ErrorKind::Build.error("Insufficient funds"))
            })
        })
        .await;
    let error = result.expect_err("The failing transfer should not commit");
    assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
    assert_eq!(balance(database, 2).await, 75);

    // The transaction is over, the database is usable again
    let holders = database
        .fetch_all(
            &select(&account.holder)
                .from(&account)
                .order_by([account.id.asc()]),
        )
        .await
        .expect("Failed to select the holders");
    assert_eq!(holders, ["ann", "ben"]);
}
