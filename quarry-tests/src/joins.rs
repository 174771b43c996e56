use quarry::{
    Connection, Database, Entity, Table, count_all, create_table, drop_table, exists, insert,
    scalar, select,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Owner as OwnerColumns in "owner" {
        id: i64 => primary_key(),
        name: String,
    }
}

quarry::entity! {
    #[derive(Debug, Clone, PartialEq)]
    struct Pet as PetColumns in "pet" {
        id: i64 => primary_key(),
        name: String,
        owner: Option<i64> => references("owner", "id"),
    }
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn joins<C: Connection>(database: &Database<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute(&drop_table::<Pet>().if_exists())
        .await
        .expect("Failed to drop the pet table");
    database
        .execute(&drop_table::<Owner>().if_exists())
        .await
        .expect("Failed to drop the owner table");
    database
        .execute(&create_table::<Owner>())
        .await
        .expect("Failed to create the owner table");
    database
        .execute(&create_table::<Pet>())
        .await
        .expect("Failed to create the pet table");
    let owners = ["Alice", "Bob", "Carol"]
        .into_iter()
        .zip(1..)
        .map(|(name, id)| Owner {
            id,
            name: name.into(),
        })
        .collect::<Vec<_>>();
    let pets = [("Rex", Some(1)), ("Tom", Some(1)), ("Nemo", Some(2)), ("Stray", None)]
        .into_iter()
        .zip(1..)
        .map(|((name, owner), id)| Pet {
            id,
            name: name.into(),
            owner,
        })
        .collect::<Vec<_>>();
    let owner = Owner::table();
    let pet = Pet::table();
    database
        .execute(&insert(&owner).values(&owners).expect("Failed to build the owner insert"))
        .await
        .expect("Failed to insert the owners");
    database
        .execute(&insert(&pet).values(&pets).expect("Failed to build the pet insert"))
        .await
        .expect("Failed to insert the pets");

    // Inner join
    let rows = database
        .fetch_all(
            &select((&pet.name, &owner.name))
                .from(&pet)
                .join(&owner, pet.owner.eq(&owner.id))
                .order_by([pet.id.asc()]),
        )
        .await
        .expect("Failed to join the pets with their owners");
    assert_eq!(
        rows,
        [
            ("Rex".to_string(), "Alice".to_string()),
            ("Tom".to_string(), "Alice".to_string()),
            ("Nemo".to_string(), "Bob".to_string()),
        ]
    );
    let names = database
        .fetch_all(
            &select(&pet.name)
                .from(&pet)
                .join(&owner, pet.owner.eq(&owner.id))
                .where_(owner.name.eq("Alice"))
                .order_by([pet.name.asc()]),
        )
        .await
        .expect("Failed to select the pets of Alice");
    assert_eq!(names, ["Rex", "Tom"]);

    // Left join, the missing side decodes as None
    let rows = database
        .fetch_all(
            &select((&pet.name, owner.nullable()))
                .from(&pet)
                .left_join(&owner, pet.owner.eq(&owner.id))
                .order_by([pet.id.asc()]),
        )
        .await
        .expect("Failed to left join the owners");
    assert_eq!(
        rows,
        [
            ("Rex".to_string(), Some(owners[0].clone())),
            ("Tom".to_string(), Some(owners[0].clone())),
            ("Nemo".to_string(), Some(owners[1].clone())),
            ("Stray".to_string(), None),
        ]
    );
    let counts = database
        .fetch_all(
            &select((&owner.name, pet.id.count()))
                .from(&owner)
                .left_join(&pet, pet.owner.eq(&owner.id))
                .group_by(&owner.name)
                .order_by([owner.name.asc()]),
        )
        .await
        .expect("Failed to count the pets of each owner");
    assert_eq!(
        counts,
        [
            ("Alice".to_string(), 2),
            ("Bob".to_string(), 1),
            ("Carol".to_string(), 0),
        ]
    );

    // Cross join
    let combinations = database
        .fetch_one(&select(count_all()).from(&owner).cross_join(&pet))
        .await
        .expect("Failed to count the combinations")
        .expect("Count always produces a row");
    assert_eq!(combinations, 12);

    // Correlated EXISTS
    let with_pets = database
        .fetch_all(
            &select(&owner.name)
                .from(&owner)
                .where_(exists(
                    select(&pet.id).from(&pet).where_(pet.owner.eq(&owner.id)),
                ))
                .order_by([owner.name.asc()]),
        )
        .await
        .expect("Failed to select the owners with pets");
    assert_eq!(with_pets, ["Alice", "Bob"]);

    // IN over a select
    let with_pets = database
        .fetch_all(
            &select(&owner.name)
                .from(&owner)
                .where_(owner.id.in_query(select(&pet.owner).from(&pet)))
                .order_by([owner.name.asc()]),
        )
        .await
        .expect("Failed to select the owners in the pet table");
    assert_eq!(with_pets, ["Alice", "Bob"]);

    // Scalar subquery in the select list
    let counts = database
        .fetch_all(
            &select((
                &owner.name,
                scalar(select(count_all()).from(&pet).where_(pet.owner.eq(&owner.id))),
            ))
            .from(&owner)
            .order_by([owner.id.asc()]),
        )
        .await
        .expect("Failed to select the pet counts");
    assert_eq!(
        counts,
        [
            ("Alice".to_string(), Some(2)),
            ("Bob".to_string(), Some(1)),
            ("Carol".to_string(), Some(0)),
        ]
    );

    // Derived table
    let inner = Owner::table();
    let not_bob = Table::<Owner>::derived(
        select(&inner)
            .from(&inner)
            .where_(inner.name.ne("Bob")),
    );
    let names = database
        .fetch_all(
            &select(&not_bob.name)
                .from(&not_bob)
                .order_by([not_bob.name.asc()]),
        )
        .await
        .expect("Failed to select from a derived table");
    assert_eq!(names, ["Alice", "Carol"]);
}
