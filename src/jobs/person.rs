use serde::{Deserialize, Serialize};
use sqlx::{query_builder::Separated, Sqlite};

use crate::item::rdbc::DatabaseItemBinder;

/// Names given to the generated persons, in order.
pub const MEMBER_NAMES: [&str; 10] = [
    "멤버1", "멤버2", "멤버3", "멤버4", "멤버5", "멤버6", "멤버7", "멤버8", "멤버9", "멤버10",
];

/// Item of the file and database jobs. Fields map to the CSV columns
/// `id,name,age,address` in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: String,
    pub address: String,
}

impl Person {
    pub fn new(id: i64, name: &str, age: &str, address: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            age: age.to_string(),
            address: address.to_string(),
        }
    }
}

/// `count` persons with ids from 1, cycling through [`MEMBER_NAMES`].
pub fn generate_persons(count: usize) -> Vec<Person> {
    (0..count)
        .map(|i| {
            Person::new(
                i as i64 + 1,
                MEMBER_NAMES[i % MEMBER_NAMES.len()],
                "test age",
                "test address",
            )
        })
        .collect()
}

/// Binds `name`, `age` and `address`; the `person` table generates ids.
pub struct PersonBinder;

impl DatabaseItemBinder<Person, Sqlite> for PersonBinder {
    fn bind(&self, item: &Person, mut query_builder: Separated<Sqlite, &str>) {
        query_builder.push_bind(item.name.clone());
        query_builder.push_bind(item.age.clone());
        query_builder.push_bind(item.address.clone());
    }
}
