use sqlx::{query_builder::Separated, Database};

/// SQLite writer inserting each chunk in one transaction.
#[cfg(feature = "rdbc-sqlite")]
pub mod sqlite_writer;

/// Binds the fields of an item as the values of one `INSERT` row.
///
/// Values are pushed in the order of the writer's columns.
pub trait DatabaseItemBinder<O, DB: Database> {
    fn bind(&self, item: &O, query_builder: Separated<DB, &str>);
}

#[cfg(feature = "rdbc-sqlite")]
pub use sqlite_writer::SqliteItemWriter;
