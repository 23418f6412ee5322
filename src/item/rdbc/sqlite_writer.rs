use log::{debug, error};
use sqlx::{Pool, QueryBuilder, Sqlite};
use tokio::runtime::Handle;

use crate::core::item::{ItemWriter, ItemWriterResult};
use crate::item::rdbc::DatabaseItemBinder;
use crate::BatchError;

// Maximum number of bound parameters accepted by SQLite in one statement
const BIND_LIMIT: usize = 32766;

/// Writer inserting items into a SQLite table.
///
/// Every chunk is written inside a single transaction: either all its items
/// are inserted or none. Chunks larger than the bind limit are split into
/// several statements of the same transaction.
///
/// The writer blocks on the async driver with
/// [`tokio::task::block_in_place`], so it must run inside a multi-threaded
/// tokio runtime.
pub struct SqliteItemWriter<'a, O> {
    pool: Option<&'a Pool<Sqlite>>,
    table: Option<&'a str>,
    columns: Vec<&'a str>,
    item_binder: Option<&'a dyn DatabaseItemBinder<O, Sqlite>>,
}

impl<O> Default for SqliteItemWriter<'_, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, O> SqliteItemWriter<'a, O> {
    pub fn new() -> Self {
        Self {
            pool: None,
            table: None,
            columns: Vec::new(),
            item_binder: None,
        }
    }

    pub fn pool(mut self, pool: &'a Pool<Sqlite>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    pub fn add_column(mut self, column: &'a str) -> Self {
        self.columns.push(column);
        self
    }

    pub fn item_binder(mut self, item_binder: &'a dyn DatabaseItemBinder<O, Sqlite>) -> Self {
        self.item_binder = Some(item_binder);
        self
    }

    fn configuration(
        &self,
    ) -> Result<(&'a Pool<Sqlite>, &'a str, &'a dyn DatabaseItemBinder<O, Sqlite>), BatchError>
    {
        let missing =
            |what: &str| BatchError::Configuration(format!("SQLite writer has no {}", what));

        let pool = self.pool.ok_or_else(|| missing("pool"))?;
        let table = self.table.ok_or_else(|| missing("table"))?;
        let binder = self.item_binder.ok_or_else(|| missing("item binder"))?;
        if self.columns.is_empty() {
            return Err(missing("column"));
        }

        Ok((pool, table, binder))
    }

    async fn insert(
        &self,
        pool: &Pool<Sqlite>,
        table: &str,
        binder: &dyn DatabaseItemBinder<O, Sqlite>,
        items: &[O],
    ) -> Result<(), sqlx::Error> {
        let mut transaction = pool.begin().await?;

        for rows in items.chunks(BIND_LIMIT / self.columns.len()) {
            let mut query_builder = QueryBuilder::new("INSERT INTO ");
            query_builder.push(table);
            query_builder.push(" (");
            query_builder.push(self.columns.join(","));
            query_builder.push(") ");
            query_builder.push_values(rows, |b, item| binder.bind(item, b));

            query_builder.build().execute(&mut *transaction).await?;
        }

        transaction.commit().await
    }
}

impl<O> ItemWriter<O> for SqliteItemWriter<'_, O> {
    fn write(&self, items: &[O]) -> ItemWriterResult {
        if items.is_empty() {
            return Ok(());
        }

        let (pool, table, binder) = self.configuration()?;
        let handle = Handle::try_current().map_err(|error| {
            BatchError::ItemWriter(format!("SQLite writer needs a tokio runtime: {}", error))
        })?;

        let result = tokio::task::block_in_place(|| {
            handle.block_on(self.insert(pool, table, binder, items))
        });

        match result {
            Ok(()) => {
                debug!(
                    "Successfully wrote {} items to SQLite table {}",
                    items.len(),
                    table
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to write items to SQLite table {}: {}", table, e);
                Err(BatchError::ItemWriter(format!("SQLite write failed: {}", e)))
            }
        }
    }
}
