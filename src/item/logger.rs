use std::fmt::Debug;

use log::info;

use crate::{core::item::ItemWriter, BatchError};

/// Writer logging every chunk at `info` level.
///
/// The chunk size is always logged; the items themselves only when
/// `log_items` is set.
pub struct LoggerWriter {
    log_items: bool,
}

impl LoggerWriter {
    /// Logger writing the chunk size and every item.
    pub fn new() -> Self {
        Self { log_items: true }
    }

    /// Logger writing only the size of each chunk.
    pub fn size_only() -> Self {
        Self { log_items: false }
    }
}

impl Default for LoggerWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ItemWriter<T> for LoggerWriter
where
    T: Debug,
{
    fn write(&self, items: &[T]) -> Result<(), BatchError> {
        if self.log_items {
            items.iter().for_each(|item| info!("Record:{:?}", item));
        }
        info!("chunk item size : {}", items.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::item::ItemWriter;

    use super::LoggerWriter;

    #[test]
    fn logging_should_never_fail() {
        let items = vec!["0 Hello, Spring Batch", "1 Hello, Spring Batch"];

        assert!(LoggerWriter::new().write(&items).is_ok());
        assert!(LoggerWriter::size_only().write(&items).is_ok());
    }
}
