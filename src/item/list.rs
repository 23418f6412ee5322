use std::{cell::RefCell, collections::VecDeque};

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    BatchError,
};

/// Reader draining an in-memory list, front to back.
///
/// # Examples
///
/// ```
/// use spring_batch_example::core::item::ItemReader;
/// use spring_batch_example::item::list::ListItemReader;
///
/// let reader = ListItemReader::new(vec!["0 Hello", "1 Hello"]);
///
/// assert_eq!(reader.read().unwrap(), Some("0 Hello"));
/// assert_eq!(reader.read().unwrap(), Some("1 Hello"));
/// assert_eq!(reader.read().unwrap(), None);
/// ```
pub struct ListItemReader<T> {
    items: RefCell<VecDeque<T>>,
}

impl<T> ListItemReader<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(VecDeque::from(items)),
        }
    }

    /// Number of items not read yet.
    pub fn remaining(&self) -> usize {
        self.items.borrow().len()
    }
}

impl<T> ItemReader<T> for ListItemReader<T> {
    fn read(&self) -> ItemReaderResult<T> {
        Ok(self.items.borrow_mut().pop_front())
    }

    fn resume_at(&self, cursor: usize) -> Result<(), BatchError> {
        let mut items = self.items.borrow_mut();
        let skipped = cursor.min(items.len());
        items.drain(..skipped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::item::ItemReader;

    use super::ListItemReader;

    #[test]
    fn resume_at_should_drop_consumed_items() {
        let reader = ListItemReader::new((0..5).collect::<Vec<i32>>());

        reader.resume_at(3).unwrap();

        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.read().unwrap(), Some(3));
    }

    #[test]
    fn resume_past_the_end_should_leave_reader_empty() {
        let reader = ListItemReader::new(vec![1, 2]);

        reader.resume_at(10).unwrap();

        assert_eq!(reader.read().unwrap(), None);
    }
}
