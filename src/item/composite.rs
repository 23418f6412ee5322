use log::warn;

use crate::core::item::{ItemWriter, ItemWriterResult};

/// Writer calling its delegates in the order they were added.
///
/// `open`, `write` and `flush` stop at the first failing delegate: later
/// delegates do not see that call and the error is returned. Delegates that
/// already accepted a chunk keep it. `close` is attempted on every delegate
/// and the first error is returned.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
///
/// use spring_batch_example::core::item::{ItemWriter, ItemWriterResult};
/// use spring_batch_example::item::composite::CompositeItemWriterBuilder;
///
/// #[derive(Default)]
/// struct Recorder(RefCell<Vec<u32>>);
///
/// impl ItemWriter<u32> for Recorder {
///     fn write(&self, items: &[u32]) -> ItemWriterResult {
///         self.0.borrow_mut().extend_from_slice(items);
///         Ok(())
///     }
/// }
///
/// let first = Recorder::default();
/// let second = Recorder::default();
/// let writer = CompositeItemWriterBuilder::<u32>::new()
///     .delegate(&first)
///     .delegate(&second)
///     .build();
///
/// writer.write(&[1, 2]).unwrap();
///
/// assert_eq!(*first.0.borrow(), vec![1, 2]);
/// assert_eq!(*second.0.borrow(), vec![1, 2]);
/// ```
pub struct CompositeItemWriter<'a, O> {
    delegates: Vec<&'a dyn ItemWriter<O>>,
}

impl<O> ItemWriter<O> for CompositeItemWriter<'_, O> {
    fn write(&self, items: &[O]) -> ItemWriterResult {
        for delegate in &self.delegates {
            delegate.write(items)?;
        }
        Ok(())
    }

    fn flush(&self) -> ItemWriterResult {
        for delegate in &self.delegates {
            delegate.flush()?;
        }
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        for delegate in &self.delegates {
            delegate.open()?;
        }
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        let mut first_error = None;

        for (index, delegate) in self.delegates.iter().enumerate() {
            if let Err(error) = delegate.close() {
                warn!("Closing writer #{} failed: {}", index, error);
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct CompositeItemWriterBuilder<'a, O> {
    delegates: Vec<&'a dyn ItemWriter<O>>,
}

impl<'a, O> CompositeItemWriterBuilder<'a, O> {
    pub fn new() -> Self {
        Self {
            delegates: Vec::new(),
        }
    }

    pub fn delegate(mut self, delegate: &'a dyn ItemWriter<O>) -> Self {
        self.delegates.push(delegate);
        self
    }

    pub fn build(self) -> CompositeItemWriter<'a, O> {
        CompositeItemWriter {
            delegates: self.delegates,
        }
    }
}
