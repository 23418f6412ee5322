use crate::error::BatchError;

use super::context::ExecutionContext;

/// Result of a read: `Ok(Some(item))`, `Ok(None)` once the source is exhausted.
pub type ItemReaderResult<I> = Result<Option<I>, BatchError>;

/// Result of a process call: `Ok(None)` means the item is filtered out.
pub type ItemProcessorResult<O> = Result<Option<O>, BatchError>;

pub type ItemWriterResult = Result<(), BatchError>;

/// A lazy, ordered source of items.
///
/// Readers take `&self` and keep their position with interior mutability so a
/// step can borrow them while the caller keeps ownership.
pub trait ItemReader<I> {
    /// Reads the next item.
    ///
    /// # Returns
    /// - `Ok(Some(item))` when an item is available
    /// - `Ok(None)` when the source is exhausted (this is not an error)
    /// - `Err(BatchError::ItemReader)` when a record cannot be read or mapped
    fn read(&self) -> ItemReaderResult<I>;

    /// Repositions a fresh reader so that the next [`read`](ItemReader::read)
    /// returns the item following the first `cursor` items.
    ///
    /// Used when a failed step is restarted from its persisted read count. The
    /// default implementation reads and discards `cursor` items; readers that
    /// can skip cheaper should override it.
    fn resume_at(&self, cursor: usize) -> Result<(), BatchError> {
        for _ in 0..cursor {
            if self.read()?.is_none() {
                break;
            }
        }
        Ok(())
    }
}

/// Business transformation applied to every read item.
///
/// A processor keeping state across items saves it in the step context with
/// [`update`](ItemProcessor::update) and gets it back in
/// [`open`](ItemProcessor::open) when a failed step is restarted.
pub trait ItemProcessor<I, O> {
    /// Transforms `item`, or returns `Ok(None)` to drop it from the chunk.
    fn process(&self, item: &I) -> ItemProcessorResult<O>;

    /// Called once before the first item with the step context, which holds
    /// what the last committed chunk saved.
    fn open(&self, _context: &ExecutionContext) -> Result<(), BatchError> {
        Ok(())
    }

    /// Called after every written chunk, right before it is committed.
    fn update(&self, _context: &mut ExecutionContext) -> Result<(), BatchError> {
        Ok(())
    }
}

/// Output of a step, one chunk at a time.
pub trait ItemWriter<O> {
    /// Writes a whole chunk. Called once per chunk.
    fn write(&self, items: &[O]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    /// Called once before the first chunk of a step.
    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    /// Called once when the step ends, whether it succeeded or failed.
    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}

/// Identity processor: every item goes through unchanged.
#[derive(Default, Debug, Clone, Copy)]
pub struct PassThroughProcessor;

impl<T: Clone> ItemProcessor<T, T> for PassThroughProcessor {
    fn process(&self, item: &T) -> ItemProcessorResult<T> {
        Ok(Some(item.clone()))
    }
}
