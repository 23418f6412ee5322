#![allow(dead_code)]

mod mocks;

pub use mocks::*;

use std::cell::{Cell, RefCell};

use spring_batch_example::{
    core::item::{ItemWriter, ItemWriterResult},
    BatchError,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Writer keeping every chunk it receives.
///
/// When `fail_at` is set, the chunk with that index (from 0) is rejected.
/// Failing can be switched off to simulate a fixed problem on restart.
pub struct RecordingWriter<T> {
    pub chunks: RefCell<Vec<Vec<T>>>,
    pub flushes: Cell<usize>,
    pub opened: Cell<bool>,
    pub closed: Cell<bool>,
    fail_at: Cell<Option<usize>>,
    calls: Cell<usize>,
}

impl<T> Default for RecordingWriter<T> {
    fn default() -> Self {
        Self {
            chunks: RefCell::new(Vec::new()),
            flushes: Cell::new(0),
            opened: Cell::new(false),
            closed: Cell::new(false),
            fail_at: Cell::new(None),
            calls: Cell::new(0),
        }
    }
}

impl<T: Clone> RecordingWriter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(chunk_index: usize) -> Self {
        let writer = Self::default();
        writer.fail_at.set(Some(chunk_index));
        writer
    }

    pub fn stop_failing(&self) {
        self.fail_at.set(None);
    }

    pub fn items(&self) -> Vec<T> {
        self.chunks.borrow().iter().flatten().cloned().collect()
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunks.borrow().iter().map(Vec::len).collect()
    }
}

impl<T: Clone> ItemWriter<T> for RecordingWriter<T> {
    fn write(&self, items: &[T]) -> ItemWriterResult {
        let call = self.calls.get();
        self.calls.set(call + 1);

        if self.fail_at.get() == Some(call) {
            return Err(BatchError::ItemWriter(format!("chunk #{} rejected", call)));
        }

        self.chunks.borrow_mut().push(items.to_vec());
        Ok(())
    }

    fn flush(&self) -> ItemWriterResult {
        self.flushes.set(self.flushes.get() + 1);
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        self.opened.set(true);
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        self.closed.set(true);
        Ok(())
    }
}
