use log::{debug, info, warn};

use crate::error::BatchError;

use super::{
    item::{ItemProcessor, ItemReader, ItemWriter},
    step::StepContext,
    tasklet::{RepeatStatus, Tasklet},
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ChunkStatus {
    /// A full chunk was written; more items may follow.
    Full,
    /// The reader is exhausted; the last (possibly partial) chunk was written.
    Finished,
}

/// Items collected for one write, at most `chunk_size` of them.
pub struct Chunk<O> {
    items: Vec<O>,
    chunk_size: usize,
}

impl<O> Chunk<O> {
    pub fn new(chunk_size: usize) -> Chunk<O> {
        Chunk {
            items: Vec::with_capacity(chunk_size),
            chunk_size,
        }
    }

    pub fn add_item(&mut self, item: O) {
        self.items.push(item);
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.chunk_size
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get_items(&self) -> &[O] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Reads, processes and writes items in chunks of a fixed size.
///
/// Filtered items (processor returned `None`) do not count toward the chunk
/// size, but they do advance the read count, which is the cursor stored after
/// every write. Errors from the reader, the processor or the writer are not
/// retried: they end the step.
pub struct ChunkEngine<'a, I, O> {
    reader: &'a dyn ItemReader<I>,
    processor: &'a dyn ItemProcessor<I, O>,
    writer: &'a dyn ItemWriter<O>,
    chunk_size: usize,
}

impl<'a, I, O> ChunkEngine<'a, I, O> {
    pub fn new(
        reader: &'a dyn ItemReader<I>,
        processor: &'a dyn ItemProcessor<I, O>,
        writer: &'a dyn ItemWriter<O>,
        chunk_size: usize,
    ) -> Result<Self, BatchError> {
        if chunk_size == 0 {
            return Err(BatchError::Configuration(
                "chunk size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            reader,
            processor,
            writer,
            chunk_size,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Reads items until the chunk is full or the reader is exhausted, then
    /// writes the chunk if it holds anything.
    ///
    /// Counters of the step execution are updated as items flow; committing
    /// the cursor is left to the caller.
    pub fn process_chunk(&self, context: &mut StepContext) -> Result<ChunkStatus, BatchError> {
        let mut chunk = Chunk::new(self.chunk_size);

        let status = self.fill_chunk(&mut chunk, context)?;

        if !chunk.is_empty() {
            self.write_chunk(&chunk, context)?;
        }

        Ok(status)
    }

    fn fill_chunk(
        &self,
        chunk: &mut Chunk<O>,
        context: &mut StepContext,
    ) -> Result<ChunkStatus, BatchError> {
        debug!("Start reading chunk");

        loop {
            let item = match self.reader.read() {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!("End reading chunk: FINISHED");
                    return Ok(ChunkStatus::Finished);
                }
                Err(error) => {
                    warn!(
                        "Error reading item after {} items: {}",
                        context.step_execution().read_count,
                        error
                    );
                    return Err(error);
                }
            };

            context.step_execution_mut().read_count += 1;

            match self.processor.process(&item) {
                Ok(Some(processed)) => chunk.add_item(processed),
                Ok(None) => context.step_execution_mut().filter_count += 1,
                Err(error) => {
                    warn!("Error processing item: {}", error);
                    return Err(error);
                }
            }

            if chunk.is_full() {
                debug!("End reading chunk: FULL");
                return Ok(ChunkStatus::Full);
            }
        }
    }

    fn write_chunk(&self, chunk: &Chunk<O>, context: &mut StepContext) -> Result<(), BatchError> {
        debug!("Writing chunk of {} items", chunk.len());

        if let Err(error) = self
            .writer
            .write(chunk.get_items())
            .and_then(|()| self.writer.flush())
        {
            warn!("Error writing items: {}", error);
            return Err(error);
        }

        let step_execution = context.step_execution_mut();
        step_execution.write_count += chunk.len();
        step_execution.commit_count += 1;

        Ok(())
    }
}

impl<I, O> Tasklet for ChunkEngine<'_, I, O> {
    fn open(&self, context: &mut StepContext) -> Result<(), BatchError> {
        let cursor = context.step_execution().read_count;
        if cursor > 0 {
            info!(
                "Resuming step {} after {} items already read",
                context.step_name(),
                cursor
            );
            self.reader.resume_at(cursor)?;
        }

        self.processor
            .open(&context.step_execution().execution_context)?;
        self.writer.open()
    }

    fn execute(&self, context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
        let status = self.process_chunk(context)?;
        self.processor
            .update(&mut context.step_execution_mut().execution_context)?;

        match status {
            ChunkStatus::Full => Ok(RepeatStatus::Continuable),
            ChunkStatus::Finished => Ok(RepeatStatus::Finished),
        }
    }

    fn close(&self, _context: &mut StepContext) -> Result<(), BatchError> {
        self.writer.close()
    }
}
