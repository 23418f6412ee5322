use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    chunk::ChunkEngine,
    context::{ContextValue, ExecutionContext, Scope},
    item::{ItemProcessor, ItemReader, ItemWriter},
    parameters::JobParameters,
    repository::JobRepository,
    tasklet::{repeat_tasklet, Tasklet, TaskletStep},
};

/// Step context key holding the number of source items consumed by the last
/// committed chunk.
pub const READ_COUNT_KEY: &str = "read.count";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// The step has not run yet.
    Starting,
    /// The step is running.
    Running,
    /// The step has finished reading and writing every item.
    Completed,
    /// The step stopped on an error.
    Failed,
}

/// Execution of one step within one job run.
///
/// Holds the step-scoped [`ExecutionContext`] and the read cursor. It is saved
/// to the [`JobRepository`] after every committed chunk so a failed run can
/// restart from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecution {
    /// Unique identifier of this attempt
    pub id: Uuid,
    pub name: String,
    pub status: StepStatus,
    /// Number of items consumed from the reader, filtered ones included
    pub read_count: usize,
    /// Number of items dropped by the processor
    pub filter_count: usize,
    /// Number of items handed to the writer
    pub write_count: usize,
    /// Number of chunks written
    pub commit_count: usize,
    pub execution_context: ExecutionContext,
    /// Error message of a failed step
    pub exit_message: Option<String>,
    #[serde(skip)]
    pub start_time: Option<Instant>,
    #[serde(skip)]
    pub end_time: Option<Instant>,
    pub duration: Duration,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: StepStatus::Starting,
            read_count: 0,
            filter_count: 0,
            write_count: 0,
            commit_count: 0,
            execution_context: ExecutionContext::new(),
            exit_message: None,
            start_time: None,
            end_time: None,
            duration: Duration::default(),
        }
    }

    /// New attempt of a previously failed step: keeps the counters and the
    /// step context, which holds the cursor of the last committed chunk.
    pub fn restart_from(previous: &StepExecution) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: StepStatus::Starting,
            exit_message: None,
            start_time: None,
            end_time: None,
            duration: Duration::default(),
            ..previous.clone()
        }
    }
}

/// Everything a running step can see: its own execution, the job-scoped
/// context, the job parameters and the repository used to commit progress.
pub struct StepContext<'a> {
    job_name: &'a str,
    run_id: u64,
    parameters: &'a JobParameters,
    job_context: &'a mut ExecutionContext,
    step_execution: &'a mut StepExecution,
    repository: &'a dyn JobRepository,
}

impl<'a> StepContext<'a> {
    pub fn new(
        job_name: &'a str,
        run_id: u64,
        parameters: &'a JobParameters,
        job_context: &'a mut ExecutionContext,
        step_execution: &'a mut StepExecution,
        repository: &'a dyn JobRepository,
    ) -> Self {
        Self {
            job_name,
            run_id,
            parameters,
            job_context,
            step_execution,
            repository,
        }
    }

    pub fn job_name(&self) -> &str {
        self.job_name
    }

    pub fn step_name(&self) -> &str {
        &self.step_execution.name
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn parameters(&self) -> &JobParameters {
        self.parameters
    }

    pub fn step_execution(&self) -> &StepExecution {
        self.step_execution
    }

    pub fn step_execution_mut(&mut self) -> &mut StepExecution {
        self.step_execution
    }

    fn context(&self, scope: Scope) -> &ExecutionContext {
        match scope {
            Scope::Job => self.job_context,
            Scope::Step => &self.step_execution.execution_context,
        }
    }

    pub fn put<V: Into<ContextValue>>(&mut self, scope: Scope, key: &str, value: V) {
        match scope {
            Scope::Job => self.job_context.put(key, value),
            Scope::Step => self.step_execution.execution_context.put(key, value),
        }
    }

    pub fn get(&self, scope: Scope, key: &str) -> Option<&ContextValue> {
        self.context(scope).get(key)
    }

    pub fn get_string(&self, scope: Scope, key: &str, default: &str) -> String {
        self.context(scope).get_string(key, default)
    }

    pub fn get_long(&self, scope: Scope, key: &str, default: i64) -> i64 {
        self.context(scope).get_long(key, default)
    }

    /// Records the current read count as the step cursor and saves the step
    /// execution together with the job context.
    pub fn commit(&mut self) -> Result<(), BatchError> {
        let cursor = self.step_execution.read_count;
        self.step_execution
            .execution_context
            .put(READ_COUNT_KEY, cursor);

        self.repository.update_step_execution(
            self.job_name,
            self.run_id,
            self.step_execution,
            self.job_context,
        )
    }
}

/// A phase of a job. Steps run one after the other; the job owns their
/// status and timing, a step only does the work.
pub trait Step {
    fn get_name(&self) -> &str;

    /// Executes the step.
    ///
    /// # Returns
    /// - `Ok(())`: the step completed
    /// - `Err(BatchError)`: the step failed, the job stops
    fn execute(&self, context: &mut StepContext) -> Result<(), BatchError>;
}

/// Step reading, processing and writing items chunk by chunk.
///
/// It runs its [`ChunkEngine`] through the same repeat loop as a
/// [`TaskletStep`], so cursor restore and commit behave the same for both.
pub struct ChunkOrientedStep<'a, I, O> {
    name: String,
    engine: ChunkEngine<'a, I, O>,
}

impl<I, O> ChunkOrientedStep<'_, I, O> {
    pub fn chunk_size(&self) -> usize {
        self.engine.chunk_size()
    }
}

impl<I, O> Step for ChunkOrientedStep<'_, I, O> {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn execute(&self, context: &mut StepContext) -> Result<(), BatchError> {
        repeat_tasklet(&self.engine, context)
    }
}

/// Entry point for building steps.
///
/// # Examples
///
/// ```
/// use spring_batch_example::core::{
///     item::PassThroughProcessor,
///     step::StepBuilder,
/// };
/// use spring_batch_example::item::list::ListItemReader;
/// # use spring_batch_example::core::item::{ItemWriter, ItemWriterResult};
/// # struct NoopWriter;
/// # impl ItemWriter<String> for NoopWriter {
/// #     fn write(&self, _items: &[String]) -> ItemWriterResult { Ok(()) }
/// # }
///
/// let reader = ListItemReader::new(vec!["a".to_string(), "b".to_string()]);
/// let writer = NoopWriter;
///
/// let step = StepBuilder::new("chunkBaseStep")
///     .chunk::<String, String>(10)
///     .reader(&reader)
///     .processor(&PassThroughProcessor)
///     .writer(&writer)
///     .build()
///     .unwrap();
///
/// assert_eq!(step.chunk_size(), 10);
/// ```
pub struct StepBuilder {
    name: String,
}

impl StepBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Steps built without a name get a random one.
    pub fn unnamed() -> Self {
        Self::new(&build_name())
    }

    pub fn tasklet<'a>(self, tasklet: &'a dyn Tasklet) -> TaskletStepBuilder<'a> {
        TaskletStepBuilder {
            name: self.name,
            tasklet,
        }
    }

    pub fn chunk<'a, I, O>(self, chunk_size: usize) -> ChunkOrientedStepBuilder<'a, I, O> {
        ChunkOrientedStepBuilder {
            name: self.name,
            reader: None,
            processor: None,
            writer: None,
            chunk_size,
        }
    }
}

pub struct TaskletStepBuilder<'a> {
    name: String,
    tasklet: &'a dyn Tasklet,
}

impl<'a> TaskletStepBuilder<'a> {
    pub fn build(self) -> TaskletStep<'a> {
        TaskletStep::new(&self.name, self.tasklet)
    }
}

pub struct ChunkOrientedStepBuilder<'a, I, O> {
    name: String,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ItemWriter<O>>,
    chunk_size: usize,
}

impl<'a, I, O> ChunkOrientedStepBuilder<'a, I, O> {
    pub fn reader(mut self, reader: &'a dyn ItemReader<I>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Sets the processor. Use [`PassThroughProcessor`](super::item::PassThroughProcessor)
    /// when items are written as read.
    pub fn processor(mut self, processor: &'a dyn ItemProcessor<I, O>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a dyn ItemWriter<O>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Builds the step.
    ///
    /// # Errors
    /// `BatchError::Configuration` when the chunk size is 0 or the reader,
    /// processor or writer is missing.
    pub fn build(self) -> Result<ChunkOrientedStep<'a, I, O>, BatchError> {
        let missing = |component: &str| {
            BatchError::Configuration(format!(
                "{} is required for building step {}",
                component, self.name
            ))
        };

        let reader = self.reader.ok_or_else(|| missing("reader"))?;
        let processor = self.processor.ok_or_else(|| missing("processor"))?;
        let writer = self.writer.ok_or_else(|| missing("writer"))?;
        let engine = ChunkEngine::new(reader, processor, writer, self.chunk_size)?;

        Ok(ChunkOrientedStep {
            name: self.name,
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            context::{ExecutionContext, Scope},
            item::{ItemWriter, ItemWriterResult, PassThroughProcessor},
            job::JobExecution,
            parameters::JobParameters,
            repository::{InMemoryJobRepository, JobRepository},
        },
        item::list::ListItemReader,
        BatchError,
    };

    use super::{StepBuilder, StepContext, StepExecution, READ_COUNT_KEY};

    struct NoopWriter;

    impl ItemWriter<u32> for NoopWriter {
        fn write(&self, _items: &[u32]) -> ItemWriterResult {
            Ok(())
        }
    }

    #[test]
    fn build_should_reject_zero_chunk_size() {
        let reader = ListItemReader::new(vec![1_u32]);
        let writer = NoopWriter;

        let result = StepBuilder::new("zero")
            .chunk::<u32, u32>(0)
            .reader(&reader)
            .processor(&PassThroughProcessor)
            .writer(&writer)
            .build();

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }

    #[test]
    fn build_should_require_a_writer() {
        let reader = ListItemReader::new(vec![1_u32]);

        let result = StepBuilder::new("no-writer")
            .chunk::<u32, u32>(2)
            .reader(&reader)
            .processor(&PassThroughProcessor)
            .build();

        match result {
            Err(BatchError::Configuration(message)) => assert!(message.contains("writer")),
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn commit_should_store_cursor_and_save_step() {
        let repository = InMemoryJobRepository::new();
        let parameters = JobParameters::new();
        repository
            .save_execution(&JobExecution::new("job", 1, parameters.clone()))
            .unwrap();
        let mut job_context = ExecutionContext::new();
        let mut step_execution = StepExecution::new("step");
        step_execution.read_count = 7;

        let mut context = StepContext::new(
            "job",
            1,
            &parameters,
            &mut job_context,
            &mut step_execution,
            &repository,
        );
        context.put(Scope::Job, "jobKey", "value");
        context.commit().unwrap();

        assert_eq!(context.get_long(Scope::Step, READ_COUNT_KEY, 0), 7);

        let saved = repository.find_execution("job", 1).unwrap().unwrap();
        assert_eq!(saved.step_executions[0].read_count, 7);
        assert_eq!(
            saved.execution_context.get_string("jobKey", "none"),
            "value"
        );
    }

    #[test]
    fn restart_should_keep_context_and_counters() {
        let mut previous = StepExecution::new("step");
        previous.read_count = 30;
        previous.write_count = 30;
        previous.exit_message = Some("boom".to_string());
        previous.execution_context.put(READ_COUNT_KEY, 30_usize);

        let restarted = StepExecution::restart_from(&previous);

        assert_ne!(restarted.id, previous.id);
        assert_eq!(restarted.read_count, 30);
        assert_eq!(restarted.exit_message, None);
        assert_eq!(restarted.execution_context.get_long(READ_COUNT_KEY, 0), 30);
    }
}
