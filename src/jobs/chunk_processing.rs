use log::info;

use crate::{
    core::{
        item::{ItemProcessor, ItemProcessorResult, ItemWriter},
        job::{Job, JobBuilder, JobExecution},
        parameters::{JobParameters, RunIdIncrementer},
        repository::JobRepository,
        step::{StepBuilder, StepContext},
        tasklet::{RepeatStatus, Tasklet},
    },
    item::{list::ListItemReader, logger::LoggerWriter},
    BatchError,
};

use super::JobConfig;

pub const JOB_NAME: &str = "chunkProcessingJob";

/// `"0 Hello"` to `"99 Hello"`.
pub fn hello_items() -> Vec<String> {
    (0..100).map(|i| format!("{} Hello", i)).collect()
}

/// Tasklet paging through a list like a chunk step would.
///
/// The step read count is the position in the list, so a restarted step
/// continues after the last committed page.
pub struct ListChunkTasklet {
    items: Vec<String>,
    chunk_size: usize,
}

impl ListChunkTasklet {
    pub fn new(items: Vec<String>, chunk_size: usize) -> Self {
        Self { items, chunk_size }
    }
}

impl Tasklet for ListChunkTasklet {
    fn execute(&self, context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
        info!("Chunk Size : {}", self.chunk_size);

        let from_index = context.step_execution().read_count;
        if from_index >= self.items.len() {
            return Ok(RepeatStatus::Finished);
        }

        let to_index = (from_index + self.chunk_size).min(self.items.len());
        let page = &self.items[from_index..to_index];
        info!("task item size : {}", page.len());

        context.step_execution_mut().read_count = to_index;
        Ok(RepeatStatus::Continuable)
    }
}

pub struct AppendSuffixProcessor;

impl ItemProcessor<String, String> for AppendSuffixProcessor {
    fn process(&self, item: &String) -> ItemProcessorResult<String> {
        Ok(Some(format!("{}, Spring Batch", item)))
    }
}

/// `chunkProcessingJob`, logging the processed items.
pub fn run_chunk_processing_job(
    repository: &dyn JobRepository,
    parameters: &JobParameters,
) -> Result<JobExecution, BatchError> {
    run_chunk_processing_job_with(repository, parameters, &LoggerWriter::new())
}

/// `chunkProcessingJob` with its chunk step writing to `writer`.
///
/// - `taskBaseStep`: [`ListChunkTasklet`] over [`hello_items`]
/// - `chunkBaseStep`: the same items through [`AppendSuffixProcessor`]
pub fn run_chunk_processing_job_with(
    repository: &dyn JobRepository,
    parameters: &JobParameters,
    writer: &dyn ItemWriter<String>,
) -> Result<JobExecution, BatchError> {
    let config = JobConfig::for_run(JOB_NAME, repository, parameters)?;

    let tasklet = ListChunkTasklet::new(hello_items(), config.chunk_size);
    let reader = ListItemReader::new(hello_items());

    let task_base_step = StepBuilder::new("taskBaseStep").tasklet(&tasklet).build();
    let chunk_base_step = StepBuilder::new("chunkBaseStep")
        .chunk::<String, String>(config.chunk_size)
        .reader(&reader)
        .processor(&AppendSuffixProcessor)
        .writer(writer)
        .build()?;

    let job = JobBuilder::new()
        .name(JOB_NAME)
        .repository(repository)
        .incrementer(&RunIdIncrementer)
        .start(&task_base_step)
        .next(&chunk_base_step)
        .build();

    job.run(parameters)
}
