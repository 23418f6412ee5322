use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemReader from: {0}")]
    ItemReader(String),

    #[error("ItemProcessor from: {0}")]
    ItemProcessor(String),

    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("JobRepository from: {0}")]
    Repository(String),

    /// A step failed; carries the step name and the error that stopped it.
    #[error("Step {name} failed: {source}")]
    Step {
        name: String,
        #[source]
        source: Box<BatchError>,
    },

    /// A job run failed; carries the job identity and the failing step error.
    #[error("Job {name} (run.id={run_id}) failed: {source}")]
    Job {
        name: String,
        run_id: u64,
        #[source]
        source: Box<BatchError>,
    },

    #[error("Job {name} (run.id={run_id}) is already complete")]
    JobAlreadyComplete { name: String, run_id: u64 },
}
