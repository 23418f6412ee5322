//! Tutorial jobs.
//!
//! Every `run_*` function is a factory: it builds fresh readers, processors,
//! writers and dedupe state for one run, then runs the job against the given
//! repository. Job parameters are read through [`JobConfig`].

use crate::{
    core::{job::BatchStatus, parameters::JobParameters, repository::JobRepository},
    BatchError,
};

pub mod chunk_processing;

pub mod hello;

pub mod person;

pub mod shared;

pub mod task;

pub mod task_input;

pub const CHUNK_SIZE_KEY: &str = "chunkSize";

pub const ALLOW_DUPLICATE_KEY: &str = "allowDuplicate";

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Settings of a tutorial job run, read from its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobConfig {
    pub chunk_size: usize,
    pub allow_duplicate: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            allow_duplicate: false,
        }
    }
}

impl JobConfig {
    /// Reads `chunkSize` (default 10, at least 1) and `allowDuplicate`
    /// (default `false`). Both may be given as strings.
    ///
    /// # Errors
    /// `BatchError::Configuration` when a value cannot be parsed or the chunk
    /// size is not positive.
    pub fn from_parameters(parameters: &JobParameters) -> Result<Self, BatchError> {
        let chunk_size = match parameters.get_long(CHUNK_SIZE_KEY) {
            None => DEFAULT_CHUNK_SIZE,
            Some(Ok(value)) if value >= 1 => value as usize,
            Some(Ok(value)) => {
                return Err(BatchError::Configuration(format!(
                    "{} must be at least 1, got {}",
                    CHUNK_SIZE_KEY, value
                )));
            }
            Some(Err(raw)) => {
                return Err(BatchError::Configuration(format!(
                    "{} is not an integer: {}",
                    CHUNK_SIZE_KEY, raw
                )));
            }
        };

        let allow_duplicate = match parameters.get_bool(ALLOW_DUPLICATE_KEY) {
            None => false,
            Some(Ok(value)) => value,
            Some(Err(raw)) => {
                return Err(BatchError::Configuration(format!(
                    "{} is not a boolean: {}",
                    ALLOW_DUPLICATE_KEY, raw
                )));
            }
        };

        Ok(Self {
            chunk_size,
            allow_duplicate,
        })
    }

    /// Settings of the run of `job_name` about to start.
    ///
    /// When `run.id` names a run that did not complete, that run is restarted
    /// with the parameters it was first launched with, so its settings are read
    /// from the stored execution rather than from `parameters`.
    pub fn for_run(
        job_name: &str,
        repository: &dyn JobRepository,
        parameters: &JobParameters,
    ) -> Result<Self, BatchError> {
        let restarted = match parameters.run_id() {
            Some(run_id) => repository
                .find_execution(job_name, run_id)?
                .filter(|previous| previous.status != BatchStatus::Completed),
            None => None,
        };

        match restarted {
            Some(previous) => Self::from_parameters(&previous.parameters),
            None => Self::from_parameters(parameters),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            job::{BatchStatus, JobExecution},
            parameters::{JobParametersBuilder, RUN_ID_KEY},
            repository::{InMemoryJobRepository, JobRepository},
        },
        BatchError,
    };

    use super::{JobConfig, ALLOW_DUPLICATE_KEY, CHUNK_SIZE_KEY};

    fn stored_run(repository: &InMemoryJobRepository, status: BatchStatus) {
        let parameters = JobParametersBuilder::new()
            .add_long(RUN_ID_KEY, 1)
            .add_string(CHUNK_SIZE_KEY, "5")
            .add_string(ALLOW_DUPLICATE_KEY, "true")
            .build();
        let mut execution = JobExecution::new("job", 1, parameters);
        execution.status = status;
        repository.save_execution(&execution).unwrap();
    }

    #[test]
    fn restarted_run_should_keep_its_first_settings() {
        let repository = InMemoryJobRepository::new();
        stored_run(&repository, BatchStatus::Failed);
        let restart = JobParametersBuilder::new().add_long(RUN_ID_KEY, 1).build();

        let config = JobConfig::for_run("job", &repository, &restart).unwrap();

        assert_eq!(config.chunk_size, 5);
        assert!(config.allow_duplicate);
    }

    #[test]
    fn new_run_should_use_its_own_parameters() {
        let repository = InMemoryJobRepository::new();
        stored_run(&repository, BatchStatus::Completed);
        let next = JobParametersBuilder::new().add_long(RUN_ID_KEY, 2).build();

        let config = JobConfig::for_run("job", &repository, &next).unwrap();

        assert_eq!(config, JobConfig::default());
    }

    #[test]
    fn missing_parameters_should_use_defaults() {
        let config = JobConfig::from_parameters(&Default::default()).unwrap();
        assert_eq!(config, JobConfig::default());
        assert_eq!(config.chunk_size, 10);
    }

    #[test]
    fn string_parameters_should_be_parsed() {
        let parameters = JobParametersBuilder::new()
            .add_string(CHUNK_SIZE_KEY, "20")
            .add_string(ALLOW_DUPLICATE_KEY, "true")
            .build();

        let config = JobConfig::from_parameters(&parameters).unwrap();

        assert_eq!(config.chunk_size, 20);
        assert!(config.allow_duplicate);
    }

    #[test]
    fn invalid_chunk_size_should_be_rejected() {
        for raw in ["0", "-3", "ten"] {
            let parameters = JobParametersBuilder::new()
                .add_string(CHUNK_SIZE_KEY, raw)
                .build();

            assert!(matches!(
                JobConfig::from_parameters(&parameters),
                Err(BatchError::Configuration(_))
            ));
        }
    }
}
