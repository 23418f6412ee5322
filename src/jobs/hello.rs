use log::info;

use crate::{
    core::{
        job::{Job, JobBuilder, JobExecution},
        parameters::{JobParameters, RunIdIncrementer},
        repository::JobRepository,
        step::{StepBuilder, StepContext},
        tasklet::{RepeatStatus, Tasklet},
    },
    BatchError,
};

pub struct HelloTasklet;

impl Tasklet for HelloTasklet {
    fn execute(&self, _context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
        info!("hello spring batch");
        Ok(RepeatStatus::Finished)
    }
}

/// `helloJob`: a single step logging a greeting.
pub fn run_hello_job(
    repository: &dyn JobRepository,
    parameters: &JobParameters,
) -> Result<JobExecution, BatchError> {
    let step = StepBuilder::new("helloStep").tasklet(&HelloTasklet).build();

    let job = JobBuilder::new()
        .name("helloJob")
        .repository(repository)
        .incrementer(&RunIdIncrementer)
        .start(&step)
        .build();

    job.run(parameters)
}
