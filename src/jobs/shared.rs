use std::cell::RefCell;

use log::info;

use crate::{
    core::{
        context::Scope,
        job::{Job, JobBuilder, JobExecution},
        parameters::{JobParameters, RunIdIncrementer, RUN_ID_KEY},
        repository::JobRepository,
        step::{StepBuilder, StepContext},
        tasklet::{RepeatStatus, Tasklet},
    },
    BatchError,
};

pub const STEP_KEY: &str = "stepKey";
pub const JOB_KEY: &str = "jobKey";

/// Writes one value in each scope and logs where it runs.
pub struct SharedWriteTasklet;

impl Tasklet for SharedWriteTasklet {
    fn execute(&self, context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
        context.put(Scope::Step, STEP_KEY, "step execution context");
        context.put(Scope::Job, JOB_KEY, "job execution context");

        info!(
            "jobName : {}, stepName : {}, parameter : {}",
            context.job_name(),
            context.step_name(),
            context
                .parameters()
                .get_string(RUN_ID_KEY)
                .unwrap_or_default()
        );

        Ok(RepeatStatus::Finished)
    }
}

/// Reads both keys back, falling back to `emptyJobKey` / `emptyStepKey`.
///
/// Running after [`SharedWriteTasklet`] in the same job, it sees the job
/// value but not the step value of the other step.
#[derive(Default)]
pub struct SharedReadTasklet {
    observed: RefCell<Option<(String, String)>>,
}

impl SharedReadTasklet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(jobKey, stepKey)` values seen by the last execution.
    pub fn observed(&self) -> Option<(String, String)> {
        self.observed.borrow().clone()
    }
}

impl Tasklet for SharedReadTasklet {
    fn execute(&self, context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
        let job_value = context.get_string(Scope::Job, JOB_KEY, "emptyJobKey");
        let step_value = context.get_string(Scope::Step, STEP_KEY, "emptyStepKey");

        info!("jobKey : {}, stepKey : {}", job_value, step_value);

        self.observed.replace(Some((job_value, step_value)));
        Ok(RepeatStatus::Finished)
    }
}

/// `sharedJob`: `shareStep` writes, `shareStep2` reads.
///
/// Returns the execution together with the values `shareStep2` observed.
pub fn run_shared_job(
    repository: &dyn JobRepository,
    parameters: &JobParameters,
) -> Result<(JobExecution, Option<(String, String)>), BatchError> {
    let reader = SharedReadTasklet::new();

    let share_step = StepBuilder::new("shareStep")
        .tasklet(&SharedWriteTasklet)
        .build();
    let share_step2 = StepBuilder::new("shareStep2").tasklet(&reader).build();

    let job = JobBuilder::new()
        .name("sharedJob")
        .repository(repository)
        .incrementer(&RunIdIncrementer)
        .start(&share_step)
        .next(&share_step2)
        .build();

    let execution = job.run(parameters)?;
    Ok((execution, reader.observed()))
}
