mod common;

use std::cell::Cell;

use common::init_logger;
use rand::distr::{Alphanumeric, SampleString};
use spring_batch_example::{
    core::{
        context::Scope,
        job::{BatchStatus, Job, JobBuilder},
        parameters::JobParameters,
        repository::{FileJobRepository, InMemoryJobRepository, JobRepository},
        step::{StepBuilder, StepContext},
        tasklet::{RepeatStatus, Tasklet},
    },
    jobs::{
        hello::run_hello_job,
        shared::{run_shared_job, JOB_KEY, STEP_KEY},
    },
    BatchError,
};
use tempfile::tempdir;

#[test]
fn step_values_should_stay_in_their_step() {
    init_logger();
    let repository = InMemoryJobRepository::new();

    let (execution, observed) = run_shared_job(&repository, &JobParameters::new()).unwrap();

    let (job_value, step_value) = observed.unwrap();
    assert_eq!(job_value, "job execution context");
    assert_eq!(step_value, "emptyStepKey");

    let stored = repository
        .find_execution("sharedJob", execution.run_id)
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.execution_context.get_string(JOB_KEY, "emptyJobKey"),
        "job execution context"
    );
    assert_eq!(
        stored
            .step_execution("shareStep")
            .unwrap()
            .execution_context
            .get_string(STEP_KEY, "emptyStepKey"),
        "step execution context"
    );
}

#[test]
fn run_ids_should_keep_increasing_across_repository_reopens() {
    init_logger();
    let dir = tempdir().unwrap();
    let file_name = format!("{}.json", Alphanumeric.sample_string(&mut rand::rng(), 16));
    let path = dir.path().join(file_name);

    for expected in 1..=3 {
        let repository = FileJobRepository::open(&path).unwrap();
        let execution = run_hello_job(&repository, &JobParameters::new()).unwrap();
        assert_eq!(execution.run_id, expected);
    }

    let repository = FileJobRepository::open(&path).unwrap();
    let last = repository.last_execution("helloJob").unwrap().unwrap();
    assert_eq!(last.run_id, 3);
    assert_eq!(last.status, BatchStatus::Completed);
}

/// Fails as long as `failures_left` is not zero.
struct FlakyTasklet {
    failures_left: Cell<usize>,
}

impl Tasklet for FlakyTasklet {
    fn execute(&self, _context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(BatchError::ItemReader("source unavailable".to_string()));
        }
        Ok(RepeatStatus::Finished)
    }
}

struct PutJobValue;

impl Tasklet for PutJobValue {
    fn execute(&self, context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
        context.put(Scope::Job, "prepared", true);
        Ok(RepeatStatus::Finished)
    }
}

struct RanTasklet {
    ran: Cell<bool>,
}

impl Tasklet for RanTasklet {
    fn execute(&self, _context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
        self.ran.set(true);
        Ok(RepeatStatus::Finished)
    }
}

#[test]
fn restart_from_file_should_restore_job_context() {
    init_logger();
    let dir = tempdir().unwrap();
    let path = dir.path().join("repository.json");

    {
        let repository = FileJobRepository::open(&path).unwrap();
        let flaky = FlakyTasklet {
            failures_left: Cell::new(1),
        };
        let prepare = StepBuilder::new("prepare").tasklet(&PutJobValue).build();
        let load = StepBuilder::new("load").tasklet(&flaky).build();
        let job = JobBuilder::new()
            .name("restartable")
            .repository(&repository)
            .start(&prepare)
            .next(&load)
            .build();

        assert!(job.run(&JobParameters::new()).is_err());
    }

    let repository = FileJobRepository::open(&path).unwrap();
    let failed = repository.find_execution("restartable", 1).unwrap().unwrap();
    assert_eq!(failed.status, BatchStatus::Failed);
    assert_eq!(
        failed.step_execution("load").unwrap().exit_message.as_deref(),
        Some("ItemReader from: source unavailable")
    );

    let flaky = FlakyTasklet {
        failures_left: Cell::new(0),
    };
    let prepare_again = RanTasklet {
        ran: Cell::new(false),
    };
    let prepare = StepBuilder::new("prepare").tasklet(&prepare_again).build();
    let load = StepBuilder::new("load").tasklet(&flaky).build();
    let job = JobBuilder::new()
        .name("restartable")
        .repository(&repository)
        .start(&prepare)
        .next(&load)
        .build();

    let execution = job.restart(1).unwrap();

    assert_eq!(execution.status, BatchStatus::Completed);
    assert!(!prepare_again.ran.get(), "completed step must not run again");
    assert!(execution.execution_context.get_bool("prepared", false));
}
