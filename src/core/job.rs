use std::time::{Duration, Instant};

use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    context::ExecutionContext,
    parameters::{JobParameters, JobParametersBuilder, JobParametersIncrementer, RUN_ID_KEY},
    repository::{InMemoryJobRepository, JobRepository},
    step::{Step, StepContext, StepExecution, StepStatus},
};

/// Type alias for job execution results.
///
/// A `JobResult` is a `Result` that contains either:
/// - A successful `JobExecution` with execution details
/// - A `BatchError` indicating what went wrong
type JobResult<T> = Result<T, BatchError>;

/// Represents a job that can be executed.
///
/// A job is an ordered list of steps. Steps run one after the other and the
/// first failing step fails the job; the remaining steps do not run.
pub trait Job {
    /// Runs the job with the given parameters.
    ///
    /// # Returns
    /// - `Ok(JobExecution)` when every step completed
    /// - `Err(BatchError::Job)` when a step failed; the failed execution is
    ///   kept in the job repository
    /// - `Err(BatchError::JobAlreadyComplete)` when `run.id` names a completed run
    fn run(&self, parameters: &JobParameters) -> JobResult<JobExecution>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    /// Status of a batch job prior to its execution.
    Starting,
    /// Status of a batch job that is running.
    Started,
    /// The batch job has successfully completed its execution.
    Completed,
    /// Status of a batch job that has failed during its execution.
    Failed,
}

/// One run of a job, identified by its `run.id`.
///
/// Owns the job-scoped [`ExecutionContext`] and the executions of the steps
/// that have run so far, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    /// Unique identifier of this attempt; a restart gets a new one
    pub id: Uuid,
    pub run_id: u64,
    pub job_name: String,
    pub parameters: JobParameters,
    pub status: BatchStatus,
    pub execution_context: ExecutionContext,
    pub step_executions: Vec<StepExecution>,
    #[serde(skip)]
    pub start_time: Option<Instant>,
    #[serde(skip)]
    pub end_time: Option<Instant>,
    pub duration: Duration,
}

impl JobExecution {
    pub fn new(job_name: &str, run_id: u64, parameters: JobParameters) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            job_name: job_name.to_string(),
            parameters,
            status: BatchStatus::Starting,
            execution_context: ExecutionContext::new(),
            step_executions: Vec::new(),
            start_time: None,
            end_time: None,
            duration: Duration::default(),
        }
    }

    pub fn step_execution(&self, step_name: &str) -> Option<&StepExecution> {
        self.step_executions
            .iter()
            .find(|step_execution| step_execution.name == step_name)
    }

    /// Inserts or replaces the execution of the step with the same name.
    pub fn upsert_step_execution(&mut self, step_execution: StepExecution) {
        match self
            .step_executions
            .iter_mut()
            .find(|existing| existing.name == step_execution.name)
        {
            Some(existing) => *existing = step_execution,
            None => self.step_executions.push(step_execution),
        }
    }
}

/// A configured job: a name, a repository and the steps in execution order.
pub struct JobInstance<'a> {
    name: String,
    steps: Vec<&'a dyn Step>,
    repository: Option<&'a dyn JobRepository>,
    incrementer: Option<&'a dyn JobParametersIncrementer>,
    default_repository: InMemoryJobRepository,
}

impl JobInstance<'_> {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    fn repository(&self) -> &dyn JobRepository {
        match self.repository {
            Some(repository) => repository,
            None => &self.default_repository,
        }
    }

    /// Restarts the failed run `run_id` with its original parameters.
    pub fn restart(&self, run_id: u64) -> JobResult<JobExecution> {
        let parameters = match self.repository().find_execution(&self.name, run_id)? {
            Some(previous) => previous.parameters,
            None => JobParametersBuilder::new()
                .add_long(RUN_ID_KEY, run_id as i64)
                .build(),
        };
        self.run(&parameters)
    }

    /// Determines the parameters of this run, `run.id` included.
    ///
    /// An explicit `run.id` wins. Otherwise the incrementer derives it from
    /// the last run, and without incrementer the last run id plus one is used.
    fn resolve_parameters(
        &self,
        parameters: &JobParameters,
        previous: Option<&JobExecution>,
    ) -> JobParameters {
        if parameters.run_id().is_some() {
            return parameters.clone();
        }

        let mut builder = match self.incrementer {
            Some(incrementer) => {
                JobParametersBuilder::from(&incrementer.next(previous.map(|p| &p.parameters)))
            }
            None => {
                let run_id = previous.map_or(0, |p| p.run_id) + 1;
                JobParametersBuilder::new().add_long(RUN_ID_KEY, run_id as i64)
            }
        };

        for (key, value) in parameters.iter().filter(|(key, _)| *key != RUN_ID_KEY) {
            builder = builder.add_parameter(key, value.clone());
        }

        let resolved = builder.build();
        if resolved.run_id().is_some() {
            return resolved;
        }

        let run_id = previous.map_or(0, |p| p.run_id) + 1;
        JobParametersBuilder::from(&resolved)
            .add_long(RUN_ID_KEY, run_id as i64)
            .build()
    }

    /// Fresh execution, or the failed execution with the same run id to restart.
    fn prepare_execution(&self, parameters: JobParameters) -> JobResult<JobExecution> {
        let run_id = parameters.run_id().unwrap_or(1);

        match self.repository().find_execution(&self.name, run_id)? {
            Some(previous) if previous.status == BatchStatus::Completed => {
                Err(BatchError::JobAlreadyComplete {
                    name: self.name.clone(),
                    run_id,
                })
            }
            Some(previous) => {
                info!("Restarting job: {}, run.id: {}", self.name, run_id);
                Ok(JobExecution {
                    id: Uuid::new_v4(),
                    status: BatchStatus::Starting,
                    ..previous
                })
            }
            None => Ok(JobExecution::new(&self.name, run_id, parameters)),
        }
    }

    fn run_steps(&self, execution: &mut JobExecution) -> Result<(), BatchError> {
        let repository = self.repository();

        for step in &self.steps {
            let name = step.get_name();

            let mut step_execution = match execution.step_execution(name) {
                Some(previous) if previous.status == StepStatus::Completed => {
                    info!("Step already completed, skipping: {}", name);
                    continue;
                }
                Some(previous) => StepExecution::restart_from(previous),
                None => StepExecution::new(name),
            };

            info!("Start of step: {}, id: {}", name, step_execution.id);
            let start_time = Instant::now();
            step_execution.status = StepStatus::Running;
            step_execution.start_time = Some(start_time);

            let result = {
                let mut context = StepContext::new(
                    &self.name,
                    execution.run_id,
                    &execution.parameters,
                    &mut execution.execution_context,
                    &mut step_execution,
                    repository,
                );
                step.execute(&mut context)
            };

            step_execution.end_time = Some(Instant::now());
            step_execution.duration = start_time.elapsed();
            step_execution.status = match &result {
                Ok(()) => StepStatus::Completed,
                Err(error) => {
                    step_execution.exit_message = Some(error.to_string());
                    StepStatus::Failed
                }
            };

            info!(
                "End of step: {}, status: {:?}, read: {}, filtered: {}, written: {}, commits: {}",
                name,
                step_execution.status,
                step_execution.read_count,
                step_execution.filter_count,
                step_execution.write_count,
                step_execution.commit_count
            );

            execution.upsert_step_execution(step_execution);
            repository.save_execution(execution)?;

            if let Err(error) = result {
                error!("Step {} failed: {}", name, error);
                return Err(BatchError::Step {
                    name: name.to_string(),
                    source: Box::new(error),
                });
            }
        }

        Ok(())
    }
}

impl Job for JobInstance<'_> {
    fn run(&self, parameters: &JobParameters) -> JobResult<JobExecution> {
        let repository = self.repository();

        let previous = repository.last_execution(&self.name)?;
        let parameters = self.resolve_parameters(parameters, previous.as_ref());
        let mut execution = self.prepare_execution(parameters)?;
        let run_id = execution.run_id;

        let start_time = Instant::now();
        execution.status = BatchStatus::Started;
        execution.start_time = Some(start_time);
        repository.save_execution(&execution)?;

        info!("Start of job: {}, run.id: {}", self.name, run_id);

        let result = self.run_steps(&mut execution);

        execution.end_time = Some(Instant::now());
        execution.duration = start_time.elapsed();
        execution.status = match &result {
            Ok(()) => BatchStatus::Completed,
            Err(_) => BatchStatus::Failed,
        };
        repository.save_execution(&execution)?;

        info!(
            "End of job: {}, run.id: {}, status: {:?}",
            self.name, run_id, execution.status
        );

        match result {
            Ok(()) => Ok(execution),
            Err(error) => Err(BatchError::Job {
                name: self.name.clone(),
                run_id,
                source: Box::new(error),
            }),
        }
    }
}

/// Builder for creating a job instance.
///
/// # Example
///
/// ```
/// use spring_batch_example::core::{
///     job::{Job, JobBuilder},
///     parameters::{JobParameters, RunIdIncrementer},
///     step::{StepBuilder, StepContext},
///     tasklet::{RepeatStatus, Tasklet},
/// };
/// use spring_batch_example::BatchError;
///
/// struct Hello;
///
/// impl Tasklet for Hello {
///     fn execute(&self, _context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
///         Ok(RepeatStatus::Finished)
///     }
/// }
///
/// let step = StepBuilder::new("helloStep").tasklet(&Hello).build();
/// let job = JobBuilder::new()
///     .name("helloJob")
///     .incrementer(&RunIdIncrementer)
///     .start(&step)
///     .build();
///
/// let first = job.run(&JobParameters::new()).unwrap();
/// let second = job.run(&JobParameters::new()).unwrap();
/// assert_eq!(first.run_id, 1);
/// assert_eq!(second.run_id, 2);
/// ```
#[derive(Default)]
pub struct JobBuilder<'a> {
    name: Option<String>,
    steps: Vec<&'a dyn Step>,
    repository: Option<&'a dyn JobRepository>,
    incrementer: Option<&'a dyn JobParametersIncrementer>,
}

impl<'a> JobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            steps: Vec::new(),
            repository: None,
            incrementer: None,
        }
    }

    pub fn name(mut self, name: &str) -> JobBuilder<'a> {
        self.name = Some(name.to_string());
        self
    }

    /// Repository keeping executions; an in-memory one is used when unset.
    pub fn repository(mut self, repository: &'a dyn JobRepository) -> JobBuilder<'a> {
        self.repository = Some(repository);
        self
    }

    pub fn incrementer(mut self, incrementer: &'a dyn JobParametersIncrementer) -> JobBuilder<'a> {
        self.incrementer = Some(incrementer);
        self
    }

    /// Sets the first step of the job.
    pub fn start(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Adds a step to the job; steps run in the order they are added.
    pub fn next(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// If no name has been provided, a random name is generated.
    pub fn build(self) -> JobInstance<'a> {
        JobInstance {
            name: self.name.unwrap_or_else(build_name),
            steps: self.steps,
            repository: self.repository,
            incrementer: self.incrementer,
            default_repository: InMemoryJobRepository::new(),
        }
    }
}
