use log::debug;

use crate::BatchError;

use super::{
    context::Scope,
    step::{Step, StepContext, READ_COUNT_KEY},
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RepeatStatus {
    /// The tasklet has more work and must be called again.
    Continuable,
    /// The tasklet has finished executing.
    Finished,
}

/// A unit of work called repeatedly until it returns [`RepeatStatus::Finished`].
///
/// After every call the step commits: the current `read_count` of the step
/// execution is stored as the cursor and the step is saved. A tasklet that
/// pages through data by itself should use `read_count` as its position; on
/// restart the step restores it before [`open`](Tasklet::open).
pub trait Tasklet {
    /// Called once before the first `execute`.
    fn open(&self, _context: &mut StepContext) -> Result<(), BatchError> {
        Ok(())
    }

    fn execute(&self, context: &mut StepContext) -> Result<RepeatStatus, BatchError>;

    /// Called once at the end of the step, after a success or a failure.
    fn close(&self, _context: &mut StepContext) -> Result<(), BatchError> {
        Ok(())
    }
}

/// Runs `tasklet` until it is finished, committing after each call.
///
/// `close` is always called once `open` has been attempted; the first error
/// wins.
pub(crate) fn repeat_tasklet(
    tasklet: &dyn Tasklet,
    context: &mut StepContext,
) -> Result<(), BatchError> {
    let cursor = context.get_long(Scope::Step, READ_COUNT_KEY, 0);
    context.step_execution_mut().read_count = usize::try_from(cursor).unwrap_or_default();

    let result = tasklet.open(context).and_then(|()| repeat(tasklet, context));
    let closed = tasklet.close(context);

    result.and(closed)
}

fn repeat(tasklet: &dyn Tasklet, context: &mut StepContext) -> Result<(), BatchError> {
    loop {
        let status = tasklet.execute(context)?;
        context.commit()?;

        debug!(
            "Tasklet of step {} returned {:?}, read count {}",
            context.step_name(),
            status,
            context.step_execution().read_count
        );

        if status == RepeatStatus::Finished {
            return Ok(());
        }
    }
}

/// Step made of a single tasklet.
pub struct TaskletStep<'a> {
    name: String,
    tasklet: &'a dyn Tasklet,
}

impl<'a> TaskletStep<'a> {
    pub fn new(name: &str, tasklet: &'a dyn Tasklet) -> Self {
        Self {
            name: name.to_string(),
            tasklet,
        }
    }
}

impl Step for TaskletStep<'_> {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn execute(&self, context: &mut StepContext) -> Result<(), BatchError> {
        repeat_tasklet(self.tasklet, context)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::{
        core::{
            context::{ExecutionContext, Scope},
            job::JobExecution,
            parameters::JobParameters,
            repository::{InMemoryJobRepository, JobRepository},
            step::{Step, StepBuilder, StepContext, StepExecution, READ_COUNT_KEY},
        },
        BatchError,
    };

    use super::{RepeatStatus, Tasklet};

    /// Pages through `total` items, `page` at a time, using the read count.
    struct PagingTasklet {
        total: usize,
        page: usize,
        calls: Cell<usize>,
        closed: Cell<bool>,
    }

    impl Tasklet for PagingTasklet {
        fn execute(&self, context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
            self.calls.set(self.calls.get() + 1);
            let from = context.step_execution().read_count;
            if from >= self.total {
                return Ok(RepeatStatus::Finished);
            }
            context.step_execution_mut().read_count = (from + self.page).min(self.total);
            Ok(RepeatStatus::Continuable)
        }

        fn close(&self, _context: &mut StepContext) -> Result<(), BatchError> {
            self.closed.set(true);
            Ok(())
        }
    }

    struct FailingTasklet;

    impl Tasklet for FailingTasklet {
        fn execute(&self, _context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
            Err(BatchError::ItemReader("broken".to_string()))
        }
    }

    fn run_step(step: &dyn Step, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        let repository = InMemoryJobRepository::new();
        let parameters = JobParameters::new();
        repository.save_execution(&JobExecution::new("job", 1, parameters.clone()))?;
        let mut job_context = ExecutionContext::new();
        let mut context = StepContext::new(
            "job",
            1,
            &parameters,
            &mut job_context,
            step_execution,
            &repository,
        );
        step.execute(&mut context)
    }

    #[test]
    fn tasklet_should_repeat_until_finished() {
        let tasklet = PagingTasklet {
            total: 25,
            page: 10,
            calls: Cell::new(0),
            closed: Cell::new(false),
        };
        let step = StepBuilder::new("paging").tasklet(&tasklet).build();
        let mut step_execution = StepExecution::new("paging");

        run_step(&step, &mut step_execution).unwrap();

        assert_eq!(tasklet.calls.get(), 4);
        assert!(tasklet.closed.get());
        assert_eq!(step_execution.read_count, 25);
        assert_eq!(
            step_execution.execution_context.get_long(READ_COUNT_KEY, 0),
            25
        );
    }

    #[test]
    fn tasklet_should_resume_from_stored_cursor() {
        let tasklet = PagingTasklet {
            total: 25,
            page: 10,
            calls: Cell::new(0),
            closed: Cell::new(false),
        };
        let step = StepBuilder::new("paging").tasklet(&tasklet).build();
        let mut step_execution = StepExecution::new("paging");
        step_execution.execution_context.put(READ_COUNT_KEY, 20_usize);

        run_step(&step, &mut step_execution).unwrap();

        assert_eq!(tasklet.calls.get(), 2);
        assert_eq!(step_execution.read_count, 25);
    }

    #[test]
    fn failing_tasklet_should_fail_the_step() {
        let step = StepBuilder::new("failing").tasklet(&FailingTasklet).build();
        let mut step_execution = StepExecution::new("failing");

        let result = run_step(&step, &mut step_execution);

        assert!(matches!(result, Err(BatchError::ItemReader(_))));
        assert!(!step_execution.execution_context.contains_key(READ_COUNT_KEY));
    }

    #[test]
    fn job_context_should_be_reachable_from_a_tasklet() {
        struct Writer;
        impl Tasklet for Writer {
            fn execute(&self, context: &mut StepContext) -> Result<RepeatStatus, BatchError> {
                context.put(Scope::Job, "jobKey", "job execution context");
                Ok(RepeatStatus::Finished)
            }
        }

        let step = StepBuilder::new("writer").tasklet(&Writer).build();
        let mut step_execution = StepExecution::new("writer");

        assert!(run_step(&step, &mut step_execution).is_ok());
    }
}
