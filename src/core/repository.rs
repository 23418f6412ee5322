use std::{
    collections::{BTreeMap, HashMap},
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use log::debug;

use crate::BatchError;

use super::{context::ExecutionContext, job::JobExecution, step::StepExecution};

/// Keeps job executions so a failed run can be found and restarted.
pub trait JobRepository {
    /// Inserts or replaces the execution identified by its job name and run id.
    fn save_execution(&self, execution: &JobExecution) -> Result<(), BatchError>;

    /// Saves the progress of a running step together with the job context.
    ///
    /// The execution must have been saved before.
    fn update_step_execution(
        &self,
        job_name: &str,
        run_id: u64,
        step_execution: &StepExecution,
        job_context: &ExecutionContext,
    ) -> Result<(), BatchError>;

    fn find_execution(&self, job_name: &str, run_id: u64)
    -> Result<Option<JobExecution>, BatchError>;

    /// Execution with the highest run id of the job.
    fn last_execution(&self, job_name: &str) -> Result<Option<JobExecution>, BatchError>;
}

type Executions = HashMap<String, BTreeMap<u64, JobExecution>>;

fn update_step(
    executions: &mut Executions,
    job_name: &str,
    run_id: u64,
    step_execution: &StepExecution,
    job_context: &ExecutionContext,
) -> Result<(), BatchError> {
    let execution = executions
        .get_mut(job_name)
        .and_then(|runs| runs.get_mut(&run_id))
        .ok_or_else(|| {
            BatchError::Repository(format!(
                "no execution of job {} with run.id {}",
                job_name, run_id
            ))
        })?;

    execution.upsert_step_execution(step_execution.clone());
    execution.execution_context = job_context.clone();
    Ok(())
}

fn lock(executions: &Mutex<Executions>) -> Result<MutexGuard<'_, Executions>, BatchError> {
    executions
        .lock()
        .map_err(|error| BatchError::Repository(error.to_string()))
}

/// Repository living as long as the process. Every job uses one unless
/// another repository is configured.
#[derive(Default)]
pub struct InMemoryJobRepository {
    executions: Mutex<Executions>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRepository for InMemoryJobRepository {
    fn save_execution(&self, execution: &JobExecution) -> Result<(), BatchError> {
        lock(&self.executions)?
            .entry(execution.job_name.clone())
            .or_default()
            .insert(execution.run_id, execution.clone());
        Ok(())
    }

    fn update_step_execution(
        &self,
        job_name: &str,
        run_id: u64,
        step_execution: &StepExecution,
        job_context: &ExecutionContext,
    ) -> Result<(), BatchError> {
        let mut executions = lock(&self.executions)?;
        update_step(&mut executions, job_name, run_id, step_execution, job_context)
    }

    fn find_execution(
        &self,
        job_name: &str,
        run_id: u64,
    ) -> Result<Option<JobExecution>, BatchError> {
        Ok(lock(&self.executions)?
            .get(job_name)
            .and_then(|runs| runs.get(&run_id))
            .cloned())
    }

    fn last_execution(&self, job_name: &str) -> Result<Option<JobExecution>, BatchError> {
        Ok(lock(&self.executions)?
            .get(job_name)
            .and_then(|runs| runs.values().next_back())
            .cloned())
    }
}

/// Repository persisted as a JSON document.
///
/// The whole document is loaded when the repository is opened and rewritten
/// on every save, so a process started later can restart a failed run.
pub struct FileJobRepository {
    path: PathBuf,
    executions: Mutex<Executions>,
}

impl FileJobRepository {
    /// Opens the repository stored at `path`, creating an empty one if the
    /// file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BatchError> {
        let path = path.as_ref().to_path_buf();

        let executions = if path.exists() {
            let file = File::open(&path).map_err(|error| {
                BatchError::Repository(format!("cannot open {}: {}", path.display(), error))
            })?;
            serde_json::from_reader(BufReader::new(file)).map_err(|error| {
                BatchError::Repository(format!("cannot parse {}: {}", path.display(), error))
            })?
        } else {
            Executions::new()
        };

        Ok(Self {
            path,
            executions: Mutex::new(executions),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a temporary file then renames it over the document.
    fn store(&self, executions: &Executions) -> Result<(), BatchError> {
        let to_error = |error: std::io::Error| {
            BatchError::Repository(format!("cannot write {}: {}", self.path.display(), error))
        };

        let tmp_path = self.path.with_extension("tmp");
        let file = File::create(&tmp_path).map_err(to_error)?;
        serde_json::to_writer_pretty(BufWriter::new(file), executions)
            .map_err(|error| BatchError::Repository(error.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(to_error)?;

        debug!("Job repository saved to {}", self.path.display());
        Ok(())
    }
}

impl JobRepository for FileJobRepository {
    fn save_execution(&self, execution: &JobExecution) -> Result<(), BatchError> {
        let mut executions = lock(&self.executions)?;
        executions
            .entry(execution.job_name.clone())
            .or_default()
            .insert(execution.run_id, execution.clone());
        self.store(&executions)
    }

    fn update_step_execution(
        &self,
        job_name: &str,
        run_id: u64,
        step_execution: &StepExecution,
        job_context: &ExecutionContext,
    ) -> Result<(), BatchError> {
        let mut executions = lock(&self.executions)?;
        update_step(&mut executions, job_name, run_id, step_execution, job_context)?;
        self.store(&executions)
    }

    fn find_execution(
        &self,
        job_name: &str,
        run_id: u64,
    ) -> Result<Option<JobExecution>, BatchError> {
        Ok(lock(&self.executions)?
            .get(job_name)
            .and_then(|runs| runs.get(&run_id))
            .cloned())
    }

    fn last_execution(&self, job_name: &str) -> Result<Option<JobExecution>, BatchError> {
        Ok(lock(&self.executions)?
            .get(job_name)
            .and_then(|runs| runs.values().next_back())
            .cloned())
    }
}
