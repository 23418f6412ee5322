use std::{fs, path::Path};

use crate::{
    core::{
        item::PassThroughProcessor,
        job::{Job, JobBuilder, JobExecution},
        parameters::{JobParameters, RunIdIncrementer},
        repository::JobRepository,
        step::StepBuilder,
    },
    item::{csv::csv_writer::CsvItemWriterBuilder, list::ListItemReader},
    BatchError,
};

use super::{
    person::{generate_persons, Person},
    JobConfig,
};

pub const JOB_NAME: &str = "taskInputJob";

pub const HEADER: [&str; 4] = ["id", "이름", "나이", "거주지"];

pub const FOOTER: &str = "---------------";

/// `taskInputJob`: writes 100 generated persons to `output`.
///
/// Each run appends its own header, records and footer to the file, creating
/// the file and its parent directory when missing.
pub fn run_task_input_job(
    output: &Path,
    repository: &dyn JobRepository,
    parameters: &JobParameters,
) -> Result<JobExecution, BatchError> {
    let config = JobConfig::for_run(JOB_NAME, repository, parameters)?;

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| {
            BatchError::ItemWriter(format!("cannot create {}: {}", parent.display(), error))
        })?;
    }

    let reader = ListItemReader::new(generate_persons(100));
    let writer = CsvItemWriterBuilder::new()
        .header(&HEADER)
        .footer(FOOTER)
        .append(true)
        .from_path(output)?;

    let step = StepBuilder::new("taskInputStep")
        .chunk::<Person, Person>(config.chunk_size)
        .reader(&reader)
        .processor(&PassThroughProcessor)
        .writer(&writer)
        .build()?;

    let job = JobBuilder::new()
        .name(JOB_NAME)
        .repository(repository)
        .incrementer(&RunIdIncrementer)
        .start(&step)
        .build();

    job.run(parameters)
}
