use std::path::Path;

use sqlx::{Pool, Sqlite};

use crate::{
    core::{
        job::{Job, JobBuilder, JobExecution},
        parameters::{JobParameters, RunIdIncrementer},
        repository::JobRepository,
        step::StepBuilder,
    },
    item::{
        composite::CompositeItemWriterBuilder,
        csv::csv_reader::CsvItemReaderBuilder,
        dedupe::{DuplicateCheckProcessor, SeenKeys},
        logger::LoggerWriter,
        rdbc::SqliteItemWriter,
    },
    BatchError,
};

use super::{
    person::{Person, PersonBinder},
    JobConfig,
};

pub const PERSON_TABLE: &str = "person";

pub const JOB_NAME: &str = "taskJob";

/// Maximum number of persons read from the input file.
pub const MAX_ITEM_COUNT: usize = 100;

/// Creates the `person` table if it does not exist.
pub async fn create_person_table(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS person (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age TEXT NOT NULL,
            address TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// `taskJob`: loads persons from the CSV file `input` into the `person` table.
///
/// The first line of the file is skipped and at most 100 persons are read.
/// Unless `allowDuplicate` is set, only the first person of each name is
/// kept; a restarted run remembers the names of its committed chunks. Each
/// chunk goes to the database, then to a size logger.
///
/// Must be called from a multi-threaded tokio runtime.
pub fn run_task_job(
    input: &Path,
    pool: &Pool<Sqlite>,
    repository: &dyn JobRepository,
    parameters: &JobParameters,
) -> Result<JobExecution, BatchError> {
    let config = JobConfig::for_run(JOB_NAME, repository, parameters)?;

    let reader = CsvItemReaderBuilder::new()
        .lines_to_skip(1)
        .max_item_count(MAX_ITEM_COUNT)
        .from_path(input)?;

    let seen = SeenKeys::new();
    let processor = DuplicateCheckProcessor::new(&seen, |person: &Person| person.name.clone())
        .allow_duplicate(config.allow_duplicate);

    let database_writer = SqliteItemWriter::<Person>::new()
        .pool(pool)
        .table(PERSON_TABLE)
        .add_column("name")
        .add_column("age")
        .add_column("address")
        .item_binder(&PersonBinder);
    let size_writer = LoggerWriter::size_only();
    let writer = CompositeItemWriterBuilder::<Person>::new()
        .delegate(&database_writer)
        .delegate(&size_writer)
        .build();

    let step = StepBuilder::new("taskStep")
        .chunk::<Person, Person>(config.chunk_size)
        .reader(&reader)
        .processor(&processor)
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
