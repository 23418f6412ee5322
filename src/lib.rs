#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 # Spring Batch Example

 A small chunk-oriented batch processing core, and the tutorial jobs built on it.

 ## Core Concepts

- **Job:** an ordered list of `Step`s run one after the other. The first failing step fails the job.
- **Step:** a phase of a job, either a `Tasklet` called until it is finished or a chunk step.
- **ItemReader:** pulls one item at a time; `Ok(None)` marks the end of the input.
- **ItemProcessor:** transforms an item, or filters it out by returning `Ok(None)`.
- **ItemWriter:** receives one chunk of processed items at a time.
- **ExecutionContext:** key/value store with a job scope, shared by the steps of a run, and a step scope private to one step.
- **JobRepository:** keeps executions, their contexts and the read cursor so a failed run can restart where it stopped.

 ## Features

| **Feature**   | **Description**                                                   |
|---------------|-------------------------------------------------------------------|
| csv           | Enables CSV `ItemReader` and `ItemWriter`                         |
| logger        | Enables a logger `ItemWriter`, useful for debugging purposes      |
| rdbc-sqlite   | Enables the SQLite `ItemWriter`                                   |
| jobs          | Enables the tutorial jobs (hello, shared, chunk processing, task) |
| full          | Enables all available features                                    |

 ## Getting Started

```toml
[dependencies]
spring-batch-example = { version = "<version>", features = ["<full|csv|logger|rdbc-sqlite|jobs>"] }
```

```rust
# use spring_batch_example::{
#     core::{
#         item::{ItemProcessor, ItemProcessorResult, ItemWriter, ItemWriterResult},
#         job::{Job, JobBuilder},
#         parameters::{JobParameters, RunIdIncrementer},
#         step::StepBuilder,
#     },
#     error::BatchError,
#     item::list::ListItemReader,
# };
# use std::cell::Cell;
struct AppendSuffix;

impl ItemProcessor<String, String> for AppendSuffix {
    fn process(&self, item: &String) -> ItemProcessorResult<String> {
        Ok(Some(format!("{}, Spring Batch", item)))
    }
}

#[derive(Default)]
struct CountingWriter {
    chunks: Cell<usize>,
}

impl ItemWriter<String> for CountingWriter {
    fn write(&self, _items: &[String]) -> ItemWriterResult {
        self.chunks.set(self.chunks.get() + 1);
        Ok(())
    }
}

fn main() -> Result<(), BatchError> {
    let reader = ListItemReader::new((0..100).map(|i| format!("{} Hello", i)).collect::<Vec<String>>());
    let writer = CountingWriter::default();

    let step = StepBuilder::new("chunkBaseStep")
        .chunk::<String, String>(10)
        .reader(&reader)
        .processor(&AppendSuffix)
        .writer(&writer)
        .build()?;

    let job = JobBuilder::new()
        .name("chunkProcessingJob")
        .incrementer(&RunIdIncrementer)
        .start(&step)
        .build();

    let execution = job.run(&JobParameters::new())?;

    assert_eq!(writer.chunks.get(), 10);
    assert_eq!(execution.step_executions[0].write_count, 100);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of items readers / writers  (for example: csv reader and writer)
pub mod item;

#[cfg(feature = "jobs")]
/// Tutorial jobs built on the core and item modules
pub mod jobs;
