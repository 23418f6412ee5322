//! CSV support for reading items from and writing items to flat files.
//!
//! # Module Architecture
//!
//! 1. **CsvItemReader**: maps each record positionally into an item with
//!    serde. Leading lines can be skipped and the number of items capped.
//!
//! 2. **CsvItemWriter**: serializes items as delimited lines, with an optional
//!    header line written at open and an optional footer line written at close.
//!    Opened from a path, it can append to the output of previous runs.
//!
//! Both components follow the builder pattern.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use spring_batch_example::core::item::{ItemReader, ItemWriter};
//! use spring_batch_example::item::csv::{
//!     csv_reader::CsvItemReaderBuilder, csv_writer::CsvItemWriterBuilder,
//! };
//!
//! #[derive(Debug, Deserialize, Serialize)]
//! struct Person {
//!     id: i64,
//!     name: String,
//!     age: String,
//!     address: String,
//! }
//!
//! let input = "id,name,age,address\n1,멤버1,test age,test address\n";
//! let reader = CsvItemReaderBuilder::new()
//!     .lines_to_skip(1)
//!     .from_reader(input.as_bytes());
//!
//! let mut people: Vec<Person> = Vec::new();
//! while let Some(person) = reader.read().unwrap() {
//!     people.push(person);
//! }
//!
//! let writer = CsvItemWriterBuilder::new()
//!     .header(&["id", "이름", "나이", "거주지"])
//!     .from_writer(Vec::new());
//! ItemWriter::<Person>::open(&writer).unwrap();
//! writer.write(&people).unwrap();
//!
//! let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
//! assert_eq!(output, "id,이름,나이,거주지\n1,멤버1,test age,test address\n");
//! ```

/// A module providing facilities for reading CSV data records.
pub mod csv_reader;

/// A module providing facilities for writing CSV data records.
pub mod csv_writer;
