use std::{
    cell::{Cell, RefCell},
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    result,
};

use csv::WriterBuilder;
use log::debug;
use serde::Serialize;

use crate::{core::item::ItemWriter, BatchError};

/// Flat-file writer serializing each item as one delimited line.
///
/// An optional header line is written when the writer is opened, so once per
/// step run, and an optional footer line when it is closed. Opened from a
/// path in append mode, successive runs accumulate in the same file.
///
/// A chunk is serialized in memory first and reaches the destination only
/// when every item of it could be serialized.
pub struct CsvItemWriter<T: Write> {
    output: RefCell<T>,
    delimiter: u8,
    has_headers: bool,
    headers_written: Cell<bool>,
    header: Option<Vec<String>>,
    footer: Option<String>,
}

impl<T: Write> CsvItemWriter<T> {
    pub fn into_inner(self) -> result::Result<T, BatchError> {
        Ok(self.output.into_inner())
    }

    /// CSV writer over an in-memory buffer, using the configured delimiter.
    fn scratch(&self, has_headers: bool) -> csv::Writer<Vec<u8>> {
        WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(has_headers)
            .from_writer(Vec::new())
    }

    fn write_bytes(&self, wtr: csv::Writer<Vec<u8>>) -> Result<(), BatchError> {
        let bytes = wtr.into_inner().map_err(to_writer_error)?;
        self.output
            .borrow_mut()
            .write_all(&bytes)
            .map_err(to_writer_error)
    }
}

fn to_writer_error<E: ToString>(error: E) -> BatchError {
    BatchError::ItemWriter(error.to_string())
}

impl<T: Write, R: Serialize> ItemWriter<R> for CsvItemWriter<T> {
    fn write(&self, items: &[R]) -> Result<(), BatchError> {
        if items.is_empty() {
            return Ok(());
        }

        let with_headers = self.has_headers && !self.headers_written.get();
        let mut wtr = self.scratch(with_headers);
        for item in items {
            wtr.serialize(item).map_err(to_writer_error)?;
        }

        self.write_bytes(wtr)?;
        self.headers_written.set(true);
        Ok(())
    }

    /// Flushes the destination.
    fn flush(&self) -> Result<(), BatchError> {
        self.output.borrow_mut().flush().map_err(to_writer_error)
    }

    fn open(&self) -> Result<(), BatchError> {
        if let Some(header) = &self.header {
            debug!("Writing CSV header: {:?}", header);
            let mut wtr = self.scratch(false);
            wtr.write_record(header).map_err(to_writer_error)?;
            self.write_bytes(wtr)?;
        }
        Ok(())
    }

    fn close(&self) -> Result<(), BatchError> {
        let mut output = self.output.borrow_mut();

        if let Some(footer) = &self.footer {
            debug!("Writing CSV footer: {}", footer);
            writeln!(output, "{}", footer).map_err(to_writer_error)?;
        }
        output.flush().map_err(to_writer_error)
    }
}

#[derive(Default)]
pub struct CsvItemWriterBuilder {
    delimiter: u8,
    has_headers: bool,
    header: Option<Vec<String>>,
    footer: Option<String>,
    append: bool,
}

impl CsvItemWriterBuilder {
    pub fn new() -> CsvItemWriterBuilder {
        CsvItemWriterBuilder {
            delimiter: b',',
            has_headers: false,
            header: None,
            footer: None,
            append: false,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> CsvItemWriterBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Writes the serialized field names before the first record.
    ///
    /// Ignored when an explicit [`header`](Self::header) is set.
    pub fn has_headers(mut self, yes: bool) -> CsvItemWriterBuilder {
        self.has_headers = yes;
        self
    }

    /// Header line written at open, e.g. localized column labels.
    pub fn header<S: AsRef<str>>(mut self, labels: &[S]) -> CsvItemWriterBuilder {
        self.header = Some(labels.iter().map(|label| label.as_ref().to_string()).collect());
        self
    }

    /// Line written as is after the last record, at close.
    pub fn footer(mut self, footer: &str) -> CsvItemWriterBuilder {
        self.footer = Some(footer.to_string());
        self
    }

    /// Appends to an existing file instead of truncating it.
    pub fn append(mut self, append: bool) -> CsvItemWriterBuilder {
        self.append = append;
        self
    }

    /// Opens `path`, creating it when missing.
    ///
    /// # Errors
    /// `BatchError::ItemWriter` when the file cannot be opened.
    pub fn from_path<R: AsRef<Path>>(self, path: R) -> Result<CsvItemWriter<File>, BatchError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(self.append)
            .truncate(!self.append)
            .open(path)
            .map_err(|error| {
                BatchError::ItemWriter(format!("cannot open {}: {}", path.display(), error))
            })?;

        Ok(self.from_writer(file))
    }

    /// Creates a writer over any destination implementing `Write`.
    ///
    /// # Example
    ///
    /// ```
    /// # use std::error::Error;
    /// # use spring_batch_example::{item::csv::csv_writer::CsvItemWriterBuilder, core::item::ItemWriter};
    /// #[derive(serde::Serialize)]
    /// struct Row<'a> {
    ///     id: u32,
    ///     name: &'a str,
    /// }
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let wtr = CsvItemWriterBuilder::new()
    ///         .header(&["id", "이름"])
    ///         .footer("---------------")
    ///         .from_writer(vec![]);
    ///
    ///     let rows = [Row { id: 1, name: "멤버1" }, Row { id: 2, name: "멤버2" }];
    ///     ItemWriter::<Row>::open(&wtr)?;
    ///     wtr.write(&rows)?;
    ///     ItemWriter::<Row>::close(&wtr)?;
    ///
    ///     let data = String::from_utf8(wtr.into_inner()?)?;
    ///     assert_eq!(data, "id,이름\n1,멤버1\n2,멤버2\n---------------\n");
    ///     Ok(())
    /// }
    /// ```
    pub fn from_writer<W: io::Write>(self, wtr: W) -> CsvItemWriter<W> {
        CsvItemWriter {
            output: RefCell::new(wtr),
            delimiter: self.delimiter,
            has_headers: self.has_headers && self.header.is_none(),
            headers_written: Cell::new(false),
            header: self.header,
            footer: self.footer,
        }
    }
}
