use csv::{ReaderBuilder, StringRecordsIntoIter, Terminator, Trim};
use log::debug;
use serde::de::DeserializeOwned;
use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::Read,
    path::Path,
};

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
};

/// Reader mapping CSV records to items, field by field in column order.
///
/// Leading lines can be skipped (`lines_to_skip`) and the number of items
/// capped (`max_item_count`). Malformed records are reported as
/// `BatchError::ItemReader` with their position.
pub struct CsvItemReader<R> {
    records: RefCell<StringRecordsIntoIter<R>>,
    lines_to_skip: Cell<usize>,
    max_item_count: Option<usize>,
    item_count: Cell<usize>,
}

impl<R: Read> CsvItemReader<R> {
    /// Skips the configured leading lines, once.
    fn skip_leading_lines(&self) -> Result<(), BatchError> {
        let mut records = self.records.borrow_mut();
        while self.lines_to_skip.get() > 0 {
            self.lines_to_skip.set(self.lines_to_skip.get() - 1);
            if let Some(Err(error)) = records.next() {
                return Err(BatchError::ItemReader(error.to_string()));
            }
        }
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.max_item_count
            .is_some_and(|max_item_count| self.item_count.get() >= max_item_count)
    }
}

impl<R: Read, T: DeserializeOwned> ItemReader<T> for CsvItemReader<R> {
    fn read(&self) -> ItemReaderResult<T> {
        self.skip_leading_lines()?;

        if self.limit_reached() {
            return Ok(None);
        }

        let Some(result) = self.records.borrow_mut().next() else {
            return Ok(None);
        };

        let position = self.item_count.get() + 1;
        self.item_count.set(position);

        let record = result.map_err(|error| {
            BatchError::ItemReader(format!("record #{}: {}", position, error))
        })?;

        let item: T = record.deserialize(None).map_err(|error| {
            BatchError::ItemReader(format!("record #{}: {}", position, error))
        })?;

        Ok(Some(item))
    }

    /// Skips `cursor` records without mapping them.
    fn resume_at(&self, cursor: usize) -> Result<(), BatchError> {
        self.skip_leading_lines()?;

        let mut records = self.records.borrow_mut();
        for _ in 0..cursor {
            if self.limit_reached() || records.next().is_none() {
                break;
            }
            self.item_count.set(self.item_count.get() + 1);
        }

        debug!("CSV reader resumed after {} records", self.item_count.get());
        Ok(())
    }
}

#[derive(Default)]
pub struct CsvItemReaderBuilder {
    delimiter: u8,
    terminator: Terminator,
    has_headers: bool,
    lines_to_skip: usize,
    max_item_count: Option<usize>,
}

impl CsvItemReaderBuilder {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            terminator: Terminator::CRLF,
            has_headers: false,
            lines_to_skip: 0,
            max_item_count: None,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn terminator(mut self, terminator: Terminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Treats the first line as a header row consumed by the CSV parser.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Number of lines ignored before the first item.
    pub fn lines_to_skip(mut self, lines_to_skip: usize) -> Self {
        self.lines_to_skip = lines_to_skip;
        self
    }

    /// Stops after `max_item_count` items even if the input goes on.
    pub fn max_item_count(mut self, max_item_count: usize) -> Self {
        self.max_item_count = Some(max_item_count);
        self
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .terminator(self.terminator)
            .has_headers(self.has_headers)
            // skipped lines may be narrower or wider than the records
            .flexible(true);
        builder
    }

    fn build<R: Read>(self, records: StringRecordsIntoIter<R>) -> CsvItemReader<R> {
        CsvItemReader {
            records: RefCell::new(records),
            lines_to_skip: Cell::new(self.lines_to_skip),
            max_item_count: self.max_item_count,
            item_count: Cell::new(0),
        }
    }

    /// Creates a reader from any source implementing `Read`.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde::Deserialize;
    /// use spring_batch_example::core::item::ItemReader;
    /// use spring_batch_example::item::csv::csv_reader::CsvItemReaderBuilder;
    ///
    /// #[derive(Debug, Deserialize)]
    /// struct Person {
    ///     id: i64,
    ///     name: String,
    /// }
    ///
    /// let data = "id,name\n1,멤버1\n2,멤버2\n3,멤버3\n";
    /// let reader = CsvItemReaderBuilder::new()
    ///     .lines_to_skip(1)
    ///     .max_item_count(2)
    ///     .from_reader(data.as_bytes());
    ///
    /// let first: Person = reader.read().unwrap().unwrap();
    /// let second: Person = reader.read().unwrap().unwrap();
    /// let third: Option<Person> = reader.read().unwrap();
    ///
    /// assert_eq!(first.id, 1);
    /// assert_eq!(second.name, "멤버2");
    /// assert!(third.is_none());
    /// ```
    pub fn from_reader<R: Read>(self, rdr: R) -> CsvItemReader<R> {
        let records = self.reader_builder().from_reader(rdr).into_records();
        self.build(records)
    }

    /// Opens `path` for reading.
    ///
    /// # Errors
    /// `BatchError::ItemReader` when the file cannot be opened.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvItemReader<File>, BatchError> {
        let path = path.as_ref();
        let rdr = self.reader_builder().from_path(path).map_err(|error| {
            BatchError::ItemReader(format!("cannot open {}: {}", path.display(), error))
        })?;

        Ok(self.build(rdr.into_records()))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use crate::{
        core::item::{ItemReader, ItemReaderResult},
        BatchError,
    };

    use super::CsvItemReaderBuilder;

    #[derive(Debug, Deserialize, PartialEq)]
    struct City {
        city: String,
        country: String,
        pop: u32,
    }

    const CITIES: &str = "city,country,pop
        Boston,United States,4628910
        Concord,United States,42695
        Paris,France,2102650";

    #[test]
    fn records_should_be_mapped_by_position() {
        let reader = CsvItemReaderBuilder::new()
            .lines_to_skip(1)
            .from_reader(CITIES.as_bytes());

        let boston: ItemReaderResult<City> = reader.read();

        assert_eq!(
            boston.unwrap(),
            Some(City {
                city: "Boston".to_string(),
                country: "United States".to_string(),
                pop: 4628910,
            })
        );
    }

    #[test]
    fn resume_at_should_skip_records() {
        let reader = CsvItemReaderBuilder::new()
            .lines_to_skip(1)
            .from_reader(CITIES.as_bytes());

        ItemReader::<City>::resume_at(&reader, 2).unwrap();
        let paris: Option<City> = reader.read().unwrap();
        let end: Option<City> = reader.read().unwrap();

        assert_eq!(paris.map(|city| city.city), Some("Paris".to_string()));
        assert!(end.is_none());
    }

    #[test]
    fn max_item_count_should_count_resumed_records() {
        let reader = CsvItemReaderBuilder::new()
            .lines_to_skip(1)
            .max_item_count(2)
            .from_reader(CITIES.as_bytes());

        ItemReader::<City>::resume_at(&reader, 1).unwrap();
        let concord: Option<City> = reader.read().unwrap();
        let end: Option<City> = reader.read().unwrap();

        assert!(concord.is_some());
        assert!(end.is_none());
    }

    #[test]
    fn malformed_record_should_fail_with_position() {
        let data = "Boston,United States,not-a-number";
        let reader = CsvItemReaderBuilder::new().from_reader(data.as_bytes());

        let result: ItemReaderResult<City> = reader.read();

        match result {
            Err(BatchError::ItemReader(message)) => assert!(message.starts_with("record #1")),
            _ => panic!("expected a read error"),
        }
    }

    #[test]
    fn skipped_title_line_should_not_fix_the_record_width() {
        let data = "cities export
        Boston,United States,4628910
        Concord,United States,42695";
        let reader = CsvItemReaderBuilder::new()
            .lines_to_skip(1)
            .from_reader(data.as_bytes());

        let boston: Option<City> = reader.read().unwrap();
        let concord: Option<City> = reader.read().unwrap();

        assert_eq!(boston.map(|city| city.pop), Some(4628910));
        assert_eq!(concord.map(|city| city.city), Some("Concord".to_string()));
    }

    #[test]
    fn short_record_should_still_fail() {
        let data = "city,country,pop,area
        Boston,United States";
        let reader = CsvItemReaderBuilder::new()
            .lines_to_skip(1)
            .from_reader(data.as_bytes());

        let result: ItemReaderResult<City> = reader.read();

        match result {
            Err(BatchError::ItemReader(message)) => assert!(message.starts_with("record #1")),
            _ => panic!("expected a read error"),
        }
    }

    #[test]
    fn missing_file_should_be_an_error() {
        let result = CsvItemReaderBuilder::new().from_path("/definitely/not/here.csv");
        assert!(matches!(result, Err(BatchError::ItemReader(_))));
    }
}
