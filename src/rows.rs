//! Row-level I/O collaborators.
//!
//! The mapping engine consumes rows as ordered lists of raw fields and produces
//! rows the same way. [`RowSource`] and [`RowSink`] are the seams:
//! [`CsvRowSource`] and [`CsvRowSink`] tokenize through the `csv` crate, while
//! [`MemoryRows`] and `Vec<Vec<String>>` keep rows in memory.

use crate::options::{CsvOptions, LineTerminator};
use crate::{Error, Result};
use std::collections::VecDeque;
use std::io;

/// Yields rows of raw fields.
pub trait RowSource {
    /// Returns the next row, or `None` at the end of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input cannot be read or tokenized.
    fn next_row(&mut self) -> Result<Option<Vec<String>>>;

    /// Returns the header row. Defaults to the next row.
    ///
    /// # Errors
    ///
    /// Same as [`RowSource::next_row`].
    fn next_header(&mut self) -> Result<Option<Vec<String>>> {
        self.next_row()
    }
}

/// Accepts rows of formatted fields.
pub trait RowSink {
    /// Writes one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output fails.
    fn write_row(&mut self, fields: &[String]) -> Result<()>;

    /// Flushes buffered rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output fails.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Rows held in memory, consumed front to back.
///
/// ```rust
/// use csv_classmap::{MemoryRows, RowSource};
///
/// let mut rows = MemoryRows::from_rows([["Id", "Name"], ["1", "one"]]);
/// assert_eq!(rows.next_row().unwrap().unwrap(), ["Id", "Name"]);
/// assert_eq!(rows.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryRows {
    rows: VecDeque<Vec<String>>,
}

impl MemoryRows {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds rows from anything iterable of iterable string-likes.
    pub fn from_rows<R, F, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = F>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        rows.into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect()
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push_back(row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<Vec<String>> for MemoryRows {
    fn from_iter<I: IntoIterator<Item = Vec<String>>>(iter: I) -> Self {
        MemoryRows {
            rows: iter.into_iter().collect(),
        }
    }
}

impl RowSource for MemoryRows {
    fn next_row(&mut self) -> Result<Option<Vec<String>>> {
        Ok(self.rows.pop_front())
    }
}

impl RowSink for Vec<Vec<String>> {
    fn write_row(&mut self, fields: &[String]) -> Result<()> {
        self.push(fields.to_vec());
        Ok(())
    }
}

/// Reads rows through a `csv` tokenizer.
///
/// The tokenizer never treats the first row specially; header handling belongs
/// to the [`Reader`](crate::Reader). Rows may have differing lengths.
pub struct CsvRowSource<R> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
}

impl<R: io::Read> CsvRowSource<R> {
    pub fn from_reader(reader: R, options: &CsvOptions) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(options.delimiter.as_byte())
            .from_reader(reader);
        CsvRowSource {
            reader,
            record: csv::StringRecord::new(),
        }
    }
}

impl<R: io::Read> RowSource for CsvRowSource<R> {
    fn next_row(&mut self) -> Result<Option<Vec<String>>> {
        if self.reader.read_record(&mut self.record)? {
            Ok(Some(self.record.iter().map(String::from).collect()))
        } else {
            Ok(None)
        }
    }
}

/// Writes rows through a `csv` writer, quoting fields as needed.
pub struct CsvRowSink<W: io::Write> {
    writer: csv::Writer<W>,
}

impl<W: io::Write> CsvRowSink<W> {
    pub fn from_writer(writer: W, options: &CsvOptions) -> Self {
        let terminator = match options.terminator {
            LineTerminator::CrLf => csv::Terminator::CRLF,
            LineTerminator::Lf => csv::Terminator::Any(b'\n'),
        };
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(options.delimiter.as_byte())
            .terminator(terminator)
            .from_writer(writer);
        CsvRowSink { writer }
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if flushing fails.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::io(&e.error().to_string()))
    }
}

impl<W: io::Write> RowSink for CsvRowSink<W> {
    fn write_row(&mut self, fields: &[String]) -> Result<()> {
        self.writer.write_record(fields)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Delimiter;

    #[test]
    fn test_csv_source_reads_all_rows() {
        let input = "Id,Name\r\n1,\"one, two\"\r\n2\r\n";
        let mut source = CsvRowSource::from_reader(input.as_bytes(), &CsvOptions::default());
        assert_eq!(source.next_header().unwrap().unwrap(), ["Id", "Name"]);
        assert_eq!(source.next_row().unwrap().unwrap(), ["1", "one, two"]);
        assert_eq!(source.next_row().unwrap().unwrap(), ["2"]);
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_csv_source_delimiter() {
        let options = CsvOptions::new().with_delimiter(Delimiter::Semicolon);
        let mut source = CsvRowSource::from_reader("a;b\n".as_bytes(), &options);
        assert_eq!(source.next_row().unwrap().unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_csv_sink_terminators() {
        let row = vec!["1".to_string(), "a,b".to_string()];

        let mut sink = CsvRowSink::from_writer(Vec::new(), &CsvOptions::default());
        sink.write_row(&row).unwrap();
        let out = sink.into_inner().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,\"a,b\"\r\n");

        let options = CsvOptions::new().with_terminator(LineTerminator::Lf);
        let mut sink = CsvRowSink::from_writer(Vec::new(), &options);
        sink.write_row(&row).unwrap();
        let out = sink.into_inner().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,\"a,b\"\n");
    }

    #[test]
    fn test_memory_rows() {
        let mut rows = MemoryRows::new();
        assert!(rows.is_empty());
        rows.push(vec!["x".to_string()]);
        assert_eq!(rows.next_row().unwrap(), Some(vec!["x".to_string()]));
        assert_eq!(rows.next_row().unwrap(), None);
    }
}
