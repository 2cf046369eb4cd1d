// src/store/mod.rs
//! Interim table artifact: one row per line, tab-delimited, UTF-8, `\n`
//! terminated, no header.
//!
//! Cells containing a tab or a line break do not survive a round trip.
//! Normalized cells never contain either, so this is not checked.

use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use csv::{QuoteStyle, ReaderBuilder, StringRecordsIntoIter, Terminator, WriterBuilder};
use tracing::debug;

use crate::error::{Error, Result};
use crate::process::Row;

const DELIMITER: u8 = b'\t';

/// Streaming writer for a table artifact.
pub struct TableWriter<W: Write> {
    writer: csv::Writer<W>,
    path: PathBuf,
    rows: usize,
}

impl TableWriter<File> {
    /// Create (or truncate) the artifact at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::StoreIo {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Ok(Self::from_writer(file, path))
    }
}

impl<W: Write> TableWriter<W> {
    /// Wrap any writer; `label` only appears in error messages.
    pub fn from_writer(inner: W, label: impl Into<PathBuf>) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .terminator(Terminator::Any(b'\n'))
            .quote_style(QuoteStyle::Necessary)
            .flexible(true)
            .from_writer(inner);
        Self {
            writer,
            path: label.into(),
            rows: 0,
        }
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        self.writer.write_record(row).map_err(|source| Error::StoreIo {
            path: self.path.clone(),
            source,
        })?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and return the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().map_err(|e| Error::StoreIo {
            path: self.path.clone(),
            source: e.into(),
        })?;
        debug!(path = %self.path.display(), rows = self.rows, "flushed table artifact");
        Ok(self.rows)
    }
}

/// Write `rows` to a new artifact at `path`, preserving row and column order.
pub fn write_rows<I>(rows: I, path: &Path) -> Result<usize>
where
    I: IntoIterator,
    I::Item: AsRef<[String]>,
{
    let mut writer = TableWriter::create(path)?;
    for row in rows {
        writer.write_row(row.as_ref())?;
    }
    writer.finish()
}

/// Write `rows` into an arbitrary writer.
pub fn write_rows_to<W, I>(rows: I, inner: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator,
    I::Item: AsRef<[String]>,
{
    let mut writer = TableWriter::from_writer(inner, "<writer>");
    for row in rows {
        writer.write_row(row.as_ref())?;
    }
    writer.finish()
}

/// Lazy, single-pass reader over the rows of an artifact, in file order.
/// Lines are not required to share a column count.
pub struct RowReader<R: Read> {
    records: StringRecordsIntoIter<R>,
    path: PathBuf,
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map(|rec| rec.iter().map(str::to_string).collect())
                .map_err(|source| Error::StoreIo {
                    path: self.path.clone(),
                    source,
                }),
        )
    }
}

/// Open the artifact at `path`. Fails immediately if it cannot be opened;
/// a line that is not valid UTF-8 yields an `Err` item.
pub fn read_rows(path: &Path) -> Result<RowReader<File>> {
    let file = File::open(path).map_err(|e| Error::StoreIo {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    Ok(read_rows_from(file, path))
}

pub fn read_rows_from<R: Read>(inner: R, label: impl Into<PathBuf>) -> RowReader<R> {
    let reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(inner);
    RowReader {
        records: reader.into_records(),
        path: label.into(),
    }
}
