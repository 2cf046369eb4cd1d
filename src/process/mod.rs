// src/process/mod.rs
pub mod utils;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::host::{DocumentHost, Session};
use crate::store::TableWriter;
use utils::clean_cell;

/// One table row after normalization, one entry per column.
pub type Row = Vec<String>;

/// Lazy, single-pass reader over every row of every table in a document.
///
/// Yields rows in document order: table by table, row by row. Holds the
/// host session; the document is closed once the last row has been read,
/// after a structural error, or when the reader is dropped early.
pub struct TableRows<'h, H: DocumentHost + ?Sized> {
    session: Option<Session<'h, H>>,
    tables: usize,
    table: usize,
    rows: usize,
    columns: usize,
    row: usize,
}

/// Open `path` on `host` and return a reader over all of its table rows.
///
/// Fails before yielding anything if the host is unavailable, rejects the
/// path, or cannot report the table count; the host is closed in every
/// one of those cases.
#[tracing::instrument(level = "info", skip(host, path), fields(path = %path.display()))]
pub fn extract_rows<'h, H: DocumentHost + ?Sized>(
    host: &'h mut H,
    path: &Path,
) -> Result<TableRows<'h, H>> {
    let session = Session::open(host, path)?;
    let tables = session.host().table_count()?;
    info!(tables, "document opened");
    Ok(TableRows {
        session: Some(session),
        tables,
        table: 0,
        rows: 0,
        columns: 0,
        row: 0,
    })
}

impl<H: DocumentHost + ?Sized> TableRows<'_, H> {
    /// Number of tables the host reported for this document.
    pub fn table_count(&self) -> usize {
        self.tables
    }

    fn finish(&mut self) {
        // dropping the session closes the document
        self.session = None;
    }

    fn read_row(&self, host: &H) -> Row {
        (1..=self.columns)
            .map(|column| match host.cell_text(self.table, self.row, column) {
                Ok(raw) => clean_cell(&raw),
                Err(err) => {
                    debug!(
                        table = self.table,
                        row = self.row,
                        column,
                        error = %err,
                        "unreadable cell, using empty value"
                    );
                    String::new()
                }
            })
            .collect()
    }

    /// Advance to the next table. `Ok(false)` once all tables are consumed.
    fn next_table(&mut self, host: &H) -> Result<bool> {
        if self.table >= self.tables {
            return Ok(false);
        }
        self.table += 1;
        self.rows = host.row_count(self.table)?;
        self.columns = host.column_count(self.table)?;
        self.row = 0;
        info!(
            "Reading table {} of {} ({} rows × {} columns)",
            self.table, self.tables, self.rows, self.columns
        );
        Ok(true)
    }
}

impl<H: DocumentHost + ?Sized> Iterator for TableRows<'_, H> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let session = self.session.take()?;
            let host = session.host();

            if self.row < self.rows {
                self.row += 1;
                let row = self.read_row(host);
                self.session = Some(session);
                return Some(Ok(row));
            }

            match self.next_table(host) {
                Ok(true) => self.session = Some(session),
                Ok(false) => {
                    drop(session);
                    self.finish();
                    return None;
                }
                Err(err) => {
                    warn!(table = self.table, error = %err, "aborting extraction");
                    drop(session);
                    self.finish();
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Extract every table row of `doc_path` and persist it as a tab-delimited
/// artifact at `csv_path`. Returns the number of rows written.
#[tracing::instrument(level = "info", skip(host, doc_path, csv_path), fields(doc = %doc_path.display(), csv = %csv_path.display()))]
pub fn doc_to_csv<H: DocumentHost + ?Sized>(
    host: &mut H,
    doc_path: &Path,
    csv_path: &Path,
) -> Result<usize> {
    let rows = extract_rows(host, doc_path)?;
    let mut writer = TableWriter::create(csv_path)?;
    for row in rows {
        writer.write_row(&row?)?;
    }
    let written = writer.finish()?;
    info!(rows = written, "table artifact written");
    Ok(written)
}
