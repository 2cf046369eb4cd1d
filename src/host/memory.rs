use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::DocumentHost;

/// Deterministic in-memory host over `tables → rows → cells`.
///
/// Serves a single document path. Cells can be made to fault, the host can
/// be made unavailable, and `open`/`close` calls are counted.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    path: PathBuf,
    tables: Vec<Vec<Vec<String>>>,
    faults: HashSet<(usize, usize, usize)>,
    unavailable: bool,
    broken_counts: bool,
    open: bool,
    opens: usize,
    closes: usize,
}

impl MemoryHost {
    pub fn new(path: impl Into<PathBuf>, tables: Vec<Vec<Vec<String>>>) -> Self {
        Self {
            path: path.into(),
            tables,
            ..Default::default()
        }
    }

    /// Make `cell_text(table, row, column)` fail (1-based indices).
    pub fn with_fault(mut self, table: usize, row: usize, column: usize) -> Self {
        self.faults.insert((table, row, column));
        self
    }

    /// Refuse every `open` with `HostUnavailable`.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Make row/column count queries fail.
    pub fn with_broken_counts(mut self) -> Self {
        self.broken_counts = true;
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn opens(&self) -> usize {
        self.opens
    }

    pub fn closes(&self) -> usize {
        self.closes
    }

    fn table(&self, table: usize) -> Result<&Vec<Vec<String>>> {
        if !self.open {
            return Err(Error::HostQuery("no document open".into()));
        }
        table
            .checked_sub(1)
            .and_then(|i| self.tables.get(i))
            .ok_or_else(|| Error::HostQuery(format!("no table {table}")))
    }
}

impl DocumentHost for MemoryHost {
    fn open(&mut self, path: &Path) -> Result<()> {
        if self.unavailable {
            return Err(Error::HostUnavailable("in-memory host disabled".into()));
        }
        if self.open {
            return Err(Error::DocumentOpen {
                path: path.to_path_buf(),
                reason: "another document is already open".into(),
            });
        }
        if path != self.path {
            return Err(Error::DocumentOpen {
                path: path.to_path_buf(),
                reason: "no such document".into(),
            });
        }
        self.open = true;
        self.opens += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        self.closes += 1;
        Ok(())
    }

    fn table_count(&self) -> Result<usize> {
        if !self.open {
            return Err(Error::HostQuery("no document open".into()));
        }
        Ok(self.tables.len())
    }

    fn row_count(&self, table: usize) -> Result<usize> {
        if self.broken_counts {
            return Err(Error::HostQuery(format!("row count of table {table}")));
        }
        Ok(self.table(table)?.len())
    }

    fn column_count(&self, table: usize) -> Result<usize> {
        if self.broken_counts {
            return Err(Error::HostQuery(format!("column count of table {table}")));
        }
        Ok(self
            .table(table)?
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0))
    }

    fn cell_text(&self, table: usize, row: usize, column: usize) -> Result<String> {
        let fault = |reason: &str| Error::CellRead {
            table,
            row,
            column,
            reason: reason.to_string(),
        };
        if self.faults.contains(&(table, row, column)) {
            return Err(fault("injected fault"));
        }
        let rows = self.table(table)?;
        row.checked_sub(1)
            .and_then(|r| rows.get(r))
            .and_then(|cells| column.checked_sub(1).and_then(|c| cells.get(c)))
            .cloned()
            .ok_or_else(|| fault("cell out of range"))
    }
}
