//! Document-automation host capability.
//!
//! A host opens one document at a time and answers table/row/column count
//! queries plus cell-text lookups. All indices are 1-based, matching the
//! collection semantics of word-processor automation interfaces.
//!
//! ```text
//!   Session::open(host, path)  ── host.open(path)
//!        │
//!        ├── table_count / row_count / column_count / cell_text
//!        │
//!   drop(session)              ── host.close()   (always, on every exit path)
//! ```

pub mod docx;
pub mod memory;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

pub use docx::DocxHost;
pub use memory::MemoryHost;

/// Capability surface the table reader drives.
///
/// Implementations are stateful and non-reentrant: only one document is
/// open at a time, and `close` must be called before opening another.
pub trait DocumentHost {
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Tear down the current session. Must tolerate being called when no
    /// document is open.
    fn close(&mut self) -> Result<()>;

    fn table_count(&self) -> Result<usize>;
    fn row_count(&self, table: usize) -> Result<usize>;
    fn column_count(&self, table: usize) -> Result<usize>;
    fn cell_text(&self, table: usize, row: usize, column: usize) -> Result<String>;
}

/// Exclusive lease on an open document. Closes the host when dropped.
pub struct Session<'h, H: DocumentHost + ?Sized> {
    host: &'h mut H,
    path: PathBuf,
}

impl<'h, H: DocumentHost + ?Sized> Session<'h, H> {
    /// Open `path` on `host`. A failed open still triggers the matching
    /// `close` before the error is returned.
    pub fn open(host: &'h mut H, path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening document");
        if let Err(err) = host.open(path) {
            if let Err(close_err) = host.close() {
                warn!(path = %path.display(), error = %close_err, "teardown after failed open");
            }
            return Err(err);
        }
        Ok(Self {
            host,
            path: path.to_path_buf(),
        })
    }

    pub fn host(&self) -> &H {
        &*self.host
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<H: DocumentHost + ?Sized> Drop for Session<'_, H> {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "closing document");
        if let Err(err) = self.host.close() {
            warn!(path = %self.path.display(), error = %err, "failed to close document");
        }
    }
}
