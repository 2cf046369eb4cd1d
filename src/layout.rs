// src/layout.rs

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::catalog::{bulletin_url, Period};

/// `<root>/<year>/<month>` with `raw/` and `interim/` below it.
#[derive(Debug, Clone)]
pub struct DataFolder {
    path: PathBuf,
}

impl DataFolder {
    pub fn new(root: impl AsRef<Path>, period: Period) -> Self {
        let path = root
            .as_ref()
            .join(period.year.to_string())
            .join(period.month.to_string());
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Downloaded source documents. Created on first use.
    pub fn raw(&self) -> Result<PathBuf> {
        self.subfolder("raw")
    }

    /// Extracted table artifacts. Created on first use.
    pub fn interim(&self) -> Result<PathBuf> {
        self.subfolder("interim")
    }

    fn subfolder(&self, name: &str) -> Result<PathBuf> {
        let dir = self.path.join(name);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(dir)
    }
}

/// A bulletin file: where it is published and where it lives locally.
#[derive(Debug, Clone)]
pub struct DocFile {
    pub period: Period,
    pub url: String,
    pub path: PathBuf,
}

impl DocFile {
    pub fn new(root: impl AsRef<Path>, period: Period, file: &str) -> Result<Self> {
        let raw = DataFolder::new(root, period).raw()?;
        Ok(Self {
            period,
            url: bulletin_url(period, file),
            path: raw.join(format!("{file}.doc")),
        })
    }

    /// Sibling `.docx` path, where a converted copy of the bulletin is expected.
    pub fn docx_path(&self) -> PathBuf {
        self.path.with_extension("docx")
    }

    /// File size in KiB, rounded; `None` if not downloaded yet.
    pub fn size_kb(&self) -> Option<u64> {
        fs::metadata(&self.path)
            .ok()
            .map(|m| (m.len() as f64 / 1024.0).round() as u64)
    }
}

/// Location of the table artifact extracted for `target`.
#[derive(Debug, Clone)]
pub struct InterimCsv {
    pub path: PathBuf,
}

impl InterimCsv {
    pub fn new(root: impl AsRef<Path>, period: Period, target: &str) -> Result<Self> {
        let interim = DataFolder::new(root, period).interim()?;
        Ok(Self {
            path: interim.join(format!("{target}.csv")),
        })
    }
}
