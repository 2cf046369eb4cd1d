// src/config.rs

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::mapper::{ColumnScheme, IndicatorSpec};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "gksscraper.yaml";

/// Runtime configuration, read from YAML:
///
/// ```yaml
/// data_root: data
/// columns:
///   1: bln_rub
///   2: yoy
///   3: rog
/// indicators:
///   - label: Индекс промышленного производства
///     name: INDPRO
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_root: PathBuf,
    pub columns: ColumnScheme,
    pub indicators: Vec<IndicatorSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            columns: ColumnScheme::default(),
            indicators: vec![
                IndicatorSpec::new("Индекс промышленного производства", "INDPRO"),
                IndicatorSpec::new("Продукция сельского хозяйства", "AGROPROD"),
            ],
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Config =
            serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        if let Some(bad) = cfg
            .indicators
            .iter()
            .find(|s| s.label.is_empty() || s.name.is_empty())
        {
            return Err(Error::Config(format!(
                "indicator needs both label and name: {bad:?}"
            )));
        }
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let cfg = Self::from_yaml(&text)?;
        info!(path = %path.display(), indicators = cfg.indicators.len(), "loaded config");
        Ok(cfg)
    }

    /// Load `path` if given; otherwise `gksscraper.yaml` when it exists,
    /// else the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}
