//! Configuration loaded from TOML.
//!
//! ```toml
//! data_root = "/data/sas"
//! min_score = 80
//! full_report = false
//! header_rtol = 10.0
//!
//! [paths]
//! mangacube = "{root}/manga/{drpver}/{plate}/manga-{plate}-{ifu}-LOGCUBE.fits"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use skydm_diff::{DiffOptions, DEFAULT_RTOL};
use skydm_fuzzy::DEFAULT_MIN_SCORE;

use crate::error::{ConfigError, ConfigResult};
use crate::resolver::TemplateResolver;

/// Environment variable consulted when `data_root` is not configured.
pub const DATA_ROOT_ENV: &str = "SAS_BASE_DIR";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix for example paths and the `{root}` placeholder.
    pub data_root: Option<PathBuf>,
    /// Minimum fuzzy score for name lookups.
    pub min_score: u8,
    /// Include a line-by-line structure report in every diff.
    pub full_report: bool,
    /// Relative tolerance for floating-point header values.
    pub header_rtol: f64,
    /// Access name to path template.
    pub paths: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: None,
            min_score: DEFAULT_MIN_SCORE,
            full_report: false,
            header_rtol: DEFAULT_RTOL,
            paths: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str, path: &Path) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// The configured data root, else `$SAS_BASE_DIR`, else `.`.
    pub fn data_root(&self) -> PathBuf {
        self.data_root
            .clone()
            .or_else(|| std::env::var_os(DATA_ROOT_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            full: self.full_report,
            rtol: self.header_rtol,
        }
    }

    pub fn resolver(&self) -> TemplateResolver {
        TemplateResolver::new(self.data_root()).with_templates(self.paths.clone())
    }
}
