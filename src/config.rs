//! Configuration loading from vwoptimize.toml and pyproject.toml.
//!
//! - Standalone vwoptimize.toml in the working directory
//! - `[tool.vwoptimize]` section in pyproject.toml as fallback
//!
//! Command-line flags always override file values.
//!
//! ## Example
//!
//! ```toml
//! [tool.vwoptimize]
//! vw = "/opt/vw/bin/vw"
//! workdir = ".vwoptimize"
//! metric = ["acc", "acc_w"]
//! delimiter = "\t"
//! header = true
//! ```

use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;

/// File-level defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// VW executable.
    pub vw: Option<PathBuf>,

    /// Artifact directory.
    pub workdir: Option<PathBuf>,

    /// Metric names, first is primary.
    pub metric: Vec<String>,

    /// Single-character field delimiter.
    pub delimiter: Option<String>,

    /// Input files have a header row.
    pub header: Option<bool>,
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    vw: Option<String>,
    workdir: Option<String>,
    metric: Option<MetricList>,
    delimiter: Option<String>,
    header: Option<bool>,
}

/// `metric = "acc,acc_w"` or `metric = ["acc", "acc_w"]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetricList {
    One(String),
    Many(Vec<String>),
}

/// Wrapper for pyproject.toml structure.
#[derive(Debug, Deserialize)]
struct PyProject {
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize)]
struct PyProjectTool {
    vwoptimize: Option<RawConfig>,
}

impl Config {
    /// Load configuration from the given directory.
    ///
    /// Search order:
    /// 1. vwoptimize.toml in directory
    /// 2. pyproject.toml [tool.vwoptimize] in directory
    /// 3. Default config if nothing found
    pub fn load(directory: &Path) -> Self {
        let standalone = directory.join("vwoptimize.toml");
        if standalone.exists() {
            if let Some(config) = Self::load_standalone(&standalone) {
                return config;
            }
        }

        let pyproject = directory.join("pyproject.toml");
        if pyproject.exists() {
            if let Some(config) = Self::load_pyproject(&pyproject) {
                return config;
            }
        }

        Self::default()
    }

    fn load_standalone(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<RawConfig>(&content) {
            Ok(raw) => Some(Self::from_raw(raw, path.to_path_buf())),
            Err(e) => {
                warn!("ignoring {}: {}", path.display(), e);
                None
            }
        }
    }

    fn load_pyproject(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let pyproject: PyProject = match toml::from_str(&content) {
            Ok(p) => p,
            Err(e) => {
                warn!("ignoring {}: {}", path.display(), e);
                return None;
            }
        };
        let raw = pyproject.tool?.vwoptimize?;
        Some(Self::from_raw(raw, path.to_path_buf()))
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        let metric = match raw.metric {
            Some(MetricList::One(s)) => s
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            Some(MetricList::Many(v)) => v,
            None => Vec::new(),
        };

        Self {
            source: Some(source),
            vw: raw.vw.map(PathBuf::from),
            workdir: raw.workdir.map(PathBuf::from),
            metric,
            delimiter: raw.delimiter,
            header: raw.header,
        }
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref source) = self.source {
            lines.push(format!("   Config: {}", source.display()));
        } else {
            lines.push("   Config: (defaults)".to_string());
        }

        if let Some(ref vw) = self.vw {
            lines.push(format!("   VW: {}", vw.display()));
        }
        if let Some(ref workdir) = self.workdir {
            lines.push(format!("   Workdir: {}", workdir.display()));
        }
        if !self.metric.is_empty() {
            lines.push(format!("   Metric: {}", self.metric.join(",")));
        }
        if let Some(ref delimiter) = self.delimiter {
            lines.push(format!("   Delimiter: {:?}", delimiter));
        }

        lines.join("\n")
    }
}
