//! Configuration for the corpus loader

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main corpus loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory that file discovery starts from
    #[serde(default = "default_root_directory")]
    pub root_directory: PathBuf,
    /// Header inference and file loading
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Corpus/metadata assembly
    #[serde(default)]
    pub assembly: AssemblyConfig,
    /// Export configuration
    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root_directory: default_root_directory(),
            ingest: IngestConfig::default(),
            assembly: AssemblyConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Create a configuration rooted at the given directory
    pub fn with_root(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.ingest.sample_rows == 0 {
            return Err(Error::Config("ingest.sample_rows must be at least 1".to_string()));
        }
        if self.export.chunk_rows == 0 {
            return Err(Error::Config("export.chunk_rows must be at least 1".to_string()));
        }
        if self.assembly.meta_suffix.is_empty() {
            return Err(Error::Config("assembly.meta_suffix must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Header inference and file loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Rows (or records) read when inferring headers (default: 10)
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    /// Worksheet to read from spreadsheets; the first sheet when unset
    #[serde(default)]
    pub sheet: Option<String>,
    /// Prefix of generated column names for delimited files without a header row
    #[serde(default = "default_synthetic_header_prefix")]
    pub synthetic_header_prefix: String,
    /// Load files whose name starts with '.'
    #[serde(default)]
    pub include_hidden: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sample_rows: default_sample_rows(),
            sheet: None,
            synthetic_header_prefix: default_synthetic_header_prefix(),
            include_hidden: false,
        }
    }
}

/// Corpus/metadata assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Suffix appended to metadata columns whose name collides with a corpus column
    #[serde(default = "default_meta_suffix")]
    pub meta_suffix: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            meta_suffix: default_meta_suffix(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Rows serialized per chunk (default: 500)
    #[serde(default = "default_chunk_rows")]
    pub chunk_rows: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_rows: default_chunk_rows(),
        }
    }
}

fn default_root_directory() -> PathBuf { PathBuf::from(".") }
fn default_sample_rows() -> usize { 10 }
fn default_synthetic_header_prefix() -> String { "Data_".to_string() }
fn default_meta_suffix() -> String { "_meta".to_string() }
fn default_chunk_rows() -> usize { 500 }
