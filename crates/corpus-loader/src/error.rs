//! Error types for corpus loading, assembly and export

use thiserror::Error;

/// Result type alias for corpus loader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Corpus loader errors
///
/// Every variant is recoverable at the call site. Variants that concern a
/// particular file carry its logical path so the caller knows which file to
/// fix or unload.
#[derive(Debug, Error)]
pub enum Error {
    /// File missing or unreadable when added to the registry
    #[error("Error loading file at {path}: {message}")]
    Access { path: String, message: String },

    /// File is not valid UTF-8
    #[error("Error loading file at {path}: file is not UTF-8 encoded")]
    Encoding { path: String },

    /// Format-specific parse or cast failure
    #[error("Error loading file at {path}: {message}")]
    Load { path: String, message: String },

    /// Extension missing or not registered
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Files of one role disagree on their header set
    #[error("Incompatible headers within loaded files: {path} {message}")]
    IncompatibleHeaders { path: String, message: String },

    /// Both roles are populated but a link header is unset
    #[error("Cannot build without link headers set. Select a corpus header and a meta header as linking headers")]
    MissingLinkHeader,

    /// Neither role has headers
    #[error("No corpus headers or metadata headers provided")]
    NothingToBuild,

    /// Assembly failed after loading
    #[error("Build error: {0}")]
    Build(String),

    /// Corpus name already registered
    #[error("Corpus with name '{0}' already exists. Select a different name")]
    DuplicateName(String),

    /// Corpus name rejected
    #[error("Invalid corpus name: {0}")]
    InvalidName(String),

    /// No corpus registered under the name
    #[error("No corpus with name '{0}' found")]
    CorpusNotFound(String),

    /// Unknown export format
    #[error("{0} is not a valid export format")]
    UnsupportedFormat(String),

    /// Export writer failure
    #[error("Export error: {0}")]
    Export(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Zip archive error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl Error {
    /// Create an access error
    pub fn access(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Access {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a load error
    pub fn load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(path: impl Into<String>) -> Self {
        Self::Encoding { path: path.into() }
    }

    /// Create an incompatible headers error
    pub fn incompatible_headers(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IncompatibleHeaders {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }

    /// Attach a file path to an error raised while parsing that file.
    ///
    /// Errors that already name a file are returned unchanged.
    pub fn for_file(self, path: &str) -> Self {
        match self {
            Self::Access { .. }
            | Self::Encoding { .. }
            | Self::Load { .. }
            | Self::UnsupportedFileType(_)
            | Self::IncompatibleHeaders { .. } => self,
            Self::Csv(err) if is_utf8_error(&err) => Self::encoding(path),
            other => Self::load(path, other.to_string()),
        }
    }
}

/// Whether a CSV error was caused by invalid UTF-8
pub(crate) fn is_utf8_error(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Utf8 { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_errors_keep_path() {
        let err = Error::load("data/a.csv", "bad row");
        assert_eq!(err.to_string(), "Error loading file at data/a.csv: bad row");

        let err = Error::encoding("data/b.csv").for_file("other.csv");
        assert!(err.to_string().contains("data/b.csv"));
    }

    #[test]
    fn test_for_file_wraps_generic_errors() {
        let err = Error::build("boom").for_file("data/c.csv");
        match err {
            Error::Load { path, message } => {
                assert_eq!(path, "data/c.csv");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
