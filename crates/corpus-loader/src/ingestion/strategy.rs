//! Format-specific loader strategies and the extension dispatcher

use serde::{Deserialize, Serialize};
use std::fmt;

use super::document::{self, DocumentKind};
use super::{delimited, spreadsheet};
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::types::{CorpusHeader, FileReference, Table};

/// Lower-cased extension to strategy
const EXTENSIONS: &[(&str, LoaderStrategy)] = &[
    ("csv", LoaderStrategy::Csv),
    ("tsv", LoaderStrategy::Tsv),
    ("xlsx", LoaderStrategy::Xlsx),
    ("ods", LoaderStrategy::Ods),
    ("docx", LoaderStrategy::Docx),
    ("odt", LoaderStrategy::Odt),
    ("txt", LoaderStrategy::Txt),
];

/// How a file format is turned into headers and rows
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoaderStrategy {
    /// Comma separated values
    Csv,
    /// Tab separated values
    Tsv,
    /// Excel workbook
    Xlsx,
    /// OpenDocument spreadsheet
    Ods,
    /// Word document
    Docx,
    /// OpenDocument text
    Odt,
    /// Plain UTF-8 text
    Txt,
}

impl LoaderStrategy {
    /// Select the strategy for a file by its extension
    pub fn for_file(file: &FileReference) -> Result<Self> {
        if file.extension().is_empty() {
            return Err(Error::UnsupportedFileType(format!(
                "{} has no file extension",
                file.path()
            )));
        }
        let extension = file.extension_lower();
        Self::from_extension(&extension).ok_or_else(|| {
            Error::UnsupportedFileType(format!(
                "{} has extension '{}'. Valid file types: {}",
                file.path(),
                extension,
                Self::accepted_extensions().join(", ")
            ))
        })
    }

    /// Strategy for a lower-cased extension, if registered
    pub fn from_extension(extension: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, strategy)| *strategy)
    }

    /// Every registered extension
    pub fn accepted_extensions() -> Vec<&'static str> {
        EXTENSIONS.iter().map(|(ext, _)| *ext).collect()
    }

    /// Extension this strategy is registered under
    pub fn extension(&self) -> &'static str {
        EXTENSIONS
            .iter()
            .find(|(_, strategy)| strategy == self)
            .map(|(ext, _)| *ext)
            .unwrap_or_default()
    }

    /// Whether one file becomes exactly one row
    pub fn is_document(&self) -> bool {
        self.document_kind().is_some()
    }

    /// Propose headers from a bounded sample of the file
    pub fn infer_headers(&self, file: &FileReference, config: &IngestConfig) -> Result<Vec<CorpusHeader>> {
        let headers = match self {
            Self::Csv | Self::Tsv => {
                delimited::read(file, self.delimiter(), config, Some(config.sample_rows))
                    .map(|sheet| sheet.infer_headers(config.sample_rows))
            }
            Self::Xlsx | Self::Ods => {
                spreadsheet::read(file, config).map(|sheet| sheet.infer_headers(config.sample_rows))
            }
            Self::Docx | Self::Odt | Self::Txt => Ok(document::headers()),
        }
        .map_err(|e| e.for_file(file.path()))?;

        tracing::debug!("Inferred {} headers for {}", headers.len(), file.path());
        Ok(headers)
    }

    /// Load the whole file as a table of the included headers
    pub fn load(&self, file: &FileReference, headers: &[CorpusHeader], config: &IngestConfig) -> Result<Table> {
        let table = match (self, self.document_kind()) {
            (_, Some(kind)) => document::load(file, kind, headers),
            (Self::Csv | Self::Tsv, None) => delimited::read(file, self.delimiter(), config, None)
                .and_then(|sheet| sheet.into_table(file.path(), headers)),
            (_, None) => spreadsheet::read(file, config)
                .and_then(|sheet| sheet.into_table(file.path(), headers)),
        }
        .map_err(|e| e.for_file(file.path()))?;

        tracing::debug!("Loaded {} rows from {}", table.row_count(), file.path());
        Ok(table)
    }

    fn delimiter(&self) -> u8 {
        match self {
            Self::Tsv => b'\t',
            _ => b',',
        }
    }

    fn document_kind(&self) -> Option<DocumentKind> {
        match self {
            Self::Docx => Some(DocumentKind::Docx),
            Self::Odt => Some(DocumentKind::Odt),
            Self::Txt => Some(DocumentKind::Txt),
            _ => None,
        }
    }
}

impl fmt::Display for LoaderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::file_reference::test_support::write_zip;
    use crate::types::{DataType, FileReferenceCache};
    use tempfile::TempDir;

    #[test]
    fn test_dispatch_by_extension() {
        assert_eq!(
            LoaderStrategy::for_file(&FileReference::new("a/B.CSV")).unwrap(),
            LoaderStrategy::Csv
        );
        assert_eq!(
            LoaderStrategy::for_file(&FileReference::new("notes.Odt")).unwrap(),
            LoaderStrategy::Odt
        );

        let err = LoaderStrategy::for_file(&FileReference::new("README")).unwrap_err();
        assert!(err.to_string().contains("README"));

        let err = LoaderStrategy::for_file(&FileReference::new("scan.pdf")).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
        assert!(message.contains("csv, tsv, xlsx, ods, docx, odt, txt"));
    }

    #[test]
    fn test_load_restricts_and_orders_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name,age,city\nAnn,30,Perth\nBo,41,Hobart\n").unwrap();
        let file = FileReference::new(path.to_string_lossy());

        let strategy = LoaderStrategy::for_file(&file).unwrap();
        let config = IngestConfig::default();
        let mut headers = strategy.infer_headers(&file, &config).unwrap();
        headers[2].include = false;
        headers.swap(0, 1);

        let table = strategy.load(&file, &headers, &config).unwrap();
        assert_eq!(table.column_names(), vec!["age", "name"]);
        assert_eq!(table.column("age").unwrap().datatype, DataType::Integer);
    }

    #[test]
    fn test_archive_member_loads() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bundle.zip");
        write_zip(&archive, &[("inner/people.csv", b"name,age\nCy,19\n")]);

        let mut cache = FileReferenceCache::new();
        let members = cache.expand(&archive.to_string_lossy()).unwrap();
        let file = &members[0];
        let strategy = LoaderStrategy::for_file(file).unwrap();
        let config = IngestConfig::default();
        let headers = strategy.infer_headers(file, &config).unwrap();
        let table = strategy.load(file, &headers, &config).unwrap();
        assert_eq!(table.column("name").unwrap().texts(), vec!["Cy"]);
    }

    #[test]
    fn test_load_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ages.csv");
        std::fs::write(&path, "name,age,score\nAnn,thirty,1.5\n").unwrap();
        let file = FileReference::new(path.to_string_lossy());

        let headers = vec![
            CorpusHeader::new("name", DataType::Text),
            CorpusHeader::new("age", DataType::Integer),
        ];
        let err = LoaderStrategy::Csv
            .load(&file, &headers, &IngestConfig::default())
            .unwrap_err();
        match err {
            Error::Load { path, message } => {
                assert_eq!(path, file.path());
                assert!(message.contains("thirty"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
