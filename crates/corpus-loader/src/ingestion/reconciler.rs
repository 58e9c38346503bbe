//! Agreeing on one header list for all files of a role

use std::collections::HashSet;
use std::sync::Arc;

use super::LoaderStrategy;
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::types::{CorpusHeader, DataType, FileReference};

/// Infers a single header list from a set of files
#[derive(Debug, Clone, Copy)]
pub struct SchemaReconciler<'a> {
    config: &'a IngestConfig,
}

impl<'a> SchemaReconciler<'a> {
    /// Create a reconciler using the given ingest settings
    pub fn new(config: &'a IngestConfig) -> Self {
        Self { config }
    }

    /// Headers of the first file, provided every other file proposes the
    /// same set of (name, datatype, include) triples.
    pub fn infer(&self, files: &[Arc<FileReference>]) -> Result<Vec<CorpusHeader>> {
        let Some((first, rest)) = files.split_first() else {
            return Ok(Vec::new());
        };

        let headers = self.headers_for(first)?;
        let expected = signature_set(&headers);
        for file in rest {
            let other = self.headers_for(file)?;
            if signature_set(&other) != expected {
                tracing::warn!("Headers of {} differ from {}", file.path(), first.path());
                return Err(Error::incompatible_headers(
                    file.path(),
                    format!(
                        "has headers {} but {} has {}. No merge of columns is attempted",
                        describe(&other),
                        first.path(),
                        describe(&headers)
                    ),
                ));
            }
        }
        Ok(headers)
    }

    fn headers_for(&self, file: &FileReference) -> Result<Vec<CorpusHeader>> {
        LoaderStrategy::for_file(file)?.infer_headers(file, self.config)
    }
}

fn signature_set(headers: &[CorpusHeader]) -> HashSet<(String, DataType, bool)> {
    headers
        .iter()
        .map(|h| (h.name.clone(), h.datatype, h.include))
        .collect()
}

fn describe(headers: &[CorpusHeader]) -> String {
    let parts: Vec<String> = headers
        .iter()
        .map(|h| format!("{}:{}", h.name, h.datatype))
        .collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn csv(dir: &TempDir, name: &str, content: &str) -> Arc<FileReference> {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        Arc::new(FileReference::new(path.to_string_lossy()))
    }

    #[test]
    fn test_empty_input() {
        let config = IngestConfig::default();
        assert!(SchemaReconciler::new(&config).infer(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let dir = TempDir::new().unwrap();
        let a = csv(&dir, "a.csv", "name,age\nAnn,30\n");
        let b = csv(&dir, "b.csv", "age,name\n41,Bo\n");

        let config = IngestConfig::default();
        let headers = SchemaReconciler::new(&config).infer(&[a, b]).unwrap();
        let names: Vec<&str> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn test_differing_types_rejected() {
        let dir = TempDir::new().unwrap();
        let a = csv(&dir, "a.csv", "name,age\nAnn,30\n");
        let b = csv(&dir, "b.csv", "name,age\nBo,4.5\n");

        let config = IngestConfig::default();
        let err = SchemaReconciler::new(&config).infer(&[a, b.clone()]).unwrap_err();
        match err {
            Error::IncompatibleHeaders { path, message } => {
                assert_eq!(path, b.path());
                assert!(message.contains("No merge"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mixed_document_formats_agree() {
        let dir = TempDir::new().unwrap();
        let a = csv(&dir, "a.txt", "first");
        let b = csv(&dir, "b.TXT", "second");

        let config = IngestConfig::default();
        let headers = SchemaReconciler::new(&config).infer(&[a, b]).unwrap();
        assert_eq!(headers.len(), 3);
    }
}
