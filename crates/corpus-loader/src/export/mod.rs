//! Chunked export of assembled corpora to CSV, XLSX or a zip of documents

mod csv_sink;
mod xlsx_sink;
mod zip_sink;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::types::Corpus;

pub use zip_sink::sanitise_filenames;

/// Supported export formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One CSV file, header row first
    Csv,
    /// One Excel workbook with a single sheet
    Xlsx,
    /// One text file per document plus metadata.csv
    Zip,
}

impl ExportFormat {
    /// Every export format
    pub fn all() -> &'static [ExportFormat] {
        &[Self::Csv, Self::Xlsx, Self::Zip]
    }

    /// File extension for the exported bytes
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "zip" => Ok(Self::Zip),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Rows written so far out of the corpus total
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ExportProgress {
    pub processed: usize,
    pub total: usize,
}

/// Destination for exported rows, written one chunk at a time
trait ChunkSink {
    /// Write the rows in `rows`; chunks arrive in order
    fn write_chunk(&mut self, corpus: &Corpus, rows: Range<usize>) -> Result<()>;

    /// Finalise and return the encoded bytes
    fn finish(self: Box<Self>, corpus: &Corpus) -> Result<Vec<u8>>;
}

/// Serialises corpora in fixed-size row chunks
#[derive(Debug, Clone)]
pub struct ExportEngine {
    chunk_rows: usize,
}

impl Default for ExportEngine {
    fn default() -> Self {
        Self::new(&ExportConfig::default())
    }
}

impl ExportEngine {
    /// Create an engine with the configured chunk size
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            chunk_rows: config.chunk_rows.max(1),
        }
    }

    /// Export a whole corpus in one call
    pub fn export(&self, corpus: &Corpus, format: ExportFormat) -> Result<Vec<u8>> {
        self.exporter(corpus, format)?.finish()
    }

    /// Start a chunked export; iterate it to observe progress
    pub fn exporter<'c>(&self, corpus: &'c Corpus, format: ExportFormat) -> Result<Exporter<'c>> {
        let sink: Box<dyn ChunkSink> = match format {
            ExportFormat::Csv => Box::new(csv_sink::CsvSink::new()),
            ExportFormat::Xlsx => Box::new(xlsx_sink::XlsxSink::new()),
            ExportFormat::Zip => Box::new(zip_sink::ZipSink::new(corpus)?),
        };
        tracing::debug!("Exporting corpus '{}' as {}", corpus.name(), format);

        Ok(Exporter {
            corpus,
            format,
            sink: Some(sink),
            chunk_rows: self.chunk_rows,
            processed: 0,
        })
    }
}

/// An export in progress.
///
/// Each iteration writes one chunk and yields the progress after it.
pub struct Exporter<'c> {
    corpus: &'c Corpus,
    format: ExportFormat,
    sink: Option<Box<dyn ChunkSink>>,
    chunk_rows: usize,
    processed: usize,
}

impl Exporter<'_> {
    /// Total rows to export
    pub fn total(&self) -> usize {
        self.corpus.len()
    }

    /// Write any remaining chunks and return the exported bytes.
    ///
    /// An empty corpus exports as an empty byte vector.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        while let Some(step) = self.next() {
            step?;
        }
        if self.corpus.is_empty() {
            return Ok(Vec::new());
        }
        let sink = self
            .sink
            .take()
            .ok_or_else(|| Error::export("export already failed"))?;
        let bytes = sink.finish(self.corpus)?;

        tracing::info!(
            "Exported corpus '{}' as {} ({} bytes)",
            self.corpus.name(),
            self.format,
            bytes.len()
        );
        Ok(bytes)
    }
}

impl Iterator for Exporter<'_> {
    type Item = Result<ExportProgress>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.total();
        if self.processed >= total {
            return None;
        }
        let sink = self.sink.as_mut()?;

        let end = (self.processed + self.chunk_rows).min(total);
        if let Err(e) = sink.write_chunk(self.corpus, self.processed..end) {
            self.sink = None;
            return Some(Err(e));
        }
        self.processed = end;
        Some(Ok(ExportProgress {
            processed: self.processed,
            total,
        }))
    }
}
