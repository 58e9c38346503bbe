//! corpus-loader: build text corpora from heterogeneous document files
//!
//! Files (CSV, TSV, XLSX, ODS, DOCX, ODT, TXT, and any of these inside zip
//! archives) are loaded in a corpus role and, optionally, a metadata role.
//! Each role's files are reconciled to a single header list, concatenated,
//! joined on a linking column, and registered as a uniquely named corpus
//! that can be exported as CSV, XLSX or a zip of text documents.

pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod processing;
pub mod session;
pub mod storage;
pub mod types;

pub use config::LoaderConfig;
pub use error::{Error, Result};
pub use export::{ExportEngine, ExportFormat, ExportProgress, Exporter};
pub use ingestion::{IngestionRegistry, LoaderStrategy, Role, SchemaReconciler};
pub use processing::{BuildRequest, CorpusAssembler};
pub use session::CorpusLoader;
pub use storage::Corpora;
pub use types::{
    Column, Corpus, CorpusHeader, CorpusSummary, DataType, FileReference, FileReferenceCache,
    HeaderList, Table, Value,
};
