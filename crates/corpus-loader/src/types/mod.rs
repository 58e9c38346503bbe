//! Core types for corpus loading

pub mod corpus;
pub mod file_reference;
pub mod header;
pub mod table;

pub use corpus::{Corpus, CorpusSummary};
pub use file_reference::{FileReference, FileReferenceCache, ResolvedFile};
pub use header::{CorpusHeader, DataType, HeaderList};
pub use table::{Column, Table, Value};
