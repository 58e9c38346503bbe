//! File ingestion: format strategies, header inference and the file registry

mod delimited;
pub mod document;
mod inference;
mod reconciler;
mod registry;
mod sheet;
mod spreadsheet;
mod strategy;

pub use document::{DOCUMENT_HEADER, FILENAME_HEADER, FILEPATH_HEADER};
pub use inference::infer_datatype;
pub use reconciler::SchemaReconciler;
pub use registry::{IngestionRegistry, Role};
pub use strategy::LoaderStrategy;
