//! Assembled corpus: one document column plus metadata columns

use chrono::{DateTime, Local};
use serde::Serialize;

use super::{Column, Table, Value};
use crate::error::{Error, Result};

/// A named table whose first column holds document text
#[derive(Debug, Clone)]
pub struct Corpus {
    name: String,
    table: Table,
    text_column: String,
    created_at: DateTime<Local>,
}

impl Corpus {
    /// Create a corpus, moving the text column to the front.
    ///
    /// An empty name is replaced by a generated `Corpus-<timestamp>` name.
    pub fn new(name: impl Into<String>, mut table: Table, text_column: impl Into<String>) -> Result<Self> {
        let text_column = text_column.into();
        table.move_to_front(&text_column).map_err(|_| {
            Error::build(format!("text column '{}' not found in corpus", text_column))
        })?;

        let created_at = Local::now();
        let mut name = name.into();
        if name.is_empty() {
            name = generated_name(&created_at);
        }

        Ok(Self {
            name,
            table,
            text_column,
            created_at,
        })
    }

    /// Corpus name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the name. Uniqueness is checked by [`crate::storage::Corpora`].
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Name of the document text column
    pub fn text_column(&self) -> &str {
        &self.text_column
    }

    /// When the corpus was assembled
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    /// Whether the corpus holds no documents
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The full table, text column first
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The document text column
    pub fn documents(&self) -> &Column {
        // The text column is always first; `new` guarantees it exists
        &self.table.columns()[0]
    }

    /// Every column except the document text
    pub fn metas(&self) -> &[Column] {
        &self.table.columns()[1..]
    }

    /// Text of one document
    pub fn document(&self, index: usize) -> Option<String> {
        self.documents().values.get(index).map(Value::to_text)
    }

    /// Short description used for listings
    pub fn summary(&self) -> CorpusSummary {
        let columns = self.table.columns();
        CorpusSummary {
            name: self.name.clone(),
            rows: self.len(),
            headers: columns.iter().map(|c| c.name.clone()).collect(),
            datatypes: columns.iter().map(|c| c.datatype.name().to_string()).collect(),
            first_row: self
                .table
                .row(0)
                .map(|row| row.into_iter().map(Value::to_text).collect())
                .unwrap_or_default(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

fn generated_name(at: &DateTime<Local>) -> String {
    format!("Corpus-{}", at.format("%Y-%m-%d %H:%M:%S%.6f"))
}

/// Listing entry for an assembled corpus
#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    pub name: String,
    pub rows: usize,
    pub headers: Vec<String>,
    pub datatypes: Vec<String>,
    pub first_row: Vec<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn sample_table() -> Table {
        Table::from_columns(vec![
            Column::new("age", DataType::Integer, vec![Value::Integer(30), Value::Integer(41)]),
            Column::new(
                "name",
                DataType::Text,
                vec![Value::Text("Ann".into()), Value::Text("Bo".into())],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_text_column_first() {
        let corpus = Corpus::new("people", sample_table(), "name").unwrap();
        assert_eq!(corpus.table().column_names(), vec!["name", "age"]);
        assert_eq!(corpus.documents().texts(), vec!["Ann", "Bo"]);
        assert_eq!(corpus.metas().len(), 1);
        assert_eq!(corpus.document(1).as_deref(), Some("Bo"));
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_empty_name_generated() {
        let corpus = Corpus::new("", sample_table(), "name").unwrap();
        assert!(corpus.name().starts_with("Corpus-"));
    }

    #[test]
    fn test_missing_text_column() {
        let err = Corpus::new("x", sample_table(), "body").unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[test]
    fn test_summary() {
        let summary = Corpus::new("people", sample_table(), "name").unwrap().summary();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.datatypes, vec!["TEXT", "INTEGER"]);
        assert_eq!(summary.first_row, vec!["Ann", "30"]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["headers"], serde_json::json!(["name", "age"]));
    }
}
