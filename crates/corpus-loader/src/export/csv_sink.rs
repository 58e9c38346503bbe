//! CSV export

use std::ops::Range;

use super::ChunkSink;
use crate::error::{Error, Result};
use crate::types::{Corpus, Value};

/// Writes rows as CSV into an in-memory buffer
pub(super) struct CsvSink {
    writer: csv::Writer<Vec<u8>>,
}

impl CsvSink {
    pub fn new() -> Self {
        Self {
            writer: csv::Writer::from_writer(Vec::new()),
        }
    }
}

impl ChunkSink for CsvSink {
    fn write_chunk(&mut self, corpus: &Corpus, rows: Range<usize>) -> Result<()> {
        let table = corpus.table();
        if rows.start == 0 {
            self.writer.write_record(table.column_names())?;
        }
        for index in rows {
            let row = table
                .row(index)
                .ok_or_else(|| Error::export(format!("row {} out of range", index)))?;
            self.writer.write_record(row.into_iter().map(Value::to_text))?;
        }
        Ok(())
    }

    fn finish(self: Box<Self>, _corpus: &Corpus) -> Result<Vec<u8>> {
        self.writer
            .into_inner()
            .map_err(|e| Error::export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::IngestConfig;
    use crate::export::tests::corpus_with_rows;
    use crate::export::{ExportEngine, ExportFormat};
    use crate::ingestion::LoaderStrategy;
    use crate::types::{Column, Corpus, DataType, FileReference, Table, Value};
    use tempfile::TempDir;

    #[test]
    fn test_csv_layout() {
        let corpus = corpus_with_rows(3);
        let bytes = ExportEngine::default().export(&corpus, ExportFormat::Csv).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "document,year\ndoc 0,2000\ndoc 1,\ndoc 2,2002\n"
        );
    }

    #[test]
    fn test_csv_round_trip_through_loader() {
        let corpus = corpus_with_rows(4);
        let bytes = ExportEngine::default().export(&corpus, ExportFormat::Csv).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, bytes).unwrap();
        let file = FileReference::new(path.to_string_lossy());

        let config = IngestConfig::default();
        let strategy = LoaderStrategy::for_file(&file).unwrap();
        let headers = strategy.infer_headers(&file, &config).unwrap();
        assert_eq!(
            headers.iter().map(|h| h.signature()).collect::<Vec<_>>(),
            vec![("document", DataType::Text, true), ("year", DataType::Integer, true)]
        );

        let table = strategy.load(&file, &headers, &config).unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column("document").unwrap().values, corpus.documents().values);
        assert_eq!(
            table.column("year").unwrap().values,
            vec![Value::Integer(2000), Value::Null, Value::Integer(2002), Value::Null]
        );
    }

    #[test]
    fn test_all_text_corpus_round_trip() {
        let table = Table::from_columns(vec![
            Column::new(
                "document",
                DataType::Text,
                vec![Value::Text("Dear Ann".into()), Value::Text("Dear Bo".into())],
            ),
            Column::new(
                "filename",
                DataType::Text,
                vec![Value::Text("ann".into()), Value::Text("bo".into())],
            ),
        ])
        .unwrap();
        let corpus = Corpus::new("letters", table, "document").unwrap();
        let bytes = ExportEngine::default().export(&corpus, ExportFormat::Csv).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("letters.csv");
        std::fs::write(&path, bytes).unwrap();
        let file = FileReference::new(path.to_string_lossy());

        let config = IngestConfig::default();
        let headers = LoaderStrategy::Csv.infer_headers(&file, &config).unwrap();
        let names: Vec<&str> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["document", "filename"]);

        let loaded = LoaderStrategy::Csv.load(&file, &headers, &config).unwrap();
        assert_eq!(loaded.row_count(), 2);
        assert_eq!(loaded.column("filename").unwrap().texts(), vec!["ann", "bo"]);
    }
}
