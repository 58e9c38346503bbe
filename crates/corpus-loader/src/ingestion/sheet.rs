//! Untyped rows read from a tabular file, before casting

use std::collections::HashSet;

use super::inference::infer_datatype;
use crate::error::{Error, Result};
use crate::types::{Column, CorpusHeader, Table, Value};

/// Named columns and raw cell values read from one sheet or delimited file
#[derive(Debug, Default)]
pub(crate) struct RawSheet {
    pub(super) names: Vec<String>,
    pub(super) rows: Vec<Vec<Value>>,
}

impl RawSheet {
    /// Blank names become `Unnamed: <index>`; repeated names get `.1`, `.2`, ...
    pub fn new(names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let base = if name.trim().is_empty() {
                    format!("Unnamed: {}", i)
                } else {
                    name
                };
                let mut candidate = base.clone();
                let mut n = 1;
                while !seen.insert(candidate.clone()) {
                    candidate = format!("{}.{}", base, n);
                    n += 1;
                }
                candidate
            })
            .collect();
        Self { names, rows }
    }

    /// Headers with datatypes inferred from the first `sample_rows` rows
    pub fn infer_headers(&self, sample_rows: usize) -> Vec<CorpusHeader> {
        let sample = &self.rows[..self.rows.len().min(sample_rows)];
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<Value> = sample
                    .iter()
                    .map(|row| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect();
                CorpusHeader::new(name.clone(), infer_datatype(&values))
            })
            .collect()
    }

    /// Cast every included header's column and assemble a table.
    ///
    /// Columns follow header-list order. Missing cells are null.
    pub fn into_table(mut self, path: &str, headers: &[CorpusHeader]) -> Result<Table> {
        let mut columns = Vec::new();
        for header in headers.iter().filter(|h| h.include) {
            let index = self
                .names
                .iter()
                .position(|n| *n == header.name)
                .ok_or_else(|| Error::load(path, format!("column '{}' not found", header.name)))?;

            let mut values = Vec::with_capacity(self.rows.len());
            for (row_number, row) in self.rows.iter_mut().enumerate() {
                let raw = row
                    .get_mut(index)
                    .map(|cell| std::mem::replace(cell, Value::Null))
                    .unwrap_or(Value::Null);
                let value = raw.cast(header.datatype).map_err(|e| {
                    Error::load(
                        path,
                        format!("column '{}', row {}: {}", header.name, row_number + 1, e),
                    )
                })?;
                values.push(value);
            }
            columns.push(Column::new(header.name.clone(), header.datatype, values));
        }
        Table::with_rows(columns, self.rows.len())
    }
}
