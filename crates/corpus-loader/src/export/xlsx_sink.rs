//! XLSX export via rust_xlsxwriter

use rust_xlsxwriter::{Workbook, XlsxError};
use std::ops::Range;

use super::ChunkSink;
use crate::error::{Error, Result};
use crate::types::Corpus;

/// Longest string Excel stores in one cell, in characters
const MAX_CELL_CHARS: usize = 32_767;

/// Writes rows to the first worksheet of an in-memory workbook
pub(super) struct XlsxSink {
    workbook: Workbook,
}

impl XlsxSink {
    pub fn new() -> Self {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        Self { workbook }
    }
}

impl ChunkSink for XlsxSink {
    fn write_chunk(&mut self, corpus: &Corpus, rows: Range<usize>) -> Result<()> {
        let sheet = self.workbook.worksheet_from_index(0).map_err(xlsx_error)?;
        let columns = corpus.table().columns();

        if rows.start == 0 {
            for (col, column) in columns.iter().enumerate() {
                sheet
                    .write_string(0, sheet_column(col)?, &column.name)
                    .map_err(xlsx_error)?;
            }
        }
        for index in rows {
            // Row 0 holds the header
            let sheet_row = u32::try_from(index + 1)
                .map_err(|_| Error::export(format!("row {} exceeds the worksheet size", index)))?;
            for (col, column) in columns.iter().enumerate() {
                let text = column.values.get(index).map(|v| v.to_text()).unwrap_or_default();
                if text.is_empty() {
                    continue;
                }
                let cell = match truncate_chars(&text, MAX_CELL_CHARS) {
                    Some(truncated) => {
                        tracing::warn!(
                            "Truncated row {} column '{}' to {} characters for XLSX export",
                            index,
                            column.name,
                            MAX_CELL_CHARS
                        );
                        truncated
                    }
                    None => text.as_str(),
                };
                sheet
                    .write_string(sheet_row, sheet_column(col)?, cell)
                    .map_err(xlsx_error)?;
            }
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>, _corpus: &Corpus) -> Result<Vec<u8>> {
        self.workbook.save_to_buffer().map_err(xlsx_error)
    }
}

/// Prefix of `text` holding at most `max` characters, or None if it already fits
fn truncate_chars(text: &str, max: usize) -> Option<&str> {
    text.char_indices().nth(max).map(|(end, _)| &text[..end])
}

fn sheet_column(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::export(format!("column {} exceeds the worksheet width", col)))
}

fn xlsx_error(err: XlsxError) -> Error {
    Error::export(err.to_string())
}
