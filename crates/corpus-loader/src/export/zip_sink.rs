//! Zip export: one text file per document plus metadata.csv

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::ops::Range;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::ChunkSink;
use crate::error::{Error, Result};
use crate::ingestion::FILENAME_HEADER;
use crate::types::{Corpus, Value};

const METADATA_FILE: &str = "metadata.csv";
const ORIGINAL_FILENAME_HEADER: &str = "original_filename";
const REMOVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '\'', '<', '>', '|'];

/// Turn arbitrary file names into unique `.txt` names.
///
/// Special characters are stripped and the final extension dropped. A
/// basename already used gets `-0`, `-1`, ... appended. Names left empty
/// become `<fallback>-<index>`.
pub fn sanitise_filenames(names: &[String], fallback: &str) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let stem = match name.rsplit_once('.') {
                Some((stem, _)) => stem,
                None => name.as_str(),
            };
            let mut sanitised = strip_special(stem);
            if sanitised.trim().is_empty() {
                sanitised = format!("{}-{}", fallback, index);
            }

            let mut basename = sanitised.clone();
            let mut suffix = 0;
            while used.contains(&basename) {
                basename = format!("{}-{}", sanitised, suffix);
                suffix += 1;
            }
            used.insert(basename.clone());
            format!("{}.txt", basename)
        })
        .collect()
}

fn strip_special(name: &str) -> String {
    name.chars().filter(|c| !REMOVED_CHARS.contains(c)).collect()
}

/// Writes documents into an in-memory zip archive
pub(super) struct ZipSink {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    filenames: Vec<String>,
    metadata: Vec<u8>,
}

impl ZipSink {
    /// Work out every document file name and the metadata table up front
    pub fn new(corpus: &Corpus) -> Result<Self> {
        let fallback = strip_special(corpus.name());
        let metas = corpus.metas();
        let filename_column = metas.iter().position(|c| c.name == FILENAME_HEADER);

        let mut headers: Vec<String> = metas.iter().map(|c| c.name.clone()).collect();
        let mut cells: Vec<Vec<String>> = metas.iter().map(|c| c.texts()).collect();

        let filenames = match filename_column {
            Some(index) => {
                let originals = cells[index].clone();
                let sanitised = sanitise_filenames(&originals, &fallback);
                if sanitised != originals {
                    let mut original_header = ORIGINAL_FILENAME_HEADER.to_string();
                    while headers.contains(&original_header) {
                        original_header.push('_');
                    }
                    headers.push(original_header);
                    cells.push(originals);
                }
                cells[index] = sanitised.clone();
                sanitised
            }
            None => {
                let generated: Vec<String> = (0..corpus.len())
                    .map(|i| format!("{}-{}.txt", fallback, i))
                    .collect();
                headers.push(FILENAME_HEADER.to_string());
                cells.push(generated.clone());
                generated
            }
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&headers)?;
        for row in 0..corpus.len() {
            writer.write_record(cells.iter().map(|column| column[row].as_str()))?;
        }
        let metadata = writer.into_inner().map_err(|e| Error::export(e.to_string()))?;

        Ok(Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            filenames,
            metadata,
        })
    }
}

impl ChunkSink for ZipSink {
    fn write_chunk(&mut self, corpus: &Corpus, rows: Range<usize>) -> Result<()> {
        let documents = &corpus.documents().values;
        for index in rows {
            let filename = self
                .filenames
                .get(index)
                .ok_or_else(|| Error::export(format!("row {} out of range", index)))?;
            let text = documents.get(index).map(Value::to_text).unwrap_or_default();
            self.zip.start_file(filename.as_str(), SimpleFileOptions::default())?;
            self.zip.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>, _corpus: &Corpus) -> Result<Vec<u8>> {
        self.zip.start_file(METADATA_FILE, SimpleFileOptions::default())?;
        self.zip.write_all(&self.metadata)?;
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}
