//! CSV and TSV loading with header-row detection

use csv::{ReaderBuilder, StringRecord};

use super::inference::infer_datatype;
use super::sheet::RawSheet;
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::types::{DataType, FileReference, Value};

const BOM: char = '\u{feff}';

/// Read a delimited file into named columns of text values.
///
/// `limit` bounds the number of data rows read.
pub(crate) fn read(
    file: &FileReference,
    delimiter: u8,
    config: &IngestConfig,
    limit: Option<usize>,
) -> Result<RawSheet> {
    // One extra record in case the first one is a header row
    let records = read_records(file, delimiter, limit.map(|l| l + 1))?;
    let Some(first) = records.first() else {
        return Ok(RawSheet::default());
    };

    let width = first.len();
    let has_header = detect_header_row(&records, width, config.sample_rows);
    let (names, data) = if has_header {
        tracing::debug!("Detected header row in {}", file.path());
        let names = first.iter().map(str::to_string).collect();
        (names, &records[1..])
    } else {
        let names = (0..width)
            .map(|i| format!("{}{}", config.synthetic_header_prefix, i))
            .collect();
        let end = limit.map_or(records.len(), |l| l.min(records.len()));
        (names, &records[..end])
    };

    let mut rows = Vec::with_capacity(data.len());
    for (index, record) in data.iter().enumerate() {
        if record.len() > width {
            return Err(Error::load(
                file.path(),
                format!(
                    "row {} has {} fields, expected at most {}",
                    index + 1,
                    record.len(),
                    width
                ),
            ));
        }
        rows.push(record.iter().map(|f| Value::Text(f.to_string())).collect());
    }

    Ok(RawSheet::new(names, rows))
}

fn read_records(file: &FileReference, delimiter: u8, limit: Option<usize>) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(file.open()?);

    let mut records = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|l| records.len() >= l) {
            break;
        }
        records.push(record?);
    }

    if let Some(first) = records.first_mut() {
        if first.get(0).is_some_and(|f| f.starts_with(BOM)) {
            let fields: Vec<&str> = first
                .iter()
                .enumerate()
                .map(|(i, f)| if i == 0 { f.trim_start_matches(BOM) } else { f })
                .collect();
            *first = StringRecord::from(fields);
        }
    }
    Ok(records)
}

/// A header row exists when treating the first record as data changes the
/// inferred datatype of any column.
///
/// When every column infers as TEXT either way, the first record is a header
/// if it has at least one non-empty field and none of its fields recur in
/// the same column of the sampled data.
fn detect_header_row(records: &[StringRecord], width: usize, sample_rows: usize) -> bool {
    let with_header = &records[1..records.len().min(sample_rows + 1)];
    let without_header = &records[..records.len().min(sample_rows)];
    let signature_with = signature(with_header, width);
    if signature_with != signature(without_header, width) {
        return true;
    }
    if with_header.is_empty() || signature_with.iter().any(|dt| *dt != DataType::Text) {
        return false;
    }

    let first = &records[0];
    if first.iter().all(str::is_empty) {
        return false;
    }
    first.iter().enumerate().all(|(i, name)| {
        name.is_empty() || with_header.iter().all(|record| record.get(i) != Some(name))
    })
}

fn signature(records: &[StringRecord], width: usize) -> Vec<DataType> {
    (0..width)
        .map(|i| {
            let values: Vec<Value> = records
                .iter()
                .map(|r| r.get(i).map_or(Value::Null, |f| Value::Text(f.to_string())))
                .collect();
            infer_datatype(&values)
        })
        .collect()
}
