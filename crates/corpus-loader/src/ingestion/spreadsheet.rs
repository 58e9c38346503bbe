//! XLSX and ODS loading via calamine

use calamine::{open_workbook_auto, Data, Reader};

use super::sheet::RawSheet;
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::types::table::parse_datetime;
use crate::types::{FileReference, Value};

/// Read the configured (or first) worksheet; the first row names the columns
pub(crate) fn read(file: &FileReference, config: &IngestConfig) -> Result<RawSheet> {
    let resolved = file.resolve()?;
    let mut workbook =
        open_workbook_auto(resolved.path()).map_err(|e| Error::load(file.path(), e.to_string()))?;

    let sheet_name = match &config.sheet {
        Some(name) => name.clone(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::load(file.path(), "workbook has no sheets"))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::load(file.path(), format!("sheet '{}': {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(RawSheet::default());
    };
    let names = header_row.iter().map(|cell| cell_value(cell).to_text()).collect();
    let data = rows.map(|row| row.iter().map(cell_value).collect()).collect();

    tracing::debug!("Read sheet '{}' from {}", sheet_name, file.path());
    Ok(RawSheet::new(names, data))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Boolean(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::Text(dt.to_string())),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::Text(s.clone())),
        other => Value::Text(other.to_string()),
    }
}
