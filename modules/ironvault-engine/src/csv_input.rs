//! CSV upload decoding. Cells stay strings; numeric coercion happens in
//! validation so CSV and JSON inputs follow one rule set.

use ironvault_common::{RawLoan, REQUIRED_FIELDS};
use serde_json::Value;

use crate::error::InputFormatError;

#[derive(Debug, Clone, PartialEq)]
pub struct CsvBatch {
    pub headers: Vec<String>,
    pub rows: Vec<RawLoan>,
}

impl CsvBatch {
    /// Required columns absent from the header, in required-field order.
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_FIELDS
            .iter()
            .filter(|field| !self.headers.iter().any(|h| h == *field))
            .map(|field| field.to_string())
            .collect()
    }
}

/// Decode a UTF-8 CSV document with a header row.
///
/// Short rows are kept with their trailing cells absent so validation rejects
/// just that row. Rows wider than the header make the document unparsable.
pub fn parse_csv(content: &[u8]) -> Result<CsvBatch, InputFormatError> {
    let text = std::str::from_utf8(content)
        .map_err(|e| InputFormatError::Unparsable(format!("invalid UTF-8: {e}")))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| InputFormatError::Unparsable(e.to_string()))?
        .iter()
        .map(ToString::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(InputFormatError::Unparsable(
            "No columns to parse from file".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| InputFormatError::Unparsable(format!("record {}: {e}", i + 1)))?;
        if record.len() > headers.len() {
            return Err(InputFormatError::Unparsable(format!(
                "record {}: expected {} fields, saw {}",
                i + 1,
                headers.len(),
                record.len()
            )));
        }
        let mut row = RawLoan::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), Value::String(cell.to_string()));
        }
        rows.push(row);
    }

    Ok(CsvBatch { headers, rows })
}
