// src/csv/row.rs
// Data line -> Row aligned to a Schema

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::header::{ColumnDescriptor, Schema};
use super::trim_line_end;
use crate::error::MalformedRowError;

/// One parsed data line.
///
/// Only `parse_row` builds rows, so `values.len() == schema.len()` always
/// holds.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<String>,
    schema: Arc<Schema>,
    received_at: DateTime<Utc>,
}

impl Row {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// When the line was parsed off the file
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Value of the first column with this name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.schema.position(name).and_then(|i| self.value(i))
    }

    /// Value as a number, for display code that colors or scales readings
    pub fn numeric(&self, index: usize) -> Option<f64> {
        self.value(index).and_then(|v| v.parse::<f64>().ok())
    }

    /// (descriptor, value) pairs in field order
    pub fn fields(&self) -> impl Iterator<Item = (&ColumnDescriptor, &str)> {
        self.schema
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

/// Split a data line into fields aligned to `schema`.
///
/// Empty fields stay as empty strings. A field-count mismatch is reported
/// back to the caller, who decides whether to skip or surface it.
pub fn parse_row(line: &str, schema: &Arc<Schema>) -> Result<Row, MalformedRowError> {
    let trimmed = trim_line_end(line);
    let values: Vec<String> = trimmed
        .split(',')
        .map(|field| field.trim().to_string())
        .collect();

    if values.len() != schema.len() {
        return Err(MalformedRowError {
            expected: schema.len(),
            actual: values.len(),
            raw_line: trimmed.to_string(),
        });
    }

    Ok(Row {
        values,
        schema: Arc::clone(schema),
        received_at: Utc::now(),
    })
}
