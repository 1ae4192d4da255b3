// src/csv/header.rs
// Header line -> Schema

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::trim_line_end;
use crate::error::{Result, WatchError};

/// `<name> (<unit>)` with optional whitespace around the parenthesised unit
static RE_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*\(([^)]+)\)\s*$").expect("valid regex"));

const BOM: char = '\u{feff}';

/// One column of the datalog, derived from a header token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// Display label without the unit
    pub name: String,
    /// Unit taken from a trailing "(...)", if any
    pub unit: Option<String>,
    /// Field position in every data row
    pub index: usize,
}

impl ColumnDescriptor {
    /// "Name (unit)" or just "Name"
    pub fn label(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} ({})", self.name, unit),
            None => self.name.clone(),
        }
    }
}

/// Ordered column definitions for one watched file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Schema {
    columns: Vec<ColumnDescriptor>,
}

impl Schema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    /// Position of the first column with this name.
    ///
    /// Names are not unique in the format; later duplicates are only
    /// reachable by index.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names in field order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ColumnDescriptor;
    type IntoIter = std::slice::Iter<'a, ColumnDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Parse the first line of a datalog into a Schema.
///
/// Fails only when the line is empty. Anything that does not look like
/// `Name (unit)` becomes a plain name.
pub fn parse_header(line: &str) -> Result<Schema> {
    let line = trim_line_end(line);
    let line = line.strip_prefix(BOM).unwrap_or(line);

    if line.trim().is_empty() {
        return Err(WatchError::Format("empty header line".to_string()));
    }

    let columns = line
        .split(',')
        .enumerate()
        .map(|(index, token)| parse_token(token, index))
        .collect();

    Ok(Schema { columns })
}

fn parse_token(token: &str, index: usize) -> ColumnDescriptor {
    let (name, unit) = split_token(token);
    ColumnDescriptor { name, unit, index }
}

/// Split a header token into (name, unit)
pub(crate) fn split_token(token: &str) -> (String, Option<String>) {
    let token = token.trim();
    match RE_UNIT.captures(token) {
        Some(caps) => (
            caps[1].trim().to_string(),
            Some(caps[2].trim().to_string()),
        ),
        None => (token.to_string(), None),
    }
}
