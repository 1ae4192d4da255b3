// src/csv/mod.rs
// Header and row parsing for comma-separated datalogs
//
// The datalog format has no quoting: every comma separates fields. The first
// line names the columns, optionally with a unit in trailing parentheses,
// e.g. "Engine Speed (rpm)" or "Air/Fuel Sensor #1 (λ)".

pub mod header;
pub mod row;

pub use header::{ColumnDescriptor, Schema, parse_header};
pub use row::{Row, parse_row};

/// Strip a single trailing line terminator ("\n", "\r\n" or stray "\r"s).
pub(crate) fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
