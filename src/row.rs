//! The loosely-typed row shape yielded by a [`crate::source::ContactCursor`].
//!
//! A cursor row is one of the fixed mime-type columns (email/phone/...) plus
//! the shared identity columns. Modeled as a column-name-keyed map rather
//! than a concrete struct per mime type, mirroring how the source interface
//! itself is column-oriented (§6).

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: HashMap<&'static str, ColumnValue>,
}

impl Row {
    pub fn new() -> Self {
        Row { columns: HashMap::new() }
    }

    pub fn set(mut self, column: &'static str, value: ColumnValue) -> Self {
        self.columns.insert(column, value);
        self
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        match self.columns.get(column) {
            Some(ColumnValue::Text(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Like [`Row::text`] but returns `""` instead of `None` when the column
    /// is missing or null, for fields that are required but blankable
    /// (e.g. `display_name_primary`).
    pub fn text_or_empty(&self, column: &str) -> String {
        self.text(column).unwrap_or("").to_string()
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        match self.columns.get(column) {
            Some(ColumnValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn int_or(&self, column: &str, default: i64) -> i64 {
        self.int(column).unwrap_or(default)
    }

    pub fn bool(&self, column: &str) -> bool {
        match self.columns.get(column) {
            Some(ColumnValue::Bool(b)) => *b,
            Some(ColumnValue::Int(i)) => *i != 0,
            _ => false,
        }
    }

    pub fn mime_type(&self) -> &str {
        self.text(crate::source::columns::MIME_TYPE).unwrap_or("")
    }
}
