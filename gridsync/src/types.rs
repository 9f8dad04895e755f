//! The flat record model exchanged with the grid service.
//! Extractors produce these; the import loop uploads them.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between path segments in a record id.
pub const PATH_SEPARATOR: char = '/';

/// One grid row addressed by a slash-delimited path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    /// Unique leaf address, e.g. `"menu/file/open"`.
    pub id: String,

    /// `id` without its last segment. Empty for single-segment ids.
    pub path: String,

    /// Column values attached to this row.
    pub cells: Vec<Cell>,
}

impl Record {
    /// Creates a record, deriving `path` from `id`.
    pub fn new(id: impl Into<String>, cells: Vec<Cell>) -> Self {
        let id = id.into();
        let path = parent_path(&id).to_string();
        Record { id, path, cells }
    }

    /// Creates a record holding a single cell.
    pub fn single(id: impl Into<String>, column_id: impl Into<String>, value: Value) -> Self {
        Self::new(id, vec![Cell::new(column_id, value)])
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A single column value of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub column_id: String,
    pub value: Value,
}

impl Cell {
    /// Creates a cell. `null` (and any non-scalar) is stored as an explicit empty string.
    pub fn new(column_id: impl Into<String>, value: Value) -> Self {
        Cell {
            column_id: column_id.into(),
            value: normalize_scalar(value),
        }
    }

    /// Returns the value as text, the way it is written into markup attributes.
    pub fn text(&self) -> String {
        scalar_to_text(&self.value)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_id)
    }
}

/// Returns `id` with its last segment removed.
///
/// ```rust
/// use gridsync::types::parent_path;
/// assert_eq!(parent_path("a/b/c"), "a/b");
/// assert_eq!(parent_path("leaf"), "");
/// ```
pub fn parent_path(id: &str) -> &str {
    match id.rfind(PATH_SEPARATOR) {
        Some(index) => &id[..index],
        None => "",
    }
}

/// Appends a segment to a path, without a leading separator for the first one.
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", parent, PATH_SEPARATOR, segment)
    }
}

pub(crate) fn normalize_scalar(value: Value) -> Value {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => value,
        _ => Value::String(String::new()),
    }
}

pub(crate) fn scalar_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
