//! Records-to-tree building for the export direction.
//!
//! Builders fold pages of raw grid records (the JSON objects returned by the
//! records endpoint, each with an `id` and a `cells` array) into a destination
//! tree. The accumulator is moved into every call and handed back, so one
//! tree can collect any number of pages and grids.
//!
//! Export deliberately reads the raw page JSON rather than [`crate::Record`]s.

use std::{fs, path::Path};

use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    error::Error,
    formats::{
        Element, FormatType,
        json::write_pretty,
        markup::{GROUP_TAG, NAME_ATTR, PHRASE_TAG, TEXT_ATTR},
    },
    traits::Parser,
    types::{PATH_SEPARATOR, normalize_scalar, scalar_to_text},
};

/// An in-progress destination tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// A `<texts>` phrase document.
    Markup(Element),
    /// A nested JSON object.
    Object(Map<String, Value>),
}

impl Accumulator {
    /// An empty tree for the given output format.
    pub fn new(format: FormatType) -> Result<Self, Error> {
        match format {
            FormatType::Markup => Ok(Accumulator::Markup(Element::root())),
            FormatType::Json => Ok(Accumulator::Object(Map::new())),
            FormatType::Po => Err(Error::UnsupportedFormat(
                "po files can only be imported".to_string(),
            )),
        }
    }

    pub fn format(&self) -> FormatType {
        match self {
            Accumulator::Markup(_) => FormatType::Markup,
            Accumulator::Object(_) => FormatType::Json,
        }
    }

    /// Folds one page of raw records into the tree.
    pub fn build(self, page: &[Value]) -> Self {
        match self {
            Accumulator::Markup(root) => Accumulator::Markup(build_markup(root, page)),
            Accumulator::Object(root) => Accumulator::Object(build_object(root, page)),
        }
    }

    /// Whether nothing has been added yet.
    pub fn is_empty(&self) -> bool {
        match self {
            Accumulator::Markup(root) => root.children.is_empty(),
            Accumulator::Object(root) => root.is_empty(),
        }
    }

    /// Writes the tree to `path` in its own format.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        match self {
            Accumulator::Markup(root) => root.write_to(path),
            Accumulator::Object(root) => {
                let mut out = Vec::new();
                write_pretty(root, &mut out)?;
                fs::write(path, out).map_err(Error::Io)
            }
        }
    }
}

/// Adds one `<phrase>` per record under `<group>` elements named after the
/// id's leading segments. Existing groups are reused (first match wins).
/// Only the first cell of a record is written; records without cells add
/// nothing.
pub fn build_markup(mut root: Element, page: &[Value]) -> Element {
    for record in page {
        let Some(id) = raw_id(record) else {
            continue;
        };
        let segments: Vec<&str> = id.split(PATH_SEPARATOR).collect();
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };

        let mut group = &mut root;
        for segment in parents.iter().filter(|s| !s.is_empty()) {
            let index = match group.position_of(GROUP_TAG, segment) {
                Some(index) => index,
                None => {
                    group
                        .children
                        .push(Element::new(GROUP_TAG).with_attr(NAME_ATTR, *segment));
                    group.children.len() - 1
                }
            };
            group = &mut group.children[index];
        }

        if let Some(cell) = raw_cells(record).first() {
            let text = scalar_to_text(&raw_value(cell));
            group.children.push(
                Element::new(PHRASE_TAG)
                    .with_attr(NAME_ATTR, *leaf)
                    .with_attr(TEXT_ATTR, text),
            );
        }
    }
    root
}

/// Nests each record under its id's leading segments. A single cell becomes
/// a scalar, several cells an object keyed by column id, no cells an empty
/// string. Values already present are never overwritten.
pub fn build_object(mut root: Map<String, Value>, page: &[Value]) -> Map<String, Value> {
    'records: for record in page {
        let Some(id) = raw_id(record) else {
            continue;
        };
        let segments: Vec<&str> = id.split(PATH_SEPARATOR).collect();
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };

        let mut node = &mut root;
        for segment in parents.iter().filter(|s| !s.is_empty()) {
            let child = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(map) => node = map,
                _ => {
                    warn!(
                        "Record {} descends through value '{}'; skipped.",
                        id, segment
                    );
                    continue 'records;
                }
            }
        }

        let cells = raw_cells(record);
        match cells {
            [] => {
                node.entry(leaf.to_string())
                    .or_insert_with(|| Value::String(String::new()));
            }
            [cell] => {
                node.entry(leaf.to_string())
                    .or_insert_with(|| raw_value(cell));
            }
            _ => {
                let entry = node
                    .entry(leaf.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                let Value::Object(columns) = entry else {
                    warn!("Record {} already holds a single value; extra cells skipped.", id);
                    continue;
                };
                for cell in cells {
                    match cell.get("columnId").and_then(Value::as_str) {
                        Some(column_id) => {
                            columns
                                .entry(column_id.to_string())
                                .or_insert_with(|| raw_value(cell));
                        }
                        None => warn!("Cell without columnId in record {} skipped.", id),
                    }
                }
            }
        }
    }
    root
}

fn raw_id(record: &Value) -> Option<&str> {
    let id = record.get("id").and_then(Value::as_str);
    if id.is_none() {
        warn!("Record without a string id skipped: {}", record);
    }
    id
}

fn raw_cells(record: &Value) -> &[Value] {
    record
        .get("cells")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn raw_value(cell: &Value) -> Value {
    cell.get("value")
        .cloned()
        .map(normalize_scalar)
        .unwrap_or_else(|| Value::String(String::new()))
}
