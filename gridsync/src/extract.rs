//! Tree-to-records extraction for the import direction.
//!
//! Each source shape is flattened into an ordered list of [`Record`]s whose
//! ids are slash-delimited paths. Malformed nodes are logged and skipped, so
//! extraction never fails. All ids in one result are unique.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    disambiguate::KeyRegistry,
    error::Error,
    formats::{
        Catalog, Element, FormatType, JsonDocument,
        markup::{PHRASE_TAG, TEXT_ATTR},
    },
    traits::Parser,
    types::{Record, join_path},
};

/// A parsed source document of one of the supported shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceTree {
    /// Grouped phrase XML, rooted at the document element.
    Markup(Element),
    /// Nested-object JSON.
    Object(Value),
    /// Flat gettext catalog.
    Catalog(Catalog),
}

impl SourceTree {
    /// Reads a file, picking the parser from its extension.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        Self::read_file_as(path, FormatType::from_path(path)?)
    }

    /// Reads a file with an explicit format.
    pub fn read_file_as<P: AsRef<Path>>(path: P, format: FormatType) -> Result<Self, Error> {
        Ok(match format {
            FormatType::Markup => SourceTree::Markup(Element::read_from(path)?),
            FormatType::Json => SourceTree::Object(JsonDocument::read_from(path)?.root),
            FormatType::Po => SourceTree::Catalog(Catalog::read_from(path)?),
        })
    }

    pub fn format(&self) -> FormatType {
        match self {
            SourceTree::Markup(_) => FormatType::Markup,
            SourceTree::Object(_) => FormatType::Json,
            SourceTree::Catalog(_) => FormatType::Po,
        }
    }

    /// Flattens the tree into records carrying one cell for `column_id`.
    pub fn extract(&self, column_id: &str) -> Vec<Record> {
        match self {
            SourceTree::Markup(root) => extract_markup(column_id, root),
            SourceTree::Object(value) => extract_object(column_id, value),
            SourceTree::Catalog(catalog) => extract_catalog(column_id, catalog),
        }
    }
}

/// Flattens a phrase document. The root element itself contributes no segment.
pub fn extract_markup(column_id: &str, root: &Element) -> Vec<Record> {
    let mut records = Vec::new();
    let mut keys = KeyRegistry::new();
    walk_markup(&mut keys, &mut records, column_id, root, "");
    records
}

fn walk_markup(
    keys: &mut KeyRegistry,
    records: &mut Vec<Record>,
    column_id: &str,
    node: &Element,
    path: &str,
) {
    debug!("Visiting <{}> at '{}'", node.tag, path);

    if node.is_leaf() {
        match node.attr(TEXT_ATTR) {
            Some(_) if path.is_empty() => {
                warn!("Tag {} at document root has no path; skipped.", node.tag);
            }
            Some(text) if node.tag == PHRASE_TAG => {
                let id = keys.resolve(path);
                records.push(Record::single(id, column_id, Value::String(text.to_string())));
            }
            _ => warn!("Tag {} in path {} is not 'phrase' tag.", node.tag, path),
        }
        return;
    }

    for child in &node.children {
        match child.name() {
            Some(name) => {
                let child_path = join_path(path, name);
                walk_markup(keys, records, column_id, child, &child_path);
            }
            None => warn!(
                "Tag {} in path {} does not have 'name' attribute.",
                child.tag, path
            ),
        }
    }
}

/// Flattens a JSON value. Objects contribute their keys as segments and arrays
/// their zero-based indices; everything else is a leaf.
pub fn extract_object(column_id: &str, value: &Value) -> Vec<Record> {
    let mut records = Vec::new();
    let mut keys = KeyRegistry::new();
    walk_object(&mut keys, &mut records, column_id, value, "");
    records
}

fn walk_object(
    keys: &mut KeyRegistry,
    records: &mut Vec<Record>,
    column_id: &str,
    value: &Value,
    path: &str,
) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                walk_object(keys, records, column_id, child, &join_path(path, key));
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                walk_object(keys, records, column_id, child, &join_path(path, &index.to_string()));
            }
        }
        _ if path.is_empty() => {
            warn!("Document root holds no keyed values; nothing to extract.");
        }
        // Empty containers and nulls become blank leaves via `Cell::new`.
        leaf => {
            let id = keys.resolve(path);
            records.push(Record::single(id, column_id, leaf.clone()));
        }
    }
}

/// Turns catalog entries into records, one per entry, keyed by `msgid`.
pub fn extract_catalog(column_id: &str, catalog: &Catalog) -> Vec<Record> {
    let mut keys = KeyRegistry::new();
    catalog
        .entries
        .iter()
        .filter_map(|entry| {
            if entry.key.is_empty() {
                warn!("Catalog entry with an empty key skipped.");
                return None;
            }
            let id = keys.resolve(&entry.key);
            Some(Record::single(id, column_id, Value::String(entry.value.clone())))
        })
        .collect()
}
