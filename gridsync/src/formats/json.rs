//! Support for nested-object JSON localization files.
//!
//! Keys nest by path segment; leaves are scalars:
//!
//! ```json
//! {
//!     "menu": {
//!         "open": "Open"
//!     }
//! }
//! ```

use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};

use crate::{error::Error, traits::Parser};

/// A parsed JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Value,
}

impl Document {
    pub fn new(root: Value) -> Self {
        Document { root }
    }
}

impl Parser for Document {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let root = serde_json::from_reader(reader)?;
        Ok(Document { root })
    }

    /// Writes with a 4-space indent and sorted object keys.
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        write_pretty(&self.root, writer)
    }
}

/// Serializes any value the way documents are written: 4-space indent,
/// keys sorted at every level, non-ASCII kept as is, trailing newline.
///
/// In-memory maps keep document order.
pub fn write_pretty<T, W>(value: &T, mut writer: W) -> Result<(), Error>
where
    T: Serialize + ?Sized,
    W: Write,
{
    let value = sort_keys(serde_json::to_value(value)?);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, child)| (key, sort_keys(child)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
