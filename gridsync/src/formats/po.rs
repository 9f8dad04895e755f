//! Support for gettext `.po` translation catalogs.
//!
//! Only the pieces the grid needs are read: each entry's `msgid` (the key) and
//! `msgstr` (the value). Plural entries contribute `msgstr[0]`. The header
//! entry and obsolete (`#~`) entries are skipped, comments are ignored.
//! Duplicate keys are kept in file order.

use std::fs::File;
use std::io::{BufRead, Read, Write};
use std::path::Path;

use indoc::indoc;

use crate::{error::Error, traits::Parser};

/// A `.po` catalog as an ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

/// A single translatable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// `msgctxt`, when present. Not part of the key.
    pub context: Option<String>,
    /// `msgid`.
    pub key: String,
    /// `msgstr` (or `msgstr[0]` for plural entries).
    pub value: String,
}

impl CatalogEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        CatalogEntry {
            context: None,
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Catalog { entries }
    }
}

impl FromIterator<(String, String)> for Catalog {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Catalog {
            entries: iter
                .into_iter()
                .map(|(key, value)| CatalogEntry::new(key, value))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Context,
    Id,
    Plural,
    Str,
    OtherPluralStr,
}

#[derive(Debug, Default)]
struct PendingEntry {
    context: Option<String>,
    id: Option<String>,
    value: Option<String>,
}

impl PendingEntry {
    fn has_id(&self) -> bool {
        self.id.is_some()
    }

    fn take_into(&mut self, entries: &mut Vec<CatalogEntry>) {
        let pending = std::mem::take(self);
        let Some(key) = pending.id else {
            return;
        };
        // The header entry has an empty msgid and no context.
        if key.is_empty() && pending.context.is_none() {
            return;
        }
        entries.push(CatalogEntry {
            context: pending.context,
            key,
            value: pending.value.unwrap_or_default(),
        });
    }
}

impl Parser for Catalog {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut entries = Vec::new();
        let mut pending = PendingEntry::default();
        let mut field = Field::None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                pending.take_into(&mut entries);
                field = Field::None;
                continue;
            }

            if trimmed.starts_with('#') {
                // Obsolete entries are entirely `#~` lines, so skipping them drops the entry.
                if pending.has_id() && !trimmed.starts_with("#~") {
                    pending.take_into(&mut entries);
                    field = Field::None;
                }
                continue;
            }

            if trimmed.starts_with('"') {
                let text = parse_quoted(trimmed, line_number)?;
                let target = match field {
                    Field::Context => pending.context.as_mut(),
                    Field::Id => pending.id.as_mut(),
                    Field::Str => pending.value.as_mut(),
                    Field::Plural | Field::OtherPluralStr => continue,
                    Field::None => {
                        return Err(Error::InvalidResource(format!(
                            "line {}: string continuation without a keyword",
                            line_number
                        )));
                    }
                };
                if let Some(target) = target {
                    target.push_str(&text);
                }
                continue;
            }

            let (keyword, rest) = trimmed
                .split_once(char::is_whitespace)
                .map(|(k, r)| (k, r.trim_start()))
                .unwrap_or((trimmed, ""));

            match keyword {
                "msgctxt" => {
                    if pending.has_id() {
                        pending.take_into(&mut entries);
                    }
                    pending.context = Some(parse_quoted(rest, line_number)?);
                    field = Field::Context;
                }
                "msgid" => {
                    if pending.has_id() {
                        pending.take_into(&mut entries);
                    }
                    pending.id = Some(parse_quoted(rest, line_number)?);
                    field = Field::Id;
                }
                "msgid_plural" => {
                    parse_quoted(rest, line_number)?;
                    field = Field::Plural;
                }
                "msgstr" | "msgstr[0]" => {
                    pending.value = Some(parse_quoted(rest, line_number)?);
                    field = Field::Str;
                }
                other if other.starts_with("msgstr[") => {
                    parse_quoted(rest, line_number)?;
                    field = Field::OtherPluralStr;
                }
                other => {
                    return Err(Error::InvalidResource(format!(
                        "line {}: unexpected keyword `{}`",
                        line_number, other
                    )));
                }
            }
        }
        pending.take_into(&mut entries);

        Ok(Catalog { entries })
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut content = String::from(indoc! {r#"
            # This file is automatically generated by gridsync.
            msgid ""
            msgstr ""
            "Content-Type: text/plain; charset=UTF-8\n"

        "#});

        for entry in &self.entries {
            if let Some(context) = &entry.context {
                content.push_str(&format!("msgctxt \"{}\"\n", escape(context)));
            }
            content.push_str(&format!("msgid \"{}\"\n", escape(&entry.key)));
            content.push_str(&format!("msgstr \"{}\"\n\n", escape(&entry.value)));
        }

        writer.write_all(content.as_bytes()).map_err(Error::Io)
    }

    /// BOM-aware file reading, so UTF-16 catalogs decode as well.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path).map_err(Error::Io)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).map_err(Error::Io)?;

        Self::from_str(&decoded)
    }
}

fn parse_quoted(raw: &str, line_number: usize) -> Result<String, Error> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|_| raw.len() >= 2)
        .ok_or_else(|| {
            Error::InvalidResource(format!("line {}: expected a quoted string", line_number))
        })?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0C}'),
            Some('v') => out.push('\u{0B}'),
            Some(other) => out.push(other),
            None => {
                return Err(Error::InvalidResource(format!(
                    "line {}: dangling escape",
                    line_number
                )));
            }
        }
    }
    Ok(out)
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
