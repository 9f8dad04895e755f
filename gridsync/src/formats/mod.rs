//! All supported on-disk formats for gridsync.
//!
//! This module re-exports the main types for each format and provides
//! the [`FormatType`] enum used to dispatch on a declared file format.

pub mod json;
pub mod markup;
pub mod po;

use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

// Reexporting the formats for easier access
pub use json::Document as JsonDocument;
pub use markup::Element;
pub use po::{Catalog, CatalogEntry};

use crate::Error;

/// Represents all supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// Grouped phrase XML (`.xml`).
    Markup,
    /// Nested-object JSON (`.json`).
    Json,
    /// Gettext catalog (`.po`). Import only.
    Po,
}

/// Implements [`std::fmt::Display`] for [`FormatType`].
///
/// # Example
/// ```rust
/// use gridsync::formats::FormatType;
/// assert_eq!(FormatType::Markup.to_string(), "xml");
/// assert_eq!(FormatType::Json.to_string(), "json");
/// assert_eq!(FormatType::Po.to_string(), "po");
/// ```
impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Implements [`std::str::FromStr`] for [`FormatType`].
///
/// Accepts case-insensitive names, with or without a leading dot.
///
/// # Example
/// ```rust
/// use gridsync::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str("XML").unwrap(), FormatType::Markup);
/// assert_eq!(FormatType::from_str(".po").unwrap(), FormatType::Po);
/// assert!(FormatType::from_str("csv").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match s.as_str() {
            "xml" | "markup" => Ok(FormatType::Markup),
            "json" => Ok(FormatType::Json),
            "po" | "gettext" => Ok(FormatType::Po),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl FormatType {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Markup => "xml",
            FormatType::Json => "json",
            FormatType::Po => "po",
        }
    }

    /// Infers the format from a file's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some(extension) => extension
                .parse()
                .map_err(|_| Error::UnsupportedFormat(format!(".{}", extension))),
            None => Err(Error::UnsupportedFormat(format!(
                "no file extension: {}",
                path.as_ref().display()
            ))),
        }
    }

    /// Whether grid content can be written out in this format.
    pub fn supports_export(&self) -> bool {
        matches!(self, FormatType::Markup | FormatType::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(FormatType::from_path("data/en.xml").unwrap(), FormatType::Markup);
        assert_eq!(FormatType::from_path("en.JSON").unwrap(), FormatType::Json);
        assert_eq!(FormatType::from_path("fr.po").unwrap(), FormatType::Po);
    }

    #[test]
    fn test_from_path_rejects_unknown() {
        assert!(matches!(
            FormatType::from_path("strings.csv"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(FormatType::from_path("README").is_err());
    }

    #[test]
    fn test_export_support() {
        assert!(FormatType::Markup.supports_export());
        assert!(FormatType::Json.supports_export());
        assert!(!FormatType::Po.supports_export());
    }
}
