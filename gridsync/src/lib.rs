#![forbid(unsafe_code)]
//! Record/tree transformation engine for syncing localization grids with files.
//!
//! A grid row is a flat [`Record`]: a slash-delimited path id plus column
//! [`Cell`]s. Files are trees: grouped phrase XML, nested JSON objects, or
//! gettext catalogs.
//!
//! - **Import** flattens a parsed [`SourceTree`] into records with unique ids.
//! - **Export** folds pages of raw grid JSON into an [`Accumulator`] tree.
//!
//! # Quick Start
//!
//! ```rust
//! use gridsync::{Accumulator, SourceTree, formats::FormatType};
//! use serde_json::json;
//!
//! // Import: tree -> records
//! let tree = SourceTree::Object(json!({"menu": {"open": "Open"}}));
//! let records = tree.extract("col_en");
//! assert_eq!(records[0].id, "menu/open");
//!
//! // Export: raw pages -> tree
//! let page = vec![json!({"id": "menu/open", "cells": [{"columnId": "col_en", "value": "Open"}]})];
//! let acc = Accumulator::new(FormatType::Json)?.build(&page);
//! assert!(!acc.is_empty());
//! # Ok::<(), gridsync::Error>(())
//! ```

pub mod build;
pub mod disambiguate;
pub mod error;
pub mod extract;
pub mod formats;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    build::Accumulator,
    disambiguate::KeyRegistry,
    error::Error,
    extract::SourceTree,
    formats::FormatType,
    types::{Cell, Record},
};
