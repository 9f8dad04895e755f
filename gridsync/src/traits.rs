//! Read/write plumbing shared by the on-disk document codecs.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Cursor, Write},
    path::Path,
};

use crate::error::Error;

/// One on-disk document type: markup, JSON or a PO catalog.
///
/// Codecs implement [`Parser::from_reader`] and [`Parser::to_writer`]; file
/// and string entry points are derived from those.
///
/// ```rust,no_run
/// use gridsync::traits::Parser;
/// let catalog = gridsync::formats::po::Catalog::read_from("fr.po")?;
/// catalog.write_to("fr_copy.po")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser: Sized {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>;

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Opens and parses `path`.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Creates or truncates `path`. The buffer is flushed before returning so
    /// write failures surface here.
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::from_reader(Cursor::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{Catalog, CatalogEntry, JsonDocument};

    #[test]
    fn test_write_to_then_read_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fr.po");
        Catalog::new(vec![CatalogEntry::new("menu/open", "Ouvrir")])
            .write_to(&path)
            .unwrap();

        let catalog = Catalog::read_from(&path).unwrap();
        assert_eq!(catalog.entries[0].key, "menu/open");
        assert_eq!(catalog.entries[0].value, "Ouvrir");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonDocument::read_from(dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
