//! Where a dataset's bytes come from.

use std::borrow::Cow;
use std::path::PathBuf;

use crate::LoadError;

/// Demo incident export, embedded at compile time.
const DEMO_CSV: &[u8] = include_bytes!("../data/demo.csv");

/// A CSV input with a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// The bundled demo export.
    Demo,
    /// A CSV file on disk.
    File(PathBuf),
    /// An in-memory upload buffer.
    Upload {
        /// Original file name, used for log messages.
        name: String,
        /// Raw file contents.
        bytes: Vec<u8>,
    },
}

impl DataSource {
    /// Creates an upload source from a name and its contents.
    #[must_use]
    pub fn upload(name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Upload {
            name: name.to_owned(),
            bytes: bytes.into(),
        }
    }

    /// Returns the source's bytes, reading from disk for [`Self::File`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read.
    pub fn read(&self) -> Result<Cow<'_, [u8]>, LoadError> {
        match self {
            Self::Demo => Ok(Cow::Borrowed(DEMO_CSV)),
            Self::File(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                }),
            Self::Upload { bytes, .. } => Ok(Cow::Borrowed(bytes.as_slice())),
        }
    }

    /// Human-readable label for log messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Demo => "demo".to_string(),
            Self::File(path) => path.display().to_string(),
            Self::Upload { name, .. } => format!("upload:{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_source_has_header() {
        let bytes = DataSource::Demo.read().unwrap();
        assert!(bytes.starts_with(b"Dates,Category"));
    }

    #[test]
    fn upload_borrows_its_buffer() {
        let source = DataSource::upload("mine.csv", b"a,b\n1,2\n".to_vec());
        assert!(matches!(source.read().unwrap(), Cow::Borrowed(_)));
        assert_eq!(source.label(), "upload:mine.csv");
    }

    #[test]
    fn missing_file_is_io_error() {
        let source = DataSource::File(PathBuf::from("/definitely/not/here.csv"));
        let err = source.read().unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "{err:?}");
    }
}
