//! Host byte sources and sinks.
//!
//! This module is the boundary to the host filesystem. A [`crate::file::File`] owns the bytes
//! a read pass decodes, either memory-mapped from disk or held in memory, and
//! [`crate::file::sink`] provides the seekable outputs a write pass encodes into.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Readable byte source with pluggable backends
//! - [`crate::file::Backend`] - Trait implemented by the memory and memory-mapped backends
//! - [`crate::file::parser::Parser`] - Bounds-checked cursor over a byte slice
//! - [`crate::file::io`] - Endian-aware primitive conversion
//! - [`crate::file::sink::Sink`] - Output supporting append and overwrite
//!
//! # Examples
//!
//! ```rust,no_run
//! use needlework::{file::File, FormatConfig, Reader, formats::mirage::Model};
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("chr_sonic.model"))?;
//! let mut reader = Reader::new(file.data(), FormatConfig::mirage());
//! let model = reader.read_object::<Model>()?;
//! let graph = reader.finish()?;
//! println!("{} mesh groups", model.groups.len());
//! # let _ = graph;
//! # Ok::<(), needlework::Error>(())
//! ```

pub mod io;
pub mod parser;
pub mod sink;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
use memory::Memory;
use physical::Physical;

/// Storage a [`File`] reads its bytes from.
pub trait Backend: Send + Sync {
    /// Returns `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if the range is outside of the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns all bytes.
    fn data(&self) -> &[u8];

    /// Number of bytes held by the backend.
    fn len(&self) -> usize;
}

/// A loaded binary file, ready to be handed to a [`crate::Reader`].
pub struct File {
    data: Box<dyn Backend>,
}

impl File {
    /// Memory-maps the file at `file`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped, and
    /// [`crate::Error::Empty`] if it has no content.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;
        Self::load(input)
    }

    /// Wraps an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] if `data` is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);
        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        log::debug!("loaded {} bytes", data.len());
        Ok(File {
            data: Box::new(data),
        })
    }

    /// Number of bytes in the file
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the file holds no bytes (never the case for a successfully loaded file)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All bytes of the file
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if the range is outside of the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Write;

    #[test]
    fn from_mem() {
        let file = File::from_mem(vec![1, 2, 3]).unwrap();
        assert_eq!(file.len(), 3);
        assert!(!file.is_empty());
        assert_eq!(file.data_slice(1, 2).unwrap(), &[2, 3]);
    }

    #[test]
    fn from_mem_empty() {
        assert!(matches!(File::from_mem(Vec::new()), Err(Error::Empty)));
    }

    #[test]
    fn from_file() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(&[0xAA, 0xBB]).unwrap();
        temp.flush().unwrap();

        let file = File::from_file(temp.path()).unwrap();
        assert_eq!(file.data(), &[0xAA, 0xBB]);
    }
}
