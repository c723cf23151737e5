//! Whole-stream entry point.
//!
//! A [`crate::Document`] pairs a root object with the [`crate::Graph`] its pointers resolve
//! into. It runs a complete read pass (decode the root at position 0, drain every pointee) or
//! a complete write pass (encode the root, lay out and patch every pointee) in one call.

use std::path::Path;

use crate::{
    file::{sink::FileSink, File},
    graph::{
        arena::Graph,
        reader::Reader,
        writer::{Finalized, Writer},
        BinaryObject,
    },
    FormatConfig, Result, Sink,
};

/// A decoded stream: its root object and every node reachable from it.
///
/// # Examples
///
/// ```rust,no_run
/// use needlework::{formats::mirage::Model, Document, FormatConfig};
/// use std::path::Path;
///
/// let mut document =
///     Document::<Model>::from_file(Path::new("chr_sonic.model"), FormatConfig::mirage())?;
/// document.root.name = "chr_shadow".into();
/// document.save_to_file(Path::new("chr_shadow.model"), FormatConfig::mirage())?;
/// # Ok::<(), needlework::Error>(())
/// ```
#[derive(Debug)]
pub struct Document<T> {
    /// Object decoded at position 0
    pub root: T,
    /// Nodes reachable from `root`
    pub graph: Graph,
}

impl<T: BinaryObject> Document<T> {
    /// Pairs a root with the graph its pointers refer to.
    pub fn new(root: T, graph: Graph) -> Self {
        Document { root, graph }
    }

    /// Decodes a document from `data`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while decoding the root or any node reachable from it.
    pub fn from_bytes(data: &[u8], config: FormatConfig) -> Result<Self> {
        let mut reader = Reader::new(data, config);
        let root = reader.read_object::<T>()?;
        let graph = reader.finish()?;

        Ok(Document { root, graph })
    }

    /// Loads and decodes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] or [`crate::Error::Empty`] if the file cannot be
    /// loaded, and any decoding error otherwise.
    pub fn from_file(path: &Path, config: FormatConfig) -> Result<Self> {
        let file = File::from_file(path)?;
        Self::from_bytes(file.data(), config)
    }

    /// Encodes the document into `sink`, returning it with the offset table.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while encoding or patching.
    pub fn write_to<S: Sink>(&self, config: FormatConfig, sink: S) -> Result<Finalized<S>> {
        let mut writer = Writer::with_sink(&self.graph, config, sink);
        writer.write_object(&self.root)?;
        writer.finalize()
    }

    /// Encodes the document into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while encoding or patching.
    pub fn to_bytes(&self, config: FormatConfig) -> Result<Vec<u8>> {
        Ok(self.write_to(config, Vec::new())?.sink)
    }

    /// Encodes the document into a file at `path`, replacing any existing file.
    ///
    /// The stream goes through a [`FileSink`], so `path` is only replaced once encoding has
    /// succeeded. On error the previous file, if any, is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be written, and any encoding
    /// error otherwise.
    pub fn save_to_file(&self, path: &Path, config: FormatConfig) -> Result<()> {
        let finalized = self.write_to(config, FileSink::create(path)?)?;
        finalized.sink.finalize()?;

        log::debug!("saved {}", path.display());
        Ok(())
    }
}
