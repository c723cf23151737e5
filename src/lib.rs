// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # needlework
//!
//! Offset-graph serialization for proprietary game-engine binary formats.
//!
//! Containers such as Hedgehog Engine "Mirage" models describe an object graph through
//! relative offsets: pointer fields, `{count, offset}` pointer lists, and sub-objects shared by
//! several pointers. `needlework` decodes such streams into typed graphs and encodes graphs
//! back, writing every shared node exactly once and back-patching every offset.
//!
//! ## Features
//!
//! - **Typed graphs** - Nodes live in per-type arenas and refer to each other through handles
//! - **Identity-preserving round trips** - Shared targets decode to one node and encode once
//! - **Deferred layout** - Bodies first, pointees after, with configurable alignment
//! - **Configurable layout** - Byte order, 32 or 64-bit offsets, origin-relative offsets
//! - **Palette codecs** - GVR RGB5A3, RGB565 and IA8 palettes to and from RGBA
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use needlework::prelude::*;
//! use std::path::Path;
//!
//! let document = Document::<Model>::from_file(Path::new("chr_sonic.model"), FormatConfig::mirage())?;
//! for group in document.root.groups.resolve(&document.graph)?.into_iter().flatten() {
//!     println!("{} meshes", group.len());
//! }
//! # Ok::<(), needlework::Error>(())
//! ```
//!
//! ### Defining a body
//!
//! Any type implementing [`BinaryObject`] can sit behind a pointer:
//!
//! ```rust
//! use needlework::{BinaryObject, Document, FormatConfig, Graph, Pointer, Reader, Result, Sink, Writer};
//!
//! struct Bone {
//!     id: u32,
//!     parent: Pointer<Bone>,
//! }
//!
//! impl BinaryObject for Bone {
//!     fn read(reader: &mut Reader<'_>) -> Result<Self> {
//!         Ok(Bone { id: reader.read()?, parent: reader.read_pointer()? })
//!     }
//!
//!     fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()> {
//!         writer.write(self.id)?;
//!         writer.write_pointer(&self.parent)
//!     }
//! }
//!
//! let mut graph = Graph::new();
//! let root = graph.insert(Bone { id: 0, parent: Pointer::null() });
//! let leaf = Bone { id: 1, parent: root.into() };
//!
//! let bytes = Document::new(leaf, graph).to_bytes(FormatConfig::default())?;
//! let decoded = Document::<Bone>::from_bytes(&bytes, FormatConfig::default())?;
//! let parent = decoded.root.parent.resolve(&decoded.graph)?.unwrap();
//! assert_eq!(parent.id, 0);
//! # Ok::<(), needlework::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`graph`] - Arenas, pointers, the reader and the writer
//! - [`formats`] - Concrete bodies and codecs
//! - [`file`] - Byte sources, sinks and the bounds-checked [`Parser`]
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! Pass boundaries are reported through the [`log`] facade at `debug` level and individual
//! pointer resolutions at `trace` level. No logger is installed by the library.
#[macro_use]
pub(crate) mod error;

mod config;
mod document;

/// Host byte sources, sinks and low-level parsing.
pub mod file;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use needlework::prelude::*;
///
/// let config = FormatConfig::mirage();
/// assert_eq!(config.endianness, Endianness::Big);
/// ```
pub mod prelude;

/// Offset-graph reading and writing.
pub mod graph;

/// Concrete container formats.
pub mod formats;

/// `needlework` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `needlework` Error type
///
/// # Examples
///
/// ```rust
/// use needlework::{Error, FormatConfig, Reader};
///
/// let mut reader = Reader::new(&[0x00, 0x00, 0x00, 0x40], FormatConfig::mirage());
/// match reader.read_pointer::<u32>() {
///     Err(Error::InvalidPointer { target, length, .. }) => {
///         assert_eq!((target, length), (0x40, 4));
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
pub use error::Error;

/// Layout configuration shared by reader and writer.
pub use config::{Endianness, FormatConfig, OffsetWidth};

/// Whole-stream entry point.
pub use document::Document;

/// Graph building blocks.
pub use graph::{
    arena::{Arena, Graph, Handle},
    pointer::{Pointer, PointerList},
    reader::Reader,
    writer::{Finalized, Writer},
    BinaryObject,
};

/// Low-level byte access.
///
/// # Example
///
/// ```rust
/// use needlework::{Endianness, Parser};
///
/// let mut parser = Parser::new(&[0x12, 0x34], Endianness::Big);
/// assert_eq!(parser.read::<u16>()?, 0x1234);
/// # Ok::<(), needlework::Error>(())
/// ```
pub use file::{parser::Parser, sink::Sink, File};
