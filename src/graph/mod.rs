//! Offset-graph serialization.
//!
//! Binary containers in this family describe an object graph through relative offsets: a
//! pointer is an offset field, a list of pointers is a `{count, offset}` header leading to a run
//! of offset fields, and several pointers may lead to the same bytes. This module turns such
//! streams into typed graphs and back.
//!
//! # Key Components
//!
//! - [`crate::graph::arena::Graph`] - Typed arenas holding every decoded node
//! - [`crate::graph::pointer::Pointer`] / [`crate::graph::pointer::PointerList`] - Edges
//! - [`crate::graph::reader::Reader`] - Decodes a stream, deduplicating shared targets
//! - [`crate::graph::writer::Writer`] - Encodes a graph, deferring and back-patching offsets
//! - [`crate::graph::BinaryObject`] - Implemented by every type that can sit behind a pointer
//!
//! # Architecture
//!
//! Both directions work "body first, pointees after". A reader decodes the fixed-size body of
//! an object, reserving a handle for every non-null pointer it meets; the targets are decoded
//! afterwards from a FIFO queue. A writer emits the body with placeholder offsets and lays out
//! the targets afterwards, patching each placeholder once its target has a position. Shared
//! nodes are identified by position on read and by handle on write, so sharing survives a
//! round trip.

pub mod arena;
pub mod pointer;
pub mod reader;
pub mod writer;

use crate::{file::sink::Sink, Result};
use reader::Reader;
use writer::Writer;

/// A type with a fixed on-disk body that can be the target of a pointer.
///
/// Implementations read and write their fields in declaration order. Pointer fields go through
/// [`Reader::read_pointer`] / [`Writer::write_pointer`] and friends; the framework takes care
/// of deduplication, deferral and back-patching.
///
/// # Examples
///
/// ```rust
/// use needlework::{BinaryObject, Pointer, Reader, Result, Sink, Writer};
///
/// struct Bone {
///     id: u32,
///     parent: Pointer<Bone>,
/// }
///
/// impl BinaryObject for Bone {
///     fn read(reader: &mut Reader<'_>) -> Result<Self> {
///         Ok(Bone {
///             id: reader.read()?,
///             parent: reader.read_pointer()?,
///         })
///     }
///
///     fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()> {
///         writer.write(self.id)?;
///         writer.write_pointer(&self.parent)
///     }
/// }
/// ```
pub trait BinaryObject: Sized + 'static {
    /// Decodes the body at the reader's cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is truncated or malformed.
    fn read(reader: &mut Reader<'_>) -> Result<Self>;

    /// Encodes the body at the writer's cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced handle is missing from the graph or the sink fails.
    fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()>;
}

macro_rules! impl_binary_object {
    ($($ty:ty),*) => {
        $(
            impl BinaryObject for $ty {
                fn read(reader: &mut Reader<'_>) -> Result<Self> {
                    reader.read::<$ty>()
                }

                fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()> {
                    writer.write(*self)
                }
            }
        )*
    };
}

impl_binary_object!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);
