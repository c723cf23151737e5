//! Object-graph reader.
//!
//! [`crate::graph::reader::Reader`] wraps a [`crate::Parser`] and turns pointer fields into
//! [`crate::graph::arena::Handle`]s. Resolution is eager but deferred within the pass: reading a
//! pointer validates its target and reserves a handle immediately, while the target's body is
//! decoded once the current body is done ("body first, pointees after"). [`Reader::finish`]
//! drains the queue to a fixed point and hands over the completed [`crate::Graph`].
//!
//! Targets are cached per type and absolute position, so two pointers to the same bytes yield
//! the same handle, forward and backward references alike, and cycles terminate.
//!
//! # Examples
//!
//! ```rust
//! use needlework::{FormatConfig, Reader};
//!
//! // count = 1, offset = 8 -> run of one pointer field -> offset 12 -> u32 value
//! let data = [
//!     0, 0, 0, 1, 0, 0, 0, 8,
//!     0, 0, 0, 12, 0, 0, 0, 42,
//! ];
//! let mut reader = Reader::new(&data, FormatConfig::mirage());
//! let list = reader.read_pointer_list::<u32>()?;
//! let graph = reader.finish()?;
//! assert_eq!(list.resolve(&graph)?, vec![Some(&42)]);
//! # Ok::<(), needlework::Error>(())
//! ```

use std::{
    any::TypeId,
    collections::{HashMap, VecDeque},
};

use crate::{
    file::io::BinaryIO,
    graph::{
        arena::{Graph, Handle},
        pointer::{Pointer, PointerList},
        BinaryObject,
    },
    Error, FormatConfig, OffsetWidth, Parser, Result,
};

type DecodeFn = for<'r, 'a> fn(&'r mut Reader<'a>, u32) -> Result<()>;

struct Job {
    target: usize,
    origin: usize,
    index: u32,
    decode: DecodeFn,
}

fn decode_object<T: BinaryObject>(reader: &mut Reader<'_>, index: u32) -> Result<()> {
    let value = T::read(reader)?;
    reader.graph.fill(Handle::<T>::from_index(index), value)
}

/// Reads one object graph out of a byte slice.
pub struct Reader<'a> {
    parser: Parser<'a>,
    config: FormatConfig,
    origin: usize,
    origins: Vec<usize>,
    graph: Graph,
    cache: HashMap<(TypeId, usize), u32>,
    queue: VecDeque<Job>,
    decoded: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader at position 0 with origin 0.
    #[must_use]
    pub fn new(data: &'a [u8], config: FormatConfig) -> Self {
        Reader {
            parser: Parser::new(data, config.endianness),
            config,
            origin: 0,
            origins: Vec::new(),
            graph: Graph::new(),
            cache: HashMap::new(),
            queue: VecDeque::new(),
            decoded: 0,
        }
    }

    /// Layout configuration of this pass
    #[must_use]
    pub fn config(&self) -> FormatConfig {
        self.config
    }

    /// Current cursor position
    #[must_use]
    pub fn position(&self) -> usize {
        self.parser.pos()
    }

    /// Length of the stream
    #[must_use]
    pub fn len(&self) -> usize {
        self.parser.len()
    }

    /// True if the stream is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parser.is_empty()
    }

    /// Position offsets are currently measured from
    #[must_use]
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Nodes decoded so far in this pass
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Moves the cursor to an absolute position.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if `position` lies beyond the stream.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        self.parser.seek(position)
    }

    /// Skips padding up to the next multiple of `alignment`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if the padding leaves the stream.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        self.parser.align(alignment)
    }

    /// Measures subsequent offsets from the current position.
    pub fn push_origin(&mut self) {
        self.push_origin_at(self.parser.pos());
    }

    /// Measures subsequent offsets from `origin`.
    pub fn push_origin_at(&mut self, origin: usize) {
        self.origins.push(self.origin);
        self.origin = origin;
    }

    /// Restores the origin that was active before the last push.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedContainer`] if no origin was pushed; the current origin
    /// is kept.
    pub fn pop_origin(&mut self) -> Result<()> {
        self.origin = self
            .origins
            .pop()
            .ok_or_else(|| malformed_error!("Origin popped at {} without a matching push", self.parser.pos()))?;
        Ok(())
    }

    /// Runs `f` with offsets measured from `origin`.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn with_origin<R>(
        &mut self,
        origin: usize,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.push_origin_at(origin);
        let result = f(self);
        self.pop_origin().and(result)
    }

    /// Reads a primitive in the configured byte order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
    pub fn read<T: BinaryIO>(&mut self) -> Result<T> {
        self.parser.read::<T>()
    }

    /// Reads `length` raw bytes at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        self.parser.read_bytes(length)
    }

    /// Decodes a `T` inline at the cursor.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by `T`'s body decoder.
    pub fn read_object<T: BinaryObject>(&mut self) -> Result<T> {
        T::read(self)
    }

    /// Reads a signed 32-bit element count.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes, and
    /// [`crate::Error::MalformedContainer`] for a negative count.
    pub fn read_count(&mut self) -> Result<usize> {
        let position = self.parser.pos();
        let count = self.parser.read::<i32>()?;
        usize::try_from(count)
            .map_err(|_| malformed_error!("Negative element count {} at {}", count, position))
    }

    fn read_offset(&mut self) -> Result<u64> {
        match self.config.offset_width {
            OffsetWidth::U32 => Ok(u64::from(self.parser.read::<u32>()?)),
            OffsetWidth::U64 => self.parser.read::<u64>(),
        }
    }

    /// Turns an offset read at `slot` into an absolute position with at least `needed` bytes
    /// available behind it.
    fn resolve_target(&self, slot: usize, offset: u64, needed: usize) -> Result<usize> {
        let length = self.parser.len();
        let invalid = || Error::InvalidPointer {
            slot: slot as u64,
            target: (self.origin as u64).saturating_add(offset),
            length: length as u64,
        };

        let target = usize::try_from(offset)
            .ok()
            .and_then(|offset| self.origin.checked_add(offset))
            .ok_or_else(invalid)?;

        match target.checked_add(needed) {
            Some(end) if end <= length => Ok(target),
            _ => Err(invalid()),
        }
    }

    /// Runs `f` with the cursor at `target`, then returns to the current position.
    fn at<R>(&mut self, target: usize, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let resume = self.parser.pos();
        self.parser.seek(target)?;
        let result = f(self);
        self.parser.seek(resume)?;
        result
    }

    /// Reads one pointer field.
    ///
    /// An offset of zero yields a null pointer. Any other offset is resolved against the
    /// current origin; targets outside of the stream fail right away. The target is decoded
    /// at most once per pass, and every pointer to it shares the same handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if the field itself is cut off and
    /// [`crate::Error::InvalidPointer`] if the target lies outside of the stream.
    pub fn read_pointer<T: BinaryObject>(&mut self) -> Result<Pointer<T>> {
        let slot = self.parser.pos();
        let offset = self.read_offset()?;
        if offset == 0 {
            return Ok(Pointer::null());
        }

        let target = self.resolve_target(slot, offset, 1)?;
        let key = (TypeId::of::<T>(), target);
        if let Some(&index) = self.cache.get(&key) {
            return Ok(Pointer::new(Handle::from_index(index)));
        }

        let handle = self.graph.reserve::<T>();
        self.cache.insert(key, handle.index());
        self.queue.push_back(Job {
            target,
            origin: self.origin,
            index: handle.index(),
            decode: decode_object::<T>,
        });
        log::trace!(
            "slot {slot} -> {} at {target}",
            std::any::type_name::<T>()
        );

        Ok(Pointer::new(handle))
    }

    /// Reads a `{count, offset}` header and the run of pointer fields it leads to.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] for a cut-off header or a run longer than the
    /// stream, [`crate::Error::MalformedContainer`] for a negative count or a populated list
    /// without an offset, and [`crate::Error::InvalidPointer`] for targets outside the stream.
    pub fn read_pointer_list<T: BinaryObject>(&mut self) -> Result<PointerList<T>> {
        let count = self.read_count()?;
        let slot = self.parser.pos();
        let offset = self.read_offset()?;

        if count == 0 {
            return Ok(PointerList::new());
        }
        if offset == 0 {
            return Err(malformed_error!(
                "Pointer list of {} entries without an offset at {}",
                count,
                slot
            ));
        }

        let target = self.resolve_target(slot, offset, 0)?;
        let width = self.config.offset_width.size();
        let needed = count
            .checked_mul(width)
            .ok_or_else(|| malformed_error!("Pointer list count {} overflows", count))?;
        let available = self.parser.len() - target;
        if needed > available {
            return Err(truncated_error!(target, needed, available));
        }

        self.at(target, |reader| {
            let mut items = PointerList::with_capacity(count);
            for _ in 0..count {
                items.push(reader.read_pointer::<T>()?);
            }
            Ok(items)
        })
    }

    /// Reads an offset to a NUL-terminated UTF-8 string. A null offset reads as `""`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPointer`] for targets outside the stream,
    /// [`crate::Error::TruncatedStream`] for an unterminated string and
    /// [`crate::Error::MalformedContainer`] for invalid UTF-8.
    pub fn read_string_offset(&mut self) -> Result<String> {
        let slot = self.parser.pos();
        let offset = self.read_offset()?;
        if offset == 0 {
            return Ok(String::new());
        }

        let target = self.resolve_target(slot, offset, 1)?;
        self.at(target, |reader| reader.parser.read_string_utf8())
    }

    /// Reads an offset to `count` consecutive primitives.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedContainer`] for a populated array without an offset,
    /// [`crate::Error::InvalidPointer`] for targets outside the stream and
    /// [`crate::Error::TruncatedStream`] if the array runs past the end.
    pub fn read_array_offset<T: BinaryIO>(&mut self, count: usize) -> Result<Vec<T>> {
        let Some(target) = self.read_block_offset(count)? else {
            return Ok(Vec::new());
        };

        self.at(target, |reader| {
            let element = std::mem::size_of::<T>();
            let needed = count
                .checked_mul(element)
                .ok_or_else(|| malformed_error!("Array of {} elements overflows", count))?;
            reader.parser.ensure_remaining(needed)?;

            (0..count).map(|_| reader.parser.read::<T>()).collect()
        })
    }

    /// Reads an offset to `length` raw bytes.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Reader::read_array_offset`].
    pub fn read_bytes_offset(&mut self, length: usize) -> Result<Vec<u8>> {
        let Some(target) = self.read_block_offset(length)? else {
            return Ok(Vec::new());
        };

        self.at(target, |reader| Ok(reader.parser.read_bytes(length)?.to_vec()))
    }

    fn read_block_offset(&mut self, count: usize) -> Result<Option<usize>> {
        let slot = self.parser.pos();
        let offset = self.read_offset()?;
        if count == 0 {
            return Ok(None);
        }
        if offset == 0 {
            return Err(malformed_error!(
                "Block of {} elements without an offset at {}",
                count,
                slot
            ));
        }

        self.resolve_target(slot, offset, 0).map(Some)
    }

    /// Decodes every queued pointer target, including targets discovered while doing so.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a body decoder.
    pub fn drain(&mut self) -> Result<()> {
        while let Some(job) = self.queue.pop_front() {
            let resume = self.parser.pos();
            let saved_origin = self.origin;

            self.parser.seek(job.target)?;
            self.origin = job.origin;
            (job.decode)(self, job.index)?;

            self.origin = saved_origin;
            self.parser.seek(resume)?;
            self.decoded += 1;
        }
        Ok(())
    }

    /// Drains the queue and returns the completed graph.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a body decoder.
    pub fn finish(mut self) -> Result<Graph> {
        self.drain()?;
        debug_assert_eq!(self.graph.unfilled(), 0);

        log::debug!(
            "decoded {} pointed-to objects from {} bytes",
            self.decoded,
            self.parser.len()
        );
        Ok(self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endianness, Sink, Writer};

    /// Node with a value and an optional link, enough to build chains, diamonds and cycles.
    #[derive(Debug, PartialEq)]
    struct Node {
        value: u16,
        next: Pointer<Node>,
    }

    impl BinaryObject for Node {
        fn read(reader: &mut Reader<'_>) -> Result<Self> {
            Ok(Node {
                value: reader.read()?,
                next: reader.read_pointer()?,
            })
        }

        fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()> {
            writer.write(self.value)?;
            writer.write_pointer(&self.next)
        }
    }

    fn be() -> FormatConfig {
        FormatConfig::mirage()
    }

    #[test]
    fn null_pointer() {
        let data = [0, 0, 0, 0];
        let mut reader = Reader::new(&data, be());
        assert!(reader.read_pointer::<Node>().unwrap().is_null());
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn pointer_out_of_bounds() {
        let data = [0, 0, 0, 0x40];
        let mut reader = Reader::new(&data, be());
        assert!(matches!(
            reader.read_pointer::<Node>(),
            Err(Error::InvalidPointer {
                slot: 0,
                target: 0x40,
                length: 4
            })
        ));
    }

    #[test]
    fn pointer_relative_to_origin() {
        // [pad x4][origin: offset 8][pad x2][node @ origin+8: value 5, next null]
        let data = [
            0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 8, 0xFF, 0xFF, 0xFF, 0xFF, 0, 5, 0, 0, 0, 0,
        ];
        let mut reader = Reader::new(&data, be());
        reader.seek(4).unwrap();
        reader.push_origin();
        let pointer = reader.read_pointer::<Node>().unwrap();
        reader.pop_origin().unwrap();
        assert_eq!(reader.origin(), 0);

        let graph = reader.finish().unwrap();
        let node = pointer.resolve(&graph).unwrap().unwrap();
        assert_eq!(node.value, 5);
        assert!(node.next.is_null());
    }

    #[test]
    fn shared_target_yields_same_handle() {
        // two pointers to offset 8, node at 8 points back to itself
        let data = [0, 0, 0, 8, 0, 0, 0, 8, 0, 9, 0, 0, 0, 8];
        let mut reader = Reader::new(&data, be());
        let first = reader.read_pointer::<Node>().unwrap();
        let second = reader.read_pointer::<Node>().unwrap();
        assert_eq!(first, second);

        let graph = reader.finish().unwrap();
        assert_eq!(graph.count::<Node>(), 1);
        let node = first.resolve(&graph).unwrap().unwrap();
        assert_eq!(node.value, 9);
        assert_eq!(node.next, first);
    }

    #[test]
    fn pointer_list_header_truncated() {
        let data = [0, 0, 0, 1, 0, 0];
        let mut reader = Reader::new(&data, be());
        assert!(matches!(
            reader.read_pointer_list::<Node>(),
            Err(Error::TruncatedStream { .. })
        ));
    }

    #[test]
    fn pointer_list_negative_count() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 8];
        let mut reader = Reader::new(&data, be());
        assert!(matches!(
            reader.read_pointer_list::<Node>(),
            Err(Error::MalformedContainer { .. })
        ));
    }

    #[test]
    fn pointer_list_run_past_end() {
        // claims 4 entries at offset 8 but only one offset field follows
        let data = [0, 0, 0, 4, 0, 0, 0, 8, 0, 0, 0, 0];
        let mut reader = Reader::new(&data, be());
        assert!(matches!(
            reader.read_pointer_list::<Node>(),
            Err(Error::TruncatedStream {
                position: 8,
                needed: 16,
                available: 4
            })
        ));
    }

    #[test]
    fn pointer_list_without_offset() {
        let data = [0, 0, 0, 2, 0, 0, 0, 0];
        let mut reader = Reader::new(&data, be());
        assert!(matches!(
            reader.read_pointer_list::<Node>(),
            Err(Error::MalformedContainer { .. })
        ));
    }

    #[test]
    fn empty_pointer_list() {
        let data = [0, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = Reader::new(&data, be());
        assert!(reader.read_pointer_list::<Node>().unwrap().is_empty());
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn string_and_arrays() {
        let data = [
            0, 0, 0, 12, // string offset
            0, 0, 0, 16, // u16 array offset
            0, 0, 0, 0, // null bytes offset
            b'a', b'b', 0, 0, // string
            0, 1, 0, 2, // u16 array
        ];
        let mut reader = Reader::new(&data, be());
        assert_eq!(reader.read_string_offset().unwrap(), "ab");
        assert_eq!(reader.read_array_offset::<u16>(2).unwrap(), vec![1, 2]);
        assert!(reader.read_bytes_offset(0).unwrap().is_empty());
        assert_eq!(reader.position(), 12);

        let mut reader = Reader::new(&data, be());
        reader.seek(4).unwrap();
        assert!(matches!(
            reader.read_array_offset::<u16>(3),
            Err(Error::TruncatedStream { .. })
        ));
    }

    #[test]
    fn little_endian_wide_offsets() {
        let config = FormatConfig {
            endianness: Endianness::Little,
            offset_width: OffsetWidth::U64,
            alignment: 8,
        };
        let data = [8, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = Reader::new(&data, config);
        let pointer = reader.read_pointer::<Node>().unwrap();
        let graph = reader.finish().unwrap();
        assert_eq!(pointer.resolve(&graph).unwrap().unwrap().value, 3);
    }

    #[test]
    fn errors_surface_from_nested_targets() {
        // node at 4 points outside of the stream
        let data = [0, 0, 0, 4, 0, 1, 0, 0, 0, 0x7F];
        let mut reader = Reader::new(&data, be());
        reader.read_pointer::<Node>().unwrap();
        assert!(matches!(
            reader.finish(),
            Err(Error::InvalidPointer { slot: 6, .. })
        ));
    }

    #[test]
    fn unbalanced_pop_is_rejected() {
        let data = [0; 8];
        let mut reader = Reader::new(&data, be());
        reader.push_origin_at(4);
        reader.with_origin(6, |reader| {
            assert_eq!(reader.origin(), 6);
            Ok(())
        })
        .unwrap();
        assert_eq!(reader.origin(), 4);

        reader.pop_origin().unwrap();
        assert!(matches!(
            reader.pop_origin(),
            Err(Error::MalformedContainer { .. })
        ));
        assert_eq!(reader.origin(), 0);
    }
}
