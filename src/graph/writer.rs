//! Object-graph writer.
//!
//! [`crate::graph::writer::Writer`] encodes bodies into a [`crate::file::sink::Sink`]. Offsets
//! are not known while a body is being emitted, so every non-null pointer field is written as a
//! placeholder and recorded as a pending patch. Pointed-to content is laid out after the
//! current body in FIFO order, aligned to the configured boundary, and each placeholder is
//! overwritten once its target has a position.
//!
//! A node reachable through several pointers is identified by its [`crate::Handle`] and
//! emitted exactly once; every pointer to it is patched with the same target. Back-references
//! to nodes that are already placed are patched right away, which makes cyclic graphs work.
//!
//! # Examples
//!
//! ```rust
//! use needlework::{FormatConfig, Graph, PointerList, Writer};
//!
//! let mut graph = Graph::new();
//! let shared = graph.insert(7_u32);
//! let list: PointerList<u32> = [shared, shared].into_iter().collect();
//!
//! let mut writer = Writer::new(&graph, FormatConfig::mirage());
//! writer.write_pointer_list(&list)?;
//! let output = writer.finalize()?;
//!
//! // header, run of two offsets, one shared u32
//! assert_eq!(output.sink.len(), 8 + 8 + 4);
//! assert_eq!(output.offsets, vec![4, 8, 12]);
//! # Ok::<(), needlework::Error>(())
//! ```

use std::{
    any::TypeId,
    collections::{HashMap, VecDeque},
};

use crate::{
    file::{
        io::{encode, BinaryIO},
        sink::Sink,
    },
    graph::{
        arena::{Graph, Handle},
        pointer::{Pointer, PointerList},
        BinaryObject,
    },
    Error, FormatConfig, OffsetWidth, Result,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct ObjectKey {
    type_id: TypeId,
    index: u32,
}

/// A placeholder offset field waiting for its target.
#[derive(Clone, Copy, Debug)]
struct Slot {
    position: u64,
    origin: u64,
}

type EncodeFn<S> = for<'w, 'g> fn(&'w mut Writer<'g, S>, u32) -> Result<()>;

struct ObjectRef<S: Sink> {
    key: ObjectKey,
    type_name: &'static str,
    encode: EncodeFn<S>,
}

impl<S: Sink> Clone for ObjectRef<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Sink> Copy for ObjectRef<S> {}

impl<S: Sink> ObjectRef<S> {
    fn of<T: BinaryObject>(handle: Handle<T>) -> Self {
        ObjectRef {
            key: ObjectKey {
                type_id: TypeId::of::<T>(),
                index: handle.index(),
            },
            type_name: std::any::type_name::<T>(),
            encode: encode_object::<T, S>,
        }
    }
}

fn encode_object<T: BinaryObject, S: Sink>(writer: &mut Writer<'_, S>, index: u32) -> Result<()> {
    let graph = writer.graph;
    let value = graph.resolve(Handle::<T>::from_index(index))?;
    value.write(writer)
}

enum Job<S: Sink> {
    /// Body of a node, encoded with the origin of the pointer that first reached it
    Object { object: ObjectRef<S>, origin: u64 },
    /// Run of pointer fields behind a pointer list header
    Run {
        slot: Slot,
        items: Vec<Option<ObjectRef<S>>>,
    },
    /// Raw content behind a string, array or byte-block offset
    Bytes { slot: Slot, data: Vec<u8> },
}

/// Output of a completed write pass.
#[derive(Debug)]
pub struct Finalized<S> {
    /// The sink holding the encoded stream, every offset patched
    pub sink: S,
    /// Absolute positions of every non-null offset field, ascending
    pub offsets: Vec<u64>,
}

/// Writes one object graph into a [`Sink`].
pub struct Writer<'g, S: Sink = Vec<u8>> {
    sink: S,
    graph: &'g Graph,
    config: FormatConfig,
    origin: u64,
    origins: Vec<u64>,
    assigned: HashMap<ObjectKey, u64>,
    waiting: HashMap<ObjectKey, Vec<Slot>>,
    queue: VecDeque<Job<S>>,
    offsets: Vec<u64>,
}

impl<'g> Writer<'g, Vec<u8>> {
    /// Creates a writer encoding into a fresh in-memory buffer.
    #[must_use]
    pub fn new(graph: &'g Graph, config: FormatConfig) -> Self {
        Self::with_sink(graph, config, Vec::new())
    }
}

impl<'g, S: Sink> Writer<'g, S> {
    /// Creates a writer appending to `sink`.
    ///
    /// Positions are absolute within the sink, so `sink` is expected to start empty.
    pub fn with_sink(graph: &'g Graph, config: FormatConfig, sink: S) -> Self {
        Writer {
            sink,
            graph,
            config,
            origin: 0,
            origins: Vec::new(),
            assigned: HashMap::new(),
            waiting: HashMap::new(),
            queue: VecDeque::new(),
            offsets: Vec::new(),
        }
    }

    /// Graph the written nodes are looked up in
    #[must_use]
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Layout configuration of this pass
    #[must_use]
    pub fn config(&self) -> FormatConfig {
        self.config
    }

    /// Number of bytes emitted so far
    #[must_use]
    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    /// Position offsets are currently measured from
    #[must_use]
    pub fn origin(&self) -> u64 {
        self.origin
    }

    /// Measures subsequent offsets from the current position.
    pub fn push_origin(&mut self) {
        self.origins.push(self.origin);
        self.origin = self.sink.position();
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
            .ok_or_else(|| malformed_error!("Origin popped at {} without a matching push", self.sink.position()))?;
        Ok(())
    }

    /// Emits zero padding up to the next multiple of `alignment`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the sink fails.
    pub fn align(&mut self, alignment: u64) -> Result<()> {
        if alignment <= 1 {
            return Ok(());
        }
        let position = self.sink.position();
        let padding = (alignment - position % alignment) % alignment;
        if padding > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let zeros = vec![0_u8; padding as usize];
            self.sink.append(&zeros)?;
        }
        Ok(())
    }

    /// Writes a primitive in the configured byte order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the sink fails.
    pub fn write<T: BinaryIO>(&mut self, value: T) -> Result<()> {
        let bytes = encode(value, self.config.endianness);
        self.sink.append(bytes.as_ref())
    }

    /// Writes raw bytes at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the sink fails.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.append(bytes)
    }

    /// Writes an element count as a signed 32-bit field.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedContainer`] if `count` exceeds `i32::MAX`.
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = i32::try_from(count)
            .map_err(|_| malformed_error!("Element count {} exceeds the count field", count))?;
        self.write(count)
    }

    /// Encodes `value` inline at the cursor.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by `T`'s body encoder.
    pub fn write_object<T: BinaryObject>(&mut self, value: &T) -> Result<()> {
        value.write(self)
    }

    fn write_null(&mut self) -> Result<()> {
        match self.config.offset_width {
            OffsetWidth::U32 => self.write(0_u32),
            OffsetWidth::U64 => self.write(0_u64),
        }
    }

    /// Emits a placeholder offset field and returns its slot.
    fn placeholder(&mut self) -> Result<Slot> {
        let slot = Slot {
            position: self.sink.position(),
            origin: self.origin,
        };
        self.write_null()?;
        self.offsets.push(slot.position);
        Ok(slot)
    }

    fn check_handle<T: BinaryObject>(&self, handle: Handle<T>) -> Result<ObjectRef<S>> {
        self.graph.resolve(handle)?;
        Ok(ObjectRef::of(handle))
    }

    /// Writes one pointer field.
    ///
    /// A null pointer is written as offset 0. Otherwise a placeholder is emitted and the target
    /// is laid out later, once per handle no matter how many pointers reach it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DanglingHandle`] if the graph does not hold the target, or an
    /// error from patching if the target is already placed.
    pub fn write_pointer<T: BinaryObject>(&mut self, pointer: &Pointer<T>) -> Result<()> {
        match pointer.handle() {
            None => self.write_null(),
            Some(handle) => {
                let object = self.check_handle(handle)?;
                self.write_reference(object)
            }
        }
    }

    fn write_reference(&mut self, object: ObjectRef<S>) -> Result<()> {
        let slot = self.placeholder()?;

        if let Some(&target) = self.assigned.get(&object.key) {
            return self.patch(slot, target);
        }

        let slots = self.waiting.entry(object.key).or_default();
        slots.push(slot);
        if slots.len() == 1 {
            self.queue.push_back(Job::Object {
                object,
                origin: self.origin,
            });
        }
        Ok(())
    }

    /// Writes a `{count, offset}` header; the run of pointer fields follows later.
    ///
    /// An empty list is written as count 0 with a null offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DanglingHandle`] if the graph does not hold an entry.
    pub fn write_pointer_list<T: BinaryObject>(&mut self, list: &PointerList<T>) -> Result<()> {
        let items = list
            .iter()
            .map(|pointer| {
                pointer
                    .handle()
                    .map(|handle| self.check_handle(handle))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;

        self.write_count(items.len())?;
        if items.is_empty() {
            return self.write_null();
        }

        let slot = self.placeholder()?;
        self.queue.push_back(Job::Run { slot, items });
        Ok(())
    }

    /// Writes an offset to a NUL-terminated copy of `value`. An empty string is a null offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the sink fails.
    pub fn write_string_offset(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return self.write_null();
        }

        let mut data = Vec::with_capacity(value.len() + 1);
        data.extend_from_slice(value.as_bytes());
        data.push(0);
        self.write_deferred_bytes(data)
    }

    /// Writes an offset to the elements of `values`. An empty slice is a null offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the sink fails.
    pub fn write_array_offset<T: BinaryIO>(&mut self, values: &[T]) -> Result<()> {
        if values.is_empty() {
            return self.write_null();
        }

        let mut data = Vec::with_capacity(std::mem::size_of_val(values));
        for &value in values {
            data.extend_from_slice(encode(value, self.config.endianness).as_ref());
        }
        self.write_deferred_bytes(data)
    }

    /// Writes an offset to a copy of `bytes`. An empty slice is a null offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the sink fails.
    pub fn write_bytes_offset(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return self.write_null();
        }
        self.write_deferred_bytes(bytes.to_vec())
    }

    fn write_deferred_bytes(&mut self, data: Vec<u8>) -> Result<()> {
        let slot = self.placeholder()?;
        self.queue.push_back(Job::Bytes { slot, data });
        Ok(())
    }

    /// Overwrites the placeholder at `slot` with the offset of `target`.
    fn patch(&mut self, slot: Slot, target: u64) -> Result<()> {
        let offset = target.checked_sub(slot.origin).ok_or_else(|| {
            malformed_error!(
                "Target {} precedes the origin {} of slot {}",
                target,
                slot.origin,
                slot.position
            )
        })?;
        if offset == 0 {
            return Err(malformed_error!(
                "Target of slot {} coincides with its origin and would read as null",
                slot.position
            ));
        }
        if offset > self.config.offset_width.max_value() {
            return Err(Error::OffsetOverflow(offset));
        }

        match self.config.offset_width {
            OffsetWidth::U32 => {
                #[allow(clippy::cast_possible_truncation)]
                let bytes = encode(offset as u32, self.config.endianness);
                self.sink.overwrite(slot.position, bytes.as_ref())
            }
            OffsetWidth::U64 => {
                let bytes = encode(offset, self.config.endianness);
                self.sink.overwrite(slot.position, bytes.as_ref())
            }
        }
    }

    /// Aligns the sink for the next deferred block and returns its position.
    fn place(&mut self) -> Result<u64> {
        self.align(self.config.alignment)?;
        Ok(self.sink.position())
    }

    fn run_job(&mut self, job: Job<S>) -> Result<()> {
        match job {
            Job::Object { object, origin } => {
                if let Some(&placed) = self.assigned.get(&object.key) {
                    return Err(Error::CyclicWithoutIdentity {
                        type_name: object.type_name,
                        position: placed,
                    });
                }

                let position = self.place()?;
                self.assigned.insert(object.key, position);
                for slot in self.waiting.remove(&object.key).unwrap_or_default() {
                    self.patch(slot, position)?;
                }

                let saved_origin = std::mem::replace(&mut self.origin, origin);
                let saved_origins = std::mem::take(&mut self.origins);
                let result = (object.encode)(self, object.key.index);
                self.origin = saved_origin;
                self.origins = saved_origins;
                result
            }
            Job::Run { slot, items } => {
                let position = self.place()?;
                self.patch(slot, position)?;

                let saved_origin = std::mem::replace(&mut self.origin, slot.origin);
                let result = items.into_iter().try_for_each(|item| match item {
                    Some(object) => self.write_reference(object),
                    None => self.write_null(),
                });
                self.origin = saved_origin;
                result
            }
            Job::Bytes { slot, data } => {
                let position = self.place()?;
                self.patch(slot, position)?;
                self.sink.append(&data)
            }
        }
    }

    /// Lays out every queued target, including targets discovered while doing so.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a body encoder or a patch.
    pub fn drain(&mut self) -> Result<()> {
        while let Some(job) = self.queue.pop_front() {
            self.run_job(job)?;
        }
        Ok(())
    }

    /// Number of placeholder offsets whose target has no position yet
    #[must_use]
    pub fn pending_patches(&self) -> usize {
        let waiting: usize = self.waiting.values().map(Vec::len).sum();
        let deferred = self
            .queue
            .iter()
            .filter(|job| !matches!(job, Job::Object { .. }))
            .count();
        waiting + deferred
    }

    /// Drains the queue and hands over the sink.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Writer::drain`], and returns
    /// [`crate::Error::UnresolvedPatch`] if any placeholder is left unpatched.
    pub fn finalize(mut self) -> Result<Finalized<S>> {
        self.drain()?;

        let pending = self.pending_patches();
        if pending > 0 {
            return Err(Error::UnresolvedPatch(pending));
        }

        self.offsets.sort_unstable();
        log::debug!(
            "encoded {} bytes, {} objects, {} offsets",
            self.sink.position(),
            self.assigned.len(),
            self.offsets.len()
        );

        Ok(Finalized {
            sink: self.sink,
            offsets: self.offsets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endianness, Reader};

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

    #[test]
    fn null_pointer_is_zero() {
        let graph = Graph::new();
        let mut writer = Writer::new(&graph, FormatConfig::mirage());
        writer.write_pointer(&Pointer::<Node>::null()).unwrap();
        let output = writer.finalize().unwrap();
        assert_eq!(output.sink, vec![0, 0, 0, 0]);
        assert!(output.offsets.is_empty());
    }

    #[test]
    fn body_first_pointees_after() {
        let mut graph = Graph::new();
        let tail = graph.insert(Node {
            value: 2,
            next: Pointer::null(),
        });
        let head = graph.insert(Node {
            value: 1,
            next: tail.into(),
        });

        let mut writer = Writer::new(&graph, FormatConfig::mirage().packed());
        writer.write_pointer(&Pointer::new(head)).unwrap();
        assert_eq!(writer.pending_patches(), 1);
        let output = writer.finalize().unwrap();

        #[rustfmt::skip]
        assert_eq!(output.sink, vec![
            0, 0, 0, 4,             // -> head
            0, 1, 0, 0, 0, 10,      // head: value 1, -> tail
            0, 2, 0, 0, 0, 0,       // tail: value 2, null
        ]);
        assert_eq!(output.offsets, vec![0, 6]);
    }

    #[test]
    fn cycle_is_patched_backwards() {
        let mut graph = Graph::new();
        let handle = graph.insert(Node {
            value: 3,
            next: Pointer::null(),
        });
        graph.get_mut(handle).unwrap().next = handle.into();

        let mut writer = Writer::new(&graph, FormatConfig::mirage());
        writer.write_pointer(&Pointer::new(handle)).unwrap();
        let output = writer.finalize().unwrap();

        // node at 4 points to itself
        assert_eq!(output.sink, vec![0, 0, 0, 4, 0, 3, 0, 0, 0, 4]);

        let mut reader = Reader::new(&output.sink, FormatConfig::mirage());
        let pointer = reader.read_pointer::<Node>().unwrap();
        let read = reader.finish().unwrap();
        let node = pointer.resolve(&read).unwrap().unwrap();
        assert_eq!(node.next, pointer);
    }

    #[test]
    fn dangling_handle() {
        let graph = Graph::new();
        let mut writer = Writer::new(&graph, FormatConfig::mirage());
        let missing = Pointer::new(Handle::<Node>::from_index(0));
        assert!(matches!(
            writer.write_pointer(&missing),
            Err(Error::DanglingHandle { index: 0, .. })
        ));
    }

    #[test]
    fn empty_blocks_are_null() {
        let graph = Graph::new();
        let mut writer = Writer::new(&graph, FormatConfig::default());
        writer.write_string_offset("").unwrap();
        writer.write_array_offset::<u32>(&[]).unwrap();
        writer.write_bytes_offset(&[]).unwrap();
        writer.write_pointer_list(&PointerList::<Node>::new()).unwrap();
        let output = writer.finalize().unwrap();
        assert_eq!(output.sink, vec![0; 20]);
        assert!(output.offsets.is_empty());
    }

    #[test]
    fn deferred_blocks_are_aligned() {
        let graph = Graph::new();
        let mut writer = Writer::new(&graph, FormatConfig::default());
        writer.write_string_offset("abc").unwrap();
        writer.write_array_offset(&[0x0102_u16]).unwrap();
        let output = writer.finalize().unwrap();

        #[rustfmt::skip]
        assert_eq!(output.sink, vec![
            8, 0, 0, 0,
            12, 0, 0, 0,
            b'a', b'b', b'c', 0,
            2, 1,
        ]);
    }

    #[test]
    fn target_at_origin_is_rejected() {
        let graph = Graph::new();
        let mut writer = Writer::new(&graph, FormatConfig::default());
        writer.write_bytes_offset(&[1]).unwrap();
        // origin past the slot, exactly where the block will be placed
        writer.push_origin();
        writer.queue.iter_mut().for_each(|job| {
            if let Job::Bytes { slot, .. } = job {
                slot.origin = 4;
            }
        });
        assert!(matches!(
            writer.finalize(),
            Err(Error::MalformedContainer { .. })
        ));
    }

    #[test]
    fn offset_overflow() {
        let graph = Graph::new();
        let mut writer = Writer::new(&graph, FormatConfig::default());
        let slot = writer.placeholder().unwrap();
        assert!(matches!(
            writer.patch(slot, u64::from(u32::MAX) + 1),
            Err(Error::OffsetOverflow(_))
        ));
    }

    #[test]
    fn wide_little_endian_offsets() {
        let mut graph = Graph::new();
        let handle = graph.insert(0xABCD_u16);
        let config = FormatConfig {
            endianness: Endianness::Little,
            offset_width: OffsetWidth::U64,
            alignment: 8,
        };

        let mut writer = Writer::new(&graph, config);
        writer.write_pointer(&Pointer::new(handle)).unwrap();
        let output = writer.finalize().unwrap();
        assert_eq!(
            output.sink,
            vec![8, 0, 0, 0, 0, 0, 0, 0, 0xCD, 0xAB]
        );
    }

    #[test]
    fn unbalanced_pop_is_rejected() {
        let graph = Graph::new();
        let mut writer = Writer::new(&graph, FormatConfig::default());
        writer.write(0_u32).unwrap();
        writer.push_origin();
        assert_eq!(writer.origin(), 4);

        writer.pop_origin().unwrap();
        assert_eq!(writer.origin(), 0);
        assert!(matches!(
            writer.pop_origin(),
            Err(Error::MalformedContainer { .. })
        ));
    }
}
