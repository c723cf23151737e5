//! Typed arenas holding the nodes of a decoded object graph.
//!
//! Edges between nodes are [`crate::graph::arena::Handle`]s, stable indices into the arena of
//! the target type. Sharing a node means copying its handle; identity is the handle, never the
//! node's value. A [`crate::graph::arena::Graph`] keeps one arena per node type.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use crate::{Error, Result};

/// Stable reference to a node of type `T` inside a [`Graph`].
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn from_index(index: u32) -> Self {
        Handle {
            index,
            _marker: PhantomData,
        }
    }

    /// Slot index inside the arena of `T`
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>({})", short_type_name::<T>(), self.index)
    }
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// Storage for every node of one type.
///
/// Slots can be reserved before their value is known; the reader does this for pointers whose
/// targets have not been decoded yet.
pub struct Arena<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena { slots: Vec::new() }
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&self) -> Handle<T> {
        // Graphs never approach 2^32 nodes of one type.
        #[allow(clippy::cast_possible_truncation)]
        let index = self.slots.len() as u32;
        Handle::from_index(index)
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let handle = self.next_handle();
        self.slots.push(Some(value));
        handle
    }

    /// Reserves a slot whose value is provided later through [`Arena::fill`].
    pub fn reserve(&mut self) -> Handle<T> {
        let handle = self.next_handle();
        self.slots.push(None);
        handle
    }

    /// Provides the value of a reserved slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DanglingHandle`] if the handle does not belong to this arena.
    pub fn fill(&mut self, handle: Handle<T>, value: T) -> Result<()> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(Error::DanglingHandle {
                type_name: std::any::type_name::<T>(),
                index: handle.index,
            }),
        }
    }

    /// Returns the node behind `handle`, if it exists and has been filled.
    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots.get(handle.index as usize)?.as_ref()
    }

    /// Returns the node behind `handle` mutably.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots.get_mut(handle.index as usize)?.as_mut()
    }

    /// Number of slots, reserved ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the arena has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of reserved slots still waiting for a value
    #[must_use]
    pub fn unfilled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Iterates over filled slots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            #[allow(clippy::cast_possible_truncation)]
            let handle = Handle::from_index(index as u32);
            slot.as_ref().map(|value| (handle, value))
        })
    }
}

trait ErasedArena {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn len(&self) -> usize;
    fn unfilled(&self) -> usize;
    fn type_name(&self) -> &'static str;
}

impl<T: 'static> ErasedArena for Arena<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        Arena::len(self)
    }

    fn unfilled(&self) -> usize {
        Arena::unfilled(self)
    }

    fn type_name(&self) -> &'static str {
        short_type_name::<T>()
    }
}

/// An object graph: one [`Arena`] per node type.
///
/// # Examples
///
/// ```rust
/// use needlework::Graph;
///
/// let mut graph = Graph::new();
/// let a = graph.insert(String::from("shared"));
/// let b = graph.insert(String::from("shared"));
///
/// // Equal values, distinct identities
/// assert_ne!(a, b);
/// assert_eq!(graph.get(a), graph.get(b));
/// assert_eq!(graph.count::<String>(), 2);
/// ```
#[derive(Default)]
pub struct Graph {
    arenas: HashMap<TypeId, Box<dyn ErasedArena>>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena of `T`, if any node of that type was ever stored
    #[must_use]
    pub fn arena<T: 'static>(&self) -> Option<&Arena<T>> {
        self.arenas
            .get(&TypeId::of::<T>())
            .and_then(|arena| arena.as_any().downcast_ref::<Arena<T>>())
    }

    /// Arena of `T`, created on first use
    pub fn arena_mut<T: 'static>(&mut self) -> &mut Arena<T> {
        let arena = self
            .arenas
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Arena::<T>::new()));

        match arena.as_any_mut().downcast_mut::<Arena<T>>() {
            Some(arena) => arena,
            None => unreachable!("arena keyed by TypeId holds a different type"),
        }
    }

    /// Stores `value` and returns its handle.
    pub fn insert<T: 'static>(&mut self, value: T) -> Handle<T> {
        self.arena_mut::<T>().insert(value)
    }

    pub(crate) fn reserve<T: 'static>(&mut self) -> Handle<T> {
        self.arena_mut::<T>().reserve()
    }

    pub(crate) fn fill<T: 'static>(&mut self, handle: Handle<T>, value: T) -> Result<()> {
        self.arena_mut::<T>().fill(handle, value)
    }

    /// Returns the node behind `handle`.
    #[must_use]
    pub fn get<T: 'static>(&self, handle: Handle<T>) -> Option<&T> {
        self.arena::<T>()?.get(handle)
    }

    /// Returns the node behind `handle` mutably.
    pub fn get_mut<T: 'static>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.arenas
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<Arena<T>>()?
            .get_mut(handle)
    }

    /// Returns the node behind `handle`, failing for handles the graph does not hold.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DanglingHandle`] for unknown or unfilled handles.
    pub fn resolve<T: 'static>(&self, handle: Handle<T>) -> Result<&T> {
        self.get(handle).ok_or(Error::DanglingHandle {
            type_name: std::any::type_name::<T>(),
            index: handle.index,
        })
    }

    /// Number of slots of type `T`
    #[must_use]
    pub fn count<T: 'static>(&self) -> usize {
        self.arena::<T>().map_or(0, Arena::len)
    }

    /// Number of reserved slots of any type still waiting for a value
    #[must_use]
    pub fn unfilled(&self) -> usize {
        self.arenas.values().map(|arena| arena.unfilled()).sum()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for arena in self.arenas.values() {
            map.entry(&arena.type_name(), &arena.len());
        }
        map.finish()
    }
}
