//! Pointer containers: the vocabulary every format body is expressed in.
//!
//! A [`crate::graph::pointer::Pointer`] is a nullable edge to a node in a [`crate::Graph`]; on
//! disk it is a single offset field. A [`crate::graph::pointer::PointerList`] is an ordered run
//! of such edges; on disk it is a `{count, offset}` header whose offset leads to `count`
//! consecutive offset fields.

use std::{fmt, ops::Index};

use crate::{
    graph::arena::{Graph, Handle},
    Result,
};

/// Nullable reference to a node of type `T`.
pub struct Pointer<T> {
    handle: Option<Handle<T>>,
}

impl<T> Pointer<T> {
    /// A pointer to nothing (offset 0 on disk)
    #[must_use]
    pub fn null() -> Self {
        Pointer { handle: None }
    }

    /// A pointer to the node behind `handle`
    #[must_use]
    pub fn new(handle: Handle<T>) -> Self {
        Pointer {
            handle: Some(handle),
        }
    }

    /// True if the pointer does not reference a node
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.handle.is_none()
    }

    /// The referenced handle, if any
    #[must_use]
    pub fn handle(&self) -> Option<Handle<T>> {
        self.handle
    }
}

impl<T: 'static> Pointer<T> {
    /// Looks up the referenced node.
    ///
    /// Returns `Ok(None)` for a null pointer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DanglingHandle`] if the graph does not hold the node.
    pub fn resolve<'g>(&self, graph: &'g Graph) -> Result<Option<&'g T>> {
        self.handle.map(|handle| graph.resolve(handle)).transpose()
    }
}

impl<T> Clone for Pointer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Pointer<T> {}

impl<T> PartialEq for Pointer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for Pointer<T> {}

impl<T> Default for Pointer<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Handle<T>> for Pointer<T> {
    fn from(handle: Handle<T>) -> Self {
        Pointer::new(handle)
    }
}

impl<T> fmt::Debug for Pointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.handle {
            Some(handle) => write!(f, "Pointer({handle:?})"),
            None => f.write_str("Pointer(null)"),
        }
    }
}

/// Ordered list of pointers to nodes of type `T`.
///
/// Element order is on-disk order after a read, and in-memory order is what a write emits.
pub struct PointerList<T> {
    items: Vec<Pointer<T>>,
}

impl<T> PointerList<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        PointerList { items: Vec::new() }
    }

    /// Creates an empty list with room for `capacity` pointers.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        PointerList {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Appends a pointer.
    pub fn push(&mut self, pointer: impl Into<Pointer<T>>) {
        self.items.push(pointer.into());
    }

    /// Number of pointers
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the list has no pointers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The pointer at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Pointer<T>> {
        self.items.get(index).copied()
    }

    /// Iterates over the pointers in order.
    pub fn iter(&self) -> impl Iterator<Item = Pointer<T>> + '_ {
        self.items.iter().copied()
    }

    /// The pointers as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[Pointer<T>] {
        &self.items
    }
}

impl<T: 'static> PointerList<T> {
    /// Looks up every referenced node, `None` standing in for null entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DanglingHandle`] if the graph does not hold a node.
    pub fn resolve<'g>(&self, graph: &'g Graph) -> Result<Vec<Option<&'g T>>> {
        self.items.iter().map(|pointer| pointer.resolve(graph)).collect()
    }
}

impl<T> Clone for PointerList<T> {
    fn clone(&self) -> Self {
        PointerList {
            items: self.items.clone(),
        }
    }
}

impl<T> PartialEq for PointerList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T> Eq for PointerList<T> {}

impl<T> Default for PointerList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PointerList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T> Index<usize> for PointerList<T> {
    type Output = Pointer<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<T, P: Into<Pointer<T>>> FromIterator<P> for PointerList<T> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        PointerList {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T> From<Vec<Pointer<T>>> for PointerList<T> {
    fn from(items: Vec<Pointer<T>>) -> Self {
        PointerList { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pointer() {
        let pointer: Pointer<u32> = Pointer::default();
        assert!(pointer.is_null());
        assert_eq!(pointer.resolve(&Graph::new()).unwrap(), None);
        assert_eq!(format!("{pointer:?}"), "Pointer(null)");
    }

    #[test]
    fn resolve_through_graph() {
        let mut graph = Graph::new();
        let handle = graph.insert(42_u32);
        let pointer = Pointer::from(handle);
        assert_eq!(pointer.resolve(&graph).unwrap(), Some(&42));
        assert_eq!(pointer.handle(), Some(handle));
    }

    #[test]
    fn list_preserves_order() {
        let mut graph = Graph::new();
        let a = graph.insert('a');
        let b = graph.insert('b');

        let mut list: PointerList<char> = [b, a].into_iter().collect();
        list.push(Pointer::null());
        list.push(b);

        assert_eq!(list.len(), 4);
        assert_eq!(list[0], Pointer::new(b));
        assert_eq!(
            list.resolve(&graph).unwrap(),
            vec![Some(&'b'), Some(&'a'), None, Some(&'b')]
        );
    }
}
