use strum::IntoEnumIterator;

use crate::{
    formats::mirage::{LightIndexMesh, MeshSlot},
    graph::{
        pointer::{Pointer, PointerList},
        reader::Reader,
        writer::Writer,
        BinaryObject,
    },
    Result, Sink,
};

/// A mesh together with the render bucket it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlottedMesh {
    /// Bucket the mesh is drawn in
    pub slot: MeshSlot,
    /// The mesh itself
    pub mesh: Pointer<LightIndexMesh>,
}

/// Meshes of one group, each tagged with its render bucket.
///
/// On disk the group is three pointer lists, one per [`MeshSlot`] in declaration order. After
/// a read, `entries` holds the opaque meshes first, then the transparent ones, then the
/// punch-through ones, each in on-disk order. A write regroups `entries` by bucket, keeping
/// the relative order inside a bucket, so an unsorted group comes back sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LightIndexMeshGroup {
    /// Meshes in bucket order after a read, any order before a write
    pub entries: Vec<SlottedMesh>,
}

impl LightIndexMeshGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mesh to the group.
    pub fn push(&mut self, slot: MeshSlot, mesh: impl Into<Pointer<LightIndexMesh>>) {
        self.entries.push(SlottedMesh {
            slot,
            mesh: mesh.into(),
        });
    }

    /// Number of meshes across all buckets
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no bucket holds a mesh
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Meshes of one bucket, in their relative order.
    pub fn meshes(&self, slot: MeshSlot) -> impl Iterator<Item = Pointer<LightIndexMesh>> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.slot == slot)
            .map(|entry| entry.mesh)
    }

    /// Reorders `entries` the way a write lays them out.
    pub fn sort_by_slot(&mut self) {
        self.entries.sort_by_key(|entry| entry.slot);
    }
}

impl BinaryObject for LightIndexMeshGroup {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let mut group = LightIndexMeshGroup::new();
        for slot in MeshSlot::iter() {
            let meshes = reader.read_pointer_list::<LightIndexMesh>()?;
            group
                .entries
                .extend(meshes.iter().map(|mesh| SlottedMesh { slot, mesh }));
        }
        Ok(group)
    }

    fn write<S: Sink>(&self, writer: &mut Writer<'_, S>) -> Result<()> {
        for slot in MeshSlot::iter() {
            let bucket: PointerList<LightIndexMesh> = self.meshes(slot).collect();
            writer.write_pointer_list(&bucket)?;
        }
        Ok(())
    }
}
