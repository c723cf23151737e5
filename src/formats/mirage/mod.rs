//! Hedgehog Engine "Mirage" model bodies.
//!
//! Mirage containers are big-endian with 32-bit offsets (see [`crate::FormatConfig::mirage`]).
//! A [`crate::formats::mirage::Model`] lists mesh groups; every
//! [`crate::formats::mirage::LightIndexMeshGroup`] sorts its meshes into three render buckets;
//! meshes reference their texture units. Meshes and texture units may be shared, and sharing
//! is preserved by a round trip through [`crate::Document`].
//!
//! # Examples
//!
//! ```rust
//! use needlework::{
//!     formats::mirage::{LightIndexMeshGroup, MeshSlot, Model},
//!     Document, FormatConfig, Graph, PointerList,
//! };
//!
//! let mut graph = Graph::new();
//! let group = graph.insert(LightIndexMeshGroup::default());
//! let model = Model {
//!     name: "chr_sonic".into(),
//!     groups: PointerList::from_iter([group]),
//! };
//!
//! let document = Document::new(model, graph);
//! let bytes = document.to_bytes(FormatConfig::mirage())?;
//! let decoded = Document::<Model>::from_bytes(&bytes, FormatConfig::mirage())?;
//! assert_eq!(decoded.root.name, "chr_sonic");
//! assert_eq!(decoded.root.groups.len(), 1);
//! # let _ = MeshSlot::Opaque;
//! # Ok::<(), needlework::Error>(())
//! ```

mod group;
mod mesh;
mod model;

use strum::{Display, EnumIter};

pub use group::{LightIndexMeshGroup, SlottedMesh};
pub use mesh::{LightIndexMesh, TextureUnit};
pub use model::Model;

/// Render bucket of a mesh.
///
/// Not stored per mesh on disk: a mesh group holds one pointer list per bucket, always in this
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display, EnumIter)]
pub enum MeshSlot {
    /// Drawn without blending
    #[default]
    Opaque,
    /// Drawn with alpha blending
    Transparent,
    /// Drawn with alpha testing
    PunchThrough,
}
