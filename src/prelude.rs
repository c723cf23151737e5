//! # needlework Prelude
//!
//! Quick access to the types needed to load, inspect and save offset-graph containers.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all needlework operations
pub use crate::Error;

/// The result type used throughout needlework
pub use crate::Result;

/// Layout configuration
pub use crate::{Endianness, FormatConfig, OffsetWidth};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Whole-stream decoding and encoding
pub use crate::Document;

/// Byte sources and sinks
pub use crate::{File, Parser, Sink};

// ================================================================================================
// Object Graph
// ================================================================================================

/// Arenas, handles and pointer containers
pub use crate::{Arena, Graph, Handle, Pointer, PointerList};

/// Single-pass reader and writer
pub use crate::{BinaryObject, Finalized, Reader, Writer};

// ================================================================================================
// Formats
// ================================================================================================

/// Mirage model bodies
pub use crate::formats::mirage::{
    LightIndexMesh, LightIndexMeshGroup, MeshSlot, Model, SlottedMesh, TextureUnit,
};

/// GVR palette codecs
pub use crate::formats::gvr::{PaletteCodec, PaletteFormat};
