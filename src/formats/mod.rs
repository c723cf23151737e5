//! Concrete container formats built on the offset-graph core.
//!
//! - [`crate::formats::mirage`] - Hedgehog Engine "Mirage" model bodies
//! - [`crate::formats::gvr`] - GVR texture palette codecs

pub mod gvr;
pub mod mirage;
