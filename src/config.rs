//! Stream layout configuration shared by readers and writers.
//!
//! Every offset-graph format in scope agrees on the same three knobs: the byte order of
//! primitives, the width of an offset field and the alignment applied to deferred content.

use strum::{Display, EnumIter};

/// Byte order of primitive fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Endianness {
    /// Least significant byte first
    Little,
    /// Most significant byte first (GameCube / Xbox 360 era formats)
    Big,
}

/// Width of a single pointer field on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum OffsetWidth {
    /// 4-byte offsets
    U32,
    /// 8-byte offsets
    U64,
}

impl OffsetWidth {
    /// Size of the field in bytes
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            OffsetWidth::U32 => 4,
            OffsetWidth::U64 => 8,
        }
    }

    /// Largest offset value the field can carry
    #[must_use]
    pub fn max_value(self) -> u64 {
        match self {
            OffsetWidth::U32 => u64::from(u32::MAX),
            OffsetWidth::U64 => u64::MAX,
        }
    }
}

/// Layout configuration for one read or write pass.
///
/// The defaults describe a little-endian stream with 32-bit offsets and 4-byte aligned
/// deferred content. Use [`FormatConfig::mirage`] for the big-endian Hedgehog Engine formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Byte order of every primitive, offset and count field
    pub endianness: Endianness,

    /// Width of a pointer field
    pub offset_width: OffsetWidth,

    /// Alignment of deferred content appended by the writer (1 disables padding)
    pub alignment: u64,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            endianness: Endianness::Little,
            offset_width: OffsetWidth::U32,
            alignment: 4,
        }
    }
}

impl FormatConfig {
    /// Big-endian, 32-bit offsets, 4-byte alignment
    #[must_use]
    pub fn mirage() -> Self {
        Self {
            endianness: Endianness::Big,
            offset_width: OffsetWidth::U32,
            alignment: 4,
        }
    }

    /// Little-endian with 64-bit offsets and 8-byte alignment
    #[must_use]
    pub fn wide() -> Self {
        Self {
            endianness: Endianness::Little,
            offset_width: OffsetWidth::U64,
            alignment: 8,
        }
    }

    /// Same layout without any padding between deferred blocks
    #[must_use]
    pub fn packed(self) -> Self {
        Self {
            alignment: 1,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let config = FormatConfig::default();
        assert_eq!(config.endianness, Endianness::Little);
        assert_eq!(config.offset_width.size(), 4);

        let config = FormatConfig::mirage();
        assert_eq!(config.endianness, Endianness::Big);
        assert_eq!(config.alignment, 4);

        let config = FormatConfig::wide().packed();
        assert_eq!(config.offset_width.size(), 8);
        assert_eq!(config.alignment, 1);
    }

    #[test]
    fn offset_width_limits() {
        assert_eq!(OffsetWidth::U32.max_value(), 0xFFFF_FFFF);
        assert_eq!(OffsetWidth::U64.max_value(), u64::MAX);
    }
}
