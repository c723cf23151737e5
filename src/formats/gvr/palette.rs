//! GVR palette codecs.
//!
//! A palette is a run of 16-bit big-endian entries. Decoding always produces 4 bytes per entry
//! in R, G, B, A order; encoding is the lossy inverse. Narrow channels are widened with
//! `value * 255 / max`, so the extremes map to 0 and 255 exactly.
//!
//! # Examples
//!
//! ```rust
//! use needlework::formats::gvr::{PaletteCodec, PaletteFormat};
//!
//! let codec = PaletteFormat::Rgb5a3.codec(2);
//! let rgba = codec.decode(&[0x80, 0x00, 0x70, 0x00])?;
//! assert_eq!(rgba, vec![0, 0, 0, 255, 0, 0, 0, 255]);
//! # Ok::<(), needlework::Error>(())
//! ```

use strum::{Display, EnumIter};

use crate::{Error, Result};

/// Widens an `n`-bit channel value to 8 bits.
fn widen(value: u16, max: u16) -> u8 {
    #[allow(clippy::cast_possible_truncation)]
    let widened = (u32::from(value) * 255 / u32::from(max)) as u8;
    widened
}

/// Decodes one RGB5A3 entry into `[R, G, B, A]`.
///
/// Bit 15 selects the layout: clear is ARGB-3444, set is opaque RGB-555.
#[must_use]
pub fn decode_rgb5a3(entry: u16) -> [u8; 4] {
    if entry & 0x8000 == 0 {
        [
            widen((entry >> 8) & 0xF, 15),
            widen((entry >> 4) & 0xF, 15),
            widen(entry & 0xF, 15),
            widen((entry >> 12) & 0x7, 7),
        ]
    } else {
        [
            widen((entry >> 10) & 0x1F, 31),
            widen((entry >> 5) & 0x1F, 31),
            widen(entry & 0x1F, 31),
            255,
        ]
    }
}

/// Encodes `[R, G, B, A]` as one RGB5A3 entry.
///
/// Alpha above `0xDA` selects opaque RGB-555 and discards alpha; anything else is stored as
/// ARGB-3444.
#[must_use]
pub fn encode_rgb5a3([r, g, b, a]: [u8; 4]) -> u16 {
    let (r, g, b, a) = (u16::from(r), u16::from(g), u16::from(b), u16::from(a));
    if a > 0xDA {
        0x8000 | (r >> 3) << 10 | (g >> 3) << 5 | b >> 3
    } else {
        (a >> 5) << 12 | (r >> 4) << 8 | (g >> 4) << 4 | b >> 4
    }
}

/// Decodes one RGB565 entry into `[R, G, B, 255]`.
#[must_use]
pub fn decode_rgb565(entry: u16) -> [u8; 4] {
    [
        widen((entry >> 11) & 0x1F, 31),
        widen((entry >> 5) & 0x3F, 63),
        widen(entry & 0x1F, 31),
        255,
    ]
}

/// Encodes `[R, G, B, _]` as one RGB565 entry. Alpha is dropped.
#[must_use]
pub fn encode_rgb565([r, g, b, _]: [u8; 4]) -> u16 {
    (u16::from(r) >> 3) << 11 | (u16::from(g) >> 2) << 5 | u16::from(b) >> 3
}

/// Decodes one IA8 entry (alpha byte, then intensity byte) into `[I, I, I, A]`.
#[must_use]
pub fn decode_intensity_a8(entry: u16) -> [u8; 4] {
    let [alpha, intensity] = entry.to_be_bytes();
    [intensity, intensity, intensity, alpha]
}

/// Encodes `[R, G, B, A]` as one IA8 entry, using the mean of R, G and B as intensity.
#[must_use]
pub fn encode_intensity_a8([r, g, b, a]: [u8; 4]) -> u16 {
    let sum = u16::from(r) + u16::from(g) + u16::from(b);
    #[allow(clippy::cast_possible_truncation)]
    let intensity = (sum / 3) as u8;
    u16::from_be_bytes([a, intensity])
}

/// Converts between encoded palette entries and RGBA bytes.
///
/// Implementors supply the per-entry conversion; buffer handling is shared.
pub trait PaletteCodec {
    /// Number of palette entries handled per call
    fn entry_count(&self) -> usize;

    /// Decodes one 16-bit entry into `[R, G, B, A]`.
    fn decode_entry(&self, entry: u16) -> [u8; 4];

    /// Encodes `[R, G, B, A]` into one 16-bit entry.
    fn encode_entry(&self, rgba: [u8; 4]) -> u16;

    /// Bytes produced by [`PaletteCodec::decode`]
    fn decoded_len(&self) -> usize {
        self.entry_count() * 4
    }

    /// Bytes produced by [`PaletteCodec::encode`]
    fn encoded_len(&self) -> usize {
        self.entry_count() * 2
    }

    /// Decodes `entry_count` big-endian entries into RGBA bytes.
    ///
    /// Bytes past the last entry are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if `input` holds fewer than
    /// [`PaletteCodec::encoded_len`] bytes.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let needed = self.encoded_len();
        if input.len() < needed {
            return Err(truncated_error!(0, needed, input.len()));
        }

        let mut output = Vec::with_capacity(self.decoded_len());
        for pair in input[..needed].chunks_exact(2) {
            let entry = u16::from_be_bytes([pair[0], pair[1]]);
            output.extend_from_slice(&self.decode_entry(entry));
        }
        Ok(output)
    }

    /// Encodes RGBA bytes into `entry_count` big-endian entries. Lossy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if `input` holds fewer than
    /// [`PaletteCodec::decoded_len`] bytes.
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let needed = self.decoded_len();
        if input.len() < needed {
            return Err(truncated_error!(0, needed, input.len()));
        }

        let mut output = Vec::with_capacity(self.encoded_len());
        for pixel in input[..needed].chunks_exact(4) {
            let entry = self.encode_entry([pixel[0], pixel[1], pixel[2], pixel[3]]);
            output.extend_from_slice(&entry.to_be_bytes());
        }
        Ok(output)
    }
}

macro_rules! palette_codec {
    ($(#[$meta:meta])* $name:ident, $decode:ident, $encode:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            entries: usize,
        }

        impl $name {
            /// Creates a codec for `entries` palette entries.
            #[must_use]
            pub fn new(entries: usize) -> Self {
                $name { entries }
            }
        }

        impl PaletteCodec for $name {
            fn entry_count(&self) -> usize {
                self.entries
            }

            fn decode_entry(&self, entry: u16) -> [u8; 4] {
                $decode(entry)
            }

            fn encode_entry(&self, rgba: [u8; 4]) -> u16 {
                $encode(rgba)
            }
        }
    };
}

palette_codec!(
    /// Intensity with 8-bit alpha.
    IntensityA8Palette,
    decode_intensity_a8,
    encode_intensity_a8
);
palette_codec!(
    /// Opaque 5-6-5 colour.
    Rgb565Palette,
    decode_rgb565,
    encode_rgb565
);
palette_codec!(
    /// Opaque RGB-555 or translucent ARGB-3444, selected per entry by bit 15.
    Rgb5a3Palette,
    decode_rgb5a3,
    encode_rgb5a3
);

/// Palette formats as identified in GVR texture headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum PaletteFormat {
    /// Format id 0
    IntensityA8,
    /// Format id 1
    Rgb565,
    /// Format id 2
    Rgb5a3,
}

impl PaletteFormat {
    /// Looks up the format for a header id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedContainer`] for unknown ids.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(PaletteFormat::IntensityA8),
            1 => Ok(PaletteFormat::Rgb565),
            2 => Ok(PaletteFormat::Rgb5a3),
            _ => Err(malformed_error!("Unknown palette format id {}", id)),
        }
    }

    /// Header id of the format
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            PaletteFormat::IntensityA8 => 0,
            PaletteFormat::Rgb565 => 1,
            PaletteFormat::Rgb5a3 => 2,
        }
    }

    /// Creates a codec of this format for `entries` palette entries.
    #[must_use]
    pub fn codec(self, entries: usize) -> Box<dyn PaletteCodec> {
        match self {
            PaletteFormat::IntensityA8 => Box::new(IntensityA8Palette::new(entries)),
            PaletteFormat::Rgb565 => Box::new(Rgb565Palette::new(entries)),
            PaletteFormat::Rgb5a3 => Box::new(Rgb5a3Palette::new(entries)),
        }
    }
}

impl TryFrom<u8> for PaletteFormat {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        PaletteFormat::from_id(id)
    }
}
