//! GVR texture data.
//!
//! Only palettes are covered: the 16-bit entry formats a paletted GVR texture can carry, and
//! their conversion to and from flat RGBA buffers for presentation.

mod palette;

pub use palette::{
    decode_intensity_a8, decode_rgb565, decode_rgb5a3, encode_intensity_a8, encode_rgb565,
    encode_rgb5a3, IntensityA8Palette, PaletteCodec, PaletteFormat, Rgb565Palette,
    Rgb5a3Palette,
};
