//! Palette codec integration tests.
//!
//! Exercises the GVR palette formats through the public codec interface the way a texture
//! loader would: look the format up by header id, decode to RGBA, edit, encode back.

use needlework::{
    formats::gvr::{decode_rgb5a3, encode_rgb5a3, PaletteCodec, PaletteFormat, Rgb5a3Palette},
    Error, Result,
};
use strum::IntoEnumIterator;

#[test]
fn test_rgb5a3_reference_entries() -> Result<()> {
    let codec = PaletteFormat::from_id(2)?.codec(4);
    let rgba = codec.decode(&[0x80, 0x00, 0x70, 0x00, 0xFC, 0x00, 0x0F, 0x00])?;

    assert_eq!(
        rgba,
        vec![
            0, 0, 0, 255, // opaque black
            0, 0, 0, 255, // ARGB-3444 with full alpha
            255, 0, 0, 255, // opaque red
            255, 0, 0, 0, // transparent red
        ]
    );
    Ok(())
}

#[test]
fn test_rgb5a3_alpha_threshold() -> Result<()> {
    let codec = Rgb5a3Palette::new(2);
    let encoded = codec.encode(&[10, 20, 30, 219, 10, 20, 30, 218])?;

    let first = u16::from_be_bytes([encoded[0], encoded[1]]);
    let second = u16::from_be_bytes([encoded[2], encoded[3]]);
    assert_ne!(first & 0x8000, 0, "alpha 219 selects RGB-555");
    assert_eq!(second & 0x8000, 0, "alpha 218 selects ARGB-3444");
    Ok(())
}

#[test]
fn test_rgb5a3_quantized_values_are_stable() {
    // Every entry decodes to a colour that encodes back to the same entry, except for
    // translucent entries with alpha 7, which decode to 255 and come back as RGB-555.
    for entry in 0..=u16::MAX {
        let rgba = decode_rgb5a3(entry);
        let translucent_full_alpha = entry & 0x8000 == 0 && (entry >> 12) & 0x7 == 7;
        if !translucent_full_alpha {
            assert_eq!(encode_rgb5a3(rgba), entry, "entry {entry:#06x}");
        }
    }
}

#[test]
fn test_every_format_roundtrips_buffer_lengths() -> Result<()> {
    for format in PaletteFormat::iter() {
        let codec = format.codec(16);
        let encoded: Vec<u8> = (0..32).collect();
        let rgba = codec.decode(&encoded)?;
        assert_eq!(rgba.len(), 64, "{format}");

        let reencoded = codec.encode(&rgba)?;
        assert_eq!(reencoded.len(), 32, "{format}");
    }
    Ok(())
}

#[test]
fn test_short_input_is_truncated() {
    for format in PaletteFormat::iter() {
        let codec = format.codec(8);
        assert!(matches!(
            codec.decode(&[0; 15]),
            Err(Error::TruncatedStream { needed: 16, .. })
        ));
        assert!(matches!(
            codec.encode(&[0; 31]),
            Err(Error::TruncatedStream { needed: 32, .. })
        ));
    }
}

#[test]
fn test_unknown_format_id() {
    assert!(matches!(
        PaletteFormat::from_id(9),
        Err(Error::MalformedContainer { .. })
    ));
}
