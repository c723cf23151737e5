#![no_main]

use libfuzzer_sys::fuzz_target;
use needlework::formats::gvr::{PaletteCodec, PaletteFormat};

fuzz_target!(|data: &[u8]| {
    let Some((&id, entries)) = data.split_first() else {
        return;
    };
    if let Ok(format) = PaletteFormat::from_id(id) {
        let codec = format.codec(entries.len() / 2);
        if let Ok(rgba) = codec.decode(entries) {
            let _ = codec.encode(&rgba);
        }
    }
});
