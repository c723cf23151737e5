#![no_main]

use libfuzzer_sys::fuzz_target;
use needlework::{formats::mirage::Model, Document, FormatConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(document) = Document::<Model>::from_bytes(data, FormatConfig::mirage()) {
        let _ = document.to_bytes(FormatConfig::mirage());
    }
});
