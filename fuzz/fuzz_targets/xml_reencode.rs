#![no_main]
use libfuzzer_sys::fuzz_target;
use kvxml::{encode_to_xml_text, reader::parse_str};

// Anything that decodes must encode to a document that parses again
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(value) = parse_str(s) {
            if let Ok(xml) = encode_to_xml_text(&value, "root") {
                assert!(parse_str(&xml).is_ok());
            }
        }
    }
});
