#![no_main]
use libfuzzer_sys::fuzz_target;
use kvxml::{charset::decode_document, XmlParser};

fuzz_target!(|data: &[u8]| {
    let _ = XmlParser::new(data).parse();
    let text = decode_document(data);
    let _ = XmlParser::new(text.as_bytes()).parse();
});
