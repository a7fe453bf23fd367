//! kvxml - convert nested key-value data to and from XML
//!
//! # Quick Start
//!
//! ```
//! use kvxml::{encode_to_xml_text, reader, Object, Value};
//! # fn main() -> Result<(), kvxml::Error> {
//! let mut data = Object::new();
//! data.insert("@attributes", Object::from([("id", "7")]));
//! data.insert("item", Value::from(vec!["a".into(), "b".into()]));
//!
//! let xml = encode_to_xml_text(&data, "root")?;
//! assert!(xml.contains("<root id=\"7\">"));
//! assert!(xml.contains("<item><![CDATA[a]]></item>"));
//!
//! let decoded = reader::parse_str(&xml)?;
//! assert_eq!(decoded.get("item"), data.get("item"));
//! # Ok(())
//! # }
//! ```
//!
//! Large documents go through the streaming [`Writer`], which flushes to
//! disk in batches, and files are read back with [`read_xml_file`] or a
//! configured [`Reader`] that can retry while another process is still
//! writing the file.

#![forbid(unsafe_code)]

pub mod charset;
mod cursor;
pub mod decode;
pub mod encode;
pub mod error;
pub mod paths;
pub mod reader;
pub mod value;
pub mod writer;
pub mod xml;

pub use charset::Charset;
pub use decode::xml_to_array;
pub use encode::{array_to_xml, prepare_xml};
pub use error::{Diagnostic, Error, ErrorKind, ParseError, Pos, Result, Severity, Span};
pub use paths::{ensure_directory, resolve_path};
pub use reader::{read_xml_file, ReadOptions, Reader};
pub use value::{prune_empty, Array, Object, Value, ATTRIBUTES_KEY, TEXT_KEY};
pub use writer::{needs_character_data, write_xml_file, ChunkSink, FileSink, WriteOptions, Writer};
pub use xml::{
    Content as XmlContent, Document as XmlDocument, Element as XmlElement, Parser as XmlParser,
};

/// Encode `value` under a root element named `root_name` and return the
/// pretty-printed document
pub fn encode_to_xml_text(value: &Object, root_name: &str) -> Result<String> {
    prepare_xml(value, root_name)
}

