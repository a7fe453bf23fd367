//! XML tree model and parser

pub mod model;
pub mod parser;

pub use model::{is_valid_name, split_cdata, Content, Document, Element};
pub use parser::Parser;
