//! Array→XML encoding onto an in-memory element tree

use crate::error::{Error, Result};
use crate::value::{Object, Value, ATTRIBUTES_KEY, TEXT_KEY};
use crate::xml::model::{is_valid_name, split_cdata, Content, Element};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";
const INDENT: &str = "  ";

/// Encode `value` as the content of `node`.
///
/// An `@attributes` entry becomes attributes of `node`. If a single scalar
/// entry is left beside it, that scalar becomes a CDATA section directly
/// under `node`; with nothing left, `node` stays empty. Otherwise every
/// entry becomes a child element: objects nest, arrays repeat the element
/// once per item, scalars are wrapped in CDATA. A `#text` entry is the
/// character content of `node` itself.
pub fn array_to_xml(value: &Object, node: &mut Element) -> Result<()> {
    let Some(attributes) = value.get(ATTRIBUTES_KEY) else {
        return append_entries(value.iter(), node);
    };

    apply_attributes(attributes, node)?;

    let rest: Vec<(&String, &Value)> = value
        .iter()
        .filter(|(key, _)| key.as_str() != ATTRIBUTES_KEY)
        .collect();

    if let [(_, single)] = rest.as_slice() {
        if let Some(text) = single.scalar_text() {
            node.append_cdata(text);
            return Ok(());
        }
    }

    append_entries(rest.into_iter(), node)
}

/// Encode `value` under a root element named `root_name` and serialize the
/// document, pretty-printed with a UTF-8 declaration.
pub fn prepare_xml(value: &Object, root_name: &str) -> Result<String> {
    let mut root = new_element(root_name)?;
    array_to_xml(value, &mut root)?;
    Ok(to_xml_string(&root))
}

/// Serialize an element tree as a standalone document.
///
/// Elements whose children are all elements are broken across lines and
/// indented by two spaces; an element holding any text or CDATA is written
/// on one line with its whole subtree.
pub fn to_xml_string(root: &Element) -> String {
    let mut output = String::from(DECLARATION);
    serialize_element(root, 0, true, &mut output);
    output.push('\n');
    output
}

fn append_entries<'a>(
    entries: impl Iterator<Item = (&'a String, &'a Value)>,
    node: &mut Element,
) -> Result<()> {
    for (key, value) in entries {
        if key == TEXT_KEY {
            let text = value
                .scalar_text()
                .ok_or_else(|| Error::InvalidName(key.clone()))?;
            node.append_cdata(text);
        } else {
            append_value(key, value, node)?;
        }
    }
    Ok(())
}

fn append_value(name: &str, value: &Value, parent: &mut Element) -> Result<()> {
    match value {
        Value::Object(obj) => {
            let mut child = new_element(name)?;
            array_to_xml(obj, &mut child)?;
            parent.append_element(child);
        }
        Value::Array(items) => {
            for item in items {
                append_value(name, item, parent)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            let mut child = new_element(name)?;
            child.append_cdata(value.scalar_text().unwrap_or_default());
            parent.append_element(child);
        }
    }
    Ok(())
}

fn apply_attributes(attributes: &Value, node: &mut Element) -> Result<()> {
    let Value::Object(attributes) = attributes else {
        return Err(Error::InvalidAttribute(ATTRIBUTES_KEY.to_string()));
    };

    for (name, value) in attributes {
        if !is_valid_name(name) {
            return Err(Error::InvalidName(name.clone()));
        }
        let text = value
            .scalar_text()
            .ok_or_else(|| Error::InvalidAttribute(name.clone()))?;
        node.set_attribute(name.clone(), text);
    }
    Ok(())
}

fn new_element(name: &str) -> Result<Element> {
    if is_valid_name(name) {
        Ok(Element::new(name))
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

fn serialize_element(element: &Element, depth: usize, format: bool, output: &mut String) {
    output.push('<');
    output.push_str(&element.name);

    for (key, value) in element.attributes.iter() {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        output.push_str(&escape_attribute(value));
        output.push('"');
    }

    if element.children.is_empty() {
        output.push_str("/>");
        return;
    }

    output.push('>');

    let format = format && !element.has_character_content();
    for child in &element.children {
        if format {
            output.push('\n');
            output.push_str(&INDENT.repeat(depth + 1));
        }
        match child {
            Content::Element(child) => serialize_element(child, depth + 1, format, output),
            Content::Text(text) => output.push_str(&escape_text(text)),
            Content::CData(text) => {
                for part in split_cdata(text) {
                    output.push_str("<![CDATA[");
                    output.push_str(part);
                    output.push_str("]]>");
                }
            }
        }
    }
    if format {
        output.push('\n');
        output.push_str(&INDENT.repeat(depth));
    }

    output.push_str("</");
    output.push_str(&element.name);
    output.push('>');
}

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(input: &str) -> String {
    escape_text(input)
        .replace('"', "&quot;")
        .replace('\n', "&#10;")
        .replace('\t', "&#9;")
}
