//! XML→Array decoding of a parsed element tree

use crate::value::{Object, Value, ATTRIBUTES_KEY, TEXT_KEY};
use crate::xml::model::{Content, Element};

/// Decode the content of `element` into an object.
///
/// The element's own name is not part of the result. Attributes are
/// collected under `@attributes`, child elements become entries keyed by
/// their name (repeated names become arrays in document order), and text
/// next to attributes or child elements is kept under `#text`.
pub fn xml_to_array(element: &Element) -> Object {
    let mut result = Object::new();

    if !element.attributes.is_empty() {
        let attributes: Object = element
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        result.insert(ATTRIBUTES_KEY, attributes);
    }

    let mut text = String::new();
    for child in &element.children {
        match child {
            Content::Element(child) => result.push_repeated(&child.name, element_value(child)),
            Content::Text(chunk) | Content::CData(chunk) => text.push_str(chunk),
        }
    }

    if element.has_character_content() {
        result.insert(TEXT_KEY, text);
    }

    result
}

fn element_value(element: &Element) -> Value {
    let is_leaf = element.attributes.is_empty() && !element.has_elements();
    if is_leaf && element.has_character_content() {
        Value::String(element.text())
    } else {
        Value::Object(xml_to_array(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::reader::parse_str as decode;

    #[test]
    fn test_leaf_children_become_strings() -> Result<()> {
        let obj = decode("<root><a>hello</a><b><![CDATA[5 & 6]]></b></root>")?;
        assert_eq!(obj, Object::from([("a", "hello"), ("b", "5 & 6")]));
        Ok(())
    }

    #[test]
    fn test_repeated_children_become_array() -> Result<()> {
        let obj = decode("<root><item>a</item><other>x</other><item>b</item></root>")?;
        assert_eq!(
            obj["item"],
            Value::from(vec!["a".into(), "b".into()])
        );
        let keys: Vec<_> = obj.keys().collect();
        assert_eq!(keys, vec!["item", "other"]);
        Ok(())
    }

    #[test]
    fn test_attributes_are_folded() -> Result<()> {
        let obj = decode(r#"<root id="7"><![CDATA[x]]></root>"#)?;

        let mut expected = Object::new();
        expected.insert(ATTRIBUTES_KEY, Object::from([("id", "7")]));
        expected.insert(TEXT_KEY, "x");
        assert_eq!(obj, expected);
        Ok(())
    }

    #[test]
    fn test_child_with_attributes_and_text() -> Result<()> {
        let obj = decode(r#"<root><price currency="EUR">12</price></root>"#)?;
        let price = obj["price"].as_object().cloned().unwrap_or_default();
        assert_eq!(price[ATTRIBUTES_KEY], Value::from(Object::from([("currency", "EUR")])));
        assert_eq!(price[TEXT_KEY], Value::from("12"));
        Ok(())
    }

    #[test]
    fn test_empty_child_is_empty_object() -> Result<()> {
        let obj = decode("<root><a/><b></b></root>")?;
        assert_eq!(obj["a"], Value::Object(Object::new()));
        assert_eq!(obj["b"], Value::Object(Object::new()));
        Ok(())
    }

    #[test]
    fn test_text_only_root() -> Result<()> {
        let obj = decode("<root>just text</root>")?;
        assert_eq!(obj, Object::from([(TEXT_KEY, "just text")]));
        Ok(())
    }

    #[test]
    fn test_mixed_content_keeps_text() -> Result<()> {
        let obj = decode("<root>intro<a>1</a>outro</root>")?;
        assert_eq!(obj["a"], Value::from("1"));
        assert_eq!(obj[TEXT_KEY], Value::from("introoutro"));
        Ok(())
    }

    #[test]
    fn test_whitespace_between_elements_is_ignored() -> Result<()> {
        let obj = decode("<root>\n  <a>1</a>\n  <b>\n    <c>2</c>\n  </b>\n</root>")?;
        assert!(!obj.contains_key(TEXT_KEY));
        let b = obj["b"].as_object().cloned().unwrap_or_default();
        assert_eq!(b, Object::from([("c", "2")]));
        Ok(())
    }
}
