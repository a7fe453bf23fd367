//! XML data model

use indexmap::IndexMap;

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// XML element
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
    CData(String),
}

impl Element {
    /// Create an element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn append_element(&mut self, child: Self) {
        self.children.push(Content::Element(child));
    }

    pub fn append_text(&mut self, text: impl Into<String>) {
        self.children.push(Content::Text(text.into()));
    }

    pub fn append_cdata(&mut self, text: impl Into<String>) {
        self.children.push(Content::CData(text.into()));
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated text and CDATA content of this element (not descendants)
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Content::Text(text) | Content::CData(text) => Some(text.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    pub fn has_elements(&self) -> bool {
        self.elements().next().is_some()
    }

    pub fn has_character_content(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, Content::Text(_) | Content::CData(_)))
    }
}

/// True if `name` is usable as an XML element or attribute name
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => chars.all(is_name_char),
        _ => false,
    }
}

pub(crate) fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || matches!(ch, '_' | ':')
}

pub(crate) fn is_name_char(ch: char) -> bool {
    is_name_start(ch) || ch.is_numeric() || matches!(ch, '-' | '.' | '\u{B7}')
}

/// Split text so that no piece contains `]]>`, for emitting as consecutive
/// CDATA sections.
pub fn split_cdata(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find("]]>") {
        let (head, tail) = rest.split_at(idx + 2);
        parts.push(head);
        rest = tail;
    }
    parts.push(rest);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_element() {
        let mut root = Element::new("root");
        let mut child = Element::new("child");
        child.append_text("hi");
        root.append_element(child);

        let names: Vec<_> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["child"]);
        assert_eq!(root.elements().next().map(Element::text), Some("hi".to_string()));
    }

    #[test]
    fn test_text_concatenates_text_and_cdata() {
        let mut element = Element::new("a");
        element.append_text("x ");
        element.append_cdata("<y>");
        assert_eq!(element.text(), "x <y>");
        assert!(element.has_character_content());
        assert!(!element.has_elements());
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("root"));
        assert!(is_valid_name("ns:item-1.x"));
        assert!(is_valid_name("_private"));
        assert!(is_valid_name("straße"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1st"));
        assert!(!is_valid_name("@attributes"));
        assert!(!is_valid_name("has space"));
    }

    #[test]
    fn test_split_cdata() {
        assert_eq!(split_cdata("plain"), vec!["plain"]);
        assert_eq!(split_cdata("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(split_cdata("]]>]]>"), vec!["]]", ">]]", ">"]);
    }
}
