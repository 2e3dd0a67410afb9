//! Minimal element tree over xml-rs events.
//!
//! Distribution documents are small; building the whole tree keeps the
//! extraction code a plain walk over elements.

use xml::reader::{ParserConfig, XmlEvent};

/// A node in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Character data, CDATA or whitespace.
    Text(String),
}

/// An element and its children, in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Concatenated direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Every element named `name` in this subtree, in document order,
    /// including `self`.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.name == name {
            found.push(self);
        }
        for child in self.elements() {
            child.collect_named(name, found);
        }
    }
}

/// Parse a document into its root element.
pub fn parse_document(bytes: &[u8]) -> Result<Element, xml::reader::Error> {
    let reader = ParserConfig::new()
        .cdata_to_characters(true)
        .coalesce_characters(true)
        .create_reader(bytes);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    for event in reader {
        match event? {
            XmlEvent::StartElement { name, .. } => stack.push(Element::new(name.local_name)),
            XmlEvent::EndElement { .. } => {
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => root = Some(element),
                    }
                }
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) | XmlEvent::Whitespace(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text));
                }
            }
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }

    // xml-rs reports an unclosed or missing root element as an error before
    // EndDocument, so a finished parse always has a root.
    Ok(root.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_shape() {
        let root = parse_document(b"<a>x<b>1</b> <c><b>2</b></c></a>").unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.elements().count(), 2);
        assert_eq!(root.text(), "x ");

        let bs: Vec<_> = root.descendants("b").iter().map(|b| b.text()).collect();
        assert_eq!(bs, vec!["1", "2"]);
    }

    #[test]
    fn test_cdata_becomes_text() {
        let root = parse_document(b"<script><![CDATA[var a = 1 < 2;]]></script>").unwrap();
        assert_eq!(root.text(), "var a = 1 < 2;");
    }

    #[test]
    fn test_malformed() {
        assert!(parse_document(b"<a><b></a>").is_err());
        assert!(parse_document(b"").is_err());
    }
}
