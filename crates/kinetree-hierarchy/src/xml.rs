//! Nested XML output for exported trees.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::{Attributes, Error, ExportNode, ExportTree, Result};

/// Element and attribute names used by the nested XML form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlOptions {
    /// Document element wrapping all roots.
    pub root_tag: String,
    /// Element emitted for every segment.
    pub node_tag: String,
    /// Attribute carrying the segment identifier.
    pub id_attribute: String,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            root_tag: "hierarchy".to_string(),
            node_tag: "segment".to_string(),
            id_attribute: "name".to_string(),
            indent: 2,
        }
    }
}

/// Payloads that can be written as XML attributes.
pub trait XmlPayload {
    /// Append this payload's attributes to `elem`.
    ///
    /// `reserved` is the id attribute, already written by the exporter. A
    /// payload key equal to it, or a key repeated within the payload, is an
    /// [`Error::Xml`] since the element could not be read back unchanged.
    fn write_attributes(&self, elem: &mut BytesStart<'_>, reserved: &str) -> Result<()>;
}

impl XmlPayload for Attributes {
    fn write_attributes(&self, elem: &mut BytesStart<'_>, reserved: &str) -> Result<()> {
        for (i, (key, value)) in self.iter().enumerate() {
            if key == reserved {
                return Err(Error::Xml(format!("payload attribute '{}' clashes with the id attribute", key)));
            }
            if self[..i].iter().any(|(seen, _)| seen == key) {
                return Err(Error::Xml(format!("duplicate payload attribute '{}'", key)));
            }
            elem.push_attribute((key.as_str(), value.as_str()));
        }
        Ok(())
    }
}

impl XmlPayload for () {
    fn write_attributes(&self, _elem: &mut BytesStart<'_>, _reserved: &str) -> Result<()> {
        Ok(())
    }
}

enum Step<'t, 'a, K, P> {
    Open(&'t ExportNode<'a, K, P>),
    Close,
}

impl<K: std::fmt::Display, P: XmlPayload> ExportTree<'_, K, P> {
    /// Convert to an XML string.
    pub fn to_xml_string(&self, options: &XmlOptions) -> Result<String> {
        let mut output = Vec::new();
        self.write_xml(&mut output, options)?;
        String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Write the tree as nested XML elements.
    ///
    /// Leaf segments are written as self-closing elements. Failures of
    /// `writer` surface as [`Error::Io`].
    pub fn write_xml<W: Write>(&self, writer: W, options: &XmlOptions) -> Result<()> {
        let mut xml = Writer::new_with_indent(writer, b' ', options.indent);
        let node_tag = options.node_tag.as_str();

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let root = BytesStart::new(options.root_tag.as_str());
        if self.is_empty() {
            xml.write_event(Event::Empty(root))?;
            return Ok(());
        }

        xml.write_event(Event::Start(root))?;

        let mut steps: Vec<Step<'_, '_, K, P>> = self.roots().iter().rev().map(Step::Open).collect();
        while let Some(step) = steps.pop() {
            match step {
                Step::Open(node) => {
                    let id = node.id.to_string();
                    let mut elem = BytesStart::new(node_tag);
                    elem.push_attribute((options.id_attribute.as_str(), id.as_str()));
                    node.payload.write_attributes(&mut elem, &options.id_attribute)?;

                    if node.is_leaf() {
                        xml.write_event(Event::Empty(elem))?;
                    } else {
                        xml.write_event(Event::Start(elem))?;
                        steps.push(Step::Close);
                        steps.extend(node.children.iter().rev().map(Step::Open));
                    }
                }
                Step::Close => {
                    xml.write_event(Event::End(BytesEnd::new(node_tag)))?;
                }
            }
        }

        xml.write_event(Event::End(BytesEnd::new(options.root_tag.as_str())))?;

        Ok(())
    }
}
