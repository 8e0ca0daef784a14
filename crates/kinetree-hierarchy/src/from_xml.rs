//! Parse nested XML back into a flat segment list.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{Attributes, Error, Result, Segment, XmlOptions};

/// Parse nested segment XML into a flat list.
///
/// Every `options.node_tag` element becomes a segment whose parent is the
/// enclosing segment element. Segments appear in document order, so
/// exporting the result reproduces the same tree.
///
/// # Example
///
/// ```
/// use kinetree_hierarchy::{segments_from_xml, XmlOptions};
///
/// let xml = r#"<hierarchy>
///     <segment name="base">
///         <segment name="arm" length="0.4"/>
///     </segment>
/// </hierarchy>"#;
///
/// let segments = segments_from_xml(xml, &XmlOptions::default())?;
/// assert_eq!(segments[1].parent.as_deref(), Some("base"));
/// # Ok::<(), kinetree_hierarchy::Error>(())
/// ```
pub fn segments_from_xml(xml: &str, options: &XmlOptions) -> Result<Vec<Segment>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let node_tag = options.node_tag.as_bytes();
    let mut open: Vec<String> = Vec::new();
    let mut segments = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == node_tag => {
                let segment = read_segment(&e, open.last(), options)?;
                open.push(segment.id.clone());
                segments.push(segment);
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == node_tag => {
                segments.push(read_segment(&e, open.last(), options)?);
            }
            Ok(Event::End(e)) if e.name().as_ref() == node_tag => {
                open.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // Document element, declarations, comments
            Err(e) => return Err(Error::Xml(format!("XML parse error: {}", e))),
        }
    }

    Ok(segments)
}

fn read_segment(elem: &BytesStart<'_>, parent: Option<&String>, options: &XmlOptions) -> Result<Segment> {
    let mut id = None;
    let mut payload = Attributes::new();

    for attr in elem.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(e.to_string()))?
            .into_owned();

        if key == options.id_attribute {
            id = Some(value);
        } else {
            payload.push((key, value));
        }
    }

    let id = id.ok_or_else(|| {
        Error::Xml(format!(
            "<{}> element without '{}' attribute",
            options.node_tag, options.id_attribute
        ))
    })?;

    Ok(Segment::new(id, parent.cloned(), payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HierarchyExporter;

    #[test]
    fn test_round_trip_preserves_edges() {
        let original: Vec<Segment> = vec![
            Segment::root("base").attr("mass", "4"),
            Segment::child("gripper", "arm1"),
            Segment::child("arm1", "base").attr("note", "a & b"),
            Segment::child("arm2", "arm1"),
        ];
        let tree = HierarchyExporter::new(&original).export().unwrap();
        let xml = tree.to_xml_string(&XmlOptions::default()).unwrap();

        let parsed = segments_from_xml(&xml, &XmlOptions::default()).unwrap();
        let reparsed = HierarchyExporter::new(&parsed).export().unwrap();

        fn edges(tree: &crate::ExportTree<'_, String, Attributes>) -> Vec<(String, String)> {
            tree.edges().into_iter().map(|(p, c)| (p.clone(), c.clone())).collect()
        }

        assert_eq!(edges(&tree), edges(&reparsed));

        let arm1 = parsed.iter().find(|s| s.id == "arm1").unwrap();
        assert_eq!(arm1.payload, vec![("note".to_string(), "a & b".to_string())]);
    }

    #[test]
    fn test_document_order() {
        let xml = r#"<hierarchy>
            <segment name="a"><segment name="b"/></segment>
            <segment name="c"/>
        </hierarchy>"#;
        let segments = segments_from_xml(xml, &XmlOptions::default()).unwrap();
        let flat: Vec<(&str, Option<&str>)> = segments
            .iter()
            .map(|s| (s.id.as_str(), s.parent.as_deref()))
            .collect();
        assert_eq!(flat, [("a", None), ("b", Some("a")), ("c", None)]);
    }

    #[test]
    fn test_missing_id_attribute() {
        let xml = r#"<hierarchy><segment mass="1"/></hierarchy>"#;
        let result = segments_from_xml(xml, &XmlOptions::default());
        assert!(matches!(result, Err(Error::Xml(_))));
    }

    #[test]
    fn test_malformed_xml() {
        let xml = r#"<hierarchy><segment name="a"></hierarchy>"#;
        let result = segments_from_xml(xml, &XmlOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_document() {
        let segments = segments_from_xml("<hierarchy/>", &XmlOptions::default()).unwrap();
        assert!(segments.is_empty());
    }
}
