//! Linear-time export of flat parent-pointer lists into nested trees.
//!
//! Robot descriptions, scene graphs and similar formats often store their
//! bodies as a flat list where each entry names its parent. This crate turns
//! such a list into a nested tree in a single pass:
//!
//! 1. Build an [`AdjacencyMap`] (parent to ordered children) once.
//! 2. Walk it depth-first from each root, in input order.
//!
//! Children are never looked up by scanning the input, so the whole export
//! is O(N) in the number of segments.
//!
//! # Example
//!
//! ```
//! use kinetree_hierarchy::{HierarchyExporter, Segment, XmlOptions};
//!
//! let segments: Vec<Segment> = vec![
//!     Segment::root("base").attr("mass", "4.0"),
//!     Segment::child("arm1", "base"),
//!     Segment::child("arm2", "arm1"),
//!     Segment::child("gripper", "arm1"),
//! ];
//!
//! let tree = HierarchyExporter::new(&segments).export()?;
//! let xml = tree.to_xml_string(&XmlOptions::default())?;
//! assert!(xml.contains(r#"<segment name="gripper"/>"#));
//! # Ok::<(), kinetree_hierarchy::Error>(())
//! ```
//!
//! # Features
//!
//! - `xml-output` (default): nested XML writing and parsing via quick-xml
//! - `serde`: `Serialize` for segments and exported trees

mod adjacency;
mod error;
mod exporter;
mod segment;

#[cfg(feature = "xml-output")]
mod from_xml;
#[cfg(feature = "xml-output")]
mod xml;

pub use adjacency::{AdjacencyMap, OrphanPolicy};
pub use error::{Error, Result};
pub use exporter::{ExportNode, ExportTree, HierarchyExporter, PreOrder, TreeVisitor, VisitNode};
pub use segment::{Attributes, Segment, SegmentKey};

#[cfg(feature = "xml-output")]
pub use from_xml::segments_from_xml;
#[cfg(feature = "xml-output")]
pub use xml::{XmlOptions, XmlPayload};

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_tree_serializes_nested() {
        let segments: Vec<Segment> = vec![
            Segment::root("base").attr("mass", "4"),
            Segment::child("arm", "base"),
        ];
        let tree = HierarchyExporter::new(&segments).export().unwrap();
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                {
                    "id": "base",
                    "payload": [["mass", "4"]],
                    "children": [
                        { "id": "arm", "payload": [], "children": [] }
                    ]
                }
            ])
        );
    }
}
