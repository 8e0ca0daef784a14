//! Kinetree - segment hierarchy export for robot model descriptions.
//!
//! This crate provides a unified interface to the Kinetree crates.
//!
//! # Crates
//!
//! - [`kinetree_hierarchy`] - Flat parent-pointer list to nested tree export
//! - [`kinetree_urdf`] - YAML model specification to URDF
//!
//! # Example
//!
//! ```no_run
//! use kinetree::prelude::*;
//!
//! let exporter = UrdfExporter::from_path("golfer.yaml")?;
//!
//! // Inspect the bare hierarchy
//! let segments = exporter.summary_segments();
//! let tree = HierarchyExporter::new(&segments).export()?;
//! println!("{}", tree.to_xml_string(&XmlOptions::default())?);
//!
//! // Write the URDF
//! exporter.export("golfer.urdf")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use kinetree_hierarchy as hierarchy;
pub use kinetree_urdf as urdf;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use kinetree_hierarchy::{
        segments_from_xml, AdjacencyMap, Attributes, ExportNode, ExportTree, HierarchyExporter, OrphanPolicy,
        Segment, SegmentKey, TreeVisitor, VisitNode, XmlOptions,
    };
    pub use kinetree_urdf::{ModelSpec, UrdfError, UrdfExporter};
}

// Re-export commonly used types at the crate root
pub use kinetree_hierarchy::HierarchyExporter;
pub use kinetree_urdf::UrdfExporter;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
