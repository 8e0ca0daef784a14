//! URDF export from canonical YAML robot model specifications.
//!
//! A model specification lists a root body and a flat set of segments, each
//! naming its parent. The exporter turns that list into a hierarchy with
//! [`kinetree_hierarchy`] and writes links and joints in parent-first order.
//!
//! # Example
//!
//! ```no_run
//! use kinetree_urdf::UrdfExporter;
//!
//! let exporter = UrdfExporter::from_path("golfer.yaml")?;
//! exporter.export("golfer.urdf")?;
//! # Ok::<(), kinetree_urdf::UrdfError>(())
//! ```

mod error;
mod exporter;
pub mod model;

pub use error::{Result, UrdfError};
pub use exporter::UrdfExporter;
pub use model::{BodySpec, Geometry, Joint, JointType, Link, ModelSpec, SegmentSpec};
