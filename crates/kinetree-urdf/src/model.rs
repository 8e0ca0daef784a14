//! Canonical YAML model specification.
//!
//! A model has one root body and a flat list of segments. Each segment names
//! its parent body; segments without a parent attach to the root.
//!
//! ```yaml
//! name: golfer
//! root:
//!   name: pelvis
//!   mass: 10.0
//!   inertia: { ixx: 0.1, ixy: 0.0, ixz: 0.0, iyy: 0.1, iyz: 0.0, izz: 0.1 }
//! segments:
//!   - name: torso
//!     mass: 20.0
//!     inertia: { ixx: 0.3, ixy: 0.0, ixz: 0.0, iyy: 0.3, iyz: 0.0, izz: 0.2 }
//!     geometry: { type: capsule, size: [0.15, 0.25] }
//!     joint: { type: revolute, axis: [0, 0, 1], limits: [-1.57, 1.57] }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, UrdfError};

fn default_robot_name() -> String {
    "golfer".to_string()
}

fn default_rgba() -> [f64; 4] {
    [0.5, 0.5, 0.5, 1.0]
}

fn default_geometry_type() -> String {
    "box".to_string()
}

/// A robot model: a root body plus a flat segment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Robot name written to `<robot name="...">`.
    #[serde(default = "default_robot_name")]
    pub name: String,
    /// The root body.
    pub root: BodySpec,
    /// All other bodies, each attached to a parent by a joint.
    #[serde(default)]
    pub segments: Vec<SegmentSpec>,
}

/// Mass, inertia and shape of one rigid body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub name: String,
    pub mass: f64,
    pub inertia: InertiaSpec,
    #[serde(default)]
    pub geometry: GeometrySpec,
}

/// Inertia tensor elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertiaSpec {
    pub ixx: f64,
    pub ixy: f64,
    pub ixz: f64,
    pub iyy: f64,
    pub iyz: f64,
    pub izz: f64,
}

/// Visual shape as written in the specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySpec {
    /// `box`, `sphere`, `cylinder` or `capsule`.
    #[serde(rename = "type", default = "default_geometry_type")]
    pub kind: String,
    /// Scalar for spheres, a list for the other shapes.
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default = "default_rgba")]
    pub visual_rgba: [f64; 4],
}

impl Default for GeometrySpec {
    fn default() -> Self {
        Self {
            kind: default_geometry_type(),
            size: None,
            visual_rgba: default_rgba(),
        }
    }
}

/// A geometry size: a single value or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Size {
    Scalar(f64),
    Vector(Vec<f64>),
}

/// A body attached to a parent body by a joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    #[serde(flatten)]
    pub body: BodySpec,
    /// Parent body name. Defaults to the model root.
    #[serde(default)]
    pub parent: Option<String>,
    pub joint: JointSpec,
}

/// Joint connecting a segment to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    #[serde(rename = "type")]
    pub joint_type: String,
    #[serde(default)]
    pub axis: Option<[f64; 3]>,
    /// `[lower, upper]`. Any other length is ignored.
    #[serde(default)]
    pub limits: Option<Vec<f64>>,
}

impl ModelSpec {
    /// Parse a specification from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }
}

/// URDF joint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    Revolute,
    Continuous,
    Prismatic,
    Fixed,
    Floating,
    Planar,
}

impl JointType {
    /// Name used in the URDF `type` attribute.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revolute => "revolute",
            Self::Continuous => "continuous",
            Self::Prismatic => "prismatic",
            Self::Fixed => "fixed",
            Self::Floating => "floating",
            Self::Planar => "planar",
        }
    }
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JointType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "revolute" => Ok(Self::Revolute),
            "continuous" => Ok(Self::Continuous),
            "prismatic" => Ok(Self::Prismatic),
            "fixed" => Ok(Self::Fixed),
            "floating" => Ok(Self::Floating),
            "planar" => Ok(Self::Planar),
            _ => Err(()),
        }
    }
}

/// Resolved visual shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Box { size: [f64; 3] },
    Sphere { radius: f64 },
    Cylinder { radius: f64, length: f64 },
}

impl Geometry {
    /// Resolve a geometry specification, applying per-shape defaults.
    ///
    /// Capsules are written as cylinders; for both, `size` is
    /// `[radius, half_length]`.
    pub fn resolve(spec: &GeometrySpec, body: &str) -> Result<Self> {
        let invalid = |reason: String| UrdfError::InvalidGeometry {
            body: body.to_string(),
            reason,
        };

        let values = |default: &[f64]| -> Vec<f64> {
            match &spec.size {
                None => default.to_vec(),
                Some(Size::Scalar(v)) => vec![*v],
                Some(Size::Vector(v)) => v.clone(),
            }
        };

        match spec.kind.to_ascii_lowercase().as_str() {
            "box" => match values(&[0.1, 0.1, 0.1])[..] {
                [x, y, z] => Ok(Self::Box { size: [x, y, z] }),
                ref other => Err(invalid(format!("box size needs 3 values, got {}", other.len()))),
            },
            "sphere" => match values(&[0.1])[..] {
                [radius] => Ok(Self::Sphere { radius }),
                ref other => Err(invalid(format!("sphere size needs 1 value, got {}", other.len()))),
            },
            kind @ ("cylinder" | "capsule") => match values(&[0.1, 0.1])[..] {
                [radius, half_length] => Ok(Self::Cylinder {
                    radius,
                    length: half_length * 2.0,
                }),
                ref other => Err(invalid(format!("{kind} size needs 2 values, got {}", other.len()))),
            },
            other => Err(invalid(format!("unknown geometry type '{other}'"))),
        }
    }
}

/// Resolved joint of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub joint_type: JointType,
    pub axis: Option<[f64; 3]>,
    /// `(lower, upper)`.
    pub limits: Option<(f64, f64)>,
}

impl Joint {
    /// Resolve a joint specification for `segment`.
    pub fn resolve(spec: &JointSpec, segment: &str) -> Result<Self> {
        let joint_type = spec
            .joint_type
            .parse::<JointType>()
            .map_err(|()| UrdfError::UnsupportedJointType {
                segment: segment.to_string(),
                joint_type: spec.joint_type.clone(),
            })?;

        let limits = match spec.limits.as_deref() {
            None => None,
            Some(&[lower, upper]) => Some((lower, upper)),
            Some(other) => {
                tracing::warn!(segment, count = other.len(), "ignoring joint limits without exactly two values");
                None
            }
        };

        Ok(Self {
            joint_type,
            axis: spec.axis,
            limits,
        })
    }
}

/// Payload of one hierarchy segment: a body and, for non-root bodies, the
/// joint to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Link<'a> {
    pub body: &'a BodySpec,
    pub geometry: Geometry,
    pub joint: Option<Joint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLFER: &str = r#"
name: golfer
root:
  name: pelvis
  mass: 10
  inertia: { ixx: 0.1, ixy: 0, ixz: 0, iyy: 0.1, iyz: 0, izz: 0.1 }
segments:
  - name: torso
    mass: 20.5
    inertia: { ixx: 0.3, ixy: 0, ixz: 0, iyy: 0.3, iyz: 0, izz: 0.2 }
    geometry: { type: capsule, size: [0.15, 0.25], visual_rgba: [1, 0, 0, 1] }
    joint: { type: revolute, axis: [0, 0, 1], limits: [-1.5, 1.5] }
  - name: head
    parent: torso
    mass: 5
    inertia: { ixx: 0.02, ixy: 0, ixz: 0, iyy: 0.02, iyz: 0, izz: 0.02 }
    geometry: { type: sphere, size: 0.1 }
    joint: { type: fixed }
"#;

    #[test]
    fn test_parse_spec() {
        let spec = ModelSpec::from_yaml_str(GOLFER).unwrap();
        assert_eq!(spec.name, "golfer");
        assert_eq!(spec.root.name, "pelvis");
        assert_eq!(spec.root.mass, 10.0);
        assert_eq!(spec.root.geometry, GeometrySpec::default());
        assert_eq!(spec.segments.len(), 2);
        assert_eq!(spec.segments[0].body.name, "torso");
        assert_eq!(spec.segments[0].parent, None);
        assert_eq!(spec.segments[1].parent.as_deref(), Some("torso"));
        assert_eq!(spec.segments[0].body.geometry.visual_rgba, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_default_robot_name() {
        let yaml = r#"
root:
  name: base
  mass: 1
  inertia: { ixx: 1, ixy: 0, ixz: 0, iyy: 1, iyz: 0, izz: 1 }
"#;
        let spec = ModelSpec::from_yaml_str(yaml).unwrap();
        assert_eq!(spec.name, "golfer");
        assert!(spec.segments.is_empty());
    }

    #[test]
    fn test_missing_root_is_yaml_error() {
        let result = ModelSpec::from_yaml_str("name: nothing\n");
        assert!(matches!(result, Err(UrdfError::Yaml(_))));
    }

    #[test]
    fn test_geometry_defaults() {
        let spec = GeometrySpec::default();
        assert_eq!(Geometry::resolve(&spec, "b").unwrap(), Geometry::Box { size: [0.1, 0.1, 0.1] });

        let spec = GeometrySpec {
            kind: "sphere".into(),
            ..GeometrySpec::default()
        };
        assert_eq!(Geometry::resolve(&spec, "b").unwrap(), Geometry::Sphere { radius: 0.1 });

        let spec = GeometrySpec {
            kind: "cylinder".into(),
            ..GeometrySpec::default()
        };
        assert_eq!(
            Geometry::resolve(&spec, "b").unwrap(),
            Geometry::Cylinder { radius: 0.1, length: 0.2 }
        );
    }

    #[test]
    fn test_capsule_becomes_cylinder() {
        let spec = GeometrySpec {
            kind: "capsule".into(),
            size: Some(Size::Vector(vec![0.05, 0.3])),
            ..GeometrySpec::default()
        };
        assert_eq!(
            Geometry::resolve(&spec, "forearm").unwrap(),
            Geometry::Cylinder { radius: 0.05, length: 0.6 }
        );
    }

    #[test]
    fn test_invalid_geometry() {
        let spec = GeometrySpec {
            kind: "torus".into(),
            ..GeometrySpec::default()
        };
        let err = Geometry::resolve(&spec, "ring").unwrap_err();
        assert!(matches!(err, UrdfError::InvalidGeometry { ref body, .. } if body == "ring"));

        let spec = GeometrySpec {
            kind: "box".into(),
            size: Some(Size::Vector(vec![1.0, 2.0])),
            ..GeometrySpec::default()
        };
        assert!(Geometry::resolve(&spec, "crate").is_err());
    }

    #[test]
    fn test_joint_resolution() {
        let spec = JointSpec {
            joint_type: "Revolute".into(),
            axis: Some([0.0, 1.0, 0.0]),
            limits: Some(vec![-0.5, 0.5]),
        };
        let joint = Joint::resolve(&spec, "elbow").unwrap();
        assert_eq!(joint.joint_type, JointType::Revolute);
        assert_eq!(joint.limits, Some((-0.5, 0.5)));

        let spec = JointSpec {
            joint_type: "fixed".into(),
            axis: None,
            limits: Some(vec![1.0]),
        };
        assert_eq!(Joint::resolve(&spec, "mount").unwrap().limits, None);
    }

    #[test]
    fn test_unsupported_joint_type() {
        let spec = JointSpec {
            joint_type: "spherical".into(),
            axis: None,
            limits: None,
        };
        let err = Joint::resolve(&spec, "shoulder").unwrap_err();
        assert!(matches!(
            err,
            UrdfError::UnsupportedJointType { ref segment, ref joint_type }
                if segment == "shoulder" && joint_type == "spherical"
        ));
    }
}
