//! URDF export driven by the segment hierarchy walk.

use std::io::Write;
use std::path::{Path, PathBuf};

use kinetree_hierarchy::{Attributes, HierarchyExporter, OrphanPolicy, Segment, TreeVisitor, VisitNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::model::{Geometry, Joint, Link, ModelSpec};
use crate::{Result, UrdfError};

/// Exports a [`ModelSpec`] as URDF.
///
/// Bodies are written in hierarchy pre-order: the root link first, then for
/// every segment the joint from its parent followed by its link. A parent
/// link is therefore always written before any joint that references it.
#[derive(Debug, Clone)]
pub struct UrdfExporter {
    spec: ModelSpec,
    source: Option<PathBuf>,
    policy: OrphanPolicy,
}

impl UrdfExporter {
    /// Create an exporter for an already parsed specification.
    pub fn new(spec: ModelSpec) -> Self {
        Self {
            spec,
            source: None,
            policy: OrphanPolicy::Strict,
        }
    }

    /// Load a YAML specification from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| UrdfError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut exporter = Self::from_yaml_str(&yaml)?;
        exporter.source = Some(path.to_path_buf());
        Ok(exporter)
    }

    /// Parse a YAML specification.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(Self::new(ModelSpec::from_yaml_str(yaml)?))
    }

    /// Set how segments with an unknown parent are handled.
    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The loaded specification.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Path the specification was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Flatten the specification into hierarchy segments with resolved
    /// joints and geometry.
    pub fn segments(&self) -> Result<Vec<Segment<String, Link<'_>>>> {
        let root = &self.spec.root;
        let mut segments = Vec::with_capacity(self.spec.segments.len() + 1);

        segments.push(Segment::new(
            root.name.clone(),
            None,
            Link {
                body: root,
                geometry: Geometry::resolve(&root.geometry, &root.name)?,
                joint: None,
            },
        ));

        for segment in &self.spec.segments {
            let body = &segment.body;
            let parent = segment.parent.clone().unwrap_or_else(|| root.name.clone());
            segments.push(Segment::new(
                body.name.clone(),
                Some(parent),
                Link {
                    body,
                    geometry: Geometry::resolve(&body.geometry, &body.name)?,
                    joint: Some(Joint::resolve(&segment.joint, &body.name)?),
                },
            ));
        }

        Ok(segments)
    }

    /// Segments with a summary payload (mass, joint type), for dumping the
    /// bare hierarchy.
    pub fn summary_segments(&self) -> Vec<Segment> {
        let root = &self.spec.root;
        let mut segments =
            vec![Segment::<String, Attributes>::root(root.name.clone()).attr("mass", root.mass.to_string())];

        segments.extend(self.spec.segments.iter().map(|segment| {
            let parent = segment.parent.clone().unwrap_or_else(|| root.name.clone());
            Segment::new(segment.body.name.clone(), Some(parent), Attributes::new())
                .attr("mass", segment.body.mass.to_string())
                .attr("joint", segment.joint.joint_type.clone())
        }));

        segments
    }

    /// Generate the URDF document.
    pub fn to_urdf_string(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write_urdf(&mut output)?;
        String::from_utf8(output).map_err(|e| UrdfError::Xml(e.to_string()))
    }

    /// Write the URDF document to a writer.
    ///
    /// The hierarchy is validated before anything is written.
    pub fn write_urdf<W: Write>(&self, writer: W) -> Result<()> {
        let segments = self.segments()?;
        let hierarchy = HierarchyExporter::new(&segments).with_policy(self.policy);
        let map = hierarchy.adjacency()?;
        tracing::debug!(robot = %self.spec.name, links = map.len(), depth = map.depth(), "writing URDF");

        let mut urdf = UrdfWriter {
            writer: Writer::new_with_indent(writer, b' ', 2),
        };

        urdf.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

        let mut robot = BytesStart::new("robot");
        robot.push_attribute(("name", self.spec.name.as_str()));
        urdf.writer
            .write_event(Event::Start(robot))?;
        urdf.writer
            .write_event(Event::Comment(BytesText::from_escaped(
                " Generated from canonical YAML specification ",
            )))?;

        hierarchy.walk(&mut urdf)?;

        urdf.end_element("robot")
    }

    /// Write the URDF document to `output`.
    ///
    /// The document is generated in memory first, so a failed export leaves
    /// no partial file behind.
    pub fn export(&self, output: impl AsRef<Path>) -> Result<()> {
        let output = output.as_ref();
        let urdf = self.to_urdf_string()?;

        std::fs::write(output, urdf).map_err(|source| UrdfError::Io {
            path: output.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %output.display(), "exported URDF");
        Ok(())
    }
}

/// Hierarchy visitor writing links and joints.
struct UrdfWriter<W: Write> {
    writer: Writer<W>,
}

impl<'l, W: Write> TreeVisitor<String, Link<'l>> for UrdfWriter<W> {
    type Error = UrdfError;

    fn enter(&mut self, node: VisitNode<'_, String, Link<'l>>, _depth: usize) -> Result<()> {
        let link = node.payload;

        match (node.parent, &link.joint) {
            (Some(parent), Some(joint)) => self.write_joint(parent, node.id, joint)?,
            (None, Some(_)) => {
                tracing::warn!(segment = %node.id, "segment has no parent link, skipping its joint");
            }
            _ => {}
        }

        self.write_link(link)
    }
}

impl<W: Write> UrdfWriter<W> {
    fn write_joint(&mut self, parent: &str, child: &str, joint: &Joint) -> Result<()> {
        let name = format!("{parent}_to_{child}");
        self.start_element("joint", &[("name", &name), ("type", joint.joint_type.as_str())])?;
        self.empty_element("parent", &[("link", parent)])?;
        self.empty_element("child", &[("link", child)])?;

        if let Some(axis) = joint.axis {
            self.empty_element("axis", &[("xyz", &triple(axis))])?;
        }

        if let Some((lower, upper)) = joint.limits {
            self.empty_element("limit", &[("lower", &lower.to_string()), ("upper", &upper.to_string())])?;
        }

        self.end_element("joint")
    }

    fn write_link(&mut self, link: &Link<'_>) -> Result<()> {
        let body = link.body;
        self.start_element("link", &[("name", &body.name)])?;

        self.start_element("inertial", &[])?;
        self.empty_element("mass", &[("value", &body.mass.to_string())])?;
        let i = &body.inertia;
        self.empty_element(
            "inertia",
            &[
                ("ixx", &i.ixx.to_string()),
                ("ixy", &i.ixy.to_string()),
                ("ixz", &i.ixz.to_string()),
                ("iyy", &i.iyy.to_string()),
                ("iyz", &i.iyz.to_string()),
                ("izz", &i.izz.to_string()),
            ],
        )?;
        self.end_element("inertial")?;

        self.start_element("visual", &[])?;
        self.start_element("geometry", &[])?;
        match link.geometry {
            Geometry::Box { size } => self.empty_element("box", &[("size", &triple(size))])?,
            Geometry::Sphere { radius } => self.empty_element("sphere", &[("radius", &radius.to_string())])?,
            Geometry::Cylinder { radius, length } => self.empty_element(
                "cylinder",
                &[("radius", &radius.to_string()), ("length", &length.to_string())],
            )?,
        }
        self.end_element("geometry")?;

        let material = format!("mat_{}", body.name);
        let rgba = body.geometry.visual_rgba.map(|c| c.to_string()).join(" ");
        self.start_element("material", &[("name", &material)])?;
        self.empty_element("color", &[("rgba", &rgba)])?;
        self.end_element("material")?;
        self.end_element("visual")?;

        self.end_element("link")
    }

    fn start_element(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        elem.extend_attributes(attributes.iter().copied());
        self.writer
            .write_event(Event::Start(elem))?;
        Ok(())
    }

    fn empty_element(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        elem.extend_attributes(attributes.iter().copied());
        self.writer
            .write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

fn triple(v: [f64; 3]) -> String {
    format!("{} {} {}", v[0], v[1], v[2])
}
