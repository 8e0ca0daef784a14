//! Depth-first export of a segment hierarchy.

use crate::{AdjacencyMap, Error, OrphanPolicy, Result, Segment, SegmentKey};

/// A segment as seen by a [`TreeVisitor`].
#[derive(Debug)]
pub struct VisitNode<'a, K, P> {
    /// Segment identifier.
    pub id: &'a K,
    /// Resolved parent identifier (`None` for roots and promoted orphans).
    pub parent: Option<&'a K>,
    /// Segment payload.
    pub payload: &'a P,
    /// Position of the segment in the input list.
    pub index: usize,
}

impl<K, P> Clone for VisitNode<'_, K, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, P> Copy for VisitNode<'_, K, P> {}

/// Receives the pre-order enter/leave events of a hierarchy walk.
///
/// `depth` is 0 for roots. `leave` fires after all of a node's descendants.
pub trait TreeVisitor<K, P> {
    /// Error type returned by the visitor. Hierarchy errors convert into it.
    type Error: From<Error>;

    /// Called when a node is entered, before any of its children.
    fn enter(&mut self, node: VisitNode<'_, K, P>, depth: usize) -> std::result::Result<(), Self::Error>;

    /// Called when a node is left, after all of its children.
    fn leave(&mut self, node: VisitNode<'_, K, P>, depth: usize) -> std::result::Result<(), Self::Error> {
        let _ = (node, depth);
        Ok(())
    }
}

/// Converts a flat list of segments into a nested tree.
///
/// # Example
///
/// ```
/// use kinetree_hierarchy::{HierarchyExporter, Segment};
///
/// let segments: Vec<Segment> = vec![
///     Segment::root("base"),
///     Segment::child("arm1", "base"),
///     Segment::child("arm2", "arm1"),
///     Segment::child("gripper", "arm1"),
/// ];
///
/// let tree = HierarchyExporter::new(&segments).export()?;
/// let arm1 = &tree.roots()[0].children[0];
/// assert_eq!(arm1.id, "arm1");
/// assert_eq!(arm1.children[0].id, "arm2");
/// assert_eq!(arm1.children[1].id, "gripper");
/// # Ok::<(), kinetree_hierarchy::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HierarchyExporter<'a, K, P> {
    segments: &'a [Segment<K, P>],
    policy: OrphanPolicy,
}

impl<'a, K: SegmentKey, P> HierarchyExporter<'a, K, P> {
    /// Create an exporter using [`OrphanPolicy::Strict`].
    pub fn new(segments: &'a [Segment<K, P>]) -> Self {
        Self {
            segments,
            policy: OrphanPolicy::default(),
        }
    }

    /// Set the orphan policy.
    pub fn with_policy(mut self, policy: OrphanPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The orphan policy in effect.
    pub fn policy(&self) -> OrphanPolicy {
        self.policy
    }

    /// Build and validate the adjacency map for the input.
    pub fn adjacency(&self) -> Result<AdjacencyMap<'a, K, P>> {
        AdjacencyMap::build(self.segments, self.policy)
    }

    /// Export the hierarchy as a nested tree.
    ///
    /// Roots appear in input order, children in input order beneath their
    /// parent. On error nothing is returned.
    pub fn export(&self) -> Result<ExportTree<'a, K, P>> {
        let map = self.adjacency()?;
        let mut builder = TreeBuilder::default();
        drive(
            &map,
            &mut BuilderAdapter {
                builder: &mut builder,
                segments: self.segments,
            },
        )?;

        let tree = ExportTree { roots: builder.roots };
        tracing::debug!(segments = self.segments.len(), roots = tree.roots.len(), "exported hierarchy");
        Ok(tree)
    }

    /// Walk the hierarchy in pre-order, feeding `visitor`.
    ///
    /// The input is fully validated before the first event, so a visitor
    /// never sees part of an invalid hierarchy.
    pub fn walk<V: TreeVisitor<K, P>>(&self, visitor: &mut V) -> std::result::Result<(), V::Error> {
        let map = self.adjacency()?;
        drive(&map, visitor)
    }
}

/// Iterative pre-order traversal over a validated map.
///
/// Keeps an on-path marker per segment and fails with
/// [`Error::CycleDetected`] if a child is already on the active path.
fn drive<K: SegmentKey, P, V: TreeVisitor<K, P>>(
    map: &AdjacencyMap<'_, K, P>,
    visitor: &mut V,
) -> std::result::Result<(), V::Error> {
    let segments = map.segments();
    let node_at = |index: usize| VisitNode {
        id: &segments[index].id,
        parent: map.parent_index(index).map(|p| &segments[p].id),
        payload: &segments[index].payload,
        index,
    };

    let mut on_path = vec![false; segments.len()];
    // (segment index, next child cursor)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for &root in map.root_indices() {
        on_path[root] = true;
        visitor.enter(node_at(root), 0)?;
        stack.push((root, 0));

        while let Some(top) = stack.last_mut() {
            let (node, cursor) = *top;

            match map.child_indices(node).get(cursor) {
                Some(&child) => {
                    top.1 += 1;

                    if on_path[child] {
                        let from = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[from..].iter().map(|&(n, _)| segments[n].id.to_string()).collect();
                        path.push(segments[child].id.to_string());
                        return Err(Error::CycleDetected { path }.into());
                    }

                    on_path[child] = true;
                    visitor.enter(node_at(child), stack.len())?;
                    stack.push((child, 0));
                }
                None => {
                    stack.pop();
                    on_path[node] = false;
                    visitor.leave(node_at(node), stack.len())?;
                }
            }
        }
    }

    Ok(())
}

/// A node of an exported tree, borrowing from the input segments.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExportNode<'a, K, P> {
    /// Segment identifier.
    pub id: &'a K,
    /// Segment payload.
    pub payload: &'a P,
    /// Children in input order.
    pub children: Vec<ExportNode<'a, K, P>>,
}

impl<'a, K, P> ExportNode<'a, K, P> {
    fn new(id: &'a K, payload: &'a P) -> Self {
        Self {
            id,
            payload,
            children: Vec::new(),
        }
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl<K, P> Drop for ExportNode<'_, K, P> {
    // Flatten before dropping so deep chains do not recurse.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// The nested result of an export.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct ExportTree<'a, K, P> {
    roots: Vec<ExportNode<'a, K, P>>,
}

impl<'a, K, P> ExportTree<'a, K, P> {
    /// Top-level nodes in input order.
    pub fn roots(&self) -> &[ExportNode<'a, K, P>] {
        &self.roots
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.pre_order().count()
    }

    /// Iterate nodes in pre-order together with their depth (roots at 0).
    pub fn pre_order(&self) -> PreOrder<'_, 'a, K, P> {
        PreOrder {
            stack: self.roots.iter().rev().map(|n| (n, 0)).collect(),
        }
    }

    /// `(parent, child)` identifier pairs in pre-order.
    pub fn edges(&self) -> Vec<(&'a K, &'a K)> {
        let mut edges = Vec::new();
        let mut stack: Vec<&ExportNode<'a, K, P>> = self.roots.iter().rev().collect();

        while let Some(node) = stack.pop() {
            edges.extend(node.children.iter().map(|c| (node.id, c.id)));
            stack.extend(node.children.iter().rev());
        }

        edges
    }
}

/// Pre-order iterator over an [`ExportTree`].
pub struct PreOrder<'t, 'a, K, P> {
    stack: Vec<(&'t ExportNode<'a, K, P>, usize)>,
}

impl<'t, 'a, K, P> Iterator for PreOrder<'t, 'a, K, P> {
    type Item = (&'t ExportNode<'a, K, P>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        Some((node, depth))
    }
}

/// Visitor assembling an [`ExportTree`] from walk events.
struct TreeBuilder<'a, K, P> {
    open: Vec<ExportNode<'a, K, P>>,
    roots: Vec<ExportNode<'a, K, P>>,
}

impl<K, P> Default for TreeBuilder<'_, K, P> {
    fn default() -> Self {
        Self {
            open: Vec::new(),
            roots: Vec::new(),
        }
    }
}

impl<'a, K, P> TreeBuilder<'a, K, P> {
    fn enter_node(&mut self, id: &'a K, payload: &'a P) {
        self.open.push(ExportNode::new(id, payload));
    }

    fn leave_node(&mut self) {
        if let Some(node) = self.open.pop() {
            match self.open.last_mut() {
                Some(parent) => parent.children.push(node),
                None => self.roots.push(node),
            }
        }
    }
}

/// Bridges the short-lived [`VisitNode`] borrows back to input indices so
/// the builder can hold `'a` references.
struct BuilderAdapter<'b, 'a, K, P> {
    builder: &'b mut TreeBuilder<'a, K, P>,
    segments: &'a [Segment<K, P>],
}

impl<K, P> TreeVisitor<K, P> for BuilderAdapter<'_, '_, K, P> {
    type Error = Error;

    fn enter(&mut self, node: VisitNode<'_, K, P>, _depth: usize) -> Result<()> {
        let segment = &self.segments[node.index];
        self.builder.enter_node(&segment.id, &segment.payload);
        Ok(())
    }

    fn leave(&mut self, _node: VisitNode<'_, K, P>, _depth: usize) -> Result<()> {
        self.builder.leave_node();
        Ok(())
    }
}
