//! Parent-to-children index built from a flat segment list.
//!
//! The index is built in two linear passes: the first assigns every
//! identifier its position (and rejects duplicates), the second appends each
//! segment to its parent's child list. Looking up the children of a node is
//! then a single slice access instead of a scan of the whole input.

use std::hash::BuildHasherDefault;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::{Error, Result, Segment, SegmentKey};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// How to treat a segment whose parent identifier matches no segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OrphanPolicy {
    /// Reject the input with [`Error::OrphanParent`].
    #[default]
    Strict,
    /// Treat the orphan as an additional root, in input order.
    Lenient,
}

/// Mapping from each segment to its ordered direct children.
///
/// Child order is the order in which segments appear in the input. Roots
/// are kept in input order as well.
#[derive(Debug)]
pub struct AdjacencyMap<'a, K, P> {
    segments: &'a [Segment<K, P>],
    index: FxHashMap<&'a K, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<'a, K: SegmentKey, P> AdjacencyMap<'a, K, P> {
    /// Build the index for `segments`.
    ///
    /// Fails on duplicate identifiers, on orphans under
    /// [`OrphanPolicy::Strict`], and on parent cycles.
    pub fn build(segments: &'a [Segment<K, P>], policy: OrphanPolicy) -> Result<Self> {
        let count = segments.len();

        let mut index: FxHashMap<&'a K, usize> =
            FxHashMap::with_capacity_and_hasher(count, Default::default());
        for (i, segment) in segments.iter().enumerate() {
            if index.insert(&segment.id, i).is_some() {
                return Err(Error::DuplicateIdentifier {
                    id: segment.id.to_string(),
                });
            }
        }

        let mut parents = vec![None; count];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut roots = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            let Some(parent) = segment.parent_key() else {
                roots.push(i);
                continue;
            };

            match index.get(parent) {
                Some(&parent_index) => {
                    parents[i] = Some(parent_index);
                    children[parent_index].push(i);
                }
                None => match policy {
                    OrphanPolicy::Strict => {
                        return Err(Error::OrphanParent {
                            id: segment.id.to_string(),
                            parent: parent.to_string(),
                        });
                    }
                    OrphanPolicy::Lenient => {
                        tracing::debug!(
                            segment = %segment.id,
                            parent = %parent,
                            "unknown parent, promoting segment to root"
                        );
                        roots.push(i);
                    }
                },
            }
        }

        let map = Self {
            segments,
            index,
            parents,
            children,
            roots,
        };
        map.check_reachable()?;

        tracing::debug!(segments = count, roots = map.roots.len(), "built adjacency map");
        Ok(map)
    }

    /// Every segment must be reachable from a root. Anything left over hangs
    /// off a parent cycle, which is reported with its full path.
    fn check_reachable(&self) -> Result<()> {
        let mut reached = vec![false; self.segments.len()];
        let mut reached_count = 0;
        let mut stack: Vec<usize> = self.roots.clone();

        while let Some(node) = stack.pop() {
            if reached[node] {
                continue;
            }
            reached[node] = true;
            reached_count += 1;
            stack.extend(self.children[node].iter().copied());
        }

        if reached_count == self.segments.len() {
            return Ok(());
        }

        let start = reached.iter().position(|r| !r).unwrap_or_default();
        Err(Error::CycleDetected {
            path: self.cycle_from(start),
        })
    }

    /// Follow parent links from `start` until a segment repeats. The returned
    /// path runs from child to parent and closes on its first element.
    fn cycle_from(&self, start: usize) -> Vec<String> {
        let mut position: Vec<Option<usize>> = vec![None; self.segments.len()];
        let mut chain = vec![start];
        position[start] = Some(0);

        let mut current = start;
        while let Some(parent) = self.parents[current] {
            if let Some(at) = position[parent] {
                let mut path: Vec<String> = chain[at..]
                    .iter()
                    .map(|&i| self.segments[i].id.to_string())
                    .collect();
                path.push(self.segments[parent].id.to_string());
                return path;
            }
            position[parent] = Some(chain.len());
            chain.push(parent);
            current = parent;
        }

        // A chain ending in a root would have been reached.
        chain.iter().map(|&i| self.segments[i].id.to_string()).collect()
    }

    /// Number of segments indexed.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments this map indexes.
    pub fn segments(&self) -> &'a [Segment<K, P>] {
        self.segments
    }

    /// Root identifiers in input order.
    pub fn roots(&self) -> impl Iterator<Item = &'a K> + '_ {
        let segments = self.segments;
        self.roots.iter().map(move |&i| &segments[i].id)
    }

    /// Direct children of `id` in input order. Unknown identifiers have none.
    pub fn children_of(&self, id: &K) -> impl Iterator<Item = &'a K> + '_ {
        let segments = self.segments;
        let children: &[usize] = match self.index.get(id) {
            Some(&i) => &self.children[i],
            None => &[],
        };
        children.iter().map(move |&c| &segments[c].id)
    }

    /// Resolved parent of `id`. Roots and promoted orphans have none.
    pub fn parent_of(&self, id: &K) -> Option<&'a K> {
        let i = *self.index.get(id)?;
        self.parents[i].map(|p| &self.segments[p].id)
    }

    /// Look up a segment by identifier.
    pub fn get(&self, id: &K) -> Option<&'a Segment<K, P>> {
        self.index.get(id).map(|&i| &self.segments[i])
    }

    /// Maximum number of segments on any root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(usize, usize)> = self.roots.iter().map(|&r| (r, 1)).collect();

        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.children[node].iter().map(|&c| (c, depth + 1)));
        }

        max_depth
    }

    pub(crate) fn root_indices(&self) -> &[usize] {
        &self.roots
    }

    pub(crate) fn child_indices(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    pub(crate) fn parent_index(&self, index: usize) -> Option<usize> {
        self.parents[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: &str, parent: Option<&str>) -> Segment<String, ()> {
        Segment::new(id.to_string(), parent.map(str::to_string), ())
    }

    fn ids<'a>(iter: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
        iter.map(String::as_str).collect()
    }

    #[test]
    fn test_children_in_input_order() {
        let segments = vec![
            seg("base", None),
            seg("arm1", Some("base")),
            seg("arm2", Some("arm1")),
            seg("gripper", Some("arm1")),
        ];
        let map = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap();

        assert_eq!(ids(map.roots()), ["base"]);
        assert_eq!(ids(map.children_of(&"arm1".to_string())), ["arm2", "gripper"]);
        assert_eq!(map.parent_of(&"gripper".to_string()).map(String::as_str), Some("arm1"));
        assert_eq!(map.depth(), 3);
    }

    #[test]
    fn test_child_before_parent() {
        let segments = vec![seg("hand", Some("arm")), seg("arm", None)];
        let map = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap();
        assert_eq!(ids(map.children_of(&"arm".to_string())), ["hand"]);
    }

    #[test]
    fn test_unknown_id_has_no_children() {
        let segments = vec![seg("base", None)];
        let map = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap();
        assert_eq!(map.children_of(&"nope".to_string()).count(), 0);
        assert!(map.get(&"nope".to_string()).is_none());
    }

    #[test]
    fn test_duplicate_identifier() {
        let segments = vec![seg("base", None), seg("link1", Some("base")), seg("link1", Some("base"))];
        let err = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap_err();
        assert_eq!(err, Error::DuplicateIdentifier { id: "link1".into() });
    }

    #[test]
    fn test_orphan_strict() {
        let segments = vec![seg("base", None), seg("hand", Some("forearm"))];
        let err = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            Error::OrphanParent {
                id: "hand".into(),
                parent: "forearm".into()
            }
        );
    }

    #[test]
    fn test_orphan_lenient_becomes_root() {
        let segments = vec![seg("base", None), seg("hand", Some("forearm")), seg("finger", Some("hand"))];
        let map = AdjacencyMap::build(&segments, OrphanPolicy::Lenient).unwrap();
        assert_eq!(ids(map.roots()), ["base", "hand"]);
        assert_eq!(map.parent_of(&"hand".to_string()), None);
    }

    #[test]
    fn test_two_node_cycle() {
        let segments = vec![seg("base", None), seg("a", Some("b")), seg("b", Some("a"))];
        let err = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            Error::CycleDetected {
                path: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_self_parent_cycle() {
        let segments = vec![seg("a", Some("a"))];
        let err = AdjacencyMap::build(&segments, OrphanPolicy::Lenient).unwrap_err();
        assert_eq!(
            err,
            Error::CycleDetected {
                path: vec!["a".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_tail_into_cycle_reports_cycle_only() {
        let segments = vec![seg("tail", Some("x")), seg("x", Some("y")), seg("y", Some("x"))];
        let err = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            Error::CycleDetected {
                path: vec!["x".into(), "y".into(), "x".into()]
            }
        );
    }

    #[test]
    fn test_integer_keys() {
        let segments: Vec<Segment<u32, ()>> = vec![
            Segment::new(10, None, ()),
            Segment::new(11, Some(10), ()),
            Segment::new(12, Some(10), ()),
        ];
        let map = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap();
        assert_eq!(map.children_of(&10).copied().collect::<Vec<_>>(), [11, 12]);
    }

    #[test]
    fn test_empty() {
        let segments: Vec<Segment<String, ()>> = Vec::new();
        let map = AdjacencyMap::build(&segments, OrphanPolicy::Strict).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.roots().count(), 0);
        assert_eq!(map.depth(), 0);
    }
}
