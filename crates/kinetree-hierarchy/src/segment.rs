//! Segment records and key types.

use std::fmt;
use std::hash::Hash;

/// Ordered attribute list carried by a segment and passed through unchanged.
pub type Attributes = Vec<(String, String)>;

/// A type usable as a segment identifier.
///
/// Keys must be hashable and printable; the printed form is what error
/// messages report. Keys that are "null" (an empty string) mark a root when
/// used as a parent reference.
pub trait SegmentKey: Eq + Hash + fmt::Display {
    /// Whether this key stands for "no parent".
    fn is_null(&self) -> bool {
        false
    }
}

impl SegmentKey for String {
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl SegmentKey for &str {
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl SegmentKey for Box<str> {
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! integer_keys {
    ($($ty:ty),*) => {
        $(impl SegmentKey for $ty {})*
    };
}

integer_keys!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// A node in a flat hierarchy: an identifier, an optional parent identifier,
/// and an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment<K = String, P = Attributes> {
    /// Unique identifier.
    pub id: K,
    /// Parent identifier. `None` or a null key marks a root.
    pub parent: Option<K>,
    /// Payload passed through to the output untouched.
    pub payload: P,
}

impl<K: SegmentKey, P> Segment<K, P> {
    /// Create a segment with an explicit payload.
    pub fn new(id: K, parent: Option<K>, payload: P) -> Self {
        Self { id, parent, payload }
    }

    /// The parent key, treating null keys as absent.
    pub fn parent_key(&self) -> Option<&K> {
        self.parent.as_ref().filter(|p| !p.is_null())
    }

    /// Whether this segment is a root.
    pub fn is_root(&self) -> bool {
        self.parent_key().is_none()
    }

    /// Replace the payload.
    pub fn with_payload<Q>(self, payload: Q) -> Segment<K, Q> {
        Segment {
            id: self.id,
            parent: self.parent,
            payload,
        }
    }
}

impl<K: SegmentKey, P: Default> Segment<K, P> {
    /// Create a root segment with a default payload.
    pub fn root(id: impl Into<K>) -> Self {
        Self::new(id.into(), None, P::default())
    }

    /// Create a child segment with a default payload.
    pub fn child(id: impl Into<K>, parent: impl Into<K>) -> Self {
        Self::new(id.into(), Some(parent.into()), P::default())
    }
}

impl<K: SegmentKey> Segment<K, Attributes> {
    /// Add an attribute to the payload.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.push((key.into(), value.into()));
        self
    }
}
