//! # Field Paths
//!
//! Locations inside a payload, rendered as RFC 6901 JSON Pointers
//! (`/components/0/components/2/custom_id`). Paths are built incrementally
//! during descent; each step clones the parent, which keeps the validator
//! free of shared mutable path state.

use std::fmt;

use serde::{Serialize, Serializer};

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// An object member.
    Key(String),
    /// An array element.
    Index(usize),
}

/// A JSON Pointer into a payload.
///
/// The root path displays as `(root)`; [`FieldPath::to_pointer`] renders
/// it as the empty pointer instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// The path of the payload root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend this path with an object member.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.into()));
        Self(segments)
    }

    /// Extend this path with an array index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The final member name, if the path ends in an object key.
    pub fn last_key(&self) -> Option<&str> {
        match self.0.last() {
            Some(Segment::Key(k)) => Some(k.as_str()),
            _ => None,
        }
    }

    /// Render as an RFC 6901 pointer, escaping `~` and `/` in member names.
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            out.push('/');
            match segment {
                Segment::Key(k) => out.push_str(&k.replace('~', "~0").replace('/', "~1")),
                Segment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.to_pointer())
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pointer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_as_root_marker() {
        let root = FieldPath::root();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "(root)");
        assert_eq!(root.to_pointer(), "");
    }

    #[test]
    fn nested_path_renders_as_pointer() {
        let p = FieldPath::root()
            .key("components")
            .index(0)
            .key("components")
            .index(3)
            .key("custom_id");
        assert_eq!(p.to_string(), "/components/0/components/3/custom_id");
        assert_eq!(p.depth(), 5);
        assert_eq!(p.last_key(), Some("custom_id"));
    }

    #[test]
    fn pointer_escapes_reserved_characters() {
        let p = FieldPath::root().key("a/b").key("c~d");
        assert_eq!(p.to_pointer(), "/a~1b/c~0d");
    }

    #[test]
    fn extending_does_not_mutate_parent() {
        let parent = FieldPath::root().key("embeds");
        let child = parent.index(2);
        assert_eq!(parent.to_string(), "/embeds");
        assert_eq!(child.to_string(), "/embeds/2");
    }

    #[test]
    fn serializes_as_pointer_string() {
        let p = FieldPath::root().key("flags");
        assert_eq!(serde_json::to_value(&p).unwrap(), serde_json::json!("/flags"));
    }
}
