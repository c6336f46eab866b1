//! Attribute path resolution over wire schemas.
//!
//! An [`AttributePath`] is the sequence of object keys and list indices that
//! leads from the root of a schema to the node referencing an accessor. The
//! same path is then used to look values up in incoming JSON payloads, which
//! is what lets nested wire shapes map onto flat store attributes.

use super::SchemaNode;
use log::trace;
use serde_json::Value;
use std::fmt;

/// One step of an attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Ordered keys/indices locating an accessor inside a schema.
///
/// Displays in dotted form, e.g. `name.givenName` or `emails.0.value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttributePath {
    segments: Vec<PathSegment>,
}

impl AttributePath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First key of the path, if it starts with one.
    pub fn root_key(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PathSegment::Key(key)) => Some(key.as_str()),
            _ => None,
        }
    }

    /// Look the path up inside a JSON payload.
    ///
    /// A missing key, an out-of-range index or a segment that does not fit
    /// the value's shape yields `None` rather than an error.
    pub fn lookup<'a>(&self, payload: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(payload, |current, segment| match segment {
                PathSegment::Key(key) => current.as_object()?.get(key),
                PathSegment::Index(index) => current.as_array()?.get(*index),
            })
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for AttributePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self::new(segments)
    }
}

/// Find where `accessor` is referenced inside `schema`.
///
/// Depth-first, in declaration order; the first Reference whose name equals
/// `accessor` wins. Literal leaves never match. Returns `None` when no
/// Reference in the tree carries the name.
pub fn resolve(accessor: &str, schema: &SchemaNode) -> Option<AttributePath> {
    let mut segments = Vec::new();
    if descend(accessor, schema, &mut segments) {
        trace!("Resolved accessor '{}' to path {:?}", accessor, segments);
        Some(AttributePath::new(segments))
    } else {
        trace!("Accessor '{}' not present in schema", accessor);
        None
    }
}

fn descend(accessor: &str, node: &SchemaNode, segments: &mut Vec<PathSegment>) -> bool {
    match node {
        SchemaNode::Reference(name) => name == accessor,
        SchemaNode::Literal(_) => false,
        SchemaNode::Object(entries) => {
            for (key, child) in entries {
                segments.push(PathSegment::Key(key.clone()));
                if descend(accessor, child, segments) {
                    return true;
                }
                segments.pop();
            }
            false
        }
        SchemaNode::List(items) => {
            for (index, child) in items.iter().enumerate() {
                segments.push(PathSegment::Index(index));
                if descend(accessor, child, segments) {
                    return true;
                }
                segments.pop();
            }
            false
        }
    }
}
