//! Declarative wire schemas for SCIM resources.
//!
//! A schema is a tree describing how a resource is laid out on the wire and
//! where each store attribute appears in that layout. Leaves are either fixed
//! values ([`SchemaNode::Literal`]) or symbolic accessor names
//! ([`SchemaNode::Reference`]) that are evaluated against an entity.
//!
//! # JSON form
//!
//! Schemas can be read from configuration files. A Reference is written as an
//! object with the single key `$ref`; every other JSON value keeps its own
//! shape:
//!
//! ```rust
//! use scim_mapper::schema::SchemaNode;
//! use serde_json::json;
//!
//! let schema = SchemaNode::from(json!({
//!     "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
//!     "displayName": {"$ref": "display_name"},
//!     "members": [{"value": {"$ref": "id"}}]
//! }));
//!
//! let path = schema.resolve("display_name").unwrap();
//! assert_eq!(path.to_string(), "displayName");
//! ```

pub mod path;

#[cfg(test)]
mod tests;

pub use path::{AttributePath, PathSegment, resolve};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Key marking a Reference node in the JSON form of a schema.
pub const REFERENCE_KEY: &str = "$ref";

/// One node of a wire schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Fixed value emitted as-is
    Literal(Value),
    /// Accessor name evaluated against the entity
    Reference(String),
    /// Ordered mapping of wire key to child node
    Object(Vec<(String, SchemaNode)>),
    /// Ordered sequence of child nodes
    List(Vec<SchemaNode>),
}

impl SchemaNode {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn reference(accessor: impl Into<String>) -> Self {
        Self::Reference(accessor.into())
    }

    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
        )
    }

    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = SchemaNode>,
    {
        Self::List(items.into_iter().collect())
    }

    /// Child of an Object node by wire key.
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        match self {
            Self::Object(entries) => entries
                .iter()
                .find(|(entry_key, _)| entry_key == key)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Top-level wire keys of an Object node, in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Object(entries) => entries.iter().map(|(key, _)| key.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Clone of this schema without the given top-level keys.
    ///
    /// Only the outermost Object is filtered; nested objects keep all of
    /// their keys.
    pub fn without_keys<S: AsRef<str>>(&self, excluded: &[S]) -> SchemaNode {
        match self {
            Self::Object(entries) => Self::Object(
                entries
                    .iter()
                    .filter(|(key, _)| !excluded.iter().any(|ex| ex.as_ref() == key))
                    .cloned()
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Every accessor name referenced in the tree, in depth-first order.
    ///
    /// Duplicates are kept so callers can detect them.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Literal(_) => {}
            Self::Reference(name) => names.push(name),
            Self::Object(entries) => {
                for (_, node) in entries {
                    node.collect_references(names);
                }
            }
            Self::List(items) => {
                for node in items {
                    node.collect_references(names);
                }
            }
        }
    }

    /// Locate an accessor inside this schema. See [`path::resolve`].
    pub fn resolve(&self, accessor: &str) -> Option<AttributePath> {
        path::resolve(accessor, self)
    }

    /// Follow a path from this node.
    pub fn dig(&self, path: &AttributePath) -> Option<&SchemaNode> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (node, segment) {
                (Self::Object(_), PathSegment::Key(key)) => node.get(key),
                (Self::List(items), PathSegment::Index(index)) => items.get(*index),
                _ => None,
            })
    }

    /// JSON form of the schema, with References written as `{"$ref": name}`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Reference(name) => {
                let mut map = Map::new();
                map.insert(REFERENCE_KEY.to_string(), Value::String(name.clone()));
                Value::Object(map)
            }
            Self::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, node)| (key.clone(), node.to_json()))
                    .collect(),
            ),
            Self::List(items) => Value::Array(items.iter().map(SchemaNode::to_json).collect()),
        }
    }
}

impl From<Value> for SchemaNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(Value::String(name)) = map.get(REFERENCE_KEY) {
                        return Self::Reference(name.clone());
                    }
                }
                Self::Object(
                    map.into_iter()
                        .map(|(key, child)| (key, SchemaNode::from(child)))
                        .collect(),
                )
            }
            Value::Array(items) => Self::List(items.into_iter().map(SchemaNode::from).collect()),
            scalar => Self::Literal(scalar),
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(SchemaNode::from)
    }
}
