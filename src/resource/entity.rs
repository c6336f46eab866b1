//! Store entities as seen by the mapping engine.
//!
//! The engine only ever asks an entity for a named attribute or a named
//! relation. [`Record`] is the attribute bag the bundled store hands out;
//! adapters over other stores can implement [`ResourceEntity`] directly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Read capability of a store entity.
pub trait ResourceEntity {
    /// Value of a named accessor.
    ///
    /// `None` means the entity has no such accessor, which the mapper
    /// reports as [`crate::ScimError::MethodNotFound`]. An accessor that
    /// exists but holds nothing returns `Some(Value::Null)`.
    fn attribute(&self, accessor: &str) -> Option<Value>;

    /// Related entities, such as a group's members.
    fn relation(&self, _name: &str) -> Option<&[Record]> {
        None
    }
}

/// A store record: flat attributes plus hydrated relations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    relations: BTreeMap<String, Vec<Record>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_attributes(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            relations: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// The record's `id` attribute.
    pub fn id(&self) -> Option<&Value> {
        self.attributes.get("id").filter(|id| !id.is_null())
    }

    /// The `id` attribute in the string form used by wire paths.
    pub fn id_string(&self) -> Option<String> {
        self.id().map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Overlay attributes onto the record.
    pub fn merge(&mut self, attributes: &Map<String, Value>) {
        for (name, value) in attributes {
            self.attributes.insert(name.clone(), value.clone());
        }
    }

    pub fn set_relation(&mut self, name: impl Into<String>, related: Vec<Record>) {
        self.relations.insert(name.into(), related);
    }

    pub fn clear_relations(&mut self) {
        self.relations.clear();
    }
}

impl ResourceEntity for Record {
    fn attribute(&self, accessor: &str) -> Option<Value> {
        Some(self.attributes.get(accessor).cloned().unwrap_or(Value::Null))
    }

    fn relation(&self, name: &str) -> Option<&[Record]> {
        self.relations.get(name).map(Vec::as_slice)
    }
}

impl ResourceEntity for Map<String, Value> {
    fn attribute(&self, accessor: &str) -> Option<Value> {
        Some(self.get(accessor).cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_string_forms() {
        assert_eq!(
            Record::new().with_attribute("id", 42).id_string(),
            Some("42".to_string())
        );
        assert_eq!(
            Record::new().with_attribute("id", "abc").id_string(),
            Some("abc".to_string())
        );
        assert_eq!(Record::new().with_attribute("id", Value::Null).id(), None);
    }

    #[test]
    fn test_unset_attribute_reads_as_null() {
        let record = Record::new().with_attribute("display_name", "Eng");
        assert_eq!(record.attribute("display_name"), Some(json!("Eng")));
        assert_eq!(record.attribute("description"), Some(Value::Null));
    }

    #[test]
    fn test_relations() {
        let mut group = Record::new().with_attribute("id", 1);
        assert!(group.relation("members").is_none());
        group.set_relation("members", vec![Record::new().with_attribute("id", 7)]);
        assert_eq!(group.relation("members").map(<[Record]>::len), Some(1));
    }

    #[test]
    fn test_merge_overwrites() {
        let mut record = Record::new().with_attribute("a", 1).with_attribute("b", 2);
        let mut update = Map::new();
        update.insert("b".into(), json!(3));
        record.merge(&update);
        assert_eq!(record.get("a"), Some(&json!(1)));
        assert_eq!(record.get("b"), Some(&json!(3)));
    }
}
