//! Schema-driven mapping between store entities and SCIM wire trees.
//!
//! Reading walks the wire schema and replaces each Reference with the
//! entity's value for that accessor. Writing goes the other way: each
//! mutable accessor's schema path is looked up in the incoming payload,
//! producing a flat attribute map for a single store update.

use crate::config::ResourceConfig;
use crate::error::{ScimError, ScimResult};
use crate::operation_handler::response::ListResponse;
use crate::query::PageWindow;
use crate::resource::entity::{Record, ResourceEntity};
use crate::schema::SchemaNode;
use log::warn;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Serialize an entity through a wire schema.
///
/// Top-level keys named in `excluded` are dropped from a clone of the schema
/// before traversal. A List node under an Object key `k` is expanded once per
/// related entity when the entity exposes a relation named `k`; otherwise the
/// list's items are evaluated against the entity itself.
pub fn serialize<E, S>(entity: &E, schema: &SchemaNode, excluded: &[S]) -> ScimResult<Value>
where
    E: ResourceEntity + ?Sized,
    S: AsRef<str>,
{
    let schema = if excluded.is_empty() {
        Cow::Borrowed(schema)
    } else {
        Cow::Owned(schema.without_keys(excluded))
    };
    render(entity, &schema)
}

fn render<E>(entity: &E, node: &SchemaNode) -> ScimResult<Value>
where
    E: ResourceEntity + ?Sized,
{
    match node {
        SchemaNode::Literal(value) => Ok(value.clone()),
        SchemaNode::Reference(accessor) => entity
            .attribute(accessor)
            .ok_or_else(|| ScimError::MethodNotFound(accessor.clone())),
        SchemaNode::Object(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, child) in entries {
                let value = match (child, entity.relation(key)) {
                    (SchemaNode::List(templates), Some(related)) => {
                        render_related(related, templates)?
                    }
                    _ => render(entity, child)?,
                };
                object.insert(key.clone(), value);
            }
            Ok(Value::Object(object))
        }
        SchemaNode::List(items) => items
            .iter()
            .map(|child| render(entity, child))
            .collect::<ScimResult<Vec<_>>>()
            .map(Value::Array),
    }
}

fn render_related(related: &[Record], templates: &[SchemaNode]) -> ScimResult<Value> {
    let mut items = Vec::with_capacity(related.len() * templates.len());
    for member in related {
        for template in templates {
            items.push(render(member, template)?);
        }
    }
    Ok(Value::Array(items))
}

/// Mapper bound to one resource type, using its cached attribute paths.
#[derive(Debug, Clone, Copy)]
pub struct ResourceMapper<'a> {
    config: &'a ResourceConfig,
}

impl<'a> ResourceMapper<'a> {
    pub fn new(config: &'a ResourceConfig) -> Self {
        Self { config }
    }

    pub fn serialize<E, S>(&self, entity: &E, excluded: &[S]) -> ScimResult<Value>
    where
        E: ResourceEntity + ?Sized,
        S: AsRef<str>,
    {
        serialize(entity, self.config.schema(), excluded)
    }

    /// Serialize a single looked-up entity, or report it missing.
    pub fn serialize_found<E, S>(
        &self,
        entity: Option<&E>,
        id: &str,
        excluded: &[S],
    ) -> ScimResult<Value>
    where
        E: ResourceEntity,
        S: AsRef<str>,
    {
        match entity {
            Some(entity) => self.serialize(entity, excluded),
            None => Err(ScimError::resource_not_found(
                self.config.resource_type(),
                id,
            )),
        }
    }

    /// All mutable attributes, `null` where the payload lacks them.
    pub fn extract(&self, payload: &Value) -> Map<String, Value> {
        self.config
            .mutable_paths()
            .iter()
            .map(|(accessor, path)| {
                let value = path.lookup(payload).cloned().unwrap_or(Value::Null);
                (accessor.clone(), value)
            })
            .collect()
    }

    /// Assemble a ListResponse for one page of records.
    pub fn list_response<S: AsRef<str>>(
        &self,
        records: &[Record],
        window: &PageWindow,
        excluded: &[S],
    ) -> ScimResult<ListResponse> {
        let resources = records
            .iter()
            .map(|record| self.serialize(record, excluded))
            .collect::<ScimResult<Vec<_>>>()?;
        Ok(ListResponse::new(window, resources))
    }
}
