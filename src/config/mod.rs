//! Immutable mapping configuration.
//!
//! The embedding application describes each resource type once at startup:
//! its wire schema, which accessors may be written, which wire attributes may
//! be filtered on, how lists are ordered, and which lifecycle operations the
//! store provides for status and membership changes. The built
//! [`ScimConfig`] is shared read-only by every request.
//!
//! # Examples
//!
//! ```rust
//! use scim_mapper::config::{MembershipConfig, ResourceConfig, ScimConfig};
//! use scim_mapper::schema::SchemaNode;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let groups = ResourceConfig::builder("Group")
//!     .schema(SchemaNode::from(json!({
//!         "displayName": {"$ref": "display_name"},
//!         "members": [{"value": {"$ref": "id"}}]
//!     })))
//!     .mutable_attribute("display_name")
//!     .queryable("displayName", "display_name")
//!     .create_key("displayName")
//!     .membership(MembershipConfig::default());
//!
//! let config = ScimConfig::builder().resource(groups).build()?;
//! assert!(config.resource("Group").is_ok());
//! # Ok(())
//! # }
//! ```

use crate::error::{BuildError, BuildResult, ScimError, ScimResult};
use crate::query::{DEFAULT_PAGE_SIZE, ListOrder};
use crate::schema::{AttributePath, SchemaNode};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group membership handling for PATCH add/remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// PATCH `path` designating the member list
    pub accessor: String,
    /// Store operation invoked with the ids to add
    pub add_operation: String,
    /// Store operation invoked with the ids to remove
    pub remove_operation: String,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            accessor: "members".to_string(),
            add_operation: "add_members".to_string(),
            remove_operation: "remove_members".to_string(),
        }
    }
}

/// Active/inactive status toggling for users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Wire key carrying the active flag
    pub accessor: String,
    /// Store operation invoked for a true-like flag
    pub reprovision_operation: String,
    /// Store operation invoked for a false-like flag
    pub deprovision_operation: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            accessor: "active".to_string(),
            reprovision_operation: "activate".to_string(),
            deprovision_operation: "deactivate".to_string(),
        }
    }
}

/// Validated configuration for one resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    resource_type: String,
    schema: SchemaNode,
    mutable_schema: SchemaNode,
    mutable_paths: Vec<(String, AttributePath)>,
    queryable_attributes: BTreeMap<String, String>,
    list_order: ListOrder,
    create_key: Option<String>,
    membership: Option<MembershipConfig>,
    status: Option<StatusConfig>,
}

impl ResourceConfig {
    pub fn builder(resource_type: impl Into<String>) -> ResourceConfigBuilder {
        ResourceConfigBuilder::new(resource_type)
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Wire schema used to serialize entities.
    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    /// Schema mutable attribute paths are resolved against.
    pub fn mutable_schema(&self) -> &SchemaNode {
        &self.mutable_schema
    }

    /// Mutable accessors with their resolved paths, in configured order.
    pub fn mutable_paths(&self) -> &[(String, AttributePath)] {
        &self.mutable_paths
    }

    pub fn mutable_attributes(&self) -> impl Iterator<Item = &str> {
        self.mutable_paths.iter().map(|(accessor, _)| accessor.as_str())
    }

    pub fn path_for(&self, accessor: &str) -> Option<&AttributePath> {
        self.mutable_paths
            .iter()
            .find(|(name, _)| name == accessor)
            .map(|(_, path)| path)
    }

    /// Mutable accessor addressed by a PATCH `path`.
    ///
    /// Either the accessor name itself or the dotted form of its resolved
    /// wire path (`name.givenName`) is accepted.
    pub fn accessor_for_patch_path(&self, patch_path: &str) -> Option<&str> {
        self.mutable_paths
            .iter()
            .find(|(accessor, path)| accessor == patch_path || path.to_string() == patch_path)
            .map(|(accessor, _)| accessor.as_str())
    }

    /// Store attribute for a queryable wire attribute.
    pub fn queryable_attribute(&self, wire_name: &str) -> Option<&str> {
        self.queryable_attributes.get(wire_name).map(String::as_str)
    }

    pub fn queryable_attributes(&self) -> &BTreeMap<String, String> {
        &self.queryable_attributes
    }

    pub fn list_order(&self) -> &ListOrder {
        &self.list_order
    }

    /// Queryable wire attribute identifying a resource on POST.
    pub fn create_key(&self) -> Option<&str> {
        self.create_key.as_deref()
    }

    /// Store attribute used to find-or-create on POST.
    pub fn create_attribute(&self) -> Option<&str> {
        self.create_key
            .as_deref()
            .and_then(|key| self.queryable_attribute(key))
    }

    pub fn membership(&self) -> Option<&MembershipConfig> {
        self.membership.as_ref()
    }

    pub fn status(&self) -> Option<&StatusConfig> {
        self.status.as_ref()
    }
}

/// Builder for [`ResourceConfig`]; also the shape of a resource entry in a
/// JSON configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfigBuilder {
    resource_type: String,
    #[serde(default)]
    schema: Option<SchemaNode>,
    #[serde(default)]
    mutable_schema: Option<SchemaNode>,
    #[serde(default)]
    mutable_attributes: Vec<String>,
    #[serde(default)]
    queryable_attributes: BTreeMap<String, String>,
    #[serde(default)]
    list_order: Option<ListOrder>,
    #[serde(default)]
    create_key: Option<String>,
    #[serde(default)]
    membership: Option<MembershipConfig>,
    #[serde(default)]
    status: Option<StatusConfig>,
}

impl ResourceConfigBuilder {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    pub fn schema(mut self, schema: SchemaNode) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Schema to resolve mutable attributes against, when it differs from
    /// the serialization schema.
    pub fn mutable_schema(mut self, schema: SchemaNode) -> Self {
        self.mutable_schema = Some(schema);
        self
    }

    pub fn mutable_attribute(mut self, accessor: impl Into<String>) -> Self {
        self.mutable_attributes.push(accessor.into());
        self
    }

    pub fn mutable_attributes<I, S>(mut self, accessors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutable_attributes
            .extend(accessors.into_iter().map(Into::into));
        self
    }

    pub fn queryable(mut self, wire_name: impl Into<String>, store_attribute: impl Into<String>) -> Self {
        self.queryable_attributes
            .insert(wire_name.into(), store_attribute.into());
        self
    }

    pub fn list_order(mut self, order: ListOrder) -> Self {
        self.list_order = Some(order);
        self
    }

    pub fn create_key(mut self, wire_name: impl Into<String>) -> Self {
        self.create_key = Some(wire_name.into());
        self
    }

    pub fn membership(mut self, membership: MembershipConfig) -> Self {
        self.membership = Some(membership);
        self
    }

    pub fn status(mut self, status: StatusConfig) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> BuildResult<ResourceConfig> {
        if self.resource_type.trim().is_empty() {
            return Err(BuildError::InvalidConfiguration {
                message: "resource type name cannot be empty".to_string(),
            });
        }

        let schema = self.schema.ok_or_else(|| BuildError::MissingSchema {
            resource_type: self.resource_type.clone(),
        })?;
        let mutable_schema = self.mutable_schema.unwrap_or_else(|| schema.clone());

        let references = mutable_schema.references();
        let mut mutable_paths = Vec::with_capacity(self.mutable_attributes.len());
        for accessor in self.mutable_attributes {
            let occurrences = references.iter().filter(|name| **name == accessor).count();
            if occurrences > 1 {
                return Err(BuildError::DuplicateReference {
                    resource_type: self.resource_type,
                    accessor,
                });
            }
            let path = mutable_schema.resolve(&accessor).ok_or_else(|| {
                BuildError::UnresolvableAttribute {
                    resource_type: self.resource_type.clone(),
                    accessor: accessor.clone(),
                }
            })?;
            if mutable_paths.iter().any(|(name, _)| *name == accessor) {
                warn!(
                    "Mutable attribute '{}' listed twice for {}",
                    accessor, self.resource_type
                );
                continue;
            }
            mutable_paths.push((accessor, path));
        }

        if let Some(key) = &self.create_key {
            if !self.queryable_attributes.contains_key(key) {
                return Err(BuildError::InvalidConfiguration {
                    message: format!(
                        "create key '{}' of {} is not a queryable attribute",
                        key, self.resource_type
                    ),
                });
            }
        }

        if let Some(membership) = &self.membership {
            if mutable_paths.iter().any(|(name, _)| *name == membership.accessor) {
                return Err(BuildError::InvalidConfiguration {
                    message: format!(
                        "membership accessor '{}' of {} cannot also be a mutable attribute",
                        membership.accessor, self.resource_type
                    ),
                });
            }
        }

        Ok(ResourceConfig {
            resource_type: self.resource_type,
            schema,
            mutable_schema,
            mutable_paths,
            queryable_attributes: self.queryable_attributes,
            list_order: self.list_order.unwrap_or_default(),
            create_key: self.create_key,
            membership: self.membership,
            status: self.status,
        })
    }
}

/// Process-wide mapping configuration for all resource types.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimConfig {
    resources: Vec<ResourceConfig>,
    default_page_size: usize,
    max_page_size: Option<usize>,
}

impl ScimConfig {
    pub fn builder() -> ScimConfigBuilder {
        ScimConfigBuilder::default()
    }

    /// Load and validate a JSON configuration document.
    pub fn from_json(document: &str) -> BuildResult<Self> {
        let builder: ScimConfigBuilder =
            serde_json::from_str(document).map_err(|e| BuildError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        builder.build()
    }

    /// Configuration for a resource type.
    pub fn resource(&self, resource_type: &str) -> ScimResult<&ResourceConfig> {
        self.resources
            .iter()
            .find(|config| config.resource_type == resource_type)
            .ok_or_else(|| ScimError::UnsupportedResourceType(resource_type.to_string()))
    }

    pub fn resources(&self) -> &[ResourceConfig] {
        &self.resources
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    pub fn max_page_size(&self) -> Option<usize> {
        self.max_page_size
    }
}

/// Builder for [`ScimConfig`]; also the top-level shape of a JSON
/// configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScimConfigBuilder {
    #[serde(default)]
    resources: Vec<ResourceConfigBuilder>,
    #[serde(default)]
    default_page_size: Option<usize>,
    #[serde(default)]
    max_page_size: Option<usize>,
}

impl ScimConfigBuilder {
    pub fn resource(mut self, resource: ResourceConfigBuilder) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = Some(size);
        self
    }

    pub fn max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = Some(size);
        self
    }

    pub fn build(self) -> BuildResult<ScimConfig> {
        let default_page_size = self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if default_page_size == 0 {
            return Err(BuildError::InvalidConfiguration {
                message: "default page size must be positive".to_string(),
            });
        }

        let mut resources: Vec<ResourceConfig> = Vec::with_capacity(self.resources.len());
        for builder in self.resources {
            let config = builder.build()?;
            if resources
                .iter()
                .any(|existing| existing.resource_type == config.resource_type)
            {
                return Err(BuildError::InvalidConfiguration {
                    message: format!("resource type '{}' configured twice", config.resource_type),
                });
            }
            resources.push(config);
        }

        Ok(ScimConfig {
            resources,
            default_page_size,
            max_page_size: self.max_page_size,
        })
    }
}
