//! Resource store abstraction.
//!
//! The mapping engine never touches persistence directly. Everything it
//! needs from the underlying store is expressed by [`ResourceStore`]: lookup
//! by id, find-or-create by a key attribute, ordered windowed listing,
//! counting, attribute updates, deletion, and invocation of named lifecycle
//! operations such as `activate` or `add_members`.
//!
//! Every call is scoped to a tenant through [`StorageKey`] or
//! [`StoragePrefix`]. A record belonging to another tenant is simply absent,
//! so out-of-scope access is indistinguishable from a missing record.
//!
//! # Example Usage
//!
//! ```rust
//! use scim_mapper::storage::{InMemoryStore, ResourceStore, StorageKey};
//! use serde_json::{json, Map};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryStore::new().with_unique("User", "email");
//! let prefix = StorageKey::prefix("acme", "User");
//!
//! let mut attributes = Map::new();
//! attributes.insert("email".into(), json!("jane@example.com"));
//! let user = store
//!     .find_or_create(prefix, "email", &json!("jane@example.com"), attributes)
//!     .await?;
//!
//! let id = user.id_string().unwrap_or_default();
//! let found = store.find(StorageKey::new("acme", "User", id)).await?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;


pub use errors::StorageError;
pub use in_memory::{InMemoryStore, OperationFn};

use crate::error::ScimError;
use crate::query::{FilterExpression, ListOrder};
use crate::resource::Record;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;

/// A hierarchical key for identifying resources in a store.
///
/// Resources are organized as: `tenant_id` → `resource_type` → `resource_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    tenant_id: String,
    resource_type: String,
    resource_id: String,
}

impl StorageKey {
    /// Create a new storage key.
    pub fn new(
        tenant_id: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Create a prefix for listing resources of a type within a tenant.
    pub fn prefix(tenant_id: impl Into<String>, resource_type: impl Into<String>) -> StoragePrefix {
        StoragePrefix {
            tenant_id: tenant_id.into(),
            resource_type: resource_type.into(),
        }
    }

    /// The tenant/type prefix this key lives under.
    pub fn to_prefix(&self) -> StoragePrefix {
        StorageKey::prefix(self.tenant_id.clone(), self.resource_type.clone())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tenant_id, self.resource_type, self.resource_id
        )
    }
}

/// A prefix for querying resources by tenant and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePrefix {
    tenant_id: String,
    resource_type: String,
}

impl StoragePrefix {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Key for one resource under this prefix.
    pub fn key(&self, resource_id: impl Into<String>) -> StorageKey {
        StorageKey::new(
            self.tenant_id.clone(),
            self.resource_type.clone(),
            resource_id,
        )
    }
}

impl fmt::Display for StoragePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.resource_type)
    }
}

/// Ordered, windowed listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    /// Equality predicate on a store attribute
    pub filter: Option<FilterExpression>,
    pub order: ListOrder,
    pub offset: usize,
    pub limit: usize,
}

impl StoreQuery {
    pub fn new(order: ListOrder, offset: usize, limit: usize) -> Self {
        Self {
            filter: None,
            order,
            offset,
            limit,
        }
    }

    pub fn with_filter(mut self, filter: Option<FilterExpression>) -> Self {
        self.filter = filter;
        self
    }
}

/// Capability the mapping engine requires from the underlying store.
///
/// Implementations own all persistence semantics: validation rules,
/// relation hydration, and what each named lifecycle operation does. The
/// engine only ever addresses attributes and operations by name.
///
/// # Behavior
///
/// - Ids are the string form of whatever the store uses; an id that cannot
///   name a record is reported as absent, not as an error.
/// - `update`, `invoke` and `delete` on an absent key fail with an error
///   that converts to [`ScimError::ResourceNotFound`].
/// - Each mutating call is applied atomically.
pub trait ResourceStore: Send + Sync {
    /// The error type returned by store operations.
    type Error: std::error::Error + Into<ScimError> + Send + Sync + 'static;

    /// Retrieve a record by key, or `None` if it does not exist.
    fn find(&self, key: StorageKey)
    -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send;

    /// Return the record whose `attribute` equals `value`, creating it from
    /// `attributes` when none exists.
    ///
    /// Creation is subject to the store's rules; an existing match is
    /// returned unchanged.
    fn find_or_create(
        &self,
        prefix: StoragePrefix,
        attribute: &str,
        value: &Value,
        attributes: Map<String, Value>,
    ) -> impl Future<Output = Result<Record, Self::Error>> + Send;

    /// List records in `query.order`, skipping `query.offset` and returning at
    /// most `query.limit`.
    ///
    /// If `offset` exceeds the number of matches, or `limit` is 0, an empty
    /// vector is returned.
    fn list(
        &self,
        prefix: StoragePrefix,
        query: &StoreQuery,
    ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send;

    /// Count records matching an optional filter.
    fn count(
        &self,
        prefix: StoragePrefix,
        filter: Option<&FilterExpression>,
    ) -> impl Future<Output = Result<usize, Self::Error>> + Send;

    /// Overlay attributes onto a record and return the stored result.
    fn update(
        &self,
        key: StorageKey,
        attributes: Map<String, Value>,
    ) -> impl Future<Output = Result<Record, Self::Error>> + Send;

    /// Delete a record.
    ///
    /// Returns `true` if the record was deleted, `false` if it didn't exist.
    fn delete(&self, key: StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Invoke a named lifecycle operation on a record.
    fn invoke(
        &self,
        key: StorageKey,
        operation: &str,
        argument: Option<Value>,
    ) -> impl Future<Output = Result<Record, Self::Error>> + Send;
}

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn test_storage_key() {
        let key = StorageKey::new("tenant1", "User", "123");
        assert_eq!(key.tenant_id(), "tenant1");
        assert_eq!(key.resource_type(), "User");
        assert_eq!(key.resource_id(), "123");
        assert_eq!(key.to_string(), "tenant1/User/123");
        assert_eq!(key.to_prefix(), StorageKey::prefix("tenant1", "User"));
    }

    #[test]
    fn test_storage_prefix() {
        let prefix = StorageKey::prefix("tenant1", "User");
        assert_eq!(prefix.to_string(), "tenant1/User");
        assert_eq!(prefix.key("9"), StorageKey::new("tenant1", "User", "9"));
    }
}
