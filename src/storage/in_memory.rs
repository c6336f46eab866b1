//! In-memory resource store.
//!
//! A thread-safe implementation of [`ResourceStore`] backed by nested maps
//! behind a tokio `RwLock`. It is meant for tests, development and
//! embedding applications that do not need persistence, but it enforces the
//! same kinds of rules a database-backed store would:
//!
//! * Integer ids assigned sequentially per tenant and resource type
//! * `created_at` / `updated_at` stamped as RFC 3339 timestamps
//! * Required and unique attribute rules per resource type
//! * Relations hydrated from an id-list attribute (a group's `members`)
//! * Named lifecycle operations (`activate`, `add_members`, ...)
//!
//! # Example Usage
//!
//! ```rust
//! use scim_mapper::resource::ResourceEntity;
//! use scim_mapper::storage::{InMemoryStore, ResourceStore, StorageKey};
//! use serde_json::{json, Map};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryStore::new()
//!     .with_membership("Group", "members", "member_ids", "User");
//!
//! let users = StorageKey::prefix("acme", "User");
//! let groups = StorageKey::prefix("acme", "Group");
//! let jane = store
//!     .find_or_create(users, "email", &json!("jane@example.com"), Map::new())
//!     .await?;
//! let eng = store
//!     .find_or_create(groups.clone(), "display_name", &json!("Eng"), Map::new())
//!     .await?;
//!
//! let key = groups.key(eng.id_string().unwrap_or_default());
//! let eng = store
//!     .invoke(key, "add_members", Some(json!([jane.id()])))
//!     .await?;
//! assert_eq!(eng.relation("members").map(|m| m.len()), Some(1));
//! # Ok(())
//! # }
//! ```

use crate::error::ValidationError;
use crate::query::{FilterExpression, SortDirection};
use crate::resource::{Record, ResourceEntity};
use crate::storage::{ResourceStore, StorageError, StorageKey, StoragePrefix, StoreQuery};
use chrono::Utc;
use log::{debug, trace};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A custom lifecycle operation: mutate the record in place, or refuse.
pub type OperationFn =
    Arc<dyn Fn(&mut Record, Option<&Value>) -> Result<(), StorageError> + Send + Sync>;

const ID: &str = "id";
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

#[derive(Clone)]
enum Operation {
    SetAttribute { attribute: String, value: Value },
    AddRelated { relation: String },
    RemoveRelated { relation: String },
    Custom(OperationFn),
}

#[derive(Debug, Clone)]
struct Relation {
    id_attribute: String,
    target_type: String,
}

#[derive(Clone, Default)]
struct TypeRules {
    required: Vec<String>,
    unique: Vec<String>,
    relations: BTreeMap<String, Relation>,
    operations: HashMap<String, Operation>,
}

#[derive(Default)]
struct TypeTable {
    next_id: u64,
    records: BTreeMap<u64, Record>,
}

// tenant_id -> resource_type -> records
type Tables = HashMap<String, HashMap<String, TypeTable>>;

/// Thread-safe in-memory store.
///
/// Rules are configured with the `with_*` builder methods before the store
/// is shared; clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<Tables>>,
    rules: Arc<HashMap<String, TypeRules>>,
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.rules.keys().collect();
        types.sort();
        f.debug_struct("InMemoryStore")
            .field("configured_types", &types)
            .finish()
    }
}

impl InMemoryStore {
    /// Create a new empty store with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    fn rules_mut(&mut self, resource_type: &str) -> &mut TypeRules {
        Arc::make_mut(&mut self.rules)
            .entry(resource_type.to_string())
            .or_default()
    }

    /// Reject records of this type whose attribute is null or empty.
    pub fn with_required(mut self, resource_type: &str, attribute: impl Into<String>) -> Self {
        self.rules_mut(resource_type).required.push(attribute.into());
        self
    }

    /// Reject records of this type that share a non-null attribute value.
    pub fn with_unique(mut self, resource_type: &str, attribute: impl Into<String>) -> Self {
        self.rules_mut(resource_type).unique.push(attribute.into());
        self
    }

    /// Hydrate `relation` on records of this type from the ids stored in
    /// `id_attribute`, looked up among `target_type` records of the same
    /// tenant.
    pub fn with_relation(
        mut self,
        resource_type: &str,
        relation: impl Into<String>,
        id_attribute: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        self.rules_mut(resource_type).relations.insert(
            relation.into(),
            Relation {
                id_attribute: id_attribute.into(),
                target_type: target_type.into(),
            },
        );
        self
    }

    /// Register a custom lifecycle operation.
    pub fn with_operation(
        mut self,
        resource_type: &str,
        name: impl Into<String>,
        operation: OperationFn,
    ) -> Self {
        self.rules_mut(resource_type)
            .operations
            .insert(name.into(), Operation::Custom(operation));
        self
    }

    /// Register operations that set a boolean status attribute.
    pub fn with_status_operations(
        mut self,
        resource_type: &str,
        attribute: &str,
        activate: impl Into<String>,
        deactivate: impl Into<String>,
    ) -> Self {
        let rules = self.rules_mut(resource_type);
        rules.operations.insert(
            activate.into(),
            Operation::SetAttribute {
                attribute: attribute.to_string(),
                value: Value::Bool(true),
            },
        );
        rules.operations.insert(
            deactivate.into(),
            Operation::SetAttribute {
                attribute: attribute.to_string(),
                value: Value::Bool(false),
            },
        );
        self
    }

    /// `activate` / `deactivate` toggling `attribute`.
    pub fn with_status(self, resource_type: &str, attribute: &str) -> Self {
        self.with_status_operations(resource_type, attribute, "activate", "deactivate")
    }

    /// Register operations that add ids to, and remove ids from, a relation.
    ///
    /// The relation must be configured with [`with_relation`](Self::with_relation).
    pub fn with_membership_operations(
        mut self,
        resource_type: &str,
        relation: &str,
        add: impl Into<String>,
        remove: impl Into<String>,
    ) -> Self {
        let rules = self.rules_mut(resource_type);
        rules.operations.insert(
            add.into(),
            Operation::AddRelated {
                relation: relation.to_string(),
            },
        );
        rules.operations.insert(
            remove.into(),
            Operation::RemoveRelated {
                relation: relation.to_string(),
            },
        );
        self
    }

    /// A relation plus `add_members` / `remove_members` operations on it.
    pub fn with_membership(
        self,
        resource_type: &str,
        relation: &str,
        id_attribute: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        self.with_relation(resource_type, relation, id_attribute, target_type)
            .with_membership_operations(resource_type, relation, "add_members", "remove_members")
    }

    /// Number of records of a type held for a tenant.
    pub async fn len(&self, prefix: &StoragePrefix) -> usize {
        let data = self.data.read().await;
        table(&data, prefix.tenant_id(), prefix.resource_type())
            .map(|table| table.records.len())
            .unwrap_or(0)
    }

    /// Clear all data (useful for testing).
    pub async fn clear(&self) {
        self.data.write().await.clear();
    }

    fn type_rules(&self, resource_type: &str) -> Option<&TypeRules> {
        self.rules.get(resource_type)
    }

    fn validate(
        &self,
        resource_type: &str,
        table: Option<&TypeTable>,
        record: &Record,
        own_id: Option<u64>,
    ) -> Result<(), ValidationError> {
        let Some(rules) = self.type_rules(resource_type) else {
            return Ok(());
        };

        for attribute in &rules.required {
            if is_blank(record.get(attribute)) {
                return Err(ValidationError::missing_required(attribute));
            }
        }

        let Some(table) = table else {
            return Ok(());
        };
        for attribute in &rules.unique {
            let Some(value) = record.get(attribute).filter(|value| !value.is_null()) else {
                continue;
            };
            let taken = table
                .records
                .iter()
                .filter(|(id, _)| Some(**id) != own_id)
                .any(|(_, other)| other.get(attribute) == Some(value));
            if taken {
                return Err(ValidationError::UniquenessViolation {
                    attribute: attribute.clone(),
                    value: display_value(value),
                });
            }
        }
        Ok(())
    }

    fn hydrate(&self, tables: &HashMap<String, TypeTable>, resource_type: &str, mut record: Record) -> Record {
        record.clear_relations();
        let Some(rules) = self.type_rules(resource_type) else {
            return record;
        };
        for (name, relation) in &rules.relations {
            let target = tables.get(&relation.target_type);
            let related = related_ids(&record, &relation.id_attribute)
                .into_iter()
                .filter_map(|id| target.and_then(|table| table.records.get(&id)))
                .map(|related| {
                    let mut related = related.clone();
                    related.clear_relations();
                    related
                })
                .collect();
            record.set_relation(name.clone(), related);
        }
        record
    }

    fn apply(
        &self,
        tables: &HashMap<String, TypeTable>,
        key: &StorageKey,
        operation_name: &str,
        operation: &Operation,
        record: &mut Record,
        argument: Option<&Value>,
    ) -> Result<(), StorageError> {
        match operation {
            Operation::SetAttribute { attribute, value } => {
                record.set(attribute.clone(), value.clone());
            }
            Operation::AddRelated { relation } => {
                let relation = self.relation(key.resource_type(), relation)?;
                let additions = parse_ids(operation_name, argument)?;
                let target = tables.get(&relation.target_type);
                for id in &additions {
                    if !target.is_some_and(|table| table.records.contains_key(id)) {
                        return Err(StorageError::not_found(
                            relation.target_type.clone(),
                            id.to_string(),
                        ));
                    }
                }
                let mut ids = related_ids(record, &relation.id_attribute);
                for id in additions {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                record.set(relation.id_attribute.clone(), ids_value(&ids));
            }
            Operation::RemoveRelated { relation } => {
                let relation = self.relation(key.resource_type(), relation)?;
                let removals = parse_ids(operation_name, argument)?;
                let ids: Vec<u64> = related_ids(record, &relation.id_attribute)
                    .into_iter()
                    .filter(|id| !removals.contains(id))
                    .collect();
                record.set(relation.id_attribute.clone(), ids_value(&ids));
            }
            Operation::Custom(operation) => (**operation)(record, argument)?,
        }
        Ok(())
    }

    fn relation(&self, resource_type: &str, name: &str) -> Result<&Relation, StorageError> {
        self.type_rules(resource_type)
            .and_then(|rules| rules.relations.get(name))
            .ok_or_else(|| {
                StorageError::internal(format!(
                    "relation '{}' is not configured for {}",
                    name, resource_type
                ))
            })
    }
}

impl ResourceStore for InMemoryStore {
    type Error = StorageError;

    async fn find(&self, key: StorageKey) -> Result<Option<Record>, Self::Error> {
        let Some(id) = parse_id(key.resource_id()) else {
            return Ok(None);
        };
        let data = self.data.read().await;
        let Some(tables) = data.get(key.tenant_id()) else {
            return Ok(None);
        };
        let record = tables
            .get(key.resource_type())
            .and_then(|table| table.records.get(&id))
            .cloned()
            .map(|record| self.hydrate(tables, key.resource_type(), record));
        Ok(record)
    }

    async fn find_or_create(
        &self,
        prefix: StoragePrefix,
        attribute: &str,
        value: &Value,
        attributes: Map<String, Value>,
    ) -> Result<Record, Self::Error> {
        let mut data = self.data.write().await;
        let tables = data.entry(prefix.tenant_id().to_string()).or_default();

        let existing = tables.get(prefix.resource_type()).and_then(|table| {
            table
                .records
                .values()
                .find(|record| record.get(attribute) == Some(value))
                .cloned()
        });
        if let Some(record) = existing {
            trace!("Found existing {} with {} = {}", prefix, attribute, value);
            return Ok(self.hydrate(tables, prefix.resource_type(), record));
        }

        let mut record = Record::from_attributes(writable(attributes));
        record.set(attribute, value.clone());
        self.validate(
            prefix.resource_type(),
            tables.get(prefix.resource_type()),
            &record,
            None,
        )?;

        let table = tables.entry(prefix.resource_type().to_string()).or_default();
        table.next_id += 1;
        let id = table.next_id;
        let now = Value::String(Utc::now().to_rfc3339());
        record.set(ID, Value::from(id));
        record.set(CREATED_AT, now.clone());
        record.set(UPDATED_AT, now);
        table.records.insert(id, record.clone());
        debug!("Created {}/{}", prefix, id);

        Ok(self.hydrate(tables, prefix.resource_type(), record))
    }

    async fn list(&self, prefix: StoragePrefix, query: &StoreQuery) -> Result<Vec<Record>, Self::Error> {
        let data = self.data.read().await;
        let Some(tables) = data.get(prefix.tenant_id()) else {
            return Ok(Vec::new());
        };
        let Some(table) = tables.get(prefix.resource_type()) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<&Record> = table
            .records
            .values()
            .filter(|record| matches_filter(record, query.filter.as_ref()))
            .collect();
        let attribute = query.order.attribute.as_str();
        matching.sort_by(|a, b| {
            let ordering = compare_values(a.get(attribute), b.get(attribute));
            match query.order.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|record| self.hydrate(tables, prefix.resource_type(), record.clone()))
            .collect())
    }

    async fn count(
        &self,
        prefix: StoragePrefix,
        filter: Option<&FilterExpression>,
    ) -> Result<usize, Self::Error> {
        let data = self.data.read().await;
        Ok(table(&data, prefix.tenant_id(), prefix.resource_type())
            .map(|table| {
                table
                    .records
                    .values()
                    .filter(|record| matches_filter(record, filter))
                    .count()
            })
            .unwrap_or(0))
    }

    async fn update(&self, key: StorageKey, attributes: Map<String, Value>) -> Result<Record, Self::Error> {
        let id = parse_id(key.resource_id())
            .ok_or_else(|| StorageError::not_found(key.resource_type(), key.resource_id()))?;
        let mut data = self.data.write().await;
        let tables = data
            .get_mut(key.tenant_id())
            .ok_or_else(|| StorageError::not_found(key.resource_type(), key.resource_id()))?;

        let table = tables.get(key.resource_type());
        let mut record = table
            .and_then(|table| table.records.get(&id))
            .cloned()
            .ok_or_else(|| StorageError::not_found(key.resource_type(), key.resource_id()))?;
        record.merge(&writable(attributes));
        self.validate(key.resource_type(), table, &record, Some(id))?;

        store(tables, &key, id, &mut record);
        debug!("Updated {}", key);
        Ok(self.hydrate(tables, key.resource_type(), record))
    }

    async fn delete(&self, key: StorageKey) -> Result<bool, Self::Error> {
        let Some(id) = parse_id(key.resource_id()) else {
            return Ok(false);
        };
        let mut data = self.data.write().await;
        let existed = data
            .get_mut(key.tenant_id())
            .and_then(|tables| tables.get_mut(key.resource_type()))
            .is_some_and(|table| table.records.remove(&id).is_some());
        if existed {
            debug!("Deleted {}", key);
        }
        Ok(existed)
    }

    async fn invoke(
        &self,
        key: StorageKey,
        operation: &str,
        argument: Option<Value>,
    ) -> Result<Record, Self::Error> {
        let id = parse_id(key.resource_id())
            .ok_or_else(|| StorageError::not_found(key.resource_type(), key.resource_id()))?;
        let mut data = self.data.write().await;
        let tables = data
            .get_mut(key.tenant_id())
            .ok_or_else(|| StorageError::not_found(key.resource_type(), key.resource_id()))?;

        let table = tables.get(key.resource_type());
        let mut record = table
            .and_then(|table| table.records.get(&id))
            .cloned()
            .ok_or_else(|| StorageError::not_found(key.resource_type(), key.resource_id()))?;
        let handler = self
            .type_rules(key.resource_type())
            .and_then(|rules| rules.operations.get(operation))
            .ok_or_else(|| StorageError::unknown_operation(operation))?;

        self.apply(tables, &key, operation, handler, &mut record, argument.as_ref())?;
        self.validate(key.resource_type(), table, &record, Some(id))?;

        store(tables, &key, id, &mut record);
        debug!("Invoked {} on {}", operation, key);
        Ok(self.hydrate(tables, key.resource_type(), record))
    }
}

fn table<'a>(data: &'a Tables, tenant_id: &str, resource_type: &str) -> Option<&'a TypeTable> {
    data.get(tenant_id).and_then(|tables| tables.get(resource_type))
}

fn store(tables: &mut HashMap<String, TypeTable>, key: &StorageKey, id: u64, record: &mut Record) {
    record.set(UPDATED_AT, Value::String(Utc::now().to_rfc3339()));
    record.clear_relations();
    tables
        .entry(key.resource_type().to_string())
        .or_default()
        .records
        .insert(id, record.clone());
}

fn parse_id(id: &str) -> Option<u64> {
    id.trim().parse().ok()
}

// Store-managed attributes cannot be written by callers.
fn writable(mut attributes: Map<String, Value>) -> Map<String, Value> {
    for managed in [ID, CREATED_AT, UPDATED_AT] {
        attributes.remove(managed);
    }
    attributes
}

fn matches_filter(record: &Record, filter: Option<&FilterExpression>) -> bool {
    match filter {
        Some(filter) => record
            .attribute(&filter.attribute)
            .is_some_and(|value| filter.matches(&value)),
        None => true,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn related_ids(record: &Record, id_attribute: &str) -> Vec<u64> {
    match record.get(id_attribute) {
        Some(Value::Array(ids)) => ids.iter().filter_map(Value::as_u64).collect(),
        _ => Vec::new(),
    }
}

fn ids_value(ids: &[u64]) -> Value {
    Value::Array(ids.iter().copied().map(Value::from).collect())
}

/// Member ids as sent by the patch interpreter: numbers or numeric strings.
fn parse_ids(operation: &str, argument: Option<&Value>) -> Result<Vec<u64>, StorageError> {
    let items = match argument {
        Some(Value::Array(items)) => items.as_slice(),
        Some(single) if !single.is_null() => std::slice::from_ref(single),
        _ => {
            return Err(StorageError::invalid_argument(
                operation,
                "expected a list of ids",
            ));
        }
    };
    items
        .iter()
        .map(|item| {
            let id = match item {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => parse_id(s),
                _ => None,
            };
            id.ok_or_else(|| {
                StorageError::invalid_argument(operation, format!("'{}' is not an id", item))
            })
        })
        .collect()
}

/// Null first, then numbers, then strings; mixed kinds fall back to their
/// string forms.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => a.to_string().cmp(&b.to_string()),
            }
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => display_value(a).cmp(&display_value(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
        assert_eq!(compare_values(Some(&Value::Null), None), Ordering::Equal);
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids("add", Some(&json!([1, "2"]))).unwrap(), vec![1, 2]);
        assert_eq!(parse_ids("add", Some(&json!(3))).unwrap(), vec![3]);
        assert!(matches!(
            parse_ids("add", Some(&json!(["x"]))),
            Err(StorageError::InvalidArgument { .. })
        ));
        assert!(parse_ids("add", None).is_err());
    }

    #[tokio::test]
    async fn test_sequential_ids_and_timestamps() {
        let store = InMemoryStore::new();
        let prefix = StorageKey::prefix("acme", "User");
        let first = store
            .find_or_create(prefix.clone(), "email", &json!("a@example.com"), Map::new())
            .await
            .unwrap();
        let second = store
            .find_or_create(prefix.clone(), "email", &json!("b@example.com"), Map::new())
            .await
            .unwrap();
        assert_eq!(first.id(), Some(&json!(1)));
        assert_eq!(second.id(), Some(&json!(2)));
        assert!(first.get(CREATED_AT).and_then(Value::as_str).is_some());
        assert_eq!(store.len(&prefix).await, 2);
    }

    #[tokio::test]
    async fn test_find_or_create_returns_existing() {
        let store = InMemoryStore::new();
        let prefix = StorageKey::prefix("acme", "Group");
        let created = store
            .find_or_create(prefix.clone(), "display_name", &json!("Eng"), attrs(json!({"description": "x"})))
            .await
            .unwrap();
        let found = store
            .find_or_create(prefix.clone(), "display_name", &json!("Eng"), attrs(json!({"description": "y"})))
            .await
            .unwrap();
        assert_eq!(created.id(), found.id());
        assert_eq!(found.get("description"), Some(&json!("x")));
    }

    #[tokio::test]
    async fn test_managed_attributes_are_not_writable() {
        let store = InMemoryStore::new();
        let prefix = StorageKey::prefix("acme", "User");
        let user = store
            .find_or_create(prefix.clone(), "email", &json!("a@example.com"), attrs(json!({"id": 99})))
            .await
            .unwrap();
        assert_eq!(user.id(), Some(&json!(1)));

        let updated = store
            .update(prefix.key("1"), attrs(json!({"id": 5, "first_name": "A"})))
            .await
            .unwrap();
        assert_eq!(updated.id(), Some(&json!(1)));
        assert_eq!(updated.get("first_name"), Some(&json!("A")));
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_absent() {
        let store = InMemoryStore::new();
        assert!(store
            .find(StorageKey::new("acme", "User", "abc"))
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete(StorageKey::new("acme", "User", "abc")).await.unwrap());
        assert!(store
            .update(StorageKey::new("acme", "User", "abc"), Map::new())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_custom_operation() {
        let archive: OperationFn = Arc::new(|record, _| {
            record.set("archived", Value::Bool(true));
            Ok(())
        });
        let store = InMemoryStore::new().with_operation("User", "archive", archive);
        let prefix = StorageKey::prefix("acme", "User");
        store
            .find_or_create(prefix.clone(), "email", &json!("a@example.com"), Map::new())
            .await
            .unwrap();
        let archived = store.invoke(prefix.key("1"), "archive", None).await.unwrap();
        assert_eq!(archived.get("archived"), Some(&json!(true)));
    }
}
