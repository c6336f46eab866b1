//! PATCH request interpretation.
//!
//! A PATCH body is classified into a single [`PatchPlan`] before anything
//! touches the store, so a malformed request never causes a partial
//! mutation. Only the first operation of a request is interpreted.
//!
//! # Supported shapes
//!
//! ```json
//! {"Operations": [{"op": "add", "value": [{"value": [1, 2]}]}]}
//! {"Operations": [{"op": "remove", "path": "members", "value": [{"value": "2"}]}]}
//! {"Operations": [{"op": "replace", "value": {"active": false}}]}
//! {"Operations": [{"op": "replace", "path": "name.givenName", "value": "Jane"}]}
//! {"Operations": [{"op": "replace", "value": {"displayName": "Eng"}}]}
//! ```

use crate::config::{MembershipConfig, ResourceConfig};
use crate::error::{ScimError, ScimResult, ValidationError};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// A PATCH request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(rename = "Operations", alias = "operations", default)]
    pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self {
            schemas: vec![PATCH_OP_SCHEMA.to_string()],
            operations,
        }
    }

    /// Parse a request body, reporting shape errors as unsupported patches.
    pub fn from_value(body: Value) -> ScimResult<Self> {
        serde_json::from_value(body)
            .map_err(|e| ScimError::unsupported_patch(format!("malformed PATCH body: {}", e)))
    }
}

/// One partial-update instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn new(op: impl Into<String>, path: Option<&str>, value: Option<Value>) -> Self {
        Self {
            op: op.into(),
            path: path.map(str::to_string),
            value,
        }
    }

    /// `path` with surrounding whitespace removed, if any remains.
    fn target(&self) -> Option<&str> {
        self.path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

/// Recognized `op` values, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

impl FromStr for PatchOp {
    type Err = ScimError;

    fn from_str(op: &str) -> Result<Self, Self::Err> {
        match op.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "replace" => Ok(Self::Replace),
            other => Err(ScimError::unsupported_patch(format!(
                "unsupported op '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
        })
    }
}

/// The store mutation a PATCH request amounts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchPlan {
    /// Update these store attributes in one call.
    Replace(Map<String, Value>),
    /// Reprovision (`active == true`) or deprovision, then update any
    /// attributes that came along in the same value.
    Status {
        active: bool,
        attributes: Map<String, Value>,
    },
    /// Invoke the add-members operation with these ids.
    AddMembers(Vec<Value>),
    /// Invoke the remove-members operation with these ids.
    RemoveMembers(Vec<Value>),
}

/// Interpret the `active` flag.
///
/// `true`, `"true"` and `1` are true-like; `false`, `"false"` and `0` are
/// false-like. Anything else is a validation error.
pub fn parse_active(value: &Value) -> ScimResult<bool> {
    match value {
        Value::Bool(active) => Ok(*active),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        other => Err(ValidationError::InvalidActiveValue {
            value: other.to_string(),
        }
        .into()),
    }
}

/// Classifies PATCH requests for one resource type.
pub struct PatchInterpreter<'a> {
    config: &'a ResourceConfig,
}

impl<'a> PatchInterpreter<'a> {
    pub fn new(config: &'a ResourceConfig) -> Self {
        Self { config }
    }

    pub fn interpret(&self, request: &PatchRequest) -> ScimResult<PatchPlan> {
        let operation = request
            .operations
            .first()
            .ok_or_else(|| ScimError::unsupported_patch("PATCH request has no operations"))?;
        if request.operations.len() > 1 {
            trace!(
                "Ignoring {} trailing PATCH operations for {}",
                request.operations.len() - 1,
                self.config.resource_type()
            );
        }
        let op: PatchOp = operation.op.parse()?;

        if let Some(membership) = self.config.membership() {
            if let Some(plan) = self.membership_plan(membership, op, operation)? {
                trace!("PATCH {} classified as membership change", op);
                return Ok(plan);
            }
        }

        let plan = match operation.target() {
            Some(path) => self.path_plan(op, path, operation.value.as_ref()),
            None => self.value_plan(op, operation.value.as_ref()),
        }?;
        trace!("PATCH {} classified as {:?}", op, plan);
        Ok(plan)
    }

    fn membership_plan(
        &self,
        membership: &MembershipConfig,
        op: PatchOp,
        operation: &PatchOperation,
    ) -> ScimResult<Option<PatchPlan>> {
        let addressed = match operation.target() {
            Some(path) => path == membership.accessor,
            None => matches!(operation.value, Some(Value::Array(_))),
        };
        if !addressed {
            return Ok(None);
        }

        let ids = || member_ids(operation.value.as_ref());
        match op {
            PatchOp::Add => Ok(Some(PatchPlan::AddMembers(ids()?))),
            PatchOp::Remove => Ok(Some(PatchPlan::RemoveMembers(ids()?))),
            PatchOp::Replace if operation.target().is_some() => Err(ScimError::unsupported_patch(
                format!("replace of '{}' is not supported", membership.accessor),
            )),
            PatchOp::Replace => Ok(None),
        }
    }

    fn path_plan(&self, op: PatchOp, path: &str, value: Option<&Value>) -> ScimResult<PatchPlan> {
        if let Some(status) = self.config.status() {
            if path == status.accessor {
                let value = value.ok_or_else(|| {
                    ScimError::unsupported_patch(format!("'{}' requires a value", path))
                })?;
                return Ok(PatchPlan::Status {
                    active: parse_active(value)?,
                    attributes: Map::new(),
                });
            }
        }

        let accessor = self
            .config
            .accessor_for_patch_path(path)
            .ok_or_else(|| ScimError::unsupported_patch(format!("unsupported path '{}'", path)))?;
        let value = match (op, value) {
            (PatchOp::Remove, _) => Value::Null,
            (_, Some(value)) => value.clone(),
            (_, None) => {
                return Err(ScimError::unsupported_patch(format!(
                    "'{}' requires a value",
                    path
                )));
            }
        };

        let mut attributes = Map::new();
        attributes.insert(accessor.to_string(), value);
        Ok(PatchPlan::Replace(attributes))
    }

    fn value_plan(&self, op: PatchOp, value: Option<&Value>) -> ScimResult<PatchPlan> {
        let Some(Value::Object(object)) = value else {
            return Err(ScimError::unsupported_patch(
                "PATCH value without a path must be an object",
            ));
        };
        if op == PatchOp::Remove {
            return Err(ScimError::unsupported_patch("remove requires a path"));
        }
        let payload = Value::Object(object.clone());

        let status_accessor = self.config.status().map(|status| status.accessor.as_str());
        let attributes: Map<String, Value> = self
            .config
            .mutable_paths()
            .iter()
            .filter(|(_, path)| status_accessor.is_none() || path.root_key() != status_accessor)
            .filter_map(|(accessor, path)| {
                path.lookup(&payload)
                    .map(|value| (accessor.clone(), value.clone()))
            })
            .collect();

        match status_accessor
            .and_then(|accessor| object.get(accessor))
            .filter(|flag| !flag.is_null())
        {
            Some(flag) => Ok(PatchPlan::Status {
                active: parse_active(flag)?,
                attributes,
            }),
            None if attributes.is_empty() => Err(ScimError::unsupported_patch(
                "PATCH value names no mutable attribute",
            )),
            None => Ok(PatchPlan::Replace(attributes)),
        }
    }
}

/// Member ids from `[{"value": id}, ...]`, where an element's `value` may
/// itself be a list of ids.
fn member_ids(value: Option<&Value>) -> ScimResult<Vec<Value>> {
    let elements = match value {
        Some(Value::Array(elements)) => elements.as_slice(),
        Some(element @ Value::Object(_)) => std::slice::from_ref(element),
        _ => {
            return Err(ScimError::unsupported_patch(
                "membership change requires a list of members",
            ));
        }
    };

    let mut ids = Vec::with_capacity(elements.len());
    for element in elements {
        match element.get("value") {
            Some(Value::Array(values)) => {
                for id in values {
                    ids.push(scalar_id(id)?);
                }
            }
            Some(id) => ids.push(scalar_id(id)?),
            None => {
                return Err(ScimError::unsupported_patch(
                    "member entry has no value",
                ));
            }
        }
    }
    Ok(ids)
}

fn scalar_id(id: &Value) -> ScimResult<Value> {
    match id {
        Value::String(_) | Value::Number(_) => Ok(id.clone()),
        other => Err(ScimError::unsupported_patch(format!(
            "member value {} is not an id",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MembershipConfig, StatusConfig};
    use crate::schema::SchemaNode;
    use serde_json::json;

    fn user_config() -> ResourceConfig {
        ResourceConfig::builder("User")
            .schema(SchemaNode::from(json!({
                "userName": {"$ref": "email"},
                "name": {"givenName": {"$ref": "first_name"}, "familyName": {"$ref": "last_name"}},
                "emails": [{"value": {"$ref": "email"}}],
                "active": {"$ref": "active"}
            })))
            .mutable_schema(SchemaNode::from(json!({
                "name": {"givenName": {"$ref": "first_name"}, "familyName": {"$ref": "last_name"}},
                "emails": [{"value": {"$ref": "email"}}]
            })))
            .mutable_attributes(["first_name", "last_name", "email"])
            .status(StatusConfig::default())
            .build()
            .unwrap()
    }

    fn group_config() -> ResourceConfig {
        ResourceConfig::builder("Group")
            .schema(SchemaNode::from(json!({
                "displayName": {"$ref": "display_name"},
                "members": [{"value": {"$ref": "id"}}]
            })))
            .mutable_schema(SchemaNode::from(json!({"displayName": {"$ref": "display_name"}})))
            .mutable_attribute("display_name")
            .membership(MembershipConfig::default())
            .build()
            .unwrap()
    }

    fn interpret(config: &ResourceConfig, body: Value) -> ScimResult<PatchPlan> {
        PatchInterpreter::new(config).interpret(&PatchRequest::from_value(body)?)
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_add_members_without_path() {
        let plan = interpret(
            &group_config(),
            json!({"Operations": [{"op": "add", "value": [{"value": [1, 2]}]}]}),
        )
        .unwrap();
        assert_eq!(plan, PatchPlan::AddMembers(vec![json!(1), json!(2)]));
    }

    #[test]
    fn test_remove_members_with_path() {
        let plan = interpret(
            &group_config(),
            json!({"Operations": [{"op": "Remove", "path": "members", "value": [{"value": "2"}, {"value": "3"}]}]}),
        )
        .unwrap();
        assert_eq!(plan, PatchPlan::RemoveMembers(vec![json!("2"), json!("3")]));
    }

    #[test]
    fn test_malformed_membership_value() {
        let config = group_config();
        for body in [
            json!({"Operations": [{"op": "add", "path": "members"}]}),
            json!({"Operations": [{"op": "add", "value": [{"display": "x"}]}]}),
            json!({"Operations": [{"op": "add", "value": [{"value": null}]}]}),
            json!({"Operations": [{"op": "add", "value": [{"value": {"id": 1}}]}]}),
            json!({"Operations": [{"op": "replace", "path": "members", "value": []}]}),
        ] {
            assert!(
                matches!(interpret(&config, body.clone()), Err(ScimError::UnsupportedPatchRequest { .. })),
                "{}",
                body
            );
        }
    }

    #[test]
    fn test_group_display_name_replace() {
        let plan = interpret(
            &group_config(),
            json!({"Operations": [{"op": "replace", "value": {"displayName": "New Name"}}]}),
        )
        .unwrap();
        assert_eq!(plan, PatchPlan::Replace(map(json!({"display_name": "New Name"}))));
    }

    #[test]
    fn test_group_replace_without_known_attribute() {
        let result = interpret(
            &group_config(),
            json!({"Operations": [{"op": "replace", "value": {"description": "x"}}]}),
        );
        assert!(matches!(result, Err(ScimError::UnsupportedPatchRequest { .. })));
    }

    #[test]
    fn test_user_status_values() {
        let config = user_config();
        for (flag, expected) in [
            (json!(true), true),
            (json!("true"), true),
            (json!(1), true),
            (json!(false), false),
            (json!("false"), false),
            (json!(0), false),
        ] {
            let plan = interpret(
                &config,
                json!({"Operations": [{"op": "replace", "value": {"active": flag}}]}),
            )
            .unwrap();
            assert_eq!(
                plan,
                PatchPlan::Status {
                    active: expected,
                    attributes: Map::new()
                }
            );
        }
    }

    #[test]
    fn test_user_invalid_status_value() {
        let result = interpret(
            &user_config(),
            json!({"Operations": [{"op": "replace", "value": {"active": "yes"}}]}),
        );
        assert!(matches!(
            result,
            Err(ScimError::Validation(ValidationError::InvalidActiveValue { .. }))
        ));
    }

    #[test]
    fn test_user_status_with_path() {
        let plan = interpret(
            &user_config(),
            json!({"Operations": [{"op": "Replace", "path": "active", "value": "false"}]}),
        )
        .unwrap();
        assert!(matches!(plan, PatchPlan::Status { active: false, .. }));
    }

    #[test]
    fn test_user_fields_without_status_flag() {
        let plan = interpret(
            &user_config(),
            json!({"Operations": [{"op": "replace", "value": {"name": {"givenName": "Jo"}}}]}),
        )
        .unwrap();
        assert_eq!(plan, PatchPlan::Replace(map(json!({"first_name": "Jo"}))));
    }

    #[test]
    fn test_user_null_status_flag_is_no_flag() {
        let plan = interpret(
            &user_config(),
            json!({"Operations": [{"op": "replace", "value": {"active": null, "name": {"givenName": "Jo"}}}]}),
        )
        .unwrap();
        assert_eq!(plan, PatchPlan::Replace(map(json!({"first_name": "Jo"}))));

        let result = interpret(
            &user_config(),
            json!({"Operations": [{"op": "replace", "value": {"active": null}}]}),
        );
        assert!(matches!(
            result,
            Err(ScimError::UnsupportedPatchRequest { .. })
        ));
    }

    #[test]
    fn test_user_status_and_fields_together() {
        let plan = interpret(
            &user_config(),
            json!({"Operations": [{"op": "replace", "value": {"active": false, "name": {"familyName": "Roe"}}}]}),
        )
        .unwrap();
        assert_eq!(
            plan,
            PatchPlan::Status {
                active: false,
                attributes: map(json!({"last_name": "Roe"}))
            }
        );
    }

    #[test]
    fn test_user_dotted_path_replace() {
        let config = user_config();
        let plan = interpret(
            &config,
            json!({"Operations": [{"op": "replace", "path": "name.givenName", "value": "Jane"}]}),
        )
        .unwrap();
        assert_eq!(plan, PatchPlan::Replace(map(json!({"first_name": "Jane"}))));

        let plan = interpret(
            &config,
            json!({"Operations": [{"op": "remove", "path": "name.familyName"}]}),
        )
        .unwrap();
        assert_eq!(plan, PatchPlan::Replace(map(json!({"last_name": null}))));
    }

    #[test]
    fn test_unknown_path_and_op() {
        let config = user_config();
        assert!(matches!(
            interpret(&config, json!({"Operations": [{"op": "replace", "path": "nickName", "value": "J"}]})),
            Err(ScimError::UnsupportedPatchRequest { .. })
        ));
        assert!(matches!(
            interpret(&config, json!({"Operations": [{"op": "move", "value": {"active": true}}]})),
            Err(ScimError::UnsupportedPatchRequest { .. })
        ));
    }

    #[test]
    fn test_empty_and_malformed_requests() {
        let config = user_config();
        assert!(matches!(
            interpret(&config, json!({"Operations": []})),
            Err(ScimError::UnsupportedPatchRequest { .. })
        ));
        assert!(matches!(
            interpret(&config, json!({"Operations": "replace"})),
            Err(ScimError::UnsupportedPatchRequest { .. })
        ));
        assert!(matches!(
            interpret(&config, json!({"Operations": [{"op": "replace"}]})),
            Err(ScimError::UnsupportedPatchRequest { .. })
        ));
    }

    #[test]
    fn test_only_first_operation_is_read() {
        let plan = interpret(
            &user_config(),
            json!({"Operations": [
                {"op": "replace", "value": {"active": true}},
                {"op": "replace", "path": "name.givenName", "value": "Ignored"}
            ]}),
        )
        .unwrap();
        assert_eq!(
            plan,
            PatchPlan::Status {
                active: true,
                attributes: Map::new()
            }
        );
    }

    #[test]
    fn test_lowercase_operations_key() {
        let plan = interpret(
            &group_config(),
            json!({"operations": [{"op": "add", "path": "members", "value": [{"value": 4}]}]}),
        )
        .unwrap();
        assert_eq!(plan, PatchPlan::AddMembers(vec![json!(4)]));
    }
}
