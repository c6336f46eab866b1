//! Common test utilities for SCIM mapping integration tests.
//!
//! This module provides the bundled mapping configuration, a store carrying
//! the rules a production backend would enforce, and request helpers shared
//! by the lifecycle suites.

#![allow(dead_code)]

use scim_mapper::storage::InMemoryStore;
use scim_mapper::{ScimConfig, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse};
use serde_json::{Value, json};
use std::sync::Arc;

pub const MAPPING: &str = include_str!("../../configs/scim-mapping.json");
pub const PATCH_OP: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

pub type TestHandler = ScimOperationHandler<InMemoryStore>;

/// Route the crate's log output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> Arc<ScimConfig> {
    Arc::new(ScimConfig::from_json(MAPPING).expect("bundled mapping is valid"))
}

/// Store with the User and Group rules the bundled mapping expects.
pub fn store() -> InMemoryStore {
    InMemoryStore::new()
        .with_required("User", "email")
        .with_unique("User", "email")
        .with_status("User", "active")
        .with_required("Group", "display_name")
        .with_membership("Group", "members", "member_ids", "User")
}

pub fn handler() -> TestHandler {
    init_logging();
    ScimOperationHandler::new(config(), store())
}

pub fn user_payload(email: &str, given_name: &str, family_name: &str) -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "userName": email,
        "name": {"givenName": given_name, "familyName": family_name},
        "emails": [{"value": email, "primary": true}],
        "active": true
    })
}

pub fn patch_body(operations: Value) -> Value {
    json!({"schemas": [PATCH_OP], "Operations": operations})
}

/// Create a user in `tenant` and return its id.
pub async fn create_user(handler: &TestHandler, tenant: &str, email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let response = handler
        .handle_operation(
            ScimOperationRequest::create("User", user_payload(email, local, "Test"))
                .with_tenant(tenant),
        )
        .await;
    assert_eq!(response.status, 201, "create user failed: {:?}", response.body);
    resource_id(&response)
}

/// Create a group in `tenant` and return its id.
pub async fn create_group(handler: &TestHandler, tenant: &str, display_name: &str) -> String {
    let response = handler
        .handle_operation(
            ScimOperationRequest::create("Group", json!({"displayName": display_name}))
                .with_tenant(tenant),
        )
        .await;
    assert_eq!(response.status, 201, "create group failed: {:?}", response.body);
    resource_id(&response)
}

pub fn resource_id(response: &ScimOperationResponse) -> String {
    response
        .metadata
        .resource_id
        .clone()
        .expect("response names a resource")
}

pub fn body(response: &ScimOperationResponse) -> &Value {
    response.body.as_ref().expect("response has a body")
}

/// Member ids of a serialized group, in order.
pub fn member_ids(group: &Value) -> Vec<u64> {
    group["members"]
        .as_array()
        .map(|members| {
            members
                .iter()
                .filter_map(|member| member["value"].as_u64())
                .collect()
        })
        .unwrap_or_default()
}

/// Assert the response is a SCIM Error envelope with `status`.
pub fn assert_error(response: &ScimOperationResponse, status: u16) {
    assert_eq!(response.status, status, "unexpected body: {:?}", response.body);
    let body = body(response);
    assert_eq!(
        body["schemas"],
        json!(["urn:ietf:params:scim:api:messages:2.0:Error"])
    );
    assert_eq!(body["status"], json!(status.to_string()));
}
