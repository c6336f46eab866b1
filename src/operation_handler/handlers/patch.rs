//! Patch operation handlers
//!
//! A PATCH is interpreted into a single plan first, then applied with one
//! store call per concern: an attribute update, a lifecycle invocation, or
//! both for a status change that carries attributes.

use crate::{
    ScimError,
    config::ResourceConfig,
    error::ScimResult,
    operation_handler::core::{
        OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
        store_error,
    },
    patch::{PatchInterpreter, PatchPlan, PatchRequest, parse_active},
    resource::{Record, RequestContext, ResourceMapper},
    storage::{ResourceStore, StorageKey},
};
use log::debug;
use serde_json::Value;

/// The status flag carried at the top level of a body, if the resource
/// type has a status and the flag is not null.
pub(crate) fn status_flag(config: &ResourceConfig, data: &Value) -> ScimResult<Option<bool>> {
    let Some(status) = config.status() else {
        return Ok(None);
    };
    match data.get(&status.accessor) {
        None | Some(Value::Null) => Ok(None),
        Some(flag) => parse_active(flag).map(Some),
    }
}

/// Invoke the reprovision or deprovision operation.
pub(crate) async fn apply_status<S: ResourceStore>(
    handler: &ScimOperationHandler<S>,
    config: &ResourceConfig,
    key: StorageKey,
    active: bool,
) -> ScimResult<Record> {
    let status = config.status().ok_or_else(|| {
        ScimError::internal(format!(
            "{} has no status operations configured",
            config.resource_type()
        ))
    })?;
    let operation = if active {
        &status.reprovision_operation
    } else {
        &status.deprovision_operation
    };
    debug!("Invoking {} on {}", operation, key);
    handler
        .store()
        .invoke(key, operation, None)
        .await
        .map_err(store_error)
}

/// Handle patch operations.
pub async fn handle_patch<S: ResourceStore>(
    handler: &ScimOperationHandler<S>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let config = handler.resource_config(&request.resource_type)?;
    let (key, _) = handler.find_existing(&request, context).await?;
    let data = request
        .data
        .ok_or_else(|| ScimError::unsupported_patch("PATCH request has no body"))?;

    let patch = PatchRequest::from_value(data)?;
    let plan = PatchInterpreter::new(config).interpret(&patch)?;
    apply_plan(handler, config, key.clone(), plan).await?;

    let record = handler
        .store()
        .find(key.clone())
        .await
        .map_err(store_error)?
        .ok_or_else(|| ScimError::resource_not_found(config.resource_type(), key.resource_id()))?;
    let body = ResourceMapper::new(config).serialize(&record, &[] as &[&str])?;

    Ok(ScimOperationResponse::new(
        200,
        Some(body),
        OperationMetadata {
            resource_count: Some(1),
            ..OperationMetadata::for_request(context, config.resource_type(), record.id_string())
        },
    ))
}

async fn apply_plan<S: ResourceStore>(
    handler: &ScimOperationHandler<S>,
    config: &ResourceConfig,
    key: StorageKey,
    plan: PatchPlan,
) -> ScimResult<()> {
    let store = handler.store();
    match plan {
        PatchPlan::Replace(attributes) => {
            store.update(key, attributes).await.map_err(store_error)?;
        }
        PatchPlan::Status { active, attributes } => {
            // A rejected update must leave the status untouched
            if !attributes.is_empty() {
                store
                    .update(key.clone(), attributes)
                    .await
                    .map_err(store_error)?;
            }
            apply_status(handler, config, key, active).await?;
        }
        PatchPlan::AddMembers(ids) | PatchPlan::RemoveMembers(ids) if ids.is_empty() => {
            debug!("Membership change on {} names no members", key);
        }
        PatchPlan::AddMembers(ids) => {
            let operation = membership_operation(config, true)?;
            store
                .invoke(key, operation, Some(Value::Array(ids)))
                .await
                .map_err(store_error)?;
        }
        PatchPlan::RemoveMembers(ids) => {
            let operation = membership_operation(config, false)?;
            store
                .invoke(key, operation, Some(Value::Array(ids)))
                .await
                .map_err(store_error)?;
        }
    }
    Ok(())
}

fn membership_operation(config: &ResourceConfig, add: bool) -> ScimResult<&str> {
    let membership = config.membership().ok_or_else(|| {
        ScimError::internal(format!(
            "{} has no membership operations configured",
            config.resource_type()
        ))
    })?;
    Ok(if add {
        &membership.add_operation
    } else {
        &membership.remove_operation
    })
}
