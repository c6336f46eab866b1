//! CRUD operation handlers
//!
//! This module contains handlers for Get, Create, Replace, and Delete
//! operations.

use crate::{
    ScimError,
    error::{ScimResult, ValidationError},
    operation_handler::{
        core::{
            OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
            store_error,
        },
        handlers::patch::{apply_status, status_flag},
    },
    resource::{Record, RequestContext, ResourceMapper},
    storage::ResourceStore,
};
use log::debug;
use serde_json::Value;

fn response(
    status: u16,
    body: Value,
    record: &Record,
    context: &RequestContext,
    resource_type: &str,
) -> ScimOperationResponse {
    ScimOperationResponse::new(
        status,
        Some(body),
        OperationMetadata {
            resource_count: Some(1),
            ..OperationMetadata::for_request(context, resource_type, record.id_string())
        },
    )
}

/// Handle get operations.
pub async fn handle_get<S: ResourceStore>(
    handler: &ScimOperationHandler<S>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let config = handler.resource_config(&request.resource_type)?;
    let resource_id = request
        .resource_id
        .as_deref()
        .ok_or_else(|| ScimError::invalid_request("Missing resource_id for get operation"))?;
    let key = handler
        .prefix(context, &request.resource_type)
        .key(resource_id);
    let record = handler.store().find(key).await.map_err(store_error)?;

    let body = ResourceMapper::new(config).serialize_found(
        record.as_ref(),
        resource_id,
        &request.query.excluded_attributes,
    )?;
    let id = record.as_ref().and_then(Record::id_string);
    Ok(ScimOperationResponse::new(
        200,
        Some(body),
        OperationMetadata {
            resource_count: Some(1),
            ..OperationMetadata::for_request(context, config.resource_type(), id)
        },
    ))
}

/// Handle create operations.
///
/// The resource is found or created by its create key, then given every
/// mutable attribute of the body, then provisioned according to the body's
/// status flag if it carries one.
pub async fn handle_create<S: ResourceStore>(
    handler: &ScimOperationHandler<S>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let config = handler.resource_config(&request.resource_type)?;
    let data = request
        .data
        .as_ref()
        .ok_or_else(|| ScimError::invalid_request("Missing data for create operation"))?;
    let (Some(wire_key), Some(key_attribute)) = (config.create_key(), config.create_attribute())
    else {
        return Err(ScimError::internal(format!(
            "{} has no create key configured",
            config.resource_type()
        )));
    };

    let active = status_flag(config, data)?;
    let mapper = ResourceMapper::new(config);
    let mut attributes = mapper.extract(data);
    let key_value = attributes
        .get(key_attribute)
        .filter(|value| !value.is_null())
        .or_else(|| data.get(wire_key).filter(|value| !value.is_null()))
        .cloned()
        .ok_or_else(|| ValidationError::missing_required(wire_key))?;
    if attributes.get(key_attribute).is_none_or(Value::is_null) {
        attributes.insert(key_attribute.to_string(), key_value.clone());
    }

    let prefix = handler.prefix(context, config.resource_type());
    let found = handler
        .store()
        .find_or_create(prefix.clone(), key_attribute, &key_value, attributes.clone())
        .await
        .map_err(store_error)?;
    let id = found
        .id_string()
        .ok_or_else(|| ScimError::internal("store returned a record without an id"))?;
    let key = prefix.key(id);
    debug!("Create resolved {} = {} to {}", key_attribute, key_value, key);

    let mut record = handler
        .store()
        .update(key.clone(), attributes)
        .await
        .map_err(store_error)?;
    if let Some(active) = active {
        record = apply_status(handler, config, key, active).await?;
    }

    let body = mapper.serialize(&record, &[] as &[&str])?;
    Ok(response(201, body, &record, context, config.resource_type()))
}

/// Handle replace (PUT) operations.
///
/// Every mutable attribute is written; attributes absent from the body are
/// written as null so the store's rules apply to the complete resource.
pub async fn handle_replace<S: ResourceStore>(
    handler: &ScimOperationHandler<S>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let config = handler.resource_config(&request.resource_type)?;
    let (key, _) = handler.find_existing(&request, context).await?;
    let data = request
        .data
        .as_ref()
        .ok_or_else(|| ScimError::invalid_request("Missing data for replace operation"))?;

    let mapper = ResourceMapper::new(config);
    let active = status_flag(config, data)?;
    let mut record = handler
        .store()
        .update(key.clone(), mapper.extract(data))
        .await
        .map_err(store_error)?;
    if let Some(active) = active {
        record = apply_status(handler, config, key, active).await?;
    }

    let body = mapper.serialize(&record, &[] as &[&str])?;
    Ok(response(200, body, &record, context, config.resource_type()))
}

/// Handle delete operations.
pub async fn handle_delete<S: ResourceStore>(
    handler: &ScimOperationHandler<S>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let config = handler.resource_config(&request.resource_type)?;
    let (key, record) = handler.find_existing(&request, context).await?;

    let deleted = handler
        .store()
        .delete(key.clone())
        .await
        .map_err(store_error)?;
    if !deleted {
        return Err(ScimError::resource_not_found(
            config.resource_type(),
            key.resource_id(),
        ));
    }

    Ok(ScimOperationResponse::new(
        204,
        None,
        OperationMetadata::for_request(context, config.resource_type(), record.id_string()),
    ))
}
