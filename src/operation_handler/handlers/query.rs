//! Query operation handlers
//!
//! This module contains the List handler: filter parsing, counting, paging
//! and serialization of one ordered window of records.

use crate::{
    error::ScimResult,
    operation_handler::core::{
        OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
        store_error,
    },
    query::{FilterParser, PageWindow},
    resource::{RequestContext, ResourceMapper},
    storage::{ResourceStore, StoreQuery},
};
use log::debug;

/// Handle list operations.
pub async fn handle_list<S: ResourceStore>(
    handler: &ScimOperationHandler<S>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let config = handler.resource_config(&request.resource_type)?;
    let filter = request
        .query
        .filter()
        .map(|filter| FilterParser::new(config).parse(filter))
        .transpose()?;
    if let Some(filter) = &filter {
        debug!("Listing {} where {}", config.resource_type(), filter);
    }

    let prefix = handler.prefix(context, config.resource_type());
    let total = handler
        .store()
        .count(prefix.clone(), filter.as_ref())
        .await
        .map_err(store_error)?;

    let window = PageWindow::compute_with_default(
        request.query.start_index,
        request.query.count,
        total,
        handler.config().default_page_size(),
    )
    .capped(handler.config().max_page_size());

    let query = StoreQuery::new(config.list_order().clone(), window.offset, window.limit)
        .with_filter(filter);
    let records = handler
        .store()
        .list(prefix, &query)
        .await
        .map_err(store_error)?;

    let envelope = ResourceMapper::new(config).list_response(
        &records,
        &window,
        &request.query.excluded_attributes,
    )?;

    Ok(ScimOperationResponse::new(
        200,
        Some(serde_json::to_value(&envelope)?),
        OperationMetadata {
            resource_count: Some(records.len()),
            total_results: Some(total),
            ..OperationMetadata::for_request(context, config.resource_type(), None)
        },
    ))
}
