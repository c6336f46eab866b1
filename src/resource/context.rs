//! Request context and list query parameters for SCIM operations.

/// Request context for SCIM operations.
///
/// Every request is scoped to one tenant (the authenticated company); store
/// lookups never cross that boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Unique identifier for this request
    pub request_id: String,
    /// Tenant the caller is authorized for
    pub tenant_id: String,
}

impl RequestContext {
    /// Create a new request context with a specific request ID.
    pub fn new(request_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            tenant_id: tenant_id.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

/// Query parameters for listing resources.
///
/// Mirrors the SCIM query string: `filter`, `startIndex`, `count` and
/// `excludedAttributes`. Paging values stay signed so out-of-range client
/// input reaches the page window unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Maximum number of results to return
    pub count: Option<i64>,
    /// Starting index for pagination (1-based)
    pub start_index: Option<i64>,
    /// Filter expression
    pub filter: Option<String>,
    /// Top-level attributes to exclude from results
    pub excluded_attributes: Vec<String>,
}

impl ListQuery {
    /// Create a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum count.
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    /// Set the starting index.
    pub fn with_start_index(mut self, start_index: i64) -> Self {
        self.start_index = Some(start_index);
        self
    }

    /// Set a filter expression.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Exclude attributes given as the raw `excludedAttributes` parameter.
    ///
    /// Comma-separated lists are split; blank entries are ignored.
    pub fn with_excluded_attributes(mut self, parameter: &str) -> Self {
        self.excluded_attributes.extend(
            parameter
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        );
        self
    }

    /// Filter with surrounding whitespace removed, if any remains.
    pub fn filter(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_scoped_to_tenant() {
        let context = RequestContext::new("req-1", "acme");
        assert_eq!(context.request_id, "req-1");
        assert_eq!(context.tenant_id(), "acme");
    }

    #[test]
    fn test_excluded_attributes_parameter() {
        let query = ListQuery::new().with_excluded_attributes("members, meta,,");
        assert_eq!(query.excluded_attributes, vec!["members", "meta"]);
    }

    #[test]
    fn test_blank_filter_is_absent() {
        assert_eq!(ListQuery::new().with_filter("  ").filter(), None);
        assert_eq!(
            ListQuery::new().with_filter(" userName eq x ").filter(),
            Some("userName eq x")
        );
    }
}
