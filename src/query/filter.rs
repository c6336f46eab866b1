//! Parser for the single-clause SCIM filter grammar.
//!
//! Only `attribute eq value` is understood. The attribute is translated to
//! its store name through the resource type's queryable attribute table, and
//! everything after the operator is the comparison value, so values
//! containing spaces survive tokenization:
//!
//! ```rust
//! # use scim_mapper::config::ResourceConfig;
//! # use scim_mapper::query::{FilterOperator, FilterParser};
//! # use scim_mapper::schema::SchemaNode;
//! # use serde_json::json;
//! let config = ResourceConfig::builder("Group")
//!     .schema(SchemaNode::from(json!({"displayName": {"$ref": "display_name"}})))
//!     .queryable("displayName", "display_name")
//!     .build()
//!     .unwrap();
//!
//! let expression = FilterParser::new(&config).parse("displayName eq Test Group #1").unwrap();
//! assert_eq!(expression.attribute, "display_name");
//! assert_eq!(expression.operator, FilterOperator::Equals);
//! assert_eq!(expression.value, "Test Group #1");
//! ```

use crate::config::ResourceConfig;
use crate::error::{ScimError, ScimResult};
use log::trace;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Comparison operators understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FilterOperator {
    Equals,
}

impl FilterOperator {
    /// Parse the wire operator token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(Self::Equals),
            _ => None,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => f.write_str("eq"),
        }
    }
}

/// A parsed `attribute operator value` clause, in store terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterExpression {
    /// Store attribute the clause compares
    pub attribute: String,
    pub operator: FilterOperator,
    /// Literal comparison value with surrounding quotes removed
    pub value: String,
}

impl FilterExpression {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: FilterOperator::Equals,
            value: value.into(),
        }
    }

    /// Evaluate the clause against a stored attribute value.
    ///
    /// Scalars are compared through their string form, so `id eq 5` matches
    /// the number `5`. Arrays match when any element matches.
    pub fn matches(&self, candidate: &Value) -> bool {
        match self.operator {
            FilterOperator::Equals => match candidate {
                Value::String(s) => s == &self.value,
                Value::Number(n) => n.to_string() == self.value,
                Value::Bool(b) => b.to_string() == self.value,
                Value::Array(items) => items.iter().any(|item| self.matches(item)),
                Value::Null | Value::Object(_) => false,
            },
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.attribute, self.operator, self.value)
    }
}

/// Filter parser bound to one resource type's queryable attributes.
pub struct FilterParser<'a> {
    config: &'a ResourceConfig,
}

impl<'a> FilterParser<'a> {
    pub fn new(config: &'a ResourceConfig) -> Self {
        Self { config }
    }

    /// Parse a filter string into a store-level expression.
    ///
    /// Fails with [`ScimError::InvalidQuery`] when the string is empty, the
    /// attribute is not queryable, the operator is not `eq`, or no value
    /// follows the operator.
    pub fn parse(&self, filter: &str) -> ScimResult<FilterExpression> {
        let filter = collapse_value_path(filter);
        let mut tokens = filter.split_whitespace();

        let attribute_token = tokens
            .next()
            .ok_or_else(|| ScimError::invalid_query("filter is empty"))?;

        let attribute = self.config.queryable_attribute(attribute_token).ok_or_else(|| {
            ScimError::invalid_query(format!(
                "'{}' is not a queryable {} attribute",
                attribute_token,
                self.config.resource_type()
            ))
        })?;

        let operator_token = tokens.next().unwrap_or_default();
        let operator = FilterOperator::from_token(operator_token).ok_or_else(|| {
            ScimError::invalid_query(format!("unsupported filter operator '{}'", operator_token))
        })?;

        let value = tokens.collect::<Vec<_>>().join(" ");
        let value = value.trim_matches('"');
        if value.is_empty() {
            return Err(ScimError::invalid_query("filter has no comparison value"));
        }

        let expression = FilterExpression {
            attribute: attribute.to_string(),
            operator,
            value: value.to_string(),
        };
        trace!("Parsed filter into {}", expression);
        Ok(expression)
    }
}

/// Drop a value-path selector so `emails[type eq "work"].value eq x`
/// filters on `emails`.
fn collapse_value_path(filter: &str) -> Cow<'_, str> {
    const SUFFIX: &str = "].value";
    match (filter.find('['), filter.rfind(SUFFIX)) {
        (Some(start), Some(end)) if start < end => {
            let mut collapsed = String::with_capacity(filter.len());
            collapsed.push_str(&filter[..start]);
            collapsed.push_str(&filter[end + SUFFIX.len()..]);
            Cow::Owned(collapsed)
        }
        _ => Cow::Borrowed(filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNode;
    use serde_json::json;

    fn group_config() -> ResourceConfig {
        ResourceConfig::builder("Group")
            .schema(SchemaNode::from(json!({
                "displayName": {"$ref": "display_name"},
                "members": [{"value": {"$ref": "id"}}]
            })))
            .mutable_attribute("display_name")
            .queryable("displayName", "display_name")
            .build()
            .expect("valid group config")
    }

    fn user_config() -> ResourceConfig {
        ResourceConfig::builder("User")
            .schema(SchemaNode::from(json!({
                "userName": {"$ref": "email"},
                "emails": [{"value": {"$ref": "email"}}]
            })))
            .queryable("userName", "email")
            .queryable("emails", "email")
            .build()
            .expect("valid user config")
    }

    #[test]
    fn test_parse_value_with_spaces() {
        let expression = FilterParser::new(&group_config())
            .parse("displayName eq Test Group #1")
            .unwrap();
        assert_eq!(
            expression,
            FilterExpression::equals("display_name", "Test Group #1")
        );
    }

    #[test]
    fn test_parse_strips_surrounding_quotes() {
        let expression = FilterParser::new(&group_config())
            .parse(r#"displayName eq "Engineering""#)
            .unwrap();
        assert_eq!(expression.value, "Engineering");
    }

    #[test]
    fn test_unknown_attribute_is_invalid() {
        let result = FilterParser::new(&group_config()).parse("address eq 101 Nowhere USA");
        assert!(matches!(result, Err(ScimError::InvalidQuery { .. })));
    }

    #[test]
    fn test_empty_filter_is_invalid() {
        assert!(matches!(
            FilterParser::new(&group_config()).parse("   "),
            Err(ScimError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_only_eq_operator_is_supported() {
        for filter in ["displayName co Eng", "displayName", "displayName EQ Eng"] {
            assert!(
                matches!(
                    FilterParser::new(&group_config()).parse(filter),
                    Err(ScimError::InvalidQuery { .. })
                ),
                "{} should be rejected",
                filter
            );
        }
    }

    #[test]
    fn test_missing_value_is_invalid() {
        assert!(FilterParser::new(&group_config()).parse("displayName eq").is_err());
    }

    #[test]
    fn test_value_path_selector_is_collapsed() {
        let expression = FilterParser::new(&user_config())
            .parse(r#"emails[type eq "work"].value eq "jane@example.com""#)
            .unwrap();
        assert_eq!(expression, FilterExpression::equals("email", "jane@example.com"));
    }

    #[test]
    fn test_matches_compares_string_forms() {
        let by_id = FilterExpression::equals("id", "5");
        assert!(by_id.matches(&json!(5)));
        assert!(by_id.matches(&json!("5")));
        assert!(!by_id.matches(&json!(6)));
        assert!(!by_id.matches(&Value::Null));
        assert!(FilterExpression::equals("tags", "a").matches(&json!(["b", "a"])));
    }
}
