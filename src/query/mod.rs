//! List query building blocks: filter expressions, ordering and paging.

pub mod filter;
pub mod page;

pub use filter::{FilterExpression, FilterOperator, FilterParser};
pub use page::{DEFAULT_PAGE_SIZE, PageWindow};

use serde::{Deserialize, Serialize};

/// Direction of a list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Default ordering applied to list results, expressed in store attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOrder {
    pub attribute: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl ListOrder {
    pub fn ascending(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Descending,
        }
    }
}

impl Default for ListOrder {
    fn default() -> Self {
        Self::ascending("id")
    }
}
