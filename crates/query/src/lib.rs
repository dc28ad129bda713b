//! List query engine for the hotel dashboard
//!
//! Every list view of the dashboard (hotels, rooms, bookings, user accounts)
//! derives its visible rows the same way: a search term, a set of filter
//! categories combined with AND, and a sort key. This crate factors that
//! into one engine driven by a per-view [`ViewSchema`].
//!
//! # Features
//!
//! - Case-insensitive search over the view's text fields
//! - Range, multi-select (`AnyOf` / `AllOf`), date range and threshold filters
//! - Stable, locale-aware sorting with direction toggling
//! - Option lists and active filter counts for filter pickers

mod collate;
mod engine;
mod filter;
mod schema;
mod state;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use collate::locale_cmp;
pub use engine::*;
pub use filter::*;
pub use schema::*;
pub use state::*;

/// エラー型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Unknown filter category: {0}")]
    UnknownCategory(String),

    #[error("Filter category {category} is a {found} filter, not {expected}")]
    KindMismatch {
        category: String,
        expected: FilterKind,
        found: FilterKind,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// ソート方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    /// Apply this direction to an ascending comparison result.
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(QueryError::InvalidParameters(format!(
                "unknown sort direction: {}",
                other
            ))),
        }
    }
}
