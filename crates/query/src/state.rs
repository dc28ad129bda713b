use crate::filter::{DateRangeFilter, Filter, FilterKind, RangeFilter, ThresholdFilter};
use crate::{QueryError, SortOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sort key and direction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: &str, order: SortOrder) -> Self {
        Self {
            key: key.to_string(),
            order,
        }
    }

    pub fn ascending(key: &str) -> Self {
        Self::new(key, SortOrder::Ascending)
    }

    pub fn descending(key: &str) -> Self {
        Self::new(key, SortOrder::Descending)
    }

    /// Parse `"price-desc"` style keys. Text without a direction suffix is an
    /// ascending key.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some((key, suffix)) = text.rsplit_once('-') {
            if let Ok(order) = suffix.parse::<SortOrder>() {
                return Self::new(key, order);
            }
        }
        Self::ascending(text)
    }

    pub fn toggled(&self) -> Self {
        Self::new(&self.key, self.order.toggled())
    }
}

/// Search term, filters and sort of one list view
///
/// Build it with `ViewSchema::default_state`; the mutators only touch
/// categories that state already carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub filters: BTreeMap<String, Filter>,
    #[serde(default)]
    pub sort: SortSpec,
}

impl QueryState {
    pub fn search(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn filter(&self, category: &str) -> Option<&Filter> {
        self.filters.get(category)
    }

    fn slot(&mut self, category: &str, expected: FilterKind) -> Result<&mut Filter, QueryError> {
        let filter = self
            .filters
            .get_mut(category)
            .ok_or_else(|| QueryError::UnknownCategory(category.to_string()))?;
        let found = filter.kind();
        let compatible = found == expected
            || (expected == FilterKind::AnyOf && found == FilterKind::AllOf);
        if !compatible {
            return Err(QueryError::KindMismatch {
                category: category.to_string(),
                expected,
                found,
            });
        }
        Ok(filter)
    }

    /// Set a range category; bounds given in the wrong order are swapped.
    pub fn set_range(&mut self, category: &str, min: f64, max: f64) -> Result<(), QueryError> {
        let filter = self.slot(category, FilterKind::Range)?;
        *filter = Filter::Range(RangeFilter::normalized(min, max));
        Ok(())
    }

    /// Add or remove one value of a multi-select category. Returns whether
    /// the value is selected afterwards.
    pub fn toggle(&mut self, category: &str, value: &str) -> Result<bool, QueryError> {
        match self.slot(category, FilterKind::AnyOf)? {
            Filter::AnyOf(selection) | Filter::AllOf(selection) => Ok(selection.toggle(value)),
            other => Err(QueryError::KindMismatch {
                category: category.to_string(),
                expected: FilterKind::AnyOf,
                found: other.kind(),
            }),
        }
    }

    /// Make sure `value` is selected in a multi-select category
    pub fn select(&mut self, category: &str, value: &str) -> Result<(), QueryError> {
        if !self.is_selected(category, value) {
            self.toggle(category, value)?;
        }
        Ok(())
    }

    pub fn is_selected(&self, category: &str, value: &str) -> bool {
        self.filter(category)
            .and_then(Filter::selection)
            .map_or(false, |selection| selection.contains(value))
    }

    /// Set a date window from `YYYY-MM-DD` text; empty or unparsable bounds stay open.
    pub fn set_dates(&mut self, category: &str, start: &str, end: &str) -> Result<(), QueryError> {
        let filter = self.slot(category, FilterKind::DateRange)?;
        *filter = Filter::DateRange(DateRangeFilter::parse(start, end));
        Ok(())
    }

    pub fn set_at_least(&mut self, category: &str, min: Option<f64>) -> Result<(), QueryError> {
        let filter = self.slot(category, FilterKind::AtLeast)?;
        *filter = Filter::AtLeast(ThresholdFilter::new(min));
        Ok(())
    }

    /// Sort by `key`; the current key flips direction, a new key starts in `first`.
    pub fn sort_by(&mut self, key: &str, first: SortOrder) {
        self.sort = if self.sort.key == key {
            self.sort.toggled()
        } else {
            SortSpec::new(key, first)
        };
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
    }
}
