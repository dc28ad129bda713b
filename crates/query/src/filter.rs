//! Filter values held by a query state

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub min: f64,
    pub max: f64,
}

impl RangeFilter {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Build a range, swapping the bounds when given in the wrong order
    pub fn normalized(a: f64, b: f64) -> Self {
        if a <= b {
            Self::new(a, b)
        } else {
            Self::new(b, a)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Set of selected option values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSelectFilter {
    #[serde(default)]
    pub selected: BTreeSet<String>,
}

impl MultiSelectFilter {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Add `value`, or remove it when already selected. Returns whether the
    /// value is selected afterwards.
    pub fn toggle(&mut self, value: &str) -> bool {
        if self.selected.remove(value) {
            false
        } else {
            self.selected.insert(value.to_string());
            true
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.selected.contains(value)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// OR semantics: the single value is one of the selected values
    pub fn matches_any(&self, value: &str) -> bool {
        self.is_empty() || self.contains(value)
    }

    /// AND semantics: every selected value is present in `values`
    pub fn matches_all(&self, values: &[String]) -> bool {
        self.selected
            .iter()
            .all(|wanted| values.iter().any(|have| have == wanted))
    }
}

/// Date window; an empty bound is open on that side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeFilter {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRangeFilter {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Parse `YYYY-MM-DD` bounds; empty or unparsable text leaves the bound open
    pub fn parse(start: &str, end: &str) -> Self {
        Self {
            start: parse_bound(start),
            end: parse_bound(end),
        }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn admits(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start.map_or(true, |bound| start >= bound) && self.end.map_or(true, |bound| end <= bound)
    }
}

fn parse_bound(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(err) => {
            log::debug!("ignoring date bound {:?}: {}", text, err);
            None
        }
    }
}

/// Lower bound only, e.g. "rating 4+"
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFilter {
    #[serde(default)]
    pub min: Option<f64>,
}

impl ThresholdFilter {
    pub fn new(min: Option<f64>) -> Self {
        Self { min }
    }

    /// A missing, non-finite or non-positive threshold restricts nothing
    pub fn is_active(&self) -> bool {
        matches!(self.min, Some(min) if min.is_finite() && min > 0.0)
    }

    pub fn admits(&self, value: f64) -> bool {
        match self.min {
            Some(min) if min.is_finite() => value >= min,
            _ => true,
        }
    }
}

/// フィルターの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Range,
    AnyOf,
    AllOf,
    DateRange,
    AtLeast,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Range => "range",
            FilterKind::AnyOf => "any_of",
            FilterKind::AllOf => "all_of",
            FilterKind::DateRange => "date_range",
            FilterKind::AtLeast => "at_least",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of one filter category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    Range(RangeFilter),
    /// Single-valued field, OR within the selection
    AnyOf(MultiSelectFilter),
    /// List-valued field, the record must carry every selected value
    AllOf(MultiSelectFilter),
    DateRange(DateRangeFilter),
    AtLeast(ThresholdFilter),
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Range(_) => FilterKind::Range,
            Filter::AnyOf(_) => FilterKind::AnyOf,
            Filter::AllOf(_) => FilterKind::AllOf,
            Filter::DateRange(_) => FilterKind::DateRange,
            Filter::AtLeast(_) => FilterKind::AtLeast,
        }
    }

    pub fn selection(&self) -> Option<&MultiSelectFilter> {
        match self {
            Filter::AnyOf(selection) | Filter::AllOf(selection) => Some(selection),
            _ => None,
        }
    }
}
