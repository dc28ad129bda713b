//! Per-view accessor tables

use crate::collate::locale_cmp;
use crate::engine::{project, Projection};
use crate::filter::{DateRangeFilter, Filter, FilterKind, MultiSelectFilter, RangeFilter, ThresholdFilter};
use crate::state::{QueryState, SortSpec};
use crate::{QueryError, SortOrder};
use chrono::NaiveDate;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Text field accessor
pub type TextField<T> = for<'a> fn(&'a T) -> Cow<'a, str>;

/// List field accessor
pub type ListField<T> = for<'a> fn(&'a T) -> &'a [String];

/// Filter category of a view, tagged by how it reads the record
pub enum Category<T> {
    /// Numeric field inside `[min, max]`; the default bounds restrict nothing
    Range {
        bounds: RangeFilter,
        value: fn(&T) -> f64,
    },
    /// Single-valued field, matches when the value is selected
    AnyOf { value: TextField<T> },
    /// List-valued field, matches when every selected value is present
    AllOf { values: ListField<T> },
    /// Start field on or after the window start, end field on or before its end
    DateRange {
        start: fn(&T) -> NaiveDate,
        end: fn(&T) -> NaiveDate,
    },
    /// Numeric field at or above a minimum
    AtLeast { value: fn(&T) -> f64 },
}

impl<T> Category<T> {
    pub fn kind(&self) -> FilterKind {
        match self {
            Category::Range { .. } => FilterKind::Range,
            Category::AnyOf { .. } => FilterKind::AnyOf,
            Category::AllOf { .. } => FilterKind::AllOf,
            Category::DateRange { .. } => FilterKind::DateRange,
            Category::AtLeast { .. } => FilterKind::AtLeast,
        }
    }

    /// Filter value that restricts nothing
    pub fn default_filter(&self) -> Filter {
        match self {
            Category::Range { bounds, .. } => Filter::Range(*bounds),
            Category::AnyOf { .. } => Filter::AnyOf(MultiSelectFilter::default()),
            Category::AllOf { .. } => Filter::AllOf(MultiSelectFilter::default()),
            Category::DateRange { .. } => Filter::DateRange(DateRangeFilter::default()),
            Category::AtLeast { .. } => Filter::AtLeast(ThresholdFilter::default()),
        }
    }

    /// Whether `filter` differs from the unrestricted default
    pub fn is_active(&self, filter: &Filter) -> bool {
        match (self, filter) {
            (Category::Range { bounds, .. }, Filter::Range(range)) => {
                range.is_valid() && range != bounds
            }
            (Category::AnyOf { .. }, Filter::AnyOf(selection))
            | (Category::AllOf { .. }, Filter::AllOf(selection)) => !selection.is_empty(),
            (Category::DateRange { .. }, Filter::DateRange(window)) => !window.is_open(),
            (Category::AtLeast { .. }, Filter::AtLeast(threshold)) => threshold.is_active(),
            _ => false,
        }
    }

    /// Whether `record` passes `filter`. A filter of the wrong kind restricts nothing.
    pub fn matches(&self, record: &T, filter: &Filter) -> bool {
        match (self, filter) {
            (Category::Range { bounds, value }, Filter::Range(range)) => {
                if !range.is_valid() || range == bounds {
                    return true;
                }
                range.contains(value(record))
            }
            (Category::AnyOf { value }, Filter::AnyOf(selection)) => {
                selection.matches_any(&value(record))
            }
            (Category::AllOf { values }, Filter::AllOf(selection)) => {
                selection.matches_all(values(record))
            }
            (Category::DateRange { start, end }, Filter::DateRange(window)) => {
                window.admits(start(record), end(record))
            }
            (Category::AtLeast { value }, Filter::AtLeast(threshold)) => {
                threshold.admits(value(record))
            }
            (category, filter) => {
                log::debug!(
                    "ignoring {} filter on a {} category",
                    filter.kind(),
                    category.kind()
                );
                true
            }
        }
    }
}

impl<T> fmt::Debug for Category<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Category").field("kind", &self.kind()).finish()
    }
}

/// Sortable field
pub enum SortField<T> {
    Text(TextField<T>),
    Number(fn(&T) -> f64),
    Date(fn(&T) -> NaiveDate),
}

impl<T> SortField<T> {
    /// Ascending comparison
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        match self {
            SortField::Text(field) => locale_cmp(&field(a), &field(b)),
            SortField::Number(field) => field(a).total_cmp(&field(b)),
            SortField::Date(field) => field(a).cmp(&field(b)),
        }
    }
}

struct SortKey<T> {
    name: String,
    terms: Vec<(SortField<T>, SortOrder)>,
    /// Direction the key takes when it is first selected
    first: SortOrder,
}

impl<T> SortKey<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.terms
            .iter()
            .fold(Ordering::Equal, |ordering, (field, order)| {
                ordering.then_with(|| order.apply(field.compare(a, b)))
            })
    }
}

/// Searchable fields, filter categories and sort keys of one list view
pub struct ViewSchema<T> {
    name: String,
    search_fields: Vec<TextField<T>>,
    categories: Vec<(String, Category<T>)>,
    sort_keys: Vec<SortKey<T>>,
    default_sort: SortSpec,
}

impl<T> ViewSchema<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            search_fields: Vec::new(),
            categories: Vec::new(),
            sort_keys: Vec::new(),
            default_sort: SortSpec::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a field the search term is matched against
    pub fn search(mut self, field: TextField<T>) -> Self {
        self.search_fields.push(field);
        self
    }

    pub fn category(mut self, name: &str, category: Category<T>) -> Self {
        self.categories.push((name.to_string(), category));
        self
    }

    pub fn range(self, name: &str, min: f64, max: f64, value: fn(&T) -> f64) -> Self {
        self.category(
            name,
            Category::Range {
                bounds: RangeFilter::new(min, max),
                value,
            },
        )
    }

    pub fn any_of(self, name: &str, value: TextField<T>) -> Self {
        self.category(name, Category::AnyOf { value })
    }

    pub fn all_of(self, name: &str, values: ListField<T>) -> Self {
        self.category(name, Category::AllOf { values })
    }

    pub fn date_range(
        self,
        name: &str,
        start: fn(&T) -> NaiveDate,
        end: fn(&T) -> NaiveDate,
    ) -> Self {
        self.category(name, Category::DateRange { start, end })
    }

    pub fn at_least(self, name: &str, value: fn(&T) -> f64) -> Self {
        self.category(name, Category::AtLeast { value })
    }

    pub fn sort_text(self, name: &str, field: TextField<T>) -> Self {
        self.sort_chain(name, vec![(SortField::Text(field), SortOrder::Ascending)])
    }

    pub fn sort_number(self, name: &str, field: fn(&T) -> f64) -> Self {
        self.sort_chain(name, vec![(SortField::Number(field), SortOrder::Ascending)])
    }

    pub fn sort_date(self, name: &str, field: fn(&T) -> NaiveDate) -> Self {
        self.sort_chain(name, vec![(SortField::Date(field), SortOrder::Ascending)])
    }

    /// Sort key made of several fields, each with its own direction
    pub fn sort_chain(mut self, name: &str, terms: Vec<(SortField<T>, SortOrder)>) -> Self {
        self.sort_keys.push(SortKey {
            name: name.to_string(),
            terms,
            first: SortOrder::Ascending,
        });
        self
    }

    /// Make `key` start in `order` when it is selected, e.g. newest first for dates
    pub fn first_order(mut self, key: &str, order: SortOrder) -> Self {
        match self.sort_keys.iter_mut().find(|candidate| candidate.name == key) {
            Some(sort_key) => sort_key.first = order,
            None => log::debug!("{}: no sort key {:?} to set a first order on", self.name, key),
        }
        self
    }

    pub fn default_sort(mut self, key: &str, order: SortOrder) -> Self {
        self.default_sort = SortSpec::new(key, order);
        self
    }

    pub fn get_category(&self, name: &str) -> Option<&Category<T>> {
        self.categories
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, category)| category)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn sort_key_names(&self) -> Vec<&str> {
        self.sort_keys.iter().map(|key| key.name.as_str()).collect()
    }

    pub fn has_sort_key(&self, key: &str) -> bool {
        self.sort_keys.iter().any(|candidate| candidate.name == key)
    }

    /// Direction `key` starts in; ascending for unknown keys
    pub fn initial_order(&self, key: &str) -> SortOrder {
        self.sort_keys
            .iter()
            .find(|candidate| candidate.name == key)
            .map_or(SortOrder::Ascending, |sort_key| sort_key.first)
    }

    /// Select `key` in `state`: the current key flips direction, another key
    /// starts in its [`initial_order`](Self::initial_order).
    pub fn sort_by(&self, state: &mut QueryState, key: &str) {
        state.sort_by(key, self.initial_order(key));
    }

    /// Query state with no search, unrestricted filters and the default sort
    pub fn default_state(&self) -> QueryState {
        QueryState {
            search_term: String::new(),
            filters: self
                .categories
                .iter()
                .map(|(name, category)| (name.clone(), category.default_filter()))
                .collect(),
            sort: self.default_sort.clone(),
        }
    }

    /// Visible rows of `source` under `state`
    pub fn project<'a>(&self, source: &'a [T], state: &QueryState) -> Projection<'a, T> {
        project(self, source, state)
    }

    /// Whether `record` passes the search term and every filter of `state`
    pub fn matches(&self, record: &T, state: &QueryState) -> bool {
        self.matches_search(record, &state.search_term)
            && self.categories.iter().all(|(name, category)| {
                state
                    .filters
                    .get(name)
                    .map_or(true, |filter| category.matches(record, filter))
            })
    }

    /// Case-insensitive substring match of the raw term; surrounding
    /// whitespace is part of the needle.
    fn matches_search(&self, record: &T, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.search_fields
            .iter()
            .any(|field| field(record).to_lowercase().contains(&needle))
    }

    /// Ascending comparison for `key`, `None` for an unknown key
    pub fn compare(&self, key: &str, a: &T, b: &T) -> Option<Ordering> {
        self.sort_keys
            .iter()
            .find(|candidate| candidate.name == key)
            .map(|sort_key| sort_key.compare(a, b))
    }

    /// Distinct values of a multi-select category, for filter pickers.
    ///
    /// Numeric option lists are ordered by value, everything else by
    /// [`locale_cmp`].
    pub fn options(&self, source: &[T], category: &str) -> Result<Vec<String>, QueryError> {
        let distinct: BTreeSet<String> = match self.lookup(category)? {
            Category::AnyOf { value } => source.iter().map(|record| value(record).into_owned()).collect(),
            Category::AllOf { values } => source
                .iter()
                .flat_map(|record| values(record).iter().cloned())
                .collect(),
            other => {
                return Err(QueryError::KindMismatch {
                    category: category.to_string(),
                    expected: FilterKind::AnyOf,
                    found: other.kind(),
                })
            }
        };

        let mut options: Vec<String> = distinct.into_iter().collect();
        let numeric: Option<Vec<f64>> = options.iter().map(|option| option.parse().ok()).collect();
        match numeric {
            Some(_) => options.sort_by(|a, b| {
                let a: f64 = a.parse().unwrap_or_default();
                let b: f64 = b.parse().unwrap_or_default();
                a.total_cmp(&b)
            }),
            None => options.sort_by(|a, b| locale_cmp(a, b)),
        }
        Ok(options)
    }

    /// Number of categories whose filter differs from the default
    pub fn active_filter_count(&self, state: &QueryState) -> usize {
        self.categories
            .iter()
            .filter(|(name, category)| {
                state
                    .filters
                    .get(name)
                    .map_or(false, |filter| category.is_active(filter))
            })
            .count()
    }

    /// Reset one category to its unrestricted default
    pub fn clear_filter(&self, state: &mut QueryState, category: &str) -> Result<(), QueryError> {
        let default = self.lookup(category)?.default_filter();
        state.filters.insert(category.to_string(), default);
        Ok(())
    }

    /// Reset every category, clear the search term and restore the default sort
    pub fn reset_filters(&self, state: &mut QueryState) {
        *state = self.default_state();
    }

    fn lookup(&self, category: &str) -> Result<&Category<T>, QueryError> {
        self.get_category(category)
            .ok_or_else(|| QueryError::UnknownCategory(category.to_string()))
    }
}

impl<T> fmt::Debug for ViewSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSchema")
            .field("name", &self.name)
            .field("categories", &self.category_names())
            .field("sort_keys", &self.sort_key_names())
            .field("default_sort", &self.default_sort)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        name: String,
        size: f64,
        tags: Vec<String>,
    }

    fn item(name: &str, size: f64, tags: &[&str]) -> Item {
        Item {
            name: name.to_string(),
            size,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn name(item: &Item) -> Cow<'_, str> {
        Cow::Borrowed(&item.name)
    }

    fn size(item: &Item) -> f64 {
        item.size
    }

    fn size_label(item: &Item) -> Cow<'_, str> {
        Cow::Owned(item.size.to_string())
    }

    fn tags(item: &Item) -> &[String] {
        &item.tags
    }

    fn schema() -> ViewSchema<Item> {
        ViewSchema::new("items")
            .search(name)
            .range("size", 0.0, 10.0, size)
            .any_of("label", size_label)
            .all_of("tags", tags)
            .sort_text("name", name)
            .sort_number("size", size)
            .default_sort("name", SortOrder::Ascending)
    }

    #[test]
    fn test_default_state_is_unrestricted() {
        let schema = schema();
        let state = schema.default_state();
        assert_eq!(state.filters.len(), 3);
        assert_eq!(state.sort, SortSpec::new("name", SortOrder::Ascending));
        assert_eq!(schema.active_filter_count(&state), 0);
    }

    #[test]
    fn test_default_range_admits_outliers() {
        let schema = schema();
        let items = vec![item("big", 42.0, &[]), item("small", 1.0, &[])];
        let state = schema.default_state();
        assert!(items.iter().all(|item| schema.matches(item, &state)));
    }

    #[test]
    fn test_inverted_range_restricts_nothing() {
        let schema = schema();
        let mut state = schema.default_state();
        state
            .filters
            .insert("size".to_string(), Filter::Range(RangeFilter::new(8.0, 2.0)));
        assert!(schema.matches(&item("x", 5.0, &[]), &state));
        assert_eq!(schema.active_filter_count(&state), 0);
    }

    #[test]
    fn test_options_sorted() {
        let schema = schema();
        let items = vec![
            item("b", 10.0, &["zeta", "Alpha"]),
            item("a", 2.0, &["alpha"]),
            item("c", 2.0, &[]),
        ];
        assert_eq!(schema.options(&items, "label").unwrap(), vec!["2", "10"]);
        assert_eq!(
            schema.options(&items, "tags").unwrap(),
            vec!["alpha", "Alpha", "zeta"]
        );
        assert!(matches!(
            schema.options(&items, "size"),
            Err(QueryError::KindMismatch { .. })
        ));
        assert!(matches!(
            schema.options(&items, "color"),
            Err(QueryError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_clear_filter() {
        let schema = schema();
        let mut state = schema.default_state();
        state.toggle("tags", "alpha").unwrap();
        state.set_range("size", 1.0, 3.0).unwrap();
        assert_eq!(schema.active_filter_count(&state), 2);

        schema.clear_filter(&mut state, "tags").unwrap();
        assert_eq!(schema.active_filter_count(&state), 1);
        assert!(schema.clear_filter(&mut state, "nope").is_err());

        schema.reset_filters(&mut state);
        assert_eq!(schema.active_filter_count(&state), 0);
    }

    #[test]
    fn test_reset_restores_default_state() {
        let schema = schema();
        let mut state = schema.default_state();
        state.search("suite");
        state.toggle("tags", "alpha").unwrap();
        schema.sort_by(&mut state, "size");
        schema.sort_by(&mut state, "size");
        assert_eq!(state.sort, SortSpec::descending("size"));

        schema.reset_filters(&mut state);
        assert_eq!(state, schema.default_state());
        assert_eq!(state.search_term, "");
        assert_eq!(state.sort, SortSpec::ascending("name"));
    }

    #[test]
    fn test_first_order_of_a_sort_key() {
        let schema = schema().first_order("size", SortOrder::Descending);
        assert_eq!(schema.initial_order("size"), SortOrder::Descending);
        assert_eq!(schema.initial_order("name"), SortOrder::Ascending);
        assert_eq!(schema.initial_order("missing"), SortOrder::Ascending);

        let mut state = schema.default_state();
        schema.sort_by(&mut state, "size");
        assert_eq!(state.sort, SortSpec::descending("size"));
        schema.sort_by(&mut state, "size");
        assert_eq!(state.sort, SortSpec::ascending("size"));
        schema.sort_by(&mut state, "name");
        assert_eq!(state.sort, SortSpec::ascending("name"));
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let schema = schema();
        let items = vec![item("beta gamma", 1.0, &[]), item("alpha", 2.0, &[])];
        let mut state = schema.default_state();

        state.search("BETA ");
        assert_eq!(schema.project(&items, &state).len(), 1);
        state.search("alpha ");
        assert!(schema.project(&items, &state).is_empty());
        state.search("");
        assert_eq!(schema.project(&items, &state).len(), 2);
    }

    #[test]
    fn test_sort_chain() {
        let schema = ViewSchema::new("chain").sort_chain(
            "best",
            vec![
                (SortField::Number(size), SortOrder::Descending),
                (SortField::Text(name), SortOrder::Ascending),
            ],
        );
        let a = item("a", 1.0, &[]);
        let b = item("b", 2.0, &[]);
        let c = item("c", 2.0, &[]);
        assert_eq!(schema.compare("best", &b, &a), Some(Ordering::Less));
        assert_eq!(schema.compare("best", &b, &c), Some(Ordering::Less));
        assert_eq!(schema.compare("worst", &a, &b), None);
    }
}
