use crate::schema::ViewSchema;
use crate::state::QueryState;

/// How a projection turned out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one row is visible
    Rows,
    /// The source has records but none pass the query
    NoMatches,
    /// The source itself is empty
    EmptySource,
}

/// Visible rows of a list view, borrowed from the source collection
#[derive(Debug)]
pub struct Projection<'a, T> {
    rows: Vec<&'a T>,
    source_len: usize,
}

impl<'a, T> Projection<'a, T> {
    pub fn rows(&self) -> &[&'a T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<&'a T> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Size of the collection the rows were drawn from
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn outcome(&self) -> Outcome {
        if self.source_len == 0 {
            Outcome::EmptySource
        } else if self.rows.is_empty() {
            Outcome::NoMatches
        } else {
            Outcome::Rows
        }
    }

    /// "No results" state: records exist but the query hides all of them
    pub fn is_no_results(&self) -> bool {
        self.outcome() == Outcome::NoMatches
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.rows.iter().copied()
    }
}

impl<'a, T: Clone> Projection<'a, T> {
    pub fn cloned(&self) -> Vec<T> {
        self.rows.iter().map(|row| (*row).clone()).collect()
    }
}

/// Filter `source` by the search term and every category, then sort it.
///
/// The sort is stable, so ties keep source order. An unknown sort key keeps
/// the filtered order.
pub fn project<'a, T>(
    schema: &ViewSchema<T>,
    source: &'a [T],
    state: &QueryState,
) -> Projection<'a, T> {
    let mut rows: Vec<&'a T> = source
        .iter()
        .filter(|record| schema.matches(record, state))
        .collect();

    let key = state.sort.key.as_str();
    if schema.has_sort_key(key) {
        let order = state.sort.order;
        rows.sort_by(|a, b| {
            let ordering = schema
                .compare(key, a, b)
                .unwrap_or(std::cmp::Ordering::Equal);
            order.apply(ordering)
        });
    } else if !key.is_empty() {
        log::debug!("{}: unknown sort key {:?}, keeping filtered order", schema.name(), key);
    }

    log::debug!(
        "{}: {} of {} rows visible",
        schema.name(),
        rows.len(),
        source.len()
    );

    Projection {
        rows,
        source_len: source.len(),
    }
}
