use std::collections::BTreeSet;

use super::model::FoodRecord;

// ---------------------------------------------------------------------------
// PurineRange – inclusive bounds on `total`
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` bounds on a record's total purine content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurineRange {
    pub min: f64,
    pub max: f64,
}

impl PurineRange {
    /// The "nothing chosen yet" range. Selecting it does not count as a filter.
    pub const SENTINEL: PurineRange = PurineRange { min: 0.0, max: 0.0 };

    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            PurineRange { min, max }
        } else {
            PurineRange { min: max, max: min }
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_sentinel(&self) -> bool {
        *self == PurineRange::SENTINEL
    }
}

impl Default for PurineRange {
    fn default() -> Self {
        PurineRange::SENTINEL
    }
}

// ---------------------------------------------------------------------------
// FilterQuery – immutable query state
// ---------------------------------------------------------------------------

/// Everything a single filter evaluation depends on.
///
/// Values are replaced, never edited: every `with_*` method returns a new query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterQuery {
    search_term: String,
    categories: BTreeSet<String>,
    range: PurineRange,
    range_touched: bool,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query with preset categories and range. The range does not count as
    /// user-chosen.
    pub fn with_defaults<I, S>(categories: I, range: PurineRange) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterQuery {
            categories: categories.into_iter().map(Into::into).collect(),
            range,
            ..Self::default()
        }
    }

    pub fn with_search_term(self, term: impl Into<String>) -> Self {
        FilterQuery {
            search_term: term.into(),
            ..self
        }
    }

    pub fn with_categories<I, S>(self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterQuery {
            categories: categories.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Add the category if absent, remove it otherwise.
    pub fn toggle_category(self, category: &str) -> Self {
        let mut categories = self.categories.clone();
        if !categories.remove(category) {
            categories.insert(category.to_string());
        }
        FilterQuery { categories, ..self }
    }

    /// Set the range explicitly; marks it as chosen by the user.
    pub fn with_range(self, range: PurineRange) -> Self {
        FilterQuery {
            range,
            range_touched: true,
            ..self
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn range(&self) -> PurineRange {
        self.range
    }

    pub fn range_touched(&self) -> bool {
        self.range_touched
    }

    /// Whether the user has expressed any intent to filter.
    ///
    /// True iff the search term is non-blank, a category is selected, or the
    /// range differs from [`PurineRange::SENTINEL`].
    pub fn has_active_filter(&self) -> bool {
        !self.search_term.trim().is_empty()
            || !self.categories.is_empty()
            || !self.range.is_sentinel()
    }

    /// Stretch an untouched range up to `max_total` once a search term or a
    /// category is present, so text/category queries are not cut off by the
    /// empty default range.
    pub fn expand_untouched_range(self, max_total: f64) -> Self {
        let has_text_or_category =
            !self.search_term.trim().is_empty() || !self.categories.is_empty();
        if self.range_touched || !has_text_or_category {
            return self;
        }
        let range = PurineRange::new(self.range.min, max_total.max(self.range.min));
        FilterQuery { range, ..self }
    }

    /// Evaluate the three predicates (range, category, text) against one record.
    pub fn matches(&self, record: &FoodRecord) -> bool {
        self.range.contains(record.total())
            && self.matches_category(record)
            && self.matches_text(record)
    }

    fn matches_category(&self, record: &FoodRecord) -> bool {
        self.categories.is_empty() || self.categories.contains(&record.category)
    }

    fn matches_text(&self, record: &FoodRecord) -> bool {
        let term = self.search_term.trim();
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        record.name().to_lowercase().contains(&needle)
            || record.romanized_name().contains(&needle)
            || record.initials() == needle
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Records passing `query`, sorted by `total` descending.
///
/// Ties keep their source order. An empty result is a normal outcome.
pub fn filter_records<'a>(records: &'a [FoodRecord], query: &FilterQuery) -> Vec<&'a FoodRecord> {
    let mut matched: Vec<&FoodRecord> = records.iter().filter(|r| query.matches(r)).collect();
    sort_by_total_desc(&mut matched);
    matched
}

/// Indices into `records` of the records passing `query`, in the same order
/// as [`filter_records`].
pub fn filtered_indices(records: &[FoodRecord], query: &FilterQuery) -> Vec<usize> {
    let mut indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| query.matches(r))
        .map(|(i, _)| i)
        .collect();
    indices.sort_by(|&a, &b| records[b].total().total_cmp(&records[a].total()));
    indices
}

/// Stable sort, largest `total` first.
pub(crate) fn sort_by_total_desc(records: &mut [&FoodRecord]) {
    records.sort_by(|a, b| b.total().total_cmp(&a.total()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PurineProfile;
    use crate::data::search_key::{IdentityTransliterator, PinyinTransliterator};

    fn record(category: &str, name: &str, total: f64) -> FoodRecord {
        let purines = PurineProfile {
            total,
            ..Default::default()
        };
        FoodRecord::new(category, name, purines, "", &PinyinTransliterator)
    }

    fn names<'a>(records: &[&'a FoodRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.name()).collect()
    }

    #[test]
    fn range_predicate_is_inclusive() {
        let records = vec![record("肉类", "牛肉", 50.0), record("肉类", "猪肉", 80.0)];
        let query = FilterQuery::new().with_range(PurineRange::new(60.0, 100.0));
        assert_eq!(names(&filter_records(&records, &query)), vec!["猪肉"]);

        let query = FilterQuery::new().with_range(PurineRange::new(50.0, 80.0));
        assert_eq!(names(&filter_records(&records, &query)), vec!["猪肉", "牛肉"]);
    }

    #[test]
    fn text_predicate_matches_name_pinyin_or_initials() {
        let records = vec![record("肉类", "牛肉", 50.0)];
        let all = PurineRange::new(0.0, 1000.0);
        for term in ["牛", "niu", "NIUROU", "NR", "nr", " nr "] {
            let query = FilterQuery::new().with_range(all).with_search_term(term);
            assert_eq!(filter_records(&records, &query).len(), 1, "term {term:?}");
        }
        for term in ["NRX", "羊", "niurouz"] {
            let query = FilterQuery::new().with_range(all).with_search_term(term);
            assert!(filter_records(&records, &query).is_empty(), "term {term:?}");
        }
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let rec = FoodRecord::new(
            "饮料",
            "Coca Cola",
            PurineProfile::default(),
            "",
            &IdentityTransliterator,
        );
        let query = FilterQuery::new().with_search_term("coca c");
        assert!(query.matches(&rec));
    }

    #[test]
    fn category_predicate_restricts_only_when_non_empty() {
        let records = vec![
            record("肉类", "牛肉", 50.0),
            record("蔬菜类", "白菜", 20.0),
        ];
        let all = PurineRange::new(0.0, 100.0);

        let query = FilterQuery::new().with_range(all);
        assert_eq!(filter_records(&records, &query).len(), 2);

        let query = query.with_categories(["蔬菜类"]);
        assert_eq!(names(&filter_records(&records, &query)), vec!["白菜"]);
    }

    #[test]
    fn results_are_sorted_by_total_descending_and_stable() {
        let records = vec![
            record("a", "x1", 10.0),
            record("a", "x2", 80.0),
            record("a", "x3", 50.0),
            record("a", "x4", 80.0),
        ];
        let query = FilterQuery::new().with_range(PurineRange::new(0.0, 100.0));
        let totals: Vec<f64> = filter_records(&records, &query)
            .iter()
            .map(|r| r.total())
            .collect();
        assert_eq!(totals, vec![80.0, 80.0, 50.0, 10.0]);
        assert_eq!(
            names(&filter_records(&records, &query)),
            vec!["x2", "x4", "x3", "x1"]
        );
    }

    #[test]
    fn indices_follow_the_same_order() {
        let records = vec![
            record("a", "x1", 10.0),
            record("a", "x2", 80.0),
            record("a", "x3", 50.0),
        ];
        let query = FilterQuery::new().with_range(PurineRange::new(20.0, 100.0));
        assert_eq!(filtered_indices(&records, &query), vec![1, 2]);
    }

    #[test]
    fn filtering_leaves_records_untouched() {
        let records = vec![record("a", "牛肉", 10.0), record("a", "猪肉", 80.0)];
        let before = records.clone();
        let query = FilterQuery::new().with_range(PurineRange::new(0.0, 100.0));
        let _ = filter_records(&records, &query);
        assert_eq!(records, before);
    }

    #[test]
    fn active_filter_gate() {
        let query = FilterQuery::new();
        assert!(!query.has_active_filter());
        assert!(!query.clone().with_search_term("   ").has_active_filter());
        assert!(query.clone().with_search_term("nr").has_active_filter());
        assert!(query.clone().with_categories(["肉类"]).has_active_filter());
        assert!(query
            .clone()
            .with_range(PurineRange::new(0.0, 10.0))
            .has_active_filter());
        // Touching the range but leaving it on the sentinel is not intent.
        assert!(!query.with_range(PurineRange::SENTINEL).has_active_filter());
    }

    #[test]
    fn untouched_range_expands_once_text_is_present() {
        let query = FilterQuery::new().expand_untouched_range(500.0);
        assert_eq!(query.range(), PurineRange::SENTINEL);

        let query = FilterQuery::new()
            .with_search_term("牛")
            .expand_untouched_range(500.0);
        assert_eq!(query.range(), PurineRange::new(0.0, 500.0));

        let touched = FilterQuery::new()
            .with_range(PurineRange::new(10.0, 20.0))
            .with_search_term("牛")
            .expand_untouched_range(500.0);
        assert_eq!(touched.range(), PurineRange::new(10.0, 20.0));
    }

    #[test]
    fn toggle_category_adds_then_removes() {
        let query = FilterQuery::new().toggle_category("肉类");
        assert!(query.categories().contains("肉类"));
        let query = query.toggle_category("肉类");
        assert!(query.categories().is_empty());
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        assert_eq!(PurineRange::new(100.0, 60.0), PurineRange::new(60.0, 100.0));
    }
}
