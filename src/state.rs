use std::sync::Arc;

use crate::config::ViewPreset;
use crate::data::export::export_csv;
use crate::data::filter::{filtered_indices, FilterQuery, PurineRange};
use crate::data::model::{FoodRecord, FoodTable, HeaderStyle};
use crate::error::ExportError;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// What a presentation layer should show for the current query.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView<'a> {
    /// No filter has been expressed yet; ask the user to search.
    Prompt,
    /// Filters are active but nothing matched.
    Empty,
    /// Matching records, highest total first.
    Rows(Vec<&'a FoodRecord>),
}

/// Query state for one user session, independent of rendering.
///
/// The table is shared and read-only. Every edit swaps in a new
/// [`FilterQuery`] and recomputes the visible rows.
pub struct Session {
    /// Loaded dataset.
    pub table: Arc<FoodTable>,

    /// Defaults and display policy.
    pub preset: ViewPreset,

    query: FilterQuery,

    /// Indices of records passing the current query (cached).
    visible_indices: Vec<usize>,
}

impl Session {
    pub fn new(table: Arc<FoodTable>, preset: ViewPreset) -> Self {
        let query = preset.initial_query();
        let mut session = Session {
            table,
            preset,
            query,
            visible_indices: Vec::new(),
        };
        session.refilter();
        session
    }

    /// Start a session with the preset matching the table's header convention.
    pub fn for_table(table: Arc<FoodTable>) -> Self {
        let preset = ViewPreset::for_header_style(table.header_style);
        Self::new(table, preset)
    }

    pub fn query(&self) -> &FilterQuery {
        &self.query
    }

    /// Replace the whole query, e.g. one built from command-line flags.
    pub fn set_query(&mut self, query: FilterQuery) {
        self.query = query;
        self.refilter();
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.update(|q| q.with_search_term(term));
    }

    pub fn toggle_category(&mut self, category: &str) {
        self.update(|q| q.toggle_category(category));
    }

    pub fn select_categories<I, S>(&mut self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update(|q| q.with_categories(categories));
    }

    /// Deselect all categories (no category restriction).
    pub fn clear_categories(&mut self) {
        self.update(|q| q.with_categories(Vec::<String>::new()));
    }

    pub fn set_range(&mut self, range: PurineRange) {
        self.update(|q| q.with_range(range));
    }

    /// Back to the preset's initial query.
    pub fn reset(&mut self) {
        self.set_query(self.preset.initial_query());
    }

    fn update(&mut self, edit: impl FnOnce(FilterQuery) -> FilterQuery) {
        let query = std::mem::take(&mut self.query);
        self.query = edit(query);
        self.refilter();
    }

    /// The query actually evaluated, after preset range expansion.
    pub fn effective_query(&self) -> FilterQuery {
        if self.preset.expand_untouched_range {
            self.query
                .clone()
                .expand_untouched_range(self.table.max_total())
        } else {
            self.query.clone()
        }
    }

    /// Whether results should be displayed at all.
    pub fn shows_results(&self) -> bool {
        !self.preset.require_active_filter || self.query.has_active_filter()
    }

    /// Recompute `visible_indices` after a query change.
    fn refilter(&mut self) {
        self.visible_indices = if self.shows_results() {
            filtered_indices(&self.table.records, &self.effective_query())
        } else {
            Vec::new()
        };
    }

    pub fn visible_records(&self) -> Vec<&FoodRecord> {
        self.visible_indices
            .iter()
            .map(|&i| &self.table.records[i])
            .collect()
    }

    pub fn view(&self) -> ResultView<'_> {
        if !self.shows_results() {
            ResultView::Prompt
        } else if self.visible_indices.is_empty() {
            ResultView::Empty
        } else {
            ResultView::Rows(self.visible_records())
        }
    }

    /// CSV bytes of the visible rows.
    pub fn export_visible(&self, style: HeaderStyle) -> Result<Vec<u8>, ExportError> {
        export_csv(self.visible_records(), style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PurineProfile;
    use crate::data::search_key::PinyinTransliterator;

    fn table(style: HeaderStyle) -> Arc<FoodTable> {
        let rows = [
            ("畜肉类及制品", "牛肉", 50.0),
            ("畜肉类及制品", "猪肉", 80.0),
            ("蔬菜类及制品", "白菜", 10.0),
            ("谷类及制品", "大米", 600.0),
        ];
        let records = rows
            .iter()
            .map(|&(category, name, total)| {
                let purines = PurineProfile {
                    total,
                    ..Default::default()
                };
                FoodRecord::new(category, name, purines, "", &PinyinTransliterator)
            })
            .collect();
        Arc::new(FoodTable::from_records(records, style))
    }

    fn names(view: ResultView<'_>) -> Vec<String> {
        match view {
            ResultView::Rows(rows) => rows.iter().map(|r| r.name().to_string()).collect(),
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn compact_session_prompts_until_intent() {
        let mut session = Session::for_table(table(HeaderStyle::Plain));
        assert_eq!(session.view(), ResultView::Prompt);

        session.set_search_term("rou");
        assert_eq!(names(session.view()), vec!["猪肉", "牛肉"]);

        session.set_search_term("  ");
        assert_eq!(session.view(), ResultView::Prompt);
    }

    #[test]
    fn untouched_range_expands_to_table_maximum() {
        let mut session = Session::for_table(table(HeaderStyle::Plain));
        session.toggle_category("谷类及制品");
        assert_eq!(names(session.view()), vec!["大米"]);

        session.set_range(PurineRange::new(0.0, 100.0));
        assert_eq!(session.view(), ResultView::Empty);
    }

    #[test]
    fn bilingual_session_shows_staples_by_default() {
        let session = Session::for_table(table(HeaderStyle::Bilingual));
        // 大米 is above the default 500 ceiling.
        assert_eq!(names(session.view()), vec!["白菜"]);
    }

    #[test]
    fn reset_restores_preset_query() {
        let mut session = Session::new(table(HeaderStyle::Plain), ViewPreset::compact());
        session.set_search_term("nr");
        session.select_categories(["畜肉类及制品"]);
        assert_eq!(names(session.view()), vec!["牛肉"]);

        session.clear_categories();
        assert!(session.query().categories().is_empty());

        session.reset();
        assert_eq!(session.query(), &ViewPreset::compact().initial_query());
        assert_eq!(session.view(), ResultView::Prompt);
    }

    #[test]
    fn export_covers_visible_rows_only() {
        let mut session = Session::for_table(table(HeaderStyle::Plain));
        session.set_search_term("zr");
        let bytes = session.export_visible(HeaderStyle::Plain).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("猪肉"));
    }
}
