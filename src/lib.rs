//! Search, filter and summarise a food purine reference table.
//!
//! The crate is the query core behind a presentation layer: it loads and
//! normalises the table once, derives pinyin search keys for every food
//! name, and answers filter, aggregate and export requests against the
//! in-memory records.

/// Process-wide cache of loaded tables.
pub mod cache;
/// Session presets and defaults.
pub mod config;
/// Core types, loading, filtering, aggregates and export.
pub mod data;
/// Error types.
pub mod error;
/// Per-session query state.
pub mod state;

use std::path::Path;

pub use data::export::{export_csv, export_file_name, write_parquet};
pub use data::filter::{filter_records, FilterQuery, PurineRange};
pub use data::insight::{category_averages, top_n, CategoryAverage, SortOrder};
pub use data::model::{Column, FoodRecord, FoodTable, HeaderStyle, PurineProfile};
pub use data::search_key::{IdentityTransliterator, PinyinTransliterator, Transliterator};
pub use error::{ExportError, LoadError};

/// Load a table with the pinyin transliterator.
pub fn load_records(path: impl AsRef<Path>) -> Result<FoodTable, LoadError> {
    data::loader::load_file(path.as_ref(), &PinyinTransliterator)
}
