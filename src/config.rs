use std::fmt;
use std::str::FromStr;

use crate::data::filter::{FilterQuery, PurineRange};
use crate::data::model::HeaderStyle;

/// Source file used when none is given.
pub const DEFAULT_SOURCE: &str = "purine_data.csv";
/// Environment variable naming the source file.
pub const SOURCE_ENV: &str = "PURINE_DATA";
/// Size of the "highest purine foods" ranking.
pub const DEFAULT_TOP_N: usize = 10;

/// Initial filter state and display policy for a session.
///
/// The two header conventions shipped with different defaults, kept here as
/// two presets.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewPreset {
    /// Short name used on the command line.
    pub name: &'static str,
    /// Categories selected before the user touches anything.
    pub default_categories: Vec<String>,
    /// Range selected before the user touches anything.
    pub default_range: PurineRange,
    /// Show nothing until [`FilterQuery::has_active_filter`] is true.
    pub require_active_filter: bool,
    /// Stretch an untouched range to the table maximum once a search term
    /// or category is set.
    pub expand_untouched_range: bool,
}

impl ViewPreset {
    /// Plain-label layout: empty view until the user searches or filters.
    pub fn compact() -> Self {
        ViewPreset {
            name: "compact",
            default_categories: Vec::new(),
            default_range: PurineRange::SENTINEL,
            require_active_filter: true,
            expand_untouched_range: true,
        }
    }

    /// Bilingual-label layout: two staple categories in `[0, 500]`, always shown.
    pub fn bilingual() -> Self {
        ViewPreset {
            name: "bilingual",
            default_categories: vec!["谷类及制品".to_string(), "蔬菜类及制品".to_string()],
            default_range: PurineRange::new(0.0, 500.0),
            require_active_filter: false,
            expand_untouched_range: false,
        }
    }

    /// Preset matching the header convention a table was loaded with.
    pub fn for_header_style(style: HeaderStyle) -> Self {
        match style {
            HeaderStyle::Bilingual => Self::bilingual(),
            HeaderStyle::Plain | HeaderStyle::Canonical => Self::compact(),
        }
    }

    /// The query a fresh session starts from.
    pub fn initial_query(&self) -> FilterQuery {
        FilterQuery::with_defaults(self.default_categories.iter().cloned(), self.default_range)
    }
}

impl Default for ViewPreset {
    fn default() -> Self {
        Self::compact()
    }
}

impl fmt::Display for ViewPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl FromStr for ViewPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "plain" => Ok(Self::compact()),
            "bilingual" => Ok(Self::bilingual()),
            other => Err(format!("unknown preset '{other}' (expected compact or bilingual)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_preset_starts_inactive() {
        let query = ViewPreset::compact().initial_query();
        assert!(!query.has_active_filter());
        assert!(!query.range_touched());
    }

    #[test]
    fn bilingual_preset_starts_with_staples() {
        let query = ViewPreset::bilingual().initial_query();
        assert!(query.has_active_filter());
        assert_eq!(query.categories().len(), 2);
        assert_eq!(query.range(), PurineRange::new(0.0, 500.0));
    }

    #[test]
    fn preset_follows_header_style() {
        assert_eq!(ViewPreset::for_header_style(HeaderStyle::Bilingual).name, "bilingual");
        assert_eq!(ViewPreset::for_header_style(HeaderStyle::Plain).name, "compact");
        assert_eq!("Bilingual".parse::<ViewPreset>().unwrap().name, "bilingual");
        assert!("wide".parse::<ViewPreset>().is_err());
    }
}
