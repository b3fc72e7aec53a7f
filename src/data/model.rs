use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::search_key::{SearchKeys, Transliterator};

// ---------------------------------------------------------------------------
// Column – the eight fixed columns of the reference table
// ---------------------------------------------------------------------------

/// One column of the canonical schema, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Category,
    Name,
    Guanine,
    Adenine,
    Hypoxanthine,
    Xanthine,
    Total,
    Origin,
}

impl Column {
    /// All columns in the order they appear in the source file.
    pub const ALL: [Column; 8] = [
        Column::Category,
        Column::Name,
        Column::Guanine,
        Column::Adenine,
        Column::Hypoxanthine,
        Column::Xanthine,
        Column::Total,
        Column::Origin,
    ];

    /// The five purine-quantity columns (mg/100g).
    pub const QUANTITIES: [Column; 5] = [
        Column::Guanine,
        Column::Adenine,
        Column::Hypoxanthine,
        Column::Xanthine,
        Column::Total,
    ];

    pub fn is_quantity(self) -> bool {
        Column::QUANTITIES.contains(&self)
    }

    /// Header label used for this column under a given convention.
    pub fn label(self, style: HeaderStyle) -> &'static str {
        use Column::*;
        match style {
            HeaderStyle::Plain => match self {
                Category => "食物类",
                Name => "食物名称",
                Guanine => "鸟嘌呤",
                Adenine => "腺嘌呤",
                Hypoxanthine => "次黄嘌呤",
                Xanthine => "黄嘌呤",
                Total => "总嘌呤",
                Origin => "采样地",
            },
            HeaderStyle::Bilingual => match self {
                Category => "食物类 Food group",
                Name => "食物名称 Food name",
                Guanine => "鸟嘌呤 Guanine",
                Adenine => "腺嘌呤 Adenine",
                Hypoxanthine => "次黄嘌呤 Hypoxanthine",
                Xanthine => "黄嘌呤 Xanthine",
                Total => "总嘌呤 Purine",
                Origin => "采样地 Sampling site",
            },
            HeaderStyle::Canonical => self.key(),
        }
    }

    /// Canonical (English, snake_case) field name.
    pub fn key(self) -> &'static str {
        use Column::*;
        match self {
            Category => "category",
            Name => "name",
            Guanine => "guanine",
            Adenine => "adenine",
            Hypoxanthine => "hypoxanthine",
            Xanthine => "xanthine",
            Total => "total",
            Origin => "origin",
        }
    }

    /// Resolve a raw header label to a column and the convention it belongs to.
    ///
    /// Leading byte-order marks and surrounding whitespace are ignored.
    pub fn from_label(raw: &str) -> Option<(Column, HeaderStyle)> {
        let label = raw.trim_start_matches('\u{feff}').trim();
        // Older exports used the long category label.
        if label == "食物类别" {
            return Some((Column::Category, HeaderStyle::Plain));
        }
        HeaderStyle::ALL.iter().find_map(|&style| {
            Column::ALL
                .iter()
                .find(|col| col.label(style).eq_ignore_ascii_case(label))
                .map(|&col| (col, style))
        })
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// HeaderStyle – accepted header-label conventions
// ---------------------------------------------------------------------------

/// The header-label convention a source file was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    /// Chinese labels only, e.g. `食物名称`.
    #[default]
    Plain,
    /// Chinese label followed by the English name, e.g. `食物名称 Food name`.
    Bilingual,
    /// Canonical English keys, e.g. `name`.
    Canonical,
}

impl HeaderStyle {
    pub const ALL: [HeaderStyle; 3] = [
        HeaderStyle::Plain,
        HeaderStyle::Bilingual,
        HeaderStyle::Canonical,
    ];
}

impl fmt::Display for HeaderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderStyle::Plain => write!(f, "plain"),
            HeaderStyle::Bilingual => write!(f, "bilingual"),
            HeaderStyle::Canonical => write!(f, "canonical"),
        }
    }
}

// ---------------------------------------------------------------------------
// PurineProfile – the five measured quantities of one food
// ---------------------------------------------------------------------------

/// Purine content in mg per 100 g edible portion. Every value is finite and `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PurineProfile {
    pub guanine: f64,
    pub adenine: f64,
    pub hypoxanthine: f64,
    pub xanthine: f64,
    /// Expected to be close to the sum of the other four, not enforced.
    pub total: f64,
}

impl PurineProfile {
    /// Value of a quantity column; `None` for the text columns.
    pub fn get(&self, column: Column) -> Option<f64> {
        match column {
            Column::Guanine => Some(self.guanine),
            Column::Adenine => Some(self.adenine),
            Column::Hypoxanthine => Some(self.hypoxanthine),
            Column::Xanthine => Some(self.xanthine),
            Column::Total => Some(self.total),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, column: Column, value: f64) {
        match column {
            Column::Guanine => self.guanine = value,
            Column::Adenine => self.adenine = value,
            Column::Hypoxanthine => self.hypoxanthine = value,
            Column::Xanthine => self.xanthine = value,
            Column::Total => self.total = value,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// FoodRecord – one row of the reference table
// ---------------------------------------------------------------------------

/// A single food item.
///
/// The name and its search keys are private so the keys can never drift
/// from the name they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodRecord {
    pub category: String,
    name: String,
    #[serde(flatten)]
    pub purines: PurineProfile,
    pub origin: String,
    #[serde(flatten)]
    keys: SearchKeys,
}

impl FoodRecord {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        purines: PurineProfile,
        origin: impl Into<String>,
        transliterator: &dyn Transliterator,
    ) -> Self {
        let name = name.into();
        let keys = SearchKeys::build(&name, transliterator);
        FoodRecord {
            category: category.into(),
            name,
            purines,
            origin: origin.into(),
            keys,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total(&self) -> f64 {
        self.purines.total
    }

    /// Lower-cased transliteration of the name, syllables joined without separators.
    pub fn romanized_name(&self) -> &str {
        &self.keys.romanized_name
    }

    /// First letter of each transliterated syllable, lower-cased.
    pub fn initials(&self) -> &str {
        &self.keys.initials
    }

    /// Display text for a column, quantities rendered as plain decimals.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Category => self.category.clone(),
            Column::Name => self.name.clone(),
            Column::Origin => self.origin.clone(),
            quantity => self
                .purines
                .get(quantity)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// FoodTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full normalised record set with a pre-computed category index.
#[derive(Debug, Clone)]
pub struct FoodTable {
    /// All records in source order.
    pub records: Vec<FoodRecord>,
    /// Distinct categories in first-seen order.
    pub categories: Vec<String>,
    /// Header convention of the file the table was read from.
    pub header_style: HeaderStyle,
}

impl FoodTable {
    /// Build the category index from the loaded records.
    pub fn from_records(records: Vec<FoodRecord>, header_style: HeaderStyle) -> Self {
        let categories: Vec<String> = {
            let mut seen = HashSet::new();
            records
                .iter()
                .filter(|r| seen.insert(r.category.as_str()))
                .map(|r| r.category.clone())
                .collect()
        };
        FoodTable {
            records,
            categories,
            header_style,
        }
    }

    /// Largest `total` in the table, `0` when empty.
    pub fn max_total(&self) -> f64 {
        self.records.iter().map(FoodRecord::total).fold(0.0, f64::max)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
