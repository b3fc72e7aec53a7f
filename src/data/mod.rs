/// Data layer: core types, loading, search keys, filtering and aggregates.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, resolve headers, coerce quantities
///   └──────────┘
///        │            ┌────────────┐
///        ├──────────▶ │ search_key │  name → pinyin + initials
///        ▼            └────────────┘
///   ┌───────────┐
///   │ FoodTable  │  Vec<FoodRecord>, category index
///   └───────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  filter   │ per query│ insight   │ full table
///   └──────────┘          └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  CSV bytes / Parquet file
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod insight;
pub mod loader;
pub mod model;
pub mod search_key;
