use std::collections::HashMap;

use serde::Serialize;

use super::filter::sort_by_total_desc;
use super::model::FoodRecord;

/// Direction for ranking aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

/// Mean `total` of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub category: String,
    pub mean_total: f64,
    pub count: usize,
}

/// Mean `total` per category over the full record set.
///
/// Sorted by mean in the requested order; equal means keep the order in
/// which their categories first appear in `records`.
pub fn category_averages(records: &[FoodRecord], order: SortOrder) -> Vec<CategoryAverage> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sums: Vec<(&str, f64, usize)> = Vec::new();

    for rec in records {
        let slot = *index.entry(rec.category.as_str()).or_insert_with(|| {
            sums.push((rec.category.as_str(), 0.0, 0));
            sums.len() - 1
        });
        sums[slot].1 += rec.total();
        sums[slot].2 += 1;
    }

    let mut averages: Vec<CategoryAverage> = sums
        .into_iter()
        .map(|(category, sum, count)| CategoryAverage {
            category: category.to_string(),
            mean_total: sum / count as f64,
            count,
        })
        .collect();

    match order {
        SortOrder::Descending => averages.sort_by(|a, b| b.mean_total.total_cmp(&a.mean_total)),
        SortOrder::Ascending => averages.sort_by(|a, b| a.mean_total.total_cmp(&b.mean_total)),
    }
    averages
}

/// The `n` records with the largest `total` as `(name, total)` pairs.
///
/// Ties keep source order.
pub fn top_n(records: &[FoodRecord], n: usize) -> Vec<(&str, f64)> {
    let mut ranked: Vec<&FoodRecord> = records.iter().collect();
    sort_by_total_desc(&mut ranked);
    ranked
        .into_iter()
        .take(n)
        .map(|r| (r.name(), r.total()))
        .collect()
}
