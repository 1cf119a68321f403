use crate::counter::FrequencyTable;
use serde::Serialize;

/// One word and its count in a ranked list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub word: String,
    pub count: u64,
}

/// Order the table by count, highest first.
///
/// Words with equal counts come out in no particular order.
pub fn rank(table: &FrequencyTable) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = table
        .iter()
        .map(|(word, count)| RankedEntry {
            word: word.to_string(),
            count,
        })
        .collect();
    ranked.sort_unstable_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// A bar to plot: share of all tokens (in percent) and its word
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartValue {
    pub value: f64,
    pub label: String,
}

/// Percentages of `total` for the first `top_n` ranked entries.
///
/// An empty run (`total == 0`) has nothing to plot and yields no values.
pub fn chart_values(ranked: &[RankedEntry], total: u64, top_n: usize) -> Vec<ChartValue> {
    if total == 0 {
        return Vec::new();
    }
    ranked
        .iter()
        .take(top_n)
        .map(|entry| ChartValue {
            value: entry.count as f64 / total as f64 * 100.0,
            label: entry.word.clone(),
        })
        .collect()
}
