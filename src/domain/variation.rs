//! Variation analysis over a product's price history
//!
//! Only the latest step is reported: the difference between the two
//! chronologically latest observations, never cumulative drift.

use std::collections::BTreeMap;

use tracing::debug;

use super::catalog::ProductCatalog;
use super::history::HistoryTable;
use super::observation::Observation;

/// Signed price delta between the two latest observations of one product.
///
/// Returns `Some(0.0)` when fewer than two observations exist and `None` when
/// either of the two latest prices is missing (the delta is undefined).
pub fn compute_variation(observations: &[Observation]) -> Option<f64> {
    let mut ordered: Vec<&Observation> = observations.iter().collect();
    // stable: equal timestamps keep log order
    ordered.sort_by_key(|observation| observation.timestamp);

    match ordered.as_slice() {
        [.., previous, last] => match (previous.price, last.price) {
            (Some(before), Some(after)) => Some(after - before),
            _ => None,
        },
        _ => Some(0.0),
    }
}

/// Retained variations for one report cycle, keyed by product id.
///
/// Only defined, nonzero deltas are kept. Iteration is ascending by product id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceVariations {
    deltas: BTreeMap<String, f64>,
}

impl PriceVariations {
    /// Run the analyzer for every catalog entry against the full history
    pub fn from_history(table: &HistoryTable, catalog: &ProductCatalog) -> Self {
        let mut variations = Self::default();
        for product_id in catalog.iter() {
            let series = table.filter_by_id(product_id);
            let delta = compute_variation(&series);
            debug!("Variation for {} over {} observations: {:?}", product_id, series.len(), delta);
            variations.record(product_id, delta);
        }
        variations
    }

    /// Keep the delta only when it is defined and nonzero
    pub fn record(&mut self, product_id: &str, delta: Option<f64>) {
        if let Some(delta) = delta.filter(|d| *d != 0.0 && d.is_finite()) {
            self.deltas.insert(product_id.to_string(), delta);
        }
    }

    pub fn get(&self, product_id: &str) -> Option<f64> {
        self.deltas.get(product_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.deltas.iter().map(|(id, delta)| (id.as_str(), *delta))
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    fn series(prices: &[Option<f64>]) -> Vec<Observation> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| Observation::new(start + Duration::hours(i as i64), "B0", "Book", *price))
            .collect()
    }

    #[rstest]
    #[case::single(&[Some(10.0)], Some(0.0))]
    #[case::empty(&[], Some(0.0))]
    #[case::rising(&[Some(10.0), Some(12.5)], Some(2.5))]
    #[case::falling(&[Some(12.5), Some(10.0)], Some(-2.5))]
    #[case::flat(&[Some(10.0), Some(10.0)], Some(0.0))]
    #[case::only_latest_step(&[Some(3.0), Some(10.0), Some(11.0)], Some(1.0))]
    #[case::missing_last(&[Some(10.0), None], None)]
    #[case::missing_previous(&[None, Some(10.0)], None)]
    #[case::missing_earlier_is_ignored(&[None, Some(4.0), Some(5.0)], Some(1.0))]
    fn test_compute_variation(#[case] prices: &[Option<f64>], #[case] expected: Option<f64>) {
        assert_eq!(compute_variation(&series(prices)), expected);
    }

    #[test]
    fn test_compute_variation_sorts_by_timestamp() {
        let mut observations = series(&[Some(10.0), Some(12.5)]);
        observations.reverse();
        assert_eq!(compute_variation(&observations), Some(2.5));
    }

    #[test]
    fn test_from_history_retains_only_defined_nonzero() {
        let mut records = series(&[Some(10.0), Some(10.0)]);
        records.iter_mut().for_each(|r| r.product_id = "A".into());
        let mut rising = series(&[Some(5.0), Some(6.0)]);
        rising.iter_mut().for_each(|r| r.product_id = "B".into());
        let mut missing = series(&[Some(5.0), None]);
        missing.iter_mut().for_each(|r| r.product_id = "C".into());
        records.extend(rising);
        records.extend(missing);

        let table = HistoryTable::new(records);
        let catalog: ProductCatalog = ["A", "B", "C", "D"].into_iter().collect();
        let variations = PriceVariations::from_history(&table, &catalog);

        assert_eq!(variations.len(), 1);
        assert_eq!(variations.get("B"), Some(1.0));
        assert_eq!(variations.get("A"), None);
        assert_eq!(variations.get("C"), None);
    }

    #[test]
    fn test_iteration_is_ascending_by_id() {
        let mut variations = PriceVariations::default();
        variations.record("Z9", Some(1.0));
        variations.record("A1", Some(-1.0));
        variations.record("M5", Some(0.0));
        let ids: Vec<&str> = variations.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["A1", "Z9"]);
    }
}
