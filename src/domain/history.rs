//! Read-back view of the observation log

use super::observation::Observation;

/// Every persisted observation, in the order the log stored them.
///
/// Append order is expected to be chronological but nothing here relies on it;
/// consumers that need "most recent" sort by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTable {
    records: Vec<Observation>,
}

impl HistoryTable {
    pub fn new(records: Vec<Observation>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Subsequence of records for one product, relative order preserved
    pub fn filter_by_id(&self, product_id: &str) -> Vec<Observation> {
        self.records
            .iter()
            .filter(|record| record.product_id == product_id)
            .cloned()
            .collect()
    }

    /// Title of the chronologically latest observation that has one
    pub fn latest_title(&self, product_id: &str) -> Option<&str> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.product_id == product_id && !record.title.is_empty())
            // index breaks timestamp ties so later appends win
            .max_by_key(|(index, record)| (record.timestamp, *index))
            .map(|(_, record)| record.title.as_str())
    }
}

impl From<Vec<Observation>> for HistoryTable {
    fn from(records: Vec<Observation>) -> Self {
        Self::new(records)
    }
}

impl IntoIterator for HistoryTable {
    type Item = Observation;
    type IntoIter = std::vec::IntoIter<Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
