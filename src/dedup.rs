use std::collections::HashSet;

use crate::models::job::JobRecord;

/// Session-scoped insert-if-absent set of records keyed by
/// `JobRecord::canonical_key`. Iteration follows insertion order.
#[derive(Debug, Default)]
pub struct DedupIndex {
    keys: HashSet<String>,
    records: Vec<JobRecord>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn contains(&self, record: &JobRecord) -> bool {
        self.contains_key(&record.canonical_key())
    }

    /// Add `record` unless its key is already present. Returns whether it
    /// was added.
    pub fn insert(&mut self, record: JobRecord) -> bool {
        if !self.keys.insert(record.canonical_key()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<JobRecord> {
        self.records
    }
}
