use std::collections::BTreeMap;

use crate::dataset::Dataset;
use crate::error::{Result, StockError};
use crate::models::DatasetKind;

/// Application state for one run: the loaded tables, keyed by kind.
///
/// Filled by the loader before any report is built; report code only ever
/// receives `&Session` or `&Dataset`.
#[derive(Debug, Default)]
pub struct Session {
    datasets: BTreeMap<DatasetKind, Dataset>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under its own kind, replacing any previous one.
    pub fn insert(&mut self, dataset: Dataset) {
        self.datasets.insert(dataset.kind, dataset);
    }

    pub fn get(&self, kind: DatasetKind) -> Result<&Dataset> {
        self.datasets
            .get(&kind)
            .ok_or(StockError::MissingDataset(kind))
    }
}
