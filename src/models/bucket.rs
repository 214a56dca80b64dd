//! Aggregation bucket

use serde::Serialize;

/// One grouped count for an aggregation dimension. For a given dimension the
/// bucket counts always sum to the size of the filtered input set.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AggregateBucket {
    pub key: String,
    pub count: u64,
}

impl AggregateBucket {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self { key: key.into(), count }
    }
}
