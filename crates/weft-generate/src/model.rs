use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use weft_core::Value;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Rows to produce: across all collections, or for `collection` only.
    pub size: u64,
    /// Seed of the random stream. A random seed is drawn when unset.
    pub seed: Option<u64>,
    /// Only emit (and count) rows of this collection.
    pub collection: Option<String>,
    /// Null probability for optional nodes without their own `null_rate`.
    pub null_rate: f64,
    /// Maximum attempts to find an unseen value for `unique` nodes.
    pub max_unique_attempts: u32,
    /// Consecutive passes without any row before the run is aborted.
    pub max_empty_passes: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            size: 1,
            seed: None,
            collection: None,
            null_rate: 0.5,
            max_unique_attempts: 50,
            max_empty_passes: 1000,
        }
    }
}

/// Summary of a generated collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub name: String,
    pub rows: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub size: u64,
    pub passes: u64,
    pub rows_total: u64,
    pub collections: Vec<CollectionReport>,
    pub insertion_order: Vec<String>,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64, size: u64) -> Self {
        Self {
            run_id,
            seed,
            size,
            passes: 0,
            rows_total: 0,
            collections: Vec::new(),
            insertion_order: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record_pass(&mut self) {
        self.passes += 1;
    }

    pub fn record_collection(&mut self, name: &str, rows: u64) {
        self.rows_total += rows;
        self.collections.push(CollectionReport {
            name: name.to_string(),
            rows,
        });
    }
}

/// Generated rows keyed by collection name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Samples {
    collections: BTreeMap<String, Vec<Value>>,
}

impl Samples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, collection: &str) {
        self.collections.entry(collection.to_string()).or_default();
    }

    pub fn extend(&mut self, collection: &str, rows: impl IntoIterator<Item = Value>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, collection: &str) -> Option<&[Value]> {
        self.collections.get(collection).map(Vec::as_slice)
    }

    pub fn collections(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.collections
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    pub fn total_rows(&self) -> u64 {
        self.collections.values().map(|rows| rows.len() as u64).sum()
    }

    /// `{collection: [rows]}` with collections sorted by name.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.collections
                .iter()
                .map(|(name, rows)| (name.clone(), Value::Array(rows.clone())))
                .collect(),
        )
    }
}
