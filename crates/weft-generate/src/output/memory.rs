use weft_core::Value;

use crate::errors::SinkError;
use crate::output::Sink;

/// Keeps every batch in memory, in the order it was received.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub batches: Vec<(String, Vec<Value>)>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection names in delivery order.
    pub fn order(&self) -> Vec<&str> {
        self.batches.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn rows(&self, collection: &str) -> Vec<&Value> {
        self.batches
            .iter()
            .filter(|(name, _)| name == collection)
            .flat_map(|(_, rows)| rows.iter())
            .collect()
    }
}

impl Sink for MemorySink {
    fn insert(&mut self, collection: &str, rows: &[Value]) -> Result<(), SinkError> {
        if self.finished {
            return Err(SinkError::Rejected {
                collection: collection.to_string(),
                message: "sink already finished".to_string(),
            });
        }
        self.batches.push((collection.to_string(), rows.to_vec()));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
