//! Output sinks. A sink receives batches of rows per collection, in the
//! order collections must be inserted so referenced rows land first.

pub mod csv;
pub mod json;
pub mod memory;

use tracing::debug;

use weft_core::Value;

use crate::engine::GenerationResult;
use crate::errors::SinkError;

pub use self::csv::CsvSink;
pub use self::json::{JsonLinesSink, JsonSink};
pub use self::memory::MemorySink;

/// Destination for generated rows.
pub trait Sink {
    /// Receives rows of one collection. May be called several times per
    /// collection.
    fn insert(&mut self, collection: &str, rows: &[Value]) -> Result<(), SinkError>;

    /// Flushes buffered output. Called once after the last batch.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn insert(&mut self, collection: &str, rows: &[Value]) -> Result<(), SinkError> {
        (**self).insert(collection, rows)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// Hands every collection of `result` to `sink` in insertion order.
pub fn deliver(result: &GenerationResult, sink: &mut dyn Sink) -> Result<(), SinkError> {
    for collection in &result.report.insertion_order {
        let Some(rows) = result.samples.rows(collection) else {
            continue;
        };
        debug!(collection = %collection, rows = rows.len(), "delivering rows");
        sink.insert(collection, rows)?;
    }
    sink.finish()
}
