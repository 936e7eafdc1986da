//! Sampling engine for weft namespaces.
//!
//! A [`Namespace`](weft_core::Namespace) is compiled once into a node graph
//! with resolved references, then sampled pass by pass from a seeded
//! ChaCha stream. The same namespace and seed always produce the same
//! values.

pub mod compile;
pub mod engine;
pub mod errors;
pub(crate) mod generators;
pub mod model;
pub mod output;

pub use compile::{CompileOptions, CompiledNamespace, compile, compile_content};
pub use engine::{GenerationEngine, GenerationResult, Sampler, rows_of};
pub use errors::{GenerationError, SamplingError, SinkError};
pub use model::{CollectionReport, GenerateOptions, GenerationReport, Samples};
pub use output::{CsvSink, JsonLinesSink, JsonSink, MemorySink, Sink, deliver};
