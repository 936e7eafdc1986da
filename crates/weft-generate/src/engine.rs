use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use weft_core::{Namespace, Value};

use crate::compile::{CompileOptions, CompiledNamespace, compile};
use crate::errors::{GenerationError, SamplingError};
use crate::generators::Journal;
use crate::model::{GenerateOptions, GenerationReport, Samples};

/// Pull-based sampler over a compiled namespace.
///
/// Each call to [`Sampler::next_pass`] samples every collection once. The
/// sampler owns the random stream and all per-node state, so two samplers
/// built from the same compiled namespace and seed produce identical passes.
/// Restarting means building a new sampler.
#[derive(Debug)]
pub struct Sampler {
    compiled: CompiledNamespace,
    rng: ChaCha8Rng,
    seed: u64,
    passes: u64,
}

impl Sampler {
    pub fn new(compiled: CompiledNamespace, seed: u64) -> Self {
        Self {
            compiled,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            passes: 0,
        }
    }

    /// Seeds the stream from the thread-local generator.
    pub fn with_random_seed(compiled: CompiledNamespace) -> Self {
        Self::new(compiled, rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn compiled(&self) -> &CompiledNamespace {
        &self.compiled
    }

    /// Samples one pass: `(collection, value)` for every visible collection.
    /// A failed pass leaves per-node state as it was before the pass.
    pub fn next_pass(&mut self) -> Result<Vec<(String, Value)>, SamplingError> {
        let mut journal = Journal::default();
        match self.compiled.sample_pass(&mut self.rng, &mut journal) {
            Ok(values) => {
                self.passes += 1;
                Ok(values)
            }
            Err(err) => {
                debug!(undone = journal.len(), error = %err, "pass rolled back");
                self.compiled.rollback(journal);
                Err(err)
            }
        }
    }

    /// Samples one pass and returns the value of a single collection.
    pub fn next_value(&mut self, collection: &str) -> Result<Option<Value>, SamplingError> {
        let pass = self.next_pass()?;
        Ok(pass
            .into_iter()
            .find(|(name, _)| name == collection)
            .map(|(_, value)| value))
    }
}

impl Iterator for Sampler {
    type Item = Result<Vec<(String, Value)>, SamplingError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_pass())
    }
}

/// Rows a collection value contributes: array elements, or the value itself.
pub fn rows_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub samples: Samples,
    pub report: GenerationReport,
}

/// Drives a sampler until the requested number of rows exists.
#[derive(Debug, Clone, Default)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn compile(&self, namespace: &Namespace) -> Result<CompiledNamespace, GenerationError> {
        let options = CompileOptions {
            null_rate: self.options.null_rate,
            max_unique_attempts: self.options.max_unique_attempts,
        };
        if !(0.0..=1.0).contains(&options.null_rate) {
            return Err(GenerationError::InvalidOptions(format!(
                "null_rate {} must be within [0, 1]",
                options.null_rate
            )));
        }
        if options.max_unique_attempts == 0 {
            return Err(GenerationError::InvalidOptions(
                "max_unique_attempts must be positive".to_string(),
            ));
        }
        Ok(compile(namespace, &options)?)
    }

    pub fn run(&self, namespace: &Namespace) -> Result<GenerationResult, GenerationError> {
        let compiled = self.compile(namespace)?;
        self.run_compiled(compiled)
    }

    /// Samples passes until `size` rows were produced. Whole passes are kept,
    /// so the final count may exceed `size`.
    pub fn run_compiled(
        &self,
        compiled: CompiledNamespace,
    ) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let seed = self.options.seed.unwrap_or_else(rand::random);
        let target = self.options.collection.clone();
        if let Some(collection) = &target
            && !compiled.visible_collections().any(|name| name == collection)
        {
            return Err(GenerationError::UnknownCollection(collection.clone()));
        }

        let mut report = GenerationReport::new(run_id.clone(), seed, self.options.size);
        report.insertion_order = compiled.insertion_order();
        let mut samples = Samples::new();
        for name in compiled.visible_collections() {
            if target.as_deref().is_none_or(|target| target == name) {
                samples.declare(name);
            }
        }

        info!(
            run_id = %run_id,
            seed,
            size = self.options.size,
            collections = compiled.roots.len(),
            collection = target.as_deref().unwrap_or(""),
            "generation started"
        );

        let mut sampler = Sampler::new(compiled, seed);
        let mut produced = 0_u64;
        let mut empty_passes = 0_u32;
        while produced < self.options.size {
            let pass = match sampler.next_pass() {
                Ok(pass) => pass,
                Err(err) => {
                    warn!(run_id = %run_id, error = %err, "generation failed");
                    return Err(err.into());
                }
            };
            report.record_pass();
            let mut pass_rows = 0_u64;
            for (name, value) in pass {
                if target.as_deref().is_some_and(|target| target != name) {
                    continue;
                }
                let rows = rows_of(value);
                pass_rows += rows.len() as u64;
                samples.extend(&name, rows);
            }
            if pass_rows == 0 {
                empty_passes += 1;
                if empty_passes >= self.options.max_empty_passes {
                    let err = SamplingError::NoProgress {
                        passes: empty_passes,
                    };
                    warn!(run_id = %run_id, error = %err, "generation failed");
                    return Err(err.into());
                }
            } else {
                empty_passes = 0;
            }
            produced += pass_rows;
        }

        for (name, rows) in samples.collections() {
            report.record_collection(name, rows.len() as u64);
            info!(collection = %name, rows = rows.len(), "collection generated");
        }
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            passes = report.passes,
            rows = report.rows_total,
            duration_ms = report.duration_ms,
            "generation completed"
        );
        Ok(GenerationResult { samples, report })
    }
}
