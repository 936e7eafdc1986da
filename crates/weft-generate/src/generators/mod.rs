//! Samplers for every node kind, and the walk over a compiled namespace.

pub(crate) mod date_time;
pub(crate) mod faker;
pub(crate) mod primitives;
pub(crate) mod series;

use rand::{Rng, RngCore};

use weft_core::{Segment, Value};

use crate::compile::{CompiledNamespace, Compose, NodeId, NodeKind, StringSampler};
use crate::errors::SamplingError;
use crate::generators::series::SeriesSampler;

/// Per-node state changes made during one pass, undone in reverse order
/// when the pass fails.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<Undo>,
}

#[derive(Debug)]
enum Undo {
    Counter { node: NodeId, previous: i128 },
    Series { node: NodeId, previous: Box<SeriesSampler> },
    Unique { node: NodeId, key: String },
}

impl Journal {
    fn push(&mut self, undo: Undo) {
        self.entries.push(undo);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Composite work left to do once the node borrow is released.
enum Step {
    Array(NodeId, NodeId),
    Object,
    Delegate(NodeId),
    Copy(usize),
    Composite,
}

impl CompiledNamespace {
    /// One value per collection, in collection name order. Hidden
    /// collections are sampled but not returned.
    pub(crate) fn sample_pass(
        &mut self,
        rng: &mut dyn RngCore,
        journal: &mut Journal,
    ) -> Result<Vec<(String, Value)>, SamplingError> {
        let mut values: Vec<Option<Value>> = vec![None; self.roots.len()];
        for position in 0..self.root_order.len() {
            let index = self.root_order[position];
            let root = self.roots[index].1;
            values[index] = Some(self.sample_node(root, rng, journal)?);
        }
        Ok(self
            .roots
            .iter()
            .zip(values)
            .filter(|((_, root), _)| !self.nodes[*root].hidden)
            .map(|((name, _), value)| (name.clone(), value.unwrap_or_default()))
            .collect())
    }

    /// Undoes every state change recorded in `journal`.
    pub(crate) fn rollback(&mut self, journal: Journal) {
        for undo in journal.entries.into_iter().rev() {
            match undo {
                Undo::Counter { node, previous } => {
                    if let NodeKind::Number(sampler) = &mut self.nodes[node].kind {
                        sampler.restore(previous);
                    }
                }
                Undo::Series { node, previous } => {
                    if let NodeKind::String(StringSampler::Series(sampler)) =
                        &mut self.nodes[node].kind
                    {
                        *sampler = *previous;
                    }
                }
                Undo::Unique { node, key } => {
                    if let Some(unique) = &mut self.nodes[node].unique {
                        unique.seen.remove(&key);
                    }
                }
            }
        }
        for reference in &mut self.references {
            reference.buffer.clear();
            reference.cursor = 0;
        }
    }

    fn sample_node(
        &mut self,
        id: NodeId,
        rng: &mut dyn RngCore,
        journal: &mut Journal,
    ) -> Result<Value, SamplingError> {
        let Self {
            nodes, references, ..
        } = self;
        for &reference in &nodes[id].clears {
            references[reference].buffer.clear();
        }
        for &reference in &nodes[id].rewinds {
            references[reference].cursor = 0;
        }

        let value = self.sample_labelled(id, rng, journal)?;

        let Self {
            nodes, references, ..
        } = self;
        for &reference in &nodes[id].records {
            references[reference].buffer.push(value.clone());
        }
        Ok(value)
    }

    fn sample_labelled(
        &mut self,
        id: NodeId,
        rng: &mut dyn RngCore,
        journal: &mut Journal,
    ) -> Result<Value, SamplingError> {
        if let Some(rate) = self.nodes[id].null_rate
            && rng.random_bool(rate)
        {
            return Ok(Value::Null);
        }
        let Some(attempts) = self.nodes[id].unique.as_ref().map(|set| set.max_attempts) else {
            return self.sample_kind(id, rng, journal);
        };
        let marks = self.reference_marks();
        for _ in 0..attempts {
            let value = self.sample_kind(id, rng, journal)?;
            let key = value.canonical_key();
            if let Some(unique) = &mut self.nodes[id].unique
                && unique.seen.insert(key.clone())
            {
                journal.push(Undo::Unique { node: id, key });
                return Ok(value);
            }
            // A rejected value must not be replayed by copies.
            self.reset_references(&marks);
        }
        Err(SamplingError::UniqueExhausted {
            path: self.nodes[id].path.clone(),
            attempts,
        })
    }

    /// Buffer length and cursor of every reference.
    fn reference_marks(&self) -> Vec<(usize, usize)> {
        self.references
            .iter()
            .map(|reference| (reference.buffer.len(), reference.cursor))
            .collect()
    }

    fn reset_references(&mut self, marks: &[(usize, usize)]) {
        for (reference, &(len, cursor)) in self.references.iter_mut().zip(marks) {
            reference.buffer.truncate(len);
            reference.cursor = cursor;
        }
    }

    fn sample_kind(
        &mut self,
        id: NodeId,
        rng: &mut dyn RngCore,
        journal: &mut Journal,
    ) -> Result<Value, SamplingError> {
        let node = &mut self.nodes[id];
        let path = node.path.as_str();
        let step = match &mut node.kind {
            NodeKind::Null => return Ok(Value::Null),
            NodeKind::Bool(sampler) => return Ok(sampler.sample(rng)),
            NodeKind::Number(sampler) => {
                let checkpoint = sampler.checkpoint();
                let value = sampler.sample(rng, path)?;
                if let Some(previous) = checkpoint {
                    journal.push(Undo::Counter { node: id, previous });
                }
                return Ok(value);
            }
            NodeKind::String(StringSampler::Series(sampler)) => {
                let previous = Box::new(sampler.clone());
                let value = sampler.sample(rng, path)?;
                journal.push(Undo::Series { node: id, previous });
                return Ok(value);
            }
            NodeKind::String(sampler) => return sample_string(sampler, rng, path),
            NodeKind::Array { length, content } => Step::Array(*length, *content),
            NodeKind::Object { .. } => Step::Object,
            NodeKind::OneOf { variants, index } => Step::Delegate(variants[rng.sample(&*index)]),
            NodeKind::SameAs { reference } => Step::Copy(*reference),
            NodeKind::Composite { .. } => Step::Composite,
        };

        match step {
            Step::Array(length, content) => {
                let length = self.sample_node(length, rng, journal)?;
                let count = array_length(&length).ok_or_else(|| SamplingError::InvalidLength {
                    path: self.nodes[id].path.clone(),
                    message: format!("expected a non-negative integer, got {length}"),
                })?;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.sample_node(content, rng, journal)?);
                }
                Ok(Value::Array(items))
            }
            Step::Object => self.sample_object(id, rng, journal),
            Step::Delegate(variant) => self.sample_node(variant, rng, journal),
            Step::Copy(reference) => self.copy_reference(id, reference),
            Step::Composite => self.sample_composite(id, rng, journal),
        }
    }

    fn sample_object(
        &mut self,
        id: NodeId,
        rng: &mut dyn RngCore,
        journal: &mut Journal,
    ) -> Result<Value, SamplingError> {
        let NodeKind::Object { fields, order } = &self.nodes[id].kind else {
            return Ok(Value::Null);
        };
        let (fields, order) = (fields.clone(), order.clone());
        let mut slots: Vec<Option<Value>> = vec![None; fields.len()];
        for &position in order.iter() {
            slots[position] = Some(self.sample_node(fields[position].1, rng, journal)?);
        }
        Ok(Value::Object(
            fields
                .iter()
                .zip(slots)
                .filter(|((_, child), _)| !self.nodes[*child].hidden)
                .map(|((name, _), value)| (name.clone(), value.unwrap_or_default()))
                .collect(),
        ))
    }

    fn sample_composite(
        &mut self,
        id: NodeId,
        rng: &mut dyn RngCore,
        journal: &mut Journal,
    ) -> Result<Value, SamplingError> {
        let NodeKind::Composite {
            rule,
            arguments,
            order,
        } = &self.nodes[id].kind
        else {
            return Ok(Value::Null);
        };
        let (rule, arguments, order) = (rule.clone(), arguments.clone(), order.clone());
        let mut slots: Vec<Value> = vec![Value::Null; arguments.len()];
        for &position in order.iter() {
            slots[position] = self.sample_node(arguments[position], rng, journal)?;
        }
        let path = self.nodes[id].path.as_str();
        match (rule, slots.as_slice()) {
            (Compose::Format(segments), _) => {
                let mut rendered = String::new();
                for segment in segments.iter() {
                    match segment {
                        Segment::Literal(text) => rendered.push_str(text),
                        Segment::Argument(position) => {
                            if let Some(value) = slots.get(*position) {
                                rendered.push_str(&value.to_string());
                            }
                        }
                    }
                }
                Ok(Value::String(rendered))
            }
            (Compose::Truncated, [Value::Null, _]) | (Compose::Sliced, [Value::Null, _]) => {
                Ok(Value::Null)
            }
            (Compose::Truncated, [content, length]) => {
                let text = expect_str(content, path)?;
                let length = array_length(length).ok_or_else(|| SamplingError::InvalidLength {
                    path: path.to_string(),
                    message: format!("expected a non-negative integer, got {length}"),
                })?;
                Ok(Value::String(text.chars().take(length).collect()))
            }
            (Compose::Sliced, [content, slice]) => {
                let text = expect_str(content, path)?;
                Ok(Value::String(primitives::slice_chars(text, slice, path)?))
            }
            (Compose::Json, [content]) => Ok(Value::String(content.to_json().to_string())),
            _ => Ok(Value::Null),
        }
    }

    fn copy_reference(&mut self, id: NodeId, reference: usize) -> Result<Value, SamplingError> {
        let reference = &mut self.references[reference];
        if reference.buffer.is_empty() {
            if reference.through_array {
                return Err(SamplingError::EmptyReference {
                    path: self.nodes[id].path.clone(),
                    target: self.nodes[reference.target].path.clone(),
                });
            }
            return Ok(Value::Null);
        }
        let value = reference.buffer[reference.cursor % reference.buffer.len()].clone();
        reference.cursor += 1;
        Ok(value)
    }
}

fn sample_string(
    sampler: &mut StringSampler,
    rng: &mut dyn RngCore,
    path: &str,
) -> Result<Value, SamplingError> {
    match sampler {
        StringSampler::Constant(text) => Ok(Value::String(text.clone())),
        StringSampler::Pattern(regex) => Ok(primitives::sample_pattern(regex, rng)),
        StringSampler::Faker(content) => Ok(faker::sample_faker(content, rng)),
        StringSampler::Categorical(categorical) => Ok(categorical.sample(rng)),
        StringSampler::DateTime(content) => date_time::sample_date_time(content, rng, path),
        StringSampler::Series(series) => series.sample(rng, path),
        StringSampler::Uuid => Ok(primitives::sample_uuid(rng)),
    }
}

fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, SamplingError> {
    value.as_str().ok_or_else(|| SamplingError::NotAString {
        path: path.to_string(),
        found: value.to_json().to_string(),
    })
}

fn array_length(value: &Value) -> Option<usize> {
    value
        .as_i128()
        .filter(|length| *length >= 0)
        .and_then(|length| usize::try_from(length).ok())
}
