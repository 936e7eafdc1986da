//! Compiles content trees into a flat node arena the sampler walks.
//!
//! Every node keeps its own state (id counters, series cursors, unique sets,
//! reference buffers) so a namespace compiled once can be sampled pass after
//! pass without global state.

mod resolve;

use std::collections::HashSet;
use std::sync::Arc;

use rand::distr::weighted::WeightedIndex;
use rand_regex::Regex as RandRegex;
use tracing::debug;

use weft_core::{
    Content, ContentKind, DependencyReport, FakerContent, FieldRef, Namespace, SchemaError,
    Segment, SerializedContent, StringContent, Value, child_path,
};

use crate::generators::primitives::{BoolSampler, CategoricalSampler, NumberSampler};
use crate::generators::series::SeriesSampler;

pub(crate) type NodeId = usize;

/// Options applied while compiling a namespace.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Null probability of optional nodes that declare no `null_rate`.
    pub null_rate: f64,
    /// Attempts per `unique` node before giving up.
    pub max_unique_attempts: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            null_rate: 0.5,
            max_unique_attempts: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) path: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) null_rate: Option<f64>,
    pub(crate) hidden: bool,
    pub(crate) unique: Option<UniqueSet>,
    pub(crate) kind: NodeKind,
    /// References whose buffer is cleared when this node is entered.
    pub(crate) clears: Vec<usize>,
    /// References whose read cursor rewinds when this node is entered.
    pub(crate) rewinds: Vec<usize>,
    /// References fed with every value this node produces.
    pub(crate) records: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Null,
    Bool(BoolSampler),
    Number(NumberSampler),
    String(StringSampler),
    Array {
        length: NodeId,
        content: NodeId,
    },
    Object {
        fields: Arc<[(String, NodeId)]>,
        order: Arc<[usize]>,
    },
    OneOf {
        variants: Arc<[NodeId]>,
        index: WeightedIndex<f64>,
    },
    SameAs {
        reference: usize,
    },
    /// A string built from the values of its `arguments`.
    Composite {
        rule: Compose,
        arguments: Arc<[NodeId]>,
        order: Arc<[usize]>,
    },
}

#[derive(Debug, Clone)]
pub(crate) enum Compose {
    Format(Arc<[Segment]>),
    /// Arguments: content, length.
    Truncated,
    /// Arguments: content, slice.
    Sliced,
    /// Arguments: content.
    Json,
}

#[derive(Debug, Clone)]
pub(crate) enum StringSampler {
    Constant(String),
    Pattern(RandRegex),
    Faker(FakerContent),
    Categorical(CategoricalSampler),
    DateTime(weft_core::DateTimeContent),
    Series(SeriesSampler),
    Uuid,
}

#[derive(Debug, Clone)]
pub(crate) struct UniqueSet {
    pub(crate) seen: HashSet<String>,
    pub(crate) max_attempts: u32,
}

/// A resolved `same_as` edge. The target pushes into `buffer`, the source
/// reads it back through `cursor`.
#[derive(Debug, Clone)]
pub(crate) struct Reference {
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,
    /// An array sits between the clearing scope and the target, so an empty
    /// buffer means there was nothing to copy rather than a skipped optional.
    pub(crate) through_array: bool,
    pub(crate) buffer: Vec<Value>,
    pub(crate) cursor: usize,
}

/// A namespace compiled for sampling.
#[derive(Debug, Clone)]
pub struct CompiledNamespace {
    pub(crate) nodes: Vec<Node>,
    pub(crate) references: Vec<Reference>,
    pub(crate) roots: Vec<(String, NodeId)>,
    pub(crate) root_order: Vec<usize>,
    pub(crate) reference_report: DependencyReport,
}

impl CompiledNamespace {
    /// Collection names, sorted.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.roots.iter().any(|(name, _)| name == collection)
    }

    /// Collections whose rows appear in the output.
    pub fn visible_collections(&self) -> impl Iterator<Item = &str> {
        self.roots
            .iter()
            .filter(|(_, root)| !self.nodes[*root].hidden)
            .map(|(name, _)| name.as_str())
    }

    /// Order in which collections are sampled and inserted: referenced
    /// collections come before the collections that copy from them.
    pub fn insertion_order(&self) -> Vec<String> {
        self.root_order
            .iter()
            .map(|index| self.roots[*index].0.clone())
            .collect()
    }

    /// Graph of `same_as` edges between nodes, target before source.
    pub fn reference_report(&self) -> &DependencyReport {
        &self.reference_report
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Compiles every collection of `namespace` and links its references.
pub fn compile(
    namespace: &Namespace,
    options: &CompileOptions,
) -> Result<CompiledNamespace, SchemaError> {
    let mut builder = Builder::new(options)?;
    for (name, content) in namespace.collections() {
        builder.add_root(name, content)?;
    }
    let compiled = builder.finish()?;
    debug!(
        collections = compiled.roots.len(),
        nodes = compiled.nodes.len(),
        references = compiled.references.len(),
        "namespace compiled"
    );
    Ok(compiled)
}

/// Compiles a single content tree under `name`. Any node kind may be the
/// root; references must name `name` as their collection.
pub fn compile_content(
    name: &str,
    content: &Content,
    options: &CompileOptions,
) -> Result<CompiledNamespace, SchemaError> {
    let mut builder = Builder::new(options)?;
    builder.add_root(name, content)?;
    builder.finish()
}

struct Builder<'a> {
    options: &'a CompileOptions,
    nodes: Vec<Node>,
    roots: Vec<(String, NodeId)>,
    pending: Vec<(NodeId, FieldRef)>,
}

impl<'a> Builder<'a> {
    fn new(options: &'a CompileOptions) -> Result<Self, SchemaError> {
        if !(0.0..=1.0).contains(&options.null_rate) {
            return Err(SchemaError::invalid("options", "null_rate must be within [0, 1]"));
        }
        if options.max_unique_attempts == 0 {
            return Err(SchemaError::invalid(
                "options",
                "max_unique_attempts must be positive",
            ));
        }
        Ok(Self {
            options,
            nodes: Vec::new(),
            roots: Vec::new(),
            pending: Vec::new(),
        })
    }

    fn add_root(&mut self, name: &str, content: &Content) -> Result<(), SchemaError> {
        let root = self.add(content, name.to_string(), None)?;
        self.roots.push((name.to_string(), root));
        Ok(())
    }

    fn finish(self) -> Result<CompiledNamespace, SchemaError> {
        let mut compiled = CompiledNamespace {
            nodes: self.nodes,
            references: Vec::new(),
            roots: self.roots,
            root_order: Vec::new(),
            reference_report: DependencyReport::default(),
        };
        resolve::link(&mut compiled, self.pending)?;
        Ok(compiled)
    }

    fn add(
        &mut self,
        content: &Content,
        path: String,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SchemaError> {
        let id = self.nodes.len();
        let labels = &content.labels;
        self.nodes.push(Node {
            null_rate: labels
                .optional
                .then(|| labels.null_rate.unwrap_or(self.options.null_rate)),
            hidden: labels.hidden,
            unique: labels.unique.then(|| UniqueSet {
                seen: HashSet::new(),
                max_attempts: self.options.max_unique_attempts,
            }),
            path: path.clone(),
            parent,
            kind: NodeKind::Null,
            clears: Vec::new(),
            rewinds: Vec::new(),
            records: Vec::new(),
        });

        let kind = match &content.kind {
            ContentKind::Null => NodeKind::Null,
            ContentKind::Bool(content) => NodeKind::Bool(BoolSampler::new(content, &path)?),
            ContentKind::Number(content) => NodeKind::Number(NumberSampler::new(content)),
            ContentKind::String(StringContent::Format(format)) => {
                let mut arguments = Vec::with_capacity(format.arguments.len());
                for (name, argument) in &format.arguments {
                    arguments.push(self.add(argument, child_path(&path, name), Some(id))?);
                }
                composite(Compose::Format(format.segments.clone().into()), arguments)
            }
            ContentKind::String(StringContent::Truncated(truncated)) => {
                let arguments = vec![
                    self.add(&truncated.content, child_path(&path, "content"), Some(id))?,
                    self.add(&truncated.length, child_path(&path, "length"), Some(id))?,
                ];
                composite(Compose::Truncated, arguments)
            }
            ContentKind::String(StringContent::Sliced(sliced)) => {
                let arguments = vec![
                    self.add(&sliced.content, child_path(&path, "content"), Some(id))?,
                    self.add(&sliced.slice, child_path(&path, "slice"), Some(id))?,
                ];
                composite(Compose::Sliced, arguments)
            }
            ContentKind::String(StringContent::Serialized(SerializedContent::Json { content })) => {
                let arguments = vec![self.add(content, child_path(&path, "content"), Some(id))?];
                composite(Compose::Json, arguments)
            }
            ContentKind::String(content) => NodeKind::String(string_sampler(content, &path)?),
            ContentKind::Array(array) => {
                let length = self.add(&array.length, child_path(&path, "length"), Some(id))?;
                let content = self.add(&array.content, child_path(&path, "content"), Some(id))?;
                NodeKind::Array { length, content }
            }
            ContentKind::Object(object) => {
                let mut fields = Vec::with_capacity(object.fields.len());
                for (name, field) in &object.fields {
                    let child = self.add(field, child_path(&path, name), Some(id))?;
                    fields.push((name.clone(), child));
                }
                NodeKind::Object {
                    order: (0..fields.len()).collect::<Vec<_>>().into(),
                    fields: fields.into(),
                }
            }
            ContentKind::OneOf(one_of) => {
                let index = WeightedIndex::new(one_of.variants.iter().map(|variant| variant.weight))
                    .map_err(|err| SchemaError::invalid(&path, err.to_string()))?;
                let mut variants = Vec::with_capacity(one_of.variants.len());
                for (position, variant) in one_of.variants.iter().enumerate() {
                    variants.push(self.add(
                        &variant.content,
                        child_path(&path, &position.to_string()),
                        Some(id),
                    )?);
                }
                NodeKind::OneOf {
                    variants: variants.into(),
                    index,
                }
            }
            ContentKind::SameAs(same_as) => {
                let reference = self.pending.len();
                self.pending.push((id, same_as.reference.clone()));
                NodeKind::SameAs { reference }
            }
        };
        self.nodes[id].kind = kind;
        Ok(id)
    }
}

fn composite(rule: Compose, arguments: Vec<NodeId>) -> NodeKind {
    NodeKind::Composite {
        rule,
        order: (0..arguments.len()).collect::<Vec<_>>().into(),
        arguments: arguments.into(),
    }
}

fn string_sampler(content: &StringContent, path: &str) -> Result<StringSampler, SchemaError> {
    Ok(match content {
        StringContent::Constant(text) => StringSampler::Constant(text.clone()),
        StringContent::Pattern(pattern) => StringSampler::Pattern(pattern.regex().clone()),
        StringContent::Faker(faker) => StringSampler::Faker(*faker),
        StringContent::Categorical(categorical) => {
            StringSampler::Categorical(CategoricalSampler::new(categorical, path)?)
        }
        StringContent::DateTime(date_time) => StringSampler::DateTime(date_time.clone()),
        StringContent::Series(series) => StringSampler::Series(SeriesSampler::new(series)),
        StringContent::Uuid => StringSampler::Uuid,
        StringContent::Format(_)
        | StringContent::Truncated(_)
        | StringContent::Sliced(_)
        | StringContent::Serialized(_) => {
            return Err(SchemaError::invalid(path, "composite strings compile to composite nodes"));
        }
    })
}
