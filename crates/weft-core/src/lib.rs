//! Core contracts for weft.
//!
//! This crate defines the value model, the content tree parsed from
//! declarative documents, namespaces, dotted references and the dependency
//! graph helpers shared by the generator and the CLI.

pub mod content;
pub mod error;
pub mod graph;
pub mod namespace;
pub mod path;
pub mod value;

pub use content::{
    ArrayContent, BoolContent, Categorical, Content, ContentKind, DateTimeContent, DateTimeKind,
    FakerContent, FakerKind, FakerLocale, FormatContent, Labels, NumberContent, NumberRule,
    ObjectContent, OneOfContent, Pattern, RangeStep, SameAsContent, Segment, SeriesContent,
    SeriesVariant, SerializedContent, SlicedContent, StringContent, TruncatedContent, Variant,
    child_path,
};
pub use error::{Error, Result, SchemaError};
pub use graph::{DependencyGraph, DependencyReport, GraphSummary};
pub use namespace::Namespace;
pub use path::FieldRef;
pub use value::{NumberKind, NumberValue, Value};
