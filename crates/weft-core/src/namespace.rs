use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value as Json;
use tracing::debug;

use crate::content::Content;
use crate::error::{Error, Result, SchemaError};

/// Named collections of content, keyed by collection name.
///
/// A namespace is immutable once built; reloading means building a new one.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    collections: BTreeMap<String, Content>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection. Roots must be arrays or objects.
    pub fn insert(&mut self, name: &str, content: Content) -> std::result::Result<(), SchemaError> {
        if name.is_empty() || name.contains('.') {
            return Err(SchemaError::invalid(name, "invalid collection name"));
        }
        if !content.is_collection_root() {
            return Err(SchemaError::invalid(
                name,
                format!(
                    "collection root must be an array or an object, got {}",
                    content.type_name()
                ),
            ));
        }
        if self.collections.contains_key(name) {
            return Err(SchemaError::invalid(name, "duplicate collection"));
        }
        self.collections.insert(name.to_string(), content);
        Ok(())
    }

    /// Builds a namespace from `(collection, document)` pairs.
    pub fn from_documents<I, S>(documents: I) -> std::result::Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, Json)>,
        S: AsRef<str>,
    {
        let mut namespace = Self::new();
        for (name, document) in documents {
            let name = name.as_ref();
            let content = Content::parse(&document, name)?;
            namespace.insert(name, content)?;
        }
        Ok(namespace)
    }

    /// Loads every `*.json` file of `dir`; the file stem is the collection name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let io_error = |source| Error::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut namespace = Self::new();
        for path in paths {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
            let text = std::fs::read_to_string(&path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            let document: Json = serde_json::from_str(&text).map_err(|source| Error::Json {
                collection: name.clone(),
                source,
            })?;
            let content = Content::parse(&document, &name)?;
            namespace.insert(&name, content)?;
            debug!(collection = %name, path = %path.display(), "collection loaded");
        }
        Ok(namespace)
    }

    pub fn get(&self, name: &str) -> Option<&Content> {
        self.collections.get(name)
    }

    pub fn collections(&self) -> impl Iterator<Item = (&str, &Content)> {
        self.collections
            .iter()
            .map(|(name, content)| (name.as_str(), content))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rejects_scalar_roots() {
        let result = Namespace::from_documents([("users", json!({"type": "number", "constant": 1}))]);
        assert!(matches!(result, Err(SchemaError::Invalid { path, .. }) if path == "users"));
    }

    #[test]
    fn keeps_collections_sorted_by_name() {
        let namespace = Namespace::from_documents([
            ("orders", json!({"type": "object"})),
            ("users", json!({"type": "object"})),
            ("accounts", json!({"type": "object"})),
        ])
        .expect("namespace");
        let names: Vec<&str> = namespace.names().collect();
        assert_eq!(names, ["accounts", "orders", "users"]);
    }
}
