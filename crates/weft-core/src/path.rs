use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// A dotted reference to a node of a namespace: `collection.field.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    collection: String,
    fields: Vec<String>,
}

impl FieldRef {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: Vec::new(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn child(&self, field: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.fields.push(field.into());
        next
    }

    pub fn parent(&self) -> Option<Self> {
        let mut parent = self.clone();
        parent.fields.pop()?;
        Some(parent)
    }

    pub fn last(&self) -> &str {
        self.fields.last().unwrap_or(&self.collection)
    }
}

impl FromStr for FieldRef {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut segments = value.split('.');
        let collection = segments.next().unwrap_or_default();
        if collection.is_empty() {
            return Err(SchemaError::invalid(value, "reference has an empty collection name"));
        }
        let mut fields = Vec::new();
        for segment in segments {
            if segment.is_empty() {
                return Err(SchemaError::invalid(value, "reference has an empty segment"));
            }
            fields.push(segment.to_string());
        }
        Ok(Self {
            collection: collection.to_string(),
            fields,
        })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection)?;
        for field in &self.fields {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_dotted_paths() {
        let path: FieldRef = "users.content.user_id".parse().expect("valid path");
        assert_eq!(path.collection(), "users");
        assert_eq!(path.fields(), ["content", "user_id"]);
        assert_eq!(path.to_string(), "users.content.user_id");
        assert_eq!(path.last(), "user_id");
        assert_eq!(
            path.parent().map(|p| p.to_string()).as_deref(),
            Some("users.content")
        );
    }

    #[test]
    fn rejects_empty_segments() {
        assert!("users..id".parse::<FieldRef>().is_err());
        assert!(".id".parse::<FieldRef>().is_err());
        assert!("".parse::<FieldRef>().is_err());
    }
}
