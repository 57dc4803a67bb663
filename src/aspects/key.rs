// Structured keys for aspect and document vectors.
//
// On disk a vector row is tagged `<doc_id>_<aspect>`. Aspect names never
// contain `_`, so the tag splits at its last underscore even when the doc id
// itself has underscores (fake-series parts like `book_0`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CorpusError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Aspect(pub(super) String);

impl Aspect {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains('_') || name.chars().any(char::is_whitespace) {
            return Err(CorpusError::InvalidAspect(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Aspect {
    type Error = CorpusError;

    fn try_from(value: String) -> Result<Self> {
        Aspect::new(value)
    }
}

impl From<Aspect> for String {
    fn from(aspect: Aspect) -> Self {
        aspect.0
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AspectKey {
    pub doc_id: String,
    pub aspect: Aspect,
}

impl AspectKey {
    pub fn new(doc_id: impl Into<String>, aspect: Aspect) -> Self {
        Self {
            doc_id: doc_id.into(),
            aspect,
        }
    }

    /// Split a `<doc_id>_<aspect>` tag at its last underscore.
    pub fn parse_tag(tag: &str) -> Result<Self> {
        let (doc_id, aspect) = tag
            .rsplit_once('_')
            .ok_or_else(|| CorpusError::InvalidAspect(tag.to_string()))?;
        if doc_id.is_empty() {
            return Err(CorpusError::InvalidAspect(tag.to_string()));
        }
        Ok(Self::new(doc_id, Aspect::new(aspect)?))
    }

    pub fn tag(&self) -> String {
        format!("{}_{}", self.doc_id, self.aspect)
    }
}

impl fmt::Display for AspectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.doc_id, self.aspect)
    }
}

/// Key of a row in a combined vector store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VectorKey {
    /// Synthesized per-document vector
    Document(String),
    /// Original per-aspect vector
    Aspect(AspectKey),
}

impl VectorKey {
    pub fn doc_id(&self) -> &str {
        match self {
            VectorKey::Document(id) => id,
            VectorKey::Aspect(key) => &key.doc_id,
        }
    }

    pub fn tag(&self) -> String {
        match self {
            VectorKey::Document(id) => id.clone(),
            VectorKey::Aspect(key) => key.tag(),
        }
    }
}

impl fmt::Display for VectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}
