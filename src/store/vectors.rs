// Word2vec-style text vector tables.
//
//   <count> <dim>
//   <word> <f64> ...
//   *dt_<doc_id> <f64> ...            synthesized document vector
//   *dt_<doc_id>_<aspect> <f64> ...   per-aspect vector
//
// Document tags are resolved against the known doc ids of the corpus, so an
// id that itself contains underscores is never mistaken for an aspect suffix.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use super::{read_to_string, write_atomic};
use crate::aspects::{base_aspect, Aspect, AspectKey, CombinedVectors, VectorKey};
use crate::error::{CorpusError, Result};

pub const DOC_PREFIX: &str = "*dt_";

/// Raw rows of a vector file before tags are resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorFile {
    pub dim: usize,
    pub words: BTreeMap<String, Vec<f64>>,
    /// Document tags with the prefix stripped, in file order
    pub documents: Vec<(String, Vec<f64>)>,
}

impl VectorFile {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let err = |line: usize, message: String| CorpusError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut lines = content.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        let (_, header) = lines.next().ok_or_else(|| err(1, "empty vector file".into()))?;
        let mut head = header.split_whitespace().map(str::parse::<usize>);
        let (Some(Ok(count)), Some(Ok(dim)), None) = (head.next(), head.next(), head.next()) else {
            return Err(err(1, format!("invalid header {header:?}")));
        };

        let mut file = VectorFile {
            dim,
            ..Default::default()
        };
        let mut rows = 0;
        for (i, line) in lines {
            let mut fields = line.split_whitespace();
            let Some(label) = fields.next() else { continue };
            let values = fields
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|e| err(i + 1, format!("invalid number: {e}")))?;
            if values.len() != dim {
                return Err(CorpusError::DimensionMismatch {
                    key: label.to_string(),
                    expected: dim,
                    found: values.len(),
                });
            }
            match label.strip_prefix(DOC_PREFIX) {
                Some(tag) => file.documents.push((tag.to_string(), values)),
                None => {
                    file.words.insert(label.to_string(), values);
                }
            }
            rows += 1;
        }

        if rows != count {
            return Err(err(1, format!("header announces {count} rows, found {rows}")));
        }
        Ok(file)
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::parse(&read_to_string(path)?, path)
    }
}

/// Resolve a document tag to a plain document or a (document, aspect) pair.
pub fn resolve_tag(tag: &str, known: &BTreeSet<String>) -> Result<VectorKey> {
    if known.contains(tag) {
        return Ok(VectorKey::Document(tag.to_string()));
    }
    let key = AspectKey::parse_tag(tag)?;
    if !known.contains(&key.doc_id) {
        return Err(CorpusError::InvalidAspect(tag.to_string()));
    }
    Ok(VectorKey::Aspect(key))
}

/// Per-aspect vectors as emitted by the trainer.
pub fn read_aspect_vectors(
    path: &Path,
    known: &BTreeSet<String>,
) -> Result<BTreeMap<AspectKey, Vec<f64>>> {
    let file = VectorFile::read(path)?;
    let mut tagged = BTreeMap::new();
    for (tag, values) in file.documents {
        match resolve_tag(&tag, known)? {
            VectorKey::Aspect(key) => {
                tagged.insert(key, values);
            }
            VectorKey::Document(id) => return Err(CorpusError::InvalidAspect(id)),
        }
    }
    info!(path = %path.display(), vectors = tagged.len(), "Read aspect vectors");
    Ok(tagged)
}

pub fn write_aspect_vectors(path: &Path, tagged: &BTreeMap<AspectKey, Vec<f64>>) -> Result<()> {
    let dim = tagged.values().next().map(Vec::len).unwrap_or_default();
    let rows = tagged.iter().map(|(k, v)| (k.tag(), v.as_slice()));
    write_atomic(path, render(dim, tagged.len(), rows).as_bytes())
}

pub fn write_combined(path: &Path, combined: &CombinedVectors) -> Result<()> {
    let rows = combined.iter().map(|(k, v)| (k.tag(), v));
    write_atomic(path, render(combined.dim, combined.len(), rows).as_bytes())?;
    info!(path = %path.display(), vectors = combined.len(), "Wrote vector store");
    Ok(())
}

pub fn read_combined(path: &Path, known: &BTreeSet<String>) -> Result<CombinedVectors> {
    let file = VectorFile::read(path)?;
    let mut vectors = BTreeMap::new();
    let mut aspects = BTreeMap::new();
    for (tag, values) in file.documents {
        let key = resolve_tag(&tag, known)?;
        if let VectorKey::Aspect(k) = &key {
            aspects.insert(k.clone(), values.clone());
        }
        vectors.insert(key, values);
    }
    let base = match base_aspect(&aspects) {
        Ok(base) => base,
        Err(_) => Aspect::new("raw")?,
    };
    Ok(CombinedVectors::from_vectors(base, file.dim, vectors))
}

fn render<'a>(dim: usize, count: usize, rows: impl Iterator<Item = (String, &'a [f64])>) -> String {
    let mut out = format!("{count} {dim}\n");
    for (tag, values) in rows {
        out.push_str(DOC_PREFIX);
        out.push_str(&tag);
        for v in values {
            let _ = write!(out, " {v}");
        }
        out.push('\n');
    }
    out
}
