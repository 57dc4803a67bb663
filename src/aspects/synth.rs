// Aspect vector synthesis.
//
// The base aspect is the one every document has a vector for; each document's
// vector is its base vector plus whatever other aspect vectors it has. The
// per-aspect inputs are kept alongside the sums, unmodified.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::key::{Aspect, AspectKey, VectorKey};
use crate::error::{CorpusError, Result};

const PREFERRED_BASE: &str = "raw";

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedVectors {
    pub base: Aspect,
    pub dim: usize,
    vectors: BTreeMap<VectorKey, Vec<f64>>,
}

impl CombinedVectors {
    pub fn from_vectors(base: Aspect, dim: usize, vectors: BTreeMap<VectorKey, Vec<f64>>) -> Self {
        Self { base, dim, vectors }
    }

    pub fn get(&self, key: &VectorKey) -> Option<&[f64]> {
        self.vectors.get(key).map(Vec::as_slice)
    }

    pub fn document(&self, doc_id: &str) -> Option<&[f64]> {
        self.get(&VectorKey::Document(doc_id.to_string()))
    }

    /// Synthesized per-document vectors in doc id order.
    pub fn documents(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.vectors.iter().filter_map(|(key, vec)| match key {
            VectorKey::Document(id) => Some((id.as_str(), vec.as_slice())),
            VectorKey::Aspect(_) => None,
        })
    }

    pub fn aspect_vectors(&self) -> impl Iterator<Item = (&AspectKey, &[f64])> {
        self.vectors.iter().filter_map(|(key, vec)| match key {
            VectorKey::Aspect(k) => Some((k, vec.as_slice())),
            VectorKey::Document(_) => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VectorKey, &[f64])> {
        self.vectors.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Pick the base aspect: present for every document, `raw` preferred, then
/// the smallest name.
pub fn base_aspect(tagged: &BTreeMap<AspectKey, Vec<f64>>) -> Result<Aspect> {
    let doc_ids: BTreeSet<&str> = tagged.keys().map(|k| k.doc_id.as_str()).collect();
    let mut coverage: BTreeMap<&Aspect, usize> = BTreeMap::new();
    for key in tagged.keys() {
        *coverage.entry(&key.aspect).or_default() += 1;
    }

    let candidates: Vec<&Aspect> = coverage
        .into_iter()
        .filter(|(_, count)| *count == doc_ids.len())
        .map(|(aspect, _)| aspect)
        .collect();

    candidates
        .iter()
        .find(|a| a.as_str() == PREFERRED_BASE)
        .or_else(|| candidates.first())
        .map(|a| (*a).clone())
        .ok_or(CorpusError::AmbiguousAspect)
}

pub fn combine(tagged: BTreeMap<AspectKey, Vec<f64>>) -> Result<CombinedVectors> {
    let base = base_aspect(&tagged)?;
    let dim = tagged.values().next().map(Vec::len).unwrap_or_default();

    for (key, vec) in &tagged {
        if vec.len() != dim {
            return Err(CorpusError::DimensionMismatch {
                key: key.tag(),
                expected: dim,
                found: vec.len(),
            });
        }
    }

    let others: BTreeSet<&Aspect> = tagged
        .keys()
        .map(|k| &k.aspect)
        .filter(|a| **a != base)
        .collect();

    let mut vectors = BTreeMap::new();
    for (key, base_vec) in tagged.iter().filter(|(k, _)| k.aspect == base) {
        let mut sum = base_vec.clone();
        let mut added = 0;
        for aspect in &others {
            let other = AspectKey::new(key.doc_id.clone(), (*aspect).clone());
            if let Some(vec) = tagged.get(&other) {
                sum.iter_mut().zip(vec).for_each(|(s, v)| *s += v);
                added += 1;
            }
        }
        debug!(doc_id = %key.doc_id, aspects = added + 1, "Synthesized document vector");
        vectors.insert(VectorKey::Document(key.doc_id.clone()), sum);
    }

    let documents = vectors.len();
    let other_aspects = others.len();
    vectors.extend(tagged.into_iter().map(|(k, v)| (VectorKey::Aspect(k), v)));

    info!(
        base = %base,
        other_aspects,
        documents,
        "Combined aspect vectors"
    );
    Ok(CombinedVectors::from_vectors(base, dim, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(doc: &str, aspect: &str) -> AspectKey {
        AspectKey::new(doc, Aspect::new(aspect).unwrap())
    }

    #[test]
    fn test_raw_preferred_as_base() {
        let tagged: BTreeMap<_, _> = [
            (key("a", "loc"), vec![1.0]),
            (key("a", "raw"), vec![1.0]),
            (key("b", "loc"), vec![1.0]),
            (key("b", "raw"), vec![1.0]),
        ]
        .into();
        assert_eq!(base_aspect(&tagged).unwrap().as_str(), "raw");
    }

    #[test]
    fn test_smallest_name_when_no_raw() {
        let tagged: BTreeMap<_, _> = [
            (key("a", "time"), vec![1.0]),
            (key("a", "sty"), vec![1.0]),
            (key("b", "time"), vec![1.0]),
            (key("b", "sty"), vec![1.0]),
        ]
        .into();
        assert_eq!(base_aspect(&tagged).unwrap().as_str(), "sty");
    }

    #[test]
    fn test_no_full_coverage() {
        let tagged: BTreeMap<_, _> = [(key("a", "raw"), vec![1.0]), (key("b", "loc"), vec![1.0])].into();
        assert!(matches!(base_aspect(&tagged), Err(CorpusError::AmbiguousAspect)));
        assert!(matches!(combine(BTreeMap::new()), Err(CorpusError::AmbiguousAspect)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let tagged: BTreeMap<_, _> = [(key("a", "loc"), vec![1.0]), (key("a", "raw"), vec![1.0, 2.0])].into();
        assert!(matches!(combine(tagged), Err(CorpusError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_originals_untouched() {
        let tagged: BTreeMap<_, _> = [(key("a", "raw"), vec![1.0, 2.0]), (key("a", "loc"), vec![3.0, 4.0])].into();
        let combined = combine(tagged).unwrap();
        assert_eq!(combined.document("a"), Some(&[4.0, 6.0][..]));
        assert_eq!(
            combined.get(&VectorKey::Aspect(key("a", "raw"))),
            Some(&[1.0, 2.0][..])
        );
        assert_eq!(combined.len(), 3);
    }
}
