// Global document-frequency exclusion and the vocabulary-size report used to
// pick a threshold.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, DELETED};
use crate::error::Result;

/// Document-frequency cut-off. Zero disables the filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Fraction of all documents, 0.0..=1.0
    Share(f64),
    /// Number of documents
    Absolute(usize),
}

impl Threshold {
    fn is_disabled(&self) -> bool {
        match *self {
            Threshold::Share(share) => share <= 0.0,
            Threshold::Absolute(count) => count == 0,
        }
    }

    /// Inclusive comparison against a word's document frequency.
    fn reached(&self, doc_freq: usize, documents: usize) -> bool {
        match *self {
            Threshold::Share(share) => doc_freq as f64 / documents as f64 >= share,
            Threshold::Absolute(count) => doc_freq >= count,
        }
    }
}

/// Words whose document frequency reaches the threshold.
pub fn global_doc_frequency(
    docs: &BTreeMap<String, Vec<String>>,
    threshold: Threshold,
) -> BTreeSet<String> {
    if threshold.is_disabled() || docs.is_empty() {
        return BTreeSet::new();
    }

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for tokens in docs.values() {
        let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for word in distinct {
            *doc_freq.entry(word).or_default() += 1;
        }
    }

    doc_freq
        .into_iter()
        .filter(|(word, df)| *word != DELETED && threshold.reached(*df, docs.len()))
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Vocabulary size and length of one document after the exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSize {
    pub vocab_size: usize,
    pub document_length: usize,
}

/// Vocabulary and length statistics of a corpus after removing the global
/// common words at one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabReport {
    pub threshold: Threshold,
    pub excluded_words: usize,
    pub global_vocab_size: usize,
    pub avg_vocab_size: f64,
    pub std_vocab_size: f64,
    pub avg_document_length: f64,
    pub std_document_length: f64,
    pub document_sizes: BTreeMap<String, DocumentSize>,
}

pub fn vocab_report(corpus: &Corpus, threshold: Threshold) -> Result<VocabReport> {
    let docs = corpus.flat_document_tokens(false, false)?;
    let excluded = global_doc_frequency(&docs, threshold);

    let mut global: BTreeSet<&str> = BTreeSet::new();
    let mut vocab_sizes = Vec::with_capacity(docs.len());
    let mut lengths = Vec::with_capacity(docs.len());
    let mut document_sizes = BTreeMap::new();
    for (doc_id, tokens) in &docs {
        let kept: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| *t != DELETED && !excluded.contains(*t))
            .collect();
        let vocab: BTreeSet<&str> = kept.iter().copied().collect();
        vocab_sizes.push(vocab.len() as f64);
        lengths.push(kept.len() as f64);
        document_sizes.insert(
            doc_id.clone(),
            DocumentSize {
                vocab_size: vocab.len(),
                document_length: kept.len(),
            },
        );
        global.extend(vocab);
    }

    let (avg_vocab_size, std_vocab_size) = mean_std(&vocab_sizes);
    let (avg_document_length, std_document_length) = mean_std(&lengths);
    Ok(VocabReport {
        threshold,
        excluded_words: excluded.len(),
        global_vocab_size: global.len(),
        avg_vocab_size,
        std_vocab_size,
        avg_document_length,
        std_document_length,
        document_sizes,
    })
}

/// Population mean and standard deviation; (0, 0) for no values.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
        raw.iter()
            .map(|(id, text)| {
                (id.to_string(), text.split(' ').map(String::from).collect())
            })
            .collect()
    }

    #[test]
    fn test_share_is_inclusive() {
        let d = docs(&[("a", "x y"), ("b", "x"), ("c", "z"), ("d", "w")]);
        // x is in 2 of 4 documents: exactly 0.5
        let words = global_doc_frequency(&d, Threshold::Share(0.5));
        assert_eq!(words, BTreeSet::from(["x".to_string()]));
    }

    #[test]
    fn test_zero_disables() {
        let d = docs(&[("a", "x"), ("b", "x")]);
        assert!(global_doc_frequency(&d, Threshold::Share(0.0)).is_empty());
        assert!(global_doc_frequency(&d, Threshold::Absolute(0)).is_empty());
    }

    #[test]
    fn test_absolute_and_sentinel() {
        let d = docs(&[("a", "x del"), ("b", "x del"), ("c", "y")]);
        let words = global_doc_frequency(&d, Threshold::Absolute(2));
        assert_eq!(words, BTreeSet::from(["x".to_string()]));
    }

    #[test]
    fn test_duplicates_count_once_per_document() {
        let d = docs(&[("a", "x x x"), ("b", "y")]);
        assert!(global_doc_frequency(&d, Threshold::Absolute(2)).is_empty());
    }

    #[test]
    fn test_mean_std() {
        let (m, s) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((m - 5.0).abs() < 1e-10, "mean {m}");
        assert!((s - 2.0).abs() < 1e-10, "std {s}");
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }
}
