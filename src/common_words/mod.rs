// Common-word exclusion vocabularies.
//
// Either one global set (document frequency over the whole corpus) or one set
// per document (derived from the document's series). The filter engine only
// asks `for_document`.

pub mod frequency;
pub mod series;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::corpus::SeriesDict;
use crate::error::Result;

pub use frequency::{
    global_doc_frequency, mean_std, vocab_report, DocumentSize, Threshold, VocabReport,
};
pub use series::{relaxed, strict, SeriesRule};

/// Share used to find "general" words when none is configured.
pub const DEFAULT_GENERAL_WORDS_SHARE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommonWords {
    Global(BTreeSet<String>),
    PerDocument(BTreeMap<String, BTreeSet<String>>),
}

impl CommonWords {
    /// Exclusion set for one document; None for documents outside every series.
    pub fn for_document(&self, doc_id: &str) -> Option<&BTreeSet<String>> {
        match self {
            CommonWords::Global(words) => Some(words),
            CommonWords::PerDocument(map) => map.get(doc_id),
        }
    }

    pub fn contains(&self, doc_id: &str, word: &str) -> bool {
        self.for_document(doc_id).is_some_and(|w| w.contains(word))
    }

    /// Total number of distinct excluded words.
    pub fn distinct_words(&self) -> usize {
        match self {
            CommonWords::Global(words) => words.len(),
            CommonWords::PerDocument(map) => {
                map.values().flatten().collect::<BTreeSet<_>>().len()
            }
        }
    }
}

/// Thresholds for the computed common-word modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommonWordsParams {
    /// Cut-off for `common_words_doc_freq`
    pub global: Threshold,
    /// Share above which a word counts as general vocabulary and is spared
    /// by the general-words-sensitive series modes
    pub general_words_share: f64,
}

impl Default for CommonWordsParams {
    fn default() -> Self {
        Self {
            global: Threshold::Share(0.25),
            general_words_share: DEFAULT_GENERAL_WORDS_SHARE,
        }
    }
}

/// Series common words minus the corpus-wide general words.
pub fn general_words_sensitive(
    series: &SeriesDict,
    docs: &BTreeMap<String, Vec<String>>,
    rule: SeriesRule,
    general_words_share: f64,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let general = global_doc_frequency(docs, Threshold::Share(general_words_share));
    let mut per_doc = series::per_series(series, docs, rule)?;
    for words in per_doc.values_mut() {
        words.retain(|w| !general.contains(w));
    }
    Ok(per_doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> BTreeMap<String, Vec<String>> {
        [("a", "the ship sails"), ("b", "the ship sinks"), ("c", "the dog")]
            .iter()
            .map(|(id, text)| (id.to_string(), text.split(' ').map(String::from).collect()))
            .collect()
    }

    #[test]
    fn test_general_words_removed() {
        let series: SeriesDict = [("s".to_string(), vec!["a".to_string(), "b".to_string()])].into();
        // "the" is in every document, "ship" in two of three
        let cw = general_words_sensitive(&series, &docs(), SeriesRule::Relaxed, 0.9).unwrap();
        assert_eq!(cw["a"], BTreeSet::from(["ship".to_string()]));
    }

    #[test]
    fn test_for_document() {
        let per_doc = CommonWords::PerDocument(
            [("a".to_string(), BTreeSet::from(["x".to_string()]))].into(),
        );
        assert!(per_doc.contains("a", "x"));
        assert!(!per_doc.contains("b", "x"));
        assert!(per_doc.for_document("b").is_none());

        let global = CommonWords::Global(BTreeSet::from(["y".to_string()]));
        assert!(global.contains("anything", "y"));
        assert_eq!(global.distinct_words(), 1);
    }
}
