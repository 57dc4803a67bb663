// Corpus: the aggregate that owns every document plus series membership.
//
// The per-document entity index is derived from sentences and memoised. All
// paths that touch sentences (`update_document`, `mark_time_entities`,
// construction) start from an empty cache, so the index can never go stale.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tracing::debug;

use super::document::{Document, Language};
use super::token::{Sentence, Token, DELETED};
use crate::error::{CorpusError, Result};

/// series_id -> ordered member doc_ids
pub type SeriesDict = BTreeMap<String, Vec<String>>;

/// doc_id -> entity type -> tokens carrying that label, in reading order
pub type EntityIndex = BTreeMap<String, BTreeMap<String, Vec<Token>>>;

#[derive(Debug, Clone)]
pub struct Corpus {
    pub name: String,
    pub language: Language,
    documents: BTreeMap<String, Document>,
    series_dict: Option<SeriesDict>,
    pub root_corpus_path: Option<PathBuf>,
    /// Opaque per-document labels carried through the directory format
    pub success_dict: Option<serde_json::Value>,
    entities: OnceLock<EntityIndex>,
}

impl PartialEq for Corpus {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.language == other.language
            && self.documents == other.documents
            && self.series_dict == other.series_dict
    }
}

impl Corpus {
    pub fn new(
        name: impl Into<String>,
        language: Language,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        Self {
            name: name.into(),
            language,
            documents: documents
                .into_iter()
                .map(|d| (d.doc_id.clone(), d))
                .collect(),
            series_dict: None,
            root_corpus_path: None,
            success_dict: None,
            entities: OnceLock::new(),
        }
    }

    /// Attach series membership, checking that every referenced document
    /// exists and that no document sits in two series.
    pub fn with_series(mut self, series_dict: SeriesDict) -> Result<Self> {
        self.set_series(series_dict)?;
        Ok(self)
    }

    pub fn set_series(&mut self, series_dict: SeriesDict) -> Result<()> {
        let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
        for (series_id, doc_ids) in &series_dict {
            for doc_id in doc_ids {
                if !self.documents.contains_key(doc_id) {
                    return Err(CorpusError::UnknownSeriesDocument {
                        series: series_id.clone(),
                        doc_id: doc_id.clone(),
                    });
                }
                if let Some(first) = owner.insert(doc_id, series_id) {
                    if first != series_id {
                        return Err(CorpusError::DuplicateSeriesMembership {
                            doc_id: doc_id.clone(),
                            first: first.to_string(),
                            second: series_id.clone(),
                        });
                    }
                }
            }
        }
        self.series_dict = Some(series_dict);
        Ok(())
    }

    pub fn series_dict(&self) -> Option<&SeriesDict> {
        self.series_dict.as_ref()
    }

    /// Copy the non-document state (series, root path, labels) from another
    /// corpus over the same documents.
    pub(crate) fn inherit_metadata(mut self, source: &Corpus) -> Self {
        self.series_dict = source.series_dict.clone();
        self.root_corpus_path = source.root_corpus_path.clone();
        self.success_dict = source.success_dict.clone();
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document(&self, doc_id: &str) -> Option<&Document> {
        self.documents.get(doc_id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.documents.contains_key(doc_id)
    }

    /// Mutate one document. The entity index is dropped afterwards.
    pub fn update_document<F>(&mut self, doc_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Document),
    {
        match self.documents.get_mut(doc_id) {
            Some(doc) => {
                f(doc);
                self.entities = OnceLock::new();
                true
            }
            None => false,
        }
    }

    pub fn token_count(&self) -> usize {
        self.documents.values().map(Document::token_count).sum()
    }

    /// Union of all document vocabularies, without the sentinel.
    pub fn vocab(&self) -> Result<BTreeSet<String>> {
        let mut vocab = BTreeSet::new();
        for doc in self.documents.values() {
            vocab.extend(doc.vocab()?);
        }
        vocab.remove(DELETED);
        Ok(vocab)
    }

    /// doc_id -> flat token representations in reading order.
    pub fn flat_document_tokens(
        &self,
        lemma: bool,
        lower: bool,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        self.documents
            .iter()
            .map(|(id, doc)| Ok((id.clone(), doc.flat_tokens(lemma, lower)?)))
            .collect()
    }

    /// Entity-labelled tokens per document, built on first access.
    pub fn document_entities(&self) -> &EntityIndex {
        self.entities.get_or_init(|| {
            let index: EntityIndex = self
                .documents
                .iter()
                .map(|(id, doc)| {
                    let mut by_type: BTreeMap<String, Vec<Token>> = BTreeMap::new();
                    for token in doc.tokens() {
                        if let Some(entity) = &token.entity {
                            by_type.entry(entity.clone()).or_default().push(token.clone());
                        }
                    }
                    (id.clone(), by_type)
                })
                .collect();
            debug!(documents = index.len(), "Built document entity index");
            index
        })
    }

    /// The entity index with tokens reduced to strings.
    pub fn entity_representation(
        &self,
        lemma: bool,
        lower: bool,
    ) -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
        self.document_entities()
            .iter()
            .map(|(id, by_type)| {
                let rendered = by_type
                    .iter()
                    .map(|(ent, tokens)| {
                        let words = tokens.iter().map(|t| t.representation(lemma, lower)).collect();
                        (ent.clone(), words)
                    })
                    .collect();
                (id.clone(), rendered)
            })
            .collect()
    }

    /// The series a document belongs to, if any.
    pub fn series_of(&self, doc_id: &str) -> Option<&str> {
        self.series_dict.as_ref()?.iter().find_map(|(series, members)| {
            members
                .iter()
                .any(|m| m == doc_id)
                .then_some(series.as_str())
        })
    }

    /// Other documents sharing this document's author string.
    pub fn same_author(&self, doc_id: &str) -> Vec<&str> {
        let Some(authors) = self.document(doc_id).map(|d| d.authors.as_deref()) else {
            return Vec::new();
        };
        self.documents
            .values()
            .filter(|d| d.doc_id != doc_id && d.authors.as_deref() == authors)
            .map(|d| d.doc_id.as_str())
            .collect()
    }

    /// The first `n` documents in id order.
    pub fn take(&self, n: usize) -> Corpus {
        let docs = self.documents.values().take(n).cloned();
        self.subset(format!("{}_top{}", self.name, n), docs)
    }

    /// A seeded random subset of `n` documents. Returns a copy of the whole
    /// corpus when it holds fewer than `n` documents.
    pub fn sample(&self, n: usize, seed: u64) -> Corpus {
        if self.len() < n {
            return self.clone();
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let all: Vec<&Document> = self.documents.values().collect();
        let docs: Vec<Document> = all
            .choose_multiple(&mut rng, n)
            .map(|d| (*d).clone())
            .collect();
        self.subset(format!("{}_{}_sample", self.name, n), docs)
    }

    /// Drop documents with fewer than `min_sentences` sentences.
    pub fn drop_small_documents(&self, min_sentences: usize) -> Corpus {
        let docs = self
            .documents
            .values()
            .filter(|d| d.sentences().len() >= min_sentences)
            .cloned();
        self.subset(self.name.clone(), docs)
    }

    fn subset(&self, name: String, docs: impl IntoIterator<Item = Document>) -> Corpus {
        let mut corpus = Corpus::new(name, self.language, docs);
        corpus.root_corpus_path = self.root_corpus_path.clone();
        if let Some(series) = &self.series_dict {
            let pruned: SeriesDict = series
                .iter()
                .map(|(id, members)| {
                    let kept: Vec<String> = members
                        .iter()
                        .filter(|m| corpus.contains(m))
                        .cloned()
                        .collect();
                    (id.clone(), kept)
                })
                .filter(|(_, members)| !members.is_empty())
                .collect();
            corpus.series_dict = Some(pruned);
        }
        corpus
    }

    /// Split every document into `parts` consecutive sentence ranges, each
    /// becoming a document `{doc_id}_{i}`; the last part takes the remainder.
    /// The original document id becomes the series id.
    pub fn fake_series(&self, parts: usize) -> Result<Corpus> {
        if parts == 0 {
            return Err(CorpusError::MissingArgument("number of parts"));
        }
        let mut docs = Vec::with_capacity(self.len() * parts);
        let mut series = SeriesDict::new();

        for (doc_id, doc) in &self.documents {
            let sentences = doc.sentences();
            if sentences.len() < parts {
                return Err(CorpusError::TooFewSentences {
                    doc_id: doc_id.clone(),
                    sentences: sentences.len(),
                    parts,
                });
            }
            let chunk = sentences.len() / parts;
            for i in 0..parts {
                let start = i * chunk;
                let end = if i + 1 == parts { sentences.len() } else { (i + 1) * chunk };
                let part_id = format!("{doc_id}_{i}");
                let mut part = doc.with_replaced_sentences(sentences[start..end].to_vec());
                part.doc_id = part_id.clone();
                part.title = doc.title.as_ref().map(|title| format!("{title} {i}"));
                part.reset_text_from_sentences();
                series.entry(doc_id.clone()).or_default().push(part_id);
                docs.push(part);
            }
        }

        let mut corpus = Corpus::new(format!("{}_fake", self.name), self.language, docs);
        corpus.series_dict = Some(series);
        Ok(corpus)
    }

    /// Label every exact occurrence of the given (space separated) time
    /// expressions with the TIME entity type.
    pub fn mark_time_entities(&mut self, updates: &BTreeMap<String, Vec<String>>) {
        for (doc_id, expressions) in updates {
            let Some(doc) = self.documents.get_mut(doc_id) else {
                continue;
            };
            let surface: Vec<&str> = doc.tokens().map(|t| t.text.as_str()).collect();
            let mut hits: HashSet<usize> = HashSet::new();
            let unique: BTreeSet<&String> = expressions.iter().collect();
            for expression in unique {
                let needle: Vec<&str> = expression.split(' ').collect();
                if needle.is_empty() || needle.len() > surface.len() {
                    continue;
                }
                for start in 0..=surface.len() - needle.len() {
                    if surface[start..start + needle.len()] == needle[..] {
                        hits.extend(start..start + needle.len());
                    }
                }
            }
            if hits.is_empty() {
                continue;
            }

            let mut offset = 0;
            let relabelled: Vec<Sentence> = doc
                .sentences()
                .iter()
                .map(|sentence| {
                    let tokens = sentence
                        .tokens
                        .iter()
                        .map(|token| {
                            let mut token = token.clone();
                            if hits.contains(&offset) {
                                token.entity = Some("TIME".to_string());
                            }
                            offset += 1;
                            token
                        })
                        .collect();
                    Sentence::new(tokens)
                })
                .collect();
            doc.set_sentences(relabelled);
        }
        self.entities = OnceLock::new();
    }
}
