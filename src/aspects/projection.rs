// Per-aspect token projections handed to the external vector trainer.
//
// Each built-in aspect reduces a document to the tokens relevant for it; the
// trainer learns one vector per (document, aspect) and the synthesizer sums
// them back into one vector per document.

use std::collections::BTreeMap;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::key::Aspect;
use crate::corpus::Corpus;
use crate::error::{CorpusError, Result};
use crate::filter::TokenFilter;

/// aspect -> doc_id -> tokens in reading order
pub type Projections = BTreeMap<Aspect, BTreeMap<String, Vec<String>>>;

const TIME_ENTITIES: [&str; 3] = ["DATE", "TIME", "EVENT"];
const LOCATION_ENTITIES: [&str; 3] = ["FAC", "GPE", "LOC"];

const RANDOM_ASPECTS: [&str; 5] = ["aspectI", "aspectII", "aspectIII", "aspectIV", "aspectV"];
/// Per-mille chance that a random aspect keeps a token.
const RANDOM_KEEP_PER_MILLE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuiltinAspect {
    /// The whole document
    Raw,
    /// Dates, times and events
    Time,
    /// Facilities, geo-political entities and locations
    Loc,
    /// Atmosphere: adjectives and adverbs
    Atm,
    /// Style: stopwords only
    Sty,
    /// Baseline: a seeded random fifth of the tokens, seeded by the index
    Random(u8),
}

impl BuiltinAspect {
    pub const ALL: [BuiltinAspect; 5] = [
        BuiltinAspect::Raw,
        BuiltinAspect::Time,
        BuiltinAspect::Loc,
        BuiltinAspect::Atm,
        BuiltinAspect::Sty,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinAspect::Raw => "raw",
            BuiltinAspect::Time => "time",
            BuiltinAspect::Loc => "loc",
            BuiltinAspect::Atm => "atm",
            BuiltinAspect::Sty => "sty",
            BuiltinAspect::Random(n) => RANDOM_ASPECTS[usize::from(*n) % RANDOM_ASPECTS.len()],
        }
    }

    /// The random baseline aspects `aspectI` to `aspectV`.
    pub fn random() -> impl Iterator<Item = BuiltinAspect> {
        (0..RANDOM_ASPECTS.len() as u8).map(BuiltinAspect::Random)
    }

    pub fn aspect(&self) -> Aspect {
        Aspect(self.name().to_string())
    }
}

impl FromStr for BuiltinAspect {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self> {
        BuiltinAspect::ALL
            .into_iter()
            .chain(BuiltinAspect::random())
            .find(|a| a.name() == s)
            .ok_or_else(|| CorpusError::InvalidAspect(s.to_string()))
    }
}

/// Aspects trained by a vectorization algorithm name.
///
/// - `book2vec`, `book2vec_simple`, `book2vec_adv` and `book2vec_w2v` train
///   every built-in aspect; `book2vec_wo_<aspect>` and
///   `book2vec_adv_wo_<aspect>` leave one out. The adv aspects `plot` and
///   `cont` are never projected, so leaving them out changes nothing.
/// - `doc2vec` and `avg_wv2doc` train the raw text only.
/// - `random` and `random_aspect2vec` train raw plus five random aspects.
/// - `book2vec`, `book2vec_simple`, `doc2vec` and `avg_wv2doc` also accept an
///   `_untrained` suffix, which only concerns the external trainer.
pub fn aspects_for_algorithm(algorithm: &str) -> Result<Vec<BuiltinAspect>> {
    let name = algorithm.trim().to_lowercase();
    let unknown = || CorpusError::UnknownAlgorithm(algorithm.to_string());

    let trained = name.strip_suffix("_untrained").unwrap_or(name.as_str());
    match trained {
        "book2vec" | "book2vec_simple" => return Ok(BuiltinAspect::ALL.to_vec()),
        "doc2vec" | "avg_wv2doc" => return Ok(vec![BuiltinAspect::Raw]),
        _ if trained != name => return Err(unknown()),
        _ => {}
    }

    match name.as_str() {
        "book2vec_adv" | "book2vec_w2v" | "book2vec_adv_wo_plot" | "book2vec_adv_wo_cont" => {
            Ok(BuiltinAspect::ALL.to_vec())
        }
        "random" | "random_aspect2vec" => Ok(std::iter::once(BuiltinAspect::Raw)
            .chain(BuiltinAspect::random())
            .collect()),
        _ => {
            let disabled = name
                .strip_prefix("book2vec_adv_wo_")
                .or_else(|| name.strip_prefix("book2vec_wo_"))
                .and_then(|aspect| aspect.parse::<BuiltinAspect>().ok())
                .filter(|aspect| BuiltinAspect::ALL.contains(aspect))
                .ok_or_else(unknown)?;
            Ok(BuiltinAspect::ALL
                .into_iter()
                .filter(|a| *a != disabled)
                .collect())
        }
    }
}

/// Build the token projections of the enabled aspects.
pub fn project(corpus: &Corpus, aspects: &[BuiltinAspect]) -> Result<Projections> {
    let mut projections = Projections::new();
    let entities = corpus.entity_representation(false, false);

    for aspect in aspects {
        let per_doc: BTreeMap<String, Vec<String>> = match aspect {
            BuiltinAspect::Raw => corpus.flat_document_tokens(false, false)?,
            BuiltinAspect::Time | BuiltinAspect::Loc => {
                let labels: &[&str] = if *aspect == BuiltinAspect::Time {
                    &TIME_ENTITIES
                } else {
                    &LOCATION_ENTITIES
                };
                corpus
                    .doc_ids()
                    .map(|id| {
                        let words = entities
                            .get(id)
                            .map(|by_type| {
                                labels
                                    .iter()
                                    .filter_map(|l| by_type.get(*l))
                                    .flatten()
                                    .cloned()
                                    .collect()
                            })
                            .unwrap_or_default();
                        (id.to_string(), words)
                    })
                    .collect()
            }
            BuiltinAspect::Atm => {
                let keep = TokenFilter::default().pos(&["ADJ", "ADV"]).reverted();
                kept_tokens(corpus, &keep)
            }
            BuiltinAspect::Sty => {
                let keep = TokenFilter::default().stopwords().reverted();
                kept_tokens(corpus, &keep)
            }
            BuiltinAspect::Random(n) => random_tokens(corpus, u64::from(*n)),
        };
        projections.insert(aspect.aspect(), per_doc);
    }

    for (doc_id, counts) in aspect_counts(&projections) {
        info!(doc_id = %doc_id, counts = ?counts, "Aspect token counts");
    }
    Ok(projections)
}

fn kept_tokens(corpus: &Corpus, keep: &TokenFilter) -> BTreeMap<String, Vec<String>> {
    corpus
        .documents()
        .map(|doc| {
            let words = doc
                .tokens()
                .filter(|t| keep.keeps(t))
                .map(|t| t.text.clone())
                .collect();
            (doc.doc_id.clone(), words)
        })
        .collect()
}

/// Keep each token with a fixed chance; the same seed keeps the same tokens.
fn random_tokens(corpus: &Corpus, seed: u64) -> BTreeMap<String, Vec<String>> {
    let mut rng = StdRng::seed_from_u64(seed);
    corpus
        .documents()
        .map(|doc| {
            let words = doc
                .tokens()
                .filter(|_| rng.random_range(1..=1000) <= RANDOM_KEEP_PER_MILLE)
                .map(|t| t.text.clone())
                .collect();
            (doc.doc_id.clone(), words)
        })
        .collect()
}

/// doc_id -> aspect name -> number of projected tokens.
pub fn aspect_counts(projections: &Projections) -> BTreeMap<String, BTreeMap<String, usize>> {
    let mut counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for (aspect, per_doc) in projections {
        for (doc_id, tokens) in per_doc {
            counts
                .entry(doc_id.clone())
                .or_default()
                .insert(aspect.to_string(), tokens.len());
        }
    }
    counts
}
