// Retrieval evaluation over synthesized document vectors.
//
// A document's nearest neighbours should be the other parts of its series
// (hard score) or at least books by the same author (soft score).

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aspects::CombinedVectors;
use crate::common_words::mean_std;
use crate::corpus::Corpus;
use crate::error::{CorpusError, Result};

/// Cosine similarity in [-1, 1]. Zero vectors and mismatched lengths give 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// The `topn` synthesized documents closest to `doc_id`, best first.
pub fn most_similar(store: &CombinedVectors, doc_id: &str, topn: usize) -> Result<Vec<(String, f64)>> {
    let query = store
        .document(doc_id)
        .ok_or_else(|| CorpusError::UnknownDocument(doc_id.to_string()))?;

    let mut ranked: Vec<(String, f64)> = store
        .documents()
        .filter(|(id, _)| *id != doc_id)
        .map(|(id, vec)| (id.to_string(), cosine_similarity(query, vec)))
        .collect();
    // ties broken by id for stable output
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(topn);
    Ok(ranked)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionReport {
    pub topn: usize,
    pub seed: u64,
    pub series_sampled: usize,
    pub documents_evaluated: usize,
    pub hard_mean: f64,
    pub hard_std: f64,
    pub soft_mean: f64,
    pub soft_std: f64,
    /// Per-document (hard, soft) scores
    pub per_document: Vec<(String, f64, f64)>,
    pub evaluated_at: DateTime<Utc>,
}

/// Sample `sample_size` whole series and score each member's neighbourhood.
pub fn series_precision(
    store: &CombinedVectors,
    corpus: &Corpus,
    sample_size: usize,
    topn: usize,
    seed: u64,
) -> Result<PrecisionReport> {
    let series = corpus
        .series_dict()
        .ok_or(CorpusError::MissingArgument("series_dict"))?;

    let ids: Vec<&String> = series.keys().collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let sampled: Vec<&String> = ids
        .choose_multiple(&mut rng, sample_size.min(ids.len()))
        .copied()
        .collect();

    let mut per_document = Vec::new();
    for series_id in &sampled {
        for doc_id in &series[series_id.as_str()] {
            if store.document(doc_id).is_none() {
                debug!(doc_id = %doc_id, "No synthesized vector, skipping");
                continue;
            }
            let neighbours = most_similar(store, doc_id, topn)?;
            if neighbours.is_empty() {
                continue;
            }
            let authors = corpus.document(doc_id).and_then(|d| d.authors.as_deref());
            let mut hard = 0usize;
            let mut soft = 0usize;
            for (other, _) in &neighbours {
                if corpus.series_of(other) == Some(series_id.as_str()) {
                    hard += 1;
                }
                if corpus.document(other).and_then(|d| d.authors.as_deref()) == authors {
                    soft += 1;
                }
            }
            let n = neighbours.len() as f64;
            per_document.push((doc_id.clone(), hard as f64 / n, soft as f64 / n));
        }
    }

    let hard: Vec<f64> = per_document.iter().map(|(_, h, _)| *h).collect();
    let soft: Vec<f64> = per_document.iter().map(|(_, _, s)| *s).collect();
    let (hard_mean, hard_std) = mean_std(&hard);
    let (soft_mean, soft_std) = mean_std(&soft);

    info!(
        series = sampled.len(),
        documents = per_document.len(),
        hard_mean,
        soft_mean,
        "Series retrieval precision"
    );

    Ok(PrecisionReport {
        topn,
        seed,
        series_sampled: sampled.len(),
        documents_evaluated: per_document.len(),
        hard_mean,
        hard_std,
        soft_mean,
        soft_std,
        per_document,
        evaluated_at: Utc::now(),
    })
}
