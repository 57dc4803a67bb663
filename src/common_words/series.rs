// Series-level common words.
//
// Relaxed: a word is common when at least two members of the series share it.
// Strict: a word is common only when every member has it. Each member document
// gets its series' set.

use std::collections::{BTreeMap, BTreeSet};

use crate::corpus::{SeriesDict, DELETED};
use crate::error::{CorpusError, Result};

/// Per-series combination rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRule {
    Relaxed,
    Strict,
}

pub fn relaxed(
    series: &SeriesDict,
    docs: &BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    per_series(series, docs, SeriesRule::Relaxed)
}

pub fn strict(
    series: &SeriesDict,
    docs: &BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    per_series(series, docs, SeriesRule::Strict)
}

pub(crate) fn per_series(
    series: &SeriesDict,
    docs: &BTreeMap<String, Vec<String>>,
    rule: SeriesRule,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let mut result = BTreeMap::new();

    for (series_id, members) in series {
        let mut vocabs: Vec<BTreeSet<&str>> = Vec::with_capacity(members.len());
        for doc_id in members {
            let tokens = docs.get(doc_id).ok_or_else(|| CorpusError::UnknownSeriesDocument {
                series: series_id.clone(),
                doc_id: doc_id.clone(),
            })?;
            vocabs.push(
                tokens
                    .iter()
                    .map(String::as_str)
                    .filter(|t| *t != DELETED)
                    .collect(),
            );
        }

        let common = if vocabs.len() < 2 {
            BTreeSet::new()
        } else {
            match rule {
                SeriesRule::Relaxed => pairwise_union(&vocabs),
                SeriesRule::Strict => intersect_all(&vocabs),
            }
        };

        for doc_id in members {
            result.insert(doc_id.clone(), common.clone());
        }
    }

    Ok(result)
}

fn pairwise_union(vocabs: &[BTreeSet<&str>]) -> BTreeSet<String> {
    let mut common = BTreeSet::new();
    for (i, a) in vocabs.iter().enumerate() {
        for b in &vocabs[i + 1..] {
            common.extend(a.intersection(b).map(|w| w.to_string()));
        }
    }
    common
}

fn intersect_all(vocabs: &[BTreeSet<&str>]) -> BTreeSet<String> {
    let Some((first, rest)) = vocabs.split_first() else {
        return BTreeSet::new();
    };
    first
        .iter()
        .filter(|w| rest.iter().all(|v| v.contains(*w)))
        .map(|w| w.to_string())
        .collect()
}
