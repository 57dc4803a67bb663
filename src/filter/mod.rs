// Filtering & masking engine.
//
// Every entry point is pure: the source corpus is left untouched and a new
// corpus is returned with the same name, language, series and labels. Removed
// tokens either disappear (an emptied sentence keeps one sentinel token) or,
// with masking, keep their slot with text and lemma set to the sentinel.

pub mod mode;

use tracing::{debug, info};

use crate::common_words::{
    general_words_sensitive, global_doc_frequency, relaxed, strict, CommonWords,
    CommonWordsParams, SeriesRule,
};
use crate::corpus::{Corpus, Sentence, Token};
use crate::error::{CorpusError, Result};

pub use mode::{FilterMode, TokenFilter};

/// Filter with the default common-word thresholds.
pub fn filter(
    corpus: &Corpus,
    mode: FilterMode,
    masking: bool,
    common_words: Option<&CommonWords>,
) -> Result<Corpus> {
    filter_with(corpus, mode, masking, common_words, &CommonWordsParams::default())
}

pub fn filter_with(
    corpus: &Corpus,
    mode: FilterMode,
    masking: bool,
    common_words: Option<&CommonWords>,
    params: &CommonWordsParams,
) -> Result<Corpus> {
    if let Some(token_filter) = mode.token_filter() {
        let filtered = apply_token_filter(corpus, &token_filter, masking);
        log_outcome(corpus, &filtered, mode, masking);
        return Ok(filtered);
    }

    let filtered = match mode {
        FilterMode::NoFilter => corpus.clone(),
        FilterMode::CommonWords => {
            let words = common_words.ok_or(CorpusError::MissingArgument("common_words"))?;
            apply_common_words(corpus, words, masking)
        }
        computed => {
            let words = compute_common_words(corpus, computed, params)?;
            apply_common_words(corpus, &words, masking)
        }
    };
    log_outcome(corpus, &filtered, mode, masking);
    Ok(filtered)
}

/// Derive the exclusion vocabulary of a computed common-word mode.
pub fn compute_common_words(
    corpus: &Corpus,
    mode: FilterMode,
    params: &CommonWordsParams,
) -> Result<CommonWords> {
    let docs = corpus.flat_document_tokens(false, false)?;
    if mode == FilterMode::CommonWordsDocFreq {
        return Ok(CommonWords::Global(global_doc_frequency(&docs, params.global)));
    }

    let series = corpus
        .series_dict()
        .ok_or(CorpusError::MissingArgument("series_dict"))?;
    let per_doc = match mode {
        FilterMode::CommonWordsRelaxed => relaxed(series, &docs)?,
        FilterMode::CommonWordsStrict => strict(series, &docs)?,
        FilterMode::CommonWordsRelaxedGeneral => {
            general_words_sensitive(series, &docs, SeriesRule::Relaxed, params.general_words_share)?
        }
        FilterMode::CommonWordsStrictGeneral => {
            general_words_sensitive(series, &docs, SeriesRule::Strict, params.general_words_share)?
        }
        other => return Err(CorpusError::InvalidMode(other.to_string())),
    };
    Ok(CommonWords::PerDocument(per_doc))
}

pub fn apply_token_filter(corpus: &Corpus, token_filter: &TokenFilter, masking: bool) -> Corpus {
    rebuild(corpus, masking, |_, token| token_filter.keeps(token))
}

pub fn apply_common_words(corpus: &Corpus, common_words: &CommonWords, masking: bool) -> Corpus {
    rebuild(corpus, masking, |doc_id, token| {
        !common_words.contains(doc_id, &token.text)
    })
}

fn rebuild<F>(corpus: &Corpus, masking: bool, keep: F) -> Corpus
where
    F: Fn(&str, &Token) -> bool,
{
    let documents = corpus.documents().map(|doc| {
        let sentences = doc
            .sentences()
            .iter()
            .map(|sentence| {
                if masking {
                    Sentence::new(
                        sentence
                            .tokens
                            .iter()
                            .map(|t| if keep(&doc.doc_id, t) { t.clone() } else { t.masked() })
                            .collect(),
                    )
                } else {
                    Sentence::new(
                        sentence
                            .tokens
                            .iter()
                            .filter(|t| keep(&doc.doc_id, *t))
                            .cloned()
                            .collect(),
                    )
                    .ensure_non_empty()
                }
            })
            .collect();
        doc.with_replaced_sentences(sentences)
    });

    Corpus::new(corpus.name.clone(), corpus.language, documents).inherit_metadata(corpus)
}

fn log_outcome(before: &Corpus, after: &Corpus, mode: FilterMode, masking: bool) {
    let kept = after
        .documents()
        .flat_map(|d| d.tokens())
        .filter(|t| !t.is_deleted())
        .count();
    info!(
        corpus = %before.name,
        mode = %mode,
        masking,
        tokens_before = before.token_count(),
        tokens_kept = kept,
        "Filtered corpus"
    );
    debug!(documents = after.len(), "Filter output");
}
