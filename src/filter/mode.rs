// Filter modes and the token predicate behind the POS / flag based ones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::corpus::Token;
use crate::error::CorpusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterMode {
    NoFilter,
    NamedEntities,
    Nouns,
    Verbs,
    Adjectives,
    Avn,
    Stopwords,
    Punctuation,
    /// Exclusion sets supplied by the caller
    CommonWords,
    CommonWordsRelaxed,
    CommonWordsStrict,
    CommonWordsRelaxedGeneral,
    CommonWordsStrictGeneral,
    CommonWordsDocFreq,
}

impl FilterMode {
    pub const ALL: [FilterMode; 14] = [
        FilterMode::NoFilter,
        FilterMode::NamedEntities,
        FilterMode::Nouns,
        FilterMode::Verbs,
        FilterMode::Adjectives,
        FilterMode::Avn,
        FilterMode::Stopwords,
        FilterMode::Punctuation,
        FilterMode::CommonWords,
        FilterMode::CommonWordsRelaxed,
        FilterMode::CommonWordsStrict,
        FilterMode::CommonWordsRelaxedGeneral,
        FilterMode::CommonWordsStrictGeneral,
        FilterMode::CommonWordsDocFreq,
    ];

    /// Canonical name, used in artifact keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::NoFilter => "no_filter",
            FilterMode::NamedEntities => "named_entities",
            FilterMode::Nouns => "nouns",
            FilterMode::Verbs => "verbs",
            FilterMode::Adjectives => "adjectives",
            FilterMode::Avn => "avn",
            FilterMode::Stopwords => "stopwords",
            FilterMode::Punctuation => "punctuation",
            FilterMode::CommonWords => "common_words",
            FilterMode::CommonWordsRelaxed => "common_words_relaxed",
            FilterMode::CommonWordsStrict => "common_words_strict",
            FilterMode::CommonWordsRelaxedGeneral => "common_words_relaxed_general_words_sensitive",
            FilterMode::CommonWordsStrictGeneral => "common_words_strict_general_words_sensitive",
            FilterMode::CommonWordsDocFreq => "common_words_doc_freq",
        }
    }

    /// True for every mode whose exclusion set is derived from the corpus.
    pub fn is_computed_common_words(&self) -> bool {
        matches!(
            self,
            FilterMode::CommonWordsRelaxed
                | FilterMode::CommonWordsStrict
                | FilterMode::CommonWordsRelaxedGeneral
                | FilterMode::CommonWordsStrictGeneral
                | FilterMode::CommonWordsDocFreq
        )
    }

    /// The token predicate for POS / flag modes; None for the others.
    pub fn token_filter(&self) -> Option<TokenFilter> {
        let filter = TokenFilter::default();
        Some(match self {
            FilterMode::NamedEntities => filter.pos(&["PROPN"]).entities(),
            FilterMode::Nouns => filter.pos(&["NOUN", "PROPN"]).entities(),
            FilterMode::Verbs => filter.pos(&["VERB", "ADV"]),
            FilterMode::Adjectives => filter.pos(&["ADJ"]),
            FilterMode::Avn => filter.pos(&["NOUN", "PROPN", "ADJ", "VERB", "ADV"]).entities(),
            FilterMode::Stopwords => filter.stopwords(),
            FilterMode::Punctuation => filter.punctuation(),
            _ => return None,
        })
    }
}

impl FromStr for FilterMode {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.trim().to_lowercase().as_str() {
            "no_filter" | "nf" => FilterMode::NoFilter,
            "named_entities" | "ne" | "named_entity" => FilterMode::NamedEntities,
            "nouns" | "n" | "noun" => FilterMode::Nouns,
            "verbs" | "v" | "verb" => FilterMode::Verbs,
            "adjectives" | "a" | "adj" | "adjective" => FilterMode::Adjectives,
            "avn" | "anv" | "nav" | "nva" | "van" | "vna" => FilterMode::Avn,
            "stopwords" | "stop_words" | "stopword" | "stop_word" | "stop" | "sw" => {
                FilterMode::Stopwords
            }
            "punctuation" | "punct" | "." | "pun" | "punc" | "zeichen" => FilterMode::Punctuation,
            "common_words" | "cw" => FilterMode::CommonWords,
            "common_words_relaxed" | "cw_rel" => FilterMode::CommonWordsRelaxed,
            "common_words_strict" | "cw_str" => FilterMode::CommonWordsStrict,
            "common_words_relaxed_general_words_sensitive" | "cw_rel_gw" => {
                FilterMode::CommonWordsRelaxedGeneral
            }
            "common_words_strict_general_words_sensitive" | "cw_str_gw" => {
                FilterMode::CommonWordsStrictGeneral
            }
            "common_words_doc_freq" | "cw_df" => FilterMode::CommonWordsDocFreq,
            _ => return Err(CorpusError::InvalidMode(s.to_string())),
        };
        Ok(mode)
    }
}

impl TryFrom<String> for FilterMode {
    type Error = CorpusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterMode> for String {
    fn from(mode: FilterMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token predicate built from POS tags and flags.
///
/// A token is dropped when it is a stopword (with `stop`), non-alphabetic
/// (with `punct`), tagged with one of `pos`, or part of an entity (with
/// `entity`). `revert` keeps exactly the dropped tokens instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenFilter {
    pub pos: Vec<&'static str>,
    pub stop: bool,
    pub punct: bool,
    pub entity: bool,
    pub revert: bool,
}

impl TokenFilter {
    pub fn pos(mut self, tags: &[&'static str]) -> Self {
        self.pos = tags.to_vec();
        self
    }

    pub fn entities(mut self) -> Self {
        self.entity = true;
        self
    }

    pub fn stopwords(mut self) -> Self {
        self.stop = true;
        self
    }

    pub fn punctuation(mut self) -> Self {
        self.punct = true;
        self
    }

    pub fn reverted(mut self) -> Self {
        self.revert = !self.revert;
        self
    }

    pub fn keeps(&self, token: &Token) -> bool {
        let keep = (!self.stop || !token.stop)
            && (!self.punct || token.alpha)
            && !token.pos_in(&self.pos)
            && (!self.entity || !token.has_entity());
        keep != self.revert
    }
}
