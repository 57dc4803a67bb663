// Document: one book (or one part of a series) with its annotated sentences.
//
// Sentences are replaced wholesale, never edited in place: every write goes
// through `set_sentences`, which drops the memoised flat-position index.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::token::{Sentence, Token, DELETED};
use crate::error::{CorpusError, Result};

/// Longest title fragment kept in a file name.
pub const MAX_TITLE_CHARS: usize = 80;

/// Document / corpus language. Parsing accepts the loose spellings found in
/// dataset metadata ("english", "deutsch", "ger", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Language {
    #[default]
    Unknown,
    De,
    En,
}

impl Language {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "en" | "english" | "englisch" => Language::En,
            "de" | "deutsch" | "ger" | "german" => Language::De,
            _ => Language::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Unknown => "unknown",
            Language::De => "de",
            Language::En => "en",
        }
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        Language::parse(&value)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    /// Raw source text as delivered by the loader
    pub text: String,
    pub title: Option<String>,
    pub language: Language,
    pub authors: Option<String>,
    pub date: Option<String>,
    /// Free-text genre label
    pub genres: Option<String>,
    sentences: Vec<Sentence>,
    /// flat token offset -> (sentence index, token index)
    #[serde(skip)]
    positions: OnceLock<Vec<(usize, usize)>>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.doc_id == other.doc_id
            && self.text == other.text
            && self.title == other.title
            && self.language == other.language
            && self.authors == other.authors
            && self.date == other.date
            && self.genres == other.genres
            && self.sentences == other.sentences
    }
}

impl Eq for Document {}

impl Document {
    /// A freshly loaded, not yet annotated document.
    pub fn new(
        doc_id: impl Into<String>,
        text: impl Into<String>,
        title: Option<String>,
        language: Language,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            text: text.into(),
            title,
            language,
            authors: None,
            date: None,
            genres: None,
            sentences: Vec::new(),
            positions: OnceLock::new(),
        }
    }

    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = Some(authors.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_genres(mut self, genres: impl Into<String>) -> Self {
        self.genres = Some(genres.into());
        self
    }

    pub fn with_sentences(mut self, sentences: Vec<Sentence>) -> Self {
        self.set_sentences(sentences);
        self
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn set_sentences(&mut self, sentences: Vec<Sentence>) {
        self.sentences = sentences;
        self.positions = OnceLock::new();
    }

    pub fn is_annotated(&self) -> bool {
        !self.sentences.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }

    /// Metadata copy with different sentences. Used by every transformation
    /// that produces a new document instead of editing this one.
    pub fn with_replaced_sentences(&self, sentences: Vec<Sentence>) -> Self {
        Self {
            doc_id: self.doc_id.clone(),
            text: self.text.clone(),
            title: self.title.clone(),
            language: self.language,
            authors: self.authors.clone(),
            date: self.date.clone(),
            genres: self.genres.clone(),
            sentences,
            positions: OnceLock::new(),
        }
    }

    /// Token at a flat document offset, counting across sentence boundaries.
    pub fn token_at(&self, position: usize) -> Option<&Token> {
        let positions = self.positions.get_or_init(|| {
            self.sentences
                .iter()
                .enumerate()
                .flat_map(|(i, s)| (0..s.len()).map(move |j| (i, j)))
                .collect()
        });
        let &(i, j) = positions.get(position)?;
        self.sentences.get(i)?.tokens.get(j)
    }

    /// All token representations in reading order.
    pub fn flat_tokens(&self, lemma: bool, lower: bool) -> Result<Vec<String>> {
        if self.sentences.is_empty() {
            return Err(CorpusError::EmptyDocument(self.doc_id.clone()));
        }
        Ok(self.tokens().map(|t| t.representation(lemma, lower)).collect())
    }

    /// Distinct surface forms, without the deletion sentinel.
    pub fn vocab(&self) -> Result<BTreeSet<String>> {
        let mut vocab: BTreeSet<String> = self.flat_tokens(false, false)?.into_iter().collect();
        vocab.remove(DELETED);
        Ok(vocab)
    }

    pub fn reset_text_from_sentences(&mut self) {
        self.text = self
            .sentences
            .iter()
            .map(|s| s.representation(false, false).join(" "))
            .collect::<Vec<_>>()
            .join(" ");
    }

    /// File-name friendly metadata string:
    /// `{id}_-_{authors}_-_{title}_-_{language}_-_{genres}_-_{date}`.
    /// The title is cut to `MAX_TITLE_CHARS` characters.
    pub fn meta_string(&self) -> String {
        let title: String = self
            .title
            .as_deref()
            .unwrap_or("None")
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .take(MAX_TITLE_CHARS)
            .collect();
        let raw = format!(
            "{}_-_{}_-_{}_-_{}_-_{}_-_{}",
            self.doc_id,
            self.authors.as_deref().unwrap_or("None").replace(' ', "_"),
            title,
            self.language,
            self.genres.as_deref().unwrap_or("None").replace(' ', "_"),
            self.date.as_deref().unwrap_or("None"),
        );
        raw.replace(['"', '/', '\\'], "")
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title: String = self.title.as_deref().unwrap_or("").chars().take(50).collect();
        write!(
            f,
            "{} ({}): {}",
            self.authors.as_deref().unwrap_or("None"),
            self.date.as_deref().unwrap_or("None"),
            title
        )
    }
}
