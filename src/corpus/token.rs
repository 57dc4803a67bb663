// Token and Sentence: the smallest units of an annotated document.
//
// Tokens carry whatever the external tagger produced: surface text, lemma,
// POS tag, entity label and three flags. A token whose text and lemma are the
// sentinel "del" has been masked or stands in for an emptied sentence.

use serde::{Deserialize, Serialize};

/// Sentinel written into text and lemma of masked tokens.
pub const DELETED: &str = "del";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    /// Universal POS tag (NOUN, PROPN, VERB, ...), if the tagger set one
    pub pos: Option<String>,
    /// Named-entity label (GPE, DATE, PERSON, ...), None outside entities
    #[serde(rename = "ne")]
    pub entity: Option<String>,
    pub punctuation: bool,
    pub alpha: bool,
    pub stop: bool,
}

impl Token {
    /// Build a token. An empty POS or entity label counts as absent.
    pub fn new(
        text: impl Into<String>,
        lemma: impl Into<String>,
        pos: Option<&str>,
        entity: Option<&str>,
        punctuation: bool,
        alpha: bool,
        stop: bool,
    ) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into(),
            pos: non_empty(pos),
            entity: non_empty(entity),
            punctuation,
            alpha,
            stop,
        }
    }

    /// The placeholder inserted when filtering empties a sentence.
    pub fn deleted() -> Self {
        Self {
            text: DELETED.to_string(),
            lemma: DELETED.to_string(),
            pos: None,
            entity: None,
            punctuation: false,
            alpha: false,
            stop: false,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.text == DELETED && self.lemma == DELETED
    }

    /// Overwrite text and lemma with the sentinel, keeping every other field.
    pub fn masked(&self) -> Self {
        Self {
            text: DELETED.to_string(),
            lemma: DELETED.to_string(),
            ..self.clone()
        }
    }

    pub fn has_entity(&self) -> bool {
        self.entity.is_some()
    }

    pub fn pos_in(&self, tags: &[&str]) -> bool {
        self.pos.as_deref().is_some_and(|p| tags.contains(&p))
    }

    /// Text or lemma, optionally lower-cased.
    pub fn representation(&self, lemma: bool, lower: bool) -> String {
        let rep = if lemma { &self.lemma } else { &self.text };
        if lower {
            rep.to_lowercase()
        } else {
            rep.clone()
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// An ordered run of tokens. Position matters to the aligned algorithms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn representation(&self, lemma: bool, lower: bool) -> Vec<String> {
        self.tokens
            .iter()
            .map(|t| t.representation(lemma, lower))
            .collect()
    }

    /// Put the sentinel into a sentence that lost every token.
    pub(crate) fn ensure_non_empty(mut self) -> Self {
        if self.tokens.is_empty() {
            self.tokens.push(Token::deleted());
        }
        self
    }
}
