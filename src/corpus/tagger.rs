// Tagger seam: turns raw document text into annotated sentences.
//
// Real experiments feed in corpora already annotated by an external POS/NER
// tagger. `SimpleTagger` is the local fallback: sentence split, word split,
// character-class flags and stop-word lists, with no POS or entity labels.

use std::collections::HashSet;

use regex_lite::Regex;
use stop_words::{get, LANGUAGE};
use tracing::info;

use super::corpus::Corpus;
use super::document::Language;
use super::token::{Sentence, Token};

/// Anything that can annotate plain text in a given language.
pub trait Tagger {
    fn annotate(&self, text: &str, language: Language) -> Vec<Sentence>;
}

pub struct SimpleTagger {
    sentence_end: Regex,
    english: HashSet<String>,
    german: HashSet<String>,
}

impl Default for SimpleTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleTagger {
    pub fn new() -> Self {
        Self {
            sentence_end: Regex::new(r"[.!?]+\s+").expect("valid sentence pattern"),
            english: get(LANGUAGE::English).into_iter().collect(),
            german: get(LANGUAGE::German).into_iter().collect(),
        }
    }

    fn is_stop(&self, lower: &str, language: Language) -> bool {
        match language {
            Language::En => self.english.contains(lower),
            Language::De => self.german.contains(lower),
            Language::Unknown => self.english.contains(lower) || self.german.contains(lower),
        }
    }

    fn token(&self, word: &str, language: Language) -> Token {
        let lower = word.to_lowercase();
        let alpha = word.chars().all(char::is_alphabetic);
        let punctuation = word.chars().all(is_punct);
        let stop = self.is_stop(&lower, language);
        Token::new(word, lower, None, None, punctuation, alpha, stop)
    }
}

impl Tagger for SimpleTagger {
    fn annotate(&self, text: &str, language: Language) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut bounds: Vec<(usize, usize)> = self
            .sentence_end
            .find_iter(text)
            .map(|m| {
                // keep the terminal punctuation with its sentence
                let end = m.start() + m.as_str().trim_end().len();
                let bound = (start, end);
                start = m.end();
                bound
            })
            .collect();
        bounds.push((start, text.len()));

        for (from, to) in bounds {
            let tokens: Vec<Token> = text[from..to]
                .split_whitespace()
                .flat_map(split_punctuation)
                .map(|w| self.token(w, language))
                .collect();
            if !tokens.is_empty() {
                sentences.push(Sentence::new(tokens));
            }
        }
        sentences
    }
}

fn is_punct(c: char) -> bool {
    c.is_ascii_punctuation() || "«»„“”‘’–—…".contains(c)
}

/// Peel leading and trailing punctuation off a whitespace chunk, one token
/// per punctuation character.
fn split_punctuation(chunk: &str) -> Vec<&str> {
    let core = chunk.trim_matches(is_punct);
    if core.is_empty() {
        return chunk.char_indices().map(|(i, c)| &chunk[i..i + c.len_utf8()]).collect();
    }
    let lead = chunk.len() - chunk.trim_start_matches(is_punct).len();
    let tail = lead + core.len();
    let mut parts: Vec<&str> = chunk[..lead]
        .char_indices()
        .map(|(i, c)| &chunk[i..i + c.len_utf8()])
        .collect();
    parts.push(core);
    parts.extend(
        chunk[tail..]
            .char_indices()
            .map(|(i, c)| &chunk[tail + i..tail + i + c.len_utf8()]),
    );
    parts
}

/// Annotate every document that has no sentences yet.
pub fn annotate_corpus(corpus: &mut Corpus, tagger: &dyn Tagger) -> usize {
    let pending: Vec<String> = corpus
        .documents()
        .filter(|d| !d.is_annotated())
        .map(|d| d.doc_id.clone())
        .collect();

    for doc_id in &pending {
        corpus.update_document(doc_id, |doc| {
            let sentences = tagger.annotate(&doc.text, doc.language);
            doc.set_sentences(sentences);
        });
    }

    info!(corpus = %corpus.name, annotated = pending.len(), "Annotated documents");
    pending.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::document::Document;

    #[test]
    fn test_sentence_and_word_split() {
        let tagger = SimpleTagger::new();
        let sentences = tagger.annotate("The ship sailed. It sank!  Nobody cared", Language::En);
        assert_eq!(sentences.len(), 3);
        assert_eq!(
            sentences[0].representation(false, false),
            vec!["The", "ship", "sailed", "."]
        );
        assert_eq!(sentences[2].representation(true, false), vec!["nobody", "cared"]);
    }

    #[test]
    fn test_flags() {
        let tagger = SimpleTagger::new();
        let sentences = tagger.annotate("The ship, 1850.", Language::En);
        let tokens = &sentences[0].tokens;
        assert!(tokens[0].stop);
        assert!(tokens[1].alpha && !tokens[1].stop);
        assert!(tokens[2].punctuation && !tokens[2].alpha);
        assert!(!tokens[3].alpha && !tokens[3].punctuation);
        assert!(tokens.iter().all(|t| t.pos.is_none() && t.entity.is_none()));
    }

    #[test]
    fn test_split_punctuation() {
        assert_eq!(split_punctuation("„Straße,“"), vec!["„", "Straße", ",", "“"]);
        assert_eq!(split_punctuation("..."), vec![".", ".", "."]);
        assert_eq!(split_punctuation("don't"), vec!["don't"]);
    }

    #[test]
    fn test_german_stopwords() {
        let tagger = SimpleTagger::new();
        let sentences = tagger.annotate("Der Hund und die Katze", Language::De);
        let stops: Vec<bool> = sentences[0].tokens.iter().map(|t| t.stop).collect();
        assert_eq!(stops, vec![true, false, true, true, false]);
    }

    #[test]
    fn test_annotate_corpus_skips_annotated() {
        let tagger = SimpleTagger::new();
        let done = Document::new("a", "Already done.", None, Language::En)
            .with_sentences(vec![Sentence::new(vec![Token::deleted()])]);
        let raw = Document::new("b", "Fresh text here.", None, Language::En);
        let mut corpus = Corpus::new("c", Language::En, vec![done, raw]);

        assert_eq!(annotate_corpus(&mut corpus, &tagger), 1);
        assert!(corpus.document("a").unwrap().tokens().next().unwrap().is_deleted());
        assert_eq!(corpus.document("b").unwrap().token_count(), 4);
    }
}
