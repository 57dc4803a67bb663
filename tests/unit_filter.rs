// Filtering & masking engine tests against the public API.
//
// The fixture carries every token class the modes care about: proper nouns
// with entity labels, common nouns, verbs, adverbs, adjectives, stopwords and
// punctuation.

use std::collections::BTreeMap;

use book_ablation::corpus::{Corpus, Document, Language, Sentence, Token, DELETED};
use book_ablation::filter::{filter, FilterMode, TokenFilter};
use book_ablation::CorpusError;

fn word(text: &str, pos: &str) -> Token {
    Token::new(text, text.to_lowercase(), Some(pos), None, false, true, false)
}

fn stop(text: &str) -> Token {
    Token::new(text, text.to_lowercase(), Some("DET"), None, false, true, true)
}

fn punct(text: &str) -> Token {
    Token::new(text, text, Some("PUNCT"), None, true, false, false)
}

fn entity(text: &str, label: &str) -> Token {
    Token::new(text, text, Some("PROPN"), Some(label), false, true, false)
}

fn fixture() -> Corpus {
    let a = Document::new("a", "", Some("Alpha".into()), Language::En).with_sentences(vec![
        Sentence::new(vec![
            entity("Anna", "PERSON"),
            word("walked", "VERB"),
            word("slowly", "ADV"),
            stop("the"),
            word("old", "ADJ"),
            word("road", "NOUN"),
            punct("."),
        ]),
        Sentence::new(vec![punct("!"), punct("?")]),
    ]);
    let b = Document::new("b", "", Some("Beta".into()), Language::En).with_sentences(vec![
        Sentence::new(vec![
            stop("a"),
            word("ship", "NOUN"),
            word("left", "VERB"),
            entity("Berlin", "GPE"),
            punct("."),
        ]),
    ]);
    let series: BTreeMap<String, Vec<String>> =
        [("s".to_string(), vec!["a".to_string(), "b".to_string()])].into();
    Corpus::new("fixture", Language::En, vec![a, b])
        .with_series(series)
        .unwrap()
}

fn surfaces(corpus: &Corpus, doc_id: &str) -> Vec<String> {
    corpus
        .document(doc_id)
        .unwrap()
        .tokens()
        .map(|t| t.text.clone())
        .collect()
}

// ============================================================
// Identity and invariants
// ============================================================

#[test]
fn no_filter_is_identity() {
    let corpus = fixture();
    let filtered = filter(&corpus, FilterMode::NoFilter, false, None).unwrap();
    assert_eq!(filtered, corpus);
    let masked = filter(&corpus, FilterMode::NoFilter, true, None).unwrap();
    assert_eq!(masked, corpus);
}

#[test]
fn masking_preserves_sentence_and_token_counts() {
    let corpus = fixture();
    for mode in FilterMode::ALL.into_iter().filter(|m| m.token_filter().is_some()) {
        let masked = filter(&corpus, mode, true, None).unwrap();
        for doc in corpus.documents() {
            let other = masked.document(&doc.doc_id).unwrap();
            assert_eq!(doc.sentences().len(), other.sentences().len(), "{mode}");
            for (s, t) in doc.sentences().iter().zip(other.sentences()) {
                assert_eq!(s.len(), t.len(), "{mode}");
            }
        }
    }
}

#[test]
fn masking_keeps_other_attributes() {
    let masked = filter(&fixture(), FilterMode::Nouns, true, None).unwrap();
    let doc = masked.document("b").unwrap();
    let berlin = doc.token_at(3).unwrap();
    assert_eq!(berlin.text, DELETED);
    assert_eq!(berlin.lemma, DELETED);
    assert_eq!(berlin.pos.as_deref(), Some("PROPN"));
    assert_eq!(berlin.entity.as_deref(), Some("GPE"));
}

#[test]
fn removal_never_leaves_an_empty_sentence() {
    let corpus = fixture();
    for mode in FilterMode::ALL.into_iter().filter(|m| m.token_filter().is_some()) {
        let filtered = filter(&corpus, mode, false, None).unwrap();
        for doc in filtered.documents() {
            assert!(doc.sentences().iter().all(|s| !s.is_empty()), "{mode}");
        }
    }

    // the all-punctuation sentence collapses to the sentinel
    let filtered = filter(&corpus, FilterMode::Punctuation, false, None).unwrap();
    let second = &filtered.document("a").unwrap().sentences()[1];
    assert_eq!(second.tokens, vec![Token::deleted()]);
}

#[test]
fn vocab_never_contains_sentinel() {
    let corpus = fixture();
    for mode in FilterMode::ALL.into_iter().filter(|m| m.token_filter().is_some()) {
        for masking in [false, true] {
            let filtered = filter(&corpus, mode, masking, None).unwrap();
            assert!(!filtered.vocab().unwrap().contains(DELETED), "{mode} masking={masking}");
        }
    }
}

#[test]
fn filtering_keeps_metadata_and_source() {
    let corpus = fixture();
    let before = corpus.clone();
    let filtered = filter(&corpus, FilterMode::Stopwords, false, None).unwrap();
    assert_eq!(corpus, before);
    assert_eq!(filtered.name, "fixture");
    assert_eq!(filtered.series_dict(), corpus.series_dict());
    assert_eq!(filtered.document("a").unwrap().title.as_deref(), Some("Alpha"));
}

// ============================================================
// Mode predicates
// ============================================================

#[test]
fn nouns_drop_nouns_proper_nouns_and_entities() {
    let filtered = filter(&fixture(), FilterMode::Nouns, false, None).unwrap();
    assert_eq!(surfaces(&filtered, "b"), vec!["a", "left", "."]);
}

#[test]
fn named_entities_keep_common_nouns() {
    let filtered = filter(&fixture(), FilterMode::NamedEntities, false, None).unwrap();
    assert_eq!(surfaces(&filtered, "b"), vec!["a", "ship", "left", "."]);
}

#[test]
fn verbs_drop_verbs_and_adverbs() {
    let filtered = filter(&fixture(), FilterMode::Verbs, false, None).unwrap();
    assert_eq!(
        surfaces(&filtered, "a"),
        vec!["Anna", "the", "old", "road", ".", "!", "?"]
    );
}

#[test]
fn adjectives_and_avn() {
    let adj = filter(&fixture(), FilterMode::Adjectives, false, None).unwrap();
    assert!(!surfaces(&adj, "a").contains(&"old".to_string()));

    let avn = filter(&fixture(), FilterMode::Avn, false, None).unwrap();
    assert_eq!(surfaces(&avn, "a"), vec!["the", ".", "!", "?"]);
}

#[test]
fn stopwords_and_punctuation() {
    let sw = filter(&fixture(), FilterMode::Stopwords, false, None).unwrap();
    assert_eq!(surfaces(&sw, "b"), vec!["ship", "left", "Berlin", "."]);

    let pun = filter(&fixture(), FilterMode::Punctuation, false, None).unwrap();
    assert_eq!(surfaces(&pun, "b"), vec!["a", "ship", "left", "Berlin"]);
}

#[test]
fn reverted_filter_keeps_only_the_dropped_class() {
    let keep_stop = TokenFilter::default().stopwords().reverted();
    let corpus = fixture();
    let kept: Vec<&str> = corpus
        .document("a")
        .unwrap()
        .tokens()
        .filter(|t| keep_stop.keeps(t))
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(kept, vec!["the"]);

    let keep_adj_adv = TokenFilter::default().pos(&["ADJ", "ADV"]).reverted();
    let kept: Vec<String> = fixture()
        .document("a")
        .unwrap()
        .tokens()
        .filter(|t| keep_adj_adv.keeps(t))
        .map(|t| t.text.clone())
        .collect();
    assert_eq!(kept, vec!["slowly", "old"]);
}

// ============================================================
// Mode parsing and argument errors
// ============================================================

#[test]
fn aliases_parse_case_insensitively() {
    assert_eq!("NF".parse::<FilterMode>().unwrap(), FilterMode::NoFilter);
    assert_eq!("cw_str".parse::<FilterMode>().unwrap(), FilterMode::CommonWordsStrict);
    assert_eq!("Zeichen".parse::<FilterMode>().unwrap(), FilterMode::Punctuation);
    assert_eq!("vna".parse::<FilterMode>().unwrap(), FilterMode::Avn);
    assert_eq!(
        "cw_rel_gw".parse::<FilterMode>().unwrap(),
        FilterMode::CommonWordsRelaxedGeneral
    );
    assert!(matches!(
        "bogus".parse::<FilterMode>(),
        Err(CorpusError::InvalidMode(_))
    ));
}

#[test]
fn canonical_names_round_trip() {
    for mode in FilterMode::ALL {
        assert_eq!(mode.to_string().parse::<FilterMode>().unwrap(), mode);
    }
}

#[test]
fn common_words_without_mapping_is_missing_argument() {
    let err = filter(&fixture(), FilterMode::CommonWords, false, None).unwrap_err();
    assert!(matches!(err, CorpusError::MissingArgument(_)));
    assert!(err.is_validation());
}

#[test]
fn series_modes_need_a_series_dict() {
    let corpus = fixture();
    let without = Corpus::new("plain", Language::En, corpus.documents().cloned());
    let err = filter(&without, FilterMode::CommonWordsRelaxed, false, None).unwrap_err();
    assert!(matches!(err, CorpusError::MissingArgument(_)));

    // the global document-frequency mode works without series
    assert!(filter(&without, FilterMode::CommonWordsDocFreq, false, None).is_ok());
}
