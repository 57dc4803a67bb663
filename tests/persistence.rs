// Persistence tests: corpus formats, vector tables and atomic writes, all
// against temp directories.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use book_ablation::aspects::{combine, Aspect, AspectKey, VectorKey};
use book_ablation::corpus::{Corpus, Document, Language, Sentence, Token};
use book_ablation::store::{dir, json, vectors};
use book_ablation::CorpusError;

fn tok(text: &str, pos: Option<&str>, entity: Option<&str>) -> Token {
    let alpha = text.chars().all(char::is_alphabetic);
    Token::new(text, text.to_lowercase(), pos, entity, !alpha, alpha, false)
}

fn corpus() -> Corpus {
    let a = Document::new("emma_0", "Emma lived in Highbury.", Some("Emma: Part \"One\"".into()), Language::En)
        .with_authors("Jane Austen")
        .with_date("1815")
        .with_genres("novel")
        .with_sentences(vec![
            Sentence::new(vec![
                tok("Emma", Some("PROPN"), Some("PERSON")),
                tok("lived", Some("VERB"), None),
                tok("in", Some("ADP"), None),
                tok("Highbury", Some("PROPN"), Some("GPE")),
                tok(".", Some("PUNCT"), None),
            ]),
            Sentence::new(vec![Token::deleted()]),
        ]);
    let b = Document::new("emma_1", "Das Ende.", None, Language::De).with_sentences(vec![Sentence::new(vec![
        tok("Das", None, None),
        tok("Ende", Some("NOUN"), None),
        tok(".", None, None),
    ])]);
    let mut corpus = Corpus::new("austen", Language::En, vec![a, b])
        .with_series([("emma".to_string(), vec!["emma_0".to_string(), "emma_1".to_string()])].into())
        .unwrap();
    corpus.success_dict = Some(serde_json::json!({"emma_0": 1, "emma_1": 0}));
    corpus
}

// ============================================================
// Structured JSON record
// ============================================================

#[test]
fn json_round_trip_is_field_for_field_equal() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("austen.json");
    let original = corpus();
    json::save(&original, &path).unwrap();

    let loaded = json::load(&path).unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.success_dict, original.success_dict);
    assert_eq!(loaded.document_entities(), original.document_entities());
    let emma = loaded.document("emma_0").unwrap();
    assert_eq!(emma.authors.as_deref(), Some("Jane Austen"));
    assert_eq!(emma.token_at(3).unwrap().entity.as_deref(), Some("GPE"));
}

#[test]
fn json_missing_file_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let err = json::load(&tmp.path().join("absent.json")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn json_malformed_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(json::load(&path), Err(CorpusError::Json(_))));
}

// ============================================================
// Directory format
// ============================================================

#[test]
fn dir_round_trip_is_field_for_field_equal() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("austen");
    let original = corpus();
    dir::save(&original, &path).unwrap();

    assert!(path.join(dir::META_FILE).exists());
    let files = fs::read_dir(&path)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "txt"))
        .count();
    assert_eq!(files, 2);

    let loaded = dir::load(&path).unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.success_dict, original.success_dict);
    assert_eq!(loaded.root_corpus_path.as_deref(), Some(path.as_path()));
}

#[test]
fn dir_round_trip_keeps_whitespace_and_tabs() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("spaced");
    let doc = Document::new("w", "Call\n\nme", Some("Spaced".into()), Language::En).with_sentences(vec![
        Sentence::new(vec![
            tok("Call", Some("VERB"), None),
            Token::new("\n\n", "\n\n", Some("SPACE"), None, false, false, false),
            Token::new("a\tb", "a\tb", Some("X"), None, false, false, false),
            Token::new("back\\slash\r", "back\\slash\r", Some("X"), None, false, false, false),
            tok("me", Some("PRON"), None),
        ]),
    ]);
    let original = Corpus::new("spaced", Language::En, vec![doc]);
    dir::save(&original, &path).unwrap();

    let loaded = dir::load(&path).unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.document("w").unwrap().token_at(1).unwrap().text, "\n\n");
}

#[test]
fn dir_save_over_larger_corpus_drops_old_documents() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("shrinking");
    dir::save(&corpus(), &path).unwrap();

    let smaller = corpus().take(1);
    dir::save(&smaller, &path).unwrap();

    let loaded = dir::load(&path).unwrap();
    let ids: Vec<&str> = loaded.doc_ids().collect();
    assert_eq!(ids, vec!["emma_0"]);
    assert_eq!(loaded, smaller);
}

#[test]
fn dir_ids_that_share_a_file_name_stay_apart() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("collide");
    let doc = |id: &str, word: &str| {
        Document::new(id, word, None, Language::En).with_sentences(vec![Sentence::new(vec![tok(word, None, None)])])
    };
    let original = Corpus::new("collide", Language::En, vec![doc("a/b", "first"), doc("ab", "second")]);
    dir::save(&original, &path).unwrap();

    let loaded = dir::load(&path).unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.document("a/b").unwrap().token_at(0).unwrap().text, "first");
}

#[test]
fn dir_without_record_falls_back_to_file_name() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bare");
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join(dir::META_FILE), r#"{"name":"bare","root_corpus_path":null,"series_dict":null}"#).unwrap();
    fs::write(
        path.join("b1_-_Jane_Doe_-_Emma_-_en_-_None_-_1815.txt"),
        "Emma\temma\tPROPN\tPERSON\t0\t1\t0\n<SENT>\n",
    )
    .unwrap();

    let loaded = dir::load(&path).unwrap();
    let doc = loaded.document("b1").unwrap();
    assert_eq!(doc.authors.as_deref(), Some("Jane Doe"));
    assert_eq!(doc.title.as_deref(), Some("Emma"));
    assert_eq!(doc.text, "Emma");
    assert_eq!(doc.token_count(), 1);
}

#[test]
fn dir_missing_meta_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(dir::load(tmp.path()).unwrap_err().is_not_found());
}

// ============================================================
// Vector tables
// ============================================================

fn known() -> BTreeSet<String> {
    ["emma_0", "emma_1"].iter().map(|s| s.to_string()).collect()
}

fn aspect_rows() -> BTreeMap<AspectKey, Vec<f64>> {
    let k = |doc: &str, aspect: &str| AspectKey::new(doc, Aspect::new(aspect).unwrap());
    [
        (k("emma_0", "raw"), vec![0.5, -1.25]),
        (k("emma_0", "loc"), vec![1.0, 1.0]),
        (k("emma_1", "raw"), vec![2.0, 0.125]),
    ]
    .into_iter()
    .collect()
}

#[test]
fn aspect_vectors_round_trip_with_underscored_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("m.aspects.vec");
    vectors::write_aspect_vectors(&path, &aspect_rows()).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("3 2\n"));
    assert!(content.contains("*dt_emma_0_loc 1 1\n"));

    let loaded = vectors::read_aspect_vectors(&path, &known()).unwrap();
    assert_eq!(loaded, aspect_rows());
}

#[test]
fn combined_store_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("m.model");
    let combined = combine(aspect_rows()).unwrap();
    vectors::write_combined(&path, &combined).unwrap();

    let loaded = vectors::read_combined(&path, &known()).unwrap();
    assert_eq!(loaded, combined);
    assert_eq!(loaded.document("emma_0").unwrap(), &[1.5, -0.25]);
    assert!(loaded.get(&VectorKey::Document("emma_1".into())).is_some());
}

#[test]
fn unknown_document_tag_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("m.vec");
    fs::write(&path, "1 1\n*dt_ghost_raw 1\n").unwrap();
    let err = vectors::read_aspect_vectors(&path, &known()).unwrap_err();
    assert!(matches!(err, CorpusError::InvalidAspect(_)));
}

#[test]
fn missing_trainer_output_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let err = vectors::read_aspect_vectors(&tmp.path().join("none.vec"), &known()).unwrap_err();
    assert!(err.is_not_found());
}
