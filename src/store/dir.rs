// Directory corpus format.
//
// One `<meta_string>.txt` per document with one token per line:
//
//   text \t lemma \t pos \t entity \t punct \t alpha \t stop
//
// Absent labels are written as `None`, flags as 0/1, and a `<SENT>` line
// closes each sentence. Backslash, tab, newline and carriage return inside a
// field are written as `\\`, `\t`, `\n` and `\r`. `meta_info.json` carries the
// corpus-level fields and a per-document record so titles and authors survive
// the file-name mangling; when the record lists documents, only those files
// are read.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{read_to_string, write_atomic, write_json_atomic};
use crate::corpus::{Corpus, Document, Language, Sentence, SeriesDict, Token};
use crate::error::{CorpusError, Result};

pub const META_FILE: &str = "meta_info.json";
const SENTENCE_END: &str = "<SENT>";
const ABSENT: &str = "None";
const META_SEPARATOR: &str = "_-_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DocumentMeta {
    file: String,
    title: Option<String>,
    authors: Option<String>,
    date: Option<String>,
    genres: Option<String>,
    language: Language,
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MetaInfo {
    name: String,
    root_corpus_path: Option<PathBuf>,
    #[serde(default)]
    language: Language,
    series_dict: Option<SeriesDict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    success_dict: Option<serde_json::Value>,
    #[serde(default)]
    documents: BTreeMap<String, DocumentMeta>,
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(field: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => return Err(format!("invalid escape \\{other} in {field:?}")),
            None => return Err(format!("dangling backslash in {field:?}")),
        }
    }
    Ok(out)
}

fn token_line(token: &Token) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        escape(&token.text),
        escape(&token.lemma),
        token.pos.as_deref().map(escape).as_deref().unwrap_or(ABSENT),
        token.entity.as_deref().map(escape).as_deref().unwrap_or(ABSENT),
        flag(token.punctuation),
        flag(token.alpha),
        flag(token.stop),
    )
}

pub fn document_to_string(doc: &Document) -> String {
    let mut out = String::new();
    for sentence in doc.sentences() {
        for token in &sentence.tokens {
            out.push_str(&token_line(token));
            out.push('\n');
        }
        out.push_str(SENTENCE_END);
        out.push('\n');
    }
    out
}

fn parse_token(line: &str, path: &Path, line_no: usize) -> Result<Token> {
    let parse_err = |message: String| CorpusError::Parse {
        path: path.to_path_buf(),
        line: line_no,
        message,
    };
    let fields: Vec<&str> = line.split('\t').collect();
    let &[text, lemma, pos, entity, punct, alpha, stop] = fields.as_slice() else {
        return Err(parse_err(format!("expected 7 tab-separated fields, got {}", fields.len())));
    };
    let parse_flag = |raw: &str| match raw {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(parse_err(format!("invalid flag {other:?}"))),
    };
    let field = |raw: &str| unescape(raw).map_err(&parse_err);
    let label = |raw: &str| -> Result<Option<String>> {
        let raw = raw.trim();
        if raw == ABSENT || raw.is_empty() {
            return Ok(None);
        }
        field(raw).map(Some)
    };

    let mut token = Token::new(
        field(text)?,
        field(lemma)?,
        None,
        None,
        parse_flag(punct)?,
        parse_flag(alpha)?,
        parse_flag(stop)?,
    );
    token.pos = label(pos)?;
    token.entity = label(entity)?;
    Ok(token)
}

pub fn parse_sentences(content: &str, path: &Path) -> Result<Vec<Sentence>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        if line == SENTENCE_END {
            sentences.push(Sentence::new(std::mem::take(&mut current)));
        } else {
            current.push(parse_token(line, path, i + 1)?);
        }
    }
    if !current.is_empty() {
        sentences.push(Sentence::new(current));
    }
    Ok(sentences)
}

fn optional(field: &str) -> Option<String> {
    (field != ABSENT).then(|| field.replace('_', " "))
}

/// Rebuild document metadata from a file stem when no record exists.
fn document_from_stem(stem: &str, path: &Path) -> Result<Document> {
    let parts: Vec<&str> = stem.split(META_SEPARATOR).collect();
    let &[doc_id, authors, title, language, genres, date] = parts.as_slice() else {
        return Err(CorpusError::Parse {
            path: path.to_path_buf(),
            line: 0,
            message: format!("file name has {} metadata fields, expected 6", parts.len()),
        });
    };
    let mut doc = Document::new(doc_id, "", optional(title), Language::parse(language));
    doc.authors = optional(authors);
    doc.genres = optional(genres);
    doc.date = (date != ABSENT).then(|| date.to_string());
    Ok(doc)
}

/// `<meta_string>.txt`, suffixed with the document's position when another
/// document of this save already took the name.
fn file_name(doc: &Document, index: usize, used: &BTreeSet<String>) -> String {
    let stem = doc.meta_string();
    let plain = format!("{stem}.txt");
    if used.contains(&plain) {
        format!("{stem}_{index}.txt")
    } else {
        plain
    }
}

pub fn save(corpus: &Corpus, corpus_dir: &Path) -> Result<()> {
    fs::create_dir_all(corpus_dir)?;

    let mut documents = BTreeMap::new();
    let mut used = BTreeSet::new();
    for (index, doc) in corpus.documents().enumerate() {
        let file = file_name(doc, index, &used);
        used.insert(file.clone());
        write_atomic(&corpus_dir.join(&file), document_to_string(doc).as_bytes())?;
        documents.insert(
            doc.doc_id.clone(),
            DocumentMeta {
                file,
                title: doc.title.clone(),
                authors: doc.authors.clone(),
                date: doc.date.clone(),
                genres: doc.genres.clone(),
                language: doc.language,
                text: doc.text.clone(),
            },
        );
    }

    let meta = MetaInfo {
        name: corpus.name.clone(),
        root_corpus_path: Some(
            corpus
                .root_corpus_path
                .clone()
                .unwrap_or_else(|| corpus_dir.to_path_buf()),
        ),
        language: corpus.language,
        series_dict: corpus.series_dict().cloned(),
        success_dict: corpus.success_dict.clone(),
        documents,
    };
    write_json_atomic(&corpus_dir.join(META_FILE), &meta)?;

    info!(corpus = %corpus.name, dir = %corpus_dir.display(), documents = corpus.len(), "Saved corpus directory");
    Ok(())
}

pub fn load(corpus_dir: &Path) -> Result<Corpus> {
    let meta: MetaInfo = serde_json::from_str(&read_to_string(&corpus_dir.join(META_FILE))?)?;
    let documents = if meta.documents.is_empty() {
        load_unrecorded(corpus_dir)?
    } else {
        let mut documents = Vec::with_capacity(meta.documents.len());
        for (doc_id, m) in &meta.documents {
            let path = corpus_dir.join(&m.file);
            let sentences = parse_sentences(&read_to_string(&path)?, &path)?;
            let mut doc = Document::new(doc_id.as_str(), m.text.clone(), m.title.clone(), m.language);
            doc.authors = m.authors.clone();
            doc.date = m.date.clone();
            doc.genres = m.genres.clone();
            let doc = doc.with_sentences(sentences);
            debug!(doc_id = %doc.doc_id, sentences = doc.sentences().len(), "Loaded document file");
            documents.push(doc);
        }
        documents
    };

    let mut corpus = Corpus::new(meta.name, meta.language, documents);
    if let Some(series) = meta.series_dict {
        corpus.set_series(series)?;
    }
    corpus.root_corpus_path = meta.root_corpus_path;
    corpus.success_dict = meta.success_dict;

    info!(corpus = %corpus.name, documents = corpus.len(), "Loaded corpus directory");
    Ok(corpus)
}

/// Read every `*.txt` in a directory whose record lists no documents,
/// rebuilding metadata from the file names.
fn load_unrecorded(corpus_dir: &Path) -> Result<Vec<Document>> {
    let mut files: Vec<PathBuf> = fs::read_dir(corpus_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        let sentences = parse_sentences(&read_to_string(path)?, path)?;
        let stem = path
            .file_stem()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        warn!(file = %path.display(), "No metadata record, parsing file name");
        let mut doc = document_from_stem(&stem, path)?.with_sentences(sentences);
        doc.reset_text_from_sentences();
        documents.push(doc);
    }
    Ok(documents)
}
