// Structured JSON record of a whole corpus.
//
// The record carries the entity index for readers outside this crate; on load
// it is ignored and rebuilt from the sentences.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{read_to_string, write_json_atomic};
use crate::corpus::{Corpus, Document, EntityIndex, Language, SeriesDict};
use crate::error::Result;

#[derive(Serialize)]
struct RecordOut<'a> {
    name: &'a str,
    language: Language,
    documents: BTreeMap<&'a str, &'a Document>,
    document_entities: &'a EntityIndex,
    series_dict: Option<&'a SeriesDict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_corpus_path: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_dict: Option<&'a serde_json::Value>,
}

#[derive(Deserialize)]
struct RecordIn {
    name: String,
    #[serde(default)]
    language: Language,
    documents: BTreeMap<String, Document>,
    #[serde(default)]
    series_dict: Option<SeriesDict>,
    #[serde(default)]
    root_corpus_path: Option<PathBuf>,
    #[serde(default)]
    success_dict: Option<serde_json::Value>,
}

pub fn to_string(corpus: &Corpus) -> Result<String> {
    let record = RecordOut {
        name: &corpus.name,
        language: corpus.language,
        documents: corpus.documents().map(|d| (d.doc_id.as_str(), d)).collect(),
        document_entities: corpus.document_entities(),
        series_dict: corpus.series_dict(),
        root_corpus_path: corpus.root_corpus_path.as_ref(),
        success_dict: corpus.success_dict.as_ref(),
    };
    Ok(serde_json::to_string_pretty(&record)?)
}

pub fn from_str(raw: &str) -> Result<Corpus> {
    let record: RecordIn = serde_json::from_str(raw)?;
    let mut corpus = Corpus::new(record.name, record.language, record.documents.into_values());
    if let Some(series) = record.series_dict {
        corpus.set_series(series)?;
    }
    corpus.root_corpus_path = record.root_corpus_path;
    corpus.success_dict = record.success_dict;
    Ok(corpus)
}

pub fn save(corpus: &Corpus, path: &Path) -> Result<()> {
    let body = to_string(corpus)?;
    super::write_atomic(path, body.as_bytes())?;
    info!(corpus = %corpus.name, path = %path.display(), "Saved corpus record");
    Ok(())
}

pub fn load(path: &Path) -> Result<Corpus> {
    let raw = read_to_string(path)?;
    let corpus = from_str(&raw)?;
    info!(corpus = %corpus.name, documents = corpus.len(), "Loaded corpus record");
    Ok(corpus)
}

/// Write any serializable value as pretty JSON (projections, reports).
pub fn save_value<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    write_json_atomic(path, value)
}
