// Deterministic artifact names and where each artifact lives.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::filter::FilterMode;

/// Identity of one experiment artifact. Rendered as
/// `{dataset}_{subparts}_{size}_{filter_mode}_{fake|real}_{algorithm}`; the
/// algorithm part is empty for corpus artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub dataset: String,
    pub subparts: usize,
    pub size: usize,
    pub filter_mode: FilterMode,
    pub fake_series: bool,
    pub algorithm: Option<String>,
}

impl ArtifactKey {
    /// Key of the filtered corpus this artifact is built from.
    pub fn corpus_key(&self) -> ArtifactKey {
        ArtifactKey {
            algorithm: None,
            ..self.clone()
        }
    }

    pub fn series_label(&self) -> &'static str {
        if self.fake_series {
            "fake"
        } else {
            "real"
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}_{}",
            self.dataset,
            self.subparts,
            self.size,
            self.filter_mode,
            self.series_label(),
            self.algorithm.as_deref().unwrap_or("")
        )
    }
}

/// Root directories of the three artifact families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub corpora: PathBuf,
    pub models: PathBuf,
    pub results: PathBuf,
}

impl ArtifactPaths {
    pub fn new(corpora: impl AsRef<Path>, models: impl AsRef<Path>, results: impl AsRef<Path>) -> Self {
        Self {
            corpora: corpora.as_ref().to_path_buf(),
            models: models.as_ref().to_path_buf(),
            results: results.as_ref().to_path_buf(),
        }
    }

    /// Annotated base corpus of a dataset, directory format.
    pub fn dataset_dir(&self, dataset: &str) -> PathBuf {
        self.corpora.join(dataset)
    }

    /// Annotated base corpus of a dataset, structured record.
    pub fn dataset_json(&self, dataset: &str) -> PathBuf {
        self.corpora.join(format!("{dataset}.json"))
    }

    pub fn corpus_json(&self, key: &ArtifactKey) -> PathBuf {
        self.corpora.join(format!("{}.json", key.corpus_key()))
    }

    pub fn corpus_dir(&self, key: &ArtifactKey) -> PathBuf {
        self.corpora.join(key.corpus_key().to_string())
    }

    pub fn model(&self, key: &ArtifactKey) -> PathBuf {
        self.models.join(format!("{key}.model"))
    }

    /// Token projections handed to the trainer.
    pub fn aspects_json(&self, key: &ArtifactKey) -> PathBuf {
        self.models.join(format!("{key}.aspects.json"))
    }

    /// Per-aspect vectors produced by the trainer.
    pub fn aspects_vec(&self, key: &ArtifactKey) -> PathBuf {
        self.models.join(format!("{key}.aspects.vec"))
    }

    pub fn results(&self, key: &ArtifactKey) -> PathBuf {
        self.results.join(format!("{key}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ArtifactKey {
        ArtifactKey {
            dataset: "german_books".into(),
            subparts: 2,
            size: 100,
            filter_mode: FilterMode::CommonWordsStrict,
            fake_series: true,
            algorithm: Some("book2vec".into()),
        }
    }

    #[test]
    fn test_render() {
        assert_eq!(
            key().to_string(),
            "german_books_2_100_common_words_strict_fake_book2vec"
        );
        assert_eq!(
            key().corpus_key().to_string(),
            "german_books_2_100_common_words_strict_fake_"
        );
    }

    #[test]
    fn test_paths() {
        let paths = ArtifactPaths::new("/c", "/m", "/r");
        let k = key();
        assert_eq!(
            paths.corpus_json(&k),
            PathBuf::from("/c/german_books_2_100_common_words_strict_fake_.json")
        );
        assert_eq!(
            paths.model(&k),
            PathBuf::from("/m/german_books_2_100_common_words_strict_fake_book2vec.model")
        );
        assert_eq!(paths.dataset_dir("german_books"), PathBuf::from("/c/german_books"));
    }
}
