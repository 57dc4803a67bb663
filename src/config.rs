use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::common_words::{CommonWordsParams, Threshold};
use crate::error::{CorpusError, Result};
use crate::store::ArtifactPaths;

/// Returns the default root for all artifacts.
/// Uses the platform data directory: ~/.local/share/book-ablation/ on Linux.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("book-ablation")
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. Every value has a default;
/// malformed numbers are rejected instead of silently replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Annotated and filtered corpora (BOOK_ABLATION_CORPORA_DIR)
    pub corpora_dir: PathBuf,
    /// Projections, trainer output and combined vector stores
    pub models_dir: PathBuf,
    /// Evaluation reports
    pub results_dir: PathBuf,
    /// Document-frequency share for `common_words_doc_freq`
    pub global_share: f64,
    /// Share that marks a word as general vocabulary
    pub general_words_share: f64,
    /// Size of the experiment worker pool
    pub workers: usize,
    /// Neighbours considered per document in retrieval evaluation
    pub topn: usize,
    /// Seed for every sampling step
    pub seed: u64,
    /// Documents with fewer sentences are dropped before faking series
    pub min_sentences: usize,
    /// Number of series sampled for evaluation
    pub eval_sample: usize,
}

impl Default for Config {
    fn default() -> Self {
        let root = default_data_dir();
        Self {
            corpora_dir: root.join("corpora"),
            models_dir: root.join("models"),
            results_dir: root.join("results"),
            global_share: 0.25,
            general_words_share: 0.25,
            workers: 4,
            topn: 10,
            seed: 42,
            min_sentences: 20,
            eval_sample: 50,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        let config = Self {
            corpora_dir: path("BOOK_ABLATION_CORPORA_DIR", defaults.corpora_dir),
            models_dir: path("BOOK_ABLATION_MODELS_DIR", defaults.models_dir),
            results_dir: path("BOOK_ABLATION_RESULTS_DIR", defaults.results_dir),
            global_share: parse_var(&lookup, "BOOK_ABLATION_GLOBAL_SHARE", defaults.global_share)?,
            general_words_share: parse_var(
                &lookup,
                "BOOK_ABLATION_GENERAL_WORDS_SHARE",
                defaults.general_words_share,
            )?,
            workers: parse_var(&lookup, "BOOK_ABLATION_WORKERS", defaults.workers)?,
            topn: parse_var(&lookup, "BOOK_ABLATION_TOPN", defaults.topn)?,
            seed: parse_var(&lookup, "BOOK_ABLATION_SEED", defaults.seed)?,
            min_sentences: parse_var(&lookup, "BOOK_ABLATION_MIN_SENTENCES", defaults.min_sentences)?,
            eval_sample: parse_var(&lookup, "BOOK_ABLATION_EVAL_SAMPLE", defaults.eval_sample)?,
        };
        config.require_valid()?;
        Ok(config)
    }

    /// Check value ranges that the type alone does not capture.
    pub fn require_valid(&self) -> Result<()> {
        for (name, share) in [
            ("BOOK_ABLATION_GLOBAL_SHARE", self.global_share),
            ("BOOK_ABLATION_GENERAL_WORDS_SHARE", self.general_words_share),
        ] {
            if !(0.0..=1.0).contains(&share) {
                return Err(CorpusError::Configuration(format!(
                    "{name} must be between 0 and 1, got {share}"
                )));
            }
        }
        if self.workers == 0 {
            return Err(CorpusError::Configuration(
                "BOOK_ABLATION_WORKERS must be at least 1".into(),
            ));
        }
        if self.topn == 0 {
            return Err(CorpusError::Configuration(
                "BOOK_ABLATION_TOPN must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Check that the annotated base corpora are where the pipeline expects them.
    pub fn require_corpora(&self) -> Result<()> {
        if !self.corpora_dir.is_dir() {
            return Err(CorpusError::Configuration(format!(
                "corpora directory {} does not exist.\n\
                 Set BOOK_ABLATION_CORPORA_DIR in your .env file or run `book-ablation convert`.",
                self.corpora_dir.display()
            )));
        }
        Ok(())
    }

    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.corpora_dir, &self.models_dir, &self.results_dir)
    }

    pub fn common_words_params(&self) -> CommonWordsParams {
        CommonWordsParams {
            global: Threshold::Share(self.global_share),
            general_words_share: self.general_words_share,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CorpusError::Configuration(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.topn, 10);
        assert_eq!(config.seed, 42);
        assert!((config.global_share - 0.25).abs() < 1e-10);
        assert!(config.corpora_dir.ends_with("book-ablation/corpora"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BOOK_ABLATION_CORPORA_DIR", "/data/corpora"),
            ("BOOK_ABLATION_WORKERS", "8"),
            ("BOOK_ABLATION_GLOBAL_SHARE", "0.5"),
        ]))
        .unwrap();
        assert_eq!(config.corpora_dir, PathBuf::from("/data/corpora"));
        assert_eq!(config.workers, 8);
        assert_eq!(config.common_words_params().global, Threshold::Share(0.5));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = Config::from_lookup(lookup(&[("BOOK_ABLATION_TOPN", "ten")])).unwrap_err();
        assert!(matches!(err, CorpusError::Configuration(m) if m.contains("BOOK_ABLATION_TOPN")));
    }

    #[test]
    fn test_share_out_of_range() {
        let err = Config::from_lookup(lookup(&[("BOOK_ABLATION_GENERAL_WORDS_SHARE", "1.5")]));
        assert!(matches!(err, Err(CorpusError::Configuration(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Config::from_lookup(lookup(&[("BOOK_ABLATION_WORKERS", "0")])).is_err());
    }
}
