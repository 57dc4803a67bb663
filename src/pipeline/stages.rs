// Cached artifact stages of one experiment unit.
//
// Each stage first looks for its artifact on disk and only recomputes it
// when the file is missing. Stages are synchronous; the runner moves them
// onto blocking tasks.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::ExperimentUnit;
use crate::aspects::{aspects_for_algorithm, combine, project, CombinedVectors};
use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::CorpusError;
use crate::eval::{series_precision, PrecisionReport};
use crate::filter::filter_with;
use crate::store::{dir, json, vectors, ArtifactPaths};

/// Load the annotated base corpus of a dataset, preferring the directory
/// format over the structured record.
pub fn load_base_corpus(paths: &ArtifactPaths, dataset: &str) -> Result<Corpus> {
    let dir_path = paths.dataset_dir(dataset);
    if dir_path.is_dir() {
        return dir::load(&dir_path)
            .with_context(|| format!("Failed to load corpus directory {}", dir_path.display()));
    }
    let json_path = paths.dataset_json(dataset);
    json::load(&json_path).with_context(|| format!("Failed to load base corpus {dataset}"))
}

/// Return the cached value of `load`, or `None` when its file is missing.
fn cached<T>(path: &Path, load: impl FnOnce(&Path) -> crate::error::Result<T>) -> Result<Option<T>> {
    match load(path) {
        Ok(value) => {
            debug!(path = %path.display(), "Using cached artifact");
            Ok(Some(value))
        }
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read artifact {}", path.display())),
    }
}

/// Stage 1: the filtered corpus of the unit.
pub fn build_corpus(config: &Config, unit: &ExperimentUnit) -> Result<Corpus> {
    let paths = config.paths();
    let key = unit.key();
    let path = paths.corpus_json(&key);
    if let Some(corpus) = cached(&path, json::load)? {
        return Ok(corpus);
    }

    let base = load_base_corpus(&paths, &unit.dataset)?;
    let mut corpus = if unit.size == 0 { base } else { base.take(unit.size) };

    if unit.fake_series {
        corpus = corpus
            .drop_small_documents(config.min_sentences)
            .fake_series(unit.subparts)
            .with_context(|| format!("Failed to fake series for {key}"))?;
    } else if corpus.series_dict().is_none() {
        return Err(CorpusError::MissingArgument("series_dict"))
            .with_context(|| format!("Dataset {} has no real series", unit.dataset));
    }

    let filtered = filter_with(
        &corpus,
        unit.filter_mode,
        false,
        None,
        &config.common_words_params(),
    )
    .with_context(|| format!("Failed to filter {key}"))?;

    json::save(&filtered, &path)?;
    info!(key = %key.corpus_key(), documents = filtered.len(), "Built corpus artifact");
    Ok(filtered)
}

/// Stage 2: token projections for the external trainer.
pub fn export_aspects(config: &Config, unit: &ExperimentUnit, corpus: &Corpus) -> Result<()> {
    let path = config.paths().aspects_json(&unit.key());
    if path.exists() {
        debug!(path = %path.display(), "Projections already exported");
        return Ok(());
    }
    let aspects = aspects_for_algorithm(&unit.algorithm)?;
    let projections = project(corpus, &aspects)?;
    json::save_value(&projections, &path)?;
    info!(path = %path.display(), aspects = projections.len(), "Exported aspect projections");
    Ok(())
}

/// Stage 3: combine the trainer's per-aspect vectors into document vectors.
pub fn synthesize(config: &Config, unit: &ExperimentUnit, corpus: &Corpus) -> Result<CombinedVectors> {
    let paths = config.paths();
    let key = unit.key();
    let known: BTreeSet<String> = corpus.doc_ids().map(str::to_string).collect();
    let model = paths.model(&key);
    if let Some(store) = cached(&model, |p| vectors::read_combined(p, &known))? {
        return Ok(store);
    }

    let trained = paths.aspects_vec(&key);
    let tagged = vectors::read_aspect_vectors(&trained, &known)
        .with_context(|| format!("No trainer output for {key}"))?;
    let combined = combine(tagged).with_context(|| format!("Failed to combine vectors for {key}"))?;
    vectors::write_combined(&model, &combined)?;
    Ok(combined)
}

/// Stage 4: series retrieval precision.
pub fn evaluate(
    config: &Config,
    unit: &ExperimentUnit,
    corpus: &Corpus,
    store: &CombinedVectors,
) -> Result<PrecisionReport> {
    let path = config.paths().results(&unit.key());
    let read_report = |p: &Path| -> crate::error::Result<PrecisionReport> {
        let raw = crate::store::read_to_string(p)?;
        Ok(serde_json::from_str(&raw)?)
    };
    if let Some(report) = cached(&path, read_report)? {
        return Ok(report);
    }

    let report = series_precision(store, corpus, config.eval_sample, config.topn, config.seed)?;
    json::save_value(&report, &path)?;
    Ok(report)
}

/// All four stages in order.
pub fn run_unit(config: &Config, unit: &ExperimentUnit) -> Result<PrecisionReport> {
    let corpus = build_corpus(config, unit)?;
    export_aspects(config, unit, &corpus)?;
    let store = synthesize(config, unit, &corpus)?;
    evaluate(config, unit, &corpus, &store)
}
