use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use book_ablation::aspects::{aspects_for_algorithm, combine, project};
use book_ablation::common_words::{vocab_report, CommonWords, Threshold};
use book_ablation::config::Config;
use book_ablation::corpus::{annotate_corpus, Corpus, SimpleTagger};
use book_ablation::eval::{most_similar, series_precision};
use book_ablation::filter::{compute_common_words, filter_with, FilterMode};
use book_ablation::output::terminal;
use book_ablation::pipeline::{self, expand_units};
use book_ablation::store::{dir, json, vectors};

/// book-ablation: which parts of a book make it recognisable?
///
/// Filters annotated book corpora by token class or shared vocabulary,
/// exports per-aspect projections for an external vector trainer, recombines
/// the trained aspect vectors and measures series retrieval precision.
#[derive(Parser)]
#[command(name = "book-ablation", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show size, series and vocabulary statistics of a corpus
    Stats {
        /// Corpus directory or .json record
        corpus: PathBuf,

        /// Document-frequency share of the excluded common words
        #[arg(long, default_value = "0.25")]
        share: f64,

        /// Also list vocabulary size and length of every document
        #[arg(long)]
        per_document: bool,
    },

    /// Write a filtered copy of a corpus
    Filter {
        corpus: PathBuf,
        output: PathBuf,

        /// Filter mode or alias (e.g. nouns, sw, cw_str)
        #[arg(long)]
        mode: FilterMode,

        /// Replace dropped tokens with the sentinel instead of removing them
        #[arg(long)]
        masking: bool,

        /// Precomputed exclusion vocabulary for the `common_words` mode
        #[arg(long)]
        common_words: Option<PathBuf>,
    },

    /// Compute the exclusion vocabulary of a common-word mode
    CommonWords {
        corpus: PathBuf,

        #[arg(long, default_value = "cw_df")]
        mode: FilterMode,

        /// Write the vocabulary as JSON instead of only printing it
        #[arg(long)]
        output: Option<PathBuf>,

        /// Words shown per set
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Split every document into consecutive parts forming a series
    FakeSeries {
        corpus: PathBuf,
        output: PathBuf,

        #[arg(long, default_value = "2")]
        parts: usize,

        /// Drop documents with fewer sentences first (default: BOOK_ABLATION_MIN_SENTENCES)
        #[arg(long)]
        min_sentences: Option<usize>,
    },

    /// Export per-aspect token projections for the vector trainer
    Aspects {
        corpus: PathBuf,
        output: PathBuf,

        /// book2vec[_adv][_wo_<aspect>], doc2vec, avg_wv2doc or random
        #[arg(long, default_value = "book2vec")]
        algorithm: String,
    },

    /// Combine trained per-aspect vectors into one vector per document
    Combine {
        /// Trainer output with `*dt_<doc_id>_<aspect>` rows
        vectors: PathBuf,
        output: PathBuf,

        /// Corpus the vectors were trained on
        #[arg(long)]
        corpus: PathBuf,
    },

    /// Measure series retrieval precision of a vector store
    Evaluate {
        model: PathBuf,

        #[arg(long)]
        corpus: PathBuf,

        /// Show the nearest neighbours of one document instead
        #[arg(long)]
        doc: Option<String>,

        /// Number of series sampled (default: BOOK_ABLATION_EVAL_SAMPLE)
        #[arg(long)]
        sample: Option<usize>,
    },

    /// Run the full experiment grid with cached artifacts
    Run {
        #[arg(long)]
        dataset: String,

        /// Parts per faked series
        #[arg(long, default_value = "2")]
        subparts: usize,

        /// Documents taken from the base corpus (0 = all)
        #[arg(long, default_value = "0")]
        size: usize,

        /// Use real series from the dataset instead of faking them
        #[arg(long)]
        real_series: bool,

        /// Comma-separated filter modes
        #[arg(long, value_delimiter = ',', default_value = "no_filter")]
        modes: Vec<FilterMode>,

        /// Comma-separated vectorization algorithms
        #[arg(long, value_delimiter = ',', default_value = "book2vec")]
        algorithms: Vec<String>,

        /// Number of units run in parallel (default: BOOK_ABLATION_WORKERS)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Convert a corpus between the JSON record and the directory format
    Convert { input: PathBuf, output: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("book_ablation=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Stats {
            corpus,
            share,
            per_document,
        } => {
            let corpus = load_corpus(&corpus)?;
            let report = vocab_report(&corpus, Threshold::Share(share))?;
            terminal::display_corpus_stats(&corpus, &report, per_document);
        }

        Commands::Filter {
            corpus,
            output,
            mode,
            masking,
            common_words,
        } => {
            let source = load_corpus(&corpus)?;
            let words: Option<CommonWords> = match common_words {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    Some(serde_json::from_str(&raw)?)
                }
                None => None,
            };
            let filtered = filter_with(
                &source,
                mode,
                masking,
                words.as_ref(),
                &config.common_words_params(),
            )?;
            save_corpus(&filtered, &output)?;
            println!(
                "Filtered {} with {} ({} -> {} tokens), saved to {}",
                source.name,
                mode.to_string().bold(),
                source.token_count(),
                filtered.token_count(),
                output.display()
            );
        }

        Commands::CommonWords {
            corpus,
            mode,
            output,
            limit,
        } => {
            if !mode.is_computed_common_words() {
                anyhow::bail!("{mode} does not compute a common-word vocabulary");
            }
            let corpus = load_corpus(&corpus)?;
            let words = compute_common_words(&corpus, mode, &config.common_words_params())?;
            terminal::display_common_words(&words, limit);
            if let Some(path) = output {
                json::save_value(&words, &path)?;
                println!("\nSaved to {}", path.display());
            }
        }

        Commands::FakeSeries {
            corpus,
            output,
            parts,
            min_sentences,
        } => {
            let corpus = load_corpus(&corpus)?;
            let min_sentences = min_sentences.unwrap_or(config.min_sentences);
            let faked = corpus.drop_small_documents(min_sentences).fake_series(parts)?;
            save_corpus(&faked, &output)?;
            println!(
                "Split {} documents into {} parts each ({} documents), saved to {}",
                faked.series_dict().map(|s| s.len()).unwrap_or(0),
                parts,
                faked.len(),
                output.display()
            );
        }

        Commands::Aspects {
            corpus,
            output,
            algorithm,
        } => {
            let corpus = load_corpus(&corpus)?;
            let aspects = aspects_for_algorithm(&algorithm)?;
            let projections = project(&corpus, &aspects)?;
            json::save_value(&projections, &output)?;
            let names: Vec<&str> = aspects.iter().map(|a| a.name()).collect();
            println!(
                "Exported aspects [{}] for {} documents to {}",
                names.join(", "),
                corpus.len(),
                output.display()
            );
        }

        Commands::Combine {
            vectors: input,
            output,
            corpus,
        } => {
            let corpus = load_corpus(&corpus)?;
            let known = known_ids(&corpus);
            let tagged = vectors::read_aspect_vectors(&input, &known)?;
            let combined = combine(tagged)?;
            vectors::write_combined(&output, &combined)?;
            println!(
                "Combined {} documents on base aspect {} (dim {}), saved to {}",
                combined.documents().count(),
                combined.base.to_string().bold(),
                combined.dim,
                output.display()
            );
        }

        Commands::Evaluate {
            model,
            corpus,
            doc,
            sample,
        } => {
            let corpus = load_corpus(&corpus)?;
            let store = vectors::read_combined(&model, &known_ids(&corpus))?;
            match doc {
                Some(doc_id) => {
                    let neighbours = most_similar(&store, &doc_id, config.topn)?;
                    terminal::display_neighbours(&doc_id, &neighbours);
                }
                None => {
                    let report = series_precision(
                        &store,
                        &corpus,
                        sample.unwrap_or(config.eval_sample),
                        config.topn,
                        config.seed,
                    )?;
                    terminal::display_precision_report(&corpus.name, &report);
                }
            }
        }

        Commands::Run {
            dataset,
            subparts,
            size,
            real_series,
            modes,
            algorithms,
            workers,
        } => {
            let mut config = config;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            config.require_valid()?;
            config.require_corpora()?;
            for algorithm in &algorithms {
                aspects_for_algorithm(algorithm)?;
            }

            let units = expand_units(&dataset, subparts, size, !real_series, &modes, &algorithms);
            println!(
                "Running {} experiment units on {} workers...",
                units.len(),
                config.workers
            );
            let outcomes = pipeline::run(Arc::new(config), units).await;
            terminal::display_outcomes(&outcomes);

            if outcomes.iter().any(|o| o.result.is_err()) {
                println!(
                    "{}",
                    "Units without trainer output stop at synthesis; train the exported projections and rerun."
                        .dimmed()
                );
            }
        }

        Commands::Convert { input, output } => {
            let corpus = load_corpus(&input)?;
            save_corpus(&corpus, &output)?;
            println!("Converted {} to {}", input.display(), output.display());
        }
    }

    Ok(())
}

/// Load a corpus from a directory or a .json record, annotating any
/// documents that arrive as plain text.
fn load_corpus(path: &Path) -> Result<Corpus> {
    let mut corpus = if path.is_dir() {
        dir::load(path)
    } else {
        json::load(path)
    }
    .with_context(|| format!("Failed to load corpus {}", path.display()))?;

    let annotated = annotate_corpus(&mut corpus, &SimpleTagger::new());
    if annotated > 0 {
        info!(documents = annotated, "Annotated plain-text documents");
    }
    Ok(corpus)
}

/// Save as a .json record when the path says so, as a directory otherwise.
fn save_corpus(corpus: &Corpus, path: &Path) -> Result<()> {
    if path.extension().is_some_and(|ext| ext == "json") {
        json::save(corpus, path)?;
    } else {
        dir::save(corpus, path)?;
    }
    Ok(())
}

fn known_ids(corpus: &Corpus) -> BTreeSet<String> {
    corpus.doc_ids().map(str::to_string).collect()
}
