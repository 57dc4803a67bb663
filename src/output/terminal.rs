// Colored terminal output for corpus statistics, exclusion vocabularies and
// evaluation results. main.rs delegates all formatting here.

use colored::Colorize;

use crate::common_words::{CommonWords, VocabReport};
use crate::corpus::Corpus;
use crate::eval::PrecisionReport;
use crate::pipeline::UnitOutcome;

/// Display size, series and vocabulary statistics of a corpus, with one line
/// per document when `per_document` is set.
pub fn display_corpus_stats(corpus: &Corpus, report: &VocabReport, per_document: bool) {
    println!("\n{}", format!("=== Corpus {} ===", corpus.name).bold());
    println!("  Language: {}", corpus.language);
    println!("  Documents: {}", corpus.len());
    println!("  Tokens: {}", corpus.token_count());
    match corpus.series_dict() {
        Some(series) => {
            let members: usize = series.values().map(Vec::len).sum();
            println!("  Series: {} ({} member documents)", series.len(), members);
        }
        None => println!("  Series: {}", "none".dimmed()),
    }

    println!("\n  Vocabulary without common words ({:?}):", report.threshold);
    println!("    Excluded words: {}", report.excluded_words);
    println!("    Global vocabulary: {}", report.global_vocab_size);
    println!(
        "    Vocabulary per document: {:.1} ± {:.1}",
        report.avg_vocab_size, report.std_vocab_size
    );
    println!(
        "    Tokens per document: {:.1} ± {:.1}",
        report.avg_document_length, report.std_document_length
    );

    if per_document {
        println!(
            "\n  {:<40} {:>8} {:>8}",
            "Document".dimmed(),
            "Vocab".dimmed(),
            "Tokens".dimmed()
        );
        for (doc_id, size) in &report.document_sizes {
            println!(
                "  {:<40} {:>8} {:>8}",
                super::truncate_chars(doc_id, 40),
                size.vocab_size,
                size.document_length
            );
        }
    }
}

/// Display an exclusion vocabulary, at most `limit` words per set.
pub fn display_common_words(words: &CommonWords, limit: usize) {
    println!(
        "\n{}",
        format!("=== Common words ({} distinct) ===", words.distinct_words()).bold()
    );
    match words {
        CommonWords::Global(set) => {
            println!("  {}", preview(set.iter(), limit));
        }
        CommonWords::PerDocument(map) => {
            for (doc_id, set) in map {
                println!(
                    "  {:<30} {:>5}  {}",
                    doc_id,
                    set.len(),
                    preview(set.iter(), limit).dimmed()
                );
            }
        }
    }
}

fn preview<'a>(words: impl Iterator<Item = &'a String>, limit: usize) -> String {
    let shown: Vec<&str> = words.map(String::as_str).collect();
    let line = shown.iter().take(limit).copied().collect::<Vec<_>>().join(", ");
    if shown.len() > limit {
        super::truncate_chars(&format!("{line}, ..."), 160)
    } else {
        super::truncate_chars(&line, 160)
    }
}

/// Display a series retrieval precision report.
pub fn display_precision_report(label: &str, report: &PrecisionReport) {
    println!("\n{}", format!("=== Retrieval precision: {label} ===").bold());
    println!(
        "  Series sampled: {}  Documents: {}  Top-n: {}  Seed: {}",
        report.series_sampled, report.documents_evaluated, report.topn, report.seed
    );
    println!(
        "  Hard (same series): {} ± {:.3}",
        colorize_precision(report.hard_mean),
        report.hard_std
    );
    println!(
        "  Soft (same author): {} ± {:.3}",
        colorize_precision(report.soft_mean),
        report.soft_std
    );
}

/// Display nearest neighbours of one document.
pub fn display_neighbours(doc_id: &str, neighbours: &[(String, f64)]) {
    println!("\n{}", format!("=== Nearest to {doc_id} ===").bold());
    for (i, (other, similarity)) in neighbours.iter().enumerate() {
        println!("  {:>3}. {:<40} {:>7.4}", i + 1, other, similarity);
    }
}

/// Display one line per experiment unit, failures last.
pub fn display_outcomes(outcomes: &[UnitOutcome]) {
    if outcomes.is_empty() {
        println!("No experiment units to run.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Experiment results ({} units) ===", outcomes.len()).bold()
    );
    println!(
        "  {:<60} {:>8} {:>8}",
        "Unit".dimmed(),
        "Hard".dimmed(),
        "Soft".dimmed()
    );
    println!("  {}", "-".repeat(78).dimmed());

    let mut failed = Vec::new();
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => println!(
                "  {:<60} {:>8} {:>8.3}",
                outcome.unit.key().to_string(),
                colorize_precision(report.hard_mean),
                report.soft_mean
            ),
            Err(e) => failed.push((outcome.unit.key().to_string(), format!("{e:#}"))),
        }
    }

    if !failed.is_empty() {
        println!();
        println!("  {} {} units failed", "!".bright_red(), failed.len());
        for (key, error) in &failed {
            println!("    {} {}", key, super::truncate_chars(error, 120).dimmed());
        }
    }
}

fn colorize_precision(value: f64) -> colored::ColoredString {
    let text = format!("{value:.3}");
    if value >= 0.75 {
        text.green().bold()
    } else if value >= 0.5 {
        text.green()
    } else if value >= 0.25 {
        text.yellow()
    } else {
        text.red()
    }
}
