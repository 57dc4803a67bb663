// Experiment pipeline: build corpus -> export projections -> synthesize -> evaluate.
//
// Every combination of dataset, subparts, size, filter mode, series kind and
// algorithm is one independent unit. Units share nothing but the artifact
// directories, so they run side by side on a fixed-size pool.

pub mod stages;

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::eval::PrecisionReport;
use crate::filter::FilterMode;
use crate::store::ArtifactKey;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentUnit {
    pub dataset: String,
    /// Parts per faked series
    pub subparts: usize,
    /// Documents taken from the base corpus; 0 keeps all of them
    pub size: usize,
    pub filter_mode: FilterMode,
    pub fake_series: bool,
    pub algorithm: String,
}

impl ExperimentUnit {
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey {
            dataset: self.dataset.clone(),
            subparts: self.subparts,
            size: self.size,
            filter_mode: self.filter_mode,
            fake_series: self.fake_series,
            algorithm: Some(self.algorithm.clone()),
        }
    }
}

/// Cartesian product of the experiment dimensions.
pub fn expand_units(
    dataset: &str,
    subparts: usize,
    size: usize,
    fake_series: bool,
    modes: &[FilterMode],
    algorithms: &[String],
) -> Vec<ExperimentUnit> {
    modes
        .iter()
        .flat_map(|mode| {
            algorithms.iter().map(move |algorithm| ExperimentUnit {
                dataset: dataset.to_string(),
                subparts,
                size,
                filter_mode: *mode,
                fake_series,
                algorithm: algorithm.clone(),
            })
        })
        .collect()
}

/// Result of one unit; a failure carries the rendered error chain.
#[derive(Debug)]
pub struct UnitOutcome {
    pub unit: ExperimentUnit,
    pub result: Result<PrecisionReport>,
}

/// Run every unit on a pool of `config.workers` blocking tasks.
///
/// A failed unit is logged and reported; the remaining units carry on.
pub async fn run(config: Arc<Config>, units: Vec<ExperimentUnit>) -> Vec<UnitOutcome> {
    let workers = config.workers.max(1);
    info!(units = units.len(), workers, "Running experiment units");

    let pb = ProgressBar::new(units.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Running [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    let outcomes: Vec<UnitOutcome> = stream::iter(units.into_iter().map(|unit| {
        let config = Arc::clone(&config);
        let pb = pb.clone();
        async move {
            let task_unit = unit.clone();
            let result = tokio::task::spawn_blocking(move || stages::run_unit(&config, &task_unit))
                .await
                .unwrap_or_else(|e| Err(anyhow::anyhow!("worker task failed: {e}")));
            if let Err(e) = &result {
                warn!(key = %unit.key(), error = %format!("{e:#}"), "Experiment unit failed, skipping");
            }
            pb.inc(1);
            UnitOutcome { unit, result }
        }
    }))
    .buffer_unordered(workers)
    .collect()
    .await;

    pb.finish_and_clear();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(succeeded = outcomes.len() - failed, failed, "Experiment run complete");
    outcomes
}
