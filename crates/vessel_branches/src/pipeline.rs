//! Decomposition pipeline: validate, carve, label, filter, connect.
//!
//! ```text
//! ┌──────────────┐   ┌─────────┐   ┌─────────┐   ┌──────────┐   ┌───────────┐
//! │   validate   │──►│  carve  │──►│  label  │──►│  filter  │──►│  connect  │
//! │ config+juncs │   │  0.15   │   │  0.35   │   │   0.15   │   │   0.35    │
//! └──────────────┘   └─────────┘   └─────────┘   └──────────┘   └───────────┘
//!                         │                                            │
//!                         ▼                                            ▼
//!                     territory                          branches + connectivity
//! ```
//!
//! Numbers are the stage shares of the progress range. The input grid is
//! only read; every output is a fresh allocation.

use std::collections::BTreeMap;

use web_time::Instant;

use crate::carve::carve_with_progress;
use crate::config::DecompositionConfig;
use crate::connectivity::{extract_connectivity_with_progress, ConnectivityMap};
use crate::constants::{CARVE_WEIGHT, CONNECT_WEIGHT, FILTER_WEIGHT, LABEL_WEIGHT};
use crate::error::{DecompositionError, Result};
use crate::filter::filter_fragments_with_progress;
use crate::grid::{Grid, Label, LabelGrid, StructureValue};
use crate::junction::{JunctionId, JunctionSet};
use crate::label::label_components_with_progress;
use crate::progress::{ProgressFn, ProgressReporter};

/// Counters and timings of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecompositionStats {
  pub total_voxels: usize,
  pub structure_voxels: usize,
  pub carved_voxels: usize,
  /// Components before filtering.
  pub components_found: usize,
  pub components_removed: usize,
  pub demoted_voxels: usize,
  pub surviving_branches: usize,
  /// Surviving branches touching no junction shell.
  pub isolated_branches: usize,
  /// (branch, junction) pairs in the connectivity map.
  pub connections: usize,
  pub carve_us: u64,
  pub label_us: u64,
  pub filter_us: u64,
  pub connect_us: u64,
}

impl DecompositionStats {
  /// Wall time of all stages.
  pub fn total_us(&self) -> u64 {
    self.carve_us + self.label_us + self.filter_us + self.connect_us
  }
}

/// Result of a decomposition run.
#[derive(Clone, Debug, PartialEq)]
pub struct Decomposition {
  /// Branch label per voxel, 0 for background and junction territory.
  pub branches: LabelGrid,
  /// Nearest junction of every carved voxel.
  pub territory: Grid<Option<JunctionId>>,
  pub connectivity: ConnectivityMap,
  /// Voxel count per surviving branch.
  pub branch_sizes: BTreeMap<Label, usize>,
  pub stats: DecompositionStats,
}

impl Decomposition {
  /// Surviving branch labels, ascending.
  pub fn branch_labels(&self) -> impl Iterator<Item = Label> + '_ {
    self.branch_sizes.keys().copied()
  }

  /// Surviving branches touching no junction shell, ascending.
  pub fn isolated_branches(&self) -> Vec<Label> {
    self
      .branch_labels()
      .filter(|&label| self.connectivity.junctions_of(label).is_none())
      .collect()
  }
}

/// Decompose `grid` into branches separated at `junctions`.
pub fn decompose<T: StructureValue>(
  grid: &Grid<T>,
  junctions: &JunctionSet,
  config: &DecompositionConfig,
) -> Result<Decomposition> {
  run(grid, junctions, config, ProgressReporter::silent())
}

/// [`decompose`] reporting progress fractions to `progress`.
///
/// Values are non-decreasing and end at exactly `1.0` on success.
pub fn decompose_with_progress<T: StructureValue>(
  grid: &Grid<T>,
  junctions: &JunctionSet,
  config: &DecompositionConfig,
  progress: ProgressFn,
) -> Result<Decomposition> {
  run(grid, junctions, config, ProgressReporter::new(Some(progress)))
}

fn run<T: StructureValue>(
  grid: &Grid<T>,
  junctions: &JunctionSet,
  config: &DecompositionConfig,
  reporter: ProgressReporter,
) -> Result<Decomposition> {
  config.validate()?;
  junctions.validate(grid.shape())?;
  if grid.len() > Label::MAX as usize {
    return Err(DecompositionError::TooManyVoxels(grid.len()));
  }

  match config.num_threads {
    Some(threads) => {
      let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("vessel-branches-{i}"))
        .build()
        .map_err(|e| DecompositionError::ThreadPool(e.to_string()))?;
      pool.install(|| run_stages(grid, junctions, config, &reporter))
    }
    None => run_stages(grid, junctions, config, &reporter),
  }
}

#[tracing::instrument(skip_all, name = "branches::decompose")]
fn run_stages<T: StructureValue>(
  grid: &Grid<T>,
  junctions: &JunctionSet,
  config: &DecompositionConfig,
  reporter: &ProgressReporter,
) -> Result<Decomposition> {
  let rows = grid.shape().extent()[0];
  if junctions.is_empty() {
    tracing::warn!("no junctions given; every component becomes one unconnected branch");
  }

  let carve_start = Instant::now();
  let carved = carve_with_progress(
    grid,
    junctions,
    config.inner_scale,
    &reporter.stage(0.0, CARVE_WEIGHT, rows),
  );
  let carve_us = carve_start.elapsed().as_micros() as u64;

  let label_start = Instant::now();
  let labeling = label_components_with_progress(
    &carved.mask,
    &reporter.stage(CARVE_WEIGHT, LABEL_WEIGHT, 2 * rows),
  )?;
  let label_us = label_start.elapsed().as_micros() as u64;
  let components_found = labeling.component_count();

  let filter_start = Instant::now();
  let filtered = filter_fragments_with_progress(
    labeling,
    config.min_component_size,
    config.compact_labels,
    &reporter.stage(CARVE_WEIGHT + LABEL_WEIGHT, FILTER_WEIGHT, rows),
  );
  let filter_us = filter_start.elapsed().as_micros() as u64;
  if filtered.sizes.is_empty() && components_found > 0 {
    tracing::warn!(
      components_found,
      min_component_size = config.min_component_size,
      "every branch was filtered out"
    );
  }

  let connect_start = Instant::now();
  let connectivity = extract_connectivity_with_progress(
    &filtered.grid,
    junctions,
    config.inner_scale,
    config.outer_scale,
    &reporter.stage(1.0 - CONNECT_WEIGHT, CONNECT_WEIGHT, junctions.len()),
  );
  let connect_us = connect_start.elapsed().as_micros() as u64;
  reporter.report(1.0);

  let isolated_branches = filtered
    .sizes
    .keys()
    .filter(|&&label| connectivity.junctions_of(label).is_none())
    .count();

  let stats = DecompositionStats {
    total_voxels: grid.len(),
    structure_voxels: carved.structure_voxels,
    carved_voxels: carved.carved_voxels,
    components_found,
    components_removed: filtered.removed_components,
    demoted_voxels: filtered.demoted_voxels,
    surviving_branches: filtered.sizes.len(),
    isolated_branches,
    connections: connectivity.connection_count(),
    carve_us,
    label_us,
    filter_us,
    connect_us,
  };

  tracing::debug!(
    branches = stats.surviving_branches,
    isolated = stats.isolated_branches,
    connections = stats.connections,
    total_us = stats.total_us(),
    "decomposition complete"
  );

  Ok(Decomposition {
    branches: filtered.grid,
    territory: carved.territory,
    connectivity,
    branch_sizes: filtered.sizes,
    stats,
  })
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
