//! Stage 3: Fragment filtering
//!
//! Components smaller than the minimum size are demoted to background. The
//! survivors keep their labels, or are renumbered `1..=k` in label order when
//! compaction is requested.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::constants::{rows_per_shard, BACKGROUND};
use crate::grid::{Grid, Label, LabelGrid};
use crate::label::Labeling;
use crate::progress::{ProgressReporter, StageProgress};

/// Output of the filtering stage.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterOutput {
  /// Surviving branch labels, 0 elsewhere.
  pub grid: LabelGrid,
  /// Voxel count per surviving label.
  pub sizes: BTreeMap<Label, usize>,
  /// Components demoted for being too small.
  pub removed_components: usize,
  /// Voxels belonging to demoted components.
  pub demoted_voxels: usize,
}

/// Drop components of fewer than `min_size` voxels.
pub fn filter_fragments(labeling: Labeling, min_size: usize, compact: bool) -> FilterOutput {
  let reporter = ProgressReporter::silent();
  let progress = reporter.stage(0.0, 1.0, labeling.grid.shape().extent()[0]);
  filter_fragments_with_progress(labeling, min_size, compact, &progress)
}

#[tracing::instrument(skip_all, name = "branches::filter")]
pub(crate) fn filter_fragments_with_progress(
  labeling: Labeling,
  min_size: usize,
  compact: bool,
  progress: &StageProgress,
) -> FilterOutput {
  let Labeling { grid, sizes: counts } = labeling;
  let shape = *grid.shape();

  let mut remap: Vec<Label> = vec![BACKGROUND; counts.len()];
  let mut sizes = BTreeMap::new();
  let mut removed_components = 0;
  let mut demoted_voxels = 0;
  for (label, &count) in counts.iter().enumerate().skip(1) {
    if count < min_size {
      removed_components += 1;
      demoted_voxels += count;
      continue;
    }
    let target = if compact {
      sizes.len() as Label + 1
    } else {
      label as Label
    };
    remap[label] = target;
    sizes.insert(target, count);
  }

  let mut data = grid.into_vec();
  let chunk = rows_per_shard(shape.extent()[0]) * shape.slab_len();
  data.par_chunks_mut(chunk).for_each(|labels| {
    for label in labels.iter_mut() {
      *label = remap[*label as usize];
    }
    progress.advance(labels.len() / shape.slab_len());
  });

  tracing::debug!(
    min_size,
    compact,
    removed_components,
    demoted_voxels,
    surviving = sizes.len(),
    "filtered fragments"
  );
  progress.finish();

  FilterOutput {
    grid: Grid::from_parts(shape, data),
    sizes,
    removed_components,
    demoted_voxels,
  }
}
