//! Stage 2: Branch component labeling
//!
//! Face-connected components of the carved mask, labeled `1..=n` in order of
//! each component's first voxel in lexicographic scan order.
//!
//! Sharded two-pass scheme:
//!
//! ```text
//!   shard 0 ──► local labels + forest ─┐
//!   shard 1 ──► local labels + forest ─┼─► merge forests ─► seam unions ─► remap
//!   shard k ──► local labels + forest ─┘   (offset ids)     (row pairs)    (parallel)
//! ```
//!
//! Provisional ids grow with scan order inside a shard and shard offsets grow
//! with shard order, so the smallest provisional id of a component is the id
//! created at its first voxel. Final labels are handed out in that order,
//! which makes them independent of the shard count.

use rayon::prelude::*;

use crate::constants::{rows_per_shard, BACKGROUND};
use crate::error::{DecompositionError, Result};
use crate::grid::{Grid, Label, LabelGrid};
use crate::progress::{ProgressReporter, StageProgress};
use crate::union_find::UnionFind;

/// Connected components of a mask.
#[derive(Clone, Debug, PartialEq)]
pub struct Labeling {
  /// Component label per voxel, 0 for background.
  pub grid: LabelGrid,
  /// Voxel count per label; index 0 is unused and always 0.
  pub sizes: Vec<usize>,
}

impl Labeling {
  /// Number of components.
  #[inline]
  pub fn component_count(&self) -> usize {
    self.sizes.len() - 1
  }

  /// Voxel count of `label`, 0 for background or unknown labels.
  #[inline]
  pub fn size_of(&self, label: Label) -> usize {
    match label {
      BACKGROUND => 0,
      _ => self.sizes.get(label as usize).copied().unwrap_or(0),
    }
  }
}

/// Label the face-connected components of `mask`.
pub fn label_components(mask: &Grid<bool>) -> Result<Labeling> {
  let reporter = ProgressReporter::silent();
  let progress = reporter.stage(0.0, 1.0, 2 * mask.shape().extent()[0]);
  label_components_with_progress(mask, &progress)
}

pub(crate) fn label_components_with_progress(
  mask: &Grid<bool>,
  progress: &StageProgress,
) -> Result<Labeling> {
  let rows = mask.shape().extent()[0];
  label_sharded(mask, rows_per_shard(rows), progress)
}

/// Per-shard result of the first pass.
struct ShardLabels {
  forest: UnionFind,
  /// Voxel count per provisional id (index 0 unused).
  counts: Vec<usize>,
}

/// Label `mask` in shards of `shard_rows` axis-0 rows.
///
/// `progress` is advanced by two units per row, one per pass.
#[tracing::instrument(skip_all, name = "branches::label")]
pub(crate) fn label_sharded(
  mask: &Grid<bool>,
  shard_rows: usize,
  progress: &StageProgress,
) -> Result<Labeling> {
  let shape = *mask.shape();
  if shape.len() > Label::MAX as usize {
    return Err(DecompositionError::TooManyVoxels(shape.len()));
  }

  let [rows, e1, e2] = shape.extent();
  let slab = shape.slab_len();
  let shard_rows = shard_rows.clamp(1, rows);
  let chunk = shard_rows * slab;

  // Pass 1: independent provisional labeling per shard.
  let mut labels: Vec<Label> = vec![BACKGROUND; shape.len()];
  let mut shards: Vec<ShardLabels> = mask
    .data()
    .par_chunks(chunk)
    .zip(labels.par_chunks_mut(chunk))
    .map(|(mask, labels)| {
      let shard = label_shard(mask, labels, e1, e2);
      progress.advance(mask.len() / slab);
      shard
    })
    .collect();

  // Merge: global provisional id = local id + shard offset.
  let mut offsets = Vec::with_capacity(shards.len());
  let mut provisional = 0usize;
  for shard in &shards {
    offsets.push(provisional);
    provisional += shard.forest.len();
  }

  let mut forest = UnionFind::with_len(provisional);
  for (shard, &offset) in shards.iter_mut().zip(&offsets) {
    for local in 1..=shard.forest.len() as Label {
      let root = shard.forest.find(local);
      if root != local {
        forest.union(local + offset as Label, root + offset as Label);
      }
    }
  }

  let mut seam_unions = 0usize;
  for k in 1..shards.len() {
    let start = k * chunk;
    let below = &labels[start - slab..start];
    let above = &labels[start..start + slab];
    for (&a, &b) in below.iter().zip(above) {
      if a != BACKGROUND
        && b != BACKGROUND
        && forest.union(a + offsets[k - 1] as Label, b + offsets[k] as Label)
      {
        seam_unions += 1;
      }
    }
  }

  // Final ids in order of the smallest provisional id per class.
  let mut root_label: Vec<Label> = vec![BACKGROUND; provisional + 1];
  let mut remap: Vec<Label> = vec![BACKGROUND; provisional + 1];
  let mut sizes: Vec<usize> = vec![0];
  for id in 1..=provisional as Label {
    let root = forest.find(id) as usize;
    if root_label[root] == BACKGROUND {
      sizes.push(0);
      root_label[root] = (sizes.len() - 1) as Label;
    }
    remap[id as usize] = root_label[root];
  }
  for (shard, &offset) in shards.iter().zip(&offsets) {
    for (local, &count) in shard.counts.iter().enumerate().skip(1) {
      sizes[remap[local + offset] as usize] += count;
    }
  }

  // Pass 2: rewrite provisional ids to final labels.
  labels
    .par_chunks_mut(chunk)
    .zip(offsets.par_iter())
    .for_each(|(labels, &offset)| {
      for label in labels.iter_mut().filter(|l| **l != BACKGROUND) {
        *label = remap[*label as usize + offset];
      }
      progress.advance(labels.len() / slab);
    });

  tracing::debug!(
    shards = shards.len(),
    provisional,
    seam_unions,
    components = sizes.len() - 1,
    "labeled components"
  );
  progress.finish();

  Ok(Labeling {
    grid: Grid::from_parts(shape, labels),
    sizes,
  })
}

/// Raster-scan one shard, joining each voxel to its backward face
/// neighbours (axis 2, axis 1, axis 0) inside the shard.
fn label_shard(mask: &[bool], labels: &mut [Label], e1: usize, e2: usize) -> ShardLabels {
  let slab = e1 * e2;
  let mut forest = UnionFind::new();
  let mut counts = vec![0usize];

  for offset in 0..mask.len() {
    if !mask[offset] {
      continue;
    }

    let i2 = offset % e2;
    let i1 = (offset / e2) % e1;
    let backward = [
      (i2 > 0).then(|| offset - 1),
      (i1 > 0).then(|| offset - e2),
      (offset >= slab).then(|| offset - slab),
    ];

    let mut current = BACKGROUND;
    for neighbor in backward.into_iter().flatten() {
      let label = labels[neighbor];
      if label == BACKGROUND {
        continue;
      }
      if current == BACKGROUND {
        current = label;
      } else {
        forest.union(current, label);
      }
    }
    if current == BACKGROUND {
      current = forest.make_set();
      counts.push(0);
    }

    labels[offset] = current;
    counts[current as usize] += 1;
  }

  ShardLabels { forest, counts }
}

#[cfg(test)]
#[path = "label_test.rs"]
mod label_test;
