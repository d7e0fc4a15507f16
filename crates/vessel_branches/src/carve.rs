//! Stage 1: Junction core carving
//!
//! Removes the union of all junction inner spheres from the structure mask.
//! Inner-sphere voxels become junction territory: a hard wall for labeling.
//!
//! ```text
//!   structure            inner spheres            carved mask
//!  ─────────────         ( J1 )     ( J2 )        ──   ─────   ──
//!  ─────────────   ──►   ( .. )     ( .. )   ──►  ──   ─────   ──
//!  ─────────────         ( .. )     ( .. )        ──   ─────   ──
//! ```
//!
//! Every structure voxel with `distance <= inner_scale * radius` for *any*
//! junction is carved. The territory grid additionally records the nearest
//! such junction (ties go to the lower id); it is diagnostic only and does
//! not influence later stages.

use glam::I64Vec3;
use rayon::prelude::*;

use crate::constants::rows_per_shard;
use crate::geometry::{distance_squared, IndexBox};
use crate::grid::{Grid, StructureValue};
use crate::junction::{JunctionId, JunctionSet};
use crate::progress::{ProgressReporter, StageProgress};

/// Output of the carving stage.
#[derive(Clone, Debug)]
pub struct CarveOutput {
  /// Structure mask with junction cores removed.
  pub mask: Grid<bool>,
  /// Owning junction of every carved voxel, `None` elsewhere.
  pub territory: Grid<Option<JunctionId>>,
  /// Structure voxels before carving.
  pub structure_voxels: usize,
  /// Structure voxels removed by carving.
  pub carved_voxels: usize,
}

/// Inner sphere of one junction, clipped to the grid.
struct Core {
  id: JunctionId,
  center: I64Vec3,
  radius_sq: f64,
  bounds: IndexBox,
}

/// Carve every junction's inner sphere out of the structure of `grid`.
pub fn carve<T: StructureValue>(
  grid: &Grid<T>,
  junctions: &JunctionSet,
  inner_scale: f64,
) -> CarveOutput {
  let reporter = ProgressReporter::silent();
  let progress = reporter.stage(0.0, 1.0, grid.shape().extent()[0]);
  carve_with_progress(grid, junctions, inner_scale, &progress)
}

#[tracing::instrument(skip_all, name = "branches::carve")]
pub(crate) fn carve_with_progress<T: StructureValue>(
  grid: &Grid<T>,
  junctions: &JunctionSet,
  inner_scale: f64,
  progress: &StageProgress,
) -> CarveOutput {
  let shape = *grid.shape();
  let spacing = shape.spacing();
  let [rows, e1, e2] = shape.extent();
  let slab = shape.slab_len();

  let cores: Vec<Core> = junctions
    .iter()
    .filter_map(|junction| {
      let radius = junction.scaled_radius(inner_scale);
      IndexBox::around(junction.center, radius, &shape).map(|bounds| Core {
        id: junction.id,
        center: junction.center,
        radius_sq: radius * radius,
        bounds,
      })
    })
    .collect();

  let mut mask: Vec<bool> = grid
    .data()
    .par_iter()
    .map(StructureValue::is_structure)
    .collect();
  let mut owners: Vec<Option<JunctionId>> = vec![None; shape.len()];

  let shard_rows = rows_per_shard(rows);
  let chunk = shard_rows * slab;

  let (structure_voxels, carved_voxels) = mask
    .par_chunks_mut(chunk)
    .zip(owners.par_chunks_mut(chunk))
    .enumerate()
    .map(|(shard, (mask, owners))| {
      let shard_len = mask.len() / slab;
      let first_row = shard * shard_rows;
      let last_row = first_row + shard_len - 1;
      let structure = mask.iter().filter(|&&m| m).count();

      let mut carved = 0usize;
      // Squared distance to the current owner; allocated on first overlap.
      let mut nearest: Vec<f64> = Vec::new();

      for core in &cores {
        let Some((lo, hi)) = core.bounds.rows_within(first_row, last_row) else {
          continue;
        };
        if nearest.is_empty() {
          nearest = vec![f64::INFINITY; mask.len()];
        }

        for i0 in lo..=hi {
          for i1 in core.bounds.min[1]..=core.bounds.max[1] {
            for i2 in core.bounds.min[2]..=core.bounds.max[2] {
              let local = ((i0 - first_row) * e1 + i1) * e2 + i2;
              let owned = owners[local].is_some();
              if !mask[local] && !owned {
                continue;
              }

              let voxel = I64Vec3::new(i0 as i64, i1 as i64, i2 as i64);
              let d_sq = distance_squared(voxel, core.center, spacing);
              if d_sq > core.radius_sq {
                continue;
              }

              if !owned {
                mask[local] = false;
                carved += 1;
              } else if d_sq >= nearest[local] {
                continue;
              }
              owners[local] = Some(core.id);
              nearest[local] = d_sq;
            }
          }
        }
      }

      progress.advance(shard_len);
      (structure, carved)
    })
    .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

  tracing::debug!(
    junctions = cores.len(),
    structure_voxels,
    carved_voxels,
    "carved junction cores"
  );
  progress.finish();

  CarveOutput {
    mask: Grid::from_parts(shape, mask),
    territory: Grid::from_parts(shape, owners),
    structure_voxels,
    carved_voxels,
  }
}

#[cfg(test)]
#[path = "carve_test.rs"]
mod carve_test;
