//! Layout constants and defaults for branch decomposition.
//!
//! # Grid Memory Layout
//!
//! Every grid is stored padded to three axes. Unused trailing axes of 1D and
//! 2D grids have extent 1, so face connectivity in padded space is 2-, 4- or
//! 6-connectivity in the grid's own dimension.
//!
//! ```text
//! Voxel memory layout (row-major, axis 2 innermost):
//!
//! Address:  0      1      ...  e2-1      e2     ...  e1*e2   ...
//! Content: [0,0,0][0,0,1]...[0,0,e2-1][0,1,0]...[1,0,0]...
//!          └──────── axis 2 ─────────┘
//!
//! index = (i0 * e1 + i1) * e2 + i2
//! ```
//!
//! Linear index order equals lexicographic index order, which is the scan
//! order used to assign branch labels.
//!
//! # Row Shards
//!
//! ```text
//!  axis 0 ──►
//! ┌─────────┬─────────┬─────────┬─────────┐
//! │ shard 0 │ shard 1 │ shard 2 │ shard 3 │   each shard = whole rows
//! │ rows    │ rows    │ rows    │ rows    │   (slabs of e1*e2 voxels)
//! │ 0..k    │ k..2k   │ 2k..3k  │ 3k..    │
//! └─────────┴─────────┴─────────┴─────────┘
//!           ▲         ▲         ▲
//!           └─ seams merged after the parallel pass
//! ```

/// Number of axes every grid is padded to.
pub const MAX_DIMS: usize = 3;

/// Label value of background and junction territory.
pub const BACKGROUND: u32 = 0;

/// Default inner scale (multiplies each junction radius).
pub const DEFAULT_INNER_SCALE: f64 = 2.5;

/// Default outer scale (multiplies each junction radius).
pub const DEFAULT_OUTER_SCALE: f64 = 3.0;

/// Default minimum voxel count of a surviving branch.
pub const DEFAULT_MIN_COMPONENT_SIZE: usize = 6;

/// Row shards created per worker thread.
pub const SHARDS_PER_THREAD: usize = 4;

/// Share of the progress range spent carving.
pub const CARVE_WEIGHT: f32 = 0.15;

/// Share of the progress range spent labeling.
pub const LABEL_WEIGHT: f32 = 0.35;

/// Share of the progress range spent filtering.
pub const FILTER_WEIGHT: f32 = 0.15;

/// Share of the progress range spent extracting connectivity.
pub const CONNECT_WEIGHT: f32 = 0.35;

/// Number of whole rows (axis-0 slabs) per shard for a grid with `rows` rows.
///
/// Depends on the current rayon pool size; results never depend on it.
#[inline]
pub fn rows_per_shard(rows: usize) -> usize {
  let shards = (rayon::current_num_threads() * SHARDS_PER_THREAD).max(1);
  rows.div_ceil(shards).max(1)
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
