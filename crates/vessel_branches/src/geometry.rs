//! Distance evaluation and index/physical transforms.
//!
//! All sphere tests compare squared physical distances against squared radii.
//! Index differences are taken in integer space before conversion, so large
//! coordinate magnitudes lose no precision.

use glam::{DVec3, I64Vec3};

use crate::constants::MAX_DIMS;
use crate::grid::GridShape;

/// Squared physical distance between a voxel and a center.
#[inline(always)]
pub fn distance_squared(voxel: I64Vec3, center: I64Vec3, spacing: DVec3) -> f64 {
  let delta = (voxel - center).as_dvec3() * spacing;
  delta.length_squared()
}

/// Physical (spacing-aware) Euclidean distance between a voxel and a center.
#[inline]
pub fn distance(voxel: I64Vec3, center: I64Vec3, spacing: DVec3) -> f64 {
  distance_squared(voxel, center, spacing).sqrt()
}

/// Physical position of a voxel index.
#[inline]
pub fn index_to_physical(index: I64Vec3, shape: &GridShape) -> DVec3 {
  shape.origin() + index.as_dvec3() * shape.spacing()
}

/// Nearest voxel index of a physical position.
///
/// Padded axes always map to 0. The result may lie outside the grid.
#[inline]
pub fn physical_to_index(point: DVec3, shape: &GridShape) -> I64Vec3 {
  let continuous = (point - shape.origin()) / shape.spacing();
  let mut index = continuous.round().as_i64vec3();
  for axis in shape.dims()..MAX_DIMS {
    index[axis] = 0;
  }
  index
}

/// Closed interval of squared radii `[inner², outer²]`.
///
/// Both bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shell {
  pub inner_sq: f64,
  pub outer_sq: f64,
}

impl Shell {
  /// Shell between two radii.
  pub fn new(inner: f64, outer: f64) -> Self {
    Self {
      inner_sq: inner * inner,
      outer_sq: outer * outer,
    }
  }

  /// True if a squared distance lies within the shell, bounds included.
  #[inline(always)]
  pub fn contains(&self, distance_sq: f64) -> bool {
    distance_sq >= self.inner_sq && distance_sq <= self.outer_sq
  }
}

/// Inclusive box of padded voxel indices, clipped to a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexBox {
  pub min: [usize; MAX_DIMS],
  pub max: [usize; MAX_DIMS],
}

impl IndexBox {
  /// Box holding every grid voxel within `radius` (physical units)
  /// of `center`, or `None` if no grid voxel can be that close.
  pub fn around(center: I64Vec3, radius: f64, shape: &GridShape) -> Option<Self> {
    if !radius.is_finite() || radius < 0.0 {
      return None;
    }

    let extent = shape.extent();
    let spacing = shape.spacing();
    let mut min = [0usize; MAX_DIMS];
    let mut max = [0usize; MAX_DIMS];

    for axis in 0..MAX_DIMS {
      // Rounded up so boundary voxels survive division round-off. The float
      // cast and the additions saturate for huge radii.
      let reach = (radius / spacing[axis]).ceil() as i64;
      let lo = center[axis].saturating_sub(reach);
      let hi = center[axis].saturating_add(reach);
      let last = extent[axis] as i64 - 1;
      if hi < 0 || lo > last {
        return None;
      }
      min[axis] = lo.max(0) as usize;
      max[axis] = hi.min(last) as usize;
    }

    Some(Self { min, max })
  }

  /// Number of voxels in the box.
  pub fn voxel_count(&self) -> usize {
    (0..MAX_DIMS)
      .map(|axis| self.max[axis] - self.min[axis] + 1)
      .product()
  }

  /// Clip the box's axis-0 range to the rows `[first, last]`.
  #[inline]
  pub fn rows_within(&self, first: usize, last: usize) -> Option<(usize, usize)> {
    let lo = self.min[0].max(first);
    let hi = self.max[0].min(last);
    (lo <= hi).then_some((lo, hi))
  }
}

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;
