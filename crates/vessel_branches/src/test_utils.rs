//! Test utilities: grid fixtures and reference implementations.
//!
//! Fixtures are small hand-checked structures (lines, T-shapes) plus a seeded
//! random vessel-tree generator for property tests.

use std::collections::VecDeque;

use glam::I64Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DecompositionConfig;
use crate::grid::{Grid, GridShape, Label, LabelGrid};
use crate::junction::{Junction, JunctionSet};

// =============================================================================
// Fixtures
// =============================================================================

/// 2D grid `[3, len]` with a 1-voxel-wide line along axis 1 on row 1.
pub fn line_grid(len: usize) -> Grid<u8> {
  let shape = GridShape::new(&[3, len]).unwrap();
  let mut grid = Grid::filled(shape, 0u8);
  for i in 0..len {
    *grid.get_mut(I64Vec3::new(1, i as i64, 0)).unwrap() = 1;
  }
  grid
}

/// Junctions 1 and 2 on both endpoints of [`line_grid`].
pub fn line_junctions(len: usize, radius: f64) -> JunctionSet {
  [
    Junction::new(1, I64Vec3::new(1, 0, 0), radius),
    Junction::new(2, I64Vec3::new(1, len as i64 - 1, 0), radius),
  ]
  .into_iter()
  .collect()
}

/// 21x21 T: a bar along axis 1 on row 2 and a stem along axis 0 on column 10.
///
/// Junction 7 sits on the intersection `(2, 10)` with radius 1.
pub fn t_shape() -> (Grid<u8>, JunctionSet) {
  let shape = GridShape::new(&[21, 21]).unwrap();
  let mut grid = Grid::filled(shape, 0u8);
  for col in 0..21 {
    *grid.get_mut(I64Vec3::new(2, col, 0)).unwrap() = 1;
  }
  for row in 2..21 {
    *grid.get_mut(I64Vec3::new(row, 10, 0)).unwrap() = 1;
  }
  let junctions = [Junction::new(7, I64Vec3::new(2, 10, 0), 1.0)]
    .into_iter()
    .collect();
  (grid, junctions)
}

/// 15x15 plus sign with junction 3 (radius 1) at the crossing `(7, 7)`.
pub fn crossing() -> (Grid<u8>, JunctionSet) {
  let shape = GridShape::new(&[15, 15]).unwrap();
  let mut grid = Grid::filled(shape, 0u8);
  for i in 0..15 {
    *grid.get_mut(I64Vec3::new(7, i, 0)).unwrap() = 1;
    *grid.get_mut(I64Vec3::new(i, 7, 0)).unwrap() = 1;
  }
  let junctions = [Junction::new(3, I64Vec3::new(7, 7, 0), 1.0)]
    .into_iter()
    .collect();
  (grid, junctions)
}

/// Build a grid from rows of `#` (structure) and `.` (background).
pub fn grid_from_ascii(rows: &[&str]) -> Grid<u8> {
  let width = rows[0].len();
  let shape = GridShape::new(&[rows.len(), width]).unwrap();
  let data = rows
    .iter()
    .flat_map(|row| {
      assert_eq!(row.len(), width, "ragged ascii grid");
      row.bytes().map(|b| u8::from(b == b'#'))
    })
    .collect();
  Grid::from_vec(shape, data).unwrap()
}

/// Configuration used by the scenario tests.
pub fn scenario_config() -> DecompositionConfig {
  DecompositionConfig::new()
    .with_scales(2.0, 3.0)
    .with_min_component_size(1)
}

/// Seeded random vessel tree in a 3D grid.
///
/// Junction points are connected by axis-aligned L-shaped paths, so every
/// junction lies on the structure. A sprinkle of isolated noise voxels
/// exercises the fragment filter.
pub fn random_tree(seed: u64, extent: [usize; 3], junction_count: usize) -> (Grid<u8>, JunctionSet) {
  let mut rng = StdRng::seed_from_u64(seed);
  let shape = GridShape::new(&extent).unwrap();
  let mut grid = Grid::filled(shape, 0u8);

  let random_point = |rng: &mut StdRng| {
    I64Vec3::new(
      rng.random_range(0..extent[0] as i64),
      rng.random_range(0..extent[1] as i64),
      rng.random_range(0..extent[2] as i64),
    )
  };

  let mut points: Vec<I64Vec3> = Vec::with_capacity(junction_count);
  let mut junctions = JunctionSet::new();
  for id in 0..junction_count {
    let point = random_point(&mut rng);
    if let Some(&parent) = points.get(rng.random_range(0..points.len().max(1))) {
      draw_path(&mut grid, parent, point);
    }
    *grid.get_mut(point).unwrap() = 1;
    points.push(point);
    let radius = rng.random_range(0.8..2.0);
    junctions.insert(Junction::new(id as u32 + 1, point, radius));
  }

  for _ in 0..shape.len() / 200 {
    let point = random_point(&mut rng);
    *grid.get_mut(point).unwrap() = 1;
  }

  (grid, junctions)
}

fn draw_path(grid: &mut Grid<u8>, from: I64Vec3, to: I64Vec3) {
  let mut cursor = from;
  for axis in 0..3 {
    while cursor[axis] != to[axis] {
      *grid.get_mut(cursor).unwrap() = 1;
      cursor[axis] += (to[axis] - cursor[axis]).signum();
    }
  }
  *grid.get_mut(cursor).unwrap() = 1;
}

// =============================================================================
// Reference implementations
// =============================================================================

/// Breadth-first flood fill labeling; labels follow first voxel in scan order.
pub fn flood_fill_labels(mask: &Grid<bool>) -> LabelGrid {
  let shape = *mask.shape();
  let mut labels = vec![0 as Label; shape.len()];
  let mut next = 0;
  let mut queue = VecDeque::new();

  for start in 0..shape.len() {
    if !mask.data()[start] || labels[start] != 0 {
      continue;
    }
    next += 1;
    labels[start] = next;
    queue.push_back(start);

    while let Some(offset) = queue.pop_front() {
      let index = shape.index_of(offset);
      for axis in 0..3 {
        for step in [-1i64, 1] {
          let mut neighbor = index;
          neighbor[axis] += step;
          if let Some(n) = shape.linear_index(neighbor) {
            if mask.data()[n] && labels[n] == 0 {
              labels[n] = next;
              queue.push_back(n);
            }
          }
        }
      }
    }
  }

  Grid::from_vec(shape, labels).unwrap()
}
