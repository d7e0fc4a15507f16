//! Benchmarks for branch decomposition on a synthetic vessel tree.
//!
//! The tree is a seeded set of tubes joining random junction points inside a
//! cubic volume, roughly the density of a segmented airway crop.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::I64Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vessel_branches::{
  carve, decompose, label_components, DecompositionConfig, Grid, GridShape, Junction, JunctionSet,
};

const SEED: u64 = 0x5eed;
const JUNCTIONS: usize = 48;
const TUBE_RADIUS: i64 = 2;

/// Tubes of radius `TUBE_RADIUS` along axis-aligned paths between junctions.
fn synthetic_tree(size: usize) -> (Grid<u8>, JunctionSet) {
  let mut rng = StdRng::seed_from_u64(SEED);
  let shape = GridShape::new(&[size, size, size]).unwrap();
  let mut grid = Grid::filled(shape, 0u8);
  let margin = TUBE_RADIUS + 1;
  let hi = size as i64 - margin;

  let mut points: Vec<I64Vec3> = Vec::with_capacity(JUNCTIONS);
  let mut junctions = JunctionSet::new();
  for id in 0..JUNCTIONS {
    let point = I64Vec3::new(
      rng.random_range(margin..hi),
      rng.random_range(margin..hi),
      rng.random_range(margin..hi),
    );
    if !points.is_empty() {
      let parent = points[rng.random_range(0..points.len())];
      let mut cursor = parent;
      for axis in 0..3 {
        while cursor[axis] != point[axis] {
          stamp_ball(&mut grid, cursor);
          cursor[axis] += (point[axis] - cursor[axis]).signum();
        }
      }
    }
    stamp_ball(&mut grid, point);
    points.push(point);
    junctions.insert(Junction::new(id as u32 + 1, point, TUBE_RADIUS as f64));
  }

  (grid, junctions)
}

fn stamp_ball(grid: &mut Grid<u8>, center: I64Vec3) {
  for dx in -TUBE_RADIUS..=TUBE_RADIUS {
    for dy in -TUBE_RADIUS..=TUBE_RADIUS {
      for dz in -TUBE_RADIUS..=TUBE_RADIUS {
        let offset = I64Vec3::new(dx, dy, dz);
        if offset.length_squared() <= TUBE_RADIUS * TUBE_RADIUS {
          if let Some(voxel) = grid.get_mut(center + offset) {
            *voxel = 1;
          }
        }
      }
    }
  }
}

fn bench_decompose(c: &mut Criterion) {
  let mut group = c.benchmark_group("decompose");
  group.sample_size(20);

  for size in [64usize, 128] {
    let (grid, junctions) = synthetic_tree(size);
    let config = DecompositionConfig::default();
    group.throughput(Throughput::Elements(grid.len() as u64));
    group.bench_with_input(BenchmarkId::new("full", size), &size, |b, _| {
      b.iter(|| black_box(decompose(&grid, &junctions, &config).unwrap()))
    });
  }

  group.finish();
}

fn bench_label(c: &mut Criterion) {
  let mut group = c.benchmark_group("label");
  group.sample_size(20);

  for size in [64usize, 128] {
    let (grid, junctions) = synthetic_tree(size);
    let mask = carve(&grid, &junctions, 2.5).mask;
    group.throughput(Throughput::Elements(mask.len() as u64));
    group.bench_with_input(BenchmarkId::new("components", size), &size, |b, _| {
      b.iter(|| black_box(label_components(&mask).unwrap()))
    });
  }

  group.finish();
}

fn bench_thread_scaling(c: &mut Criterion) {
  let mut group = c.benchmark_group("decompose_threads");
  group.sample_size(10);
  let (grid, junctions) = synthetic_tree(128);

  for threads in [1usize, 2, 4, 8] {
    let config = DecompositionConfig::default().with_num_threads(Some(threads));
    group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
      b.iter(|| black_box(decompose(&grid, &junctions, &config).unwrap()))
    });
  }

  group.finish();
}

criterion_group!(benches, bench_decompose, bench_label, bench_thread_scaling);
criterion_main!(benches);
