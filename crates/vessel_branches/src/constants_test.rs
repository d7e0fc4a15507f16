use super::*;

#[test]
fn test_stage_weights_cover_unit_range() {
  let total = CARVE_WEIGHT + LABEL_WEIGHT + FILTER_WEIGHT + CONNECT_WEIGHT;
  assert!((total - 1.0).abs() < 1e-6, "weights sum to {}", total);
}

#[test]
fn test_rows_per_shard_never_zero() {
  assert_eq!(rows_per_shard(0), 1);
  assert!(rows_per_shard(1) >= 1);
  assert!(rows_per_shard(10_000) >= 1);
}

#[test]
fn test_rows_per_shard_covers_all_rows() {
  for rows in [1usize, 7, 64, 1000] {
    let per_shard = rows_per_shard(rows);
    let shards = rows.div_ceil(per_shard);
    assert!(shards * per_shard >= rows);
    assert!(shards <= rayon::current_num_threads() * SHARDS_PER_THREAD);
  }
}

#[test]
fn test_default_scales_are_ordered() {
  assert!(DEFAULT_INNER_SCALE > 0.0);
  assert!(DEFAULT_OUTER_SCALE >= DEFAULT_INNER_SCALE);
  assert!(DEFAULT_MIN_COMPONENT_SIZE >= 1);
}
