//! Error types for branch decomposition.

use thiserror::Error;

use crate::junction::JunctionId;

/// Errors that stop a decomposition run before any stage executes.
///
/// Every variant describes a structural problem with the inputs or the
/// configuration; re-running with the same inputs fails identically.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecompositionError {
  /// The inner scale is zero, negative or not finite.
  #[error("inner scale must be positive and finite, got {0}")]
  InvalidInnerScale(f64),

  /// The outer scale is not finite or smaller than the inner scale.
  #[error("outer scale must be finite and >= inner scale, got outer={outer}, inner={inner}")]
  InvalidOuterScale {
    /// The provided outer scale.
    outer: f64,
    /// The inner scale it was compared against.
    inner: f64,
  },

  /// The minimum component size is zero.
  #[error("minimum component size must be at least 1, got {0}")]
  InvalidMinComponentSize(usize),

  /// A junction has a radius that cannot define a sphere.
  #[error("junction {id} has degenerate radius {radius}")]
  DegenerateJunction {
    /// Id of the offending junction.
    id: JunctionId,
    /// Its radius.
    radius: f64,
  },

  /// A physical junction center is not finite.
  #[error("junction {id} has a non-finite center {position:?}")]
  InvalidJunctionCenter {
    /// Id of the offending junction.
    id: JunctionId,
    /// The physical position supplied.
    position: [f64; 3],
  },

  /// A junction center uses an axis the grid does not have.
  #[error("junction {id} center has a non-zero coordinate on axis {axis} of a {dims}D grid")]
  JunctionDimensionMismatch {
    /// Id of the offending junction.
    id: JunctionId,
    /// First unused axis with a non-zero coordinate.
    axis: usize,
    /// Dimensionality of the grid.
    dims: usize,
  },

  /// Grid spacing is zero, negative or not finite on some axis.
  #[error("grid spacing must be positive and finite on every axis, got {0:?}")]
  InvalidSpacing([f64; 3]),

  /// Grid origin is not finite.
  #[error("grid origin must be finite, got {0:?}")]
  InvalidOrigin([f64; 3]),

  /// Unsupported number of grid dimensions.
  #[error("grids must have 1 to 3 dimensions, got {0}")]
  InvalidDimensions(usize),

  /// A per-axis argument has a different length than the grid dimension.
  #[error("expected {expected} per-axis values, got {actual}")]
  AxisCountMismatch {
    /// Dimensionality of the grid.
    expected: usize,
    /// Number of values supplied.
    actual: usize,
  },

  /// Some axis has zero extent.
  #[error("grid extent must be non-zero on every axis, got {0:?}")]
  EmptyExtent([usize; 3]),

  /// The voxel count of the extent does not fit in `usize`.
  #[error("grid extent {0:?} holds more voxels than fit in memory")]
  ExtentOverflow([usize; 3]),

  /// Flat voxel buffer does not match the grid extent.
  #[error("voxel buffer holds {actual} values but extent {extent:?} needs {expected}")]
  ShapeMismatch {
    /// Extent of the grid.
    extent: [usize; 3],
    /// Number of voxels implied by the extent.
    expected: usize,
    /// Number of voxels supplied.
    actual: usize,
  },

  /// Labels would overflow the `u32` label type.
  #[error("grid has too many voxels ({0}) for 32-bit labels")]
  TooManyVoxels(usize),

  /// A dedicated worker pool could not be created.
  #[error("failed to build worker pool: {0}")]
  ThreadPool(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DecompositionError>;
