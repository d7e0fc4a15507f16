//! DecompositionConfig - sphere scales, fragment threshold and threading.

use crate::constants::{DEFAULT_INNER_SCALE, DEFAULT_MIN_COMPONENT_SIZE, DEFAULT_OUTER_SCALE};
use crate::error::{DecompositionError, Result};

/// Configuration for a decomposition run.
///
/// Sphere radii are per junction: `inner_scale * radius` is carved,
/// `[inner_scale * radius, outer_scale * radius]` is the connectivity shell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
  feature = "serde",
  derive(serde::Serialize, serde::Deserialize),
  serde(default)
)]
pub struct DecompositionConfig {
  /// Multiplier of each junction radius giving the carved inner sphere.
  pub inner_scale: f64,

  /// Multiplier of each junction radius giving the outer shell boundary.
  pub outer_scale: f64,

  /// Branches with fewer voxels are demoted to background.
  pub min_component_size: usize,

  /// Renumber surviving branches 1..=n, keeping their relative order.
  pub compact_labels: bool,

  /// Run inside a dedicated pool of this many workers (`None` = global pool).
  pub num_threads: Option<usize>,
}

impl Default for DecompositionConfig {
  fn default() -> Self {
    Self {
      inner_scale: DEFAULT_INNER_SCALE,
      outer_scale: DEFAULT_OUTER_SCALE,
      min_component_size: DEFAULT_MIN_COMPONENT_SIZE,
      compact_labels: false,
      num_threads: None,
    }
  }
}

impl DecompositionConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_scales(mut self, inner: f64, outer: f64) -> Self {
    self.inner_scale = inner;
    self.outer_scale = outer;
    self
  }

  pub fn with_min_component_size(mut self, size: usize) -> Self {
    self.min_component_size = size;
    self
  }

  pub fn with_compact_labels(mut self, compact: bool) -> Self {
    self.compact_labels = compact;
    self
  }

  pub fn with_num_threads(mut self, threads: Option<usize>) -> Self {
    self.num_threads = threads;
    self
  }

  /// Fail fast on values that no stage can run with. Nothing is clamped.
  pub fn validate(&self) -> Result<()> {
    if !self.inner_scale.is_finite() || self.inner_scale <= 0.0 {
      return Err(DecompositionError::InvalidInnerScale(self.inner_scale));
    }
    if !self.outer_scale.is_finite() || self.outer_scale < self.inner_scale {
      return Err(DecompositionError::InvalidOuterScale {
        outer: self.outer_scale,
        inner: self.inner_scale,
      });
    }
    if self.min_component_size < 1 {
      return Err(DecompositionError::InvalidMinComponentSize(
        self.min_component_size,
      ));
    }
    Ok(())
  }
}
