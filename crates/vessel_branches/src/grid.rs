//! Dimension-agnostic voxel grids.
//!
//! Grids of 1 to 3 dimensions share one padded 3-axis layout (see
//! [`crate::constants`]). Index vectors are [`I64Vec3`] with zero on the
//! padded axes.

use glam::{DVec3, I64Vec3};

use crate::constants::MAX_DIMS;
use crate::error::{DecompositionError, Result};

/// Branch label stored in output grids. `0` is background.
pub type Label = u32;

/// Grid of branch labels.
pub type LabelGrid = Grid<Label>;

/// Voxel value that can mark membership in the tubular structure.
///
/// Any non-zero value is structure; the stored value (vessel marker or
/// pre-existing branch id) is otherwise ignored.
pub trait StructureValue: Copy + Send + Sync {
  /// True if the voxel belongs to the structure mask.
  fn is_structure(&self) -> bool;
}

macro_rules! impl_structure_value {
  ($($ty:ty),*) => {
    $(
      impl StructureValue for $ty {
        #[inline(always)]
        fn is_structure(&self) -> bool {
          *self != 0
        }
      }
    )*
  };
}

impl_structure_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64);

impl StructureValue for bool {
  #[inline(always)]
  fn is_structure(&self) -> bool {
    *self
  }
}

/// Extent, spacing and origin of a grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridShape {
  dims: usize,
  extent: [usize; MAX_DIMS],
  len: usize,
  spacing: DVec3,
  origin: DVec3,
}

impl GridShape {
  /// Create an isotropic shape (spacing 1, origin 0) from per-axis extents.
  pub fn new(extent: &[usize]) -> Result<Self> {
    let dims = extent.len();
    if dims == 0 || dims > MAX_DIMS {
      return Err(DecompositionError::InvalidDimensions(dims));
    }

    let mut padded = [1usize; MAX_DIMS];
    padded[..dims].copy_from_slice(extent);
    if padded.contains(&0) {
      return Err(DecompositionError::EmptyExtent(padded));
    }
    let len = padded
      .iter()
      .try_fold(1usize, |acc, &n| acc.checked_mul(n))
      .ok_or(DecompositionError::ExtentOverflow(padded))?;

    Ok(Self {
      dims,
      extent: padded,
      len,
      spacing: DVec3::ONE,
      origin: DVec3::ZERO,
    })
  }

  /// Set physical voxel spacing, one value per grid axis.
  pub fn with_spacing(mut self, spacing: &[f64]) -> Result<Self> {
    let padded = self.pad_reals(spacing, 1.0)?;
    if padded.iter().any(|s| !s.is_finite() || *s <= 0.0) {
      return Err(DecompositionError::InvalidSpacing(padded));
    }
    self.spacing = DVec3::from_array(padded);
    Ok(self)
  }

  /// Set the physical position of voxel `[0, 0, 0]`, one value per grid axis.
  pub fn with_origin(mut self, origin: &[f64]) -> Result<Self> {
    let padded = self.pad_reals(origin, 0.0)?;
    if padded.iter().any(|o| !o.is_finite()) {
      return Err(DecompositionError::InvalidOrigin(padded));
    }
    self.origin = DVec3::from_array(padded);
    Ok(self)
  }

  fn pad_reals(&self, values: &[f64], fill: f64) -> Result<[f64; MAX_DIMS]> {
    if values.len() != self.dims {
      return Err(DecompositionError::AxisCountMismatch {
        expected: self.dims,
        actual: values.len(),
      });
    }
    let mut padded = [fill; MAX_DIMS];
    padded[..self.dims].copy_from_slice(values);
    Ok(padded)
  }

  /// Number of real (unpadded) axes.
  #[inline]
  pub fn dims(&self) -> usize {
    self.dims
  }

  /// Padded per-axis extent.
  #[inline]
  pub fn extent(&self) -> [usize; MAX_DIMS] {
    self.extent
  }

  /// Per-axis extent of the real axes only.
  pub fn real_extent(&self) -> &[usize] {
    &self.extent[..self.dims]
  }

  /// Padded per-axis spacing in physical units.
  #[inline]
  pub fn spacing(&self) -> DVec3 {
    self.spacing
  }

  /// Physical position of voxel `[0, 0, 0]`.
  #[inline]
  pub fn origin(&self) -> DVec3 {
    self.origin
  }

  /// Total voxel count.
  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  /// Always false; shapes reject zero extents.
  #[inline]
  pub fn is_empty(&self) -> bool {
    false
  }

  /// Voxels in one axis-0 row (slab).
  #[inline]
  pub fn slab_len(&self) -> usize {
    self.extent[1] * self.extent[2]
  }

  /// Linear strides per axis.
  #[inline]
  pub fn strides(&self) -> [usize; MAX_DIMS] {
    [self.slab_len(), self.extent[2], 1]
  }

  /// True if `index` lies inside the grid.
  #[inline]
  pub fn contains(&self, index: I64Vec3) -> bool {
    (0..MAX_DIMS).all(|axis| index[axis] >= 0 && (index[axis] as u64) < self.extent[axis] as u64)
  }

  /// Linear offset of `index`, or `None` when outside the grid.
  #[inline]
  pub fn linear_index(&self, index: I64Vec3) -> Option<usize> {
    if !self.contains(index) {
      return None;
    }
    Some(self.offset(index.x as usize, index.y as usize, index.z as usize))
  }

  /// Linear offset of an in-bounds padded coordinate.
  #[inline(always)]
  pub fn offset(&self, i0: usize, i1: usize, i2: usize) -> usize {
    (i0 * self.extent[1] + i1) * self.extent[2] + i2
  }

  /// Index vector of a linear offset.
  #[inline]
  pub fn index_of(&self, offset: usize) -> I64Vec3 {
    let slab = self.slab_len();
    let i0 = offset / slab;
    let rest = offset % slab;
    I64Vec3::new(
      i0 as i64,
      (rest / self.extent[2]) as i64,
      (rest % self.extent[2]) as i64,
    )
  }

  /// Pad a per-axis index (length = `dims`) to an index vector.
  pub fn pad_index(&self, index: &[i64]) -> Result<I64Vec3> {
    if index.len() != self.dims {
      return Err(DecompositionError::AxisCountMismatch {
        expected: self.dims,
        actual: index.len(),
      });
    }
    let mut padded = [0i64; MAX_DIMS];
    padded[..self.dims].copy_from_slice(index);
    Ok(I64Vec3::from_array(padded))
  }

  /// First padded axis on which `index` is non-zero, if any.
  pub fn padded_axis_violation(&self, index: I64Vec3) -> Option<usize> {
    (self.dims..MAX_DIMS).find(|&axis| index[axis] != 0)
  }
}

/// A voxel grid: a shape plus one value per voxel in linear order.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
  shape: GridShape,
  data: Vec<T>,
}

impl<T: Clone> Grid<T> {
  /// Create a grid with every voxel set to `value`.
  pub fn filled(shape: GridShape, value: T) -> Self {
    Self {
      data: vec![value; shape.len()],
      shape,
    }
  }
}

impl<T> Grid<T> {
  /// Wrap a flat buffer laid out in linear order.
  pub fn from_vec(shape: GridShape, data: Vec<T>) -> Result<Self> {
    if data.len() != shape.len() {
      return Err(DecompositionError::ShapeMismatch {
        extent: shape.extent(),
        expected: shape.len(),
        actual: data.len(),
      });
    }
    Ok(Self { shape, data })
  }

  /// Wrap a buffer whose length is known to match `shape`.
  pub(crate) fn from_parts(shape: GridShape, data: Vec<T>) -> Self {
    debug_assert_eq!(data.len(), shape.len());
    Self { shape, data }
  }

  #[inline]
  pub fn shape(&self) -> &GridShape {
    &self.shape
  }

  #[inline]
  pub fn data(&self) -> &[T] {
    &self.data
  }

  #[inline]
  pub fn data_mut(&mut self) -> &mut [T] {
    &mut self.data
  }

  pub fn into_vec(self) -> Vec<T> {
    self.data
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// Value at `index`, or `None` outside the grid.
  #[inline]
  pub fn get(&self, index: I64Vec3) -> Option<&T> {
    self.shape.linear_index(index).map(|offset| &self.data[offset])
  }

  /// Mutable value at `index`, or `None` outside the grid.
  #[inline]
  pub fn get_mut(&mut self, index: I64Vec3) -> Option<&mut T> {
    self
      .shape
      .linear_index(index)
      .map(move |offset| &mut self.data[offset])
  }

  /// Iterate `(index, value)` pairs in lexicographic order.
  pub fn iter_indexed(&self) -> impl Iterator<Item = (I64Vec3, &T)> + '_ {
    self
      .data
      .iter()
      .enumerate()
      .map(|(offset, value)| (self.shape.index_of(offset), value))
  }

  /// New grid of the same shape with `f` applied to every voxel.
  pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
    Grid {
      shape: self.shape,
      data: self.data.iter().map(f).collect(),
    }
  }
}

impl<T: PartialEq> Grid<T> {
  /// Number of voxels equal to `value`.
  pub fn count(&self, value: &T) -> usize {
    self.data.iter().filter(|v| *v == value).count()
  }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
