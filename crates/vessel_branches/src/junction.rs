//! Junctions: known branching points with a center and a radius.

use std::collections::btree_map::{self, BTreeMap};

use glam::{DVec3, I64Vec3};

use crate::error::{DecompositionError, Result};
use crate::geometry::physical_to_index;
use crate::grid::GridShape;

/// Junction identifier as read from the junction table.
pub type JunctionId = u32;

/// A branching point of the structure.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Junction {
  /// Unique label of the junction.
  pub id: JunctionId,
  /// Center voxel index (padded axes are 0).
  pub center: I64Vec3,
  /// Characteristic radius in physical units.
  pub radius: f64,
}

impl Junction {
  pub fn new(id: JunctionId, center: I64Vec3, radius: f64) -> Self {
    Self { id, center, radius }
  }

  /// Junction from a per-axis index of a grid with `shape`.
  pub fn from_index(id: JunctionId, index: &[i64], radius: f64, shape: &GridShape) -> Result<Self> {
    Ok(Self::new(id, shape.pad_index(index)?, radius))
  }

  /// Junction from a per-axis physical position, snapped to the nearest voxel.
  pub fn from_physical(
    id: JunctionId,
    position: &[f64],
    radius: f64,
    shape: &GridShape,
  ) -> Result<Self> {
    if position.len() != shape.dims() {
      return Err(DecompositionError::AxisCountMismatch {
        expected: shape.dims(),
        actual: position.len(),
      });
    }
    let mut padded = [0.0; 3];
    padded[..position.len()].copy_from_slice(position);
    if padded.iter().any(|p| !p.is_finite()) {
      return Err(DecompositionError::InvalidJunctionCenter { id, position: padded });
    }
    let center = physical_to_index(DVec3::from_array(padded), shape);
    Ok(Self::new(id, center, radius))
  }

  /// Radius scaled by `scale`.
  #[inline]
  pub fn scaled_radius(&self, scale: f64) -> f64 {
    self.radius * scale
  }

  /// Check the radius and that the center fits the grid's dimensionality.
  pub fn validate(&self, shape: &GridShape) -> Result<()> {
    if !self.radius.is_finite() || self.radius <= 0.0 {
      return Err(DecompositionError::DegenerateJunction {
        id: self.id,
        radius: self.radius,
      });
    }
    if let Some(axis) = shape.padded_axis_violation(self.center) {
      return Err(DecompositionError::JunctionDimensionMismatch {
        id: self.id,
        axis,
        dims: shape.dims(),
      });
    }
    Ok(())
  }
}

/// Junctions keyed by id, iterated in ascending id order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JunctionSet {
  junctions: BTreeMap<JunctionId, Junction>,
}

impl JunctionSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a junction, returning the entry it replaced (last insert wins).
  pub fn insert(&mut self, junction: Junction) -> Option<Junction> {
    self.junctions.insert(junction.id, junction)
  }

  pub fn get(&self, id: JunctionId) -> Option<&Junction> {
    self.junctions.get(&id)
  }

  pub fn remove(&mut self, id: JunctionId) -> Option<Junction> {
    self.junctions.remove(&id)
  }

  pub fn len(&self) -> usize {
    self.junctions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.junctions.is_empty()
  }

  /// Junctions in ascending id order.
  pub fn iter(&self) -> impl Iterator<Item = &Junction> + '_ {
    self.junctions.values()
  }

  pub fn ids(&self) -> impl Iterator<Item = JunctionId> + '_ {
    self.junctions.keys().copied()
  }

  /// Validate every junction; the first failure rejects the whole set.
  pub fn validate(&self, shape: &GridShape) -> Result<()> {
    self.iter().try_for_each(|junction| junction.validate(shape))
  }
}

impl FromIterator<Junction> for JunctionSet {
  fn from_iter<I: IntoIterator<Item = Junction>>(iter: I) -> Self {
    let mut set = Self::new();
    set.extend(iter);
    set
  }
}

impl Extend<Junction> for JunctionSet {
  fn extend<I: IntoIterator<Item = Junction>>(&mut self, iter: I) {
    for junction in iter {
      self.insert(junction);
    }
  }
}

impl<'a> IntoIterator for &'a JunctionSet {
  type Item = &'a Junction;
  type IntoIter = btree_map::Values<'a, JunctionId, Junction>;

  fn into_iter(self) -> Self::IntoIter {
    self.junctions.values()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_last_insert_wins() {
    let mut set = JunctionSet::new();
    assert!(set.insert(Junction::new(3, I64Vec3::ZERO, 1.0)).is_none());
    let replaced = set.insert(Junction::new(3, I64Vec3::ONE, 2.0));
    assert_eq!(replaced.map(|j| j.radius), Some(1.0));
    assert_eq!(set.len(), 1);
    assert_eq!(set.get(3).map(|j| j.center), Some(I64Vec3::ONE));
  }

  #[test]
  fn test_iteration_in_id_order() {
    let set: JunctionSet = [7u32, 2, 5]
      .into_iter()
      .map(|id| Junction::new(id, I64Vec3::ZERO, 1.0))
      .collect();
    assert_eq!(set.ids().collect::<Vec<_>>(), vec![2, 5, 7]);
  }

  #[test]
  fn test_from_index_pads() {
    let shape = GridShape::new(&[8, 8]).unwrap();
    let junction = Junction::from_index(1, &[2, 5], 1.5, &shape).unwrap();
    assert_eq!(junction.center, I64Vec3::new(2, 5, 0));
    assert!(Junction::from_index(1, &[2, 5, 1], 1.5, &shape).is_err());
  }

  #[test]
  fn test_from_physical_snaps_to_voxel() {
    let shape = GridShape::new(&[8, 8])
      .unwrap()
      .with_spacing(&[0.5, 0.5])
      .unwrap();
    let junction = Junction::from_physical(4, &[1.1, 2.4], 1.0, &shape).unwrap();
    assert_eq!(junction.center, I64Vec3::new(2, 5, 0));
  }

  #[test]
  fn test_from_physical_rejects_non_finite_center() {
    let shape = GridShape::new(&[8, 8]).unwrap();
    for position in [[f64::NAN, 5.0], [f64::INFINITY, 5.0], [1.0, f64::NEG_INFINITY]] {
      assert!(matches!(
        Junction::from_physical(6, &position, 1.0, &shape),
        Err(DecompositionError::InvalidJunctionCenter { id: 6, .. })
      ));
    }
  }

  #[test]
  fn test_degenerate_radius_rejected() {
    let shape = GridShape::new(&[8, 8]).unwrap();
    for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
      let junction = Junction::new(9, I64Vec3::ZERO, radius);
      assert!(matches!(
        junction.validate(&shape),
        Err(DecompositionError::DegenerateJunction { id: 9, .. })
      ));
    }
  }

  #[test]
  fn test_center_on_padded_axis_rejected() {
    let shape = GridShape::new(&[8, 8]).unwrap();
    let junction = Junction::new(2, I64Vec3::new(1, 1, 1), 1.0);
    assert!(matches!(
      junction.validate(&shape),
      Err(DecompositionError::JunctionDimensionMismatch {
        id: 2,
        axis: 2,
        dims: 2
      })
    ));
  }

  #[test]
  fn test_center_outside_grid_is_valid() {
    let shape = GridShape::new(&[8, 8]).unwrap();
    let junction = Junction::new(2, I64Vec3::new(-3, 20, 0), 1.0);
    assert!(junction.validate(&shape).is_ok());
  }

  #[test]
  fn test_set_validation_rejects_whole_run() {
    let shape = GridShape::new(&[8, 8]).unwrap();
    let set: JunctionSet = [
      Junction::new(1, I64Vec3::ZERO, 1.0),
      Junction::new(2, I64Vec3::ONE.with_z(0), 0.0),
    ]
    .into_iter()
    .collect();
    assert!(set.validate(&shape).is_err());
  }
}
