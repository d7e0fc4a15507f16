//! Stage 4: Junction shell connectivity
//!
//! A branch touches a junction when any of its voxels lies in the junction's
//! shell `inner_scale * r <= distance <= outer_scale * r` (both bounds
//! inclusive).
//!
//! ```text
//!        outer ───────────
//!      ╱  inner ─────    ╲
//!     │  ╱  junction ╲    │    branch voxels in the ring ──► map entry
//!      ╲  ──────────     ╱
//!        ─────────────
//! ```

use std::collections::{BTreeMap, BTreeSet};

use glam::I64Vec3;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::constants::BACKGROUND;
use crate::geometry::{distance_squared, IndexBox, Shell};
use crate::grid::{Label, LabelGrid};
use crate::junction::{Junction, JunctionId, JunctionSet};
use crate::progress::{ProgressReporter, StageProgress};

/// Branch label → ids of the junctions whose shell it touches.
///
/// Branches touching no shell have no entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectivityMap {
  entries: BTreeMap<Label, BTreeSet<JunctionId>>,
}

impl ConnectivityMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record that `label` touches `junction`. Returns false if already known.
  pub fn insert(&mut self, label: Label, junction: JunctionId) -> bool {
    self.entries.entry(label).or_default().insert(junction)
  }

  /// Junctions touched by `label`, `None` if it touches none.
  pub fn junctions_of(&self, label: Label) -> Option<&BTreeSet<JunctionId>> {
    self.entries.get(&label)
  }

  pub fn contains(&self, label: Label, junction: JunctionId) -> bool {
    self
      .entries
      .get(&label)
      .is_some_and(|junctions| junctions.contains(&junction))
  }

  /// Branches touching `junction`, ascending.
  pub fn branches_of_junction(&self, junction: JunctionId) -> Vec<Label> {
    self
      .entries
      .iter()
      .filter(|(_, junctions)| junctions.contains(&junction))
      .map(|(&label, _)| label)
      .collect()
  }

  /// Entries in ascending label order.
  pub fn iter(&self) -> impl Iterator<Item = (Label, &BTreeSet<JunctionId>)> + '_ {
    self.entries.iter().map(|(&label, junctions)| (label, junctions))
  }

  /// Number of branches with at least one junction.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Total number of (branch, junction) pairs.
  pub fn connection_count(&self) -> usize {
    self.entries.values().map(BTreeSet::len).sum()
  }
}

impl<'a> IntoIterator for &'a ConnectivityMap {
  type Item = (&'a Label, &'a BTreeSet<JunctionId>);
  type IntoIter = std::collections::btree_map::Iter<'a, Label, BTreeSet<JunctionId>>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.iter()
  }
}

/// Map every branch of `branches` to the junction shells it touches.
pub fn extract_connectivity(
  branches: &LabelGrid,
  junctions: &JunctionSet,
  inner_scale: f64,
  outer_scale: f64,
) -> ConnectivityMap {
  let reporter = ProgressReporter::silent();
  let progress = reporter.stage(0.0, 1.0, junctions.len());
  extract_connectivity_with_progress(branches, junctions, inner_scale, outer_scale, &progress)
}

#[tracing::instrument(skip_all, name = "branches::connect")]
pub(crate) fn extract_connectivity_with_progress(
  branches: &LabelGrid,
  junctions: &JunctionSet,
  inner_scale: f64,
  outer_scale: f64,
  progress: &StageProgress,
) -> ConnectivityMap {
  let ordered: Vec<&Junction> = junctions.iter().collect();

  let touched: Vec<(JunctionId, SmallVec<[Label; 8]>)> = ordered
    .par_iter()
    .map(|junction| {
      let labels = shell_labels(branches, junction, inner_scale, outer_scale);
      progress.advance(1);
      (junction.id, labels)
    })
    .collect();

  let mut map = ConnectivityMap::new();
  for (id, labels) in touched {
    for label in labels {
      map.insert(label, id);
    }
  }

  tracing::debug!(
    junctions = ordered.len(),
    branches = map.len(),
    connections = map.connection_count(),
    "extracted connectivity"
  );
  progress.finish();
  map
}

/// Sorted, deduplicated branch labels inside one junction's shell.
fn shell_labels(
  branches: &LabelGrid,
  junction: &Junction,
  inner_scale: f64,
  outer_scale: f64,
) -> SmallVec<[Label; 8]> {
  let shape = branches.shape();
  let spacing = shape.spacing();
  let shell = Shell::new(
    junction.scaled_radius(inner_scale),
    junction.scaled_radius(outer_scale),
  );

  let mut labels = SmallVec::new();
  let Some(bounds) = IndexBox::around(junction.center, junction.scaled_radius(outer_scale), shape)
  else {
    return labels;
  };

  let data = branches.data();
  for i0 in bounds.min[0]..=bounds.max[0] {
    for i1 in bounds.min[1]..=bounds.max[1] {
      for i2 in bounds.min[2]..=bounds.max[2] {
        let label = data[shape.offset(i0, i1, i2)];
        if label == BACKGROUND || labels.last() == Some(&label) {
          continue;
        }
        let voxel = I64Vec3::new(i0 as i64, i1 as i64, i2 as i64);
        if shell.contains(distance_squared(voxel, junction.center, spacing)) {
          labels.push(label);
        }
      }
    }
  }

  labels.sort_unstable();
  labels.dedup();
  labels
}

#[cfg(test)]
#[path = "connectivity_test.rs"]
mod connectivity_test;
