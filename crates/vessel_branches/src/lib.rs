//! vessel_branches - Branch decomposition of tubular voxel structures
//!
//! Splits a segmented vessel or airway tree into branches at known junction
//! points and reports which junctions each branch touches.
//!
//! # Pipeline
//!
//! - **Carve**: remove every junction's inner sphere (`inner_scale * radius`)
//!   from the structure mask
//! - **Label**: face-connected components of what remains, numbered in
//!   lexicographic scan order
//! - **Filter**: demote components smaller than the minimum size
//! - **Connect**: map each branch to the junctions whose shell
//!   `[inner_scale * r, outer_scale * r]` it reaches
//!
//! Grids of 1 to 3 dimensions are supported. All stages run on rayon and
//! produce identical results for any number of worker threads.
//!
//! # Example
//!
//! ```ignore
//! use vessel_branches::{decompose, DecompositionConfig, Grid, GridShape, Junction, JunctionSet};
//!
//! let shape = GridShape::new(&[64, 64, 64])?.with_spacing(&[0.5, 0.5, 0.8])?;
//! let grid = Grid::from_vec(shape, segmentation)?;
//!
//! let mut junctions = JunctionSet::new();
//! junctions.insert(Junction::from_index(1, &[20, 31, 40], 2.0, &shape)?);
//!
//! let result = decompose(&grid, &junctions, &DecompositionConfig::default())?;
//! for (branch, ids) in result.connectivity.iter() {
//!     println!("branch {branch} touches {ids:?}");
//! }
//! ```

pub mod constants;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod junction;

pub use error::{DecompositionError, Result};
pub use grid::{Grid, GridShape, Label, LabelGrid, StructureValue};
pub use junction::{Junction, JunctionId, JunctionSet};

// Configuration
pub mod config;
pub use config::DecompositionConfig;

// Stages
pub mod carve;
pub mod connectivity;
pub mod filter;
pub mod label;
mod union_find;

pub use carve::{carve, CarveOutput};
pub use connectivity::{extract_connectivity, ConnectivityMap};
pub use filter::{filter_fragments, FilterOutput};
pub use label::{label_components, Labeling};

// Orchestration
pub mod pipeline;
pub mod progress;

pub use pipeline::{decompose, decompose_with_progress, Decomposition, DecompositionStats};
pub use progress::ProgressFn;

#[cfg(test)]
pub(crate) mod test_utils;
