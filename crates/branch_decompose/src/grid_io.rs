//! JSON grid documents.
//!
//! ```json
//! { "extent": [64, 64, 40], "spacing": [0.6, 0.6, 1.0], "origin": [0, 0, 0], "data": [0, 1, ...] }
//! ```
//!
//! `extent` fixes the dimensionality; `spacing` and `origin` are optional
//! and default to 1 and 0. `data` is in row-major order, axis 0 slowest.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use vessel_branches::{Grid, GridShape};

/// On-disk form of a grid.
#[derive(Debug, Serialize, Deserialize)]
pub struct GridDocument<T> {
	pub extent: Vec<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub spacing: Option<Vec<f64>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin: Option<Vec<f64>>,
	pub data: Vec<T>,
}

impl<T: Clone> GridDocument<T> {
	/// Document describing `grid`, including its spacing and origin.
	pub fn from_grid(grid: &Grid<T>) -> Self {
		let shape = grid.shape();
		let dims = shape.dims();
		Self {
			extent: shape.real_extent().to_vec(),
			spacing: Some(shape.spacing().to_array()[..dims].to_vec()),
			origin: Some(shape.origin().to_array()[..dims].to_vec()),
			data: grid.data().to_vec(),
		}
	}
}

impl<T> GridDocument<T> {
	/// Validate the metadata and build a grid.
	pub fn into_grid(self) -> Result<Grid<T>> {
		let mut shape = GridShape::new(&self.extent).context("Invalid grid extent")?;
		if let Some(spacing) = &self.spacing {
			shape = shape.with_spacing(spacing).context("Invalid grid spacing")?;
		}
		if let Some(origin) = &self.origin {
			shape = shape.with_origin(origin).context("Invalid grid origin")?;
		}
		Grid::from_vec(shape, self.data).context("Invalid grid data")
	}
}

/// Read a grid document from `path`.
pub fn read_grid<T: DeserializeOwned>(path: &Path) -> Result<Grid<T>> {
	let file =
		File::open(path).with_context(|| format!("Failed to open grid file: {}", path.display()))?;
	let document: GridDocument<T> = serde_json::from_reader(BufReader::new(file))
		.with_context(|| format!("Failed to parse grid file: {}", path.display()))?;
	document
		.into_grid()
		.with_context(|| format!("Malformed grid file: {}", path.display()))
}

/// Write `grid` as a document to `path`.
pub fn write_grid<T: Serialize + Clone>(path: &Path, grid: &Grid<T>) -> Result<()> {
	let file =
		File::create(path).with_context(|| format!("Failed to create grid file: {}", path.display()))?;
	let mut writer = BufWriter::new(file);
	serde_json::to_writer(&mut writer, &GridDocument::from_grid(grid))
		.with_context(|| format!("Failed to write grid file: {}", path.display()))?;
	writer
		.flush()
		.with_context(|| format!("Failed to write grid file: {}", path.display()))
}
