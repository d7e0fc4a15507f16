//! Junction and branch text tables.
//!
//! Junction table (input), one header line then one row per junction:
//!
//! ```text
//! jcLabel x y radius
//! 1 10 12 2.0
//! 2 31 12 1.5
//! ```
//!
//! Branch table (output), one row per branch touching any junction:
//!
//! ```text
//! brLabel connected_jcLabels
//! 3  1 2
//! ```

use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use vessel_branches::{ConnectivityMap, GridShape, Junction, JunctionId, JunctionSet};

/// Header line of the branch table.
pub const BRANCH_TABLE_HEADER: &str = "brLabel connected_jcLabels";

/// Read the junction table at `path` for a grid of `shape`.
pub fn read_junctions(path: &Path, shape: &GridShape, physical: bool) -> Result<JunctionSet> {
	let text = std::fs::read_to_string(path)
		.with_context(|| format!("Failed to read junction table: {}", path.display()))?;
	parse_junctions(&text, shape, physical)
		.with_context(|| format!("Malformed junction table: {}", path.display()))
}

/// Parse junction rows `label c0 .. c(D-1) radius`, skipping the header.
///
/// Coordinates are voxel indices, or physical positions when `physical` is
/// set. A repeated label replaces the earlier row.
pub fn parse_junctions(text: &str, shape: &GridShape, physical: bool) -> Result<JunctionSet> {
	let dims = shape.dims();
	let mut junctions = JunctionSet::new();

	for (number, line) in text.lines().enumerate().skip(1) {
		let line_no = number + 1;
		let tokens: Vec<&str> = line.split_whitespace().collect();
		if tokens.is_empty() {
			continue;
		}
		if tokens.len() != dims + 2 {
			bail!(
				"line {line_no}: expected {} columns (label, {dims} coordinates, radius), found {}",
				dims + 2,
				tokens.len()
			);
		}

		let id: JunctionId = tokens[0]
			.parse()
			.with_context(|| format!("line {line_no}: invalid junction label {:?}", tokens[0]))?;
		let radius: f64 = tokens[dims + 1]
			.parse()
			.with_context(|| format!("line {line_no}: invalid radius {:?}", tokens[dims + 1]))?;
		let coords = &tokens[1..=dims];

		let junction = if physical {
			let position = parse_all::<f64>(coords, line_no)?;
			Junction::from_physical(id, &position, radius, shape)
		} else {
			let index = parse_all::<i64>(coords, line_no)?;
			Junction::from_index(id, &index, radius, shape)
		}
		.with_context(|| format!("line {line_no}: invalid junction"))?;

		if junctions.insert(junction).is_some() {
			tracing::warn!(id, line = line_no, "duplicate junction label, keeping the later row");
		}
	}

	Ok(junctions)
}

fn parse_all<T: std::str::FromStr>(tokens: &[&str], line_no: usize) -> Result<Vec<T>>
where
	T::Err: std::error::Error + Send + Sync + 'static,
{
	tokens
		.iter()
		.map(|token| {
			token
				.parse()
				.with_context(|| format!("line {line_no}: invalid coordinate {token:?}"))
		})
		.collect()
}

/// Render the branch table: header, then `label  j1 j2 ..` per branch.
pub fn format_branch_table(connectivity: &ConnectivityMap) -> String {
	let mut out = String::new();
	out.push_str(BRANCH_TABLE_HEADER);
	out.push('\n');
	for (label, junctions) in connectivity.iter() {
		let ids: Vec<String> = junctions.iter().map(JunctionId::to_string).collect();
		let _ = writeln!(out, "{label}  {}", ids.join(" "));
	}
	out
}

/// Write the branch table to `path`.
pub fn write_branch_table(path: &Path, connectivity: &ConnectivityMap) -> Result<()> {
	std::fs::write(path, format_branch_table(connectivity))
		.with_context(|| format!("Failed to write branch table: {}", path.display()))
}

#[cfg(test)]
mod tests {
	use glam::I64Vec3;

	use super::*;

	fn shape_2d() -> GridShape {
		GridShape::new(&[20, 20]).unwrap()
	}

	#[test]
	fn test_header_skipped_and_rows_parsed() {
		let text = "jcLabel x y radius\n1 10 12 2.0\n\n7 3 4 1.5\n";
		let junctions = parse_junctions(text, &shape_2d(), false).unwrap();

		assert_eq!(junctions.len(), 2);
		let first = junctions.get(1).unwrap();
		assert_eq!(first.center, I64Vec3::new(10, 12, 0));
		assert_eq!(first.radius, 2.0);
		assert_eq!(junctions.get(7).unwrap().center, I64Vec3::new(3, 4, 0));
	}

	#[test]
	fn test_header_only() {
		let junctions = parse_junctions("jcLabel x y radius\n", &shape_2d(), false).unwrap();
		assert!(junctions.is_empty());
	}

	#[test]
	fn test_duplicate_label_last_wins() {
		let text = "header\n4 1 1 1.0\n4 5 6 2.0\n";
		let junctions = parse_junctions(text, &shape_2d(), false).unwrap();
		assert_eq!(junctions.len(), 1);
		assert_eq!(junctions.get(4).unwrap().center, I64Vec3::new(5, 6, 0));
	}

	#[test]
	fn test_wrong_column_count_names_line() {
		let text = "header\n1 10 12 2.0\n2 10 2.0\n";
		let err = parse_junctions(text, &shape_2d(), false).unwrap_err();
		assert!(format!("{err:#}").contains("line 3"));
	}

	#[test]
	fn test_bad_number_names_line() {
		let text = "header\n1 10 x 2.0\n";
		let err = parse_junctions(text, &shape_2d(), false).unwrap_err();
		let message = format!("{err:#}");
		assert!(message.contains("line 2"), "{message}");
		assert!(message.contains("\"x\""), "{message}");
	}

	#[test]
	fn test_physical_centers_snap_to_voxels() {
		let shape = shape_2d()
			.with_spacing(&[0.5, 2.0])
			.unwrap()
			.with_origin(&[1.0, 0.0])
			.unwrap();
		let junctions = parse_junctions("header\n2 3.0 8.2 1.0\n", &shape, true).unwrap();
		assert_eq!(junctions.get(2).unwrap().center, I64Vec3::new(4, 4, 0));
	}

	#[test]
	fn test_non_finite_physical_center_rejected() {
		for row in ["1 NaN 5 1.0", "2 inf 5 1.0"] {
			let err = parse_junctions(&format!("header\n{row}\n"), &shape_2d(), true).unwrap_err();
			let message = format!("{err:#}");
			assert!(message.contains("line 2"), "{message}");
			assert!(message.contains("non-finite center"), "{message}");
		}
	}

	#[test]
	fn test_three_dimensional_rows() {
		let shape = GridShape::new(&[8, 8, 8]).unwrap();
		let junctions = parse_junctions("header\n9 1 2 3 0.5\n", &shape, false).unwrap();
		assert_eq!(junctions.get(9).unwrap().center, I64Vec3::new(1, 2, 3));
		assert!(parse_junctions("header\n9 1 2 0.5\n", &shape, false).is_err());
	}

	#[test]
	fn test_branch_table_format() {
		let mut map = ConnectivityMap::new();
		map.insert(5, 2);
		map.insert(5, 1);
		map.insert(2, 7);

		assert_eq!(
			format_branch_table(&map),
			"brLabel connected_jcLabels\n2  7\n5  1 2\n"
		);
		assert_eq!(
			format_branch_table(&ConnectivityMap::new()),
			"brLabel connected_jcLabels\n"
		);
	}

	#[test]
	fn test_read_and_write_files() {
		let dir = tempfile::tempdir().unwrap();
		let input = dir.path().join("jc.txt");
		std::fs::write(&input, "jcLabel x y radius\n1 2 3 1.0\n").unwrap();
		let junctions = read_junctions(&input, &shape_2d(), false).unwrap();
		assert_eq!(junctions.len(), 1);

		let output = dir.path().join("br.txt");
		let mut map = ConnectivityMap::new();
		map.insert(1, 1);
		write_branch_table(&output, &map).unwrap();
		assert_eq!(
			std::fs::read_to_string(&output).unwrap(),
			"brLabel connected_jcLabels\n1  1\n"
		);

		let err = read_junctions(&dir.path().join("absent.txt"), &shape_2d(), false).unwrap_err();
		assert!(format!("{err:#}").contains("absent.txt"));
	}
}
