//! Optional TOML configuration for the decomposition driver.
//!
//! ```toml
//! [decomposition]
//! inner_scale = 2.5
//! outer_scale = 3.0
//! min_component_size = 6
//! compact_labels = false
//! num_threads = 8
//! ```
//!
//! Every field is optional; missing fields keep their defaults and
//! command-line values override the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use vessel_branches::DecompositionConfig;

/// Root of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
	/// Decomposition parameters.
	pub decomposition: DecompositionConfig,
}

impl FileConfig {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content).with_context(|| format!("Failed to parse config TOML: {}", path.display()))
	}

	fn parse(content: &str) -> Result<Self> {
		Ok(toml::from_str(content)?)
	}
}
