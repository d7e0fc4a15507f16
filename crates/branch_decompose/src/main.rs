//! Vessel branch decomposition driver.
//!
//! Reads a segmented grid and a junction table, splits the structure into
//! branches at the junctions and writes:
//! - the branch label grid (same JSON document format as the input)
//! - the branch table: which junctions each branch touches
//! - optionally the junction territory grid (nearest junction per carved voxel)

mod config;
mod grid_io;
mod tables;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing_subscriber::EnvFilter;
use vessel_branches::{decompose, decompose_with_progress, Decomposition, DecompositionConfig, Grid};

use config::FileConfig;

/// Vessel branch decomposition.
#[derive(Parser, Debug)]
#[command(name = "branch_decompose")]
#[command(about = "Splits a segmented vessel tree into branches at known junctions")]
struct Args {
	/// Input grid (JSON document).
	input: PathBuf,

	/// Output branch label grid (JSON document).
	output: PathBuf,

	/// Junction table: header line, then `label index.. radius` rows.
	junction_info_in: PathBuf,

	/// Output branch table.
	branch_info_out: PathBuf,

	/// Inner sphere scale (multiplies each junction radius).
	#[arg(allow_negative_numbers = true)]
	inner_scale: f64,

	/// Outer shell scale (multiplies each junction radius).
	#[arg(allow_negative_numbers = true)]
	outer_scale: f64,

	/// Branches with fewer voxels are dropped [default: 6].
	#[arg(long)]
	min_component_size: Option<usize>,

	/// Renumber surviving branches 1..=n.
	#[arg(long)]
	compact_labels: bool,

	/// Worker threads (default: all cores).
	#[arg(long)]
	threads: Option<usize>,

	/// TOML file with a `[decomposition]` table; command-line values win.
	#[arg(long)]
	config: Option<PathBuf>,

	/// Junction table coordinates are physical positions, not voxel indices.
	#[arg(long)]
	physical_centers: bool,

	/// Also write the junction territory grid here.
	#[arg(long)]
	territory_out: Option<PathBuf>,

	/// No progress or table echo on stdout.
	#[arg(short, long)]
	quiet: bool,

	/// Debug logging (overrides RUST_LOG).
	#[arg(short, long)]
	verbose: bool,
}

impl Args {
	/// File configuration (if any) overridden by command-line values.
	fn decomposition_config(&self) -> Result<DecompositionConfig> {
		let mut config = match &self.config {
			Some(path) => FileConfig::load(path)?.decomposition,
			None => DecompositionConfig::default(),
		};

		config.inner_scale = self.inner_scale;
		config.outer_scale = self.outer_scale;
		if let Some(size) = self.min_component_size {
			config.min_component_size = size;
		}
		if self.compact_labels {
			config.compact_labels = true;
		}
		if self.threads.is_some() {
			config.num_threads = self.threads;
		}
		Ok(config)
	}
}

fn main() -> Result<()> {
	let args = Args::parse();
	init_tracing(args.verbose);
	run(&args)
}

fn init_tracing(verbose: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
	};
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn run(args: &Args) -> Result<()> {
	let config = args.decomposition_config()?;

	let grid: Grid<u32> = grid_io::read_grid(&args.input)?;
	let junctions = tables::read_junctions(&args.junction_info_in, grid.shape(), args.physical_centers)?;
	tracing::info!(
		extent = ?grid.shape().real_extent(),
		junctions = junctions.len(),
		inner_scale = config.inner_scale,
		outer_scale = config.outer_scale,
		min_component_size = config.min_component_size,
		"decomposing"
	);

	let result = if args.quiet {
		decompose(&grid, &junctions, &config)
	} else {
		let printer = progress_printer();
		let result = decompose_with_progress(&grid, &junctions, &config, &printer);
		println!();
		result
	}
	.context("Decomposition failed")?;

	write_outputs(args, &result)?;
	if !args.quiet {
		print!("{}", tables::format_branch_table(&result.connectivity));
	}

	let stats = &result.stats;
	tracing::info!(
		branches = stats.surviving_branches,
		removed = stats.components_removed,
		isolated = stats.isolated_branches,
		connections = stats.connections,
		total_ms = stats.total_us() / 1000,
		"done"
	);
	Ok(())
}

fn write_outputs(args: &Args, result: &Decomposition) -> Result<()> {
	grid_io::write_grid(&args.output, &result.branches)?;
	tables::write_branch_table(&args.branch_info_out, &result.connectivity)?;
	if let Some(path) = &args.territory_out {
		grid_io::write_grid(path, &result.territory)?;
	}
	Ok(())
}

/// Progress callback rewriting `NN% completed` in place on stdout.
fn progress_printer() -> impl Fn(f32) + Sync {
	let last = AtomicU32::new(u32::MAX);
	move |fraction: f32| {
		let percent = (fraction * 100.0) as u32;
		if last.swap(percent, Ordering::Relaxed) != percent {
			let mut out = std::io::stdout().lock();
			let _ = write!(out, "{percent}% completed\r");
			let _ = out.flush();
		}
	}
}
