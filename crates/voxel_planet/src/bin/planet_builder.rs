//! # Planet Builder
//!
//! Headless driver: builds a planet from a TOML config, applies a test
//! brush and prints mesh statistics.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug planet_builder --config data/planet.toml --seed 42 --parallel
//! ```

use std::error::Error;
use std::process::ExitCode;
use std::time::Instant;

use glam::DVec3;
use tracing_subscriber::EnvFilter;
use voxel_planet::{CancelToken, PlanetConfig, PlanetStats, RadialBands, VoxelPlanet, WorldSeed};

/// Command line options.
struct Options {
    config_path: Option<String>,
    seed: Option<u64>,
    parallel: bool,
    radial_colors: bool,
    dig_strength: f64,
    dig_radius: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config_path: None,
            seed: None,
            parallel: false,
            radial_colors: false,
            dig_strength: -6.0,
            dig_radius: 4.0,
        }
    }
}

fn print_usage() {
    println!("Usage: planet_builder [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>      Planet config (TOML, default: built-in)");
    println!("  -s, --seed <SEED>        Override the config seed");
    println!("  -p, --parallel           Generate on the rayon pool");
    println!("      --radial-colors      Colour by fixed radii (20/40/60/80)");
    println!("      --dig <STRENGTH>     Brush strength at the north pole (default: -6)");
    println!("      --dig-radius <R>     Brush radius (default: 4)");
    println!("  -h, --help               Show this help");
}

/// Parses arguments. Returns `None` if help was requested.
fn parse_args() -> Option<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    options.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    options.seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--parallel" | "-p" => options.parallel = true,
            "--radial-colors" => options.radial_colors = true,
            "--dig" => {
                if i + 1 < args.len() {
                    options.dig_strength = args[i + 1].parse().unwrap_or(options.dig_strength);
                    i += 1;
                }
            }
            "--dig-radius" => {
                if i + 1 < args.len() {
                    options.dig_radius = args[i + 1].parse().unwrap_or(options.dig_radius);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_usage();
                return None;
            }
            other => tracing::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    Some(options)
}

fn print_stats(label: &str, stats: PlanetStats) {
    println!("┌─ {label} ");
    println!("│ Chunks:           {}", stats.chunks);
    println!("│ Meshed chunks:    {}", stats.meshed_chunks);
    println!("│ Triangles:        {}", stats.triangles);
    println!("│ Overlay entries:  {}", stats.overlay_entries);
    println!("└──────────────────────────────");
}

fn run(options: &Options) -> Result<(), Box<dyn Error>> {
    let mut config = match &options.config_path {
        Some(path) => PlanetConfig::load(path)?,
        None => PlanetConfig::default(),
    };
    if let Some(seed) = options.seed {
        config.seed = WorldSeed::new(seed);
    }
    if options.parallel {
        config.generation.parallel = true;
    }

    let batch_size = config.generation.batch_size;
    let parallel = config.generation.parallel;
    let mut planet = VoxelPlanet::new(config)?;
    if options.radial_colors {
        planet = planet.with_material_lookup(RadialBands::new());
    }

    if parallel {
        planet.generate_parallel();
    } else {
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        let cancel = CancelToken::new();
        let mut last_reported = 0u32;
        let outcome = runtime.block_on(planet.generate_async(
            batch_size,
            |progress| {
                let percent = (progress.fraction() * 100.0) as u32;
                if percent >= last_reported + 10 || progress.is_complete() {
                    tracing::info!(
                        "Generating: {}% ({}/{})",
                        percent,
                        progress.processed,
                        progress.total
                    );
                    last_reported = percent;
                }
            },
            &cancel,
        ))?;
        tracing::debug!("Progressive generation finished: {:?}", outcome);
    }
    print_stats("GENERATED", planet.stats());

    let surface = planet.config().radius + planet.config().surface_offset;
    let pole = DVec3::new(0.0, surface, 0.0);
    let started = Instant::now();
    let report = planet.modify_density(pole, options.dig_strength, options.dig_radius)?;
    println!(
        "Brush at {pole}: {} voxels, {} chunks regenerated in {:.2?}",
        report.voxels_modified,
        report.chunks_regenerated.len(),
        started.elapsed()
    );
    print_stats("EDITED", planet.stats());

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(options) = parse_args() else {
        return ExitCode::SUCCESS;
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
