//! Cube Rain headless simulation CLI.
//!
//! Provides two modes of operation:
//! - `run`: Rain cubes for N frames and print contact statistics
//! - `info`: Print the version and the default configuration

use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::{Parser, Subcommand};

use cuberain_physics::error::CubeRainError;
use cuberain_physics::world::PhysicsWorld;
use cuberain_scene::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Falling cubes with contact begin/end tracking.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rain headless and print statistics.
    Run {
        /// Number of frames to simulate.
        #[arg(short = 'n', long, default_value_t = 600)]
        frames: u64,

        /// Cubes in the pool (overrides the config file).
        #[arg(short, long)]
        cubes: Option<usize>,

        /// Spawn seed (overrides the config file).
        #[arg(short, long)]
        seed: Option<u64>,

        /// TOML scene configuration.
        #[arg(long)]
        config: Option<std::path::PathBuf>,

        /// Print a stats line every K frames; 0 disables.
        #[arg(short, long, default_value_t = 60)]
        report_every: u64,

        /// Start with physics paused.
        #[arg(long)]
        paused: bool,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_config(
    path: Option<&std::path::Path>,
    cubes: Option<usize>,
    seed: Option<u64>,
) -> Result<CubeRainConfig, CubeRainError> {
    let mut config = match path {
        Some(path) => CubeRainConfig::from_file(path)?,
        None => CubeRainConfig::default(),
    };
    if let Some(cubes) = cubes {
        config.cube_count = cubes;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn run_rain(config: CubeRainConfig, frames: u64, report_every: u64, paused: bool) {
    let mut app = App::new();
    app.add_plugins(LogPlugin::default());
    app.add_plugins(CubeRainPlugin::new(config));
    app.finish();
    app.cleanup();

    if paused {
        app.world_mut().resource_mut::<CubeRain>().toggle_pause();
    }

    for frame in 1..=frames {
        app.update();

        if report_every > 0 && frame % report_every == 0 {
            let stats = app.world().resource::<RainStats>();
            let rain = app.world().resource::<CubeRain>();
            let world = app.world().resource::<PhysicsWorld>();
            println!(
                "frame {frame}: t={:.2}s, cubes={}, touching={}, highlighted={} ({} in contact), began={}, ended={}, recycled={}",
                rain.clock(),
                rain.len(),
                world.active_collisions().len(),
                rain.highlights().len(),
                rain.highlights().touching(),
                stats.contacts_began,
                stats.contacts_ended,
                stats.cubes_recycled
            );
        }
    }

    let stats = app.world().resource::<RainStats>();
    println!(
        "\ntotal: frames={}, engine_steps={}, began={}, ended={}, recycled={}, peak_highlighted={}",
        stats.frames,
        stats.engine_steps,
        stats.contacts_began,
        stats.contacts_ended,
        stats.cubes_recycled,
        stats.peak_highlighted
    );
    if stats.failed_frames > 0 {
        eprintln!("{} frames failed", stats.failed_frames);
    }
}

fn info_text() -> String {
    use std::fmt::Write;

    let config = CubeRainConfig::default();
    let mut out = String::new();
    // Every workspace member inherits the workspace version.
    let _ = writeln!(out, "cuberain v{}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out);
    let _ = writeln!(out, "defaults:");
    let _ = writeln!(out, "  cubes      {} (max {})", config.cube_count, config.max_cube_count);
    let _ = writeln!(out, "  frame_dt   {:.4}s", config.frame_dt);
    let _ = writeln!(
        out,
        "  physics    {:.0} Hz, {} max sub-steps",
        config.physics.physics_hz(),
        config.physics.max_sub_steps
    );
    let _ = writeln!(out, "  gravity    {:?}", config.physics.gravity);
    let _ = writeln!(out, "  highlight  {} ms after last contact", config.highlight_ms);
    let _ = writeln!(
        out,
        "  spawn      x,z in [-{w}, {w}], y in [{}, {}]",
        config.spawn_floor,
        i64::from(config.spawn_floor) + i64::from(config.spawn_layers) - 1,
        w = config.spawn_half_width
    );
    let _ = writeln!(out, "  fall-off   y < {}", config.fall_off_threshold);
    let _ = writeln!(out);
    let _ = writeln!(out, "edition: 2024");
    out
}

fn run_info() {
    print!("{}", info_text());
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            frames,
            cubes,
            seed,
            config,
            report_every,
            paused,
        }) => match load_config(config.as_deref(), cubes, seed) {
            Ok(config) => run_rain(config, frames, report_every, paused),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(2);
            }
        },
        Some(Commands::Info) => run_info(),
        None => {
            // Default: ten seconds of rain with defaults
            run_rain(CubeRainConfig::default(), 600, 60, false);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
