//! Runs the render engine against the headless backend.
//!
//! ```bash
//! cargo run -p lantern-demos --bin headless_frames -- --frames 300
//! RUST_LOG=trace cargo run -p lantern-demos --bin headless_frames -- --config demos/render_engine.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lantern_demos::{DemoConfig, build_scene, load_config, toggle_renderers};
use lantern_ecs::World;
use lantern_rendering::{HeadlessBackend, RenderingSystems, sort_by_combination};

/// Lantern headless frame loop.
#[derive(Parser, Debug)]
#[command(
    name = "headless_frames",
    about = "Drive the Lantern render engine without a GPU",
    long_about = "Builds a synthetic scene (one destination, a few viewports, a material \
        and mesh library and a nested scissor chain), then runs the render engine \
        against the headless backend for a fixed number of frames.\n\n\
        Settings come from the TOML file given with --config; command line flags \
        override individual values.",
    version
)]
struct Args {
    /// TOML file with the demo configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to run.
    #[arg(long)]
    frames: Option<u64>,

    /// Number of renderers to spawn.
    #[arg(long)]
    renderers: Option<usize>,

    /// Sort each batch by material and mesh before it reaches the backend.
    #[arg(long)]
    sort: bool,
}

impl Args {
    fn resolve(&self) -> Result<DemoConfig, String> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => DemoConfig::default(),
        };
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(renderers) = self.renderers {
            config.renderers = renderers;
        }
        config.sort_batches |= self.sort;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut world = World::new();
    let scene = match build_scene(&mut world, &config) {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("Failed to build scene: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Scene: {} renderers, {} viewports, {} scissor panels",
        scene.renderers.len(),
        scene.viewports.len(),
        scene.scissors.len()
    );

    let mut systems = RenderingSystems::with_config(config.engine.clone());
    if let Err(e) = systems.register_backend(HeadlessBackend::new(config.destination.label.clone())) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }
    if config.sort_batches {
        systems.add_plugin(sort_by_combination);
    }

    let started = std::time::Instant::now();
    let mut toggles = 0;
    for frame in 0..config.frames {
        if config.toggle_interval > 0 && frame > 0 && frame % config.toggle_interval == 0 {
            toggles += 1;
            let changed = toggle_renderers(&mut world, &scene, toggles);
            log::debug!("Frame {frame}: toggled {changed} renderers");
        }
        if let Err(e) = systems.update(&mut world) {
            log::error!("Frame {frame} failed: {e}");
            return ExitCode::FAILURE;
        }
    }
    let elapsed = started.elapsed();

    if let Some(machine) = systems.engine().machine(scene.destination) {
        let drawn: usize = machine
            .viewport_groups()
            .iter()
            .map(|group| group.entity_count())
            .sum();
        log::info!("Last frame drew {drawn} renderers");
    }
    log::info!(
        "Rendered {} frames in {:.2?} ({:.1} µs/frame)",
        config.frames,
        elapsed,
        elapsed.as_secs_f64() * 1e6 / config.frames.max(1) as f64
    );

    // Finishing the backend logs its counters.
    if let Err(e) = systems.unregister_backend(&config.destination.label) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
