use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use orbital_flight::{FlightScript, RocketConfig, build_demo_scene};
use orbital_input::{InputState, Key};
use orbital_kernel::{SimConfig, Simulation};
use orbital_render::{DebugTextRenderer, FrameAnchors, GeometryCache, RenderFrame, Renderer};
use orbital_tools::WorldInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbital-cli", about = "Headless runner for the orbital flight demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, default configuration and the built-in route
    Info,
    /// Fly the demo scene headless
    Fly {
        /// Number of ticks to run (60 ticks = one wall-clock second)
        #[arg(short, long, default_value = "3600")]
        ticks: u64,
        /// Physics sub-steps per tick
        #[arg(long)]
        time_scale: Option<u32>,
        /// Simulation config file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Flight script file (.yaml, .yml or .json); defaults to the built-in route
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Tick on which launch is pressed
        #[arg(long, default_value = "1")]
        launch_tick: u64,
        /// Print a status line every N ticks (0 disables)
        #[arg(long, default_value = "600")]
        report_every: u64,
        /// Dump the final frame as text
        #[arg(long)]
        dump_frame: bool,
    },
    /// Run the demo for a while, then list every entity
    Inspect {
        /// Number of ticks to run before inspecting
        #[arg(short, long, default_value = "300")]
        ticks: u64,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    let config = match path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn load_script(path: Option<&PathBuf>) -> anyhow::Result<FlightScript> {
    match path {
        Some(path) => FlightScript::load(path)
            .with_context(|| format!("loading flight script {}", path.display())),
        None => Ok(FlightScript::default_route()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = SimConfig::default();
            println!("orbital-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "physics: dt={:.4}s tick={}Hz G={:e} law={:?}",
                config.physics_dt, config.tick_rate_hz, config.gravitational_constant, config.gravity_law
            );
            println!("rocket: {:?}", RocketConfig::default());
            println!("built-in route:");
            for step in FlightScript::default_route().steps() {
                println!("  t+{:>6.1}s {:?}", step.time, step.action);
            }
        }
        Commands::Fly {
            ticks,
            time_scale,
            config,
            script,
            launch_tick,
            report_every,
            dump_frame,
        } => {
            let config = load_config(config.as_ref())?;
            let script = load_script(script.as_ref())?;
            println!("Flying {} script steps for up to {ticks} ticks", script.len());

            let mut sim = Simulation::new(config);
            if let Some(scale) = time_scale {
                sim.context.set_time_scale(scale);
            }
            let scene = build_demo_scene(&mut sim, script, RocketConfig::default());
            let anchors = FrameAnchors {
                sun: Some(scene.sun),
                player: Some(scene.rocket),
            };

            let mut input = InputState::new();
            let mut cache = GeometryCache::new();
            let mut frame = RenderFrame::capture(&mut sim, anchors);
            cache.render(&frame);

            for tick in 1..=ticks {
                if tick == launch_tick {
                    input.press(Key::Space);
                }
                sim.advance(&mut input);
                frame = RenderFrame::capture(&mut sim, anchors);
                let stats = cache.render(&frame);

                if report_every > 0 && tick % report_every == 0 {
                    println!("{}", WorldInspector::summary(&sim));
                    if let Some(rocket) = WorldInspector::inspect_entity(&sim, scene.rocket) {
                        println!("  {rocket}");
                    }
                    println!("  {stats}");
                }
                if sim.is_halted() {
                    println!("Halted at tick {tick}");
                    break;
                }
            }

            println!("{}", WorldInspector::summary(&sim));
            if dump_frame {
                print!("{}", DebugTextRenderer::new().render(&frame));
            }
        }
        Commands::Inspect { ticks } => {
            let mut sim = Simulation::default();
            let scene = build_demo_scene(
                &mut sim,
                FlightScript::default_route(),
                RocketConfig {
                    auto_launch: true,
                    ..RocketConfig::default()
                },
            );
            let mut input = InputState::new();
            for _ in 0..ticks {
                sim.advance(&mut input);
            }

            println!("{}", WorldInspector::summary(&sim));
            for id in WorldInspector::list_entities(&sim) {
                let Some(info) = WorldInspector::inspect_entity(&sim, id) else {
                    continue;
                };
                let label = [
                    (scene.origin, "origin"),
                    (scene.sun, "sun"),
                    (scene.halo, "halo"),
                    (scene.planet, "planet"),
                    (scene.moon, "moon"),
                    (scene.pad, "pad"),
                    (scene.rocket, "rocket"),
                    (scene.spawn_point, "nozzle"),
                    (scene.sky, "sky"),
                    (scene.camera, "camera"),
                ]
                .iter()
                .find_map(|(e, name)| (*e == id).then_some(*name))
                .unwrap_or("exhaust");
                println!("  {label:<8} {info}");
            }
        }
    }

    Ok(())
}
