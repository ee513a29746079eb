//! `robomap` – command line front end for the world map.
//!
//! - `robomap replay <scenario.json>` replays a recorded scenario (robot
//!   snapshots plus observation events, one frame per planning cycle) and
//!   prints the resulting map.
//! - `robomap check-config` validates the wall configuration.
//!
//! Both read `~/.robomap/config.toml` unless `--config` is given.

mod render;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use robomap_world::config;
use robomap_world::snapshot::Scenario;

#[derive(Parser, Debug)]
#[command(name = "robomap", version, about = "Robot world map tools")]
struct Cli {
    /// Path to the world map config (defaults to ~/.robomap/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded scenario and print the resulting world map.
    Replay {
        /// Scenario JSON file.
        scenario: PathBuf,
    },
    /// Validate the wall configuration.
    CheckConfig,
}

fn main() -> ExitCode {
    // RUST_LOG selects the filter (default "info"); ROBOMAP_LOG_FORMAT=json
    // switches to newline-delimited JSON.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("ROBOMAP_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config_path = cli.config.unwrap_or_else(config::config_path);
    let (cfg, mut map) = config::load_world_map(&config_path).map_err(|e| e.to_string())?;
    info!(path = %config_path.display(), walls = cfg.walls.len(), "configuration loaded");

    match cli.command {
        Command::CheckConfig => {
            println!(
                "  {} {} wall(s) registered from {}",
                "✓".green().bold(),
                map.registry().len(),
                config_path.display().to_string().bold()
            );
            for (id, spec) in map.registry().iter() {
                println!(
                    "    • wall {} – length {:.0} mm, {} marker(s), {} doorway(s)",
                    id.to_string().bold(),
                    spec.length,
                    spec.markers.len(),
                    spec.doorways.len()
                );
            }
        }
        Command::Replay { scenario } => {
            let raw = fs::read_to_string(&scenario)
                .map_err(|e| format!("Failed to read scenario at {}: {}", scenario.display(), e))?;
            let scenario = Scenario::from_json(&raw)
                .map_err(|e| format!("Failed to parse scenario: {}", e))?;
            scenario.replay(&mut map);
            println!(
                "\n  {} after {} frame(s)\n",
                "World map".bold().cyan(),
                scenario.frames.len()
            );
            for line in render::render_map(&map) {
                println!("{line}");
            }
        }
    }
    Ok(())
}
