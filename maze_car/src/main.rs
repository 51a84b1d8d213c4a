// main.rs - Headless maze car simulator: one-shot generation or the control API server

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use maze_car_sim::http_server;
use maze_car_sim::maze::analysis;
use maze_car_sim::{InitPhase, Simulation, SimulationConfig};

/// CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a JSON simulation config; missing fields use defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Cells per chunk edge
    #[arg(short = 's', long)]
    pub chunk_size: Option<i32>,

    /// Chunks along X
    #[arg(short = 'W', long)]
    pub width: Option<i32>,

    /// Chunks along Z
    #[arg(short = 'H', long)]
    pub height: Option<i32>,

    /// Seed for reproducible carving
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the 2x2 finish room in the middle of the maze
    #[arg(long)]
    pub no_finish: bool,

    /// Pre-shuffle direction order: N,E,S,W when true, N,W,S,E when false
    #[arg(long)]
    pub right_hand_rule: Option<bool>,

    /// Control API port (PORT env var still wins)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Write the maze summary and audit to this JSON file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Start HTTP control API mode
    #[arg(long)]
    pub server: bool,
}

async fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    if let Some(chunk_size) = args.chunk_size {
        config.maze.chunk_size = chunk_size;
    }
    if let Some(width) = args.width {
        config.maze.size_in_chunks.x = width;
    }
    if let Some(height) = args.height {
        config.maze.size_in_chunks.z = height;
    }
    if args.seed.is_some() {
        config.maze.seed = args.seed;
    }
    if args.no_finish {
        config.maze.create_finish_area = false;
    }
    if let Some(rule) = args.right_hand_rule {
        config.maze.use_right_hand_rule = rule;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn generate_once(config: SimulationConfig, report_path: Option<&PathBuf>) -> Result<()> {
    let simulation = Simulation::with_phases(config, |phase| match phase {
        InitPhase::Generated => info!("Phase: maze carved"),
        InitPhase::Indexed => info!("Phase: node map built"),
        InitPhase::AgentSpawned => info!("Phase: car spawned"),
        InitPhase::Ready => info!("Phase: ready"),
    })
    .context("Maze generation failed")?;

    let summary = simulation.summary();
    let data = simulation.maze().data();
    let audit = analysis::validate(data);
    let car = simulation.navigator().status();

    println!("Maze {} (seed {})", summary.id, summary.seed);
    println!(
        "  {}x{} chunks of {} cells -> {}x{} cells, {:.1} x {:.1} world units",
        summary.size_in_chunks.x,
        summary.size_in_chunks.z,
        summary.chunk_size,
        summary.total_cells_x,
        summary.total_cells_z,
        summary.total_width,
        summary.total_depth
    );
    println!(
        "  reachable {}/{} cells, {} asymmetric walls",
        audit.reachable_cells,
        audit.total_cells,
        audit.asymmetric_walls.len()
    );
    println!("  car at chunk {} cell {} facing {}", car.chunk, car.cell, car.direction);
    println!();
    print!("{}", analysis::render_ascii(data));

    if !audit.is_connected() {
        warn!("Maze is not fully connected");
    }

    if let Some(path) = report_path {
        let json = serde_json::to_vec_pretty(&serde_json::json!({
            "maze": summary,
            "audit": audit,
            "spawn": car.global,
        }))?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Starting with {args:?}");

    let config = load_config(&args).await?;

    if args.server {
        info!("HTTP control API mode");
        return http_server::start_server(config).await;
    }

    generate_once(config, args.report.as_ref()).await
}
