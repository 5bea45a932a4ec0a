//! Roadwar server - entry point
//!
//! Loads config and map, restores the last save (or starts a new game), then
//! serves WebSocket clients while the game loop runs until Ctrl-C.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use roadwar::core::config::GameConfig;
use roadwar::core::error::Result;
use roadwar::map::graph::RoadGraph;
use roadwar::persistence::StateManager;
use roadwar::server::{accept_loop, command_channel, GameServer};
use roadwar::world::{new_game, restore_game, World};

/// Authoritative road-graph wargame server
#[derive(Parser, Debug)]
#[command(name = "roadwar-server")]
#[command(about = "Run the authoritative game server over WebSocket")]
struct Args {
    /// TOML config file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Map file with nodes and edges
    #[arg(long, default_value = "data/world_graph.json")]
    map: PathBuf,

    /// Save file, read at boot and written on autosave and shutdown
    #[arg(long, default_value = "savegame.json")]
    save: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Ignore any existing save
    #[arg(long)]
    new_game: bool,

    /// Seed for the world RNG
    #[arg(long)]
    seed: Option<u64>,
}

fn load_world(args: &Args, config: GameConfig, graph: RoadGraph, state: &StateManager) -> World {
    if args.new_game {
        return new_game(config, graph);
    }
    match state.load() {
        Some(saved) => restore_game(config, graph, saved),
        None => new_game(config, graph),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roadwar=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    let graph = RoadGraph::load(&args.map)?;
    tracing::info!(
        map = %args.map.display(),
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "Map loaded"
    );

    let state = StateManager::new(args.save.clone());
    let world = load_world(&args, config, graph, &state);

    let listener = TcpListener::bind(&args.bind).await?;
    tracing::info!("Roadwar server listening on ws://{}", args.bind);

    let (commands, queue) = command_channel(world.config.command_queue_capacity);
    let (outbound, _) = broadcast::channel(256);
    tokio::spawn(accept_loop(
        listener,
        world.config.human_player_id.clone(),
        commands,
        outbound.clone(),
    ));

    let server = GameServer::new(world, queue, outbound, state);
    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("Roadwar server stopped");
    Ok(())
}
