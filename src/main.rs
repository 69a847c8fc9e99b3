//! Space Arena Server - authoritative simulation for a multiplayer arcade space game
//!
//! This is the main entry point for the simulation server. It handles:
//! - Loading physics settings from the environment
//! - Running the fixed-rate authoritative tick loop
//! - Broadcasting collision events to whoever implements response policy

mod config;
mod game;
mod util;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Settings;
use crate::game::World;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load settings
    let settings = Settings::from_env()?;

    // Initialize tracing
    init_tracing(&settings.log_level);

    info!("Starting Space Arena Server");
    info!(
        rotation = settings.constants.ship_rotation,
        acceleration = settings.constants.ship_acceleration,
        drag = settings.constants.ship_drag,
        debug = settings.debug,
        "Physics constants loaded"
    );

    let seed = settings.world_seed.unwrap_or_else(rand::random);
    let (world, handle) = World::new(settings, seed);

    // Run the simulation on its own task; the handle keeps the command
    // channel open for the lifetime of the process.
    let world_task = tokio::spawn(world.run());

    shutdown_signal().await;

    drop(handle);
    world_task.await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
