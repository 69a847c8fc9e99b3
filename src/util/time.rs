//! Time utilities for game simulation

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Simulation tick rate
pub const SIMULATION_TPS: u32 = 30;

/// Rate at which wire snapshots are published
pub const SNAPSHOT_TPS: u32 = 10;

/// Wall-clock duration of one tick
pub fn tick_duration() -> Duration {
    Duration::from_micros(1_000_000 / SIMULATION_TPS as u64)
}
