//! Compact wire snapshots of the committed game state

use serde::{Deserialize, Serialize};

use super::projectile::Projectile;
use super::ship::Ship;
use super::world::GameState;

/// Full world snapshot in the compact single-letter layout clients expect.
///
/// Positions are already 1-decimal by construction; velocities are rounded
/// here, at the transmission boundary, so the simulation keeps its full
/// internal precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(rename = "t")]
    pub time: u64,
    #[serde(rename = "s")]
    pub ships: Vec<Ship>,
    #[serde(rename = "j")]
    pub projectiles: Vec<Projectile>,
}

impl WorldSnapshot {
    /// Capture a wire-ready snapshot from the committed state.
    ///
    /// Entities are sorted by id so identical states always serialize to
    /// identical bytes.
    pub fn capture(state: &GameState) -> Self {
        let mut ships: Vec<Ship> = state
            .ships
            .values()
            .map(|s| {
                let mut s = s.clone();
                s.velocity = s.velocity.rounded();
                s
            })
            .collect();
        ships.sort_by(|a, b| a.id.cmp(&b.id));

        let mut projectiles: Vec<Projectile> = state
            .projectiles
            .iter()
            .map(|p| {
                let mut p = p.clone();
                p.velocity = p.velocity.rounded();
                p
            })
            .collect();
        projectiles.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            time: state.time,
            ships,
            projectiles,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
