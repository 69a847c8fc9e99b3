//! Projectile entity and its per-tick update

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::{angle_and_speed_to_vector, Point, Vec2};
use super::world::GameState;

/// Projectile hitbox radius in world units.
pub const PROJECTILE_RADIUS: f64 = 3.0;

/// Authoritative projectile snapshot, replaced wholesale every tick like a
/// ship. Lifecycle (expiry, hit removal) is decided by the driver's caller,
/// not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    #[serde(rename = "i")]
    pub id: String,
    #[serde(rename = "o")]
    pub owner: String,
    #[serde(rename = "p")]
    pub position: Point,
    #[serde(rename = "v")]
    pub velocity: Vec2,
}

impl Projectile {
    /// Spawn a projectile travelling along `angle` at `speed`, with a
    /// freshly minted id.
    pub fn new(owner: impl Into<String>, position: Point, angle: f64, speed: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner: owner.into(),
            position,
            velocity: angle_and_speed_to_vector(angle, speed),
        }
    }

    /// Advance this projectile by one tick: straight-line integration of
    /// the elapsed time since `state.time`, mirroring the ship step without
    /// thrust or drag.
    pub fn tick(&self, now: u64, state: &GameState) -> Projectile {
        let elapsed_millis = now.saturating_sub(state.time);
        let elapsed = elapsed_millis as f64 / 1000.0;

        Projectile {
            id: self.id.clone(),
            owner: self.owner.clone(),
            position: self.position.advanced(self.velocity, elapsed),
            velocity: self.velocity,
        }
    }
}
