//! Game simulation modules

pub mod geometry;
pub mod projectile;
pub mod ship;
pub mod snapshot;
pub mod world;

pub use world::{GameState, World, WorldHandle};

use serde::{Deserialize, Serialize};

/// A proximity collision detected during a tick.
///
/// Detection only: the simulation reports which entities overlapped and
/// leaves any response policy (damage, destruction, knockback) to whoever
/// consumes the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollisionEvent {
    /// Two ships within collision range of each other
    ShipShip { ship: String, other: String },
    /// A ship within collision range of a projectile
    ShipProjectile { ship: String, projectile: String },
}
