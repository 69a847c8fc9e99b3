//! Ship entity and its per-tick kinematics/collision step

use serde::{Deserialize, Serialize};

use super::geometry::{angle_and_speed_to_vector, round_to_places, Point, Vec2};
use super::projectile::PROJECTILE_RADIUS;
use super::world::GameState;
use super::CollisionEvent;
use crate::config::PhysicsConstants;

/// Ship hitbox radius in world units.
pub const SHIP_RADIUS: f64 = 10.0;

/// Invalid wire value for a tri-state control flag.
#[derive(Debug, thiserror::Error)]
#[error("invalid tri-state control value: {0} (expected -1, 0 or 1)")]
pub struct TriStateError(pub i8);

/// Thrust control flag. Only `On` produces acceleration; `Off` is carried
/// on the wire but exerts no force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Thrust {
    Off,
    #[default]
    None,
    On,
}

impl From<Thrust> for i8 {
    fn from(t: Thrust) -> i8 {
        match t {
            Thrust::Off => -1,
            Thrust::None => 0,
            Thrust::On => 1,
        }
    }
}

impl TryFrom<i8> for Thrust {
    type Error = TriStateError;

    fn try_from(v: i8) -> Result<Self, TriStateError> {
        match v {
            -1 => Ok(Thrust::Off),
            0 => Ok(Thrust::None),
            1 => Ok(Thrust::On),
            other => Err(TriStateError(other)),
        }
    }
}

/// Turn control flag. `Left` decreases the bearing, `Right` increases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Rotation {
    Left,
    #[default]
    None,
    Right,
}

impl Rotation {
    /// Signed multiplier applied to the rotation rate.
    pub fn sign(&self) -> f64 {
        match self {
            Rotation::Left => -1.0,
            Rotation::None => 0.0,
            Rotation::Right => 1.0,
        }
    }
}

impl From<Rotation> for i8 {
    fn from(r: Rotation) -> i8 {
        match r {
            Rotation::Left => -1,
            Rotation::None => 0,
            Rotation::Right => 1,
        }
    }
}

impl TryFrom<i8> for Rotation {
    type Error = TriStateError;

    fn try_from(v: i8) -> Result<Self, TriStateError> {
        match v {
            -1 => Ok(Rotation::Left),
            0 => Ok(Rotation::None),
            1 => Ok(Rotation::Right),
            other => Err(TriStateError(other)),
        }
    }
}

/// Authoritative ship snapshot.
///
/// Replaced wholesale every tick; `tick` returns a fresh value instead of
/// mutating in place. Field keys are single letters on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    #[serde(rename = "i")]
    pub id: String,
    #[serde(rename = "z")]
    pub alive: bool,
    #[serde(rename = "p")]
    pub position: Point,
    /// Bearing in degrees, held in [0, 360)
    #[serde(rename = "a")]
    pub angle: f64,
    #[serde(rename = "v")]
    pub velocity: Vec2,
    #[serde(rename = "l")]
    pub acceleration: Thrust,
    #[serde(rename = "r")]
    pub rotation: Rotation,
}

impl Ship {
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            alive: true,
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            acceleration: Thrust::None,
            rotation: Rotation::None,
        }
    }

    /// Same ship with a different spawn heading.
    pub fn with_heading(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Advance this ship by one simulation tick.
    ///
    /// Pure state transition from the pre-tick snapshot: computes the new
    /// angle, velocity and position for the elapsed time since
    /// `state.time`, and scans the *pre-tick* positions of every other
    /// entity for proximity collisions. Collisions are reported as events;
    /// no response is applied here.
    ///
    /// `now` is expected to be at or after `state.time`; an earlier
    /// timestamp clamps the elapsed time to zero.
    pub fn tick(
        &self,
        now: u64,
        state: &GameState,
        constants: &PhysicsConstants,
    ) -> (Ship, Vec<CollisionEvent>) {
        let elapsed_millis = now.saturating_sub(state.time);
        let elapsed = elapsed_millis as f64 / 1000.0;

        // New bearing. Untouched (and not re-rounded) while not turning.
        let mut angle = self.angle;
        if self.rotation != Rotation::None {
            angle = self.angle + constants.ship_rotation * elapsed * self.rotation.sign();
            while angle < 0.0 {
                angle += 360.0;
            }
            while angle >= 360.0 {
                angle -= 360.0;
            }
            angle = round_to_places(angle, 1);
        }

        // New velocity. Thrust pushes along the post-rotation bearing.
        let mut velocity = self.velocity;
        if self.acceleration == Thrust::On {
            let accel = angle_and_speed_to_vector(angle, constants.ship_acceleration);
            velocity = self.velocity.add(accel.scale(elapsed));
        }

        // Drag always applies, scaled from the velocity as it was before
        // thrust. The ordering is part of the simulation contract.
        velocity = velocity.add(self.velocity.scale(constants.ship_drag * elapsed));

        let position = self.position.advanced(velocity, elapsed);

        // Proximity scan against everyone else's pre-tick position.
        // TODO: replace the O(n*m) sweep with a spatial index once ship
        // counts per world grow past a few dozen.
        let mut events = Vec::new();
        for other in state.ships.values() {
            if other.id != self.id {
                let distance = self.position.distance(&other.position);
                if distance < SHIP_RADIUS * 2.0 {
                    events.push(CollisionEvent::ShipShip {
                        ship: self.id.clone(),
                        other: other.id.clone(),
                    });
                }
            }
        }

        for projectile in &state.projectiles {
            let distance = self.position.distance(&projectile.position);
            if distance < SHIP_RADIUS + PROJECTILE_RADIUS {
                events.push(CollisionEvent::ShipProjectile {
                    ship: self.id.clone(),
                    projectile: projectile.id.clone(),
                });
            }
        }

        let next = Ship {
            id: self.id.clone(),
            alive: self.alive,
            position,
            angle,
            velocity,
            acceleration: self.acceleration,
            rotation: self.rotation,
        };

        (next, events)
    }
}
