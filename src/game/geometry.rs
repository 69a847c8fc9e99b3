//! Geometry and vector kernel for the simulation
//!
//! All operations here are pure. Rounding is half-up via floor(f + 0.5),
//! which differs from `f64::round` tie handling for negative values and is
//! part of the wire contract with clients.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Degree-to-radian multiplier used by the bearing conversion.
///
/// Deliberately truncated (not the full-precision PI/180) to keep behavioral
/// parity with existing clients that interpolate against server positions.
const DEG_TO_RAD: f64 = 0.01745;

/// Round half-up to the nearest integer.
pub fn round(f: f64) -> f64 {
    (f + 0.5).floor()
}

/// Round half-up to `places` decimal places.
pub fn round_to_places(f: f64, places: i32) -> f64 {
    let shift = 10f64.powi(places);
    round(f * shift) / shift
}

/// Absolute world-space position.
///
/// Coordinates are always held at one decimal place of precision; every
/// constructor and transform re-rounds. This is a bandwidth and determinism
/// contract with the network layer, not a display concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: round_to_places(x, 1),
            y: round_to_places(y, 1),
        }
    }

    /// Translate by a velocity integrated over `elapsed` seconds.
    pub fn advanced(&self, velocity: Vec2, elapsed: f64) -> Self {
        Self::new(self.x + velocity.x * elapsed, self.y + velocity.y * elapsed)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A 2-D direction-and-magnitude quantity (velocity, acceleration).
///
/// Unlike `Point` there is no rounding invariant; intermediate physics keeps
/// full precision and only `rounded` compacts for transmission.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Scale to unit length.
    ///
    /// Precondition: the vector has non-zero magnitude. Normalizing a zero
    /// vector is a programming error, not a recoverable condition.
    pub fn unit(&self) -> Self {
        let m = self.magnitude();
        debug_assert!(m != 0.0, "cannot normalize a zero-magnitude vector");
        Self {
            x: self.x / m,
            y: self.y / m,
        }
    }

    pub fn scale(&self, f: f64) -> Self {
        Self {
            x: self.x * f,
            y: self.y * f,
        }
    }

    pub fn add(&self, other: Vec2) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Compact to one decimal place for transmission.
    pub fn rounded(&self) -> Self {
        Self {
            x: round_to_places(self.x, 1),
            y: round_to_places(self.y, 1),
        }
    }
}

/// Convert a compass-style bearing in degrees to a unit direction vector.
///
/// 0 degrees points up (negative Y) and angles increase clockwise.
pub fn angle_to_vector(angle: f64) -> Vec2 {
    let r = angle * DEG_TO_RAD;
    Vec2::new(r.sin(), -r.cos()).unit()
}

/// Unit direction for `angle`, scaled by `speed`.
pub fn angle_and_speed_to_vector(angle: f64, speed: f64) -> Vec2 {
    angle_to_vector(angle).scale(speed)
}

/// Inclusive integer draw in `[min, max]`.
pub fn random(rng: &mut impl Rng, min: i32, max: i32) -> i32 {
    rng.gen_range(min..=max)
}

/// Uniform whole-degree angle in `[0, 359]`, used for spawn orientation.
pub fn random_angle(rng: &mut impl Rng) -> f64 {
    random(rng, 0, 359) as f64
}
