//! Game state and the authoritative tick driver

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::util::time::{tick_duration, unix_millis, SIMULATION_TPS, SNAPSHOT_TPS};

use super::geometry::{random, random_angle, Point};
use super::projectile::Projectile;
use super::ship::{Rotation, Ship, Thrust};
use super::snapshot::WorldSnapshot;
use super::CollisionEvent;

/// Half-extent of the square spawn area around the origin.
const SPAWN_EXTENT: i32 = 500;

/// Authoritative game state. The single source of truth every per-entity
/// step reads within a tick; `time` is the timestamp of the last committed
/// tick in Unix milliseconds.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub time: u64,
    pub ships: HashMap<String, Ship>,
    pub projectiles: Vec<Projectile>,
}

impl GameState {
    pub fn new(time: u64) -> Self {
        Self {
            time,
            ships: HashMap::new(),
            projectiles: Vec::new(),
        }
    }
}

/// Commands accepted by the driver between ticks.
///
/// Entity lifecycle stays out of the simulation step: spawning, despawning
/// and alive-flag changes arrive here, applied before the next tick.
#[derive(Debug, Clone)]
pub enum Command {
    SpawnShip {
        id: String,
    },
    DespawnShip {
        id: String,
    },
    SetControls {
        id: String,
        acceleration: Thrust,
        rotation: Rotation,
    },
    SetAlive {
        id: String,
        alive: bool,
    },
    FireProjectile {
        owner: String,
        speed: f64,
    },
}

/// Handle to a running world
#[derive(Clone)]
pub struct WorldHandle {
    pub command_tx: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<CollisionEvent>,
    snapshot_tx: broadcast::Sender<WorldSnapshot>,
    state: Arc<RwLock<GameState>>,
}

impl WorldHandle {
    /// Subscribe to the collision event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<CollisionEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to the periodic wire-snapshot stream.
    pub fn snapshots(&self) -> broadcast::Receiver<WorldSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Snapshot of the current committed state.
    pub fn state(&self) -> GameState {
        self.state.read().clone()
    }
}

/// The authoritative world simulation.
///
/// Owns all state transitions: commands are drained between ticks, every
/// entity's new snapshot is computed from the same pre-tick `GameState`,
/// and results are committed in one write at the tick boundary.
pub struct World {
    settings: Settings,
    seed: u64,
    state: Arc<RwLock<GameState>>,
    command_rx: mpsc::Receiver<Command>,
    event_tx: broadcast::Sender<CollisionEvent>,
    snapshot_tx: broadcast::Sender<WorldSnapshot>,
    // snapshot cadence, in ticks
    snapshot_interval: u32,
    ticks_since_snapshot: u32,
    rng: ChaCha8Rng,
}

impl World {
    pub fn new(settings: Settings, seed: u64) -> (Self, WorldHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(64);
        let (snapshot_tx, _) = broadcast::channel(64);
        let state = Arc::new(RwLock::new(GameState::new(unix_millis())));

        let handle = WorldHandle {
            command_tx,
            event_tx: event_tx.clone(),
            snapshot_tx: snapshot_tx.clone(),
            state: state.clone(),
        };

        let world = Self {
            settings,
            seed,
            state,
            command_rx,
            event_tx,
            snapshot_tx,
            snapshot_interval: (SIMULATION_TPS / SNAPSHOT_TPS).max(1),
            ticks_since_snapshot: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };

        (world, handle)
    }

    /// Run the fixed-rate tick loop until every command sender is dropped.
    pub async fn run(mut self) {
        info!(seed = self.seed, tps = SIMULATION_TPS, "World started");

        let mut ticker = interval(tick_duration());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if !self.apply_commands() {
                info!("All command senders dropped, stopping world");
                break;
            }

            self.step(unix_millis());

            self.ticks_since_snapshot += 1;
            if self.ticks_since_snapshot >= self.snapshot_interval {
                self.ticks_since_snapshot = 0;
                let _ = self.snapshot_tx.send(WorldSnapshot::capture(&self.state.read()));
            }
        }
    }

    /// Drain the command queue. Returns false once the channel is closed.
    fn apply_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SpawnShip { id } => {
                if self.state.read().ships.contains_key(&id) {
                    warn!(ship = %id, "Ship already in world");
                    return;
                }

                let position = Point::new(
                    random(&mut self.rng, -SPAWN_EXTENT, SPAWN_EXTENT) as f64,
                    random(&mut self.rng, -SPAWN_EXTENT, SPAWN_EXTENT) as f64,
                );
                let heading = random_angle(&mut self.rng);
                let ship = Ship::new(id.clone(), position).with_heading(heading);

                self.state.write().ships.insert(id.clone(), ship);
                info!(ship = %id, x = position.x, y = position.y, heading, "Ship spawned");
            }
            Command::DespawnShip { id } => {
                if self.state.write().ships.remove(&id).is_some() {
                    info!(ship = %id, "Ship despawned");
                } else {
                    warn!(ship = %id, "Despawn for unknown ship");
                }
            }
            Command::SetControls {
                id,
                acceleration,
                rotation,
            } => {
                let mut state = self.state.write();
                if let Some(ship) = state.ships.get_mut(&id) {
                    ship.acceleration = acceleration;
                    ship.rotation = rotation;
                } else {
                    warn!(ship = %id, "Controls for unknown ship");
                }
            }
            Command::SetAlive { id, alive } => {
                let mut state = self.state.write();
                if let Some(ship) = state.ships.get_mut(&id) {
                    ship.alive = alive;
                } else {
                    warn!(ship = %id, "Alive flag for unknown ship");
                }
            }
            Command::FireProjectile { owner, speed } => {
                let pose = {
                    let state = self.state.read();
                    state.ships.get(&owner).map(|s| (s.position, s.angle))
                };

                match pose {
                    Some((position, angle)) => {
                        let projectile = Projectile::new(owner.clone(), position, angle, speed);
                        debug!(ship = %owner, projectile = %projectile.id, "Projectile fired");
                        self.state.write().projectiles.push(projectile);
                    }
                    None => warn!(ship = %owner, "Fire from unknown ship"),
                }
            }
        }
    }

    /// Advance the whole world to `now`.
    ///
    /// All entity steps read the same pre-tick snapshot; results land in a
    /// staging buffer and commit in a single write, so no entity ever sees
    /// a peer's post-tick state within the same tick.
    fn step(&mut self, now: u64) {
        let snapshot = self.state.read().clone();

        let mut ships = HashMap::with_capacity(snapshot.ships.len());
        let mut events = Vec::new();
        for ship in snapshot.ships.values() {
            let (next, ship_events) = ship.tick(now, &snapshot, &self.settings.constants);
            ships.insert(next.id.clone(), next);
            events.extend(ship_events);
        }

        let projectiles: Vec<Projectile> = snapshot
            .projectiles
            .iter()
            .map(|p| p.tick(now, &snapshot))
            .collect();

        {
            let mut state = self.state.write();
            state.time = now;
            state.ships = ships;
            state.projectiles = projectiles;
        }

        for event in events {
            if self.settings.debug {
                match &event {
                    CollisionEvent::ShipShip { ship, other } => {
                        debug!(ship = %ship, other = %other, "Ship colliding with ship");
                    }
                    CollisionEvent::ShipProjectile { ship, projectile } => {
                        debug!(ship = %ship, projectile = %projectile, "Ship colliding with projectile");
                    }
                }
            }
            // Nobody listening is fine; detection stays policy-free.
            let _ = self.event_tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geometry::Vec2;
    use std::time::Duration;

    fn world_with_seed(seed: u64) -> (World, WorldHandle) {
        World::new(Settings::default(), seed)
    }

    fn place_ship(world: &World, id: &str, position: Point, velocity: Vec2) {
        let mut ship = Ship::new(id, position);
        ship.velocity = velocity;
        world.state.write().ships.insert(id.to_string(), ship);
    }

    #[test]
    fn spawn_command_creates_ship_inside_spawn_area() {
        let (mut world, handle) = world_with_seed(7);
        handle
            .command_tx
            .try_send(Command::SpawnShip { id: "a".into() })
            .unwrap();

        assert!(world.apply_commands());

        let state = handle.state();
        let ship = state.ships.get("a").expect("ship spawned");
        assert!(ship.position.x.abs() <= SPAWN_EXTENT as f64);
        assert!(ship.position.y.abs() <= SPAWN_EXTENT as f64);
        assert!((0.0..360.0).contains(&ship.angle));
        assert!(ship.alive);
    }

    #[test]
    fn same_seed_spawns_identically() {
        let (mut w1, h1) = world_with_seed(42);
        let (mut w2, h2) = world_with_seed(42);

        for h in [&h1, &h2] {
            h.command_tx
                .try_send(Command::SpawnShip { id: "a".into() })
                .unwrap();
        }
        w1.apply_commands();
        w2.apply_commands();

        let a = h1.state().ships.get("a").unwrap().clone();
        let b = h2.state().ships.get("a").unwrap().clone();
        assert_eq!(a.position, b.position);
        assert_eq!(a.angle, b.angle);
    }

    #[test]
    fn step_commits_time_and_moved_entities_atomically() {
        let (mut world, handle) = world_with_seed(1);
        world.state.write().time = 1_000;
        place_ship(&world, "a", Point::new(0.0, 0.0), Vec2::new(10.0, -4.0));

        world.step(2_000);

        let state = handle.state();
        assert_eq!(state.time, 2_000);
        let ship = state.ships.get("a").unwrap();
        assert_eq!(ship.position, Point::new(10.0 * 0.5, -4.0 * 0.5));
    }

    #[test]
    fn collision_events_reach_subscribers() {
        let (mut world, handle) = world_with_seed(1);
        world.state.write().time = 1_000;
        place_ship(&world, "a", Point::new(0.0, 0.0), Vec2::ZERO);
        place_ship(&world, "b", Point::new(5.0, 0.0), Vec2::ZERO);

        let mut events = handle.subscribe();
        world.step(1_100);

        // Both ships report the overlap; arrival order follows map order.
        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&CollisionEvent::ShipShip {
            ship: "a".into(),
            other: "b".into(),
        }));
        assert!(seen.contains(&CollisionEvent::ShipShip {
            ship: "b".into(),
            other: "a".into(),
        }));
    }

    #[test]
    fn fired_projectile_starts_at_owner_pose() {
        let (mut world, handle) = world_with_seed(1);
        place_ship(&world, "a", Point::new(30.0, -20.0), Vec2::ZERO);
        world.state.write().ships.get_mut("a").unwrap().angle = 90.0;

        handle
            .command_tx
            .try_send(Command::FireProjectile {
                owner: "a".into(),
                speed: 200.0,
            })
            .unwrap();
        world.apply_commands();

        let state = handle.state();
        assert_eq!(state.projectiles.len(), 1);
        let p = &state.projectiles[0];
        assert_eq!(p.owner, "a");
        assert_eq!(p.position, Point::new(30.0, -20.0));
        assert!((p.velocity.magnitude() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn controls_and_alive_commands_update_flags() {
        let (mut world, handle) = world_with_seed(1);
        place_ship(&world, "a", Point::new(0.0, 0.0), Vec2::ZERO);

        handle
            .command_tx
            .try_send(Command::SetControls {
                id: "a".into(),
                acceleration: Thrust::On,
                rotation: Rotation::Left,
            })
            .unwrap();
        handle
            .command_tx
            .try_send(Command::SetAlive {
                id: "a".into(),
                alive: false,
            })
            .unwrap();
        world.apply_commands();

        let state = handle.state();
        let ship = state.ships.get("a").unwrap();
        assert_eq!(ship.acceleration, Thrust::On);
        assert_eq!(ship.rotation, Rotation::Left);
        assert!(!ship.alive);
    }

    #[test]
    fn despawn_removes_ship() {
        let (mut world, handle) = world_with_seed(1);
        place_ship(&world, "a", Point::new(0.0, 0.0), Vec2::ZERO);

        handle
            .command_tx
            .try_send(Command::DespawnShip { id: "a".into() })
            .unwrap();
        world.apply_commands();

        assert!(handle.state().ships.is_empty());
    }

    #[test]
    fn command_channel_closure_stops_the_loop() {
        let (mut world, handle) = world_with_seed(1);
        drop(handle);
        assert!(!world.apply_commands());
    }

    #[tokio::test]
    async fn run_loop_advances_a_spawned_ship() {
        let (world, handle) = world_with_seed(9);
        let mut snapshots = handle.snapshots();
        let task = tokio::spawn(world.run());

        handle
            .command_tx
            .send(Command::SpawnShip { id: "a".into() })
            .await
            .unwrap();
        handle
            .command_tx
            .send(Command::SetControls {
                id: "a".into(),
                acceleration: Thrust::On,
                rotation: Rotation::None,
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        let state = handle.state();
        let ship = state.ships.get("a").expect("ship spawned by loop");
        assert!(ship.velocity.magnitude() > 0.0);
        assert!(state.time > 0);

        let snapshot = snapshots.recv().await.expect("snapshot published");
        assert_eq!(snapshot.ships.len(), 1);

        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("loop stops when handles drop")
            .unwrap();
    }
}
