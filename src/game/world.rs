//! Authoritative game state: the entity table and every way to mutate it

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::util::geometry::{position, random_color, GeometryError};
use crate::util::time::{Clock, WallClock};
use crate::ws::protocol::{Key, Message};

use super::combat::{CombatSystem, Knockout, ProjectileFate};
use super::entity::{
    Boss, Entity, EntityId, Kinematics, Laser, PlayerVehicle, Rocket, Team, Vehicle,
};
use super::tuning::ArenaTuning;

/// Result of one simulation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    /// No boss is alive: first step after construction, or the boss was just defeated
    NeedsBoss,
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Per-team counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamTally {
    pub blue: u32,
    pub red: u32,
}

impl TeamTally {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Blue => self.blue,
            Team::Red => self.red,
        }
    }

    fn get_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Blue => &mut self.blue,
            Team::Red => &mut self.red,
        }
    }
}

/// The authoritative simulation. Sole owner of all entities.
pub struct Game {
    tuning: ArenaTuning,
    /// Ids are never reused, so key order is insertion order
    entities: BTreeMap<EntityId, Entity>,
    counter: EntityId,
    clock: Box<dyn Clock>,
    populations: TeamTally,
    scores: TeamTally,
    first_step: bool,
    rng: ChaCha8Rng,
    outbox: broadcast::Sender<Message>,
}

impl Game {
    pub fn new(tuning: ArenaTuning, outbox: broadcast::Sender<Message>) -> Self {
        Self {
            tuning,
            entities: BTreeMap::new(),
            counter: 0,
            clock: Box::new(WallClock::new()),
            populations: TeamTally::default(),
            scores: TeamTally::default(),
            first_step: true,
            rng: ChaCha8Rng::from_entropy(),
            outbox,
        }
    }

    /// Replace the time source (the epoch is whatever the clock reports as zero)
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Make spawn jitter reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn tuning(&self) -> &ArenaTuning {
        &self.tuning
    }

    /// Current simulation time in milliseconds
    pub fn timestamp(&self) -> u64 {
        self.clock.now_ms()
    }

    /// New observers receive their messages from this channel
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.outbox.subscribe()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn has(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Everything that is not a projectile
    pub fn vehicles(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_vehicle())
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_projectile())
    }

    pub fn populations(&self) -> TeamTally {
        self.populations
    }

    pub fn scores(&self) -> TeamTally {
        self.scores
    }

    fn next_id(&mut self) -> EntityId {
        let id = self.counter;
        self.counter += 1;
        id
    }

    fn emit(&self, message: Message) {
        // No subscribers is not an error: the arena may be empty
        let _ = self.outbox.send(message);
    }

    fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.entities.insert(id, entity);
        id
    }

    /// Add a player (or the boss) and send the joining observer a full snapshot
    pub fn join(&mut self, is_boss: bool) -> Result<EntityId, GameError> {
        let id = self.next_id();
        let timestamp = self.timestamp();

        let entity = if is_boss {
            Entity::Boss(Boss::spawn(id, timestamp, &self.tuning))
        } else {
            let team = if self.populations.red > self.populations.blue {
                Team::Blue
            } else {
                Team::Red
            };
            let player = PlayerVehicle::spawn(id, timestamp, team, &self.tuning, &mut self.rng)?;
            *self.populations.get_mut(team) += 1;
            Entity::Player(player)
        };

        info!(
            entity_id = id,
            kind = ?entity.kind(),
            team = ?entity.team(),
            timestamp,
            "Entity joined"
        );

        self.insert(entity);
        self.emit(Message::join(timestamp));
        for entity in self.entities.values() {
            self.emit(Message::set(entity));
        }

        Ok(id)
    }

    /// Add an unteamed vehicle at a fixed position and broadcast it
    pub fn add_vehicle(&mut self, x: f64, y: f64) -> Result<EntityId, GameError> {
        let id = self.next_id();
        let body = Kinematics::at(
            id,
            self.timestamp(),
            position(x, self.tuning.width)?,
            position(y, self.tuning.height)?,
        );
        let vehicle = Entity::Vehicle(Vehicle::new(body, random_color(), self.tuning.max_health));
        debug!(entity_id = id, x, y, "Vehicle added");
        self.emit(Message::set(&vehicle));
        self.insert(vehicle);
        Ok(id)
    }

    #[cfg(test)]
    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Remove an entity. A departing player concedes a point to the other team.
    pub fn quit(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;

        if let Some(team) = entity.team() {
            let population = self.populations.get_mut(team);
            *population = population.saturating_sub(1);
            *self.scores.get_mut(team.opponent()) += 1;
            info!(entity_id = id, team = ?team, "Player left");
        } else {
            debug!(entity_id = id, kind = ?entity.kind(), "Entity removed");
        }

        self.emit(Message::delete(id));
        Some(entity)
    }

    /// Apply a key message on behalf of an entity. Unknown ids and unknown keys are ignored.
    pub fn on_message(&mut self, id: EntityId, message: &Message) {
        let Some((pressed, key)) = message.key_event() else {
            return;
        };
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        let Some(vehicle) = entity.vehicle_mut() else {
            return;
        };

        let flag = match key {
            Key::ArrowLeft => &mut vehicle.controls.turning_left,
            Key::ArrowRight => &mut vehicle.controls.turning_right,
            Key::ArrowUp => &mut vehicle.controls.accelerating,
            Key::ArrowDown => &mut vehicle.controls.reversing,
            Key::Space => {
                if pressed {
                    self.fire(id);
                }
                return;
            }
        };
        *flag = pressed;
        let snapshot = Message::set(entity);
        self.emit(snapshot);
    }

    fn fire(&mut self, shooter_id: EntityId) {
        let Some(shooter) = self.entities.get(&shooter_id) else {
            return;
        };
        let pose = shooter.body().clone();
        let color = Laser::beam_color(shooter.team());

        let id = self.next_id();
        let mut body = Kinematics::at(id, self.timestamp(), pose.x, pose.y);
        body.angle = pose.angle;
        body.speed = pose.speed + self.tuning.rocket_increment;

        let laser = Entity::Laser(Laser {
            rocket: Rocket::new(body),
            laser_color: color.to_string(),
        });
        debug!(entity_id = id, shooter_id, "Laser fired");
        self.emit(Message::set(&laser));
        self.insert(laser);
    }

    /// Advance every entity to the current time, then resolve projectile lifetimes and hits
    pub fn step(&mut self) -> Result<StepOutcome, GameError> {
        let now = self.timestamp();
        for entity in self.entities.values_mut() {
            entity.catch_up(now, &self.tuning)?;
        }

        let mut outcome = if self.first_step {
            self.first_step = false;
            StepOutcome::NeedsBoss
        } else {
            StepOutcome::Running
        };

        let projectile_ids: Vec<EntityId> = self.projectiles().map(Entity::id).collect();
        for projectile_id in projectile_ids {
            let Some(rocket) = self.entities.get(&projectile_id).and_then(Entity::projectile) else {
                continue;
            };

            match CombatSystem::fate(rocket, &self.tuning) {
                ProjectileFate::Inert => {}
                ProjectileFate::Expired => {
                    self.quit(projectile_id);
                }
                ProjectileFate::Armed => {
                    let victim = CombatSystem::first_hit(rocket, self.vehicles(), &self.tuning)?;
                    if let Some(victim_id) = victim {
                        self.quit(projectile_id);
                        if self.resolve_hit(victim_id) == Some(Knockout::BossDefeated) {
                            outcome = StepOutcome::NeedsBoss;
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Take one point of health off the victim and handle a knockout
    fn resolve_hit(&mut self, victim_id: EntityId) -> Option<Knockout> {
        let tuning = self.tuning;
        let entity = self.entities.get_mut(&victim_id)?;
        let depleted = entity.vehicle_mut()?.take_hit();

        let knockout = if !depleted {
            None
        } else {
            match &mut *entity {
                Entity::Boss(_) => Some(Knockout::BossDefeated),
                Entity::Player(player) => {
                    player.respawn(&tuning);
                    Some(Knockout::PlayerRespawned)
                }
                Entity::Vehicle(vehicle) => {
                    let (x, y) = tuning.center();
                    vehicle.health = vehicle.max_health;
                    vehicle.body.x = x;
                    vehicle.body.y = y;
                    Some(Knockout::VehicleRespawned)
                }
                Entity::Rocket(_) | Entity::Laser(_) => None,
            }
        };

        match knockout {
            Some(Knockout::BossDefeated) => {
                info!(entity_id = victim_id, "Boss defeated");
                self.quit(victim_id);
                return knockout;
            }
            Some(Knockout::PlayerRespawned) => {
                let team = entity.team()?;
                let scorer = team.opponent();
                *self.scores.get_mut(scorer) += 1;
                let points = self.scores.get(scorer);
                info!(entity_id = victim_id, scorer = ?scorer, points, "Player destroyed");
                self.emit(match scorer {
                    Team::Red => Message::refresh_red_points(points),
                    Team::Blue => Message::refresh_blue_points(points),
                });
            }
            Some(Knockout::VehicleRespawned) | None => {}
        }

        if let Some(entity) = self.entities.get(&victim_id) {
            self.emit(Message::set(entity));
        }
        knockout
    }
}
