//! Simulated entities: vehicles, the boss and projectiles

use serde::{Deserialize, Serialize};

use crate::util::geometry::{position, random_with, GeometryError};

use super::physics::{PhysicsSystem, Steering};
use super::tuning::ArenaTuning;

/// Identifier issued by the game; never reused
pub type EntityId = u64;

/// Team of a player vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::Blue => Team::Red,
            Team::Red => Team::Blue,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Team::Blue => "#1586ff",
            Team::Red => "#f12a2a",
        }
    }

    /// Heading at spawn, towards the opposing side
    pub fn facing(self) -> f64 {
        match self {
            Team::Blue => 0.0,
            Team::Red => std::f64::consts::PI,
        }
    }

    fn side(self) -> f64 {
        match self {
            Team::Blue => -1.0,
            Team::Red => 1.0,
        }
    }
}

/// Pose shared by every entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub id: EntityId,
    /// Entity-local simulation time in milliseconds
    pub timestamp: u64,
    pub x: f64,
    pub y: f64,
    /// Heading in radians
    pub angle: f64,
    /// Signed speed in pixels per second
    pub speed: f64,
}

impl Kinematics {
    pub fn at(id: EntityId, timestamp: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            timestamp,
            x,
            y,
            angle: 0.0,
            speed: 0.0,
        }
    }
}

/// Intent flags set by keydown/keyup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    #[serde(rename = "isAccelerating")]
    pub accelerating: bool,
    #[serde(rename = "isReversing")]
    pub reversing: bool,
    #[serde(rename = "isTurningLeft")]
    pub turning_left: bool,
    #[serde(rename = "isTurningRight")]
    pub turning_right: bool,
}

impl Controls {
    pub fn is_turning(&self) -> bool {
        self.turning_left || self.turning_right
    }
}

/// Generic vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(flatten)]
    pub body: Kinematics,
    #[serde(flatten)]
    pub controls: Controls,
    pub health: u32,
    pub max_health: u32,
    pub color: String,
}

impl Vehicle {
    pub fn new(body: Kinematics, color: impl Into<String>, max_health: u32) -> Self {
        Self {
            body,
            controls: Controls::default(),
            health: max_health,
            max_health,
            color: color.into(),
        }
    }

    /// Remove one point of health, never going below zero. Returns true once depleted.
    pub fn take_hit(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        self.health == 0
    }

    pub fn health_ratio(&self) -> f64 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f64 / self.max_health as f64
        }
    }
}

/// Vehicle controlled by a connected observer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerVehicle {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub team: Team,
}

impl PlayerVehicle {
    /// Spawn on the team's side of the board, facing the other side
    pub fn spawn<R: rand::Rng + ?Sized>(
        id: EntityId,
        timestamp: u64,
        team: Team,
        tuning: &ArenaTuning,
        rng: &mut R,
    ) -> Result<Self, GeometryError> {
        let x = position(
            tuning.width / 2.0 + (tuning.width / 0.75) * team.side(),
            tuning.width,
        )?;
        let height_range = (tuning.height / 5.0).floor() as i64;
        let jitter = random_with(rng, 0, (height_range - 1).max(0))? as f64;
        let y = position(tuning.height / 2.0 + jitter - height_range as f64 / 2.0, tuning.height)?;

        let mut body = Kinematics::at(id, timestamp, x, y);
        body.angle = team.facing();

        Ok(Self {
            vehicle: Vehicle::new(body, team.color(), tuning.max_health),
            team,
        })
    }

    /// Back to the board center with full health, keeping the id
    pub fn respawn(&mut self, tuning: &ArenaTuning) {
        let (x, y) = tuning.center();
        self.vehicle.health = self.vehicle.max_health;
        self.vehicle.body.x = x;
        self.vehicle.body.y = y;
    }
}

/// The scripted opponent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    #[serde(flatten)]
    pub vehicle: Vehicle,
}

impl Boss {
    pub const COLOR: &'static str = "rgb(255, 0, 255)";

    pub fn spawn(id: EntityId, timestamp: u64, tuning: &ArenaTuning) -> Self {
        let (x, y) = tuning.center();
        Self {
            vehicle: Vehicle::new(
                Kinematics::at(id, timestamp, x, y),
                Self::COLOR,
                tuning.boss_max_health,
            ),
        }
    }
}

/// Plain projectile in straight-line flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rocket {
    #[serde(flatten)]
    pub body: Kinematics,
    /// Creation time, for age and TTL
    pub created: u64,
}

impl Rocket {
    pub fn new(body: Kinematics) -> Self {
        let created = body.timestamp;
        Self { body, created }
    }

    /// Age as measured by the projectile's own clock
    pub fn age(&self) -> u64 {
        self.body.timestamp.saturating_sub(self.created)
    }
}

/// Projectile fired by a vehicle, drawn as a colored beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Laser {
    #[serde(flatten)]
    pub rocket: Rocket,
    pub laser_color: String,
}

impl Laser {
    pub const BLUE_BEAM: &'static str = "rgb(0, 217, 255)";
    pub const RED_BEAM: &'static str = "rgb(255, 66, 66)";

    pub fn beam_color(team: Option<Team>) -> &'static str {
        match team {
            Some(Team::Blue) => Self::BLUE_BEAM,
            _ => Self::RED_BEAM,
        }
    }
}

/// Stable discriminator of the entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Vehicle,
    PlayerVehicle,
    Boss,
    Rocket,
    Laser,
}

/// Any simulated object in the authoritative table
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Vehicle(Vehicle),
    Player(PlayerVehicle),
    Boss(Boss),
    Rocket(Rocket),
    Laser(Laser),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Vehicle(_) => EntityKind::Vehicle,
            Entity::Player(_) => EntityKind::PlayerVehicle,
            Entity::Boss(_) => EntityKind::Boss,
            Entity::Rocket(_) => EntityKind::Rocket,
            Entity::Laser(_) => EntityKind::Laser,
        }
    }

    pub fn body(&self) -> &Kinematics {
        match self {
            Entity::Vehicle(v) => &v.body,
            Entity::Player(p) => &p.vehicle.body,
            Entity::Boss(b) => &b.vehicle.body,
            Entity::Rocket(r) => &r.body,
            Entity::Laser(l) => &l.rocket.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Kinematics {
        match self {
            Entity::Vehicle(v) => &mut v.body,
            Entity::Player(p) => &mut p.vehicle.body,
            Entity::Boss(b) => &mut b.vehicle.body,
            Entity::Rocket(r) => &mut r.body,
            Entity::Laser(l) => &mut l.rocket.body,
        }
    }

    pub fn id(&self) -> EntityId {
        self.body().id
    }

    /// Vehicle data of the vehicle-like variants
    pub fn vehicle(&self) -> Option<&Vehicle> {
        match self {
            Entity::Vehicle(v) => Some(v),
            Entity::Player(p) => Some(&p.vehicle),
            Entity::Boss(b) => Some(&b.vehicle),
            Entity::Rocket(_) | Entity::Laser(_) => None,
        }
    }

    pub fn vehicle_mut(&mut self) -> Option<&mut Vehicle> {
        match self {
            Entity::Vehicle(v) => Some(v),
            Entity::Player(p) => Some(&mut p.vehicle),
            Entity::Boss(b) => Some(&mut b.vehicle),
            Entity::Rocket(_) | Entity::Laser(_) => None,
        }
    }

    /// Projectile data of the projectile variants
    pub fn projectile(&self) -> Option<&Rocket> {
        match self {
            Entity::Rocket(r) => Some(r),
            Entity::Laser(l) => Some(&l.rocket),
            _ => None,
        }
    }

    pub fn is_vehicle(&self) -> bool {
        self.vehicle().is_some()
    }

    pub fn is_projectile(&self) -> bool {
        self.projectile().is_some()
    }

    pub fn team(&self) -> Option<Team> {
        match self {
            Entity::Player(p) => Some(p.team),
            _ => None,
        }
    }

    /// Advance by exactly one tick using the variant's own rule
    pub fn step(&mut self, tuning: &ArenaTuning) -> Result<(), GeometryError> {
        match self {
            Entity::Vehicle(v) => {
                PhysicsSystem::advance_vehicle(&mut v.body, &v.controls, tuning, 1, Steering::Arc)
            }
            Entity::Player(p) => {
                let v = &mut p.vehicle;
                PhysicsSystem::advance_vehicle(&mut v.body, &v.controls, tuning, 1, Steering::Arc)
            }
            Entity::Boss(b) => {
                let v = &mut b.vehicle;
                PhysicsSystem::advance_vehicle(
                    &mut v.body,
                    &v.controls,
                    tuning,
                    2,
                    Steering::FixedRate(tuning.boss_turn_rate),
                )
            }
            Entity::Rocket(r) => PhysicsSystem::advance_projectile(&mut r.body, tuning),
            Entity::Laser(l) => PhysicsSystem::advance_projectile(&mut l.rocket.body, tuning),
        }
    }

    /// Step until the entity's clock reaches `now`. Returns the number of ticks taken.
    pub fn catch_up(&mut self, now: u64, tuning: &ArenaTuning) -> Result<u32, GeometryError> {
        let mut ticks = 0;
        while self.body().timestamp < now {
            self.step(tuning)?;
            ticks += 1;
        }
        Ok(ticks)
    }
}

impl From<Vehicle> for Entity {
    fn from(v: Vehicle) -> Self {
        Entity::Vehicle(v)
    }
}

impl From<PlayerVehicle> for Entity {
    fn from(p: PlayerVehicle) -> Self {
        Entity::Player(p)
    }
}

impl From<Boss> for Entity {
    fn from(b: Boss) -> Self {
        Entity::Boss(b)
    }
}

impl From<Rocket> for Entity {
    fn from(r: Rocket) -> Self {
        Entity::Rocket(r)
    }
}

impl From<Laser> for Entity {
    fn from(l: Laser) -> Self {
        Entity::Laser(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn vehicle(speed: f64, controls: Controls) -> Entity {
        let mut body = Kinematics::at(1, 100, 100.0, 100.0);
        body.speed = speed;
        let mut v = Vehicle::new(body, "#000", 20);
        v.controls = controls;
        Entity::Vehicle(v)
    }

    #[test]
    fn friction_slows_an_idle_vehicle() {
        let tuning = ArenaTuning::default();
        let mut e = vehicle(100.0, Controls::default());
        e.step(&tuning).unwrap();
        assert_eq!(e.body().timestamp, 110);
        assert!((e.body().speed - 100.0 * tuning.friction).abs() < 1e-9);
    }

    #[test]
    fn accelerating_and_reversing_add_fixed_amounts() {
        let tuning = ArenaTuning::default();
        let mut fwd = vehicle(
            100.0,
            Controls {
                accelerating: true,
                ..Controls::default()
            },
        );
        fwd.step(&tuning).unwrap();
        assert!((fwd.body().speed - (100.0 * tuning.friction + tuning.acceleration)).abs() < 1e-9);

        let mut back = vehicle(
            100.0,
            Controls {
                reversing: true,
                ..Controls::default()
            },
        );
        back.step(&tuning).unwrap();
        assert!((back.body().speed - (100.0 * tuning.friction - tuning.reverse)).abs() < 1e-9);
    }

    #[test]
    fn reversing_from_rest_goes_negative() {
        let tuning = ArenaTuning::default();
        let mut e = vehicle(
            0.0,
            Controls {
                reversing: true,
                ..Controls::default()
            },
        );
        e.step(&tuning).unwrap();
        assert!(e.body().speed < 0.0);
        assert!(e.body().x < 100.0);
    }

    #[test]
    fn turning_right_increases_heading() {
        let tuning = ArenaTuning::default();
        let mut e = vehicle(
            100.0,
            Controls {
                turning_right: true,
                ..Controls::default()
            },
        );
        e.step(&tuning).unwrap();
        assert!(e.body().angle > 0.0);
    }

    #[test]
    fn catch_up_steps_in_whole_ticks() {
        let tuning = ArenaTuning::default();
        let mut e = Entity::Rocket(Rocket::new(Kinematics::at(3, 0, 10.0, 10.0)));
        assert_eq!(e.catch_up(35, &tuning).unwrap(), 4);
        assert_eq!(e.body().timestamp, 40);
        assert_eq!(e.catch_up(40, &tuning).unwrap(), 0);
    }

    #[test]
    fn player_spawns_on_team_side() {
        let tuning = ArenaTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let blue = PlayerVehicle::spawn(0, 0, Team::Blue, &tuning, &mut rng).unwrap();
        let red = PlayerVehicle::spawn(1, 0, Team::Red, &tuning, &mut rng).unwrap();

        assert!((blue.vehicle.body.x - 400.0 / 3.0).abs() < 1e-9);
        assert!((red.vehicle.body.x - 2000.0 / 3.0).abs() < 1e-9);
        assert_eq!(blue.vehicle.body.angle, 0.0);
        assert_eq!(red.vehicle.body.angle, std::f64::consts::PI);
        for p in [&blue, &red] {
            let dy = (p.vehicle.body.y - tuning.height / 2.0).abs();
            assert!(dy <= tuning.height / 10.0);
            assert_eq!(p.vehicle.health, tuning.max_health);
            assert_eq!(p.vehicle.body.speed, 0.0);
        }
    }

    #[test]
    fn health_never_drops_below_zero() {
        let mut v = Vehicle::new(Kinematics::at(0, 0, 0.0, 0.0), "#000", 1);
        assert!(v.take_hit());
        assert!(v.take_hit());
        assert_eq!(v.health, 0);
    }

    #[test]
    fn snapshot_uses_wire_field_names() {
        let boss = Boss::spawn(4, 10, &ArenaTuning::default());
        let json = serde_json::to_value(&boss).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["isAccelerating"], false);
        assert_eq!(json["maxHealth"], 40);
        assert_eq!(json["color"], Boss::COLOR);
    }
}
