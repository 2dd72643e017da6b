//! Scripted boss opponent
//!
//! The controller is a client of [`Game`] like any connected player: it reads
//! the public table and acts only by sending key messages through
//! [`Game::on_message`].

use tracing::{debug, info};

use crate::util::geometry::{distance, to_360_range, to_degrees};
use crate::ws::protocol::{Key, Message};

use super::entity::{Entity, EntityId};
use super::schedule::{next_period, Scheduler};
use super::world::{Game, GameError};

/// Attack cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mood {
    pub shots_per_burst: u32,
    pub burst_interval_ms: u64,
    pub shot_interval_ms: u64,
}

impl Mood {
    /// Full health
    pub const CALM: Mood = Mood {
        shots_per_burst: 3,
        burst_interval_ms: 2000,
        shot_interval_ms: 65,
    };

    /// Zero health
    pub const AGGRESSIVE: Mood = Mood {
        shots_per_burst: 10,
        burst_interval_ms: 1000,
        shot_interval_ms: 10,
    };

    /// Linear blend, `anger` 0 gives `calm` and 1 gives `aggressive`
    pub fn blend(calm: Mood, aggressive: Mood, anger: f64) -> Mood {
        let anger = anger.clamp(0.0, 1.0);
        let lerp = |from: f64, to: f64| (from + (to - from) * anger).round();
        Mood {
            shots_per_burst: lerp(calm.shots_per_burst as f64, aggressive.shots_per_burst as f64)
                as u32,
            burst_interval_ms: lerp(calm.burst_interval_ms as f64, aggressive.burst_interval_ms as f64)
                as u64,
            shot_interval_ms: lerp(calm.shot_interval_ms as f64, aggressive.shot_interval_ms as f64)
                as u64,
        }
    }
}

/// Behaviour constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossConfig {
    pub scan_period_ms: u64,
    pub mood_period_ms: u64,
    /// Stop accelerating once this close to the target
    pub approach_distance: f64,
    /// Aim tolerance in degrees
    pub aim_deadband_deg: f64,
    pub calm: Mood,
    pub aggressive: Mood,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            scan_period_ms: 5,
            mood_period_ms: 500,
            approach_distance: 50.0,
            aim_deadband_deg: 3.0,
            calm: Mood::CALM,
            aggressive: Mood::AGGRESSIVE,
        }
    }
}

/// Boss behaviours, in the order they run when due at the same instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BossTask {
    AcquireTarget,
    UpdateMood,
    StartBurst,
    Shot,
}

pub struct BossController {
    id: EntityId,
    config: BossConfig,
    target: Option<EntityId>,
    pressed_rotation: Option<Key>,
    mood: Mood,
    scheduler: Scheduler<BossTask>,
    active: bool,
}

impl BossController {
    /// Join the game as a boss and arm the periodic behaviours
    pub fn spawn(game: &mut Game, config: BossConfig) -> Result<Self, GameError> {
        let id = game.join(true)?;
        let now = game.timestamp();

        let mut scheduler = Scheduler::new();
        scheduler.schedule(BossTask::AcquireTarget, now + config.scan_period_ms);
        scheduler.schedule(BossTask::UpdateMood, now + config.mood_period_ms);
        scheduler.schedule(BossTask::StartBurst, now + config.calm.burst_interval_ms);

        info!(entity_id = id, "Boss spawned");
        Ok(Self {
            id,
            config,
            target: None,
            pressed_rotation: None,
            mood: config.calm,
            scheduler,
            active: true,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// False once the boss has been found missing from the table
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Run due behaviours, then steer. Called once per simulation tick.
    pub fn tick(&mut self, game: &mut Game) -> Result<(), GameError> {
        self.run_scheduled(game);
        if self.active {
            self.update(game)?;
        }
        Ok(())
    }

    /// Fire every behaviour whose timer has come due
    pub fn run_scheduled(&mut self, game: &mut Game) {
        let now = game.timestamp();
        for (due_at, task) in self.scheduler.take_due(now) {
            if !self.active {
                break;
            }
            match task {
                BossTask::AcquireTarget => {
                    self.acquire_target(game);
                    self.scheduler.schedule(
                        BossTask::AcquireTarget,
                        next_period(due_at, self.config.scan_period_ms, now),
                    );
                }
                BossTask::UpdateMood => {
                    self.update_mood(game);
                    self.scheduler.schedule(
                        BossTask::UpdateMood,
                        next_period(due_at, self.config.mood_period_ms, now),
                    );
                }
                BossTask::StartBurst => {
                    self.start_burst(now);
                    self.scheduler
                        .schedule(BossTask::StartBurst, now + self.mood.burst_interval_ms);
                }
                BossTask::Shot => self.shoot(game),
            }
        }
        if !self.active {
            self.scheduler.clear();
        }
    }

    /// Track the nearest vehicle, switching only to a strictly closer one
    pub fn acquire_target(&mut self, game: &mut Game) {
        if !game.has(self.id) {
            info!(entity_id = self.id, "Boss gone, stopping controller");
            self.active = false;
            self.target = None;
            return;
        }

        if let Some(target) = self.target {
            if !game.has(target) {
                debug!(entity_id = self.id, target, "Target lost");
                self.target = None;
                game.on_message(self.id, &Message::keyup(Key::ArrowUp));
            }
        }

        let Some(me) = game.get(self.id).map(|e| e.body().clone()) else {
            return;
        };
        let range = |e: &Entity| distance(me.x, me.y, e.body().x, e.body().y);

        let held = self.target.and_then(|t| game.get(t)).map(range);
        let mut nearest: Option<(EntityId, f64)> = None;
        for vehicle in game.vehicles().filter(|v| v.id() != self.id) {
            let d = range(vehicle);
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((vehicle.id(), d));
            }
        }

        if let Some((candidate, d)) = nearest {
            let switch = match held {
                None => true,
                Some(held) => d < held && Some(candidate) != self.target,
            };
            if switch {
                debug!(entity_id = self.id, target = candidate, distance = d, "Target acquired");
                self.target = Some(candidate);
            }
        }
    }

    /// Close in on the target and pulse the rotation keys to aim at it
    pub fn update(&mut self, game: &mut Game) -> Result<(), GameError> {
        let Some(target_id) = self.target else {
            return Ok(());
        };
        let Some((me, controls)) = game
            .get(self.id)
            .and_then(|e| e.vehicle().map(|v| (v.body.clone(), v.controls)))
        else {
            return Ok(());
        };
        let Some(target) = game.get(target_id).map(|e| e.body().clone()) else {
            return Ok(());
        };

        let range = distance(me.x, me.y, target.x, target.y);
        if controls.accelerating {
            if range <= self.config.approach_distance {
                game.on_message(self.id, &Message::keyup(Key::ArrowUp));
            }
        } else if range > self.config.approach_distance {
            game.on_message(self.id, &Message::keydown(Key::ArrowUp));
        }

        let bearing = to_360_range(to_degrees((target.y - me.y).atan2(target.x - me.x))?);
        let heading = to_360_range(to_degrees(me.angle)?);
        let diff = shortest_turn(bearing - heading);

        if !controls.is_turning() {
            if diff.abs() > self.config.aim_deadband_deg {
                let key = if diff > 0.0 {
                    Key::ArrowRight
                } else {
                    Key::ArrowLeft
                };
                self.pressed_rotation = Some(key);
                game.on_message(self.id, &Message::keydown(key));
            }
        } else {
            match self.pressed_rotation.take() {
                Some(key) => game.on_message(self.id, &Message::keyup(key)),
                None => {
                    game.on_message(self.id, &Message::keyup(Key::ArrowLeft));
                    game.on_message(self.id, &Message::keyup(Key::ArrowRight));
                }
            }
        }
        Ok(())
    }

    /// Recompute the attack cadence from remaining health
    pub fn update_mood(&mut self, game: &Game) {
        let Some(vehicle) = game.get(self.id).and_then(Entity::vehicle) else {
            return;
        };
        let mood = Mood::blend(
            self.config.calm,
            self.config.aggressive,
            1.0 - vehicle.health_ratio(),
        );
        if mood != self.mood {
            debug!(entity_id = self.id, ?mood, "Boss mood changed");
        }
        self.mood = mood;
    }

    fn start_burst(&mut self, now: u64) {
        if self.target.is_none() {
            return;
        }
        for i in 0..self.mood.shots_per_burst as u64 {
            self.scheduler
                .schedule(BossTask::Shot, now + self.mood.shot_interval_ms * i);
        }
    }

    fn shoot(&mut self, game: &mut Game) {
        game.on_message(self.id, &Message::keydown(Key::Space));
        game.on_message(self.id, &Message::keyup(Key::Space));
    }
}

/// Signed difference folded into `[-180, 180)`
fn shortest_turn(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}
