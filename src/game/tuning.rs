//! Gameplay constants for vehicles, boss and projectiles

use crate::util::time::TICK_MS;

/// Physical and gameplay constants for one arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaTuning {
    /// Board width in pixels (x wraps at this value)
    pub width: f64,
    /// Board height in pixels (y wraps at this value)
    pub height: f64,
    /// Simulation tick in milliseconds
    pub tick_ms: u64,

    /// Speed added per tick while accelerating
    pub acceleration: f64,
    /// Speed removed per tick while reversing
    pub reverse: f64,
    /// Per-tick speed multiplier
    pub friction: f64,
    /// Radius of the turning arc
    pub steering_radius: f64,
    /// Health of a player vehicle after (re)spawn
    pub max_health: u32,

    /// Health of a freshly spawned boss
    pub boss_max_health: u32,
    /// Fixed boss rotation per tick, in radians
    pub boss_turn_rate: f64,

    /// Lifetime of a projectile in milliseconds
    pub rocket_ttl_ms: u64,
    /// Speed added to the shooter's speed on fire
    pub rocket_increment: f64,
    /// Age under which a projectile cannot collide
    pub rocket_grace_ms: u64,
    /// Radius of a vehicle for hit tests
    pub collision_radius: f64,

    /// Half extents used when drawing vehicles
    pub vehicle_width: f64,
    pub vehicle_height: f64,
    pub boss_width: f64,
    pub boss_height: f64,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            tick_ms: TICK_MS,
            acceleration: 10.0,
            reverse: 5.0,
            friction: 0.965,
            steering_radius: 100.0,
            max_health: 20,
            boss_max_health: 40,
            boss_turn_rate: 0.07,
            rocket_ttl_ms: 1000,
            rocket_increment: 600.0,
            rocket_grace_ms: 20,
            collision_radius: 15.0,
            vehicle_width: 20.0,
            vehicle_height: 30.0,
            boss_width: 20.0,
            boss_height: 40.0,
        }
    }
}

impl ArenaTuning {
    /// Default tuning on a board of the given size
    pub fn with_board(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub(crate) fn tick(&self) -> f64 {
        self.tick_ms as f64
    }
}
