//! Combat system - projectile aging and hit detection

use crate::util::geometry::{collision, GeometryError};

use super::entity::{Entity, EntityId, Rocket};
use super::tuning::ArenaTuning;

/// Where a projectile is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileFate {
    /// Still inside the grace window, cannot hit anything yet
    Inert,
    /// Can register a hit
    Armed,
    /// Lived past its TTL and must be removed
    Expired,
}

/// What a lethal hit did to its victim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knockout {
    /// Boss removed from the table
    BossDefeated,
    /// Player sent back to center; the opponent team scores
    PlayerRespawned,
    /// Generic vehicle sent back to center without scoring
    VehicleRespawned,
}

/// Combat system for projectile lifetime and hit resolution
pub struct CombatSystem;

impl CombatSystem {
    pub fn fate(rocket: &Rocket, tuning: &ArenaTuning) -> ProjectileFate {
        let age = rocket.age();
        if age > tuning.rocket_ttl_ms {
            ProjectileFate::Expired
        } else if age > tuning.rocket_grace_ms {
            ProjectileFate::Armed
        } else {
            ProjectileFate::Inert
        }
    }

    /// First vehicle, in iteration order, that the projectile is inside of
    pub fn first_hit<'a>(
        rocket: &Rocket,
        vehicles: impl IntoIterator<Item = &'a Entity>,
        tuning: &ArenaTuning,
    ) -> Result<Option<EntityId>, GeometryError> {
        for vehicle in vehicles {
            let target = vehicle.body();
            if collision(
                rocket.body.x,
                rocket.body.y,
                target.x,
                target.y,
                tuning.collision_radius,
            )? {
                return Ok(Some(target.id));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{Kinematics, Vehicle};

    fn rocket_aged(age: u64) -> Rocket {
        let mut rocket = Rocket::new(Kinematics::at(9, 100, 50.0, 50.0));
        rocket.body.timestamp += age;
        rocket
    }

    #[test]
    fn fate_follows_age() {
        let tuning = ArenaTuning::default();
        assert_eq!(CombatSystem::fate(&rocket_aged(0), &tuning), ProjectileFate::Inert);
        assert_eq!(CombatSystem::fate(&rocket_aged(20), &tuning), ProjectileFate::Inert);
        assert_eq!(CombatSystem::fate(&rocket_aged(30), &tuning), ProjectileFate::Armed);
        assert_eq!(CombatSystem::fate(&rocket_aged(1000), &tuning), ProjectileFate::Armed);
        assert_eq!(CombatSystem::fate(&rocket_aged(1010), &tuning), ProjectileFate::Expired);
    }

    #[test]
    fn first_hit_respects_iteration_order() {
        let tuning = ArenaTuning::default();
        let a = Entity::Vehicle(Vehicle::new(Kinematics::at(1, 0, 52.0, 50.0), "#000", 20));
        let b = Entity::Vehicle(Vehicle::new(Kinematics::at(2, 0, 50.0, 50.0), "#000", 20));
        let far = Entity::Vehicle(Vehicle::new(Kinematics::at(3, 0, 300.0, 50.0), "#000", 20));

        let rocket = rocket_aged(30);
        assert_eq!(
            CombatSystem::first_hit(&rocket, [&far, &a, &b], &tuning).unwrap(),
            Some(1)
        );
        assert_eq!(CombatSystem::first_hit(&rocket, [&far], &tuning).unwrap(), None);
    }
}
