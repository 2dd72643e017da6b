//! Per-tick kinematic integration rules

use crate::util::geometry::{adjacent, opposite, position, GeometryError};

use super::entity::{Controls, Kinematics};
use super::tuning::ArenaTuning;

/// How a vehicle converts speed into rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steering {
    /// Turn along an arc of `steering_radius`; faster means sharper per tick
    Arc,
    /// Turn by a fixed angle per tick regardless of speed
    FixedRate(f64),
}

/// Physics system for advancing entities by one tick
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Straight-line flight: speed and angle never change
    pub fn advance_projectile(
        body: &mut Kinematics,
        tuning: &ArenaTuning,
    ) -> Result<(), GeometryError> {
        body.timestamp += tuning.tick_ms;

        let distance = (body.speed / 1000.0) * tuning.tick();
        let dx = adjacent(distance, body.angle)?;
        let dy = opposite(distance, body.angle)?;

        body.x = position(body.x + dx, tuning.width)?;
        body.y = position(body.y + dy, tuning.height)?;
        Ok(())
    }

    /// Friction, intent-driven thrust, then motion along the chord of the turning arc.
    /// `friction_passes` is how many times friction is applied this tick.
    pub fn advance_vehicle(
        body: &mut Kinematics,
        controls: &Controls,
        tuning: &ArenaTuning,
        friction_passes: i32,
        steering: Steering,
    ) -> Result<(), GeometryError> {
        body.timestamp += tuning.tick_ms;

        body.speed *= tuning.friction.powi(friction_passes);
        body.speed += tuning.acceleration * flag(controls.accelerating);
        body.speed -= tuning.reverse * flag(controls.reversing);

        let arc_distance = (body.speed / 1000.0) * tuning.tick();
        let steering_angle = arc_distance / tuning.steering_radius;
        let turn = flag(controls.turning_right) - flag(controls.turning_left);
        body.angle += match steering {
            Steering::Arc => steering_angle * turn,
            Steering::FixedRate(rate) => rate * turn,
        };

        let linear_distance = 2.0 * opposite(tuning.steering_radius, steering_angle / 2.0)?;
        let dx = adjacent(linear_distance, body.angle)?;
        let dy = opposite(linear_distance, body.angle)?;

        body.x = position(body.x + dx, tuning.width)?;
        body.y = position(body.y + dy, tuning.height)?;
        Ok(())
    }
}

fn flag(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn body(speed: f64, angle: f64) -> Kinematics {
        Kinematics {
            id: 1,
            timestamp: 100,
            x: 100.0,
            y: 100.0,
            angle,
            speed,
        }
    }

    #[test]
    fn projectile_moves_along_heading() {
        let tuning = ArenaTuning::default();
        let cases = [
            (0.0, 101.0, 100.0),
            (PI, 99.0, 100.0),
            (PI / 2.0, 100.0, 101.0),
            (3.0 * PI / 2.0, 100.0, 99.0),
            (PI / 4.0, 100.7071, 100.7071),
        ];
        for (angle, x, y) in cases {
            let mut b = body(100.0, angle);
            PhysicsSystem::advance_projectile(&mut b, &tuning).unwrap();
            assert_eq!(b.timestamp, 110);
            assert!((b.x - x).abs() < 1e-4, "angle {angle}: x = {}", b.x);
            assert!((b.y - y).abs() < 1e-4, "angle {angle}: y = {}", b.y);
            assert_eq!(b.angle, angle);
            assert_eq!(b.speed, 100.0);
        }
    }

    #[test]
    fn projectile_wraps_around_the_board() {
        let tuning = ArenaTuning::default();
        let mut b = Kinematics {
            x: 799.5,
            ..body(100.0, 0.0)
        };
        PhysicsSystem::advance_projectile(&mut b, &tuning).unwrap();
        assert!((b.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn boss_steering_ignores_speed() {
        let tuning = ArenaTuning::default();
        let controls = Controls {
            turning_right: true,
            ..Controls::default()
        };
        let mut still = body(0.0, 0.0);
        PhysicsSystem::advance_vehicle(&mut still, &controls, &tuning, 2, Steering::FixedRate(0.07))
            .unwrap();
        assert!((still.angle - 0.07).abs() < 1e-12);
        assert_eq!(still.x, 100.0);

        let mut arc = body(0.0, 0.0);
        PhysicsSystem::advance_vehicle(&mut arc, &controls, &tuning, 1, Steering::Arc).unwrap();
        assert_eq!(arc.angle, 0.0);
    }

    #[test]
    fn double_friction_is_squared() {
        let tuning = ArenaTuning::default();
        let mut b = body(100.0, 0.0);
        PhysicsSystem::advance_vehicle(&mut b, &Controls::default(), &tuning, 2, Steering::FixedRate(0.07))
            .unwrap();
        assert!((b.speed - 100.0 * tuning.friction * tuning.friction).abs() < 1e-9);
    }

    #[test]
    fn nan_speed_is_a_contract_violation() {
        let tuning = ArenaTuning::default();
        let mut b = body(f64::NAN, 0.0);
        assert!(PhysicsSystem::advance_projectile(&mut b, &tuning).is_err());
    }
}
