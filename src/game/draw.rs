//! Drawing routines for each entity variant
//!
//! Entities draw themselves in local coordinates: the caller has already
//! translated to the entity's position and rotated to its heading.

use super::entity::{Entity, Laser, Rocket, Vehicle};
use super::tuning::ArenaTuning;

/// 2D drawing surface, modelled on the browser canvas API
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, radians: f64);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn close_path(&mut self);

    fn set_stroke_style(&mut self, style: &str);
    fn set_fill_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    fn stroke(&mut self);
    fn fill(&mut self);
}

impl Entity {
    pub fn draw(&self, canvas: &mut dyn Canvas, tuning: &ArenaTuning) {
        match self {
            Entity::Vehicle(v) => draw_frame(v, canvas, tuning),
            Entity::Player(p) => draw_arrow(
                &p.vehicle,
                canvas,
                tuning.vehicle_width,
                tuning.vehicle_height,
                tuning.vehicle_height,
            ),
            Entity::Boss(b) => draw_arrow(
                &b.vehicle,
                canvas,
                tuning.boss_width,
                tuning.boss_width,
                tuning.boss_height,
            ),
            Entity::Rocket(r) => draw_rocket(r, canvas),
            Entity::Laser(l) => draw_laser(l, canvas),
        }
    }
}

fn draw_rocket(_rocket: &Rocket, canvas: &mut dyn Canvas) {
    canvas.begin_path();
    canvas.arc(0.0, 0.0, 2.0, 0.0, std::f64::consts::TAU);
    canvas.stroke();
}

fn draw_laser(laser: &Laser, canvas: &mut dyn Canvas) {
    canvas.set_stroke_style(&laser.laser_color);
    canvas.set_line_width(3.0);
    canvas.begin_path();
    canvas.move_to(20.0, 0.0);
    canvas.line_to(30.0, 0.0);
    canvas.stroke();
}

fn draw_frame(vehicle: &Vehicle, canvas: &mut dyn Canvas, tuning: &ArenaTuning) {
    let (w, h) = (tuning.vehicle_width, tuning.vehicle_height);
    canvas.begin_path();
    canvas.move_to(w, -h);
    canvas.line_to(-w, -h);
    canvas.line_to(-w, h);
    canvas.line_to(w, h);
    canvas.line_to(w, -h);
    canvas.set_stroke_style(&vehicle.color);
    canvas.stroke();
}

/// Arrow body followed by a health bar that shrinks with remaining health
fn draw_arrow(
    vehicle: &Vehicle,
    canvas: &mut dyn Canvas,
    width: f64,
    arrow_length: f64,
    bar_length: f64,
) {
    canvas.begin_path();
    canvas.move_to(0.0, -arrow_length / 2.0);
    canvas.line_to(width / 4.0, 0.0);
    canvas.line_to(0.0, arrow_length / 2.0);
    canvas.line_to(width, 0.0);
    canvas.close_path();

    let bar = (bar_length / 2.0) * vehicle.health_ratio();
    canvas.move_to(-width / 8.0, -bar);
    canvas.line_to(-width / 4.0, -bar);
    canvas.line_to(-width / 4.0, bar);
    canvas.line_to(-width / 8.0, bar);
    canvas.close_path();

    canvas.set_fill_style(&vehicle.color);
    canvas.fill();
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::game::entity::{Boss, Kinematics};

    /// Canvas that records the calls it receives
    #[derive(Debug, Default)]
    pub(crate) struct RecordingCanvas {
        pub calls: Vec<String>,
    }

    impl Canvas for RecordingCanvas {
        fn save(&mut self) {
            self.calls.push("save".into());
        }
        fn restore(&mut self) {
            self.calls.push("restore".into());
        }
        fn translate(&mut self, x: f64, y: f64) {
            self.calls.push(format!("translate {x} {y}"));
        }
        fn rotate(&mut self, radians: f64) {
            self.calls.push(format!("rotate {radians}"));
        }
        fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
            self.calls.push(format!("clear {x} {y} {width} {height}"));
        }
        fn begin_path(&mut self) {
            self.calls.push("begin".into());
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.calls.push(format!("move {x} {y}"));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.calls.push(format!("line {x} {y}"));
        }
        fn arc(&mut self, x: f64, y: f64, radius: f64, _start: f64, _end: f64) {
            self.calls.push(format!("arc {x} {y} {radius}"));
        }
        fn close_path(&mut self) {
            self.calls.push("close".into());
        }
        fn set_stroke_style(&mut self, style: &str) {
            self.calls.push(format!("stroke-style {style}"));
        }
        fn set_fill_style(&mut self, style: &str) {
            self.calls.push(format!("fill-style {style}"));
        }
        fn set_line_width(&mut self, width: f64) {
            self.calls.push(format!("line-width {width}"));
        }
        fn stroke(&mut self) {
            self.calls.push("stroke".into());
        }
        fn fill(&mut self) {
            self.calls.push("fill".into());
        }
    }

    #[test]
    fn laser_is_stroked_in_its_beam_color() {
        let laser = Entity::Laser(Laser {
            rocket: Rocket::new(Kinematics::at(1, 0, 0.0, 0.0)),
            laser_color: Laser::BLUE_BEAM.to_string(),
        });
        let mut canvas = RecordingCanvas::default();
        laser.draw(&mut canvas, &ArenaTuning::default());
        assert!(canvas.calls.contains(&format!("stroke-style {}", Laser::BLUE_BEAM)));
        assert_eq!(canvas.calls.last().map(String::as_str), Some("stroke"));
    }

    #[test]
    fn health_bar_shrinks_with_damage() {
        let tuning = ArenaTuning::default();
        let mut boss = Boss::spawn(0, 0, &tuning);
        boss.vehicle.health = boss.vehicle.max_health / 2;
        let mut canvas = RecordingCanvas::default();
        Entity::Boss(boss).draw(&mut canvas, &tuning);

        let half_bar = tuning.boss_height / 4.0;
        assert!(canvas.calls.contains(&format!("move -2.5 -{half_bar}")));
        assert_eq!(canvas.calls.last().map(String::as_str), Some("fill"));
    }
}
