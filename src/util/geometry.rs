//! Trigonometry, wrapping and collision primitives shared by the simulation

use rand::Rng;

/// Geometry contract violations. These are programming errors, not runtime conditions.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Invalid arguments: {0}")]
    InvalidArgument(&'static str),
}

fn finite(value: f64, name: &'static str) -> Result<f64, GeometryError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::InvalidArgument(name))
    }
}

/// Uniform random integer in `[from, to]`
pub fn random(from: i64, to: i64) -> Result<i64, GeometryError> {
    random_with(&mut rand::thread_rng(), from, to)
}

/// Same as [`random`] but drawing from the given generator
pub fn random_with<R: Rng + ?Sized>(rng: &mut R, from: i64, to: i64) -> Result<i64, GeometryError> {
    if from > to {
        return Err(GeometryError::InvalidArgument("from must not exceed to"));
    }
    Ok(rng.gen_range(from..=to))
}

/// Random `#RGB` color (three hex digits, not six)
pub fn random_color() -> String {
    const LETTERS: &[u8; 16] = b"0123456789ABCDEF";
    let mut rng = rand::thread_rng();
    let mut color = String::with_capacity(4);
    color.push('#');
    for _ in 0..3 {
        color.push(LETTERS[rng.gen_range(0..16)] as char);
    }
    color
}

pub fn to_radians(degrees: f64) -> Result<f64, GeometryError> {
    Ok(finite(degrees, "degrees")? * (std::f64::consts::PI / 180.0))
}

pub fn to_degrees(radians: f64) -> Result<f64, GeometryError> {
    Ok(finite(radians, "radians")? * (180.0 / std::f64::consts::PI))
}

/// Adjacent side of a right triangle: `h * cos(radians)`
pub fn adjacent(hypotenuse: f64, radians: f64) -> Result<f64, GeometryError> {
    Ok(radians_checked(radians)?.cos() * finite(hypotenuse, "hypotenuse")?)
}

/// Opposite side of a right triangle: `h * sin(radians)`
pub fn opposite(hypotenuse: f64, radians: f64) -> Result<f64, GeometryError> {
    Ok(radians_checked(radians)?.sin() * finite(hypotenuse, "hypotenuse")?)
}

fn radians_checked(radians: f64) -> Result<f64, GeometryError> {
    finite(radians, "radians")
}

/// Wrap a coordinate onto `[0, max)` using floored modulo
pub fn position(coordinate: f64, max: f64) -> Result<f64, GeometryError> {
    let coordinate = finite(coordinate, "coordinate")?;
    let max = finite(max, "max")?;
    if max <= 0.0 {
        return Err(GeometryError::InvalidArgument("max must be positive"));
    }
    let wrapped = coordinate.rem_euclid(max);
    // rem_euclid can round up to exactly `max` for tiny negative inputs
    Ok(if wrapped >= max { 0.0 } else { wrapped })
}

/// Euclidean distance between (x1;y1) and (x2;y2)
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x1 - x2).hypot(y1 - y2)
}

/// True when the point lies strictly inside the circle
pub fn collision(px: f64, py: f64, cx: f64, cy: f64, radius: f64) -> Result<bool, GeometryError> {
    let px = finite(px, "px")?;
    let py = finite(py, "py")?;
    let cx = finite(cx, "cx")?;
    let cy = finite(cy, "cy")?;
    let radius = finite(radius, "radius")?;
    Ok(distance(px, py, cx, cy) < radius)
}

/// Bring an angle in degrees into `[0, 360)`
pub fn to_360_range(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
