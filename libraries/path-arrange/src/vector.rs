use glam::DVec2;

pub type Vector = DVec2;

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
	a + (b - a) * t
}

/// Counter-clockwise perpendicular (in a y-up coordinate interpretation).
pub fn perp(v: Vector) -> Vector {
	Vector::new(-v.y, v.x)
}
