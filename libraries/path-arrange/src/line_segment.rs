use glam::DVec2;

pub type LineSegment = [DVec2; 2];

const COLLINEAR_EPS: f64 = f64::EPSILON * 64.;

/// Parameters (s, t) of the crossing of two segments, or `None` when parallel
/// or out of range (allowing `eps` of parameter slack at the ends).
pub fn line_segment_intersection(seg_a: LineSegment, seg_b: LineSegment, eps: f64) -> Option<(f64, f64)> {
	let dir_a = seg_a[1] - seg_a[0];
	let dir_b = seg_b[1] - seg_b[0];
	let cross = dir_a.perp_dot(dir_b);
	if cross.abs() < COLLINEAR_EPS {
		return None;
	}

	let offset = seg_b[0] - seg_a[0];
	let s = offset.perp_dot(dir_b) / cross;
	let t = offset.perp_dot(dir_a) / cross;

	let range = -eps..=1. + eps;
	(range.contains(&s) && range.contains(&t)).then_some((s, t))
}

/// Parameter of `point` projected onto the segment, clamped to [0, 1].
pub fn project_onto_segment([a, b]: LineSegment, point: DVec2) -> f64 {
	let d = b - a;
	let len2 = d.length_squared();
	if len2 == 0. {
		return 0.;
	}
	((point - a).dot(d) / len2).clamp(0., 1.)
}

/// Parameter of `point` on the segment when it lies on it within `eps`, else `None`.
pub fn point_on_segment([a, b]: LineSegment, point: DVec2, eps: f64) -> Option<f64> {
	let t = project_onto_segment([a, b], point);
	let closest = a + (b - a) * t;
	(closest.distance_squared(point) <= eps * eps).then_some(t)
}
