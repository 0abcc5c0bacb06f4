use std::f64::consts::{PI, TAU};

use glam::{DMat2, DVec2};

use crate::aabb::Aabb;
use crate::epsilons::Epsilons;
use crate::line_segment::line_segment_intersection;
use crate::vector::{Vector, lerp};

/// One curve piece of a subpath. Arc parameters follow the endpoint
/// parametrization of the path-data exchange format: radii, x-axis rotation in
/// degrees, large-arc and sweep flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathSegment {
	Line(Vector, Vector),
	Quadratic(Vector, Vector, Vector),
	Cubic(Vector, Vector, Vector, Vector),
	Arc(Vector, f64, f64, f64, bool, bool, Vector),
}

pub struct ArcCenterParametrization {
	center: Vector,
	theta1: f64,
	delta_theta: f64,
	rx: f64,
	ry: f64,
	phi: f64,
}

impl PathSegment {
	pub fn start(&self) -> Vector {
		match *self {
			PathSegment::Line(start, _) => start,
			PathSegment::Quadratic(start, _, _) => start,
			PathSegment::Cubic(start, _, _, _) => start,
			PathSegment::Arc(start, _, _, _, _, _, _) => start,
		}
	}

	pub fn end(&self) -> Vector {
		match *self {
			PathSegment::Line(_, end) => end,
			PathSegment::Quadratic(_, _, end) => end,
			PathSegment::Cubic(_, _, _, end) => end,
			PathSegment::Arc(_, _, _, _, _, _, end) => end,
		}
	}

	pub fn reverse(&self) -> PathSegment {
		match *self {
			PathSegment::Line(start, end) => PathSegment::Line(end, start),
			PathSegment::Quadratic(p1, p2, p3) => PathSegment::Quadratic(p3, p2, p1),
			PathSegment::Cubic(p1, p2, p3, p4) => PathSegment::Cubic(p4, p3, p2, p1),
			PathSegment::Arc(start, rx, ry, phi, large_arc, sweep, end) => PathSegment::Arc(end, rx, ry, phi, large_arc, !sweep, start),
		}
	}

	pub fn sample_at(&self, t: f64) -> Vector {
		match *self {
			PathSegment::Line(start, end) => start.lerp(end, t),
			PathSegment::Quadratic(p1, p2, p3) => {
				let p01 = p1.lerp(p2, t);
				let p12 = p2.lerp(p3, t);
				p01.lerp(p12, t)
			}
			PathSegment::Cubic(p1, p2, p3, p4) => {
				let p01 = p1.lerp(p2, t);
				let p12 = p2.lerp(p3, t);
				let p23 = p3.lerp(p4, t);
				let p012 = p01.lerp(p12, t);
				let p123 = p12.lerp(p23, t);
				p012.lerp(p123, t)
			}
			PathSegment::Arc(start, rx, ry, phi, _, _, end) => {
				if let Some(params) = self.arc_center_parametrization() {
					let theta = params.theta1 + t * params.delta_theta;
					let p = DVec2::new(rx * theta.cos(), ry * theta.sin());
					DMat2::from_angle(phi.to_radians()) * p + params.center
				} else {
					start.lerp(end, t)
				}
			}
		}
	}

	pub fn split_at(&self, t: f64) -> (PathSegment, PathSegment) {
		match *self {
			PathSegment::Line(start, end) => {
				let p = start.lerp(end, t);
				(PathSegment::Line(start, p), PathSegment::Line(p, end))
			}
			PathSegment::Quadratic(p0, p1, p2) => {
				let p01 = p0.lerp(p1, t);
				let p12 = p1.lerp(p2, t);
				let p = p01.lerp(p12, t);
				(PathSegment::Quadratic(p0, p01, p), PathSegment::Quadratic(p, p12, p2))
			}
			PathSegment::Cubic(p0, p1, p2, p3) => {
				let p01 = p0.lerp(p1, t);
				let p12 = p1.lerp(p2, t);
				let p23 = p2.lerp(p3, t);
				let p012 = p01.lerp(p12, t);
				let p123 = p12.lerp(p23, t);
				let p = p012.lerp(p123, t);
				(PathSegment::Cubic(p0, p01, p012, p), PathSegment::Cubic(p, p123, p23, p3))
			}
			PathSegment::Arc(start, _, _, _, _, _, end) => {
				if let Some(params) = self.arc_center_parametrization() {
					let mid_delta_theta = params.delta_theta * t;
					let seg1 = ArcCenterParametrization {
						delta_theta: mid_delta_theta,
						..params
					}
					.to_segment(Some(start), None);
					let seg2 = ArcCenterParametrization {
						theta1: params.theta1 + mid_delta_theta,
						delta_theta: params.delta_theta - mid_delta_theta,
						..params
					}
					.to_segment(None, Some(end));
					(seg1, seg2)
				} else {
					// Degenerate radii behave as a straight line.
					let p = start.lerp(end, t);
					(PathSegment::Line(start, p), PathSegment::Line(p, end))
				}
			}
		}
	}

	/// The sub-segment covering the parameter interval [t0, t1] (t0 <= t1).
	pub fn slice_between(&self, t0: f64, t1: f64) -> PathSegment {
		let (_, tail) = self.split_at(t0);
		if t0 >= 1. {
			return tail;
		}
		let local = ((t1 - t0) / (1. - t0)).clamp(0., 1.);
		tail.split_at(local).0
	}

	pub fn bounding_box(&self) -> Aabb {
		match *self {
			PathSegment::Line(start, end) => Aabb::new(start, end),
			PathSegment::Quadratic(p1, p2, p3) => {
				let (left, right) = quadratic_bounding_interval(p1.x, p2.x, p3.x);
				let (top, bottom) = quadratic_bounding_interval(p1.y, p2.y, p3.y);
				Aabb::new(DVec2::new(left, top), DVec2::new(right, bottom))
			}
			PathSegment::Cubic(p1, p2, p3, p4) => {
				let (left, right) = cubic_bounding_interval(p1.x, p2.x, p3.x, p4.x);
				let (top, bottom) = cubic_bounding_interval(p1.y, p2.y, p3.y, p4.y);
				Aabb::new(DVec2::new(left, top), DVec2::new(right, bottom))
			}
			PathSegment::Arc(start, _, _, _, _, _, end) => {
				let mut bounding_box = Aabb::new(start, end);
				for cubic in self.arc_to_cubics(PI / 16.) {
					bounding_box = bounding_box.merge(&cubic.bounding_box());
				}
				bounding_box
			}
		}
	}

	pub fn arc_center_parametrization(&self) -> Option<ArcCenterParametrization> {
		let PathSegment::Arc(xy1, rx, ry, phi, large_arc, sweep, xy2) = *self else {
			return None;
		};
		if rx == 0. || ry == 0. {
			return None;
		}

		let rotation_matrix = DMat2::from_angle(-phi.to_radians());
		let xy1_prime = rotation_matrix * (xy1 - xy2) * 0.5;

		let mut rx = rx.abs();
		let mut ry = ry.abs();
		let x1_prime2 = xy1_prime.x * xy1_prime.x;
		let y1_prime2 = xy1_prime.y * xy1_prime.y;

		let lambda = x1_prime2 / (rx * rx) + y1_prime2 / (ry * ry);
		if lambda > 1. {
			let lambda_sqrt = lambda.sqrt();
			rx *= lambda_sqrt;
			ry *= lambda_sqrt;
		}
		let rx2 = rx * rx;
		let ry2 = ry * ry;

		let sign = if large_arc == sweep { -1. } else { 1. };
		let numerator = (rx2 * ry2 - rx2 * y1_prime2 - ry2 * x1_prime2).max(0.);
		let multiplier = (numerator / (rx2 * y1_prime2 + ry2 * x1_prime2)).sqrt();
		let cx_prime = sign * multiplier * ((rx * xy1_prime.y) / ry);
		let cy_prime = sign * multiplier * ((-ry * xy1_prime.x) / rx);

		let center = rotation_matrix.transpose() * DVec2::new(cx_prime, cy_prime) + (xy1 + xy2) * 0.5;

		let vec1 = DVec2::new((xy1_prime.x - cx_prime) / rx, (xy1_prime.y - cy_prime) / ry);
		let vec2 = DVec2::new((-xy1_prime.x - cx_prime) / rx, (-xy1_prime.y - cy_prime) / ry);
		let theta1 = vector_angle(DVec2::X, vec1);
		let mut delta_theta = vector_angle(vec1, vec2);

		if !sweep && delta_theta > 0. {
			delta_theta -= TAU;
		} else if sweep && delta_theta < 0. {
			delta_theta += TAU;
		}

		Some(ArcCenterParametrization {
			center,
			theta1,
			delta_theta,
			rx,
			ry,
			phi,
		})
	}

	/// Approximate an arc by cubic beziers, one per `max_delta_theta` of sweep.
	pub fn arc_to_cubics(&self, max_delta_theta: f64) -> Vec<PathSegment> {
		let PathSegment::Arc(start, _, _, _, _, _, end) = *self else {
			return vec![*self];
		};
		let Some(params) = self.arc_center_parametrization() else {
			return vec![PathSegment::Line(start, end)];
		};

		let count = ((params.delta_theta.abs() / max_delta_theta).ceil() as usize).max(1);
		let step = params.delta_theta / count as f64;
		let k = (4. / 3.) * (step / 4.).tan();
		let rotation = DMat2::from_angle(params.phi.to_radians());
		let radii = DVec2::new(params.rx, params.ry);

		let place = |theta: f64, tangent_scale: f64| {
			let point = DVec2::new(theta.cos(), theta.sin());
			let tangent = DVec2::new(-theta.sin(), theta.cos()) * tangent_scale;
			(rotation * ((point) * radii) + params.center, rotation * ((point + tangent) * radii) + params.center)
		};

		(0..count)
			.map(|i| {
				let theta_a = params.theta1 + i as f64 * step;
				let theta_b = theta_a + step;
				let (a, a_handle) = place(theta_a, k);
				let (b, b_handle) = place(theta_b, -k);
				PathSegment::Cubic(a, a_handle, b_handle, b)
			})
			.collect()
	}

	/// Exact elevation of a quadratic to a cubic; lines and cubics pass through
	/// unchanged. Arcs are approximated (they are excluded from the arrangement
	/// engine, which only accepts lines and cubics).
	pub fn to_linear_and_cubics(&self) -> Vec<PathSegment> {
		match *self {
			PathSegment::Line(..) | PathSegment::Cubic(..) => vec![*self],
			PathSegment::Quadratic(p0, p1, p2) => {
				let c1 = p0 + (p1 - p0) * (2. / 3.);
				let c2 = p2 + (p1 - p2) * (2. / 3.);
				vec![PathSegment::Cubic(p0, c1, c2, p2)]
			}
			PathSegment::Arc(..) => self.arc_to_cubics(PI / 8.),
		}
	}

	/// Adaptive flattening: appends chords `(t0, t1, a, b)` covering the whole
	/// segment, such that the curve deviates from each chord by at most
	/// `tolerance`.
	pub fn flatten_into(&self, tolerance: f64, out: &mut Vec<(f64, f64, Vector, Vector)>) {
		match self {
			PathSegment::Line(start, end) => out.push((0., 1., *start, *end)),
			PathSegment::Arc(..) => {
				// Map each cubic onto an equal share of the arc's parameter range.
				let cubics = self.arc_to_cubics(PI / 8.);
				let share = 1. / cubics.len() as f64;
				for (i, cubic) in cubics.iter().enumerate() {
					let mut local = Vec::new();
					cubic.flatten_into(tolerance, &mut local);
					for (t0, t1, a, b) in local {
						out.push(((i as f64 + t0) * share, (i as f64 + t1) * share, a, b));
					}
				}
			}
			_ => flatten_recursive(self, 0., 1., tolerance, 0, out),
		}
	}

	/// Parameter of the nearest point on the segment to `point`.
	///
	/// Coarse sampling followed by local ternary refinement; accurate to well
	/// below typical snapping tolerances.
	pub fn project(&self, point: Vector) -> f64 {
		if let PathSegment::Line(start, end) = *self {
			return crate::line_segment::project_onto_segment([start, end], point);
		}

		const SAMPLES: usize = 32;
		let mut best_t = 0.;
		let mut best_dist = f64::INFINITY;
		for i in 0..=SAMPLES {
			let t = i as f64 / SAMPLES as f64;
			let dist = self.sample_at(t).distance_squared(point);
			if dist < best_dist {
				best_dist = dist;
				best_t = t;
			}
		}

		let mut lo = (best_t - 1. / SAMPLES as f64).max(0.);
		let mut hi = (best_t + 1. / SAMPLES as f64).min(1.);
		for _ in 0..64 {
			let m1 = lo + (hi - lo) / 3.;
			let m2 = hi - (hi - lo) / 3.;
			if self.sample_at(m1).distance_squared(point) < self.sample_at(m2).distance_squared(point) {
				hi = m2;
			} else {
				lo = m1;
			}
		}
		(lo + hi) * 0.5
	}

	/// All crossing parameters `[t_self, t_other]` between two segments, by
	/// bounding-box-pruned recursive subdivision (closed form for line pairs).
	pub fn intersections(&self, other: &PathSegment, eps: &Epsilons) -> Vec<[f64; 2]> {
		if let (PathSegment::Line(start0, end0), PathSegment::Line(start1, end1)) = (self, other) {
			return line_segment_intersection([*start0, *end0], [*start1, *end1], eps.param).map(|st| vec![[st.0, st.1]]).unwrap_or_default();
		}

		#[derive(Clone, Copy)]
		struct Piece {
			seg: PathSegment,
			t0: f64,
			t1: f64,
			bounding_box: Aabb,
		}
		impl Piece {
			fn new(seg: PathSegment, t0: f64, t1: f64) -> Self {
				let bounding_box = seg.bounding_box();
				Piece { seg, t0, t1, bounding_box }
			}
			fn halves(&self) -> [Piece; 2] {
				let (a, b) = self.seg.split_at(0.5);
				let mid = (self.t0 + self.t1) * 0.5;
				[Piece::new(a, self.t0, mid), Piece::new(b, mid, self.t1)]
			}
			fn as_chord(&self) -> [Vector; 2] {
				[self.seg.start(), self.seg.end()]
			}
		}

		let mut params = Vec::new();
		let mut pairs = vec![(Piece::new(*self, 0., 1.), Piece::new(*other, 0., 1.))];

		while let Some((a, b)) = pairs.pop() {
			if !a.bounding_box.expand(eps.point).overlaps(&b.bounding_box) {
				continue;
			}
			let a_linear = a.bounding_box.max_extent() <= eps.linear;
			let b_linear = b.bounding_box.max_extent() <= eps.linear;
			if a_linear && b_linear {
				if let Some((s, t)) = line_segment_intersection(a.as_chord(), b.as_chord(), eps.param) {
					let st = [lerp(a.t0, a.t1, s), lerp(b.t0, b.t1, t)];
					// Subdivision can report the same crossing from adjacent pieces.
					if !params.iter().any(|[ps, pt]: &[f64; 2]| (ps - st[0]).abs() < 1e-6 && (pt - st[1]).abs() < 1e-6) {
						params.push(st);
					}
				}
				continue;
			}
			match (a_linear, b_linear) {
				(false, false) => {
					let [a0, a1] = a.halves();
					let [b0, b1] = b.halves();
					pairs.push((a0, b0));
					pairs.push((a0, b1));
					pairs.push((a1, b0));
					pairs.push((a1, b1));
				}
				(true, false) => {
					let [b0, b1] = b.halves();
					pairs.push((a, b0));
					pairs.push((a, b1));
				}
				(false, true) => {
					let [a0, a1] = a.halves();
					pairs.push((a0, b));
					pairs.push((a1, b));
				}
				(true, true) => unreachable!(),
			}
		}

		params
	}
}

impl ArcCenterParametrization {
	fn to_segment(&self, start: Option<Vector>, end: Option<Vector>) -> PathSegment {
		let rotation_matrix = DMat2::from_angle(self.phi.to_radians());

		let at = |theta: f64| rotation_matrix * DVec2::new(self.rx * theta.cos(), self.ry * theta.sin()) + self.center;

		let xy1 = start.unwrap_or_else(|| at(self.theta1));
		let xy2 = end.unwrap_or_else(|| at(self.theta1 + self.delta_theta));

		let large_arc = self.delta_theta.abs() > PI;
		let sweep = self.delta_theta > 0.;

		PathSegment::Arc(xy1, self.rx, self.ry, self.phi, large_arc, sweep, xy2)
	}
}

fn vector_angle(u: DVec2, v: DVec2) -> f64 {
	const EPS: f64 = 1e-12;

	let sign = u.x * v.y - u.y * v.x;

	if sign.abs() < EPS && (u + v).length_squared() < EPS * EPS {
		return PI;
	}

	sign.signum() * (u.dot(v) / (u.length() * v.length())).clamp(-1., 1.).acos()
}

fn flatten_recursive(seg: &PathSegment, t0: f64, t1: f64, tolerance: f64, depth: usize, out: &mut Vec<(f64, f64, Vector, Vector)>) {
	let start = seg.start();
	let end = seg.end();
	if depth >= 24 || chord_deviation(seg) <= tolerance {
		out.push((t0, t1, start, end));
		return;
	}
	let (a, b) = seg.split_at(0.5);
	let mid = (t0 + t1) * 0.5;
	flatten_recursive(&a, t0, mid, tolerance, depth + 1, out);
	flatten_recursive(&b, mid, t1, tolerance, depth + 1, out);
}

/// Upper bound on how far the curve strays from its chord: max distance of the
/// control points to the chord (the curve stays inside the control hull).
fn chord_deviation(seg: &PathSegment) -> f64 {
	let controls: &[Vector] = match seg {
		PathSegment::Line(..) => return 0.,
		PathSegment::Quadratic(_, c, _) => &[*c],
		PathSegment::Cubic(_, c1, c2, _) => &[*c1, *c2],
		PathSegment::Arc(..) => return f64::INFINITY,
	};
	let a = seg.start();
	let b = seg.end();
	let d = b - a;
	let len2 = d.length_squared();
	controls
		.iter()
		.map(|&c| {
			if len2 == 0. {
				c.distance(a)
			} else {
				let t = ((c - a).dot(d) / len2).clamp(0., 1.);
				c.distance(a + d * t)
			}
		})
		.fold(0., f64::max)
}

fn eval_cubic_1d(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
	let p01 = lerp(p0, p1, t);
	let p12 = lerp(p1, p2, t);
	let p23 = lerp(p2, p3, t);
	let p012 = lerp(p01, p12, t);
	let p123 = lerp(p12, p23, t);
	lerp(p012, p123, t)
}

fn cubic_bounding_interval(p0: f64, p1: f64, p2: f64, p3: f64) -> (f64, f64) {
	let mut min = p0.min(p3);
	let mut max = p0.max(p3);

	let a = 3. * (-p0 + 3. * p1 - 3. * p2 + p3);
	let b = 6. * (p0 - 2. * p1 + p2);
	let c = 3. * (p1 - p0);

	if a == 0. {
		if b != 0. {
			let t = -c / b;
			if (0. ..1.).contains(&t) {
				let x = eval_cubic_1d(p0, p1, p2, p3, t);
				min = min.min(x);
				max = max.max(x);
			}
		}
		return (min, max);
	}

	let d = b * b - 4. * a * c;
	if d < 0. {
		return (min, max);
	}

	let sqrt_d = d.sqrt();
	for t in [(-b - sqrt_d) / (2. * a), (-b + sqrt_d) / (2. * a)] {
		if (0. ..1.).contains(&t) {
			let x = eval_cubic_1d(p0, p1, p2, p3, t);
			min = min.min(x);
			max = max.max(x);
		}
	}

	(min, max)
}

fn quadratic_bounding_interval(p0: f64, p1: f64, p2: f64) -> (f64, f64) {
	let mut min = p0.min(p2);
	let mut max = p0.max(p2);

	let denominator = p0 - 2. * p1 + p2;
	if denominator == 0. {
		return (min, max);
	}

	let t = (p0 - p1) / denominator;
	if (0. ..=1.).contains(&t) {
		let p01 = lerp(p0, p1, t);
		let p12 = lerp(p1, p2, t);
		let x = lerp(p01, p12, t);
		min = min.min(x);
		max = max.max(x);
	}

	(min, max)
}
