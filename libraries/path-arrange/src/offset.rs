use std::f64::consts::PI;

use crate::flatten::FLATTEN_TOLERANCE;
use crate::forme::convert_to_forme;
use crate::path::{Path, Subpath};
use crate::path_segment::PathSegment;
use crate::shape::{FillRule, Shape};
use crate::vector::{Vector, perp};

/// Narrower offsets than this produce unusable slivers; the magnitude is
/// clamped up to it.
pub const MIN_OFFSET_WIDTH: f64 = 0.01;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinType {
	#[default]
	Miter,
	Round,
	/// Straight connection; also the fallback for unknown join keywords.
	Bevel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CapType {
	#[default]
	Butt,
	Round,
	Square,
}

#[derive(Clone, Debug)]
pub struct StrokeStyle {
	pub width: f64,
	pub join: JoinType,
	pub cap: CapType,
	pub miter_limit: f64,
	/// Alternating on/off lengths; empty means a solid stroke.
	pub dashes: Vec<f64>,
	pub dash_offset: f64,
}

impl Default for StrokeStyle {
	fn default() -> Self {
		StrokeStyle {
			width: 1.,
			join: JoinType::Miter,
			cap: CapType::Butt,
			miter_limit: 4.,
			dashes: Vec::new(),
			dash_offset: 0.,
		}
	}
}

/// Builds the outline of `path` stroked with `style` as a filled path. Solid
/// strokes offset both sides of each subpath directly; dashed strokes are
/// split into dash runs first, since the direct outline cannot represent dash
/// gaps. Either way a nonzero self-union pass removes the self-intersections
/// the raw offset produces at concave corners.
pub fn outline(path: &Path, style: &StrokeStyle) -> Path {
	if style.width <= 0. {
		return Path::new();
	}
	let radius = style.width * 0.5;

	let mut contours: Vec<Subpath> = Vec::new();
	for (points, closed) in polylines_of(path) {
		if points.len() < 2 {
			continue;
		}
		if style.dashes.iter().sum::<f64>() <= 0. {
			if closed {
				let reversed: Vec<Vector> = points.iter().rev().copied().collect();
				push_ring(&mut contours, offset_ring(&points, radius, style.join, style.miter_limit));
				push_ring(&mut contours, offset_ring(&reversed, radius, style.join, style.miter_limit));
			} else {
				push_ring(&mut contours, stroke_open(&points, radius, style));
			}
		} else {
			let mut run = points.clone();
			if closed {
				run.push(run[0]);
			}
			for dash in split_dashes(&run, &style.dashes, style.dash_offset) {
				if dash.len() >= 2 {
					push_ring(&mut contours, stroke_open(&dash, radius, style));
				}
			}
		}
	}

	cleanup(Path { subpaths: contours })
}

/// Insets (`distance < 0`) or outsets (`distance > 0`) the filled region of
/// `path` by translating each boundary edge along its outward normal, joining
/// the corner gaps, then re-uniting the result. Collinear runs are merged with
/// a tolerance proportional to the offset width.
pub fn make_offset(path: &Path, fill_rule: FillRule, distance: f64, join: JoinType, miter_limit: f64) -> Path {
	let source = convert_to_forme(&Shape::fill(path, 0).convert_to_shape(fill_rule));
	if distance == 0. || source.is_empty() {
		return source;
	}
	let distance = distance.signum() * distance.abs().max(MIN_OFFSET_WIDTH);

	let mut contours: Vec<Subpath> = Vec::new();
	for (points, _) in polylines_of(&source) {
		if points.len() < 3 {
			continue;
		}
		// Boundaries carry their interior on the left, so outward is -perp.
		let ring = offset_ring(&points, -distance, join, miter_limit);
		// An inset larger than the contour inverts it; the collapsed ring
		// flips orientation and is discarded rather than unioned in.
		if ring_area(&ring) * ring_area(&points) <= 0. {
			continue;
		}
		push_ring(&mut contours, merge_lines(&ring, 0.1 * distance.abs()));
	}

	cleanup(Path { subpaths: contours })
}

fn cleanup(raw: Path) -> Path {
	if raw.is_empty() {
		return Path::new();
	}
	convert_to_forme(&Shape::fill(&raw, 0).convert_to_shape(FillRule::NonZero))
}

/// Flattens every subpath to a polyline. Closed subpaths come back as rings
/// without a duplicated last point.
fn polylines_of(path: &Path) -> Vec<(Vec<Vector>, bool)> {
	let lowered = path.to_linear_and_cubics();
	let mut polylines = Vec::with_capacity(lowered.subpaths.len());
	let mut chords = Vec::new();

	for subpath in &lowered.subpaths {
		let mut points = vec![subpath.anchor];
		for segment in &subpath.segments {
			chords.clear();
			segment.flatten_into(FLATTEN_TOLERANCE, &mut chords);
			for &(_, _, _, end) in &chords {
				if !end.abs_diff_eq(*points.last().unwrap_or(&subpath.anchor), 1e-12) {
					points.push(end);
				}
			}
		}
		if subpath.closed && points.len() > 1 && points.last().unwrap().abs_diff_eq(points[0], 1e-9) {
			points.pop();
		}
		polylines.push((points, subpath.closed));
	}
	polylines
}

fn push_ring(contours: &mut Vec<Subpath>, ring: Vec<Vector>) {
	if ring.len() < 3 {
		return;
	}
	let segments = (0..ring.len()).map(|i| PathSegment::Line(ring[i], ring[(i + 1) % ring.len()])).collect();
	contours.push(Subpath {
		anchor: ring[0],
		segments,
		closed: true,
	});
}

/// Offset points of one side of an open polyline, signed: positive `radius`
/// is the left of the traversal direction. Corner gaps on the offset side get
/// joins; corners folding over the offset side are trimmed to the crossing of
/// the adjacent offset edges.
fn offset_open(points: &[Vector], radius: f64, join: JoinType, miter_limit: f64, out: &mut Vec<Vector>) {
	let directions: Vec<Vector> = points.windows(2).map(|w| (w[1] - w[0]).normalize_or_zero()).collect();

	out.push(points[0] + perp(directions[0]) * radius);
	for i in 1..points.len() - 1 {
		join_corner(out, points[i], directions[i - 1], directions[i], radius, join, miter_limit);
	}
	out.push(points[points.len() - 1] + perp(directions[directions.len() - 1]) * radius);
}

/// Offset ring of a closed polyline, with a join at every vertex.
fn offset_ring(points: &[Vector], radius: f64, join: JoinType, miter_limit: f64) -> Vec<Vector> {
	let count = points.len();
	let directions: Vec<Vector> = (0..count).map(|i| (points[(i + 1) % count] - points[i]).normalize_or_zero()).collect();

	let mut out = Vec::with_capacity(count * 2);
	for i in 0..count {
		let previous = directions[(i + count - 1) % count];
		join_corner(&mut out, points[i], previous, directions[i], radius, join, miter_limit);
	}
	out
}

fn join_corner(out: &mut Vec<Vector>, vertex: Vector, incoming: Vector, outgoing: Vector, radius: f64, join: JoinType, miter_limit: f64) {
	if incoming == Vector::ZERO || outgoing == Vector::ZERO {
		return;
	}
	let from = vertex + perp(incoming) * radius;
	let to = vertex + perp(outgoing) * radius;

	let turn = incoming.perp_dot(outgoing);
	// A gap only opens when the corner turns away from the offset side.
	if turn * radius.signum() < -1e-12 {
		out.push(from);
		match join {
			JoinType::Bevel => {}
			JoinType::Miter => {
				let s = (to - from).perp_dot(outgoing) / turn;
				let apex = from + incoming * s;
				if (apex - vertex).length() <= miter_limit * radius.abs() {
					out.push(apex);
				}
			}
			JoinType::Round => push_fan(out, vertex, from, to),
		}
		out.push(to);
	} else if turn.abs() <= 1e-12 {
		out.push(from);
		// An exact reversal has no crossing to trim; keep both sides.
		if incoming.dot(outgoing) < 0. {
			out.push(to);
		}
	} else {
		// The corner folds over the offset side: the adjacent offset edges
		// cross, and emitting both offset points in traversal order would
		// leave a loop winding the same way as the contour, which the union
		// pass cannot cancel. The corner is the edges' intersection instead.
		let s = (to - from).perp_dot(outgoing) / turn;
		let apex = from + incoming * s;
		let reach = apex - vertex;
		// Near-hairpin corners send the intersection far away; clamp so a
		// degenerate input cannot grow an unbounded spike.
		let limit = 1e3 * radius.abs();
		if reach.length() <= limit {
			out.push(apex);
		} else {
			out.push(vertex + reach * (limit / reach.length()));
		}
	}
}

/// Chord fan from `from` to `to` around `center`, taking the short way.
fn push_fan(out: &mut Vec<Vector>, center: Vector, from: Vector, to: Vector) {
	let radius = (from - center).length();
	if radius <= 0. {
		return;
	}
	let start = (from - center).to_angle();
	let mut sweep = (to - center).to_angle() - start;
	if sweep > PI {
		sweep -= 2. * PI;
	} else if sweep < -PI {
		sweep += 2. * PI;
	}
	let steps = (sweep.abs() / (PI / 16.)).ceil() as usize;
	for k in 1..steps {
		let angle = start + sweep * (k as f64 / steps as f64);
		out.push(center + Vector::from_angle(angle) * radius);
	}
}

/// One closed outline ring around an open polyline: left side out, end cap,
/// right side back, start cap.
fn stroke_open(points: &[Vector], radius: f64, style: &StrokeStyle) -> Vec<Vector> {
	let mut ring = Vec::new();
	offset_open(points, radius, style.join, style.miter_limit, &mut ring);

	let end = points[points.len() - 1];
	let end_direction = (end - points[points.len() - 2]).normalize_or_zero();
	push_cap(&mut ring, end, end_direction, radius, style.cap);

	let reversed: Vec<Vector> = points.iter().rev().copied().collect();
	offset_open(&reversed, radius, style.join, style.miter_limit, &mut ring);

	let start_direction = (points[0] - points[1]).normalize_or_zero();
	push_cap(&mut ring, points[0], start_direction, radius, style.cap);

	ring
}

fn push_cap(out: &mut Vec<Vector>, end: Vector, direction: Vector, radius: f64, cap: CapType) {
	let side = perp(direction) * radius;
	match cap {
		CapType::Butt => {}
		CapType::Square => {
			out.push(end + side + direction * radius);
			out.push(end - side + direction * radius);
		}
		CapType::Round => {
			// Two quarter fans through the cap tip keep the sweep direction
			// unambiguous at a half turn.
			let tip = end + direction * radius;
			push_fan(out, end, end + side, tip);
			out.push(tip);
			push_fan(out, end, tip, end - side);
		}
	}
}

/// Splits a polyline into its dash runs. The pattern alternates on/off and
/// repeats; an odd-length pattern is cycled twice, matching the usual dash
/// semantics.
fn split_dashes(points: &[Vector], dashes: &[f64], dash_offset: f64) -> Vec<Vec<Vector>> {
	let mut pattern: Vec<f64> = dashes.to_vec();
	if pattern.len() % 2 == 1 {
		pattern.extend_from_slice(dashes);
	}
	let total: f64 = pattern.iter().sum();
	if total <= 0. {
		return vec![points.to_vec()];
	}

	let mut phase = dash_offset.rem_euclid(total);
	let mut index = 0;
	while phase >= pattern[index] {
		phase -= pattern[index];
		index = (index + 1) % pattern.len();
	}
	let mut remaining = pattern[index] - phase;
	let mut drawing = index % 2 == 0;

	let mut runs = Vec::new();
	let mut current: Vec<Vector> = if drawing { vec![points[0]] } else { Vec::new() };

	for window in points.windows(2) {
		let (a, b) = (window[0], window[1]);
		let mut travelled = 0.;
		let length = a.distance(b);
		while length - travelled > remaining {
			travelled += remaining;
			let split = a + (b - a) * (travelled / length);
			if drawing {
				current.push(split);
				runs.push(std::mem::take(&mut current));
			} else {
				current = vec![split];
			}
			drawing = !drawing;
			index = (index + 1) % pattern.len();
			remaining = pattern[index];
		}
		remaining -= length - travelled;
		if drawing {
			current.push(b);
		}
	}
	if current.len() >= 2 {
		runs.push(current);
	}
	runs
}

fn ring_area(points: &[Vector]) -> f64 {
	let mut area = 0.;
	for (i, a) in points.iter().enumerate() {
		let b = points[(i + 1) % points.len()];
		area += a.x * b.y - b.x * a.y;
	}
	area * 0.5
}

/// Drops vertices that deviate less than `tolerance` from the line joining
/// their kept neighbors.
fn merge_lines(points: &[Vector], tolerance: f64) -> Vec<Vector> {
	if points.len() < 3 {
		return points.to_vec();
	}
	let mut out = vec![points[0]];
	for i in 1..points.len() - 1 {
		let previous = *out.last().expect("seeded with first point");
		let next = points[i + 1];
		let chord = next - previous;
		let deviation = if chord == Vector::ZERO {
			(points[i] - previous).length()
		} else {
			chord.normalize().perp_dot(points[i] - previous).abs()
		};
		if deviation > tolerance {
			out.push(points[i]);
		}
	}
	out.push(points[points.len() - 1]);
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use glam::DVec2;

	fn area(path: &Path) -> f64 {
		path.signed_area().abs()
	}

	#[test]
	fn outline_of_horizontal_line_is_a_rectangle() {
		let line = Path::new_line(DVec2::ZERO, DVec2::new(10., 0.));
		let style = StrokeStyle { width: 2., ..Default::default() };
		let result = outline(&line, &style);

		assert_eq!(result.subpaths.len(), 1);
		assert!((area(&result) - 20.).abs() < 1e-6);
	}

	#[test]
	fn square_caps_extend_the_stroke() {
		let line = Path::new_line(DVec2::ZERO, DVec2::new(10., 0.));
		let style = StrokeStyle {
			width: 2.,
			cap: CapType::Square,
			..Default::default()
		};
		// 12 x 2 rectangle: one radius added at each end.
		assert!((area(&outline(&line, &style)) - 24.).abs() < 1e-6);
	}

	#[test]
	fn round_caps_approach_the_disc_area() {
		let line = Path::new_line(DVec2::ZERO, DVec2::new(10., 0.));
		let style = StrokeStyle {
			width: 2.,
			cap: CapType::Round,
			..Default::default()
		};
		let expected = 20. + PI;
		assert!((area(&outline(&line, &style)) - expected).abs() < 0.05);
	}

	#[test]
	fn closed_stroke_is_an_annulus() {
		let square = Path::new_rect(DVec2::ZERO, DVec2::splat(10.));
		let style = StrokeStyle { width: 2., ..Default::default() };
		let result = outline(&square, &style);

		// Outer 12x12 minus inner 8x8 hole.
		assert_eq!(result.subpaths.len(), 2);
		assert!((result.signed_area().abs() - 80.).abs() < 1e-6);
	}

	#[test]
	fn dashes_produce_disjoint_outlines() {
		let line = Path::new_line(DVec2::ZERO, DVec2::new(10., 0.));
		let style = StrokeStyle {
			width: 1.,
			dashes: vec![2., 2.],
			..Default::default()
		};
		let result = outline(&line, &style);

		// Dashes at [0,2], [4,6], [8,10]: three separate rectangles.
		assert_eq!(result.subpaths.len(), 3);
		assert!((area(&result) - 6.).abs() < 1e-6);
	}

	#[test]
	fn outset_square_grows_by_the_miter_frame() {
		let square = Path::new_rect(DVec2::ZERO, DVec2::splat(1.));
		let result = make_offset(&square, FillRule::NonZero, 0.25, JoinType::Miter, 4.);
		assert!((area(&result) - 1.5 * 1.5).abs() < 1e-6);
	}

	#[test]
	fn outset_area_is_monotonic_in_the_distance() {
		let square = Path::new_rect(DVec2::ZERO, DVec2::splat(1.));
		let mut last = area(&make_offset(&square, FillRule::NonZero, MIN_OFFSET_WIDTH, JoinType::Round, 4.));
		for distance in [0.1, 0.2, 0.5, 1.] {
			let next = area(&make_offset(&square, FillRule::NonZero, distance, JoinType::Round, 4.));
			assert!(next >= last, "area shrank from {last} to {next} at distance {distance}");
			last = next;
		}
	}

	#[test]
	fn inset_square_shrinks_and_eventually_vanishes() {
		let square = Path::new_rect(DVec2::ZERO, DVec2::splat(1.));
		let smaller = make_offset(&square, FillRule::NonZero, -0.25, JoinType::Miter, 4.);
		// A single 0.5 x 0.5 square, with no leftover corner loops.
		assert_eq!(smaller.subpaths.len(), 1);
		assert!((area(&smaller) - 0.25).abs() < 1e-6);
		let gone = make_offset(&square, FillRule::NonZero, -0.75, JoinType::Miter, 4.);
		assert!(area(&gone) < 1e-6);
	}

	#[test]
	fn dash_splitting_respects_the_pattern() {
		let points = vec![DVec2::ZERO, DVec2::new(10., 0.)];
		let runs = split_dashes(&points, &[3., 1.], 0.);
		assert_eq!(runs.len(), 3);
		assert!(runs[0][0].abs_diff_eq(DVec2::ZERO, 1e-12));
		assert!(runs[0].last().unwrap().abs_diff_eq(DVec2::new(3., 0.), 1e-12));
		assert!(runs[1][0].abs_diff_eq(DVec2::new(4., 0.), 1e-12));
	}

	#[test]
	fn merge_lines_drops_collinear_noise() {
		let points = vec![
			DVec2::ZERO,
			DVec2::new(1., 0.001),
			DVec2::new(2., -0.001),
			DVec2::new(3., 0.),
			DVec2::new(3., 3.),
		];
		let merged = merge_lines(&points, 0.01);
		assert_eq!(merged, vec![DVec2::ZERO, DVec2::new(3., 0.), DVec2::new(3., 3.)]);
	}
}
