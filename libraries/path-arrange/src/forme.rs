use rustc_hash::{FxHashMap, FxHashSet};

use crate::path::{Path, Subpath};
use crate::path_segment::PathSegment;
use crate::shape::{EdgeKey, PointKey, Shape};
use crate::vector::Vector;

/// Extracts an explicit path from an arrangement by walking its faces. Every
/// directed edge is used exactly once; each cycle becomes one closed subpath.
/// Curve geometry is reconstructed from back data, so a cubic that survived a
/// boolean comes back as a cubic slice, not a polyline.
pub fn convert_to_forme(shape: &Shape) -> Path {
	Path {
		subpaths: trace_contours(shape).into_iter().map(|contour| contour.subpath).collect(),
	}
}

/// Like [`convert_to_forme`], additionally reporting which subpath each hole
/// belongs to: `nesting[i]` is the index of the outer subpath containing
/// subpath `i`, or `None` for outer contours themselves. Needed when cut
/// produces disjoint pieces with holes.
pub fn convert_to_forme_nested(shape: &Shape) -> (Path, Vec<Option<usize>>) {
	let contours = trace_contours(shape);

	let mut nesting = vec![None; contours.len()];
	for (index, contour) in contours.iter().enumerate() {
		// Negative area under y-up shoelace means the contour runs clockwise,
		// which is how boundary extraction orients holes.
		if contour.area >= 0. {
			continue;
		}
		let Some(sample) = contour.interior_sample else { continue };
		let parent = contours
			.iter()
			.enumerate()
			.filter(|(_, candidate)| candidate.area > 0. && winding_of_polyline(&candidate.vertices, sample) != 0)
			.min_by(|(_, a), (_, b)| a.area.total_cmp(&b.area))
			.map(|(parent_index, _)| parent_index);
		nesting[index] = parent;
	}

	let path = Path {
		subpaths: contours.into_iter().map(|contour| contour.subpath).collect(),
	};
	(path, nesting)
}

struct Contour {
	subpath: Subpath,
	vertices: Vec<Vector>,
	area: f64,
	/// A point just inside the face to the left of the first edge.
	interior_sample: Option<Vector>,
}

fn trace_contours(shape: &Shape) -> Vec<Contour> {
	// Outgoing adjacency, rebuilt from the undirected incidence lists.
	let mut outgoing: FxHashMap<PointKey, Vec<EdgeKey>> = FxHashMap::default();
	for (key, edge) in &shape.edges {
		outgoing.entry(edge.start).or_default().push(key);
	}

	let delta = shape.side_delta();
	let mut visited = FxHashSet::default();
	let mut contours = Vec::new();

	let mut edge_keys: Vec<EdgeKey> = shape.edges.keys().collect();
	edge_keys.sort_unstable();

	for first in edge_keys {
		if visited.contains(&first) {
			continue;
		}

		let mut cycle = Vec::new();
		let mut current = first;
		loop {
			visited.insert(current);
			cycle.push(current);

			let edge = &shape.edges[current];
			let from = shape.position(edge.start);
			let at = shape.position(edge.end);
			let Some(next) = next_edge_clockwise(shape, &outgoing, edge.end, at - from) else {
				break;
			};
			if next == first {
				break;
			}
			if visited.contains(&next) {
				log::warn!("face walk revisited an edge; salvaging a partial contour of {} edges", cycle.len());
				break;
			}
			current = next;
		}

		contours.push(build_contour(shape, &cycle, delta));
	}
	contours
}

/// The face to the left of the incoming edge continues along the outgoing
/// edge found first when sweeping clockwise from the reversed incoming
/// direction. The exact reverse counts as a full turn, so walking back out of
/// a dead-end spur only happens when nothing else leaves the vertex.
fn next_edge_clockwise(shape: &Shape, outgoing: &FxHashMap<PointKey, Vec<EdgeKey>>, vertex: PointKey, incoming: Vector) -> Option<EdgeKey> {
	let reverse_angle = Vector::new(-incoming.x, -incoming.y).to_angle();
	let candidates = outgoing.get(&vertex)?;

	let mut best: Option<(f64, EdgeKey)> = None;
	for &candidate in candidates {
		let edge = &shape.edges[candidate];
		let direction = shape.position(edge.end) - shape.position(edge.start);
		if direction == Vector::ZERO {
			continue;
		}
		let mut clockwise = (reverse_angle - direction.to_angle()).rem_euclid(std::f64::consts::TAU);
		if clockwise < 1e-9 {
			clockwise = std::f64::consts::TAU;
		}
		if best.is_none_or(|(angle, _)| clockwise < angle) {
			best = Some((clockwise, candidate));
		}
	}
	best.map(|(_, key)| key)
}

fn build_contour(shape: &Shape, cycle: &[EdgeKey], delta: f64) -> Contour {
	let mut vertices = Vec::with_capacity(cycle.len());
	for &key in cycle {
		vertices.push(shape.position(shape.edges[key].start));
	}

	let mut area = 0.;
	for (i, a) in vertices.iter().enumerate() {
		let b = vertices[(i + 1) % vertices.len()];
		area += a.x * b.y - b.x * a.y;
	}
	area *= 0.5;

	let interior_sample = cycle.first().map(|&key| {
		let edge = &shape.edges[key];
		let a = shape.position(edge.start);
		let b = shape.position(edge.end);
		(a + b) * 0.5 + crate::vector::perp(b - a).normalize_or_zero() * delta
	});

	Contour {
		subpath: reconstruct_subpath(shape, cycle, &vertices),
		vertices,
		area,
		interior_sample,
	}
}

/// Rebuilds curve geometry for one cycle. Consecutive edges on the same piece
/// with contiguous parameters collapse into a single slice of the source
/// segment; slice anchors are snapped to the arrangement vertices so the
/// contour closes exactly.
fn reconstruct_subpath(shape: &Shape, cycle: &[EdgeKey], vertices: &[Vector]) -> Subpath {
	struct Run {
		path: usize,
		piece: usize,
		t_start: f64,
		t_end: f64,
		start: Vector,
		end: Vector,
	}

	let mut runs: Vec<Run> = Vec::new();
	for (i, &key) in cycle.iter().enumerate() {
		let edge = &shape.edges[key];
		let start = vertices[i];
		let end = vertices[(i + 1) % vertices.len()];

		if let Some(run) = runs.last_mut() {
			let contiguous = run.path == edge.back.path && run.piece == edge.back.piece && (edge.back.t_start - run.t_end).abs() < 1e-9;
			let same_direction = (edge.back.t_end - edge.back.t_start).signum() == (run.t_end - run.t_start).signum();
			if contiguous && same_direction {
				run.t_end = edge.back.t_end;
				run.end = end;
				continue;
			}
		}
		runs.push(Run {
			path: edge.back.path,
			piece: edge.back.piece,
			t_start: edge.back.t_start,
			t_end: edge.back.t_end,
			start,
			end,
		});
	}

	let mut segments = Vec::with_capacity(runs.len());
	for run in &runs {
		let piece = &shape.pieces[run.path][run.piece];
		let sliced = if run.t_start <= run.t_end {
			piece.slice_between(run.t_start, run.t_end)
		} else {
			piece.slice_between(run.t_end, run.t_start).reverse()
		};
		segments.push(snap_ends(sliced, run.start, run.end));
	}

	let anchor = runs.first().map(|run| run.start).unwrap_or(Vector::ZERO);
	Subpath {
		anchor,
		segments,
		closed: true,
	}
}

/// Replaces a segment's anchors, keeping its handles. The flattened chords the
/// arrangement works on deviate from the true curve by up to the flattening
/// tolerance; welding to the shared vertices keeps contours watertight.
fn snap_ends(segment: PathSegment, start: Vector, end: Vector) -> PathSegment {
	match segment {
		PathSegment::Line(..) => PathSegment::Line(start, end),
		PathSegment::Quadratic(_, c, _) => PathSegment::Quadratic(start, c, end),
		PathSegment::Cubic(_, c1, c2, _) => PathSegment::Cubic(start, c1, c2, end),
		PathSegment::Arc(_, rx, ry, rotation, large_arc, sweep, _) => PathSegment::Arc(start, rx, ry, rotation, large_arc, sweep, end),
	}
}

fn winding_of_polyline(vertices: &[Vector], point: Vector) -> i32 {
	let mut winding = 0;
	for (i, &a) in vertices.iter().enumerate() {
		let b = vertices[(i + 1) % vertices.len()];
		if a.y <= point.y && b.y > point.y {
			if (b - a).perp_dot(point - a) > 0. {
				winding += 1;
			}
		} else if b.y <= point.y && a.y > point.y && (b - a).perp_dot(point - a) < 0. {
			winding -= 1;
		}
	}
	winding
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::boolean::{BooleanOp, boolean_shapes};
	use crate::shape::FillRule;
	use glam::DVec2;

	fn converted(path: &Path) -> Shape {
		Shape::fill(path, 0).convert_to_shape(FillRule::NonZero)
	}

	#[test]
	fn square_round_trips_through_the_arrangement() {
		let shape = converted(&Path::new_rect(DVec2::ZERO, DVec2::splat(1.)));
		let path = convert_to_forme(&shape);

		assert_eq!(path.subpaths.len(), 1);
		assert!(path.subpaths[0].closed);
		assert_eq!(path.subpaths[0].segments.len(), 4);
		assert!((path.signed_area() - 1.).abs() < 1e-9);
	}

	#[test]
	fn union_of_two_offset_unit_squares_has_area_1_75() {
		let a = converted(&Path::new_rect(DVec2::ZERO, DVec2::splat(1.)));
		let b = converted(&Path::new_rect(DVec2::splat(0.5), DVec2::splat(1.5)));
		let union = boolean_shapes(&a, &b, BooleanOp::Union);
		let path = convert_to_forme(&union);

		assert_eq!(path.subpaths.len(), 1);
		assert!(path.subpaths[0].closed);
		assert!((path.signed_area() - 1.75).abs() < 1e-9);
	}

	#[test]
	fn curves_survive_reconstruction() {
		let circle = Path::new_ellipse(DVec2::splat(-1.), DVec2::splat(1.));
		let shape = converted(&circle);
		let path = convert_to_forme(&shape);

		assert_eq!(path.subpaths.len(), 1);
		// Cubics come back as cubics, not as hundreds of chords.
		assert!(path.subpaths[0].segments.len() <= 8);
		assert!(path.subpaths[0].segments.iter().all(|s| matches!(s, PathSegment::Cubic(..))));
		assert!((path.signed_area().abs() - std::f64::consts::PI).abs() < 0.05);
	}

	#[test]
	fn nested_forme_reports_hole_parents() {
		let mut ring = Path::new_rect(DVec2::ZERO, DVec2::splat(4.));
		ring.subpaths.extend(Path::new_rect(DVec2::splat(1.), DVec2::splat(3.)).subpaths);
		let shape = Shape::fill(&ring, 0).convert_to_shape(FillRule::EvenOdd);

		let (path, nesting) = convert_to_forme_nested(&shape);
		assert_eq!(path.subpaths.len(), 2);
		let holes: Vec<_> = nesting.iter().enumerate().filter_map(|(i, parent)| parent.map(|p| (i, p))).collect();
		assert_eq!(holes.len(), 1);
		let (hole, parent) = holes[0];
		assert_ne!(hole, parent);
		assert!(nesting[parent].is_none());
	}

	#[test]
	fn cut_divides_square_into_two_faces() {
		let source = converted(&Path::new_rect(DVec2::ZERO, DVec2::splat(2.)));
		let cutter = Shape::fill_open(&Path::new_line(DVec2::new(1., -1.), DVec2::new(1., 3.)), 0).convert_to_shape(FillRule::JustDont);
		let cut = boolean_shapes(&source, &cutter, BooleanOp::Cut);

		let (path, nesting) = convert_to_forme_nested(&cut);
		let areas: Vec<f64> = path
			.subpaths
			.iter()
			.map(|subpath| {
				Path { subpaths: vec![subpath.clone()] }.signed_area()
			})
			.collect();
		let positive: Vec<f64> = areas.iter().copied().filter(|area| *area > 1e-9).collect();
		assert_eq!(positive.len(), 2, "two pieces, got areas {areas:?}");
		assert!(positive.iter().all(|area| (area - 2.).abs() < 1e-6));
		assert!(nesting.iter().all(Option::is_none));
	}

	#[test]
	fn empty_shape_gives_empty_path() {
		let path = convert_to_forme(&Shape::empty());
		assert!(path.subpaths.is_empty());
		assert!(path.is_empty());
	}
}
