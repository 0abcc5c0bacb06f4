//! Turns cached candidate items into concrete snap points and paths, and runs
//! the nearest-match searches against them.

use glam::DVec2;
use path_arrange::{Aabb, EPS, Path, PathSegment, Subpath};

use crate::consts::{MAX_SNAP_PATH_NODES, MAX_SNAP_TEXT_LENGTH, RETRACTED_HANDLE_EPSILON, UNSELECTED_NODE_EPSILON};
use crate::snapping::{SnapCandidate, SnapCandidatePath, SnapCandidatePoint, SnapConstraint, SnapData, SnapSource, SnapTarget};
use crate::snapping::snap_results::{SnapResults, SnappedCurve, SnappedPoint};

/// Builds the flat target-point list from the cached candidates. Insertion
/// order is kept; duplicates are fine because the search keeps the minimum.
pub fn collect_nodes(data: &SnapData, candidates: &[SnapCandidate], source: SnapSource) -> Vec<SnapCandidatePoint> {
	let mut points = Vec::new();
	let wants = |target: SnapTarget| data.preferences.target_enabled(target) && data.preferences.source_may_snap_to(source, target);

	for candidate in candidates {
		if wants(SnapTarget::ItemNode) || wants(SnapTarget::SmoothNode) || wants(SnapTarget::LineMidpoint) {
			if let Some(outline) = data.document.outline_in_document(candidate.item, candidate.extra) {
				for subpath in &outline.subpaths {
					collect_subpath_nodes(subpath, &wants, &mut points);
				}
			}
		}
		if wants(SnapTarget::ObjectMidpoint) {
			if let Some(bbox) = data.document.bounding_box(candidate.item, candidate.extra) {
				points.push(SnapCandidatePoint {
					position: bbox.center(),
					target: SnapTarget::ObjectMidpoint,
				});
			}
		}
		if wants(SnapTarget::ItemCenter) {
			let transform = candidate.extra * data.document.transform_to_document(candidate.item);
			points.push(SnapCandidatePoint {
				position: transform.translation,
				target: SnapTarget::ItemCenter,
			});
		}
		// An item serving as its own clip or mask source must not offer bbox
		// points, or a drag could snap to both the item and its clip at once.
		if !candidate.is_clip_or_mask {
			if let Some(bbox) = data.document.bounding_box(candidate.item, candidate.extra) {
				collect_bbox_points(&bbox, &wants, &mut points);
			}
		}
	}

	if wants(SnapTarget::PageCorner) {
		for corner in data.document.page_corners() {
			points.push(SnapCandidatePoint {
				position: corner,
				target: SnapTarget::PageCorner,
			});
		}
	}
	points
}

fn collect_subpath_nodes(subpath: &Subpath, wants: &impl Fn(SnapTarget) -> bool, points: &mut Vec<SnapCandidatePoint>) {
	let nodes = subpath.nodes();
	let count = nodes.len();
	for (index, &node) in nodes.iter().enumerate() {
		let incoming = incoming_segment(subpath, index, count);
		let outgoing = outgoing_segment(subpath, index, count);
		let target = if is_smooth(incoming, outgoing) { SnapTarget::SmoothNode } else { SnapTarget::ItemNode };
		if wants(target) {
			points.push(SnapCandidatePoint { position: node, target });
		}
	}
	if wants(SnapTarget::LineMidpoint) {
		for segment in &subpath.segments {
			if let PathSegment::Line(start, end) = segment {
				points.push(SnapCandidatePoint {
					position: start.midpoint(*end),
					target: SnapTarget::LineMidpoint,
				});
			}
		}
	}
}

fn incoming_segment(subpath: &Subpath, node_index: usize, node_count: usize) -> Option<&PathSegment> {
	if node_index > 0 {
		subpath.segments.get(node_index - 1)
	} else if subpath.closed && node_count > 1 {
		subpath.segments.last()
	} else {
		None
	}
}

fn outgoing_segment(subpath: &Subpath, node_index: usize, node_count: usize) -> Option<&PathSegment> {
	if node_index < subpath.segments.len() {
		subpath.segments.get(node_index)
	} else if subpath.closed && node_count > 1 {
		subpath.segments.first()
	} else {
		None
	}
}

/// A node is smooth when the incoming and outgoing tangents are parallel and
/// point the same way.
fn is_smooth(incoming: Option<&PathSegment>, outgoing: Option<&PathSegment>) -> bool {
	let (Some(incoming), Some(outgoing)) = (incoming, outgoing) else { return false };
	let arrive = direction_at_end(incoming);
	let leave = direction_at_start(outgoing);
	let (Some(arrive), Some(leave)) = (arrive, leave) else { return false };
	arrive.perp_dot(leave).abs() < 1e-6 && arrive.dot(leave) > 0.
}

fn direction_at_start(segment: &PathSegment) -> Option<DVec2> {
	let start = segment.start();
	let handle = match *segment {
		PathSegment::Line(_, end) => end,
		PathSegment::Quadratic(_, control, end) => first_past(start, &[control, end])?,
		PathSegment::Cubic(_, control1, control2, end) => first_past(start, &[control1, control2, end])?,
		PathSegment::Arc(..) => segment.sample_at(1e-3),
	};
	(handle - start).try_normalize()
}

fn direction_at_end(segment: &PathSegment) -> Option<DVec2> {
	direction_at_start(&segment.reverse()).map(|direction| -direction)
}

// Retracted handles fall through to the next control point.
fn first_past(anchor: DVec2, controls: &[DVec2]) -> Option<DVec2> {
	controls.iter().copied().find(|control| control.distance(anchor) > RETRACTED_HANDLE_EPSILON)
}

fn collect_bbox_points(bbox: &Aabb, wants: &impl Fn(SnapTarget) -> bool, points: &mut Vec<SnapCandidatePoint>) {
	let corners = [bbox.min(), DVec2::new(bbox.max().x, bbox.min().y), bbox.max(), DVec2::new(bbox.min().x, bbox.max().y)];
	if wants(SnapTarget::BboxCorner) {
		for corner in corners {
			points.push(SnapCandidatePoint {
				position: corner,
				target: SnapTarget::BboxCorner,
			});
		}
	}
	if wants(SnapTarget::BboxEdgeMidpoint) {
		for index in 0..4 {
			points.push(SnapCandidatePoint {
				position: corners[index].midpoint(corners[(index + 1) % 4]),
				target: SnapTarget::BboxEdgeMidpoint,
			});
		}
	}
	if wants(SnapTarget::BboxCenter) {
		points.push(SnapCandidatePoint {
			position: bbox.center(),
			target: SnapTarget::BboxCenter,
		});
	}
}

/// Linear nearest scan over the collected points plus any caller-supplied
/// unselected-node override. The single best match is recorded; out-of-range
/// filtering happens in the result selection so always-snap stays possible.
pub fn snap_nodes(data: &SnapData, source: SnapSource, points: &[SnapCandidatePoint], query: DVec2, unselected_nodes: &[DVec2], results: &mut SnapResults) {
	let mut best: Option<SnappedPoint> = None;
	let overrides = unselected_nodes.iter().map(|&position| SnapCandidatePoint {
		position,
		target: SnapTarget::ItemNode,
	});
	for candidate in points.iter().copied().chain(overrides) {
		let distance = candidate.position.distance(query);
		if best.as_ref().is_none_or(|current| distance < current.distance) {
			best = Some(SnappedPoint::new(candidate.position, source, candidate.target, distance));
		}
	}
	if let Some(best) = best {
		results.add_point(best);
	}
}

/// Gathers the candidate paths once per gesture: item outlines under
/// complexity guards, the page border, and bbox rectangles.
pub fn collect_paths(data: &SnapData, candidates: &[SnapCandidate], source: SnapSource) -> Vec<SnapCandidatePath> {
	let mut paths = Vec::new();
	let wants = |target: SnapTarget| data.preferences.target_enabled(target) && data.preferences.source_may_snap_to(source, target);

	if wants(SnapTarget::ItemPath) {
		for candidate in candidates {
			let Some(outline) = data.document.outline_in_document(candidate.item, candidate.extra) else { continue };
			// Very complex items keep node and bbox snapping but skip the
			// per-segment nearest search.
			if outline.node_count() > MAX_SNAP_PATH_NODES || data.document.text_length(candidate.item) > MAX_SNAP_TEXT_LENGTH {
				continue;
			}
			let bounding_box = outline.bounding_box();
			paths.push(SnapCandidatePath {
				path: outline,
				target: SnapTarget::ItemPath,
				bounding_box,
				is_edited_path: data.edited_item == Some(candidate.item),
			});
		}
	}
	if wants(SnapTarget::BboxEdge) {
		for candidate in candidates {
			if candidate.is_clip_or_mask {
				continue;
			}
			let Some(bbox) = data.document.bounding_box(candidate.item, candidate.extra) else { continue };
			paths.push(SnapCandidatePath {
				path: Path::new_rect(bbox.min(), bbox.max()),
				target: SnapTarget::BboxEdge,
				bounding_box: Some(bbox),
				is_edited_path: false,
			});
		}
	}
	if wants(SnapTarget::PageBorder) {
		let border = data.document.page_border();
		let bounding_box = border.bounding_box();
		paths.push(SnapCandidatePath {
			path: border,
			target: SnapTarget::PageBorder,
			bounding_box,
			is_edited_path: false,
		});
	}
	paths
}

fn segment_is_unselected(segment: &PathSegment, unselected_nodes: &[DVec2]) -> bool {
	let matches = |point: DVec2| unselected_nodes.iter().any(|&node| node.distance(point) < UNSELECTED_NODE_EPSILON);
	matches(segment.start()) && matches(segment.end())
}

/// Per-segment nearest-point search over the collected paths. The best match
/// of each path is recorded as a snapped curve. Crossings between candidate
/// paths are additionally offered when intersection snapping is enabled.
pub fn snap_paths(data: &SnapData, source: SnapSource, paths: &[SnapCandidatePath], query: DVec2, unselected_nodes: &[DVec2], results: &mut SnapResults) {
	let tolerance = data.tolerance();
	let query_region = Aabb::around_point(query, tolerance);

	for candidate in paths {
		if candidate.bounding_box.as_ref().is_some_and(|bbox| !bbox.expand(tolerance).overlaps(&query_region)) {
			continue;
		}
		let mut best: Option<SnappedCurve> = None;
		for subpath in &candidate.path.subpaths {
			for segment in &subpath.segments {
				// While node-editing, a segment of the edited path is only a
				// valid target if both its endpoints are confirmed stationary.
				// Coincident-but-distinct nodes can false-positive here; that
				// ambiguity is long-standing and kept as is.
				if candidate.is_edited_path && !segment_is_unselected(segment, unselected_nodes) {
					continue;
				}
				let t = segment.project(query);
				let position = segment.sample_at(t);
				let distance = position.distance(query);
				if best.as_ref().is_none_or(|current| distance < current.point.distance) {
					best = Some(SnappedCurve {
						point: SnappedPoint::new(position, source, candidate.target, distance),
						segment: *segment,
						t,
					});
				}
			}
		}
		if let Some(best) = best {
			results.add_curve(best);
		}
	}

	if data.preferences.target_enabled(SnapTarget::PathIntersection) && data.preferences.source_may_snap_to(source, SnapTarget::PathIntersection) {
		snap_path_intersections(paths, query, tolerance, source, results);
	}
}

/// Crossings of candidate paths with each other, restricted to segments near
/// the query point.
fn snap_path_intersections(paths: &[SnapCandidatePath], query: DVec2, tolerance: f64, source: SnapSource, results: &mut SnapResults) {
	let query_region = Aabb::around_point(query, tolerance);
	let near_segments: Vec<&PathSegment> = paths
		.iter()
		.filter(|candidate| candidate.target == SnapTarget::ItemPath)
		.flat_map(|candidate| candidate.path.subpaths.iter())
		.flat_map(|subpath| subpath.segments.iter())
		.filter(|segment| segment.bounding_box().expand(EPS.point).overlaps(&query_region))
		.collect();

	let shares_endpoint = |first: &PathSegment, second: &PathSegment| {
		[first.start(), first.end()]
			.iter()
			.any(|&point| point.distance(second.start()) < EPS.point || point.distance(second.end()) < EPS.point)
	};
	for (index, first) in near_segments.iter().enumerate() {
		for second in &near_segments[index + 1..] {
			// Consecutive segments of one subpath meet at a node, not a crossing.
			if shares_endpoint(first, second) {
				continue;
			}
			for [t, _] in first.intersections(second, &EPS) {
				let position = first.sample_at(t);
				let distance = position.distance(query);
				let mut point = SnappedPoint::new(position, source, SnapTarget::PathIntersection, distance);
				point.at_intersection = true;
				results.add_point(point);
			}
		}
	}
}

/// Constrained search: crossings of a finite constraint path against every
/// candidate path. Distance is measured from the query's projection onto the
/// constraint, not from the raw query point.
pub fn snap_paths_constrained(data: &SnapData, source: SnapSource, paths: &[SnapCandidatePath], query: DVec2, constraint: SnapConstraint, results: &mut SnapResults) {
	let tolerance = data.tolerance();
	let projected = constraint.projection(query);
	let constraint_segments = constraint_path(constraint, projected, tolerance);

	for candidate in paths {
		for subpath in &candidate.path.subpaths {
			for segment in &subpath.segments {
				for constraint_segment in &constraint_segments {
					for [t, _] in constraint_segment.intersections(segment, &EPS) {
						let position = constraint_segment.sample_at(t);
						let distance = position.distance(projected);
						let mut point = SnappedPoint::new(position, source, candidate.target, distance);
						point.at_intersection = true;
						point.constrained = true;
						results.add_point(point);
					}
				}
			}
		}
	}
}

/// A finite stand-in for the constraint: a segment spanning the tolerance both
/// ways along a line, or the full circle as two arc halves.
fn constraint_path(constraint: SnapConstraint, projected: DVec2, tolerance: f64) -> Vec<PathSegment> {
	match constraint {
		SnapConstraint::Line { direction, .. } => {
			let direction = direction.normalize_or_zero() * tolerance;
			vec![PathSegment::Line(projected - direction, projected + direction)]
		}
		SnapConstraint::Circle { center, radius } => {
			let east = center + DVec2::new(radius, 0.);
			let west = center - DVec2::new(radius, 0.);
			vec![
				PathSegment::Arc(east, radius, radius, 0., false, true, west),
				PathSegment::Arc(west, radius, radius, 0., false, true, east),
			]
		}
	}
}
