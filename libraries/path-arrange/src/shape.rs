use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::aabb::Aabb;
use crate::epsilons::EPS;
use crate::flatten::{BackData, FLATTEN_TOLERANCE, flatten_path};
use crate::grid::SegmentIndex;
use crate::line_segment::{line_segment_intersection, point_on_segment};
use crate::path::Path;
use crate::path_segment::PathSegment;
use crate::vector::{Vector, perp};

/// Winding convention deciding polygon interior. `JustDont` is used for
/// cutting paths, which have no interior of their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
	#[default]
	NonZero,
	EvenOdd,
	JustDont,
}

impl FillRule {
	pub fn is_inside(self, winding: i32) -> bool {
		match self {
			FillRule::NonZero => winding != 0,
			FillRule::EvenOdd => winding % 2 != 0,
			FillRule::JustDont => false,
		}
	}
}

new_key_type! {
	pub struct PointKey;
	pub struct EdgeKey;
}

#[derive(Clone, Debug)]
pub(crate) struct PointData {
	pub position: Vector,
	/// Incident edges, incoming and outgoing alike.
	pub edges: SmallVec<[EdgeKey; 4]>,
}

#[derive(Clone, Debug)]
pub(crate) struct EdgeData {
	pub start: PointKey,
	pub end: PointKey,
	/// Traversal-ordered parameter span; `t_start > t_end` on reversed edges.
	pub back: BackData,
	/// Interior cutting edge produced by the cut operator.
	pub cut: bool,
}

/// An edge not yet in an arrangement, as raw endpoint geometry.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RawEdge {
	pub start: Vector,
	pub end: Vector,
	pub back: BackData,
	pub cut: bool,
}

/// Planar graph of points and directed edges, each edge tagged with a
/// back-reference into `pieces`. The boolean pipeline transforms one stage
/// into the next; shapes are never persisted.
#[derive(Clone, Debug)]
pub struct Shape {
	pub(crate) points: SlotMap<PointKey, PointData>,
	pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
	/// Source curve pieces, indexed by `BackData::path` then `BackData::piece`.
	pub(crate) pieces: Vec<Vec<PathSegment>>,
}

impl Shape {
	pub fn empty() -> Self {
		Self::with_pieces(Vec::new())
	}

	pub(crate) fn with_pieces(pieces: Vec<Vec<PathSegment>>) -> Self {
		Shape {
			points: SlotMap::with_key(),
			edges: SlotMap::with_key(),
			pieces,
		}
	}

	/// Loads a filled path into a fresh graph, tagged with `path_id`. Arcs and
	/// quadratics are lowered to cubics first (the engine's outline of arcs is
	/// broken, so arcs never enter it directly), then everything is flattened
	/// to chords carrying back data. Open subpaths are closed, since a filled
	/// operand needs a well-defined interior.
	pub fn fill(path: &Path, path_id: usize) -> Shape {
		let mut lowered = path.to_linear_and_cubics();
		for subpath in &mut lowered.subpaths {
			if !subpath.closed && !subpath.is_point() {
				subpath.close();
			}
		}
		Self::fill_lowered(&lowered, path_id)
	}

	/// Like [`Shape::fill`] but keeps open subpaths open. Used for cutting
	/// paths, which are uncrossed geometry rather than areas.
	pub fn fill_open(path: &Path, path_id: usize) -> Shape {
		Self::fill_lowered(&path.to_linear_and_cubics(), path_id)
	}

	fn fill_lowered(lowered: &Path, path_id: usize) -> Shape {
		let flat = flatten_path(lowered, path_id, FLATTEN_TOLERANCE);

		let mut pieces = vec![Vec::new(); path_id + 1];
		pieces[path_id] = flat.pieces.clone();

		let mut shape = Shape::with_pieces(pieces);
		let mut merger = PointMerger::new(EPS.point);
		for edge in &flat.edges {
			let start = merger.key(&mut shape.points, edge.start);
			let end = merger.key(&mut shape.points, edge.end);
			if start == end {
				continue;
			}
			shape.push_edge(EdgeData {
				start,
				end,
				back: edge.back,
				cut: false,
			});
		}
		shape
	}

	/// Reduces the graph to a consistent arrangement under `fill_rule`:
	/// crossings are resolved, then only edges separating interior from
	/// exterior survive, reoriented with the interior on their left.
	/// `JustDont` resolves crossings but keeps every edge.
	pub fn convert_to_shape(&self, fill_rule: FillRule) -> Shape {
		let arranged = planarize(self.raw_edges(), self.pieces.clone());
		if fill_rule == FillRule::JustDont {
			return arranged;
		}
		let inside = |point: Vector| fill_rule.is_inside(arranged.winding_at(point));
		boundary_of(&arranged, inside)
	}

	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn point_count(&self) -> usize {
		self.points.len()
	}

	pub(crate) fn position(&self, point: PointKey) -> Vector {
		self.points[point].position
	}

	pub(crate) fn push_edge(&mut self, edge: EdgeData) -> EdgeKey {
		let (start, end) = (edge.start, edge.end);
		let key = self.edges.insert(edge);
		self.points[start].edges.push(key);
		self.points[end].edges.push(key);
		key
	}

	pub(crate) fn raw_edges(&self) -> Vec<RawEdge> {
		self.edges
			.values()
			.map(|edge| RawEdge {
				start: self.position(edge.start),
				end: self.position(edge.end),
				back: edge.back,
				cut: edge.cut,
			})
			.collect()
	}

	pub fn bounding_box(&self) -> Option<Aabb> {
		if self.points.is_empty() {
			return None;
		}
		let mut bbox = Aabb::default();
		for point in self.points.values() {
			bbox = bbox.extend(point.position);
		}
		Some(bbox)
	}

	/// Winding number of the directed edge set around `point`. Points lying on
	/// an edge give an arbitrary but finite answer; callers sample slightly
	/// off the boundary.
	pub(crate) fn winding_at(&self, point: Vector) -> i32 {
		let mut winding = 0;
		for edge in self.edges.values() {
			let a = self.position(edge.start);
			let b = self.position(edge.end);
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

	/// Offset used when sampling just off an edge for side classification.
	pub(crate) fn side_delta(&self) -> f64 {
		let extent = self.bounding_box().map(|bbox| bbox.max_extent()).unwrap_or(1.);
		(extent.max(1.) * 1e-7).max(1e-12)
	}
}

/// Splits every edge at crossings and at other edges' endpoints, then rebuilds
/// the graph with coincident endpoints merged. The result is a proper planar
/// subdivision of the input geometry.
pub(crate) fn planarize(raw: Vec<RawEdge>, pieces: Vec<Vec<PathSegment>>) -> Shape {
	let count = raw.len();
	if count == 0 {
		return Shape::with_pieces(pieces);
	}

	let mut bbox = Aabb::default();
	for edge in &raw {
		bbox = bbox.extend(edge.start).extend(edge.end);
	}
	let cell_size = (bbox.max_extent() / (count as f64).sqrt()).max(EPS.point * 16.);
	let index = SegmentIndex::build(raw.iter().map(edge_bbox).collect(), cell_size);

	let mut splits: Vec<Vec<f64>> = vec![Vec::new(); count];
	index.for_pairs(EPS.point, |i, j| {
		let (si, sj) = ([raw[i].start, raw[i].end], [raw[j].start, raw[j].end]);
		if let Some((s, t)) = line_segment_intersection(si, sj, EPS.param) {
			push_interior(&mut splits[i], s);
			push_interior(&mut splits[j], t);
		}
		// Parallel overlaps produce no crossing; endpoint incidence still
		// has to split the edge they rest on.
		for endpoint in si {
			if let Some(t) = point_on_segment(sj, endpoint, EPS.point) {
				push_interior(&mut splits[j], t);
			}
		}
		for endpoint in sj {
			if let Some(s) = point_on_segment(si, endpoint, EPS.point) {
				push_interior(&mut splits[i], s);
			}
		}
	});

	let mut shape = Shape::with_pieces(pieces);
	let mut merger = PointMerger::new(EPS.point);
	for (index, edge) in raw.into_iter().enumerate() {
		let ts = &mut splits[index];
		ts.push(0.);
		ts.push(1.);
		ts.sort_unstable_by(f64::total_cmp);
		ts.dedup_by(|a, b| (*a - *b).abs() < EPS.param);

		for window in ts.windows(2) {
			let (t0, t1) = (window[0], window[1]);
			let start = merger.key(&mut shape.points, edge.start.lerp(edge.end, t0));
			let end = merger.key(&mut shape.points, edge.start.lerp(edge.end, t1));
			if start == end {
				continue;
			}
			let span = edge.back.t_end - edge.back.t_start;
			shape.push_edge(EdgeData {
				start,
				end,
				back: BackData {
					path: edge.back.path,
					piece: edge.back.piece,
					t_start: edge.back.t_start + span * t0,
					t_end: edge.back.t_start + span * t1,
				},
				cut: edge.cut,
			});
		}
	}
	shape
}

/// Keeps the edges of `arranged` that separate inside from outside under the
/// given predicate, oriented with the inside on their left. Coincident
/// same-direction duplicates collapse to a single edge.
pub(crate) fn boundary_of(arranged: &Shape, inside: impl Fn(Vector) -> bool) -> Shape {
	let delta = arranged.side_delta();
	let mut result = Shape::with_pieces(arranged.pieces.clone());
	let mut merger = PointMerger::new(EPS.point);
	let mut seen = FxHashSet::default();

	for edge in arranged.edges.values() {
		let a = arranged.position(edge.start);
		let b = arranged.position(edge.end);
		let normal = perp(b - a).normalize_or_zero();
		if normal == Vector::ZERO {
			continue;
		}
		let mid = (a + b) * 0.5;
		let inside_left = inside(mid + normal * delta);
		let inside_right = inside(mid - normal * delta);
		if inside_left == inside_right {
			continue;
		}

		let (start, end, back) = if inside_left {
			(a, b, edge.back)
		} else {
			(
				b,
				a,
				BackData {
					t_start: edge.back.t_end,
					t_end: edge.back.t_start,
					..edge.back
				},
			)
		};
		let start = merger.key(&mut result.points, start);
		let end = merger.key(&mut result.points, end);
		if start == end || !seen.insert((start, end)) {
			continue;
		}
		result.push_edge(EdgeData { start, end, back, cut: edge.cut });
	}
	result
}

fn push_interior(splits: &mut Vec<f64>, t: f64) {
	if t > EPS.param && t < 1. - EPS.param {
		splits.push(t);
	}
}

fn edge_bbox(edge: &RawEdge) -> Aabb {
	Aabb::new(edge.start, edge.end)
}

/// Merges positions within `eps` into a single graph point, looked up through
/// a quantized cell map.
pub(crate) struct PointMerger {
	inv_cell: f64,
	eps_squared: f64,
	cells: FxHashMap<(i64, i64), SmallVec<[PointKey; 2]>>,
}

impl PointMerger {
	pub(crate) fn new(eps: f64) -> Self {
		PointMerger {
			inv_cell: eps.recip(),
			eps_squared: eps * eps,
			cells: FxHashMap::default(),
		}
	}

	pub(crate) fn key(&mut self, points: &mut SlotMap<PointKey, PointData>, position: Vector) -> PointKey {
		let cx = (position.x * self.inv_cell).floor() as i64;
		let cy = (position.y * self.inv_cell).floor() as i64;
		// A match within eps can land one cell over in either axis.
		for dx in -1..=1 {
			for dy in -1..=1 {
				let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) else { continue };
				for &key in bucket {
					if points[key].position.distance_squared(position) <= self.eps_squared {
						return key;
					}
				}
			}
		}
		let key = points.insert(PointData {
			position,
			edges: SmallVec::new(),
		});
		self.cells.entry((cx, cy)).or_default().push(key);
		key
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use glam::DVec2;

	fn square(min: f64, max: f64) -> Path {
		Path::new_rect(DVec2::splat(min), DVec2::splat(max))
	}

	#[test]
	fn fill_then_convert_keeps_square_boundary() {
		let shape = Shape::fill(&square(0., 1.), 0).convert_to_shape(FillRule::NonZero);
		assert_eq!(shape.edge_count(), 4);
		assert_eq!(shape.point_count(), 4);
		assert_eq!(shape.winding_at(DVec2::splat(0.5)), 1);
		assert_eq!(shape.winding_at(DVec2::splat(2.)), 0);
	}

	#[test]
	fn conversion_normalizes_orientation() {
		// Clockwise input still comes out with the interior on the left.
		let mut path = square(0., 1.);
		let segments = path.subpaths[0].segments.iter().rev().map(|s| s.reverse()).collect();
		path.subpaths[0].segments = segments;
		path.subpaths[0].anchor = path.subpaths[0].segments[0].start();

		let shape = Shape::fill(&path, 0).convert_to_shape(FillRule::NonZero);
		assert_eq!(shape.winding_at(DVec2::splat(0.5)), 1);
	}

	#[test]
	fn fill_rules_differ_on_nested_same_direction_contours() {
		let mut path = square(0., 4.);
		path.subpaths.extend(square(1., 3.).subpaths);

		// Nonzero: the inner contour separates winding 1 from 2, both inside.
		let nonzero = Shape::fill(&path, 0).convert_to_shape(FillRule::NonZero);
		assert_eq!(nonzero.edge_count(), 4);
		assert_eq!(nonzero.winding_at(DVec2::splat(2.)), 1);

		// Evenodd: winding 2 is outside, so the inner boundary survives as a hole.
		let evenodd = Shape::fill(&path, 0).convert_to_shape(FillRule::EvenOdd);
		assert_eq!(evenodd.edge_count(), 8);
		assert_eq!(evenodd.winding_at(DVec2::splat(2.)), 0);
		assert_eq!(evenodd.winding_at(DVec2::splat(0.5)), 1);
	}

	#[test]
	fn planarize_splits_at_crossings() {
		let mut path = Path::new_line(DVec2::new(-1., 0.), DVec2::new(1., 0.));
		path.subpaths.extend(Path::new_line(DVec2::new(0., -1.), DVec2::new(0., 1.)).subpaths);

		let arranged = Shape::fill_open(&path, 0).convert_to_shape(FillRule::JustDont);
		assert_eq!(arranged.edge_count(), 4);
		assert_eq!(arranged.point_count(), 5);
		let crossing = arranged.points.values().find(|p| p.position.abs_diff_eq(DVec2::ZERO, 1e-9)).unwrap();
		assert_eq!(crossing.edges.len(), 4);
	}

	#[test]
	fn degenerate_moveto_fills_to_empty() {
		let path = crate::path_data::path_from_path_data("M 5 5").unwrap();
		let shape = Shape::fill(&path, 0);
		assert!(shape.is_empty());
		assert!(shape.convert_to_shape(FillRule::NonZero).is_empty());
	}

	#[test]
	fn self_intersecting_contour_resolves_to_simple_boundary() {
		// Figure eight drawn as one contour: each lobe is filled under nonzero.
		let path = crate::path_data::path_from_path_data("M 0 0 L 2 0 L 0 2 L 2 2 Z").unwrap();
		let shape = Shape::fill(&path, 0).convert_to_shape(FillRule::NonZero);
		assert!(!shape.is_empty());
		assert_ne!(shape.winding_at(DVec2::new(0.5, 0.25)), 0);
		assert_ne!(shape.winding_at(DVec2::new(0.5, 1.75)), 0);
		assert_eq!(shape.winding_at(DVec2::new(1.5, 1.0)), 0);
	}
}
