//! Geometric snapping: gathers candidate points and paths from the document
//! and finds the best match for a query point, free or constrained.

pub mod candidates;
pub mod guide_snapper;
pub mod object_snapper;
pub mod snap_results;

use glam::{DAffine2, DVec2};
use path_arrange::{Aabb, Path};

use crate::document::{Document, ItemId};
use crate::preferences::SnapPreferences;

pub use snap_results::{SnapResults, SnappedCurve, SnappedPoint};

/// What kind of point is being dragged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapSource {
	Node,
	LineMidpoint,
	BboxCorner,
	BboxEdgeMidpoint,
	BboxCenter,
	GuideOrigin,
	Other,
}

/// What kind of geometry a candidate represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapTarget {
	ItemNode,
	SmoothNode,
	LineMidpoint,
	ObjectMidpoint,
	ItemCenter,
	ItemPath,
	PathIntersection,
	BboxCorner,
	BboxEdge,
	BboxEdgeMidpoint,
	BboxCenter,
	PageBorder,
	PageCorner,
}

impl SnapTarget {
	pub fn is_node(self) -> bool {
		matches!(
			self,
			SnapTarget::ItemNode | SnapTarget::SmoothNode | SnapTarget::LineMidpoint | SnapTarget::ObjectMidpoint | SnapTarget::ItemCenter | SnapTarget::PathIntersection
		)
	}

	pub fn is_bbox(self) -> bool {
		matches!(
			self,
			SnapTarget::BboxCorner | SnapTarget::BboxEdge | SnapTarget::BboxEdgeMidpoint | SnapTarget::BboxCenter
		)
	}

	pub fn is_path(self) -> bool {
		matches!(self, SnapTarget::ItemPath | SnapTarget::BboxEdge | SnapTarget::PageBorder)
	}
}

/// One scene item kept for snapping, gathered once per gesture.
#[derive(Clone, Debug)]
pub struct SnapCandidate {
	pub item: ItemId,
	pub is_clip_or_mask: bool,
	/// Composite transform prefix applied when the item is visited as a clip
	/// or mask source; identity otherwise.
	pub extra: DAffine2,
}

/// A concrete point eligible as a snap target.
#[derive(Clone, Copy, Debug)]
pub struct SnapCandidatePoint {
	pub position: DVec2,
	pub target: SnapTarget,
}

/// A path eligible for nearest-point or crossing snapping, in document space.
#[derive(Clone, Debug)]
pub struct SnapCandidatePath {
	pub path: Path,
	pub target: SnapTarget,
	pub bounding_box: Option<Aabb>,
	pub is_edited_path: bool,
}

/// Restricts a snap search to one degree of freedom.
#[derive(Clone, Copy, Debug)]
pub enum SnapConstraint {
	Line { origin: DVec2, direction: DVec2 },
	Circle { center: DVec2, radius: f64 },
}

impl SnapConstraint {
	/// Projects a point onto the constraint.
	pub fn projection(&self, point: DVec2) -> DVec2 {
		match *self {
			SnapConstraint::Line { origin, direction } => {
				let direction = direction.normalize_or_zero();
				origin + direction * (point - origin).dot(direction)
			}
			SnapConstraint::Circle { center, radius } => {
				let offset = point - center;
				if offset.length_squared() > f64::EPSILON {
					center + offset.normalize() * radius
				} else {
					// Any point on the circle is equally close to the center.
					center + DVec2::new(radius, 0.)
				}
			}
		}
	}
}

/// Read-only inputs of one snap query.
#[derive(Clone, Copy)]
pub struct SnapData<'a> {
	pub document: &'a Document,
	pub preferences: &'a SnapPreferences,
	/// Document-to-screen scale factor; tolerances are given in screen pixels.
	pub zoom: f64,
	/// Items excluded from snapping (typically the dragged selection).
	pub ignore: &'a [ItemId],
	/// The item currently being node-edited, if any.
	pub edited_item: Option<ItemId>,
}

impl<'a> SnapData<'a> {
	pub fn new(document: &'a Document, preferences: &'a SnapPreferences) -> Self {
		SnapData {
			document,
			preferences,
			zoom: 1.,
			ignore: &[],
			edited_item: None,
		}
	}

	/// Snap tolerance in document units, zoom-invariant in screen space.
	pub fn tolerance(&self) -> f64 {
		self.preferences.tolerance / self.zoom.max(f64::EPSILON)
	}

	pub fn ignores(&self, item: ItemId) -> bool {
		self.ignore.contains(&item)
	}
}

/// Owns the per-gesture caches and runs the snap searches. The candidate,
/// point, and path lists are built once on the first point of a gesture and
/// reused for every subsequent query until the next first point clears them.
#[derive(Debug, Default)]
pub struct SnapManager {
	candidates: Vec<SnapCandidate>,
	points: Vec<SnapCandidatePoint>,
	paths: Vec<SnapCandidatePath>,
	candidates_valid: bool,
	points_valid: bool,
	paths_valid: bool,
}

impl SnapManager {
	pub fn new() -> Self {
		SnapManager::default()
	}

	/// Drops all cached candidate state. Called at the start of a gesture.
	pub fn invalidate(&mut self) {
		self.candidates.clear();
		self.points.clear();
		self.paths.clear();
		self.candidates_valid = false;
		self.points_valid = false;
		self.paths_valid = false;
	}

	fn ensure_candidates(&mut self, data: &SnapData, bbox_to_snap: &Aabb, first_point: bool) {
		if first_point {
			self.invalidate();
		}
		if !self.candidates_valid {
			self.candidates = candidates::find_candidates(data, bbox_to_snap);
			self.candidates_valid = true;
		}
	}

	fn ensure_points(&mut self, data: &SnapData, source: SnapSource) {
		if !self.points_valid {
			self.points = object_snapper::collect_nodes(data, &self.candidates, source);
			self.points_valid = true;
		}
	}

	fn ensure_paths(&mut self, data: &SnapData, source: SnapSource) {
		if !self.paths_valid {
			self.paths = object_snapper::collect_paths(data, &self.candidates, source);
			self.paths_valid = true;
		}
	}

	/// Unconstrained snap of a single dragged point.
	pub fn free_snap(&mut self, data: &SnapData, source: SnapSource, point: DVec2, first_point: bool, unselected_nodes: &[DVec2]) -> Option<SnappedPoint> {
		if !data.preferences.source_enabled(source) {
			return None;
		}
		let tolerance = data.tolerance();
		let bbox = Aabb::around_point(point, tolerance);
		self.ensure_candidates(data, &bbox, first_point);
		self.ensure_points(data, source);
		self.ensure_paths(data, source);

		let mut results = SnapResults::new();
		object_snapper::snap_nodes(data, source, &self.points, point, unselected_nodes, &mut results);
		object_snapper::snap_paths(data, source, &self.paths, point, unselected_nodes, &mut results);
		results.best(tolerance, data.preferences.always_snap())
	}

	/// Snap of a point restricted to a line or circle.
	pub fn constrained_snap(&mut self, data: &SnapData, source: SnapSource, point: DVec2, constraint: SnapConstraint, first_point: bool) -> Option<SnappedPoint> {
		if !data.preferences.source_enabled(source) {
			return None;
		}
		let tolerance = data.tolerance();
		let projected = constraint.projection(point);
		let bbox = Aabb::around_point(projected, tolerance);
		self.ensure_candidates(data, &bbox, first_point);
		self.ensure_paths(data, source);

		let mut results = SnapResults::new();
		object_snapper::snap_paths_constrained(data, source, &self.paths, point, constraint, &mut results);
		results.best(tolerance, data.preferences.always_snap())
	}

	/// Snap of a dragged guide line against the collected node points.
	pub fn snap_guide(&mut self, data: &SnapData, point: DVec2, guide_direction: DVec2, first_point: bool) -> Option<SnappedPoint> {
		let tolerance = data.tolerance();
		let bbox = Aabb::around_point(point, tolerance);
		self.ensure_candidates(data, &bbox, first_point);
		self.ensure_points(data, SnapSource::GuideOrigin);

		let mut results = SnapResults::new();
		guide_snapper::snap_guide(data, &self.points, point, guide_direction, &mut results);
		results.best(tolerance, data.preferences.always_snap())
	}

	#[cfg(test)]
	pub(crate) fn cached_candidates(&self) -> &[SnapCandidate] {
		&self.candidates
	}
}
