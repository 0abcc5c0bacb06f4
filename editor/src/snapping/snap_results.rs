use glam::DVec2;
use path_arrange::PathSegment;

use crate::snapping::{SnapSource, SnapTarget};

/// One accepted snap match.
#[derive(Clone, Copy, Debug)]
pub struct SnappedPoint {
	pub position: DVec2,
	pub source: SnapSource,
	pub target: SnapTarget,
	pub distance: f64,
	pub tolerance: f64,
	/// The match is a crossing of two paths or of a constraint with a path.
	pub at_intersection: bool,
	/// The match came from a constrained search.
	pub constrained: bool,
	/// The match was forced by the always-snap sentinel tolerance.
	pub always: bool,
}

impl SnappedPoint {
	pub fn new(position: DVec2, source: SnapSource, target: SnapTarget, distance: f64) -> Self {
		SnappedPoint {
			position,
			source,
			target,
			distance,
			tolerance: 0.,
			at_intersection: false,
			constrained: false,
			always: false,
		}
	}

	pub fn is_within(&self, tolerance: f64) -> bool {
		self.distance < tolerance
	}
}

/// A nearest-point match on a specific curve, kept with its parametrization so
/// callers can refine or visualize it.
#[derive(Clone, Copy, Debug)]
pub struct SnappedCurve {
	pub point: SnappedPoint,
	pub segment: PathSegment,
	pub t: f64,
}

/// Accumulates matches from the individual snappers; `best` applies the
/// selection policy shared by every search.
#[derive(Clone, Debug, Default)]
pub struct SnapResults {
	pub points: Vec<SnappedPoint>,
	pub curves: Vec<SnappedCurve>,
}

impl SnapResults {
	pub fn new() -> Self {
		SnapResults::default()
	}

	pub fn add_point(&mut self, point: SnappedPoint) {
		self.points.push(point);
	}

	pub fn add_curve(&mut self, curve: SnappedCurve) {
		self.curves.push(curve);
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty() && self.curves.is_empty()
	}

	/// The single closest match strictly within tolerance, first found winning
	/// ties. With `always` set the nearest match is returned regardless of
	/// distance.
	pub fn best(&self, tolerance: f64, always: bool) -> Option<SnappedPoint> {
		let mut best: Option<SnappedPoint> = None;
		let candidates = self.points.iter().copied().chain(self.curves.iter().map(|curve| curve.point));
		for mut candidate in candidates {
			if !always && !candidate.is_within(tolerance) {
				continue;
			}
			if best.is_none_or(|current| candidate.distance < current.distance) {
				candidate.tolerance = tolerance;
				candidate.always = always;
				best = Some(candidate);
			}
		}
		best
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn best_keeps_the_first_of_equal_distances() {
		let mut results = SnapResults::new();
		results.add_point(SnappedPoint::new(DVec2::new(1., 0.), SnapSource::Node, SnapTarget::ItemNode, 2.));
		results.add_point(SnappedPoint::new(DVec2::new(0., 1.), SnapSource::Node, SnapTarget::BboxCorner, 2.));

		let best = results.best(5., false).unwrap();
		assert_eq!(best.target, SnapTarget::ItemNode);
	}

	#[test]
	fn best_rejects_out_of_tolerance_unless_always() {
		let mut results = SnapResults::new();
		results.add_point(SnappedPoint::new(DVec2::ZERO, SnapSource::Node, SnapTarget::ItemNode, 7.));

		assert!(results.best(5., false).is_none());
		let forced = results.best(5., true).unwrap();
		assert!(forced.always);
		assert_eq!(forced.distance, 7.);
	}
}
