//! Snapping for dragged guide lines: reuses the collected node points,
//! requiring both the node-to-guide and the along-guide distances to be
//! within tolerance.

use glam::DVec2;

use crate::snapping::snap_results::{SnapResults, SnappedPoint};
use crate::snapping::{SnapCandidatePoint, SnapData, SnapSource};

pub fn snap_guide(data: &SnapData, points: &[SnapCandidatePoint], query: DVec2, guide_direction: DVec2, results: &mut SnapResults) {
	let Some(direction) = guide_direction.try_normalize() else { return };
	let tolerance = data.tolerance();

	let mut best: Option<SnappedPoint> = None;
	for candidate in points {
		let offset = candidate.position - query;
		let along = offset.dot(direction);
		let perpendicular = offset.perp_dot(direction).abs();
		// Nodes far away along the guide should not drag it sideways.
		if along.abs() > tolerance {
			continue;
		}
		if best.as_ref().is_none_or(|current| perpendicular < current.distance) {
			let mut point = SnappedPoint::new(candidate.position, SnapSource::GuideOrigin, candidate.target, perpendicular);
			point.constrained = true;
			best = Some(point);
		}
	}
	if let Some(best) = best {
		results.add_point(best);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use glam::DAffine2;
	use path_arrange::Path;

	use crate::document::Document;
	use crate::preferences::{SnapPreferences, SnapTargets};
	use crate::snapping::SnapManager;
	use crate::style::Style;

	#[test]
	fn guide_snaps_to_a_nearby_node() {
		let mut document = Document::default();
		document.add_path(None, Path::new_line(DVec2::new(3., 2.), DVec2::new(3., 50.)), Style::default(), DAffine2::IDENTITY);
		// The page corner at the origin lies exactly on the guide; keep page
		// snapping out so the item node is the intended match.
		let preferences = SnapPreferences {
			tolerance: 5.,
			targets: SnapTargets::all().difference(SnapTargets::PAGE_BORDER),
			..Default::default()
		};
		let data = SnapData::new(&document, &preferences);
		let mut manager = SnapManager::new();

		// Horizontal guide dragged to y=0: the node at (3, 2) is 2 away
		// perpendicular and 3 away along, both within tolerance.
		let snapped = manager.snap_guide(&data, DVec2::ZERO, DVec2::X, true).unwrap();
		assert!(snapped.position.abs_diff_eq(DVec2::new(3., 2.), 1e-9));
		assert!((snapped.distance - 2.).abs() < 1e-9);

		// The node at (3, 50) fails the perpendicular test; with the guide far
		// from both nodes nothing snaps.
		let far = manager.snap_guide(&data, DVec2::new(0., 20.), DVec2::X, true);
		assert!(far.is_none());
	}
}
