use bitflags::bitflags;
use path_arrange::FillRule;

use crate::consts::{SNAP_ALWAYS_TOLERANCE, SNAP_DEFAULT_TOLERANCE};
use crate::snapping::{SnapSource, SnapTarget};

bitflags! {
	/// Per-target-type enable flags.
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub struct SnapTargets: u32 {
		const ITEM_NODE = 1 << 0;
		const SMOOTH_NODE = 1 << 1;
		const LINE_MIDPOINT = 1 << 2;
		const OBJECT_MIDPOINT = 1 << 3;
		const ITEM_CENTER = 1 << 4;
		const ITEM_PATH = 1 << 5;
		const PATH_INTERSECTION = 1 << 6;
		const BBOX_CORNER = 1 << 7;
		const BBOX_EDGE = 1 << 8;
		const BBOX_EDGE_MIDPOINT = 1 << 9;
		const BBOX_CENTER = 1 << 10;
		const PAGE_BORDER = 1 << 11;
	}
}

bitflags! {
	/// Per-source-type enable flags.
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub struct SnapSources: u32 {
		const NODES = 1 << 0;
		const BBOX = 1 << 1;
		const OTHERS = 1 << 2;
	}
}

#[derive(Clone, Debug)]
pub struct SnapPreferences {
	pub sources: SnapSources,
	pub targets: SnapTargets,
	/// Screen pixels; divided by the zoom factor at query time.
	pub tolerance: f64,
	/// When set, node sources only snap to node targets and bbox sources only
	/// to bbox targets.
	pub strict_snapping: bool,
	/// Fill rule applied to boolean operands when an item's style does not
	/// dictate one.
	pub boolean_fill_rule: FillRule,
}

impl Default for SnapPreferences {
	fn default() -> Self {
		SnapPreferences {
			sources: SnapSources::all(),
			targets: SnapTargets::all(),
			tolerance: SNAP_DEFAULT_TOLERANCE,
			strict_snapping: false,
			boolean_fill_rule: FillRule::NonZero,
		}
	}
}

impl SnapPreferences {
	pub fn always_snap(&self) -> bool {
		self.tolerance >= SNAP_ALWAYS_TOLERANCE
	}

	pub fn target_enabled(&self, target: SnapTarget) -> bool {
		let flag = match target {
			SnapTarget::ItemNode => SnapTargets::ITEM_NODE,
			SnapTarget::SmoothNode => SnapTargets::SMOOTH_NODE,
			SnapTarget::LineMidpoint => SnapTargets::LINE_MIDPOINT,
			SnapTarget::ObjectMidpoint => SnapTargets::OBJECT_MIDPOINT,
			SnapTarget::ItemCenter => SnapTargets::ITEM_CENTER,
			SnapTarget::ItemPath => SnapTargets::ITEM_PATH,
			SnapTarget::PathIntersection => SnapTargets::PATH_INTERSECTION,
			SnapTarget::BboxCorner => SnapTargets::BBOX_CORNER,
			SnapTarget::BboxEdge => SnapTargets::BBOX_EDGE,
			SnapTarget::BboxEdgeMidpoint => SnapTargets::BBOX_EDGE_MIDPOINT,
			SnapTarget::BboxCenter => SnapTargets::BBOX_CENTER,
			SnapTarget::PageBorder | SnapTarget::PageCorner => SnapTargets::PAGE_BORDER,
		};
		self.targets.contains(flag)
	}

	pub fn source_enabled(&self, source: SnapSource) -> bool {
		let flag = match source {
			SnapSource::Node | SnapSource::LineMidpoint => SnapSources::NODES,
			SnapSource::BboxCorner | SnapSource::BboxEdgeMidpoint | SnapSource::BboxCenter => SnapSources::BBOX,
			SnapSource::Other | SnapSource::GuideOrigin => SnapSources::OTHERS,
		};
		self.sources.contains(flag)
	}

	/// Strict snapping keeps node sources with node-ish targets and bbox
	/// sources with bbox-ish targets; "other" sources may snap to anything.
	pub fn source_may_snap_to(&self, source: SnapSource, target: SnapTarget) -> bool {
		if !self.strict_snapping {
			return true;
		}
		match source {
			SnapSource::Node | SnapSource::LineMidpoint => !target.is_bbox(),
			SnapSource::BboxCorner | SnapSource::BboxEdgeMidpoint | SnapSource::BboxCenter => !target.is_node(),
			SnapSource::Other | SnapSource::GuideOrigin => true,
		}
	}
}
