//! Depth-first collection of the scene items worth considering for one snap
//! gesture. Runs once per gesture; every later query reuses the result.

use glam::DAffine2;
use path_arrange::Aabb;

use crate::consts::MAX_SNAP_CANDIDATES;
use crate::document::{ItemId, ItemKind};
use crate::snapping::{SnapCandidate, SnapData};

pub fn find_candidates(data: &SnapData, bbox_to_snap: &Aabb) -> Vec<SnapCandidate> {
	let mut candidates = Vec::new();
	let search_region = bbox_to_snap.expand(data.tolerance());
	let mut walker = Walker {
		data,
		search_region,
		candidates: &mut candidates,
		warned: false,
	};
	for &item in data.document.root_items() {
		walker.visit(item, false, DAffine2::IDENTITY);
	}
	candidates
}

struct Walker<'a, 'b> {
	data: &'a SnapData<'a>,
	search_region: Aabb,
	candidates: &'b mut Vec<SnapCandidate>,
	warned: bool,
}

impl Walker<'_, '_> {
	fn visit(&mut self, id: ItemId, is_clip_or_mask: bool, extra: DAffine2) {
		if self.candidates.len() >= MAX_SNAP_CANDIDATES {
			if !self.warned {
				log::warn!("snap candidate collection stopped at {MAX_SNAP_CANDIDATES} items");
				self.warned = true;
			}
			return;
		}
		if self.data.ignores(id) {
			return;
		}
		let item = self.data.document.item(id);
		// Clip and mask sources are deliberately visited while hidden.
		if item.hidden && !is_clip_or_mask {
			return;
		}

		if !is_clip_or_mask {
			let composite = self.data.document.transform_to_document(id);
			if let Some(clip) = item.clip {
				self.visit(clip, true, composite);
			}
			if let Some(mask) = item.mask {
				self.visit(mask, true, composite);
			}
		}

		match &item.kind {
			ItemKind::Group { children } => {
				for &child in children {
					self.visit(child, is_clip_or_mask, extra);
				}
			}
			_ => {
				let Some(bbox) = self.data.document.bounding_box(id, extra) else { return };
				if bbox.overlaps(&self.search_region) {
					self.candidates.push(SnapCandidate { item: id, is_clip_or_mask, extra });
				}
			}
		}
	}
}
