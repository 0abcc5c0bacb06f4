use glam::IVec2;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::aabb::Aabb;

/// Uniform spatial hash over segment bounding boxes, used to prune the
/// pairwise crossing search during planarization. Built once from the segment
/// bounds, then drained through [`for_pairs`](Self::for_pairs).
pub(crate) struct SegmentIndex {
	inv_cell: f64,
	buckets: FxHashMap<IVec2, SmallVec<[u32; 6]>>,
	bounds: Vec<Aabb>,
}

impl SegmentIndex {
	pub(crate) fn build(bounds: Vec<Aabb>, cell_size: f64) -> Self {
		let mut index = SegmentIndex {
			inv_cell: cell_size.recip(),
			buckets: FxHashMap::with_capacity_and_hasher(bounds.len(), Default::default()),
			bounds,
		};
		for entry in 0..index.bounds.len() {
			let (lo, hi) = index.cell_range(index.bounds[entry]);
			for x in lo.x..=hi.x {
				for y in lo.y..=hi.y {
					index.buckets.entry(IVec2::new(x, y)).or_default().push(entry as u32);
				}
			}
		}
		index
	}

	/// Calls `visit` once per unordered pair of segments whose cells overlap
	/// after padding each query box by `slack`, smaller index first. Pairs
	/// sharing several cells are still reported once.
	pub(crate) fn for_pairs(&self, slack: f64, mut visit: impl FnMut(usize, usize)) {
		let mut candidates: Vec<u32> = Vec::new();
		for i in 0..self.bounds.len() {
			candidates.clear();
			let (lo, hi) = self.cell_range(self.bounds[i].expand(slack));
			for x in lo.x..=hi.x {
				for y in lo.y..=hi.y {
					if let Some(bucket) = self.buckets.get(&IVec2::new(x, y)) {
						candidates.extend(bucket.iter().copied().filter(|&j| j as usize > i));
					}
				}
			}
			candidates.sort_unstable();
			candidates.dedup();
			for &j in &candidates {
				visit(i, j as usize);
			}
		}
	}

	fn cell_range(&self, bbox: Aabb) -> (IVec2, IVec2) {
		let lo = (bbox.min() * self.inv_cell).floor().as_ivec2();
		let hi = (bbox.max() * self.inv_cell).ceil().as_ivec2();
		(lo, hi)
	}
}

#[cfg(test)]
mod tests {
	use glam::DVec2;

	use super::*;

	#[test]
	fn pairs_are_reported_once_with_smaller_index_first() {
		// The first two boxes share four cells; the third is far away.
		let bounds = vec![
			Aabb::new(DVec2::ZERO, DVec2::splat(1.)),
			Aabb::new(DVec2::splat(0.5), DVec2::splat(1.5)),
			Aabb::new(DVec2::splat(10.), DVec2::splat(11.)),
		];
		let index = SegmentIndex::build(bounds, 1.);

		let mut pairs = Vec::new();
		index.for_pairs(0., |i, j| pairs.push((i, j)));
		assert_eq!(pairs, vec![(0, 1)]);
	}

	#[test]
	fn slack_pulls_in_nearly_touching_boxes() {
		let bounds = vec![Aabb::new(DVec2::ZERO, DVec2::splat(1.)), Aabb::new(DVec2::splat(1.1), DVec2::splat(2.))];
		let index = SegmentIndex::build(bounds, 0.25);

		let mut pairs = Vec::new();
		index.for_pairs(0.2, |i, j| pairs.push((i, j)));
		assert_eq!(pairs, vec![(0, 1)]);
	}
}
