use glam::{BVec2, DVec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
	min: DVec2,
	max: DVec2,
}

impl Default for Aabb {
	fn default() -> Self {
		Self {
			min: DVec2::INFINITY,
			max: DVec2::NEG_INFINITY,
		}
	}
}

impl Aabb {
	pub fn new(min: DVec2, max: DVec2) -> Self {
		Self { min: min.min(max), max: min.max(max) }
	}

	pub fn around_point(point: DVec2, padding: f64) -> Self {
		Self {
			min: point - DVec2::splat(padding),
			max: point + DVec2::splat(padding),
		}
	}

	#[inline]
	pub fn min(&self) -> DVec2 {
		self.min
	}

	#[inline]
	pub fn max(&self) -> DVec2 {
		self.max
	}

	pub fn center(&self) -> DVec2 {
		(self.min + self.max) * 0.5
	}

	pub fn max_extent(&self) -> f64 {
		(self.max - self.min).max_element()
	}

	pub fn overlaps(&self, other: &Aabb) -> bool {
		(self.min.cmple(other.max) & other.min.cmple(self.max)) == BVec2::TRUE
	}

	pub fn contains(&self, point: DVec2) -> bool {
		(self.min.cmple(point) & point.cmple(self.max)) == BVec2::TRUE
	}

	pub fn merge(&self, other: &Aabb) -> Aabb {
		Aabb {
			min: self.min.min(other.min),
			max: self.max.max(other.max),
		}
	}

	pub fn extend(&self, point: DVec2) -> Aabb {
		Aabb {
			min: self.min.min(point),
			max: self.max.max(point),
		}
	}

	pub fn expand(&self, padding: f64) -> Aabb {
		Aabb {
			min: self.min - DVec2::splat(padding),
			max: self.max + DVec2::splat(padding),
		}
	}
}
