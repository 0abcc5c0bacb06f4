#[derive(Clone, Copy, Debug)]
pub struct Epsilons {
	/// Distance below which two points are considered coincident.
	pub point: f64,
	/// Bounding-box extent below which a curve piece is treated as a line.
	pub linear: f64,
	/// Parameter-space tolerance.
	pub param: f64,
}

pub const EPS: Epsilons = Epsilons {
	point: 1e-6,
	linear: 1e-4,
	param: 1e-8,
};
