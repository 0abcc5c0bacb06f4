use glam::{DAffine2, DVec2};

use crate::aabb::Aabb;
use crate::epsilons::EPS;
use crate::path_command::{AbsolutePathCommand, PathCommand, to_absolute_commands};
use crate::path_segment::PathSegment;
use crate::vector::Vector;

/// Circle-from-cubics constant: handle length for a quarter turn.
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// One run of connected segments. `anchor` is the moveto point; when the
/// subpath has segments it coincides with the first segment's start. A closed
/// subpath's last endpoint coincides with `anchor` (a closing line is inserted
/// on construction when it does not).
#[derive(Clone, Debug, PartialEq)]
pub struct Subpath {
	pub anchor: Vector,
	pub segments: Vec<PathSegment>,
	pub closed: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
	pub subpaths: Vec<Subpath>,
}

impl Subpath {
	pub fn new(anchor: Vector, segments: Vec<PathSegment>, closed: bool) -> Self {
		let mut subpath = Subpath { anchor, segments, closed };
		if closed {
			subpath.close();
		}
		subpath
	}

	pub fn end_point(&self) -> Vector {
		self.segments.last().map(|segment| segment.end()).unwrap_or(self.anchor)
	}

	/// Marks the subpath closed, appending the closing line when the endpoints
	/// do not already coincide.
	pub fn close(&mut self) {
		self.closed = true;
		let end = self.end_point();
		if !end.abs_diff_eq(self.anchor, EPS.point) {
			self.segments.push(PathSegment::Line(end, self.anchor));
		}
	}

	/// A bare moveto with no drawable geometry.
	pub fn is_point(&self) -> bool {
		self.segments.is_empty()
	}

	/// Anchor points of the subpath (segment joints, not control points).
	pub fn nodes(&self) -> Vec<Vector> {
		let mut nodes = vec![self.anchor];
		for segment in &self.segments {
			nodes.push(segment.end());
		}
		if self.closed && nodes.len() > 1 {
			nodes.pop();
		}
		nodes
	}
}

impl Path {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.subpaths.iter().all(Subpath::is_point)
	}

	/// Total command count in the exchange format (moveto per subpath, one
	/// command per segment, closepath for closed subpaths).
	pub fn command_count(&self) -> usize {
		self.subpaths.iter().map(|subpath| 1 + subpath.segments.len() + usize::from(subpath.closed)).sum()
	}

	/// Total anchor-node count across subpaths.
	pub fn node_count(&self) -> usize {
		self.subpaths.iter().map(|subpath| subpath.nodes().len()).sum()
	}

	pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
		self.subpaths.iter().flat_map(|subpath| subpath.segments.iter())
	}

	pub fn bounding_box(&self) -> Option<Aabb> {
		let mut bounding_box: Option<Aabb> = None;
		for subpath in &self.subpaths {
			let mut extend = |aabb: Aabb| {
				bounding_box = Some(match bounding_box {
					Some(existing) => existing.merge(&aabb),
					None => aabb,
				});
			};
			if subpath.is_point() {
				extend(Aabb::around_point(subpath.anchor, 0.));
			}
			for segment in &subpath.segments {
				extend(segment.bounding_box());
			}
		}
		bounding_box
	}

	/// Replaces quadratics and arcs by exact/approximating cubics. The
	/// arrangement engine only accepts lines and cubics (the outline of arcs
	/// is broken there, so arcs never enter it directly).
	pub fn to_linear_and_cubics(&self) -> Path {
		let subpaths = self
			.subpaths
			.iter()
			.map(|subpath| {
				let segments = subpath.segments.iter().flat_map(PathSegment::to_linear_and_cubics).collect();
				Subpath {
					anchor: subpath.anchor,
					segments,
					closed: subpath.closed,
				}
			})
			.collect();
		Path { subpaths }
	}

	/// Maps the path through an affine transform. Arcs are lowered to cubics
	/// first since their endpoint parametrization does not survive shears.
	pub fn apply_affine(&self, transform: DAffine2) -> Path {
		let map = |p: Vector| transform.transform_point2(p);
		let subpaths = self
			.subpaths
			.iter()
			.map(|subpath| {
				let segments = subpath
					.segments
					.iter()
					.flat_map(|segment| match segment {
						PathSegment::Arc(..) => segment.to_linear_and_cubics(),
						other => vec![*other],
					})
					.map(|segment| match segment {
						PathSegment::Line(a, b) => PathSegment::Line(map(a), map(b)),
						PathSegment::Quadratic(a, b, c) => PathSegment::Quadratic(map(a), map(b), map(c)),
						PathSegment::Cubic(a, b, c, d) => PathSegment::Cubic(map(a), map(b), map(c), map(d)),
						PathSegment::Arc(..) => unreachable!("arcs lowered above"),
					})
					.collect();
				Subpath {
					anchor: map(subpath.anchor),
					segments,
					closed: subpath.closed,
				}
			})
			.collect();
		Path { subpaths }
	}

	/// Signed area of the flattened path (positive for counter-clockwise
	/// contours), summed over subpaths. Open subpaths contribute as if closed.
	pub fn signed_area(&self) -> f64 {
		let mut area = 0.;
		for subpath in &self.subpaths {
			let mut chords = Vec::new();
			for segment in &subpath.segments {
				segment.flatten_into(1e-3, &mut chords);
			}
			for (_, _, a, b) in &chords {
				area += a.x * b.y - b.x * a.y;
			}
			// Implicit closing chord.
			if let Some((_, _, _, last)) = chords.last() {
				area += last.x * subpath.anchor.y - subpath.anchor.x * last.y;
			}
		}
		area * 0.5
	}

	pub fn new_line(start: Vector, end: Vector) -> Path {
		Path {
			subpaths: vec![Subpath {
				anchor: start,
				segments: vec![PathSegment::Line(start, end)],
				closed: false,
			}],
		}
	}

	pub fn new_rect(min: Vector, max: Vector) -> Path {
		let corners = [min, DVec2::new(max.x, min.y), max, DVec2::new(min.x, max.y)];
		let segments = (0..4).map(|i| PathSegment::Line(corners[i], corners[(i + 1) % 4])).collect();
		Path {
			subpaths: vec![Subpath {
				anchor: corners[0],
				segments,
				closed: true,
			}],
		}
	}

	/// Axis-aligned ellipse inscribed in the corner box, as four cubics.
	pub fn new_ellipse(corner1: Vector, corner2: Vector) -> Path {
		let center = (corner1 + corner2) * 0.5;
		let radii = ((corner2 - corner1) * 0.5).abs();
		let handle = radii * KAPPA;

		let right = center + DVec2::new(radii.x, 0.);
		let top = center + DVec2::new(0., radii.y);
		let left = center - DVec2::new(radii.x, 0.);
		let bottom = center - DVec2::new(0., radii.y);

		let segments = vec![
			PathSegment::Cubic(right, right + DVec2::new(0., handle.y), top + DVec2::new(handle.x, 0.), top),
			PathSegment::Cubic(top, top - DVec2::new(handle.x, 0.), left + DVec2::new(0., handle.y), left),
			PathSegment::Cubic(left, left - DVec2::new(0., handle.y), bottom - DVec2::new(handle.x, 0.), bottom),
			PathSegment::Cubic(bottom, bottom + DVec2::new(handle.x, 0.), right - DVec2::new(0., handle.y), right),
		];
		Path {
			subpaths: vec![Subpath {
				anchor: right,
				segments,
				closed: true,
			}],
		}
	}
}

/// Builds a path from a command stream, reflecting smooth control points and
/// splitting subpaths at movetos.
pub fn path_from_commands<I>(commands: I) -> Path
where
	I: IntoIterator<Item = PathCommand>,
{
	let mut path = Path::new();
	let mut current: Option<Subpath> = None;
	// Whether `current` is a continuation stub synthesized after a Z. Stubs
	// that never receive a draw command must not survive as subpaths, while
	// explicit bare movetos must.
	let mut continuation = false;
	let mut last_control_point: Option<DVec2> = None;

	let flush = |current: &mut Option<Subpath>, continuation: bool, path: &mut Path| {
		if let Some(subpath) = current.take() {
			if !subpath.segments.is_empty() || !continuation {
				path.subpaths.push(subpath);
			}
		}
	};

	for command in to_absolute_commands(commands) {
		match command {
			AbsolutePathCommand::M(point) => {
				flush(&mut current, continuation, &mut path);
				current = Some(Subpath {
					anchor: point,
					segments: Vec::new(),
					closed: false,
				});
				continuation = false;
				last_control_point = None;
			}
			AbsolutePathCommand::Z => {
				if let Some(mut subpath) = current.take() {
					let anchor = subpath.anchor;
					subpath.close();
					path.subpaths.push(subpath);
					// A draw command directly after Z continues from the anchor.
					current = Some(Subpath {
						anchor,
						segments: Vec::new(),
						closed: false,
					});
					continuation = true;
				}
				last_control_point = None;
			}
			other => {
				let Some(subpath) = current.as_mut() else { continue };
				let start = subpath.end_point();
				let segment = match other {
					AbsolutePathCommand::L(end) => {
						last_control_point = None;
						PathSegment::Line(start, end)
					}
					AbsolutePathCommand::H(x) => {
						last_control_point = None;
						PathSegment::Line(start, DVec2::new(x, start.y))
					}
					AbsolutePathCommand::V(y) => {
						last_control_point = None;
						PathSegment::Line(start, DVec2::new(start.x, y))
					}
					AbsolutePathCommand::C(c1, c2, end) => {
						last_control_point = Some(c2);
						PathSegment::Cubic(start, c1, c2, end)
					}
					AbsolutePathCommand::S(c2, end) => {
						let c1 = reflect_control_point(start, last_control_point.unwrap_or(start));
						last_control_point = Some(c2);
						PathSegment::Cubic(start, c1, c2, end)
					}
					AbsolutePathCommand::Q(c, end) => {
						last_control_point = Some(c);
						PathSegment::Quadratic(start, c, end)
					}
					AbsolutePathCommand::T(end) => {
						let c = reflect_control_point(start, last_control_point.unwrap_or(start));
						last_control_point = Some(c);
						PathSegment::Quadratic(start, c, end)
					}
					AbsolutePathCommand::A(rx, ry, rotation, large_arc, sweep, end) => {
						last_control_point = None;
						PathSegment::Arc(start, rx, ry, rotation, large_arc, sweep, end)
					}
					AbsolutePathCommand::M(_) | AbsolutePathCommand::Z => unreachable!(),
				};
				subpath.segments.push(segment);
			}
		}
	}
	// A trailing bare moveto is a degenerate but valid subpath; leftover
	// continuation stubs are not.
	flush(&mut current, continuation, &mut path);

	path
}

pub fn path_to_commands(path: &Path) -> Vec<AbsolutePathCommand> {
	let mut commands = Vec::with_capacity(path.command_count());
	for subpath in &path.subpaths {
		commands.push(AbsolutePathCommand::M(subpath.anchor));
		for segment in &subpath.segments {
			commands.push(match *segment {
				PathSegment::Line(_, end) => AbsolutePathCommand::L(end),
				PathSegment::Quadratic(_, c, end) => AbsolutePathCommand::Q(c, end),
				PathSegment::Cubic(_, c1, c2, end) => AbsolutePathCommand::C(c1, c2, end),
				PathSegment::Arc(_, rx, ry, rotation, large_arc, sweep, end) => AbsolutePathCommand::A(rx, ry, rotation, large_arc, sweep, end),
			});
		}
		if subpath.closed {
			commands.push(AbsolutePathCommand::Z);
		}
	}
	commands
}

fn reflect_control_point(point: DVec2, control_point: DVec2) -> DVec2 {
	point * 2. - control_point
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn close_inserts_closing_line() {
		let segments = vec![
			PathSegment::Line(DVec2::ZERO, DVec2::new(1., 0.)),
			PathSegment::Line(DVec2::new(1., 0.), DVec2::new(1., 1.)),
		];
		let subpath = Subpath::new(DVec2::ZERO, segments, true);
		assert_eq!(subpath.segments.len(), 3);
		assert!(subpath.end_point().abs_diff_eq(subpath.anchor, 1e-12));
	}

	#[test]
	fn rect_area_and_nodes() {
		let rect = Path::new_rect(DVec2::ZERO, DVec2::new(2., 3.));
		assert!((rect.signed_area().abs() - 6.).abs() < 1e-9);
		assert_eq!(rect.node_count(), 4);
		assert_eq!(rect.command_count(), 6);
	}

	#[test]
	fn close_then_moveto_leaves_no_stub_subpath() {
		let commands = vec![
			PathCommand::Absolute(AbsolutePathCommand::M(DVec2::new(1., 2.))),
			PathCommand::Absolute(AbsolutePathCommand::L(DVec2::new(3., 2.))),
			PathCommand::Absolute(AbsolutePathCommand::L(DVec2::new(3., 4.))),
			PathCommand::Absolute(AbsolutePathCommand::Z),
			PathCommand::Absolute(AbsolutePathCommand::M(DVec2::new(10., 10.))),
			PathCommand::Absolute(AbsolutePathCommand::L(DVec2::new(12., 10.))),
		];
		let path = path_from_commands(commands);
		assert_eq!(path.subpaths.len(), 2);

		// Serializing and rebuilding keeps the subpath count stable.
		let rebuilt = path_from_commands(path_to_commands(&path).into_iter().map(PathCommand::Absolute));
		assert_eq!(rebuilt.subpaths.len(), 2);
	}

	#[test]
	fn draw_after_close_continues_from_the_anchor() {
		let commands = vec![
			PathCommand::Absolute(AbsolutePathCommand::M(DVec2::ZERO)),
			PathCommand::Absolute(AbsolutePathCommand::L(DVec2::new(1., 0.))),
			PathCommand::Absolute(AbsolutePathCommand::Z),
			PathCommand::Absolute(AbsolutePathCommand::L(DVec2::new(0., 1.))),
		];
		let path = path_from_commands(commands);
		assert_eq!(path.subpaths.len(), 2);
		assert!(path.subpaths[1].anchor.abs_diff_eq(DVec2::ZERO, 1e-12));
		assert_eq!(path.subpaths[1].segments.len(), 1);
	}

	#[test]
	fn trailing_bare_moveto_survives() {
		let commands = vec![
			PathCommand::Absolute(AbsolutePathCommand::M(DVec2::ZERO)),
			PathCommand::Absolute(AbsolutePathCommand::L(DVec2::new(1., 0.))),
			PathCommand::Absolute(AbsolutePathCommand::M(DVec2::new(5., 5.))),
		];
		let path = path_from_commands(commands);
		assert_eq!(path.subpaths.len(), 2);
		assert!(path.subpaths[1].is_point());
	}

	#[test]
	fn ellipse_stays_near_radius() {
		let circle = Path::new_ellipse(DVec2::new(-1., -1.), DVec2::new(1., 1.));
		for segment in circle.segments() {
			for i in 0..=8 {
				let p = segment.sample_at(i as f64 / 8.);
				assert!((p.length() - 1.).abs() < 3e-3);
			}
		}
		// Area of the cubic approximation is within half a percent of a disc.
		assert!((circle.signed_area().abs() - std::f64::consts::PI).abs() < 0.02);
	}
}
