use crate::epsilons::EPS;
use crate::path::Path;
use crate::path_segment::PathSegment;
use crate::shape::{EdgeData, FillRule, PointMerger, RawEdge, Shape, planarize};
use crate::vector::perp;

/// The boolean operators. `Cut` and `Slice` are not true set operations: cut
/// keeps the source boundary plus marked interior cutting walls, slice only
/// records where the cutter crosses the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BooleanOp {
	Union,
	Intersection,
	Difference,
	SymmetricDifference,
	Cut,
	Slice,
}

impl BooleanOp {
	fn combine(self, a: bool, b: bool) -> bool {
		match self {
			BooleanOp::Union => a || b,
			BooleanOp::Intersection => a && b,
			BooleanOp::Difference => a && !b,
			BooleanOp::SymmetricDifference => a != b,
			BooleanOp::Cut | BooleanOp::Slice => unreachable!("not area operators"),
		}
	}

	pub fn is_area_op(self) -> bool {
		!matches!(self, BooleanOp::Cut | BooleanOp::Slice)
	}
}

/// A split point recorded by slice: parameter `t` on source piece `piece`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutPosition {
	pub piece: usize,
	pub t: f64,
}

/// Combines two converted shapes. For the four area operators the result is a
/// consistent boundary arrangement again; `Cut` yields the source boundary
/// plus doubled, marked cutting edges; `Slice` yields the uncrossed overlay
/// for callers that scan it for crossings.
pub fn boolean_shapes(a: &Shape, b: &Shape, op: BooleanOp) -> Shape {
	match op {
		BooleanOp::Cut => cut_shapes(a, b),
		BooleanOp::Slice => {
			let (raw, pieces, _) = merge_raw(a, b);
			planarize(raw, pieces)
		}
		area_op => {
			let (raw, pieces, _) = merge_raw(a, b);
			let arranged = planarize(raw, pieces);
			let inside = |point| area_op.combine(a.winding_at(point) != 0, b.winding_at(point) != 0);
			crate::shape::boundary_of(&arranged, inside)
		}
	}
}

/// Folds an area operator across the operand paths, converting each with its
/// fill rule. Quantization of near-degenerate input can produce a zero-edge
/// operand, which the general boolean cannot handle; those cases are routed
/// through the operator identities instead:
///   union/symdiff with an empty operand keeps the other operand,
///   intersection with an empty operand is empty,
///   difference is empty when the minuend is empty and keeps the minuend when
///   the subtrahend is.
pub fn fold_boolean(operands: &[(&Path, FillRule)], op: BooleanOp) -> Shape {
	debug_assert!(op.is_area_op());
	let Some(((first, first_rule), rest)) = operands.split_first() else {
		return Shape::empty();
	};
	let mut accumulated = Shape::fill(first, 0).convert_to_shape(*first_rule);

	for (path_id, (path, rule)) in rest.iter().enumerate() {
		let next = Shape::fill(path, path_id + 1).convert_to_shape(*rule);
		let (zero_acc, zero_next) = (accumulated.is_empty(), next.is_empty());
		if zero_acc || zero_next {
			accumulated = match op {
				BooleanOp::Union | BooleanOp::SymmetricDifference => {
					if zero_acc { next } else { accumulated }
				}
				BooleanOp::Intersection => Shape::empty(),
				BooleanOp::Difference => {
					if zero_acc { Shape::empty() } else { accumulated }
				}
				BooleanOp::Cut | BooleanOp::Slice => unreachable!("not area operators"),
			};
			continue;
		}
		accumulated = boolean_shapes(&accumulated, &next, op);
	}
	accumulated
}

/// Cut: the source boundary is kept whole (split at cutter crossings), and
/// every cutter edge lying in the source interior is doubled into a marked
/// two-sided wall so forme extraction can walk the divided faces.
fn cut_shapes(source: &Shape, cutter: &Shape) -> Shape {
	let (raw, pieces, source_paths) = merge_raw(source, cutter);
	let arranged = planarize(raw, pieces);
	let delta = arranged.side_delta();

	let mut result = Shape::with_pieces(arranged.pieces.clone());
	let mut merger = PointMerger::new(EPS.point);
	for edge in arranged.edges.values() {
		let a = arranged.position(edge.start);
		let b = arranged.position(edge.end);
		let start = merger.key(&mut result.points, a);
		let end = merger.key(&mut result.points, b);
		if start == end {
			continue;
		}

		if edge.back.path < source_paths {
			result.push_edge(EdgeData {
				start,
				end,
				back: edge.back,
				cut: false,
			});
			continue;
		}

		let normal = perp(b - a).normalize_or_zero();
		if normal == crate::vector::Vector::ZERO {
			continue;
		}
		let mid = (a + b) * 0.5;
		let interior = source.winding_at(mid + normal * delta) != 0 && source.winding_at(mid - normal * delta) != 0;
		if !interior {
			continue;
		}
		result.push_edge(EdgeData {
			start,
			end,
			back: edge.back,
			cut: true,
		});
		result.push_edge(EdgeData {
			start: end,
			end: start,
			back: crate::flatten::BackData {
				t_start: edge.back.t_end,
				t_end: edge.back.t_start,
				..edge.back
			},
			cut: true,
		});
	}
	result
}

/// Slice: overlays the (unclosed) source and cutter, then records every vertex
/// of total degree above two that has incident edges from both paths as a cut
/// position on the source. Only one position is kept per vertex, so a source
/// self-crossing coinciding with a cutter crossing loses one split.
///
/// Positions index the pieces of `source.to_linear_and_cubics()`; callers that
/// split afterwards must work on that lowered path (a no-op for paths already
/// made of lines and cubics).
pub fn slice(source: &Path, cutter: &Path) -> Vec<CutPosition> {
	let source_shape = Shape::fill_open(source, 0);
	let cutter_shape = Shape::fill_open(cutter, 0);
	let (raw, pieces, source_paths) = merge_raw(&source_shape, &cutter_shape);
	let arranged = planarize(raw, pieces);

	let mut positions = Vec::new();
	for (point_key, point) in &arranged.points {
		if point.edges.len() <= 2 {
			continue;
		}
		let mut incident_source = 0;
		let mut incident_cutter = 0;
		let mut position = None;
		for &edge_key in &point.edges {
			let edge = &arranged.edges[edge_key];
			if edge.back.path < source_paths {
				incident_source += 1;
				let t = if edge.start == point_key { edge.back.t_start } else { edge.back.t_end };
				position = Some(CutPosition { piece: edge.back.piece, t });
			} else {
				incident_cutter += 1;
			}
		}
		if incident_source > 0 && incident_cutter > 0 {
			if let Some(position) = position {
				positions.push(position);
			}
		}
	}
	positions.sort_by(|a, b| a.piece.cmp(&b.piece).then(a.t.total_cmp(&b.t)));
	positions
}

/// Overlays the raw edges of two shapes, shifting the second operand's path
/// ids past the first's so back data stays unambiguous.
fn merge_raw(a: &Shape, b: &Shape) -> (Vec<RawEdge>, Vec<Vec<PathSegment>>, usize) {
	let offset = a.pieces.len();
	let mut raw = a.raw_edges();
	for mut edge in b.raw_edges() {
		edge.back.path += offset;
		raw.push(edge);
	}
	let mut pieces = a.pieces.clone();
	pieces.extend(b.pieces.iter().cloned());
	(raw, pieces, offset)
}

#[cfg(test)]
mod tests {
	use super::*;
	use glam::DVec2;

	fn converted(path: &Path) -> Shape {
		Shape::fill(path, 0).convert_to_shape(FillRule::NonZero)
	}

	fn square(min: DVec2, max: DVec2) -> Path {
		Path::new_rect(min, max)
	}

	#[test]
	fn union_of_overlapping_squares_covers_both() {
		let a = converted(&square(DVec2::ZERO, DVec2::splat(1.)));
		let b = converted(&square(DVec2::splat(0.5), DVec2::splat(1.5)));
		let union = boolean_shapes(&a, &b, BooleanOp::Union);

		for inside in [DVec2::splat(0.25), DVec2::splat(0.75), DVec2::splat(1.25)] {
			assert_ne!(union.winding_at(inside), 0, "{inside} should be inside");
		}
		assert_eq!(union.winding_at(DVec2::new(0.25, 1.25)), 0);
		assert_eq!(union.winding_at(DVec2::splat(2.)), 0);
	}

	#[test]
	fn intersection_commutes() {
		let a = converted(&square(DVec2::ZERO, DVec2::splat(1.)));
		let b = converted(&square(DVec2::splat(0.5), DVec2::splat(1.5)));
		let ab = boolean_shapes(&a, &b, BooleanOp::Intersection);
		let ba = boolean_shapes(&b, &a, BooleanOp::Intersection);

		for x in [0.25, 0.6, 0.9, 1.25] {
			for y in [0.25, 0.6, 0.9, 1.25] {
				let p = DVec2::new(x, y);
				assert_eq!(ab.winding_at(p) != 0, ba.winding_at(p) != 0, "{p}");
			}
		}
		assert_ne!(ab.winding_at(DVec2::splat(0.75)), 0);
		assert_eq!(ab.winding_at(DVec2::splat(0.25)), 0);
	}

	#[test]
	fn difference_excludes_the_intersection() {
		let a = converted(&square(DVec2::ZERO, DVec2::splat(1.)));
		let b = converted(&square(DVec2::splat(0.5), DVec2::splat(1.5)));
		let difference = boolean_shapes(&a, &b, BooleanOp::Difference);
		let intersection = boolean_shapes(&a, &b, BooleanOp::Intersection);

		for x in [0.25, 0.6, 0.9, 1.25] {
			for y in [0.25, 0.6, 0.9, 1.25] {
				let p = DVec2::new(x, y);
				assert!(!(difference.winding_at(p) != 0 && intersection.winding_at(p) != 0), "{p} in both");
			}
		}
		assert_ne!(difference.winding_at(DVec2::splat(0.25)), 0);
		assert_eq!(difference.winding_at(DVec2::splat(0.75)), 0);
	}

	#[test]
	fn symdiff_matches_union_of_differences() {
		let a = converted(&square(DVec2::ZERO, DVec2::splat(1.)));
		let b = converted(&square(DVec2::splat(0.5), DVec2::splat(1.5)));
		let symdiff = boolean_shapes(&a, &b, BooleanOp::SymmetricDifference);
		let a_minus_b = boolean_shapes(&a, &b, BooleanOp::Difference);
		let b_minus_a = boolean_shapes(&b, &a, BooleanOp::Difference);
		let union = boolean_shapes(&a_minus_b, &b_minus_a, BooleanOp::Union);

		for x in [0.25, 0.6, 0.9, 1.25] {
			for y in [0.25, 0.6, 0.9, 1.25] {
				let p = DVec2::new(x, y);
				assert_eq!(symdiff.winding_at(p) != 0, union.winding_at(p) != 0, "{p}");
			}
		}
	}

	#[test]
	fn self_union_keeps_single_boundary() {
		let a = converted(&square(DVec2::ZERO, DVec2::splat(1.)));
		let union = boolean_shapes(&a, &a.clone(), BooleanOp::Union);
		assert_eq!(union.edge_count(), 4);
		assert_eq!(union.winding_at(DVec2::splat(0.5)), 1);
	}

	#[test]
	fn empty_operands_route_through_identities() {
		let square_path = square(DVec2::ZERO, DVec2::splat(1.));
		let moveto_only = crate::path_data::path_from_path_data("M 3 3").unwrap();

		let union = fold_boolean(&[(&moveto_only, FillRule::NonZero), (&square_path, FillRule::NonZero)], BooleanOp::Union);
		assert_eq!(union.edge_count(), 4);

		let inters = fold_boolean(&[(&square_path, FillRule::NonZero), (&moveto_only, FillRule::NonZero)], BooleanOp::Intersection);
		assert!(inters.is_empty());

		let diff_keeps = fold_boolean(&[(&square_path, FillRule::NonZero), (&moveto_only, FillRule::NonZero)], BooleanOp::Difference);
		assert_eq!(diff_keeps.edge_count(), 4);

		let diff_empty = fold_boolean(&[(&moveto_only, FillRule::NonZero), (&square_path, FillRule::NonZero)], BooleanOp::Difference);
		assert!(diff_empty.is_empty());
	}

	#[test]
	fn cut_marks_interior_walls() {
		let a = converted(&square(DVec2::ZERO, DVec2::splat(2.)));
		let cutter = Shape::fill_open(&Path::new_line(DVec2::new(1., -1.), DVec2::new(1., 3.)), 0).convert_to_shape(FillRule::JustDont);
		let cut = boolean_shapes(&a, &cutter, BooleanOp::Cut);

		let walls: Vec<_> = cut.edges.values().filter(|edge| edge.cut).collect();
		// The interior portion of the cutter, once in each direction.
		assert_eq!(walls.len(), 2);
		// Boundary is intact: winding unchanged on both sides of the wall.
		assert_eq!(cut.winding_at(DVec2::new(0.5, 1.)), 1);
		assert_eq!(cut.winding_at(DVec2::new(1.5, 1.)), 1);
	}

	#[test]
	fn slice_square_with_crossing_line() {
		let square_path = square(DVec2::ZERO, DVec2::splat(1.));
		let cutter = Path::new_line(DVec2::new(0.5, -1.), DVec2::new(0.5, 2.));
		let positions = slice(&square_path, &cutter);

		assert_eq!(positions.len(), 2);
		// Bottom edge and top edge, both crossed at their midpoint.
		assert_eq!(positions[0].piece, 0);
		assert!((positions[0].t - 0.5).abs() < 1e-6);
		assert_eq!(positions[1].piece, 2);
		assert!((positions[1].t - 0.5).abs() < 1e-6);
	}

	#[test]
	fn slice_misses_nothing_when_paths_do_not_cross() {
		let square_path = square(DVec2::ZERO, DVec2::splat(1.));
		let cutter = Path::new_line(DVec2::new(5., 0.), DVec2::new(5., 1.));
		assert!(slice(&square_path, &cutter).is_empty());
	}
}
