use crate::boolean::CutPosition;
use crate::epsilons::EPS;
use crate::path::{Path, Subpath};
use crate::path_segment::PathSegment;

/// Splits `path` into open subpaths at the given positions without otherwise
/// altering its geometry. `piece` indexes segments sequentially across the
/// whole path, matching the numbering slice produces. A closed subpath with
/// `k` cuts becomes `k` open subpaths (the loop is rotated to start at a
/// cut); an open subpath with `k` cuts becomes `k + 1`.
pub fn convert_positions_to_moveto(path: &Path, positions: &[CutPosition]) -> Path {
	let mut sorted: Vec<CutPosition> = positions.to_vec();
	sorted.sort_by(|a, b| a.piece.cmp(&b.piece).then(a.t.total_cmp(&b.t)));
	sorted.dedup_by(|a, b| a.piece == b.piece && (a.t - b.t).abs() < 1e-9);

	let mut result = Path::new();
	let mut base = 0;
	for subpath in &path.subpaths {
		let len = subpath.segments.len();
		let local: Vec<CutPosition> = sorted
			.iter()
			.filter(|p| p.piece >= base && p.piece < base + len)
			.map(|p| CutPosition { piece: p.piece - base, t: p.t })
			.collect();
		base += len;

		if local.is_empty() {
			result.subpaths.push(subpath.clone());
			continue;
		}
		split_subpath(subpath, &local, &mut result.subpaths);
	}
	result
}

fn split_subpath(subpath: &Subpath, cuts: &[CutPosition], out: &mut Vec<Subpath>) {
	// Each fragment optionally starts a new subpath.
	struct Fragment {
		segment: PathSegment,
		break_before: bool,
	}

	let mut fragments: Vec<Fragment> = Vec::with_capacity(subpath.segments.len() + cuts.len());
	let mut pending_break = false;

	for (piece, segment) in subpath.segments.iter().enumerate() {
		// Cuts at a parameter boundary become breaks between fragments rather
		// than zero-length slices.
		let mut interior: Vec<f64> = Vec::new();
		let mut break_at_start = pending_break;
		pending_break = false;
		for cut in cuts.iter().filter(|cut| cut.piece == piece) {
			if cut.t <= EPS.param {
				break_at_start = true;
			} else if cut.t >= 1. - EPS.param {
				pending_break = true;
			} else {
				interior.push(cut.t);
			}
		}
		interior.sort_unstable_by(f64::total_cmp);

		let mut previous = 0.;
		let mut first = true;
		for &t in &interior {
			fragments.push(Fragment {
				segment: segment.slice_between(previous, t),
				break_before: if first { break_at_start } else { true },
			});
			previous = t;
			first = false;
		}
		fragments.push(Fragment {
			segment: segment.slice_between(previous, 1.),
			break_before: if first { break_at_start } else { true },
		});
	}

	if fragments.is_empty() {
		out.push(subpath.clone());
		return;
	}

	// A trailing boundary cut on a closed loop wraps around to the front; on
	// an open run it is a no-op.
	if pending_break && subpath.closed {
		fragments[0].break_before = true;
	}

	let rotation = if subpath.closed {
		match fragments.iter().position(|fragment| fragment.break_before) {
			Some(index) => index,
			None => {
				// No break landed on this loop after all; keep it closed.
				out.push(subpath.clone());
				return;
			}
		}
	} else {
		0
	};

	let mut chain: Vec<PathSegment> = Vec::new();
	let count = fragments.len();
	let mut flush = |chain: &mut Vec<PathSegment>, out: &mut Vec<Subpath>| {
		if chain.is_empty() {
			return;
		}
		out.push(Subpath {
			anchor: chain[0].start(),
			segments: std::mem::take(chain),
			closed: false,
		});
	};

	for offset in 0..count {
		let fragment = &fragments[(rotation + offset) % count];
		if fragment.break_before && offset > 0 {
			flush(&mut chain, out);
		}
		chain.push(fragment.segment);
	}
	flush(&mut chain, out);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::boolean::slice;
	use glam::DVec2;

	#[test]
	fn sliced_square_becomes_two_open_subpaths() {
		let square = Path::new_rect(DVec2::ZERO, DVec2::splat(1.));
		let cutter = Path::new_line(DVec2::new(0.5, -1.), DVec2::new(0.5, 2.));
		let positions = slice(&square, &cutter);
		let result = convert_positions_to_moveto(&square, &positions);

		assert_eq!(result.subpaths.len(), 2);
		assert!(result.subpaths.iter().all(|subpath| !subpath.closed));

		// The split endpoints are the two crossing points, each appearing as
		// the end of one subpath and the start of the other.
		let mut endpoints: Vec<DVec2> = result
			.subpaths
			.iter()
			.flat_map(|subpath| [subpath.anchor, subpath.end_point()])
			.collect();
		endpoints.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
		endpoints.dedup_by(|a, b| a.abs_diff_eq(*b, 1e-9));
		assert_eq!(endpoints.len(), 2);
		assert!(endpoints[0].abs_diff_eq(DVec2::new(0.5, 0.), 1e-9));
		assert!(endpoints[1].abs_diff_eq(DVec2::new(0.5, 1.), 1e-9));

		// Total length is preserved: the square boundary is merely re-rooted.
		let total: f64 = result
			.subpaths
			.iter()
			.flat_map(|subpath| subpath.segments.iter())
			.map(|segment| segment.start().distance(segment.end()))
			.sum();
		assert!((total - 4.).abs() < 1e-9);
	}

	#[test]
	fn open_path_with_one_cut_splits_in_two() {
		let line = Path::new_line(DVec2::ZERO, DVec2::new(10., 0.));
		let result = convert_positions_to_moveto(&line, &[CutPosition { piece: 0, t: 0.3 }]);

		assert_eq!(result.subpaths.len(), 2);
		assert!(result.subpaths[0].end_point().abs_diff_eq(DVec2::new(3., 0.), 1e-9));
		assert!(result.subpaths[1].anchor.abs_diff_eq(DVec2::new(3., 0.), 1e-9));
	}

	#[test]
	fn no_positions_is_identity() {
		let square = Path::new_rect(DVec2::ZERO, DVec2::splat(1.));
		assert_eq!(convert_positions_to_moveto(&square, &[]), square);
	}

	#[test]
	fn boundary_cut_rotates_a_closed_loop() {
		let square = Path::new_rect(DVec2::ZERO, DVec2::splat(1.));
		let result = convert_positions_to_moveto(&square, &[CutPosition { piece: 1, t: 0. }]);

		assert_eq!(result.subpaths.len(), 1);
		let subpath = &result.subpaths[0];
		assert!(!subpath.closed);
		assert!(subpath.anchor.abs_diff_eq(DVec2::new(1., 0.), 1e-9));
		assert!(subpath.end_point().abs_diff_eq(DVec2::new(1., 0.), 1e-9));
		assert_eq!(subpath.segments.len(), 4);
	}
}
