use crate::path::Path;
use crate::path_segment::PathSegment;
use crate::vector::Vector;

/// Default chord tolerance used when flattening input paths for arrangement.
pub const FLATTEN_TOLERANCE: f64 = 1e-3;

/// Provenance of a flattened edge: which input path and piece it came from,
/// and the parameter span of the piece it covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackData {
	pub path: usize,
	pub piece: usize,
	pub t_start: f64,
	pub t_end: f64,
}

/// One chord of the flattened input.
#[derive(Clone, Copy, Debug)]
pub struct FlatEdge {
	pub start: Vector,
	pub end: Vector,
	pub back: BackData,
}

/// A path lowered to chords, keeping the original segments around so curve
/// geometry can be reconstructed from back data later.
#[derive(Clone, Debug, Default)]
pub struct FlatPath {
	pub edges: Vec<FlatEdge>,
	pub pieces: Vec<PathSegment>,
}

impl FlatPath {
	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}
}

/// Flattens `path` with back data. `path_id` tags every edge so arrangements
/// built from several paths can attribute geometry to its source.
pub fn flatten_path(path: &Path, path_id: usize, tolerance: f64) -> FlatPath {
	let mut flat = FlatPath::default();
	let mut chords = Vec::new();

	for subpath in &path.subpaths {
		for segment in &subpath.segments {
			let piece = flat.pieces.len();
			flat.pieces.push(*segment);

			chords.clear();
			segment.flatten_into(tolerance, &mut chords);
			for &(t_start, t_end, start, end) in &chords {
				if start == end {
					continue;
				}
				flat.edges.push(FlatEdge {
					start,
					end,
					back: BackData { path: path_id, piece, t_start, t_end },
				});
			}
		}
	}

	flat
}

#[cfg(test)]
mod tests {
	use super::*;
	use glam::DVec2;

	#[test]
	fn chords_are_contiguous_and_attributed() {
		let mut path = Path::new_ellipse(DVec2::new(-2., -1.), DVec2::new(2., 1.));
		path.subpaths.extend(Path::new_line(DVec2::ZERO, DVec2::new(5., 0.)).subpaths);
		let flat = flatten_path(&path, 7, FLATTEN_TOLERANCE);

		assert_eq!(flat.pieces.len(), 5);

		let mut previous: Option<(usize, f64, Vector)> = None;
		for edge in &flat.edges {
			assert_eq!(edge.back.path, 7);
			assert!(edge.back.t_start < edge.back.t_end);
			// Within a piece the chords chain without gaps.
			if let Some((piece, t_end, end)) = previous {
				if piece == edge.back.piece {
					assert_eq!(edge.back.t_start, t_end);
					assert_eq!(edge.start, end);
				}
			}
			// Chord endpoints lie on the source piece.
			let piece = &flat.pieces[edge.back.piece];
			assert!(piece.sample_at(edge.back.t_start).abs_diff_eq(edge.start, 1e-9));
			assert!(piece.sample_at(edge.back.t_end).abs_diff_eq(edge.end, 1e-9));
			previous = Some((edge.back.piece, edge.back.t_end, edge.end));
		}
	}

	#[test]
	fn degenerate_moveto_produces_no_edges() {
		let path = crate::path_data::path_from_path_data("M 3 4").unwrap();
		let flat = flatten_path(&path, 0, FLATTEN_TOLERANCE);
		assert!(flat.is_empty());
		assert!(flat.pieces.is_empty());
	}
}
