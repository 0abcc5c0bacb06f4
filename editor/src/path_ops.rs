//! Document-level path operations: booleans over selected items, stroke
//! outlining, and inset/outset. Each operation validates its selection,
//! runs the arrangement engine on document-space outlines, and replaces the
//! source items with the result.

use glam::DAffine2;
use path_arrange::{BooleanOp, FillRule, Path, Shape, boolean_shapes, convert_to_forme, convert_to_forme_nested, convert_positions_to_moveto, fold_boolean, make_offset, outline, slice};
use thiserror::Error;

use crate::document::{Document, ItemId};
use crate::preferences::SnapPreferences;
use crate::style::{Style, StrokeAttr};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PathOpError {
	#[error("the operation needs at least {needed} selected items, found {found}")]
	TooFewItems { needed: usize, found: usize },
	#[error("difference, cut, and slice work on exactly two items, found {found}")]
	TooManyItems { found: usize },
	#[error("one of the selected items has no path outline")]
	NonPathItem,
	#[error("the item has no stroke to outline")]
	NoStroke,
}

fn required_items(op: BooleanOp) -> usize {
	match op {
		BooleanOp::Union => 1,
		_ => 2,
	}
}

fn binary_only(op: BooleanOp) -> bool {
	matches!(op, BooleanOp::Difference | BooleanOp::Cut | BooleanOp::Slice)
}

/// Applies a boolean operation to the selected items. On success the sources
/// are deleted and replaced by a single new path item at the z position of the
/// style donor (topmost for difference/cut/slice, bottommost otherwise).
/// A degenerate result still deletes the sources and reports `Ok(None)`.
pub fn apply_boolean(document: &mut Document, preferences: &SnapPreferences, op: BooleanOp, selection: &[ItemId]) -> Result<Option<ItemId>, PathOpError> {
	let needed = required_items(op);
	if selection.len() < needed {
		return Err(PathOpError::TooFewItems { needed, found: selection.len() });
	}
	if binary_only(op) && selection.len() > 2 {
		return Err(PathOpError::TooManyItems { found: selection.len() });
	}

	// Bottom of the z-order first; difference subtracts the top item from the
	// bottom one, cut and slice use the top item as the cutter.
	let mut items: Vec<ItemId> = selection.to_vec();
	items.sort_by_key(|&item| document.z_index(item).unwrap_or(usize::MAX));

	let mut operands = Vec::with_capacity(items.len());
	for &item in &items {
		let path = document.outline_in_document(item, DAffine2::IDENTITY).ok_or(PathOpError::NonPathItem)?;
		let fill_rule = document.style(item).map(|style| style.fill_rule.to_fill_rule()).unwrap_or(preferences.boolean_fill_rule);
		operands.push((path, fill_rule));
	}

	let result = match op {
		BooleanOp::Cut => {
			let (source, source_rule) = &operands[0];
			let (cutter, _) = &operands[1];
			let source_shape = Shape::fill(source, 0).convert_to_shape(*source_rule);
			// The cutter has no interior of its own.
			let cutter_shape = Shape::fill_open(cutter, 0).convert_to_shape(FillRule::JustDont);
			let (path, _nesting) = convert_to_forme_nested(&boolean_shapes(&source_shape, &cutter_shape, BooleanOp::Cut));
			path
		}
		BooleanOp::Slice => {
			let lowered = operands[0].0.to_linear_and_cubics();
			let positions = slice(&lowered, &operands[1].0);
			convert_positions_to_moveto(&lowered, &positions)
		}
		area_op => {
			let borrowed: Vec<(&Path, FillRule)> = operands.iter().map(|(path, rule)| (path, *rule)).collect();
			convert_to_forme(&fold_boolean(&borrowed, area_op))
		}
	};

	let style_donor = if binary_only(op) { *items.last().unwrap() } else { items[0] };
	let style = document.style(style_donor).cloned().unwrap_or_default();

	// A single leftover moveto means the operation produced nothing; the
	// sources are still consumed.
	if result.command_count() <= 1 {
		for item in items {
			document.delete_item(item);
		}
		return Ok(None);
	}

	let replacement = document.insert_path_at(style_donor, result, style, DAffine2::IDENTITY);
	for item in items {
		document.delete_item(item);
	}
	Ok(Some(replacement))
}

/// Replaces a stroked item with the filled outline of its stroke.
pub fn outline_stroke(document: &mut Document, item: ItemId) -> Result<Option<ItemId>, PathOpError> {
	let style = document.style(item).cloned().ok_or(PathOpError::NonPathItem)?;
	let stroke = style.stroke.clone().ok_or(PathOpError::NoStroke)?;
	let path = document.outline_in_document(item, DAffine2::IDENTITY).ok_or(PathOpError::NonPathItem)?;

	let result = outline(&path, &stroke.to_stroke_style());
	if result.command_count() <= 1 {
		document.delete_item(item);
		return Ok(None);
	}

	let style = Style { stroke: None, ..style };
	let replacement = document.insert_path_at(item, result, style, DAffine2::IDENTITY);
	document.delete_item(item);
	Ok(Some(replacement))
}

/// Insets (negative distance) or outsets (positive) an item's filled region,
/// replacing the item with the result. Join parameters come from the item's
/// stroke style when present.
pub fn offset_path(document: &mut Document, item: ItemId, distance: f64) -> Result<Option<ItemId>, PathOpError> {
	let style = document.style(item).cloned().ok_or(PathOpError::NonPathItem)?;
	let path = document.outline_in_document(item, DAffine2::IDENTITY).ok_or(PathOpError::NonPathItem)?;

	let (join, miter_limit) = match &style.stroke {
		Some(stroke) => (stroke.join, stroke.miter_limit),
		None => {
			let defaults = StrokeAttr::default();
			(defaults.join, defaults.miter_limit)
		}
	};
	let result = make_offset(&path, style.fill_rule.to_fill_rule(), distance, join, miter_limit);
	if result.command_count() <= 1 {
		document.delete_item(item);
		return Ok(None);
	}

	let replacement = document.insert_path_at(item, result, style, DAffine2::IDENTITY);
	document.delete_item(item);
	Ok(Some(replacement))
}

#[cfg(test)]
mod tests {
	use super::*;
	use glam::DVec2;

	use crate::style::FillRuleAttr;

	fn add_square(document: &mut Document, min: DVec2, size: f64) -> ItemId {
		document.add_path(None, Path::new_rect(min, min + DVec2::splat(size)), Style::default(), DAffine2::IDENTITY)
	}

	fn area(path: &Path) -> f64 {
		path.signed_area().abs()
	}

	#[test]
	fn union_of_two_overlapping_squares() {
		let mut document = Document::default();
		let preferences = SnapPreferences::default();
		let a = add_square(&mut document, DVec2::ZERO, 1.);
		let b = add_square(&mut document, DVec2::splat(0.5), 1.);

		let result = apply_boolean(&mut document, &preferences, BooleanOp::Union, &[a, b]).unwrap().unwrap();
		assert!(!document.contains(a) && !document.contains(b));

		let path = document.local_outline(result).unwrap();
		assert_eq!(path.subpaths.len(), 1);
		assert!((area(path) - 1.75).abs() < 1e-6);
	}

	#[test]
	fn difference_subtracts_the_top_item() {
		let mut document = Document::default();
		let preferences = SnapPreferences::default();
		let bottom = add_square(&mut document, DVec2::ZERO, 2.);
		let top = add_square(&mut document, DVec2::splat(1.), 2.);

		// Selection order must not matter; z-order decides the minuend.
		let result = apply_boolean(&mut document, &preferences, BooleanOp::Difference, &[top, bottom]).unwrap().unwrap();
		let path = document.local_outline(result).unwrap();
		assert!((area(path) - 3.).abs() < 1e-6);
	}

	#[test]
	fn selection_size_is_validated() {
		let mut document = Document::default();
		let preferences = SnapPreferences::default();
		let a = add_square(&mut document, DVec2::ZERO, 1.);
		let b = add_square(&mut document, DVec2::splat(2.), 1.);
		let c = add_square(&mut document, DVec2::splat(4.), 1.);

		assert_eq!(
			apply_boolean(&mut document, &preferences, BooleanOp::Intersection, &[a]),
			Err(PathOpError::TooFewItems { needed: 2, found: 1 })
		);
		assert_eq!(
			apply_boolean(&mut document, &preferences, BooleanOp::Difference, &[a, b, c]),
			Err(PathOpError::TooManyItems { found: 3 })
		);
		assert_eq!(apply_boolean(&mut document, &preferences, BooleanOp::Union, &[]), Err(PathOpError::TooFewItems { needed: 1, found: 0 }));
		// Validation failures must leave the document untouched.
		assert!(document.contains(a) && document.contains(b) && document.contains(c));
	}

	#[test]
	fn degenerate_result_deletes_sources_without_error() {
		let mut document = Document::default();
		let preferences = SnapPreferences::default();
		let a = add_square(&mut document, DVec2::ZERO, 1.);
		let b = add_square(&mut document, DVec2::splat(10.), 1.);

		let result = apply_boolean(&mut document, &preferences, BooleanOp::Intersection, &[a, b]).unwrap();
		assert!(result.is_none());
		assert!(!document.contains(a) && !document.contains(b));
	}

	#[test]
	fn moveto_only_operand_produces_nothing() {
		let mut document = Document::default();
		let preferences = SnapPreferences::default();
		let point = document.add_path(
			None,
			Path {
				subpaths: vec![path_arrange::Subpath::new(DVec2::splat(3.), Vec::new(), false)],
			},
			Style::default(),
			DAffine2::IDENTITY,
		);

		let result = apply_boolean(&mut document, &preferences, BooleanOp::Union, &[point]).unwrap();
		assert!(result.is_none());
		assert!(!document.contains(point));
	}

	#[test]
	fn slice_splits_a_square_into_two_open_subpaths() {
		let mut document = Document::default();
		let preferences = SnapPreferences::default();
		let square = add_square(&mut document, DVec2::ZERO, 1.);
		let cutter = document.add_path(
			None,
			Path::new_line(DVec2::new(0.5, -1.), DVec2::new(0.5, 2.)),
			Style::default(),
			DAffine2::IDENTITY,
		);

		let result = apply_boolean(&mut document, &preferences, BooleanOp::Slice, &[square, cutter]).unwrap().unwrap();
		let path = document.local_outline(result).unwrap();
		assert_eq!(path.subpaths.len(), 2);
		assert!(path.subpaths.iter().all(|subpath| !subpath.closed));

		// The two crossing points appear among the subpath endpoints.
		let mut endpoints: Vec<DVec2> = Vec::new();
		for subpath in &path.subpaths {
			endpoints.push(subpath.anchor);
			endpoints.push(subpath.end_point());
		}
		for expected in [DVec2::new(0.5, 0.), DVec2::new(0.5, 1.)] {
			assert_eq!(endpoints.iter().filter(|point| point.abs_diff_eq(expected, 1e-6)).count(), 2);
		}
	}

	#[test]
	fn cut_divides_a_square_into_two_faces() {
		let mut document = Document::default();
		let preferences = SnapPreferences::default();
		let square = add_square(&mut document, DVec2::ZERO, 2.);
		let cutter = document.add_path(
			None,
			Path::new_line(DVec2::new(1., -1.), DVec2::new(1., 3.)),
			Style::default(),
			DAffine2::IDENTITY,
		);

		let result = apply_boolean(&mut document, &preferences, BooleanOp::Cut, &[square, cutter]).unwrap().unwrap();
		let path = document.local_outline(result).unwrap();
		assert_eq!(path.subpaths.len(), 2);
		for subpath in &path.subpaths {
			let piece = Path { subpaths: vec![subpath.clone()] };
			assert!((area(&piece) - 2.).abs() < 1e-6);
		}
	}

	#[test]
	fn outline_requires_a_stroke() {
		let mut document = Document::default();
		let item = add_square(&mut document, DVec2::ZERO, 1.);
		assert_eq!(outline_stroke(&mut document, item), Err(PathOpError::NoStroke));
		assert!(document.contains(item));
	}

	#[test]
	fn outline_replaces_the_item_with_the_stroke_shape() {
		let mut document = Document::default();
		let style = Style {
			fill_rule: FillRuleAttr::NonZero,
			stroke: Some(StrokeAttr { width: 0.2, ..Default::default() }),
		};
		let item = document.add_path(None, Path::new_line(DVec2::ZERO, DVec2::new(10., 0.)), style, DAffine2::IDENTITY);

		let replacement = outline_stroke(&mut document, item).unwrap().unwrap();
		assert!(!document.contains(item));
		let path = document.local_outline(replacement).unwrap();
		assert!((area(path) - 2.).abs() < 1e-6);
		assert!(document.style(replacement).unwrap().stroke.is_none());
	}

	#[test]
	fn offset_grows_and_shrinks_the_region() {
		let mut document = Document::default();
		let item = add_square(&mut document, DVec2::ZERO, 2.);

		let grown = offset_path(&mut document, item, 0.5).unwrap().unwrap();
		let grown_area = area(document.local_outline(grown).unwrap());
		assert!(grown_area > 4.);

		let shrunk = offset_path(&mut document, grown, -0.5).unwrap().unwrap();
		let shrunk_area = area(document.local_outline(shrunk).unwrap());
		assert!(shrunk_area < grown_area);
	}
}
