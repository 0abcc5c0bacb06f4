use glam::{DAffine2, DVec2};
use path_arrange::{Aabb, Path};
use slotmap::{SlotMap, new_key_type};

use crate::style::Style;

new_key_type! {
	pub struct ItemId;
}

#[derive(Clone, Debug)]
pub enum ItemKind {
	Group { children: Vec<ItemId> },
	Path { path: Path, style: Style },
	/// Text carries its pre-shaped outline; layout itself happens elsewhere.
	Text { content: String, outline: Path, style: Style },
	/// A live reference to another item, drawn under this item's transform.
	Clone { reference: ItemId },
}

#[derive(Clone, Debug)]
pub struct Item {
	pub kind: ItemKind,
	pub transform: DAffine2,
	pub hidden: bool,
	pub clip: Option<ItemId>,
	pub mask: Option<ItemId>,
	pub(crate) parent: Option<ItemId>,
}

/// An infinite guide line through `origin`.
#[derive(Clone, Copy, Debug)]
pub struct Guide {
	pub origin: DVec2,
	pub direction: DVec2,
}

/// The scene graph the geometry core reads: a tree of items plus the page.
/// Child order within a group is z-order, bottom first.
#[derive(Clone, Debug)]
pub struct Document {
	items: SlotMap<ItemId, Item>,
	root: Vec<ItemId>,
	pub page_size: DVec2,
	pub guides: Vec<Guide>,
}

impl Default for Document {
	fn default() -> Self {
		Document {
			items: SlotMap::with_key(),
			root: Vec::new(),
			page_size: DVec2::new(210., 297.),
			guides: Vec::new(),
		}
	}
}

impl Document {
	pub fn new(page_size: DVec2) -> Self {
		Document { page_size, ..Default::default() }
	}

	fn add_item(&mut self, parent: Option<ItemId>, kind: ItemKind, transform: DAffine2) -> ItemId {
		let id = self.items.insert(Item {
			kind,
			transform,
			hidden: false,
			clip: None,
			mask: None,
			parent,
		});
		match parent {
			Some(parent) => {
				if let ItemKind::Group { children } = &mut self.items[parent].kind {
					children.push(id);
				}
			}
			None => self.root.push(id),
		}
		id
	}

	pub fn add_group(&mut self, parent: Option<ItemId>, transform: DAffine2) -> ItemId {
		self.add_item(parent, ItemKind::Group { children: Vec::new() }, transform)
	}

	pub fn add_path(&mut self, parent: Option<ItemId>, path: Path, style: Style, transform: DAffine2) -> ItemId {
		self.add_item(parent, ItemKind::Path { path, style }, transform)
	}

	pub fn add_text(&mut self, parent: Option<ItemId>, content: impl Into<String>, outline: Path, style: Style, transform: DAffine2) -> ItemId {
		self.add_item(
			parent,
			ItemKind::Text {
				content: content.into(),
				outline,
				style,
			},
			transform,
		)
	}

	pub fn add_clone(&mut self, parent: Option<ItemId>, reference: ItemId, transform: DAffine2) -> ItemId {
		self.add_item(parent, ItemKind::Clone { reference }, transform)
	}

	pub fn item(&self, id: ItemId) -> &Item {
		&self.items[id]
	}

	pub fn item_mut(&mut self, id: ItemId) -> &mut Item {
		&mut self.items[id]
	}

	pub fn contains(&self, id: ItemId) -> bool {
		self.items.contains_key(id)
	}

	pub fn root_items(&self) -> &[ItemId] {
		&self.root
	}

	/// Cumulative transform from the item's local space to document space.
	pub fn transform_to_document(&self, id: ItemId) -> DAffine2 {
		let item = &self.items[id];
		match item.parent {
			Some(parent) => self.transform_to_document(parent) * item.transform,
			None => item.transform,
		}
	}

	/// Follows clone references to the ultimate concrete item.
	pub fn resolve_clone(&self, mut id: ItemId) -> ItemId {
		// A cycle would mean a corrupt document; bail out after a sane depth.
		for _ in 0..64 {
			match &self.items[id].kind {
				ItemKind::Clone { reference } if self.items.contains_key(*reference) => id = *reference,
				_ => return id,
			}
		}
		id
	}

	/// Item outline in its local space, if the item has one of its own.
	pub fn local_outline(&self, id: ItemId) -> Option<&Path> {
		match &self.items[self.resolve_clone(id)].kind {
			ItemKind::Path { path, .. } => Some(path),
			ItemKind::Text { outline, .. } => Some(outline),
			ItemKind::Group { .. } | ItemKind::Clone { .. } => None,
		}
	}

	/// Item outline in document space, under an optional extra affine (used
	/// when the item is visited as a clip or mask source).
	pub fn outline_in_document(&self, id: ItemId, extra: DAffine2) -> Option<Path> {
		let outline = self.local_outline(id)?;
		Some(outline.apply_affine(extra * self.transform_to_document(id)))
	}

	pub fn style(&self, id: ItemId) -> Option<&Style> {
		match &self.items[self.resolve_clone(id)].kind {
			ItemKind::Path { style, .. } | ItemKind::Text { style, .. } => Some(style),
			_ => None,
		}
	}

	pub fn text_length(&self, id: ItemId) -> usize {
		match &self.items[self.resolve_clone(id)].kind {
			ItemKind::Text { content, .. } => content.chars().count(),
			_ => 0,
		}
	}

	pub fn bounding_box(&self, id: ItemId, extra: DAffine2) -> Option<Aabb> {
		match &self.items[id].kind {
			ItemKind::Group { children } => {
				let mut bbox: Option<Aabb> = None;
				for &child in children {
					if let Some(child_bbox) = self.bounding_box(child, extra) {
						bbox = Some(match bbox {
							Some(existing) => existing.merge(&child_bbox),
							None => child_bbox,
						});
					}
				}
				bbox
			}
			ItemKind::Clone { .. } | ItemKind::Path { .. } | ItemKind::Text { .. } => self.outline_in_document(id, extra).and_then(|path| path.bounding_box()),
		}
	}

	pub fn page_border(&self) -> Path {
		Path::new_rect(DVec2::ZERO, self.page_size)
	}

	pub fn page_corners(&self) -> [DVec2; 4] {
		[
			DVec2::ZERO,
			DVec2::new(self.page_size.x, 0.),
			self.page_size,
			DVec2::new(0., self.page_size.y),
		]
	}

	/// All items in depth-first document order (bottom of the z-order first).
	pub fn document_order(&self) -> Vec<ItemId> {
		let mut order = Vec::with_capacity(self.items.len());
		let mut stack: Vec<ItemId> = self.root.iter().rev().copied().collect();
		while let Some(id) = stack.pop() {
			order.push(id);
			if let ItemKind::Group { children } = &self.items[id].kind {
				stack.extend(children.iter().rev());
			}
		}
		order
	}

	pub fn z_index(&self, id: ItemId) -> Option<usize> {
		self.document_order().iter().position(|&candidate| candidate == id)
	}

	/// Removes an item (and, for groups, its subtree) from the document.
	pub fn delete_item(&mut self, id: ItemId) {
		let Some(item) = self.items.remove(id) else { return };
		match item.parent {
			Some(parent) => {
				if let Some(parent_item) = self.items.get_mut(parent) {
					if let ItemKind::Group { children } = &mut parent_item.kind {
						children.retain(|&child| child != id);
					}
				}
			}
			None => self.root.retain(|&root| root != id),
		}
		if let ItemKind::Group { children } = item.kind {
			let mut pending = children;
			while let Some(child) = pending.pop() {
				if let Some(child_item) = self.items.remove(child) {
					if let ItemKind::Group { children } = child_item.kind {
						pending.extend(children);
					}
				}
			}
		}
	}

	/// Inserts a path item at the z position of `reference` (same parent, same
	/// index), inheriting nothing else. Used when a boolean result replaces
	/// its sources.
	pub fn insert_path_at(&mut self, reference: ItemId, path: Path, style: Style, transform: DAffine2) -> ItemId {
		let parent = self.items[reference].parent;
		let id = self.items.insert(Item {
			kind: ItemKind::Path { path, style },
			transform,
			hidden: false,
			clip: None,
			mask: None,
			parent,
		});
		let siblings = match parent {
			Some(parent) => match &mut self.items[parent].kind {
				ItemKind::Group { children } => children,
				_ => &mut self.root,
			},
			None => &mut self.root,
		};
		let index = siblings.iter().position(|&sibling| sibling == reference).map(|i| i + 1).unwrap_or(siblings.len());
		siblings.insert(index, id);
		id
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use glam::DVec2;
	use pretty_assertions::assert_eq;

	fn square() -> Path {
		Path::new_rect(DVec2::ZERO, DVec2::splat(1.))
	}

	#[test]
	fn transforms_compose_through_groups() {
		let mut document = Document::default();
		let group = document.add_group(None, DAffine2::from_translation(DVec2::new(10., 0.)));
		let item = document.add_path(Some(group), square(), Style::default(), DAffine2::from_translation(DVec2::new(0., 5.)));

		let bbox = document.bounding_box(item, DAffine2::IDENTITY).unwrap();
		assert!(bbox.min().abs_diff_eq(DVec2::new(10., 5.), 1e-12));
		assert!(bbox.max().abs_diff_eq(DVec2::new(11., 6.), 1e-12));
	}

	#[test]
	fn clones_resolve_to_their_root() {
		let mut document = Document::default();
		let original = document.add_path(None, square(), Style::default(), DAffine2::IDENTITY);
		let clone = document.add_clone(None, original, DAffine2::from_translation(DVec2::splat(3.)));
		let clone_of_clone = document.add_clone(None, clone, DAffine2::IDENTITY);

		assert_eq!(document.resolve_clone(clone_of_clone), original);
		let bbox = document.bounding_box(clone, DAffine2::IDENTITY).unwrap();
		assert!(bbox.min().abs_diff_eq(DVec2::splat(3.), 1e-12));
	}

	#[test]
	fn deletion_updates_z_order() {
		let mut document = Document::default();
		let a = document.add_path(None, square(), Style::default(), DAffine2::IDENTITY);
		let b = document.add_path(None, square(), Style::default(), DAffine2::IDENTITY);
		assert!(document.z_index(a) < document.z_index(b));

		document.delete_item(a);
		assert!(!document.contains(a));
		assert_eq!(document.z_index(b), Some(0));
	}

	#[test]
	fn deleting_a_group_removes_the_whole_subtree() {
		let mut document = Document::default();
		let outer = document.add_group(None, DAffine2::IDENTITY);
		let inner = document.add_group(Some(outer), DAffine2::IDENTITY);
		let leaf = document.add_path(Some(inner), square(), Style::default(), DAffine2::IDENTITY);

		document.delete_item(outer);
		assert!(!document.contains(outer));
		assert!(!document.contains(inner));
		assert!(!document.contains(leaf));
		assert!(document.document_order().is_empty());
	}

	#[test]
	fn insert_at_reference_keeps_position() {
		let mut document = Document::default();
		let a = document.add_path(None, square(), Style::default(), DAffine2::IDENTITY);
		let b = document.add_path(None, square(), Style::default(), DAffine2::IDENTITY);
		let inserted = document.insert_path_at(a, square(), Style::default(), DAffine2::IDENTITY);

		let order = document.document_order();
		assert_eq!(order, vec![a, inserted, b]);
	}
}
