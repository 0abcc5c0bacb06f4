//! Planar arrangement engine for vector paths.
//!
//! Paths are flattened into a winding-number-annotated arrangement of points
//! and edges ([`Shape`]), combined with boolean operators, then converted back
//! to explicit paths with their curve geometry reconstructed from back data.
//! On top of the same machinery sit cut and slice (which are not true set
//! operations) and stroke outlining / offsetting.

mod aabb;
mod boolean;
mod epsilons;
mod flatten;
mod forme;
mod grid;
mod line_segment;
mod offset;
mod path;
mod path_command;
#[cfg(feature = "parsing")]
mod path_data;
mod path_segment;
mod positions;
mod shape;
mod vector;

pub use aabb::Aabb;
pub use boolean::{BooleanOp, CutPosition, boolean_shapes, fold_boolean, slice};
pub use epsilons::{EPS, Epsilons};
pub use flatten::{BackData, FlatEdge, FlatPath, flatten_path};
pub use forme::{convert_to_forme, convert_to_forme_nested};
pub use offset::{CapType, JoinType, MIN_OFFSET_WIDTH, StrokeStyle, make_offset, outline};
pub use path::{Path, Subpath, path_from_commands, path_to_commands};
pub use path_command::{AbsolutePathCommand, PathCommand, RelativePathCommand};
#[cfg(feature = "parsing")]
pub use path_data::{PathDataError, path_from_path_data, path_to_path_data};
pub use path_segment::PathSegment;
pub use positions::convert_positions_to_moveto;
pub use shape::{FillRule, Shape};
pub use vector::Vector;
