//! Geometric editing core: document model, snapping, and path operations.
//!
//! The [`document::Document`] scene graph feeds two subsystems. The
//! [`snapping`] module gathers candidate points and paths once per gesture and
//! answers free, constrained, and guide snap queries against them. The
//! [`path_ops`] module validates a selection, runs the arrangement engine from
//! the `path-arrange` crate on the document-space outlines, and writes the
//! result back as a new item.

pub mod consts;
pub mod document;
pub mod path_ops;
pub mod preferences;
pub mod snapping;
pub mod style;
