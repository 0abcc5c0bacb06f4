//! Tuning constants of the snapping and path-operation subsystems.

// Default snap tolerance, in screen pixels (divided by zoom before use).
pub const SNAP_DEFAULT_TOLERANCE: f64 = 10.;
// Sentinel tolerance meaning "always snap to the nearest point, whatever the distance".
pub const SNAP_ALWAYS_TOLERANCE: f64 = 10_000.;

// Candidate collection stops (with a warning) once this many items are gathered.
pub const MAX_SNAP_CANDIDATES: usize = 200;
// Items with more path nodes than this are excluded from path snapping (their
// bbox and node snapping stay available).
pub const MAX_SNAP_PATH_NODES: usize = 500;
// Text runs longer than this are likewise excluded from path snapping.
pub const MAX_SNAP_TEXT_LENGTH: usize = 240;

// Coincidence epsilon for matching segment endpoints against the unselected-node
// list while node-editing. Exactly coincident stationary nodes can false-positive
// at this scale; that ambiguity is long-standing and left as is.
pub const UNSELECTED_NODE_EPSILON: f64 = 1e-4;

// Handles closer than this to their anchor count as retracted when classifying
// smooth nodes.
pub const RETRACTED_HANDLE_EPSILON: f64 = 1e-6;
