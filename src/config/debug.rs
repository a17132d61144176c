//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so release
//! builds remain quiet.

/// Emit per-cycle fetch summaries (bars per instrument, elapsed time).
pub const PRINT_FETCH_CYCLE: bool = true;

/// Emit the bar range of every series before it is rendered.
pub const PRINT_SERIES_RANGE: bool = false;

/// Emit every detection (label, confidence, box) after each inference.
pub const PRINT_DETECTIONS: bool = false;

/// Emit inference timings for the viewer and capture loops.
pub const PRINT_INFERENCE_TIMINGS: bool = false;

/// Emit shutdown messages.
pub const PRINT_SHUTDOWN: bool = true;
