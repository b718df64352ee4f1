//! Previewer configuration types
//!
//! This module defines the small set of options the previewer understands.
//! Plan content itself is never configured here; these only tune how
//! degenerate segments are reported.

use serde::{Deserialize, Serialize};

/// Configuration for the plan previewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Whether a zero-width segment still gets `mark_segment_end` after its flag
    #[serde(default = "default_true")]
    pub mark_zero_width_segments: bool,

    /// Largest `|segment_end - cursor|` still treated as zero width (default: exact)
    #[serde(default)]
    pub zero_width_tolerance: f64,
}

fn default_true() -> bool {
    true
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            mark_zero_width_segments: true,
            zero_width_tolerance: 0.0,
        }
    }
}

impl PreviewConfig {
    /// Create a new previewer configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: mark the end of zero-width segments or only flag them
    pub fn with_zero_width_marks(mut self, enabled: bool) -> Self {
        self.mark_zero_width_segments = enabled;
        self
    }

    /// Builder method: set the zero-width tolerance (magnitude is used)
    pub fn with_zero_width_tolerance(mut self, tolerance: f64) -> Self {
        self.zero_width_tolerance = tolerance.abs();
        self
    }

    /// Check if a segment spanning `[start, end]` counts as zero width
    pub fn is_zero_width(&self, start: f64, end: f64) -> bool {
        (end - start).abs() <= self.zero_width_tolerance.abs()
    }
}
