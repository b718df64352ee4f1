//! Core types for the plan preview library
//!
//! This module defines the small value types shared by the locators and the
//! previewer: the error type, search hits, and the unit conversion between
//! user-entered seconds and the plotted coordinate (minutes).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;

/// Number of seconds in one unit of the plotted coordinate
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Convert a TIME value entered in seconds into the plotted coordinate (minutes)
///
/// This is the only place the engine converts seconds. Everything that turns a
/// TIME duration, target or interval into a coordinate goes through here.
pub fn seconds_to_minutes(seconds: f64) -> f64 {
    seconds / SECONDS_PER_MINUTE
}

/// Errors that can occur while preparing or running a preview
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Signal '{signal}' referenced by '{owner}' is not in the driver profile")]
    UnresolvedSignal { owner: String, signal: String },

    #[error("Driver profile not found: {driver}/{profile}")]
    ProfileNotFound { driver: String, profile: String },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A single located point: coordinate on the plotted axis and signal value there
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub x: f64,
    pub y: f64,
}

impl Hit {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The output of a locator search: parallel lists of positions and values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    pub positions: Vec<f64>,
    pub values: Vec<f64>,
}

impl Hits {
    /// No hits
    pub fn none() -> Self {
        Self::default()
    }

    /// Exactly one hit
    pub fn single(hit: Hit) -> Self {
        Self {
            positions: vec![hit.x],
            values: vec![hit.y],
        }
    }

    pub fn push(&mut self, hit: Hit) {
        self.positions.push(hit.x);
        self.values.push(hit.y);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterate hits as (x, y) points
    pub fn iter(&self) -> impl Iterator<Item = Hit> + '_ {
        self.positions
            .iter()
            .zip(&self.values)
            .map(|(&x, &y)| Hit::new(x, y))
    }

    /// Convert into the shape reported to the sink
    ///
    /// Returns `None` when there are no hits, since the previewer makes no call
    /// for a trigger that never fires.
    pub fn into_points(self) -> Option<TriggerPoints> {
        match self.len() {
            0 => None,
            1 => Some(TriggerPoints::Single {
                x: self.positions[0],
                y: self.values[0],
            }),
            _ => Some(TriggerPoints::Multiple {
                xs: self.positions,
                ys: self.values,
            }),
        }
    }
}

impl FromIterator<Hit> for Hits {
    fn from_iter<T: IntoIterator<Item = Hit>>(iter: T) -> Self {
        let mut hits = Hits::none();
        for hit in iter {
            hits.push(hit);
        }
        hits
    }
}

/// Trigger points as reported to a sink: scalar for one hit, lists for several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerPoints {
    Single { x: f64, y: f64 },
    Multiple { xs: Vec<f64>, ys: Vec<f64> },
}

impl TriggerPoints {
    /// Number of points carried
    pub fn len(&self) -> usize {
        match self {
            TriggerPoints::Single { .. } => 1,
            TriggerPoints::Multiple { xs, .. } => xs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Degenerate-segment conditions reported through [`crate::PreviewSink::flag`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    /// The segment ends exactly where it starts
    ZeroWidthSegment,
    /// The segment's end condition is never met within the profile
    InfiniteSegment,
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagKind::ZeroWidthSegment => write!(f, "ZERO_WIDTH_SEGMENT"),
            FlagKind::InfiniteSegment => write!(f, "INFINITE_SEGMENT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_minutes() {
        assert_eq!(seconds_to_minutes(60.0), 1.0);
        assert_eq!(seconds_to_minutes(0.0), 0.0);
        assert!((seconds_to_minutes(25.0) - 25.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_hits_into_points() {
        assert_eq!(Hits::none().into_points(), None);

        let single = Hits::single(Hit::new(0.5, 2.0)).into_points();
        assert_eq!(single, Some(TriggerPoints::Single { x: 0.5, y: 2.0 }));

        let many: Hits = vec![Hit::new(0.1, 1.0), Hit::new(0.2, 2.0)]
            .into_iter()
            .collect();
        match many.into_points() {
            Some(TriggerPoints::Multiple { xs, ys }) => {
                assert_eq!(xs, vec![0.1, 0.2]);
                assert_eq!(ys, vec![1.0, 2.0]);
            }
            other => panic!("Expected multiple points, got {:?}", other),
        }
    }

    #[test]
    fn test_flag_kind_display() {
        assert_eq!(FlagKind::ZeroWidthSegment.to_string(), "ZERO_WIDTH_SEGMENT");
        assert_eq!(FlagKind::InfiniteSegment.to_string(), "INFINITE_SEGMENT");
    }
}
