//! Reporting sink
//!
//! The previewer's only side effects are calls into a [`PreviewSink`]. A GUI
//! would draw them; [`RecordingSink`] keeps them in order for reports and
//! tests.

use crate::types::{FlagKind, TriggerPoints};
use serde::{Deserialize, Serialize};

/// Receiver of preview results
///
/// All calls are one-way. Implementations must not assume any call is
/// followed by another; an aborted preview makes no calls at all.
pub trait PreviewSink {
    /// A segment ends at `x`
    fn mark_segment_end(&mut self, name: &str, x: f64);

    /// A trigger fires at one or more points
    fn plot_trigger_points(&mut self, name: &str, points: TriggerPoints);

    /// A segment is degenerate at `x`
    fn flag(&mut self, name: &str, kind: FlagKind, x: f64);
}

impl<S: PreviewSink + ?Sized> PreviewSink for &mut S {
    fn mark_segment_end(&mut self, name: &str, x: f64) {
        (**self).mark_segment_end(name, x)
    }

    fn plot_trigger_points(&mut self, name: &str, points: TriggerPoints) {
        (**self).plot_trigger_points(name, points)
    }

    fn flag(&mut self, name: &str, kind: FlagKind, x: f64) {
        (**self).flag(name, kind, x)
    }
}

/// One recorded sink call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SinkCall {
    MarkSegmentEnd {
        name: String,
        x: f64,
    },
    PlotTriggerPoints {
        name: String,
        #[serde(flatten)]
        points: TriggerPoints,
    },
    Flag {
        name: String,
        kind: FlagKind,
        x: f64,
    },
}

impl SinkCall {
    /// Name of the segment or trigger the call is about
    pub fn name(&self) -> &str {
        match self {
            SinkCall::MarkSegmentEnd { name, .. }
            | SinkCall::PlotTriggerPoints { name, .. }
            | SinkCall::Flag { name, .. } => name,
        }
    }
}

/// Sink that records every call in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<SinkCall> {
        self.calls
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Segment end coordinates in the order they were marked
    pub fn segment_ends(&self) -> Vec<(&str, f64)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::MarkSegmentEnd { name, x } => Some((name.as_str(), *x)),
                _ => None,
            })
            .collect()
    }

    /// Points plotted for the named trigger, if any
    pub fn trigger_points(&self, trigger: &str) -> Option<&TriggerPoints> {
        self.calls.iter().find_map(|call| match call {
            SinkCall::PlotTriggerPoints { name, points } if name == trigger => Some(points),
            _ => None,
        })
    }

    /// All flags raised, in order
    pub fn flags(&self) -> Vec<(&str, FlagKind, f64)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Flag { name, kind, x } => Some((name.as_str(), *kind, *x)),
                _ => None,
            })
            .collect()
    }
}

impl PreviewSink for RecordingSink {
    fn mark_segment_end(&mut self, name: &str, x: f64) {
        self.calls.push(SinkCall::MarkSegmentEnd {
            name: name.to_string(),
            x,
        });
    }

    fn plot_trigger_points(&mut self, name: &str, points: TriggerPoints) {
        self.calls.push(SinkCall::PlotTriggerPoints {
            name: name.to_string(),
            points,
        });
    }

    fn flag(&mut self, name: &str, kind: FlagKind, x: f64) {
        self.calls.push(SinkCall::Flag {
            name: name.to_string(),
            kind,
            x,
        });
    }
}
