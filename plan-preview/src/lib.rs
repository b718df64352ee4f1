//! Plan Preview Library
//!
//! A stateless, reusable engine that previews an experiment plan against a
//! recorded driver profile: where each segment ends and where each trigger
//! fires, reported to a plotting sink.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on the preview itself:
//! - Four pure locators (time/position × single/repeating) search a bounded
//!   interval of the plotted coordinate
//! - The previewer validates a whole plan up front, then walks its segments
//!   in order and reports through a [`PreviewSink`]
//! - The plotted coordinate is in minutes; TIME values are entered in seconds
//!
//! The library does NOT:
//! - Load plans or profiles from disk
//! - Render anything
//! - Execute plans against live hardware
//!
//! All higher-level functionality is in the application layer (plan-preview-cli).
//!
//! # Example Usage
//!
//! ```
//! use plan_preview::{
//!     Dataset, DriverProfile, InMemoryProfileProvider, Inequality, Plan, PlanPreviewer,
//!     RecordingSink, SegmentDescriptor, TriggerDescriptor,
//! };
//!
//! let profile = DriverProfile::new("furnace", "ramp").with_sequence(
//!     "temperature",
//!     Dataset::new(vec![0.0, 10.0], vec![20.0, 120.0]).unwrap(),
//! );
//! let provider = InMemoryProfileProvider::new().with_profile(profile);
//!
//! let plan = Plan::new("anneal")
//!     .with_driver("furnace", "ramp")
//!     .with_segment(
//!         SegmentDescriptor::position("heat", "temperature", Inequality::GreaterThan, 70.0)
//!             .with_trigger(TriggerDescriptor::repeating_time("snapshot", 60.0)),
//!     );
//!
//! let mut sink = RecordingSink::new();
//! let outcome = PlanPreviewer::new().update(&plan, &provider, &mut sink);
//!
//! assert!(outcome.is_completed());
//! assert_eq!(sink.segment_ends(), vec![("heat", 5.0)]);
//! ```

// Public modules
pub mod config;
pub mod locators;
pub mod plan;
pub mod previewer;
pub mod profile;
pub mod sink;
pub mod types;

// Re-export main types for convenience
pub use config::PreviewConfig;
pub use locators::Locator;
pub use plan::{
    DriverReference, ExecutionPolicy, Inequality, Plan, SegmentCondition, SegmentDescriptor,
    SignalReference, SignalSource, TriggerCondition, TriggerDescriptor,
};
pub use previewer::{PlanPreviewer, PreviewOutcome, ValidatedPlan};
pub use profile::{Dataset, DriverProfile, InMemoryProfileProvider, ProfileProvider};
pub use sink::{PreviewSink, RecordingSink, SinkCall};
pub use types::{
    seconds_to_minutes, FlagKind, Hit, Hits, PreviewError, Result, TriggerPoints,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an empty plan previews to nothing
        let mut sink = RecordingSink::new();
        let outcome = PlanPreviewer::new().update(
            &Plan::new("empty"),
            &InMemoryProfileProvider::new(),
            &mut sink,
        );
        assert!(outcome.is_completed());
        assert!(sink.is_empty());
    }
}
