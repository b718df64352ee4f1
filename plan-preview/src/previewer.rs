//! Plan previewer
//!
//! Turns a plan and its driver profile into an ordered series of sink calls.
//! Every `update()` runs in two phases:
//!
//! 1. **Validate** - fetch the profile (only if the plan names one), check the
//!    descriptors and resolve every signal reference into a [`ValidatedPlan`].
//!    Any failure aborts the update before the sink is touched.
//! 2. **Execute** - fold over the validated segments with the cursor as the
//!    accumulator, reporting segment ends, degenerate-segment flags and
//!    trigger points.
//!
//! The previewer keeps no state between updates; the same inputs always
//! produce the same calls in the same order.

use crate::config::PreviewConfig;
use crate::locators::{position, Locator};
use crate::plan::{Inequality, Plan, SegmentCondition, SegmentDescriptor, TriggerDescriptor};
use crate::profile::{Dataset, DriverProfile, ProfileProvider};
use crate::sink::PreviewSink;
use crate::types::{seconds_to_minutes, FlagKind, PreviewError, Result};
use std::ops::ControlFlow;
use std::sync::Arc;

/// How an `update()` finished
#[derive(Debug)]
pub enum PreviewOutcome {
    /// Every segment was walked
    Completed {
        /// Number of segments reported
        segments: usize,
        /// Cursor after the last segment
        end: f64,
    },
    /// A segment never ends; it and everything after it were skipped
    Halted {
        /// The unterminated segment
        segment: String,
        /// Cursor where it starts
        at: f64,
    },
    /// Validation failed; the sink received no calls
    Aborted(PreviewError),
}

impl PreviewOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PreviewOutcome::Completed { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, PreviewOutcome::Aborted(_))
    }
}

/// How a segment's end is found
#[derive(Debug, Clone, Copy)]
enum SegmentEnd<'a> {
    /// Fixed duration in seconds
    Duration(f64),
    /// First crossing of a threshold in a signal
    Threshold {
        data: &'a Dataset,
        inequality: Inequality,
        threshold: f64,
    },
}

/// A segment with every reference resolved against the profile
#[derive(Debug)]
struct ResolvedSegment<'a> {
    name: &'a str,
    end: SegmentEnd<'a>,
    triggers: Vec<(&'a str, Locator<'a>)>,
}

/// A plan whose signal references have all been resolved
///
/// Only [`PlanPreviewer::validate`] builds one, so holding a `ValidatedPlan`
/// means the plan can be executed without further checks.
#[derive(Debug)]
pub struct ValidatedPlan<'a> {
    segments: Vec<ResolvedSegment<'a>>,
    domain_end: Option<f64>,
}

impl ValidatedPlan<'_> {
    /// Number of segments in the plan
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// The plan preview engine
#[derive(Debug, Clone, Default)]
pub struct PlanPreviewer {
    config: PreviewConfig,
}

impl PlanPreviewer {
    /// Create a previewer with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a previewer with the given settings
    pub fn with_config(config: PreviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Preview `plan`, fetching its driver profile from `provider`
    ///
    /// The provider is consulted once, and only if the plan names a driver.
    /// Failing to fetch the profile aborts the update like any other
    /// validation failure.
    pub fn update<P, S>(&self, plan: &Plan, provider: &P, sink: &mut S) -> PreviewOutcome
    where
        P: ProfileProvider + ?Sized,
        S: PreviewSink + ?Sized,
    {
        let profile: Option<Arc<DriverProfile>> = match &plan.driver {
            Some(reference) => match provider.profile(&reference.driver, &reference.profile) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    log::warn!("Preview of '{}' aborted: {}", plan.name, e);
                    return PreviewOutcome::Aborted(e);
                }
            },
            None => None,
        };
        self.preview(plan, profile.as_deref(), sink)
    }

    /// Preview `plan` against an already fetched profile
    pub fn preview<S>(
        &self,
        plan: &Plan,
        profile: Option<&DriverProfile>,
        sink: &mut S,
    ) -> PreviewOutcome
    where
        S: PreviewSink + ?Sized,
    {
        match self.validate(plan, profile) {
            Ok(validated) => self.execute(&validated, sink),
            Err(e) => {
                log::warn!("Preview of '{}' aborted: {}", plan.name, e);
                PreviewOutcome::Aborted(e)
            }
        }
    }

    /// Check the plan and resolve every signal reference against `profile`
    ///
    /// # Errors
    /// Returns `InvalidDescriptor` for malformed descriptors and
    /// `UnresolvedSignal` for the first reference missing from the profile.
    pub fn validate<'a>(
        &self,
        plan: &'a Plan,
        profile: Option<&'a DriverProfile>,
    ) -> Result<ValidatedPlan<'a>> {
        plan.validate_descriptors()?;

        let segments = plan
            .segments
            .iter()
            .map(|segment| resolve_segment(segment, profile))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Plan '{}' validated: {} segments, {} signal references",
            plan.name,
            segments.len(),
            plan.signal_references().len()
        );
        Ok(ValidatedPlan {
            segments,
            domain_end: profile.and_then(DriverProfile::domain_end),
        })
    }

    /// Walk a validated plan and report to `sink`
    pub fn execute<S>(&self, plan: &ValidatedPlan<'_>, sink: &mut S) -> PreviewOutcome
    where
        S: PreviewSink + ?Sized,
    {
        let walk = plan.segments.iter().try_fold(0.0_f64, |cursor, segment| {
            self.walk_segment(segment, cursor, plan.domain_end, &mut *sink)
        });

        match walk {
            ControlFlow::Continue(end) => PreviewOutcome::Completed {
                segments: plan.segments.len(),
                end,
            },
            ControlFlow::Break((segment, at)) => PreviewOutcome::Halted { segment, at },
        }
    }

    /// Report one segment starting at `cursor`, returning the next cursor
    fn walk_segment<S>(
        &self,
        segment: &ResolvedSegment<'_>,
        cursor: f64,
        domain_end: Option<f64>,
        sink: &mut S,
    ) -> ControlFlow<(String, f64), f64>
    where
        S: PreviewSink + ?Sized,
    {
        let Some(end) = segment_end(segment.end, cursor, domain_end) else {
            log::warn!(
                "Segment '{}' never ends after x={}; skipping the rest of the plan",
                segment.name,
                cursor
            );
            sink.flag(segment.name, FlagKind::InfiniteSegment, cursor);
            return ControlFlow::Break((segment.name.to_string(), cursor));
        };
        log::debug!("Segment '{}' spans [{}, {}]", segment.name, cursor, end);

        let zero_width = self.config.is_zero_width(cursor, end);
        if zero_width {
            sink.flag(segment.name, FlagKind::ZeroWidthSegment, end);
        }
        if !zero_width || self.config.mark_zero_width_segments {
            sink.mark_segment_end(segment.name, end);
        }

        for (name, locator) in &segment.triggers {
            let hits = locator.search(cursor, end);
            log::trace!("Trigger '{}' in '{}': {} hits", name, segment.name, hits.len());
            if let Some(points) = hits.into_points() {
                sink.plot_trigger_points(name, points);
            }
        }

        ControlFlow::Continue(end)
    }
}

/// Where a segment starting at `cursor` ends, or `None` if it never does
fn segment_end(end: SegmentEnd<'_>, cursor: f64, domain_end: Option<f64>) -> Option<f64> {
    match end {
        SegmentEnd::Duration(seconds) => Some(cursor + seconds_to_minutes(seconds)),
        SegmentEnd::Threshold {
            data,
            inequality,
            threshold,
        } => position::threshold(data, inequality, threshold, cursor, domain_end?).map(|hit| hit.x),
    }
}

fn lookup<'a>(
    profile: Option<&'a DriverProfile>,
    owner: &str,
    signal: &str,
) -> Result<&'a Dataset> {
    profile
        .and_then(|p| p.sequence(signal))
        .ok_or_else(|| PreviewError::UnresolvedSignal {
            owner: owner.to_string(),
            signal: signal.to_string(),
        })
}

fn resolve_segment<'a>(
    segment: &'a SegmentDescriptor,
    profile: Option<&'a DriverProfile>,
) -> Result<ResolvedSegment<'a>> {
    let (end, watched) = match &segment.condition {
        SegmentCondition::Time { duration } => (SegmentEnd::Duration(*duration), None),
        SegmentCondition::Position {
            variable_name,
            inequality,
            threshold,
        } => {
            let data = lookup(profile, &segment.name, variable_name)?;
            let end = SegmentEnd::Threshold {
                data,
                inequality: *inequality,
                threshold: *threshold,
            };
            (end, Some(data))
        }
    };

    // TIME triggers plot against the segment's own signal, or the profile's first
    let time_base = watched.or_else(|| profile.and_then(DriverProfile::primary_sequence));

    let triggers = segment
        .triggers
        .iter()
        .map(|trigger| resolve_trigger(trigger, profile, time_base))
        .collect::<Result<Vec<_>>>()?;

    Ok(ResolvedSegment {
        name: &segment.name,
        end,
        triggers,
    })
}

fn resolve_trigger<'a>(
    trigger: &'a TriggerDescriptor,
    profile: Option<&'a DriverProfile>,
    time_base: Option<&'a Dataset>,
) -> Result<(&'a str, Locator<'a>)> {
    let data = match trigger.condition.variable_name() {
        Some(signal) => Some(lookup(profile, &trigger.name, signal)?),
        None => time_base,
    };
    let locator = Locator::new(&trigger.condition, data).ok_or_else(|| {
        PreviewError::InvalidDescriptor(format!("trigger '{}' has no data to search", trigger.name))
    })?;
    Ok((&trigger.name, locator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::InMemoryProfileProvider;
    use crate::sink::{RecordingSink, SinkCall};
    use crate::types::TriggerPoints;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn furnace() -> DriverProfile {
        // Temperature ramps 0 -> 100 over 10 minutes, holds, then cools by 20
        let xs = vec![0.0, 10.0, 20.0, 30.0];
        DriverProfile::new("furnace", "ramp")
            .with_sequence(
                "temperature",
                Dataset::new(xs.clone(), vec![0.0, 100.0, 100.0, 80.0]).unwrap(),
            )
            .with_sequence("pressure", Dataset::new(xs, vec![1.0, 1.0, 2.0, 2.0]).unwrap())
    }

    fn provider() -> InMemoryProfileProvider {
        InMemoryProfileProvider::new().with_profile(furnace())
    }

    #[test]
    fn test_time_only_plan_without_driver() {
        let plan = Plan::new("timed")
            .with_segment(SegmentDescriptor::time("first", 90.0))
            .with_segment(SegmentDescriptor::time("second", 30.0));

        let mut sink = RecordingSink::new();
        let outcome = PlanPreviewer::new().update(&plan, &InMemoryProfileProvider::new(), &mut sink);

        assert!(outcome.is_completed());
        assert_eq!(sink.segment_ends(), vec![("first", 1.5), ("second", 2.0)]);
    }

    #[test]
    fn test_position_segment_ends_at_threshold() {
        let plan = Plan::new("heat")
            .with_driver("furnace", "ramp")
            .with_segment(SegmentDescriptor::position(
                "heat",
                "temperature",
                Inequality::GreaterThan,
                100.0,
            ))
            .with_segment(SegmentDescriptor::position(
                "cool",
                "temperature",
                Inequality::LessThan,
                90.0,
            ));

        let mut sink = RecordingSink::new();
        let outcome = PlanPreviewer::new().update(&plan, &provider(), &mut sink);

        assert!(outcome.is_completed());
        let ends = sink.segment_ends();
        assert_eq!(ends.len(), 2);
        assert_close(ends[0].1, 10.0);
        assert_close(ends[1].1, 25.0);
    }

    #[test]
    fn test_infinite_segment_halts_plan() {
        let plan = Plan::new("stuck")
            .with_driver("furnace", "ramp")
            .with_segment(SegmentDescriptor::time("warmup", 60.0))
            .with_segment(
                SegmentDescriptor::position("overheat", "temperature", Inequality::GreaterThan, 500.0)
                    .with_trigger(TriggerDescriptor::single_time("never", 1.0)),
            )
            .with_segment(SegmentDescriptor::time("after", 60.0));

        let mut sink = RecordingSink::new();
        let outcome = PlanPreviewer::new().update(&plan, &provider(), &mut sink);

        match outcome {
            PreviewOutcome::Halted { segment, at } => {
                assert_eq!(segment, "overheat");
                assert_close(at, 1.0);
            }
            other => panic!("Expected Halted, got {:?}", other),
        }
        assert_eq!(
            sink.calls(),
            &[
                SinkCall::MarkSegmentEnd {
                    name: "warmup".to_string(),
                    x: 1.0
                },
                SinkCall::Flag {
                    name: "overheat".to_string(),
                    kind: FlagKind::InfiniteSegment,
                    x: 1.0
                },
            ]
        );
    }

    #[test]
    fn test_zero_width_segment_flagged_then_marked() {
        let plan = Plan::new("zero")
            .with_segment(SegmentDescriptor::time("first", 60.0))
            .with_segment(SegmentDescriptor::time("instant", 0.0));

        let mut sink = RecordingSink::new();
        PlanPreviewer::new().update(&plan, &InMemoryProfileProvider::new(), &mut sink);

        assert_eq!(sink.flags(), vec![("instant", FlagKind::ZeroWidthSegment, 1.0)]);
        assert_eq!(sink.segment_ends(), vec![("first", 1.0), ("instant", 1.0)]);
    }

    #[test]
    fn test_zero_width_marks_can_be_disabled() {
        let plan = Plan::new("zero").with_segment(SegmentDescriptor::time("instant", 0.0));
        let previewer = PlanPreviewer::with_config(PreviewConfig::new().with_zero_width_marks(false));

        let mut sink = RecordingSink::new();
        previewer.update(&plan, &InMemoryProfileProvider::new(), &mut sink);

        assert_eq!(sink.flags(), vec![("instant", FlagKind::ZeroWidthSegment, 0.0)]);
        assert!(sink.segment_ends().is_empty());
    }

    #[test]
    fn test_unresolved_signal_aborts_without_calls() {
        let plan = Plan::new("bad")
            .with_driver("furnace", "ramp")
            .with_segment(SegmentDescriptor::time("ok", 60.0))
            .with_segment(
                SegmentDescriptor::time("also_ok", 60.0)
                    .with_trigger(TriggerDescriptor::single_position("t", "Unknown", 1.0, 0.1)),
            );

        let mut sink = RecordingSink::new();
        let outcome = PlanPreviewer::new().update(&plan, &provider(), &mut sink);

        match outcome {
            PreviewOutcome::Aborted(PreviewError::UnresolvedSignal { owner, signal }) => {
                assert_eq!(owner, "t");
                assert_eq!(signal, "Unknown");
            }
            other => panic!("Expected UnresolvedSignal, got {:?}", other),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_position_reference_without_driver_aborts() {
        let plan = Plan::new("no_driver").with_segment(SegmentDescriptor::position(
            "heat",
            "temperature",
            Inequality::GreaterThan,
            50.0,
        ));

        let mut sink = RecordingSink::new();
        let outcome = PlanPreviewer::new().update(&plan, &provider(), &mut sink);

        assert!(outcome.is_aborted());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_missing_profile_aborts() {
        let plan = Plan::new("missing")
            .with_driver("furnace", "other")
            .with_segment(SegmentDescriptor::time("s", 60.0));

        let mut sink = RecordingSink::new();
        let outcome = PlanPreviewer::new().update(&plan, &provider(), &mut sink);

        assert!(matches!(
            outcome,
            PreviewOutcome::Aborted(PreviewError::ProfileNotFound { .. })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_malformed_descriptor_aborts() {
        let plan = Plan::new("negative").with_segment(SegmentDescriptor::time("s", -60.0));

        let mut sink = RecordingSink::new();
        let outcome = PlanPreviewer::new().update(&plan, &provider(), &mut sink);

        assert!(matches!(
            outcome,
            PreviewOutcome::Aborted(PreviewError::InvalidDescriptor(_))
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_triggers_searched_over_their_segment() {
        let plan = Plan::new("triggers")
            .with_driver("furnace", "ramp")
            .with_segment(SegmentDescriptor::time("idle", 300.0))
            .with_segment(
                SegmentDescriptor::position("heat", "temperature", Inequality::GreaterThan, 100.0)
                    .with_trigger(TriggerDescriptor::single_time("once", 60.0))
                    .with_trigger(TriggerDescriptor::repeating_time("every_two", 120.0))
                    .with_trigger(TriggerDescriptor::single_position("at_80", "temperature", 80.0, 0.0))
                    .with_trigger(TriggerDescriptor::single_position("never", "pressure", 5.0, 0.0)),
            );

        let mut sink = RecordingSink::new();
        PlanPreviewer::new().update(&plan, &provider(), &mut sink);

        // "heat" spans [5, 10]
        assert_eq!(sink.segment_ends(), vec![("idle", 5.0), ("heat", 10.0)]);

        // TIME trigger plotted against the segment's own signal
        assert_eq!(
            sink.trigger_points("once"),
            Some(&TriggerPoints::Single { x: 6.0, y: 60.0 })
        );
        match sink.trigger_points("every_two") {
            Some(TriggerPoints::Multiple { xs, ys }) => {
                assert_eq!(xs, &vec![7.0, 9.0]);
                assert_eq!(ys, &vec![70.0, 90.0]);
            }
            other => panic!("Expected two points, got {:?}", other),
        }
        assert_eq!(
            sink.trigger_points("at_80"),
            Some(&TriggerPoints::Single { x: 8.0, y: 80.0 })
        );
        assert_eq!(sink.trigger_points("never"), None);
    }

    #[test]
    fn test_validate_then_execute() {
        let plan = Plan::new("phases")
            .with_driver("furnace", "ramp")
            .with_segment(SegmentDescriptor::time("s", 60.0));
        let profile = furnace();
        let previewer = PlanPreviewer::new();

        let validated = previewer.validate(&plan, Some(&profile)).unwrap();
        assert_eq!(validated.len(), 1);

        let mut sink = RecordingSink::new();
        let outcome = previewer.execute(&validated, &mut sink);
        match outcome {
            PreviewOutcome::Completed { segments, end } => {
                assert_eq!(segments, 1);
                assert_eq!(end, 1.0);
            }
            other => panic!("Expected Completed, got {:?}", other),
        }
    }
}
