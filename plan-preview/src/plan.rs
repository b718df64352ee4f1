//! Plan, segment and trigger descriptors
//!
//! Descriptors are immutable inputs to the previewer. Each segment and trigger
//! carries exactly one group of condition fields, selected by its signal source
//! (and, for triggers, its execution policy). The condition enums make that
//! invariant structural; the serde wire shape is a flat record that is checked
//! on the way in.

use crate::types::{PreviewError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a segment or trigger condition is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// Elapsed time, entered in seconds
    Time,
    /// The value of a named signal in the driver profile
    Position,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSource::Time => write!(f, "TIME"),
            SignalSource::Position => write!(f, "POSITION"),
        }
    }
}

/// Whether a trigger fires once or every interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    Single,
    Repeating,
}

impl fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPolicy::Single => write!(f, "SINGLE"),
            ExecutionPolicy::Repeating => write!(f, "REPEATING"),
        }
    }
}

/// Side from which a POSITION segment's threshold is approached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inequality {
    /// Ends at the first coordinate where value >= threshold
    GreaterThan,
    /// Ends at the first coordinate where value <= threshold
    LessThan,
}

impl Inequality {
    /// Check whether `value` satisfies the inequality against `threshold`
    pub fn is_met(&self, value: f64, threshold: f64) -> bool {
        match self {
            Inequality::GreaterThan => value >= threshold,
            Inequality::LessThan => value <= threshold,
        }
    }
}

/// End condition of a segment
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentCondition {
    /// Ends after `duration` seconds
    Time { duration: f64 },
    /// Ends when `variable_name` crosses `threshold`
    Position {
        variable_name: String,
        inequality: Inequality,
        threshold: f64,
    },
}

/// Fire condition of a trigger
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerCondition {
    /// Fires once, `target` seconds after the segment starts
    SingleTime { target: f64 },
    /// Fires every `interval` seconds after the segment starts
    RepeatingTime { interval: f64 },
    /// Fires once, when the signal enters `target ± tolerance`
    SinglePosition {
        variable_name: String,
        target: f64,
        tolerance: f64,
    },
    /// Fires every time the signal has travelled `interval`
    RepeatingPosition { variable_name: String, interval: f64 },
}

impl TriggerCondition {
    pub fn signal_source(&self) -> SignalSource {
        match self {
            TriggerCondition::SingleTime { .. } | TriggerCondition::RepeatingTime { .. } => {
                SignalSource::Time
            }
            TriggerCondition::SinglePosition { .. } | TriggerCondition::RepeatingPosition { .. } => {
                SignalSource::Position
            }
        }
    }

    pub fn execution_policy(&self) -> ExecutionPolicy {
        match self {
            TriggerCondition::SingleTime { .. } | TriggerCondition::SinglePosition { .. } => {
                ExecutionPolicy::Single
            }
            TriggerCondition::RepeatingTime { .. } | TriggerCondition::RepeatingPosition { .. } => {
                ExecutionPolicy::Repeating
            }
        }
    }

    /// Signal watched by a POSITION condition
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            TriggerCondition::SinglePosition { variable_name, .. }
            | TriggerCondition::RepeatingPosition { variable_name, .. } => Some(variable_name),
            _ => None,
        }
    }
}

/// A fire condition nested inside a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrigger", into = "RawTrigger")]
pub struct TriggerDescriptor {
    pub name: String,
    pub condition: TriggerCondition,
}

impl TriggerDescriptor {
    pub fn new(name: impl Into<String>, condition: TriggerCondition) -> Self {
        Self {
            name: name.into(),
            condition,
        }
    }

    pub fn single_time(name: impl Into<String>, target_seconds: f64) -> Self {
        Self::new(name, TriggerCondition::SingleTime { target: target_seconds })
    }

    pub fn repeating_time(name: impl Into<String>, interval_seconds: f64) -> Self {
        Self::new(name, TriggerCondition::RepeatingTime { interval: interval_seconds })
    }

    pub fn single_position(
        name: impl Into<String>,
        variable_name: impl Into<String>,
        target: f64,
        tolerance: f64,
    ) -> Self {
        Self::new(
            name,
            TriggerCondition::SinglePosition {
                variable_name: variable_name.into(),
                target,
                tolerance,
            },
        )
    }

    pub fn repeating_position(
        name: impl Into<String>,
        variable_name: impl Into<String>,
        interval: f64,
    ) -> Self {
        Self::new(
            name,
            TriggerCondition::RepeatingPosition {
                variable_name: variable_name.into(),
                interval,
            },
        )
    }

    pub fn signal_source(&self) -> SignalSource {
        self.condition.signal_source()
    }

    pub fn execution_policy(&self) -> ExecutionPolicy {
        self.condition.execution_policy()
    }

    /// Check the descriptor is well formed
    pub fn validate(&self) -> Result<()> {
        check_name("trigger", &self.name)?;
        let owner = format!("trigger '{}'", self.name);
        match &self.condition {
            TriggerCondition::SingleTime { target } => check_finite(&owner, "target", *target),
            TriggerCondition::RepeatingTime { interval } => {
                check_finite(&owner, "interval", *interval)
            }
            TriggerCondition::SinglePosition {
                variable_name,
                target,
                tolerance,
            } => {
                check_name(&owner, variable_name)?;
                check_finite(&owner, "target", *target)?;
                check_finite(&owner, "tolerance", *tolerance)
            }
            TriggerCondition::RepeatingPosition {
                variable_name,
                interval,
            } => {
                check_name(&owner, variable_name)?;
                check_finite(&owner, "interval", *interval)
            }
        }
    }
}

/// One stage of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSegment", into = "RawSegment")]
pub struct SegmentDescriptor {
    pub name: String,
    pub condition: SegmentCondition,
    pub triggers: Vec<TriggerDescriptor>,
}

impl SegmentDescriptor {
    /// A segment lasting `duration_seconds`
    pub fn time(name: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            name: name.into(),
            condition: SegmentCondition::Time {
                duration: duration_seconds,
            },
            triggers: Vec::new(),
        }
    }

    /// A segment ending when `variable_name` crosses `threshold`
    pub fn position(
        name: impl Into<String>,
        variable_name: impl Into<String>,
        inequality: Inequality,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            condition: SegmentCondition::Position {
                variable_name: variable_name.into(),
                inequality,
                threshold,
            },
            triggers: Vec::new(),
        }
    }

    /// Builder method: attach a trigger
    pub fn with_trigger(mut self, trigger: TriggerDescriptor) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn signal_source(&self) -> SignalSource {
        match self.condition {
            SegmentCondition::Time { .. } => SignalSource::Time,
            SegmentCondition::Position { .. } => SignalSource::Position,
        }
    }

    /// Signal watched by a POSITION segment
    pub fn variable_name(&self) -> Option<&str> {
        match &self.condition {
            SegmentCondition::Position { variable_name, .. } => Some(variable_name),
            SegmentCondition::Time { .. } => None,
        }
    }

    /// Check the segment and its triggers are well formed
    pub fn validate(&self) -> Result<()> {
        check_name("segment", &self.name)?;
        let owner = format!("segment '{}'", self.name);
        match &self.condition {
            SegmentCondition::Time { duration } => {
                check_finite(&owner, "duration", *duration)?;
                if *duration < 0.0 {
                    return Err(PreviewError::InvalidDescriptor(format!(
                        "{}: duration must not be negative (got {})",
                        owner, duration
                    )));
                }
            }
            SegmentCondition::Position {
                variable_name,
                threshold,
                ..
            } => {
                check_name(&owner, variable_name)?;
                check_finite(&owner, "threshold", *threshold)?;
            }
        }
        self.triggers.iter().try_for_each(TriggerDescriptor::validate)
    }
}

/// Identifies the driver profile a plan is previewed against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DriverReference {
    pub driver: String,
    pub profile: String,
}

/// A signal named by a POSITION segment or trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalReference<'a> {
    /// Name of the segment or trigger holding the reference
    pub owner: &'a str,
    /// Signal name looked up in the driver profile
    pub signal: &'a str,
}

/// An ordered sequence of segments, optionally tied to a driver profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverReference>,
    #[serde(default)]
    pub segments: Vec<SegmentDescriptor>,
}

impl Plan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder method: preview against a recorded driver profile
    pub fn with_driver(mut self, driver: impl Into<String>, profile: impl Into<String>) -> Self {
        self.driver = Some(DriverReference {
            driver: driver.into(),
            profile: profile.into(),
        });
        self
    }

    /// Builder method: append a segment
    pub fn with_segment(mut self, segment: SegmentDescriptor) -> Self {
        self.segments.push(segment);
        self
    }

    /// Every signal referenced by a POSITION segment or trigger, in plan order
    pub fn signal_references(&self) -> Vec<SignalReference<'_>> {
        let mut refs = Vec::new();
        for segment in &self.segments {
            if let Some(signal) = segment.variable_name() {
                refs.push(SignalReference {
                    owner: &segment.name,
                    signal,
                });
            }
            for trigger in &segment.triggers {
                if let Some(signal) = trigger.condition.variable_name() {
                    refs.push(SignalReference {
                        owner: &trigger.name,
                        signal,
                    });
                }
            }
        }
        refs
    }

    /// Check every segment and trigger is well formed
    pub fn validate_descriptors(&self) -> Result<()> {
        self.segments.iter().try_for_each(SegmentDescriptor::validate)
    }
}

fn check_name(owner: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PreviewError::InvalidDescriptor(format!(
            "{}: name must not be empty",
            owner
        )));
    }
    Ok(())
}

fn check_finite(owner: &str, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PreviewError::InvalidDescriptor(format!(
            "{}: {} must be finite (got {})",
            owner, field, value
        )));
    }
    Ok(())
}

/// Flat wire shape of a segment
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSegment {
    name: String,
    source: SignalSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variable_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inequality: Option<Inequality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threshold: Option<f64>,
    #[serde(default)]
    triggers: Vec<TriggerDescriptor>,
}

impl TryFrom<RawSegment> for SegmentDescriptor {
    type Error = PreviewError;

    fn try_from(raw: RawSegment) -> Result<Self> {
        let owner = format!("segment '{}'", raw.name);
        let condition = match raw.source {
            SignalSource::Time => {
                reject_field(&owner, "variable_name", raw.variable_name.is_some())?;
                reject_field(&owner, "inequality", raw.inequality.is_some())?;
                reject_field(&owner, "threshold", raw.threshold.is_some())?;
                SegmentCondition::Time {
                    duration: require(&owner, "duration", raw.duration)?,
                }
            }
            SignalSource::Position => {
                reject_field(&owner, "duration", raw.duration.is_some())?;
                SegmentCondition::Position {
                    variable_name: require(&owner, "variable_name", raw.variable_name)?,
                    inequality: require(&owner, "inequality", raw.inequality)?,
                    threshold: require(&owner, "threshold", raw.threshold)?,
                }
            }
        };
        let segment = SegmentDescriptor {
            name: raw.name,
            condition,
            triggers: raw.triggers,
        };
        segment.validate()?;
        Ok(segment)
    }
}

impl From<SegmentDescriptor> for RawSegment {
    fn from(segment: SegmentDescriptor) -> Self {
        let mut raw = RawSegment {
            name: segment.name,
            source: SignalSource::Time,
            duration: None,
            variable_name: None,
            inequality: None,
            threshold: None,
            triggers: segment.triggers,
        };
        match segment.condition {
            SegmentCondition::Time { duration } => raw.duration = Some(duration),
            SegmentCondition::Position {
                variable_name,
                inequality,
                threshold,
            } => {
                raw.source = SignalSource::Position;
                raw.variable_name = Some(variable_name);
                raw.inequality = Some(inequality);
                raw.threshold = Some(threshold);
            }
        }
        raw
    }
}

/// Flat wire shape of a trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTrigger {
    name: String,
    source: SignalSource,
    policy: ExecutionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variable_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval: Option<f64>,
}

impl TryFrom<RawTrigger> for TriggerDescriptor {
    type Error = PreviewError;

    fn try_from(raw: RawTrigger) -> Result<Self> {
        let owner = format!("trigger '{}'", raw.name);
        let condition = match (raw.source, raw.policy) {
            (SignalSource::Time, ExecutionPolicy::Single) => {
                reject_field(&owner, "variable_name", raw.variable_name.is_some())?;
                reject_field(&owner, "interval", raw.interval.is_some())?;
                TriggerCondition::SingleTime {
                    target: require(&owner, "target", raw.target)?,
                }
            }
            (SignalSource::Time, ExecutionPolicy::Repeating) => {
                reject_field(&owner, "variable_name", raw.variable_name.is_some())?;
                reject_field(&owner, "target", raw.target.is_some())?;
                TriggerCondition::RepeatingTime {
                    interval: require(&owner, "interval", raw.interval)?,
                }
            }
            (SignalSource::Position, ExecutionPolicy::Single) => {
                reject_field(&owner, "interval", raw.interval.is_some())?;
                TriggerCondition::SinglePosition {
                    variable_name: require(&owner, "variable_name", raw.variable_name)?,
                    target: require(&owner, "target", raw.target)?,
                    tolerance: raw.tolerance.unwrap_or(0.0),
                }
            }
            (SignalSource::Position, ExecutionPolicy::Repeating) => {
                reject_field(&owner, "target", raw.target.is_some())?;
                TriggerCondition::RepeatingPosition {
                    variable_name: require(&owner, "variable_name", raw.variable_name)?,
                    interval: require(&owner, "interval", raw.interval)?,
                }
            }
        };
        let trigger = TriggerDescriptor {
            name: raw.name,
            condition,
        };
        trigger.validate()?;
        Ok(trigger)
    }
}

impl From<TriggerDescriptor> for RawTrigger {
    fn from(trigger: TriggerDescriptor) -> Self {
        let mut raw = RawTrigger {
            name: trigger.name,
            source: trigger.condition.signal_source(),
            policy: trigger.condition.execution_policy(),
            variable_name: None,
            target: None,
            tolerance: None,
            interval: None,
        };
        match trigger.condition {
            TriggerCondition::SingleTime { target } => raw.target = Some(target),
            TriggerCondition::RepeatingTime { interval } => raw.interval = Some(interval),
            TriggerCondition::SinglePosition {
                variable_name,
                target,
                tolerance,
            } => {
                raw.variable_name = Some(variable_name);
                raw.target = Some(target);
                raw.tolerance = Some(tolerance);
            }
            TriggerCondition::RepeatingPosition {
                variable_name,
                interval,
            } => {
                raw.variable_name = Some(variable_name);
                raw.interval = Some(interval);
            }
        }
        raw
    }
}

fn require<T>(owner: &str, field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| PreviewError::InvalidDescriptor(format!("{}: missing {}", owner, field)))
}

fn reject_field(owner: &str, field: &str, present: bool) -> Result<()> {
    if present {
        return Err(PreviewError::InvalidDescriptor(format!(
            "{}: unexpected field {} for this signal source",
            owner, field
        )));
    }
    Ok(())
}
