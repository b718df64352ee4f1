//! Driver profiles and their sample sequences
//!
//! A driver profile is a recorded set of named signals, each sampled against
//! the same independent (plotted) coordinate. Profiles are produced once by an
//! external service and are read-only to the previewer.

use crate::types::{PreviewError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A pair of aligned sample sequences `(xs, ys)`, sorted by `x`
///
/// Samples need not be evenly spaced. Repeated `x` values are allowed (a step
/// in the signal); the first sample at a repeated coordinate wins on lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset", into = "RawDataset")]
pub struct Dataset {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

/// Wire shape of a dataset, checked on the way in
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDataset {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = PreviewError;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Dataset::new(raw.x, raw.y)
    }
}

impl From<Dataset> for RawDataset {
    fn from(dataset: Dataset) -> Self {
        RawDataset {
            x: dataset.xs,
            y: dataset.ys,
        }
    }
}

impl Dataset {
    /// Create a dataset from aligned sequences
    ///
    /// # Errors
    /// Returns `InvalidDataset` if the lengths differ, any value is not finite,
    /// or `xs` is not sorted in non-decreasing order.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(PreviewError::InvalidDataset(format!(
                "x has {} samples but y has {}",
                xs.len(),
                ys.len()
            )));
        }
        for (axis, values) in [("x", &xs), ("y", &ys)] {
            if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                return Err(PreviewError::InvalidDataset(format!(
                    "non-finite {} sample at index {}",
                    axis, i
                )));
            }
        }
        if let Some(i) = xs.windows(2).position(|w| w[1] < w[0]) {
            return Err(PreviewError::InvalidDataset(format!(
                "x is not sorted at index {}",
                i + 1
            )));
        }
        Ok(Self { xs, ys })
    }

    /// Build a dataset by sampling `f` at each of `xs`
    pub fn from_fn(xs: Vec<f64>, f: impl Fn(f64) -> f64) -> Result<Self> {
        let ys = xs.iter().map(|&x| f(x)).collect();
        Self::new(xs, ys)
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// First and last coordinate, or `None` for an empty dataset
    pub fn domain(&self) -> Option<(f64, f64)> {
        Some((*self.xs.first()?, *self.xs.last()?))
    }

    /// Check whether `x` lies within the sampled domain
    pub fn contains(&self, x: f64) -> bool {
        match self.domain() {
            Some((lo, hi)) => x >= lo && x <= hi,
            None => false,
        }
    }

    /// Signal value at `x`, linearly interpolated between bracketing samples
    ///
    /// Returns `None` outside the domain.
    pub fn value_at(&self, x: f64) -> Option<f64> {
        if !self.contains(x) {
            return None;
        }
        let idx = self.xs.partition_point(|&v| v < x);
        let (x1, y1) = (*self.xs.get(idx)?, *self.ys.get(idx)?);
        if x1 == x || idx == 0 {
            return Some(y1);
        }
        let (x0, y0) = (self.xs[idx - 1], self.ys[idx - 1]);
        Some(interpolate(x0, y0, x1, y1, x))
    }

    /// The signal as a polyline clipped to `[start, stop]` and the domain
    ///
    /// The first and last points are interpolated at the clipped bounds; every
    /// sample strictly between them is included. Returns `None` when the
    /// interval and the domain do not overlap.
    pub fn path(&self, start: f64, stop: f64) -> Option<Vec<(f64, f64)>> {
        let (lo, hi) = self.domain()?;
        let from = start.max(lo);
        let to = stop.min(hi);
        if !(from <= to) {
            return None;
        }

        let mut points = vec![(from, self.value_at(from)?)];
        let first = self.xs.partition_point(|&v| v <= from);
        let last = self.xs.partition_point(|&v| v < to);
        if first < last {
            points.extend(
                self.xs[first..last]
                    .iter()
                    .copied()
                    .zip(self.ys[first..last].iter().copied()),
            );
        }
        if to > from {
            points.push((to, self.value_at(to)?));
        }
        Some(points)
    }
}

/// Linear interpolation of the value at `x` on the line through two samples
pub(crate) fn interpolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Coordinate at which the line through two samples takes the value `y`
pub(crate) fn crossing(x0: f64, y0: f64, x1: f64, y1: f64, y: f64) -> f64 {
    if y1 == y0 {
        return x0;
    }
    x0 + (x1 - x0) * (y - y0) / (y1 - y0)
}

/// A recorded collection of named signals for one driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    /// Driver the profile was recorded for
    pub driver: String,
    /// Profile name, unique per driver
    pub name: String,
    /// Signals keyed by name
    #[serde(default)]
    sequences: BTreeMap<String, Dataset>,
}

impl DriverProfile {
    pub fn new(driver: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            name: name.into(),
            sequences: BTreeMap::new(),
        }
    }

    /// Builder method: add a named signal
    pub fn with_sequence(mut self, signal: impl Into<String>, dataset: Dataset) -> Self {
        self.sequences.insert(signal.into(), dataset);
        self
    }

    /// All signals keyed by name
    pub fn plottable_sequences(&self) -> &BTreeMap<String, Dataset> {
        &self.sequences
    }

    pub fn sequence(&self, signal: &str) -> Option<&Dataset> {
        self.sequences.get(signal)
    }

    pub fn contains(&self, signal: &str) -> bool {
        self.sequences.contains_key(signal)
    }

    /// The signal TIME triggers are plotted against (first by name)
    pub fn primary_sequence(&self) -> Option<&Dataset> {
        self.sequences.values().next()
    }

    /// Last coordinate available in any of the profile's signals
    pub fn domain_end(&self) -> Option<f64> {
        self.sequences
            .values()
            .filter_map(|d| d.domain().map(|(_, hi)| hi))
            .reduce(f64::max)
    }

    /// Parse a profile from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Source of driver profiles, keyed by `(driver, profile)`
pub trait ProfileProvider {
    /// Look up a profile
    ///
    /// # Errors
    /// Returns `ProfileNotFound` when no such profile exists, or whatever error
    /// the backing store raises.
    fn profile(&self, driver: &str, profile: &str) -> Result<Arc<DriverProfile>>;
}

/// Provider over profiles held in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileProvider {
    profiles: HashMap<(String, String), Arc<DriverProfile>>,
}

impl InMemoryProfileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile, replacing any previous one with the same driver and name
    pub fn insert(&mut self, profile: DriverProfile) {
        log::debug!(
            "Registering profile {}/{} ({} signals)",
            profile.driver,
            profile.name,
            profile.sequences.len()
        );
        let key = (profile.driver.clone(), profile.name.clone());
        self.profiles.insert(key, Arc::new(profile));
    }

    /// Builder method: add a profile
    pub fn with_profile(mut self, profile: DriverProfile) -> Self {
        self.insert(profile);
        self
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileProvider for InMemoryProfileProvider {
    fn profile(&self, driver: &str, profile: &str) -> Result<Arc<DriverProfile>> {
        self.profiles
            .get(&(driver.to_string(), profile.to_string()))
            .cloned()
            .ok_or_else(|| PreviewError::ProfileNotFound {
                driver: driver.to_string(),
                profile: profile.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Dataset {
        Dataset::new(vec![0.0, 1.0, 2.0, 4.0], vec![0.0, 10.0, 20.0, 0.0]).unwrap()
    }

    #[test]
    fn test_dataset_rejects_bad_input() {
        assert!(Dataset::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(Dataset::new(vec![1.0, 0.0], vec![0.0, 0.0]).is_err());
        assert!(Dataset::new(vec![0.0, f64::NAN], vec![0.0, 0.0]).is_err());
        assert!(Dataset::new(vec![0.0, 1.0], vec![0.0, f64::INFINITY]).is_err());
        assert!(Dataset::new(vec![], vec![]).is_ok());
    }

    #[test]
    fn test_dataset_non_finite_names_axis() {
        let err = Dataset::new(vec![0.0, 1.0, f64::NAN], vec![0.0, 0.0, 0.0]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid dataset: non-finite x sample at index 2"
        );

        let err = Dataset::new(vec![0.0, 1.0, 2.0], vec![0.0, f64::INFINITY, 0.0]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid dataset: non-finite y sample at index 1"
        );
    }

    #[test]
    fn test_value_at_interpolates() {
        let data = ramp();
        assert_eq!(data.value_at(0.0), Some(0.0));
        assert_eq!(data.value_at(1.0), Some(10.0));
        assert_eq!(data.value_at(0.5), Some(5.0));
        assert_eq!(data.value_at(3.0), Some(10.0));
        assert_eq!(data.value_at(4.0), Some(0.0));
    }

    #[test]
    fn test_value_at_outside_domain() {
        let data = ramp();
        assert_eq!(data.value_at(-0.1), None);
        assert_eq!(data.value_at(4.1), None);

        let empty = Dataset::new(vec![], vec![]).unwrap();
        assert_eq!(empty.value_at(0.0), None);
        assert_eq!(empty.domain(), None);
    }

    #[test]
    fn test_path_clips_to_interval_and_domain() {
        let data = ramp();

        let path = data.path(0.5, 2.5).unwrap();
        assert_eq!(path, vec![(0.5, 5.0), (1.0, 10.0), (2.0, 20.0), (2.5, 15.0)]);

        let clipped = data.path(-1.0, 10.0).unwrap();
        assert_eq!(clipped.first(), Some(&(0.0, 0.0)));
        assert_eq!(clipped.last(), Some(&(4.0, 0.0)));
        assert_eq!(clipped.len(), 4);

        assert_eq!(data.path(1.0, 1.0), Some(vec![(1.0, 10.0)]));
        assert_eq!(data.path(5.0, 6.0), None);
    }

    #[test]
    fn test_profile_json() {
        let json = r#"{
            "driver": "furnace",
            "name": "ramp_and_hold",
            "sequences": {
                "temperature": { "x": [0.0, 1.0, 2.0], "y": [20.0, 120.0, 120.0] },
                "pressure": { "x": [0.0, 3.0], "y": [1.0, 2.0] }
            }
        }"#;

        let profile = DriverProfile::from_json(json).unwrap();
        assert_eq!(profile.driver, "furnace");
        assert!(profile.contains("temperature"));
        assert!(!profile.contains("Unknown"));
        assert_eq!(profile.domain_end(), Some(3.0));
        // BTreeMap order: "pressure" < "temperature"
        assert_eq!(profile.primary_sequence().unwrap().len(), 2);
    }

    #[test]
    fn test_profile_json_rejects_unsorted_dataset() {
        let json = r#"{
            "driver": "d",
            "name": "p",
            "sequences": { "s": { "x": [1.0, 0.0], "y": [0.0, 0.0] } }
        }"#;
        assert!(DriverProfile::from_json(json).is_err());
    }

    #[test]
    fn test_in_memory_provider() {
        let provider = InMemoryProfileProvider::new()
            .with_profile(DriverProfile::new("furnace", "ramp").with_sequence("temperature", ramp()));

        let profile = provider.profile("furnace", "ramp").unwrap();
        assert!(profile.contains("temperature"));

        match provider.profile("furnace", "missing") {
            Err(PreviewError::ProfileNotFound { driver, profile }) => {
                assert_eq!(driver, "furnace");
                assert_eq!(profile, "missing");
            }
            other => panic!("Expected ProfileNotFound, got {:?}", other),
        }
    }
}
