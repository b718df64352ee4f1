//! Time-based locators
//!
//! Targets and intervals are entered in seconds and converted to the plotted
//! coordinate (minutes) here, once, relative to the start of the search
//! interval.

use crate::profile::Dataset;
use crate::types::{seconds_to_minutes, Hit, Hits};

/// Value plotted at `x`: the dataset's value, or the baseline when there is none
fn sample(data: Option<&Dataset>, x: f64) -> Option<f64> {
    match data {
        Some(dataset) => dataset.value_at(x),
        None => Some(0.0),
    }
}

/// Locate a trigger firing once, `target_seconds` after `start`
///
/// With no dataset the hit is not restricted to a domain and carries `0.0`.
pub fn single(target_seconds: f64, data: Option<&Dataset>, start: f64, stop: f64) -> Hits {
    let x = start + seconds_to_minutes(target_seconds);
    if !(x >= start && x <= stop) {
        return Hits::none();
    }
    match sample(data, x) {
        Some(y) => Hits::single(Hit::new(x, y)),
        None => Hits::none(),
    }
}

/// Locate a trigger firing every `interval_seconds` after `start`
///
/// The first candidate is one interval in; `start` itself never fires. A zero
/// or non-finite interval yields no hits. With no dataset, hits are not
/// restricted to a domain and carry `0.0`.
pub fn repeating(interval_seconds: f64, data: Option<&Dataset>, start: f64, stop: f64) -> Hits {
    let step = seconds_to_minutes(interval_seconds.abs());
    if !(step > 0.0 && step.is_finite()) || start + step <= start {
        return Hits::none();
    }

    let mut hits = Hits::none();
    for k in 1u64.. {
        let x = start + k as f64 * step;
        if x > stop {
            break;
        }
        if let Some(y) = sample(data, x) {
            hits.push(Hit::new(x, y));
        }
    }
    log::trace!(
        "Repeating time search over [{}, {}] every {}s: {} hits",
        start,
        stop,
        interval_seconds,
        hits.len()
    );
    hits
}
