//! Trigger locators
//!
//! A locator searches a bounded interval of the plotted coordinate for the
//! places where a trigger condition is met. There are exactly four of them,
//! one per combination of signal source and execution policy, so dispatch is
//! a closed match rather than a trait object.
//!
//! Locators are pure: they borrow their dataset, never mutate it, and return
//! the same hits for the same inputs.

pub mod position;
pub mod time;

use crate::plan::TriggerCondition;
use crate::profile::Dataset;
use crate::types::Hits;

/// A trigger condition bound to the data it is searched over
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Locator<'a> {
    /// Fires once, `target` seconds after the interval start
    SingleTime {
        target: f64,
        data: Option<&'a Dataset>,
    },
    /// Fires every `interval` seconds after the interval start
    RepeatingTime {
        interval: f64,
        data: Option<&'a Dataset>,
    },
    /// Fires once, on entering `target ± tolerance`
    SinglePosition {
        target: f64,
        tolerance: f64,
        data: &'a Dataset,
    },
    /// Fires each time the signal has travelled `interval`
    RepeatingPosition { interval: f64, data: &'a Dataset },
}

impl<'a> Locator<'a> {
    /// Bind a trigger condition to its data
    ///
    /// TIME conditions take the dataset their hits are plotted against, if
    /// any. POSITION conditions need the dataset of the signal they watch;
    /// `None` is returned when it is missing.
    pub fn new(condition: &TriggerCondition, data: Option<&'a Dataset>) -> Option<Self> {
        let locator = match condition {
            TriggerCondition::SingleTime { target } => Locator::SingleTime {
                target: *target,
                data,
            },
            TriggerCondition::RepeatingTime { interval } => Locator::RepeatingTime {
                interval: *interval,
                data,
            },
            TriggerCondition::SinglePosition {
                target, tolerance, ..
            } => Locator::SinglePosition {
                target: *target,
                tolerance: *tolerance,
                data: data?,
            },
            TriggerCondition::RepeatingPosition { interval, .. } => Locator::RepeatingPosition {
                interval: *interval,
                data: data?,
            },
        };
        Some(locator)
    }

    /// Search `[start, stop]` on the plotted coordinate
    pub fn search(&self, start: f64, stop: f64) -> Hits {
        match *self {
            Locator::SingleTime { target, data } => time::single(target, data, start, stop),
            Locator::RepeatingTime { interval, data } => {
                time::repeating(interval, data, start, stop)
            }
            Locator::SinglePosition {
                target,
                tolerance,
                data,
            } => position::single(data, target, tolerance, start, stop),
            Locator::RepeatingPosition { interval, data } => {
                position::repeating(data, interval, start, stop)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Dataset {
        Dataset::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap()
    }

    #[test]
    fn test_position_locator_needs_data() {
        let condition = TriggerCondition::SinglePosition {
            variable_name: "x".to_string(),
            target: 0.5,
            tolerance: 0.0,
        };
        assert!(Locator::new(&condition, None).is_none());

        let data = line();
        let locator = Locator::new(&condition, Some(&data)).unwrap();
        let hits = locator.search(0.0, 1.0);
        assert_eq!(hits.positions, vec![0.5]);
    }

    #[test]
    fn test_time_locator_without_data() {
        let condition = TriggerCondition::SingleTime { target: 30.0 };
        let locator = Locator::new(&condition, None).unwrap();

        let hits = locator.search(1.0, 2.0);
        assert_eq!(hits.positions, vec![1.5]);
        assert_eq!(hits.values, vec![0.0]);
    }

    #[test]
    fn test_dispatch_covers_all_variants() {
        let data = line();
        let conditions = [
            TriggerCondition::SingleTime { target: 6.0 },
            TriggerCondition::RepeatingTime { interval: 15.0 },
            TriggerCondition::SinglePosition {
                variable_name: "x".to_string(),
                target: 0.5,
                tolerance: 0.1,
            },
            TriggerCondition::RepeatingPosition {
                variable_name: "x".to_string(),
                interval: 0.25,
            },
        ];
        let counts: Vec<usize> = conditions
            .iter()
            .map(|c| Locator::new(c, Some(&data)).unwrap().search(0.0, 1.0).len())
            .collect();

        assert_eq!(counts, vec![1, 4, 1, 4]);
    }
}
