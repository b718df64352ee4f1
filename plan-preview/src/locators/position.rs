//! Position-based locators
//!
//! These walk the signal as a polyline over the search interval and solve for
//! crossings on the linear piece where a condition first holds. Values are in
//! the profile's native units; no unit conversion happens here.

use crate::plan::Inequality;
use crate::profile::{crossing, Dataset};
use crate::types::{Hit, Hits};

/// Locate the first entry of the signal into `target ± |tolerance|`
///
/// When the band is entered on a rising stretch the hit sits on the lower
/// edge, on a falling stretch on the upper edge. A signal already inside the
/// band at `start` fires at `start` with its observed value.
pub fn single(data: &Dataset, target: f64, tolerance: f64, start: f64, stop: f64) -> Hits {
    let Some(path) = data.path(start, stop) else {
        return Hits::none();
    };
    let tolerance = tolerance.abs();
    let (low, high) = (target - tolerance, target + tolerance);

    let Some(&(x0, y0)) = path.first() else {
        return Hits::none();
    };
    if y0 >= low && y0 <= high {
        return Hits::single(Hit::new(x0, y0));
    }

    path.windows(2)
        .find_map(|w| {
            let ((xa, ya), (xb, yb)) = (w[0], w[1]);
            if ya < low && yb >= low {
                Some(Hit::new(crossing(xa, ya, xb, yb, low), low))
            } else if ya > high && yb <= high {
                Some(Hit::new(crossing(xa, ya, xb, yb, high), high))
            } else {
                None
            }
        })
        .map_or_else(Hits::none, Hits::single)
}

/// Locate every point where the signal has travelled `|interval|` in one direction
///
/// Travel is measured from a reference value, initially the value at `start`.
/// Each hit moves the reference to the hit's value. A change of direction
/// moves it to the turning point, so travel never accumulates across a peak
/// or trough. Flat stretches neither add travel nor reset it.
pub fn repeating(data: &Dataset, interval: f64, start: f64, stop: f64) -> Hits {
    let step = interval.abs();
    if !(step > 0.0 && step.is_finite()) {
        return Hits::none();
    }
    let Some(path) = data.path(start, stop) else {
        return Hits::none();
    };
    let Some(&(_, first)) = path.first() else {
        return Hits::none();
    };

    let mut hits = Hits::none();
    let mut reference = first;
    let mut direction = 0.0_f64;

    for w in path.windows(2) {
        let ((xa, ya), (xb, yb)) = (w[0], w[1]);
        if yb == ya {
            continue;
        }
        let heading = (yb - ya).signum();
        if direction != 0.0 && heading != direction {
            log::trace!("Direction reversal at x={}, resetting reference to {}", xa, ya);
            reference = ya;
        }
        direction = heading;

        loop {
            let next = reference + heading * step;
            let reached = if heading > 0.0 { next <= yb } else { next >= yb };
            if !reached || next == reference {
                break;
            }
            hits.push(Hit::new(crossing(xa, ya, xb, yb, next), next));
            reference = next;
        }
    }
    hits
}

/// Locate the first coordinate where the signal satisfies `inequality` against `threshold`
///
/// Used for POSITION segment ends. Returns `start` (clipped to the domain)
/// with its observed value if the condition already holds there.
pub fn threshold(
    data: &Dataset,
    inequality: Inequality,
    threshold: f64,
    start: f64,
    stop: f64,
) -> Option<Hit> {
    let path = data.path(start, stop)?;
    let &(x0, y0) = path.first()?;
    if inequality.is_met(y0, threshold) {
        return Some(Hit::new(x0, y0));
    }
    path.windows(2).find_map(|w| {
        let ((xa, ya), (xb, yb)) = (w[0], w[1]);
        inequality
            .is_met(yb, threshold)
            .then(|| Hit::new(crossing(xa, ya, xb, yb, threshold), threshold))
    })
}
