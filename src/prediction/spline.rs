//! Cubic spline fit of the post-burst descent, extrapolated to the landing altitude.
//!
//! The fit only describes the descent seen so far. While the payload is still in
//! thin air the parachute has little to work with and the descent rate changes
//! quickly, so extrapolating the end polynomial from there is expected to be
//! poor; estimates only settle once the payload reaches thicker air.

use crate::prediction::{EstimatorInput, Falltime, NoEstimateReason};

/// a cubic needs at least four samples
pub const MINIMUM_SAMPLES: usize = 4;

const BISECTION_TOLERANCE: f64 = 1e-6;
const BISECTION_ITERATIONS: usize = 200;
const MINIMUM_STEP: f64 = 0.1;
const STEP_GROWTH: f64 = 1.5;

/// Debug side channel receiving `(seconds since burst, altitudes, fitted curve)` for every fit.
pub type CurveObserver = Box<dyn FnMut(&[f64], &[f64], &CubicSpline) + Send>;

/// Natural cubic spline through a set of strictly increasing knots.
///
/// Outside the knot range the first and last segment polynomials are continued.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    pub fn natural(knots: &[f64], values: &[f64]) -> Option<Self> {
        let count = knots.len();
        if count < 2 || values.len() != count {
            return None;
        }
        if knots.windows(2).any(|pair| !(pair[1] > pair[0])) {
            return None;
        }

        let mut second_derivatives = vec![0.0; count];
        if count > 2 {
            // Thomas algorithm over the interior knots; ends are held at zero curvature
            let interior = count - 2;
            let mut upper = vec![0.0; interior];
            let mut right = vec![0.0; interior];

            for row in 0..interior {
                let index = row + 1;
                let before = knots[index] - knots[index - 1];
                let after = knots[index + 1] - knots[index];
                let mut diagonal = 2.0 * (before + after);
                let mut rhs = 6.0
                    * ((values[index + 1] - values[index]) / after
                        - (values[index] - values[index - 1]) / before);

                if row > 0 {
                    diagonal -= before * upper[row - 1];
                    rhs -= before * right[row - 1];
                }

                upper[row] = after / diagonal;
                right[row] = rhs / diagonal;
            }

            for row in (0..interior).rev() {
                let next = if row + 1 < interior {
                    second_derivatives[row + 2]
                } else {
                    0.0
                };
                second_derivatives[row + 1] = right[row] - upper[row] * next;
            }
        }

        Some(Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
            second_derivatives,
        })
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let last_segment = self.knots.len() - 2;
        let segment = self
            .knots
            .partition_point(|knot| *knot <= x)
            .saturating_sub(1)
            .min(last_segment);

        let x0 = self.knots[segment];
        let x1 = self.knots[segment + 1];
        let y0 = self.values[segment];
        let y1 = self.values[segment + 1];
        let m0 = self.second_derivatives[segment];
        let m1 = self.second_derivatives[segment + 1];
        let h = x1 - x0;

        let a = x1 - x;
        let b = x - x0;
        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }

    /// First `x` after `start` (up to `start + horizon`) where the curve drops to `level`.
    ///
    /// Steps forward with a growing stride until the curve is bracketed, then bisects.
    pub fn crossing_after(&self, start: f64, level: f64, horizon: f64, step: f64) -> Option<f64> {
        let end = start + horizon;
        let mut lower = start;
        let mut step = step.max(MINIMUM_STEP);

        if self.evaluate(lower) <= level {
            return Some(lower);
        }

        while lower < end {
            let upper = (lower + step).min(end);
            if self.evaluate(upper) <= level {
                return Some(self.bisect(lower, upper, level));
            }
            lower = upper;
            step *= STEP_GROWTH;
        }

        None
    }

    fn bisect(&self, mut above: f64, mut below: f64, level: f64) -> f64 {
        for _ in 0..BISECTION_ITERATIONS {
            if below - above < BISECTION_TOLERANCE {
                break;
            }
            let middle = 0.5 * (above + below);
            if self.evaluate(middle) > level {
                above = middle;
            } else {
                below = middle;
            }
        }
        0.5 * (above + below)
    }
}

#[derive(Clone, Debug)]
pub struct SplineExtrapolation {
    /// how far past the last sample to search for the landing crossing, in seconds
    pub horizon: f64,
    pub thin_air_altitude: f64,
}

impl SplineExtrapolation {
    pub fn new(horizon: f64, thin_air_altitude: f64) -> Self {
        Self {
            horizon,
            thin_air_altitude,
        }
    }

    pub fn estimate(
        &self,
        input: &EstimatorInput,
        observer: Option<&mut CurveObserver>,
    ) -> Falltime {
        let mut times = vec![];
        let mut altitudes = vec![];
        for frame in input.history {
            if let Some(altitude) = frame.altitude {
                times.push(crate::utilities::seconds(frame.time - input.burst_time));
                altitudes.push(altitude);
            }
        }

        if times.len() < MINIMUM_SAMPLES {
            return Falltime::Unavailable(NoEstimateReason::InsufficientSamples {
                count: times.len(),
                required: MINIMUM_SAMPLES,
            });
        }

        let spline = match CubicSpline::natural(&times, &altitudes) {
            Some(spline) => spline,
            None => return Falltime::Unavailable(NoEstimateReason::NonMonotonicTime),
        };

        if let Some(observer) = observer {
            observer(&times, &altitudes, &spline);
        }

        if input.altitude <= input.landing_altitude {
            return Falltime::AtOrBelowLanding;
        }

        if input.altitude > self.thin_air_altitude {
            log::debug!(
                "extrapolating from {:.0} m, above {:.0} m; expect a poor estimate until the payload reaches thicker air",
                input.altitude,
                self.thin_air_altitude
            );
        }

        let last = times[times.len() - 1];
        let mean_interval = (last - times[0]) / (times.len() - 1) as f64;
        match spline.crossing_after(last, input.landing_altitude, self.horizon, mean_interval) {
            Some(crossing) => Falltime::Remaining(crossing - last),
            None => Falltime::Unavailable(NoEstimateReason::NoCrossing {
                horizon: self.horizon,
            }),
        }
    }
}
