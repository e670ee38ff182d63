use crate::prediction::{EstimatorInput, Falltime, NoEstimateReason};

/// Constant-velocity filter over altitude measurements.
#[derive(Clone, Debug, PartialEq)]
pub struct VerticalKalman {
    altitude: f64,
    velocity: f64,
    p_altitude: f64,
    p_velocity: f64,
    p_cross: f64,
    // measurement noise variance (m^2)
    r_altitude: f64,
    // process noise, acceleration variance ((m/s^2)^2)
    q_acceleration: f64,
}

impl VerticalKalman {
    pub fn new(
        altitude: f64,
        velocity: f64,
        altitude_noise: f64,
        acceleration_noise: f64,
    ) -> Self {
        Self {
            altitude,
            velocity,
            p_altitude: altitude_noise,
            // the seeding velocity is a two-point difference of noisy altitudes
            p_velocity: 2.0 * altitude_noise,
            p_cross: 0.0,
            r_altitude: altitude_noise,
            q_acceleration: acceleration_noise,
        }
    }

    pub fn update(&mut self, dt: f64, measured_altitude: f64) {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        // predict
        self.altitude += self.velocity * dt;
        self.p_altitude +=
            dt * (2.0 * self.p_cross + dt * self.p_velocity) + 0.25 * dt4 * self.q_acceleration;
        self.p_cross += dt * self.p_velocity + 0.5 * dt3 * self.q_acceleration;
        self.p_velocity += dt2 * self.q_acceleration;

        // correct
        let innovation = measured_altitude - self.altitude;
        let s = self.p_altitude + self.r_altitude;
        let k_altitude = self.p_altitude / s;
        let k_velocity = self.p_cross / s;

        self.altitude += k_altitude * innovation;
        self.velocity += k_velocity * innovation;

        let p_altitude = self.p_altitude;
        let p_cross = self.p_cross;
        self.p_altitude -= k_altitude * p_altitude;
        self.p_cross -= k_altitude * p_cross;
        self.p_velocity -= k_velocity * p_cross;
    }

    /// Filtered altitude and vertical velocity (positive up).
    pub fn state(&self) -> (f64, f64) {
        (self.altitude, self.velocity)
    }
}

/// Recursive estimate of the descent state, carried across calls.
///
/// Every post-burst frame is folded into the filter exactly once; the filtered
/// state is then extrapolated at constant velocity to the landing altitude.
#[derive(Clone, Debug)]
pub struct RecursiveStateEstimate {
    pub altitude_noise: f64,
    pub acceleration_noise: f64,
    pub epsilon: f64,
    filter: Option<VerticalKalman>,
    last_sample: Option<(chrono::DateTime<chrono::Utc>, f64)>,
    samples: usize,
    // length of the post-burst history already folded in
    ingested: usize,
}

const REQUIRED_SAMPLES: usize = 2;

impl RecursiveStateEstimate {
    pub fn new(altitude_noise: f64, acceleration_noise: f64, epsilon: f64) -> Self {
        Self {
            altitude_noise,
            acceleration_noise,
            epsilon,
            filter: None,
            last_sample: None,
            samples: 0,
            ingested: 0,
        }
    }

    pub fn state(&self) -> Option<(f64, f64)> {
        self.filter.as_ref().map(|filter| filter.state())
    }

    fn ingest(&mut self, time: chrono::DateTime<chrono::Utc>, altitude: f64) {
        if let Some((last_time, last_altitude)) = self.last_sample {
            if time <= last_time {
                return;
            }
            let dt = crate::utilities::seconds(time - last_time);
            match &mut self.filter {
                Some(filter) => filter.update(dt, altitude),
                None => {
                    self.filter = Some(VerticalKalman::new(
                        altitude,
                        (altitude - last_altitude) / dt,
                        self.altitude_noise,
                        self.acceleration_noise,
                    ))
                }
            }
        }
        self.last_sample = Some((time, altitude));
        self.samples += 1;
    }

    pub fn estimate(&mut self, input: &EstimatorInput) -> Falltime {
        let start = if self.ingested <= input.history.len() {
            self.ingested
        } else {
            0
        };
        for frame in &input.history[start..] {
            if let Some(altitude) = frame.altitude {
                self.ingest(frame.time, altitude);
            }
        }
        self.ingested = input.history.len();

        let (altitude, velocity) = match self.state() {
            Some(state) => state,
            None => {
                return Falltime::Unavailable(NoEstimateReason::InsufficientSamples {
                    count: self.samples,
                    required: REQUIRED_SAMPLES,
                })
            }
        };

        crate::prediction::falltime_at_velocity(
            altitude,
            input.landing_altitude,
            -velocity,
            self.epsilon,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn burst_time() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2017, 12, 27, 23, 0, 0).unwrap()
    }

    fn frames(altitudes: &[f64]) -> Vec<crate::location::TelemetryFrame> {
        altitudes
            .iter()
            .enumerate()
            .map(|(index, altitude)| {
                crate::location::TelemetryFrame::new(
                    burst_time() + chrono::Duration::seconds(index as i64),
                    -34.9,
                    138.5,
                    Some(*altitude),
                )
            })
            .collect()
    }

    fn estimate(
        estimator: &mut RecursiveStateEstimate,
        history: &[crate::location::TelemetryFrame],
        landing_altitude: f64,
    ) -> Falltime {
        estimator.estimate(&EstimatorInput {
            delta_t: chrono::Duration::seconds(1),
            delta_altitude: 0.0,
            altitude: history.last().unwrap().altitude.unwrap(),
            landing_altitude,
            burst_time: burst_time(),
            history,
        })
    }

    #[test]
    fn test_single_sample() {
        let mut estimator = RecursiveStateEstimate::new(4.0, 0.5, 1e-3);
        assert_eq!(
            estimate(&mut estimator, &frames(&[1000.0]), 0.0),
            Falltime::Unavailable(NoEstimateReason::InsufficientSamples {
                count: 1,
                required: 2
            })
        );
    }

    #[test]
    fn test_steady_descent() {
        let mut estimator = RecursiveStateEstimate::new(4.0, 0.5, 1e-3);
        let altitudes: Vec<f64> = (0..20).map(|index| 2000.0 - 10.0 * index as f64).collect();
        let history = frames(&altitudes);

        // feed the growing history one frame at a time, as a session would
        let mut last = Falltime::AtOrBelowLanding;
        for end in 1..=history.len() {
            last = estimate(&mut estimator, &history[..end], 300.0);
        }

        match last {
            Falltime::Remaining(seconds) => assert!((seconds - 151.0).abs() < 1e-6),
            other => panic!("expected an estimate, got {:?}", other),
        }
        let (altitude, velocity) = estimator.state().unwrap();
        assert!((altitude - 1810.0).abs() < 1e-6);
        assert!((velocity + 10.0).abs() < 1e-6);
        assert_eq!(estimator.samples, 20);
    }

    #[test]
    fn test_frames_are_ingested_once() {
        let mut estimator = RecursiveStateEstimate::new(4.0, 0.5, 1e-3);
        let history = frames(&[1000.0, 990.0, 980.0]);
        estimate(&mut estimator, &history, 0.0);
        estimate(&mut estimator, &history, 0.0);
        assert_eq!(estimator.samples, 3);
    }

    #[test]
    fn test_only_new_frames_are_visited() {
        let mut estimator = RecursiveStateEstimate::new(4.0, 0.5, 1e-3);
        let history = frames(&[1000.0, 990.0, 980.0, 970.0]);
        estimate(&mut estimator, &history[..2], 0.0);
        assert_eq!(estimator.ingested, 2);
        assert_eq!(estimator.samples, 2);

        estimate(&mut estimator, &history, 0.0);
        assert_eq!(estimator.ingested, 4);
        assert_eq!(estimator.samples, 4);
        let (altitude, _) = estimator.state().unwrap();
        assert!((altitude - 970.0).abs() < 1.0);
    }

    #[test]
    fn test_noisy_descent_converges() {
        let mut estimator = RecursiveStateEstimate::new(4.0, 0.5, 1e-3);
        let altitudes: Vec<f64> = (0..120)
            .map(|index| 5000.0 - 8.0 * index as f64 + if index % 2 == 0 { 1.5 } else { -1.5 })
            .collect();
        let history = frames(&altitudes);
        estimate(&mut estimator, &history, 0.0);

        let (_, velocity) = estimator.state().unwrap();
        assert!((velocity + 8.0).abs() < 0.5);
    }

    #[test]
    fn test_below_landing() {
        let mut estimator = RecursiveStateEstimate::new(4.0, 0.5, 1e-3);
        let history = frames(&[320.0, 310.0, 300.0, 290.0]);
        assert_eq!(
            estimate(&mut estimator, &history, 300.0),
            Falltime::AtOrBelowLanding
        );
    }

    #[test]
    fn test_climbing_has_no_estimate() {
        let mut estimator = RecursiveStateEstimate::new(4.0, 0.5, 1e-3);
        let history = frames(&[1000.0, 1010.0, 1020.0]);
        assert!(matches!(
            estimate(&mut estimator, &history, 0.0),
            Falltime::Unavailable(NoEstimateReason::VelocityBelowEpsilon { .. })
        ));
    }
}
