use crate::prediction::{EstimatorInput, Falltime, NoEstimateReason};

/// "At this rate" extrapolation from the two most recent frames.
#[derive(Clone, Debug)]
pub struct RawVelocity {
    pub epsilon: f64,
}

impl RawVelocity {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn estimate(&self, input: &EstimatorInput) -> Falltime {
        let interval = crate::utilities::seconds(input.delta_t);
        if interval <= 0.0 {
            return Falltime::Unavailable(NoEstimateReason::ZeroInterval);
        }

        let velocity = input.delta_altitude / interval;
        let falltime = crate::prediction::falltime_at_velocity(
            input.altitude,
            input.landing_altitude,
            velocity,
            self.epsilon,
        );
        if let Falltime::Unavailable(reason) = falltime {
            log::debug!("{:}", reason);
        }
        falltime
    }
}
