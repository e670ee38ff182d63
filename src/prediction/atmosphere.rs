//! Descent under a parachute through an exponential atmosphere.
//!
//! Terminal velocity goes as `1 / sqrt(density)` and density as `exp(-h / H)`, so the
//! descent rate at altitude `h` is `v0 * exp(h / 2H)` for some sea-level rate `v0`.
//! The rate observed between the last two frames calibrates `v0`, and integrating
//! `dh / v(h)` from the landing altitude up to the current altitude gives
//!
//! ```text
//! t = (2H / v) * (exp((h - L) / 2H) - 1)
//! ```
//!
//! where `v` is the observed rate at `h` and `L` the landing altitude.

use crate::prediction::{EstimatorInput, Falltime, NoEstimateReason};

#[derive(Clone, Debug)]
pub struct AtmosphericDensity {
    /// density scale height, in meters
    pub scale_height: f64,
    pub epsilon: f64,
}

impl AtmosphericDensity {
    pub fn new(scale_height: f64, epsilon: f64) -> Self {
        Self {
            scale_height,
            epsilon,
        }
    }

    /// Density relative to sea level.
    pub fn density_ratio(&self, altitude: f64) -> f64 {
        (-altitude / self.scale_height).exp()
    }

    /// Sea-level descent rate implied by `velocity` observed at `altitude`.
    pub fn sea_level_velocity(&self, velocity: f64, altitude: f64) -> f64 {
        velocity * self.density_ratio(altitude).sqrt()
    }

    /// Descent rate at `altitude` for a payload with the given sea-level rate.
    pub fn velocity_at(&self, sea_level_velocity: f64, altitude: f64) -> f64 {
        sea_level_velocity / self.density_ratio(altitude).sqrt()
    }

    pub fn estimate(&self, input: &EstimatorInput) -> Falltime {
        let interval = crate::utilities::seconds(input.delta_t);
        if interval <= 0.0 {
            return Falltime::Unavailable(NoEstimateReason::ZeroInterval);
        }

        let velocity = input.delta_altitude / interval;
        if !(velocity >= self.epsilon) {
            return Falltime::Unavailable(NoEstimateReason::VelocityBelowEpsilon { velocity });
        }
        if input.altitude <= input.landing_altitude {
            return Falltime::AtOrBelowLanding;
        }

        let double_height = 2.0 * self.scale_height;
        let remaining = double_height / velocity
            * ((input.altitude - input.landing_altitude) / double_height).exp_m1();
        log::trace!(
            "sea-level descent rate {:.2} m/s",
            self.sea_level_velocity(velocity, input.altitude)
        );
        Falltime::Remaining(remaining)
    }
}
