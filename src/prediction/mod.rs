pub mod atmosphere;
pub mod kalman;
pub mod spline;
pub mod velocity;

/// Selectable time-to-landing method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    #[default]
    RawVelocity,
    SplineExtrapolation,
    AtmosphericDensity,
    RecursiveStateEstimate,
}

impl TryFrom<u8> for EstimationMethod {
    type Error = MethodError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::RawVelocity),
            2 => Ok(Self::SplineExtrapolation),
            3 => Ok(Self::AtmosphericDensity),
            4 => Ok(Self::RecursiveStateEstimate),
            _ => Err(MethodError::UnimplementedMethod { method: value }),
        }
    }
}

impl std::fmt::Display for EstimationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RawVelocity => write!(f, "raw velocity"),
            Self::SplineExtrapolation => write!(f, "cubic spline extrapolation"),
            Self::AtmosphericDensity => write!(f, "atmospheric density"),
            Self::RecursiveStateEstimate => write!(f, "recursive state estimate"),
        }
    }
}

custom_error::custom_error! {#[derive(PartialEq)] pub MethodError
    UnimplementedMethod {method:u8} = "no estimation method numbered {method}; choose 1 (raw velocity), 2 (cubic spline), 3 (atmospheric density) or 4 (recursive state estimate)",
}

/// Everything an estimator may look at for one accepted freefall frame.
pub struct EstimatorInput<'a> {
    /// interval since the previously accepted frame
    pub delta_t: chrono::Duration,
    /// absolute altitude change since the previously accepted frame
    pub delta_altitude: f64,
    pub altitude: f64,
    pub landing_altitude: f64,
    pub burst_time: chrono::DateTime<chrono::Utc>,
    /// frames from burst up to and including the current one
    pub history: &'a [crate::location::TelemetryFrame],
}

/// Outcome of a single estimator call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Falltime {
    Remaining(f64),
    AtOrBelowLanding,
    Unavailable(NoEstimateReason),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoEstimateReason {
    ZeroInterval,
    VelocityBelowEpsilon { velocity: f64 },
    InsufficientSamples { count: usize, required: usize },
    NonMonotonicTime,
    NoCrossing { horizon: f64 },
}

impl std::fmt::Display for NoEstimateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "no time elapsed since the previous frame"),
            Self::VelocityBelowEpsilon { velocity } => write!(
                f,
                "descent velocity {:.4} m/s has gone to zero before altitude",
                velocity
            ),
            Self::InsufficientSamples { count, required } => write!(
                f,
                "{:} samples since burst, {:} required",
                count, required
            ),
            Self::NonMonotonicTime => write!(f, "sample times are not strictly increasing"),
            Self::NoCrossing { horizon } => write!(
                f,
                "curve does not reach landing altitude within {:.0} s",
                horizon
            ),
        }
    }
}

/// Time to fall from `altitude` to `landing_altitude` at a constant `velocity` (m/s, positive down).
pub fn falltime_at_velocity(
    altitude: f64,
    landing_altitude: f64,
    velocity: f64,
    epsilon: f64,
) -> Falltime {
    // also catches NaN
    if !(velocity >= epsilon) {
        return Falltime::Unavailable(NoEstimateReason::VelocityBelowEpsilon { velocity });
    }
    if altitude <= landing_altitude {
        return Falltime::AtOrBelowLanding;
    }
    Falltime::Remaining((altitude - landing_altitude) / velocity)
}

/// The estimator variants, each owned by exactly one flight session.
#[derive(Clone, Debug)]
pub enum FalltimeEstimator {
    RawVelocity(velocity::RawVelocity),
    SplineExtrapolation(spline::SplineExtrapolation),
    AtmosphericDensity(atmosphere::AtmosphericDensity),
    RecursiveStateEstimate(kalman::RecursiveStateEstimate),
}

impl FalltimeEstimator {
    pub fn new(
        method: EstimationMethod,
        configuration: &crate::configuration::estimation::EstimationConfiguration,
    ) -> Self {
        let epsilon = configuration.velocity_epsilon;
        match method {
            EstimationMethod::RawVelocity => Self::RawVelocity(velocity::RawVelocity::new(epsilon)),
            EstimationMethod::SplineExtrapolation => Self::SplineExtrapolation(
                spline::SplineExtrapolation::new(
                    crate::utilities::seconds(configuration.spline.horizon),
                    configuration.spline.thin_air_altitude,
                ),
            ),
            EstimationMethod::AtmosphericDensity => Self::AtmosphericDensity(
                atmosphere::AtmosphericDensity::new(configuration.atmosphere.scale_height, epsilon),
            ),
            EstimationMethod::RecursiveStateEstimate => {
                Self::RecursiveStateEstimate(kalman::RecursiveStateEstimate::new(
                    configuration.kalman.altitude_noise,
                    configuration.kalman.acceleration_noise,
                    epsilon,
                ))
            }
        }
    }

    pub fn method(&self) -> EstimationMethod {
        match self {
            Self::RawVelocity(_) => EstimationMethod::RawVelocity,
            Self::SplineExtrapolation(_) => EstimationMethod::SplineExtrapolation,
            Self::AtmosphericDensity(_) => EstimationMethod::AtmosphericDensity,
            Self::RecursiveStateEstimate(_) => EstimationMethod::RecursiveStateEstimate,
        }
    }

    pub fn estimate(
        &mut self,
        input: &EstimatorInput,
        observer: Option<&mut spline::CurveObserver>,
    ) -> Falltime {
        match self {
            Self::RawVelocity(estimator) => estimator.estimate(input),
            Self::SplineExtrapolation(estimator) => estimator.estimate(input, observer),
            Self::AtmosphericDensity(estimator) => estimator.estimate(input),
            Self::RecursiveStateEstimate(estimator) => estimator.estimate(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_numbers() {
        assert_eq!(
            EstimationMethod::try_from(1u8),
            Ok(EstimationMethod::RawVelocity)
        );
        assert_eq!(
            EstimationMethod::try_from(4u8),
            Ok(EstimationMethod::RecursiveStateEstimate)
        );
        assert_eq!(
            EstimationMethod::try_from(5u8),
            Err(MethodError::UnimplementedMethod { method: 5 })
        );
        assert_eq!(
            EstimationMethod::try_from(0u8),
            Err(MethodError::UnimplementedMethod { method: 0 })
        );
    }

    #[test]
    fn test_falltime_at_velocity() {
        assert_eq!(falltime_at_velocity(900.0, 300.0, 100.0, 1e-3), Falltime::Remaining(6.0));
        assert_eq!(
            falltime_at_velocity(300.0, 300.0, 100.0, 1e-3),
            Falltime::AtOrBelowLanding
        );
        assert!(matches!(
            falltime_at_velocity(900.0, 300.0, f64::NAN, 1e-3),
            Falltime::Unavailable(NoEstimateReason::VelocityBelowEpsilon { .. })
        ));
    }

    #[test]
    fn test_estimator_reports_method() {
        let configuration =
            crate::configuration::estimation::EstimationConfiguration::default();
        for method in [
            EstimationMethod::RawVelocity,
            EstimationMethod::SplineExtrapolation,
            EstimationMethod::AtmosphericDensity,
            EstimationMethod::RecursiveStateEstimate,
        ] {
            assert_eq!(FalltimeEstimator::new(method, &configuration).method(), method);
        }
    }
}
