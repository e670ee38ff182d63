pub mod freefall;

use crate::prediction::{EstimationMethod, Falltime, NoEstimateReason};

/// Result of feeding one frame to a [`FlightSession`].
#[derive(Clone, Debug, PartialEq)]
pub enum EstimateResult {
    /// seconds from the frame's timestamp until the payload reaches landing altitude
    Estimate { seconds: f64 },
    AtOrBelowLanding,
    NotInFreefall,
    Rejected(RejectionReason),
    NoEstimate(NoEstimateReason),
}

impl EstimateResult {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Estimate { seconds } => Some(*seconds),
            _ => None,
        }
    }

    /// `None` when the estimate is too large to express as a duration.
    pub fn time_to_ground(&self) -> Option<chrono::Duration> {
        self.seconds().and_then(crate::utilities::duration_from_seconds)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl std::fmt::Display for EstimateResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Estimate { seconds } => write!(f, "{:.1} s to landing", seconds),
            Self::AtOrBelowLanding => write!(f, "payload at or below landing altitude"),
            Self::NotInFreefall => write!(f, "not in freefall"),
            Self::Rejected(reason) => write!(f, "rejected; {:}", reason),
            Self::NoEstimate(reason) => write!(f, "no estimate; {:}", reason),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RejectionReason {
    InvalidFrame(crate::location::FrameError),
    OutOfOrder {
        newest: chrono::DateTime<chrono::Utc>,
        received: chrono::DateTime<chrono::Utc>,
    },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFrame(error) => write!(f, "invalid frame; {:}", error),
            Self::OutOfOrder { newest, received } => write!(
                f,
                "frame from {:} is older than accepted frame from {:}",
                received.to_rfc3339(),
                newest.to_rfc3339()
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Sample {
    time: chrono::DateTime<chrono::Utc>,
    altitude: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Burst {
    time: chrono::DateTime<chrono::Utc>,
    index: usize,
}

/// Estimation state of one tracked payload.
///
/// Frames must arrive in timestamp order; invalid or older frames are rejected
/// without touching any state, so re-delivered input is harmless.
pub struct FlightSession {
    pub name: String,
    landing_altitude: f64,
    detector: freefall::FreefallDetector,
    estimator: crate::prediction::FalltimeEstimator,
    configuration: crate::configuration::estimation::EstimationConfiguration,
    history: Vec<crate::location::TelemetryFrame>,
    last_sample: Option<Sample>,
    burst: Option<Burst>,
    estimate_valid: bool,
    curve_observer: Option<crate::prediction::spline::CurveObserver>,
}

impl FlightSession {
    pub fn new(
        name: String,
        landing_altitude: f64,
        method: EstimationMethod,
        configuration: &crate::configuration::estimation::EstimationConfiguration,
    ) -> Self {
        Self {
            name,
            landing_altitude,
            detector: freefall::FreefallDetector::from_configuration(&configuration.detection),
            estimator: crate::prediction::FalltimeEstimator::new(method, configuration),
            configuration: configuration.to_owned(),
            history: vec![],
            last_sample: None,
            burst: None,
            estimate_valid: false,
            curve_observer: None,
        }
    }

    pub fn landing_altitude(&self) -> f64 {
        self.landing_altitude
    }

    pub fn set_landing_altitude(&mut self, landing_altitude: f64) {
        if landing_altitude != self.landing_altitude {
            log::debug!(
                "{: <8} - landing altitude changed from {:.1} m to {:.1} m",
                self.name,
                self.landing_altitude,
                landing_altitude
            );
            self.landing_altitude = landing_altitude;
        }
    }

    pub fn method(&self) -> EstimationMethod {
        self.estimator.method()
    }

    /// Switch estimator; a new estimator starts without any filter state of the old one.
    pub fn set_method(&mut self, method: EstimationMethod) {
        if method != self.method() {
            log::debug!(
                "{: <8} - switching estimation from {:} to {:}",
                self.name,
                self.method(),
                method
            );
            self.estimator = crate::prediction::FalltimeEstimator::new(method, &self.configuration);
        }
    }

    /// Attach a debug observer receiving every curve fitted by the spline method.
    pub fn set_curve_observer(&mut self, observer: crate::prediction::spline::CurveObserver) {
        self.curve_observer = Some(observer);
    }

    pub fn history(&self) -> &[crate::location::TelemetryFrame] {
        &self.history
    }

    /// Frames from the burst onwards; empty before freefall is confirmed.
    pub fn history_since_burst(&self) -> &[crate::location::TelemetryFrame] {
        match self.burst {
            Some(burst) => &self.history[burst.index..],
            None => &[],
        }
    }

    pub fn freefall_confirmed(&self) -> bool {
        self.detector.confirmed()
    }

    pub fn freefall_score(&self) -> i32 {
        self.detector.score()
    }

    pub fn phase(&self) -> freefall::FlightPhase {
        self.detector.phase()
    }

    pub fn burst_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.burst.map(|burst| burst.time)
    }

    pub fn last_altitude(&self) -> Option<f64> {
        self.last_sample.map(|sample| sample.altitude)
    }

    pub fn last_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.last_sample.map(|sample| sample.time)
    }

    /// Whether the most recent update produced a numeric estimate.
    pub fn estimate_valid(&self) -> bool {
        self.estimate_valid
    }

    fn accept(&self, frame: &crate::location::TelemetryFrame) -> Result<f64, RejectionReason> {
        let altitude = frame.validate().map_err(RejectionReason::InvalidFrame)?;
        if let Some(last) = self.last_sample {
            if frame.time < last.time {
                return Err(RejectionReason::OutOfOrder {
                    newest: last.time,
                    received: frame.time,
                });
            }
        }
        Ok(altitude)
    }

    fn reject(&self, reason: RejectionReason) -> EstimateResult {
        log::warn!("{: <8} - {:}", self.name, reason);
        EstimateResult::Rejected(reason)
    }

    /// Feed the next frame, returning an estimate once freefall is confirmed.
    pub fn update(&mut self, frame: crate::location::TelemetryFrame) -> EstimateResult {
        match self.accept(&frame) {
            Ok(altitude) => self.advance(frame, altitude),
            Err(reason) => self.reject(reason),
        }
    }

    /// Like [`FlightSession::update`], also revising the landing altitude and method
    /// for this and later frames. A rejected frame changes neither.
    pub fn update_with(
        &mut self,
        frame: crate::location::TelemetryFrame,
        landing_altitude: f64,
        method: EstimationMethod,
    ) -> EstimateResult {
        match self.accept(&frame) {
            Ok(altitude) => {
                self.set_landing_altitude(landing_altitude);
                self.set_method(method);
                self.advance(frame, altitude)
            }
            Err(reason) => self.reject(reason),
        }
    }

    fn advance(&mut self, frame: crate::location::TelemetryFrame, altitude: f64) -> EstimateResult {
        let time = frame.time;
        let previous = self.last_sample.replace(Sample { time, altitude });
        self.history.push(frame);

        let was_confirmed = self.detector.confirmed();
        self.detector.update(altitude);

        if !self.detector.confirmed() {
            self.estimate_valid = false;
            return EstimateResult::NotInFreefall;
        }

        if !was_confirmed {
            log::info!(
                "{: <8} - freefall confirmed at {:} ({:.1} m)",
                self.name,
                time.to_rfc3339(),
                altitude
            );
            self.burst = Some(Burst {
                time,
                index: self.history.len() - 1,
            });
        }

        let (delta_t, delta_altitude) = match previous {
            Some(previous) => (time - previous.time, (previous.altitude - altitude).abs()),
            None => (chrono::Duration::zero(), 0.0),
        };

        let burst = match self.burst {
            Some(burst) => burst,
            None => return EstimateResult::NotInFreefall,
        };
        let input = crate::prediction::EstimatorInput {
            delta_t,
            delta_altitude,
            altitude,
            landing_altitude: self.landing_altitude,
            burst_time: burst.time,
            history: &self.history[burst.index..],
        };

        let result = match self.estimator.estimate(&input, self.curve_observer.as_mut()) {
            Falltime::Remaining(seconds) => EstimateResult::Estimate { seconds },
            Falltime::AtOrBelowLanding => EstimateResult::AtOrBelowLanding,
            Falltime::Unavailable(reason) => EstimateResult::NoEstimate(reason),
        };
        self.estimate_valid = matches!(result, EstimateResult::Estimate { .. });
        result
    }
}
