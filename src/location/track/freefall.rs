/// Phase of the flight as far as the detector can tell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlightPhase {
    #[default]
    ClimbingOrFloat,
    /// terminal; a flight only bursts once
    Freefall,
}

impl std::fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightPhase::ClimbingOrFloat => write!(f, "climbing or floating"),
            FlightPhase::Freefall => write!(f, "freefall"),
        }
    }
}

/// Hysteresis latch deciding when a payload has burst.
///
/// Every sample below the reference altitude takes a point off the score, every
/// sample above it raises the reference and adds a point (up to `ceiling`). Once the
/// score has dropped to `threshold`, the next sample confirms freefall, so a single
/// noisy GPS fix cannot trigger it, and a brief climb cannot wipe out a long run of
/// descent. Before the first sample the reference is sea level.
#[derive(Clone, Debug, PartialEq)]
pub struct FreefallDetector {
    phase: FlightPhase,
    score: i32,
    reference_altitude: Option<f64>,
    threshold: i32,
    ceiling: i32,
}

impl Default for FreefallDetector {
    fn default() -> Self {
        Self::new(-4, 10)
    }
}

impl FreefallDetector {
    pub fn new(threshold: i32, ceiling: i32) -> Self {
        Self {
            phase: FlightPhase::ClimbingOrFloat,
            score: 0,
            reference_altitude: None,
            threshold,
            ceiling,
        }
    }

    pub fn from_configuration(
        configuration: &crate::configuration::estimation::DetectionConfiguration,
    ) -> Self {
        Self::new(configuration.threshold, configuration.ceiling)
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn confirmed(&self) -> bool {
        self.phase == FlightPhase::Freefall
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn reference_altitude(&self) -> Option<f64> {
        self.reference_altitude
    }

    /// Consume one altitude sample.
    pub fn update(&mut self, altitude: f64) -> FlightPhase {
        if self.confirmed() {
            return self.phase;
        }

        if self.score <= self.threshold {
            self.phase = FlightPhase::Freefall;
            return self.phase;
        }

        let reference = self.reference_altitude.unwrap_or(0.0);
        if altitude > reference {
            self.reference_altitude = Some(altitude);
            self.score = (self.score + 1).min(self.ceiling);
        } else if altitude < reference {
            // confirmed on the next call
            self.score -= 1;
        }

        self.phase
    }
}
