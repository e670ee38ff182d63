pub mod track;

#[derive(Clone, Debug)]
pub struct TelemetryFrame {
    pub time: chrono::DateTime<chrono::Utc>,
    pub location: geo::Point,
    pub altitude: Option<f64>,
    pub source: FrameSource,
}

impl PartialEq for TelemetryFrame {
    fn eq(&self, other: &Self) -> bool {
        self.time.eq(&other.time)
            && crate::parse::approx_equal(self.location.x(), other.location.x(), 6)
            && crate::parse::approx_equal(self.location.y(), other.location.y(), 6)
            && match self.altitude {
                Some(altitude) => match other.altitude {
                    Some(other_altitude) => crate::parse::approx_equal(altitude, other_altitude, 4),
                    None => false,
                },
                None => other.altitude.is_none(),
            }
    }
}

impl TelemetryFrame {
    pub fn new(
        time: chrono::DateTime<chrono::Utc>,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
    ) -> Self {
        Self {
            time,
            location: geo::point!(x: longitude, y: latitude),
            altitude,
            source: FrameSource::None,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    /// Check that the frame can enter a session history, returning its altitude.
    ///
    /// Negative altitudes are treated as corrupted telemetry rather than
    /// below-sea-level positions.
    pub fn validate(&self) -> Result<f64, FrameError> {
        let latitude = self.latitude();
        let longitude = self.longitude();
        if !latitude.is_finite()
            || !longitude.is_finite()
            || latitude.abs() > 90.0
            || longitude.abs() > 180.0
        {
            return Err(FrameError::InvalidPosition {
                latitude,
                longitude,
            });
        }

        match self.altitude {
            Some(altitude) if !altitude.is_finite() => {
                Err(FrameError::NonFiniteAltitude { altitude })
            }
            Some(altitude) if altitude < 0.0 => Err(FrameError::NegativeAltitude { altitude }),
            Some(altitude) => Ok(altitude),
            None => Err(FrameError::MissingAltitude { time: self.time }),
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq)]
pub enum FrameSource {
    TextFile(std::path::PathBuf),
    GeoJsonFile(std::path::PathBuf),
    #[default]
    None,
}

custom_error::custom_error! {#[derive(Clone, PartialEq)] pub FrameError
    MissingAltitude {time: chrono::DateTime<chrono::Utc>} = "frame at {time} has no altitude",
    NonFiniteAltitude {altitude: f64} = "altitude {altitude} is not a finite number",
    NegativeAltitude {altitude: f64} = "negative altitude {altitude} m",
    InvalidPosition {latitude: f64, longitude: f64} = "invalid position ({latitude}, {longitude})",
}
