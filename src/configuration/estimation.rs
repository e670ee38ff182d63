use serde_with::serde_as;

fn default_velocity_epsilon() -> f64 {
    1e-3
}

#[derive(serde::Deserialize, PartialEq, Debug, Clone)]
pub struct EstimationConfiguration {
    /// descent rates below this (m/s) are treated as the sensor going to zero
    #[serde(default = "default_velocity_epsilon")]
    pub velocity_epsilon: f64,
    #[serde(default)]
    pub detection: DetectionConfiguration,
    #[serde(default)]
    pub spline: SplineConfiguration,
    #[serde(default)]
    pub atmosphere: AtmosphereConfiguration,
    #[serde(default)]
    pub kalman: KalmanConfiguration,
}

impl Default for EstimationConfiguration {
    fn default() -> Self {
        Self {
            velocity_epsilon: default_velocity_epsilon(),
            detection: DetectionConfiguration::default(),
            spline: SplineConfiguration::default(),
            atmosphere: AtmosphereConfiguration::default(),
            kalman: KalmanConfiguration::default(),
        }
    }
}

fn default_threshold() -> i32 {
    -4
}

fn default_ceiling() -> i32 {
    10
}

/// Hysteresis bounds of the freefall detector.
#[derive(serde::Deserialize, PartialEq, Debug, Clone)]
pub struct DetectionConfiguration {
    /// score at or below which freefall is confirmed
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    /// cap on the score accumulated while climbing
    #[serde(default = "default_ceiling")]
    pub ceiling: i32,
}

impl Default for DetectionConfiguration {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            ceiling: default_ceiling(),
        }
    }
}

fn default_horizon() -> chrono::Duration {
    *crate::DEFAULT_SPLINE_HORIZON
}

fn default_thin_air_altitude() -> f64 {
    15000.0
}

#[serde_as]
#[derive(serde::Deserialize, PartialEq, Debug, Clone)]
pub struct SplineConfiguration {
    #[serde(default = "default_horizon")]
    #[serde_as(as = "serde_with::DurationSeconds<i64>")]
    pub horizon: chrono::Duration,
    #[serde(default = "default_thin_air_altitude")]
    pub thin_air_altitude: f64,
    #[serde(default)]
    pub debug_curve: bool,
}

impl Default for SplineConfiguration {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            thin_air_altitude: default_thin_air_altitude(),
            debug_curve: false,
        }
    }
}

fn default_scale_height() -> f64 {
    7200.0
}

#[derive(serde::Deserialize, PartialEq, Debug, Clone)]
pub struct AtmosphereConfiguration {
    #[serde(default = "default_scale_height")]
    pub scale_height: f64,
}

impl Default for AtmosphereConfiguration {
    fn default() -> Self {
        Self {
            scale_height: default_scale_height(),
        }
    }
}

fn default_altitude_noise() -> f64 {
    4.0
}

fn default_acceleration_noise() -> f64 {
    0.5
}

#[derive(serde::Deserialize, PartialEq, Debug, Clone)]
pub struct KalmanConfiguration {
    /// GPS altitude jitter variance, m^2
    #[serde(default = "default_altitude_noise")]
    pub altitude_noise: f64,
    #[serde(default = "default_acceleration_noise")]
    pub acceleration_noise: f64,
}

impl Default for KalmanConfiguration {
    fn default() -> Self {
        Self {
            altitude_noise: default_altitude_noise(),
            acceleration_noise: default_acceleration_noise(),
        }
    }
}
