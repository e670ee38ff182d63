//! Time-to-landing estimation for a descending high-altitude balloon payload.
//!
//! Telemetry frames are read by a [`connection::Connection`], fed one at a time
//! into a [`location::track::FlightSession`], which latches freefall through a
//! hysteresis detector and then hands the post-burst history to one of the
//! [`prediction::FalltimeEstimator`] variants.

pub mod configuration;
pub mod connection;
pub mod location;
pub mod parse;
pub mod prediction;
pub mod retrieve;
pub mod utilities;

lazy_static::lazy_static! {
    pub static ref DATETIME_FORMAT: String = "%Y-%m-%d %H:%M:%S".to_string();
    pub static ref DEFAULT_LANDING_ALTITUDE: f64 = 0.0;
    pub static ref DEFAULT_SPLINE_HORIZON: chrono::Duration = chrono::Duration::hours(2);
    pub static ref LOG_LEVEL: log::Level = log::Level::Info;
}
