pub mod estimation;

fn default_name() -> String {
    String::from("unnamed_flight")
}

fn default_landing_altitude() -> f64 {
    *crate::DEFAULT_LANDING_ALTITUDE
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct RunConfiguration {
    #[serde(default = "default_name")]
    pub name: String,
    /// MSL altitude of the predicted landing site, in meters
    #[serde(default = "default_landing_altitude")]
    pub landing_altitude: f64,
    #[serde(default)]
    pub method: crate::prediction::EstimationMethod,
    pub telemetry: TelemetryConfiguration,
    #[serde(default)]
    pub time: TimeConfiguration,
    #[serde(default)]
    pub estimation: estimation::EstimationConfiguration,
}

impl RunConfiguration {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigurationError> {
        let file = std::fs::File::open(path).map_err(|error| ConfigurationError::Unreadable {
            path: path.to_string_lossy().to_string(),
            message: error.to_string(),
        })?;
        serde_yaml::from_reader(file).map_err(|error| ConfigurationError::Invalid {
            path: path.to_string_lossy().to_string(),
            message: error.to_string(),
        })
    }
}

custom_error::custom_error! {pub ConfigurationError
    Unreadable {path:String, message:String} = "could not open configuration {path}; {message}",
    Invalid {path:String, message:String} = "error reading configuration {path}; {message}",
}

#[derive(serde::Deserialize, PartialEq, Debug, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryFormat {
    #[default]
    Text,
    #[cfg(feature = "geojson")]
    GeoJson,
}

fn default_delimiter() -> String {
    String::from(",")
}

#[derive(serde::Deserialize, PartialEq, Debug, Clone)]
pub struct TelemetryConfiguration {
    pub path: std::path::PathBuf,
    #[serde(default)]
    pub format: TelemetryFormat,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub fields: crate::connection::file::FieldLayout,
}

impl TelemetryConfiguration {
    pub fn to_connection(&self) -> crate::connection::Connection {
        match self.format {
            TelemetryFormat::Text => crate::connection::Connection::TelemetryTextFile(
                crate::connection::file::TelemetryTextFile {
                    path: self.path.to_owned(),
                    delimiter: self.delimiter.to_owned(),
                    fields: self.fields.to_owned(),
                },
            ),
            #[cfg(feature = "geojson")]
            TelemetryFormat::GeoJson => crate::connection::Connection::GeoJsonFile(
                crate::connection::file::GeoJsonFile::new(self.path.to_owned()),
            ),
        }
    }
}

#[derive(PartialEq, Debug, serde::Deserialize, Clone, Default)]
pub struct TimeConfiguration {
    #[serde(default)]
    #[serde(with = "crate::utilities::optional_utc_datetime_string")]
    pub start: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    #[serde(with = "crate::utilities::optional_utc_datetime_string")]
    pub end: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_example_1() {
        let path = format!(
            "{:}/{:}",
            env!("CARGO_MANIFEST_DIR"),
            "data/configuration/example_1.yaml"
        );

        let configuration = RunConfiguration::from_file(std::path::Path::new(&path)).unwrap();

        assert_eq!(configuration.name, "M2913209");
        assert_eq!(configuration.landing_altitude, 300.0);
        assert_eq!(
            configuration.method,
            crate::prediction::EstimationMethod::SplineExtrapolation
        );
        assert_eq!(
            configuration.telemetry,
            TelemetryConfiguration {
                path: std::path::PathBuf::from("data/telemetry/M2913209_RS92.log"),
                format: TelemetryFormat::Text,
                delimiter: String::from(","),
                fields: crate::connection::file::FieldLayout::default(),
            }
        );
        assert_eq!(
            configuration.time,
            TimeConfiguration {
                start: Some(
                    chrono::Utc
                        .with_ymd_and_hms(2017, 12, 26, 23, 0, 0)
                        .unwrap()
                ),
                end: None,
            }
        );
        assert_eq!(configuration.estimation.detection.threshold, -5);
        assert_eq!(configuration.estimation.detection.ceiling, 10);
        assert_eq!(
            configuration.estimation.spline.horizon,
            chrono::Duration::seconds(3600)
        );
        assert!(configuration.estimation.spline.debug_curve);
        assert_eq!(configuration.estimation.atmosphere.scale_height, 7200.0);
    }

    #[test]
    fn test_example_2() {
        let path = format!(
            "{:}/{:}",
            env!("CARGO_MANIFEST_DIR"),
            "data/configuration/example_2.yaml"
        );

        let configuration = RunConfiguration::from_file(std::path::Path::new(&path)).unwrap();

        assert_eq!(configuration.name, "unnamed_flight");
        assert_eq!(configuration.landing_altitude, 0.0);
        assert_eq!(
            configuration.method,
            crate::prediction::EstimationMethod::RawVelocity
        );
        assert_eq!(configuration.telemetry.delimiter, ";");
        assert_eq!(
            configuration.telemetry.fields,
            crate::connection::file::FieldLayout {
                time: 0,
                latitude: 1,
                longitude: 2,
                altitude: 3,
            }
        );
        assert_eq!(configuration.time, TimeConfiguration::default());
        assert_eq!(
            configuration.estimation,
            estimation::EstimationConfiguration::default()
        );
    }

    #[test]
    fn test_missing_file() {
        let result = RunConfiguration::from_file(std::path::Path::new("nonexistent.yaml"));
        assert!(matches!(result, Err(ConfigurationError::Unreadable { .. })));
    }

    #[test]
    fn test_unknown_method() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"method: dead_reckoning\ntelemetry:\n  path: flight.log\n",
        )
        .unwrap();
        let result = RunConfiguration::from_file(file.path());
        assert!(matches!(result, Err(ConfigurationError::Invalid { .. })));
    }
}
