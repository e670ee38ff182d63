use std::io::prelude::BufRead;

fn default_time_field() -> usize {
    0
}

fn default_latitude_field() -> usize {
    3
}

fn default_longitude_field() -> usize {
    4
}

fn default_altitude_field() -> usize {
    5
}

/// Column indices of a delimited telemetry log.
///
/// Defaults follow radiosonde_auto_rx logs:
/// `<datetime>,<serial>,<frame_no>,<lat>,<lon>,<alt>,<temp>,<sonde_type>,<freq>`
#[derive(serde::Deserialize, PartialEq, Debug, Clone)]
pub struct FieldLayout {
    #[serde(default = "default_time_field")]
    pub time: usize,
    #[serde(default = "default_latitude_field")]
    pub latitude: usize,
    #[serde(default = "default_longitude_field")]
    pub longitude: usize,
    #[serde(default = "default_altitude_field")]
    pub altitude: usize,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            time: default_time_field(),
            latitude: default_latitude_field(),
            longitude: default_longitude_field(),
            altitude: default_altitude_field(),
        }
    }
}

impl FieldLayout {
    fn field<'a>(
        &self,
        fields: &[&'a str],
        index: usize,
    ) -> Result<&'a str, crate::parse::ParseError> {
        fields
            .get(index)
            .copied()
            .ok_or(crate::parse::ParseError::MissingField {
                index,
                count: fields.len(),
            })
    }

    pub fn parse_line(
        &self,
        line: &str,
        delimiter: &str,
    ) -> Result<crate::location::TelemetryFrame, crate::parse::ParseError> {
        let fields: Vec<&str> = line.split(delimiter).collect();

        let time = crate::parse::parse_datetime(self.field(&fields, self.time)?)?;
        let latitude = crate::parse::parse_float(self.field(&fields, self.latitude)?)?;
        let longitude = crate::parse::parse_float(self.field(&fields, self.longitude)?)?;
        let altitude = crate::parse::parse_float(self.field(&fields, self.altitude)?)?;

        Ok(crate::location::TelemetryFrame::new(
            time,
            latitude,
            longitude,
            Some(altitude),
        ))
    }
}

fn read_lines(
    path: &std::path::PathBuf,
) -> Result<Vec<String>, crate::connection::ConnectionError> {
    let file = std::fs::File::open(path).map_err(|error| {
        crate::connection::ConnectionError::FailedToEstablish {
            connection: path.to_string_lossy().to_string(),
            message: error.to_string(),
        }
    })?;

    let reader = std::io::BufReader::new(file);
    let mut lines: Vec<String> = vec![];
    for line in reader.lines() {
        match line {
            Ok(line) => lines.push(line),
            Err(error) => {
                return Err(crate::connection::ConnectionError::ReadFailure {
                    connection: path.to_string_lossy().to_string(),
                    message: error.to_string(),
                })
            }
        }
    }

    Ok(lines)
}

#[derive(Debug, PartialEq, Clone)]
pub struct TelemetryTextFile {
    pub path: std::path::PathBuf,
    pub delimiter: String,
    pub fields: FieldLayout,
}

impl TelemetryTextFile {
    pub fn new(path: std::path::PathBuf) -> Result<Self, crate::connection::ConnectionError> {
        if path.exists() {
            Ok(Self {
                path,
                delimiter: String::from(","),
                fields: FieldLayout::default(),
            })
        } else {
            Err(crate::connection::ConnectionError::FailedToEstablish {
                connection: path.to_string_lossy().to_string(),
                message: "path does not exist".to_string(),
            })
        }
    }

    pub fn read_frames_from_file(
        &self,
    ) -> Result<Vec<crate::location::TelemetryFrame>, crate::connection::ConnectionError> {
        let lines = read_lines(&self.path)?;

        let mut frames: Vec<crate::location::TelemetryFrame> = vec![];
        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match self.fields.parse_line(line, &self.delimiter) {
                Ok(mut frame) => {
                    frame.source = crate::location::FrameSource::TextFile(self.path.to_owned());
                    frames.push(frame);
                }
                Err(error) => {
                    log::error!("discarding read of {:?}: {:}", self.path, error);
                    return Err(crate::connection::ConnectionError::ParseFailure {
                        connection: self.path.to_string_lossy().to_string(),
                        record: index + 1,
                        message: error.to_string(),
                    });
                }
            }
        }

        Ok(frames)
    }
}

#[cfg(feature = "geojson")]
#[derive(Debug, PartialEq, Clone)]
pub struct GeoJsonFile {
    pub path: std::path::PathBuf,
}

#[cfg(feature = "geojson")]
impl GeoJsonFile {
    pub fn new(path: std::path::PathBuf) -> Self {
        Self { path }
    }

    fn parse_failure(&self, record: usize, message: String) -> crate::connection::ConnectionError {
        crate::connection::ConnectionError::ParseFailure {
            connection: self.path.to_string_lossy().to_string(),
            record,
            message,
        }
    }

    pub fn read_frames_from_geojson(
        &self,
    ) -> Result<Vec<crate::location::TelemetryFrame>, crate::connection::ConnectionError> {
        use chrono::TimeZone;

        let contents = read_lines(&self.path)?.join("\n");
        let parsed = contents
            .parse::<geojson::GeoJson>()
            .map_err(|error| self.parse_failure(0, error.to_string()))?;

        let collection = match parsed {
            geojson::GeoJson::FeatureCollection(collection) => collection,
            _ => {
                return Err(self.parse_failure(0, "expected a FeatureCollection".to_string()));
            }
        };

        let mut frames: Vec<crate::location::TelemetryFrame> = vec![];
        for (index, feature) in collection.features.iter().enumerate() {
            let point = match feature.geometry.as_ref().map(|geometry| &geometry.value) {
                Some(geojson::GeometryValue::Point { coordinates }) => coordinates,
                Some(other) => {
                    log::error!("discarding read of {:?}: feature {:} is not a point", self.path, index);
                    return Err(self.parse_failure(
                        index,
                        format!("expected a Point geometry, found {:}", other.type_name()),
                    ));
                }
                None => {
                    return Err(self.parse_failure(index, "feature has no geometry".to_string()));
                }
            };
            if point.len() < 2 {
                return Err(self.parse_failure(index, "point has fewer than two coordinates".to_string()));
            }

            let time = match feature.properties.as_ref().and_then(|properties| properties.get("time")) {
                Some(serde_json::Value::String(time)) => crate::parse::parse_datetime(time)
                    .map_err(|error| self.parse_failure(index, error.to_string()))?,
                Some(serde_json::Value::Number(time)) => match time
                    .as_i64()
                    .and_then(|seconds| chrono::Utc.timestamp_opt(seconds, 0).single())
                {
                    Some(time) => time,
                    None => {
                        return Err(self.parse_failure(index, format!("invalid timestamp {:}", time)));
                    }
                },
                _ => {
                    return Err(self.parse_failure(index, "feature has no time".to_string()));
                }
            };

            let mut frame =
                crate::location::TelemetryFrame::new(time, point[1], point[0], point.as_slice().get(2).copied());
            frame.source = crate::location::FrameSource::GeoJsonFile(self.path.to_owned());
            frames.push(frame);
        }

        Ok(frames)
    }
}
