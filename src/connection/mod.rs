pub mod file;

/// A finite telemetry source; every read starts over from the beginning of the source.
pub enum Connection {
    TelemetryTextFile(crate::connection::file::TelemetryTextFile),
    #[cfg(feature = "geojson")]
    GeoJsonFile(crate::connection::file::GeoJsonFile),
}

impl Connection {
    /// Read every frame in source order, or fail as a whole on the first bad record.
    pub fn read_frames(&self) -> Result<Vec<crate::location::TelemetryFrame>, ConnectionError> {
        match self {
            Self::TelemetryTextFile(connection) => connection.read_frames_from_file(),
            #[cfg(feature = "geojson")]
            Self::GeoJsonFile(connection) => connection.read_frames_from_geojson(),
        }
    }
}

custom_error::custom_error! {pub ConnectionError
    FailedToEstablish {connection:String, message:String} = "failed to establish connection to {connection}; {message}",
    ReadFailure {connection:String, message:String} = "failed to read from {connection}; {message}",
    ParseFailure {connection:String, record:usize, message:String} = "{connection} record {record}: {message}",
}
