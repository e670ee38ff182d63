use chrono::TimeZone;

pub fn approx_equal(a: f64, b: f64, decimal_precision: u8) -> bool {
    let p = 10f64.powi(-(decimal_precision as i32));
    (a - b).abs() < p
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d"];

/// Parse a telemetry timestamp.
///
/// Accepts RFC 3339 with an offset, or a naive datetime which is taken to be UTC
/// (radiosonde logs are written in UTC without a zone designator).
pub fn parse_datetime(value: &str) -> Result<chrono::DateTime<chrono::Utc>, ParseError> {
    let value = value.trim();
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&chrono::Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(value, format) {
            return Ok(chrono::Utc.from_utc_datetime(&datetime));
        }
        if let Ok(date) = chrono::NaiveDate::parse_from_str(value, format) {
            if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
                return Ok(chrono::Utc.from_utc_datetime(&datetime));
            }
        }
    }

    Err(ParseError::InvalidDatetime {
        value: value.to_string(),
    })
}

pub fn parse_float(value: &str) -> Result<f64, ParseError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|error| ParseError::InvalidNumber {
            value: value.to_string(),
            message: error.to_string(),
        })
}

custom_error::custom_error! {#[derive(PartialEq)] pub ParseError
    InvalidDatetime {value:String} = "could not parse datetime from \"{value}\"",
    InvalidNumber {value:String, message:String} = "could not parse number from \"{value}\"; {message}",
    MissingField {index:usize, count:usize} = "field {index} requested but line has {count} fields",
}
