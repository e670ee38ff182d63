pub mod optional_utc_datetime_string {
    use serde::Deserialize;

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        if let Some(value) = value {
            return Ok(Some(
                crate::parse::parse_datetime(&value).map_err(serde::de::Error::custom)?,
            ));
        }

        Ok(None)
    }
}

/// Fractional seconds of a duration, keeping sub-millisecond telemetry intervals.
pub fn seconds(duration: chrono::Duration) -> f64 {
    match duration.num_microseconds() {
        Some(microseconds) => microseconds as f64 / 1e6,
        None => duration.num_milliseconds() as f64 / 1e3,
    }
}

/// Millisecond-rounded duration, or `None` outside the range chrono can hold.
pub fn duration_from_seconds(seconds: f64) -> Option<chrono::Duration> {
    let milliseconds = (seconds * 1000.0).round();
    if !(milliseconds.abs() < i64::MAX as f64) {
        return None;
    }
    Some(chrono::Duration::milliseconds(milliseconds as i64))
}

pub fn duration_string(duration: chrono::Duration) -> String {
    let mut parts = vec![];

    let days = duration.num_days().abs();
    let hours = duration.num_hours().abs() % 24;
    let minutes = duration.num_minutes().abs() % 60;
    let seconds = duration.num_seconds().abs() % 60;

    if days > 0 {
        parts.push(format!("{:}d", days));
    }

    if hours > 0 {
        parts.push(format!("{:}h", hours));
    }

    if minutes > 0 {
        parts.push(format!("{:}m", minutes));
    }

    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{:}s", seconds));
    }

    if duration < chrono::Duration::zero() {
        parts.push("ago".to_string());
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_string() {
        assert_eq!(
            duration_string(chrono::Duration::seconds(3 * 3600 + 2 * 60 + 1)),
            "3h 2m 1s"
        );
        assert_eq!(duration_string(chrono::Duration::seconds(60)), "1m");
        assert_eq!(duration_string(chrono::Duration::zero()), "0s");
        assert_eq!(duration_string(chrono::Duration::seconds(-90)), "1m 30s ago");
    }

    #[test]
    fn test_seconds() {
        assert_eq!(seconds(chrono::Duration::milliseconds(1500)), 1.5);
        assert_eq!(seconds(chrono::Duration::microseconds(250)), 0.00025);
        assert_eq!(duration_from_seconds(6.0), Some(chrono::Duration::seconds(6)));
    }

    #[test]
    fn test_duration_out_of_range() {
        assert_eq!(duration_from_seconds(1.996e30), None);
        assert_eq!(duration_from_seconds(f64::NAN), None);
        assert_eq!(duration_from_seconds(f64::INFINITY), None);
    }
}
