/// Tally of one replay through a flight session.
#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub name: String,
    pub accepted: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub burst_time: Option<chrono::DateTime<chrono::Utc>>,
    /// per-frame results, in input order, for every frame inside the time window
    pub results: Vec<(
        chrono::DateTime<chrono::Utc>,
        crate::location::track::EstimateResult,
    )>,
}

impl ReplaySummary {
    pub fn estimates(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, result)| result.seconds().is_some())
            .count()
    }

    /// The most recent frame time and estimated landing time, if any frame produced one.
    pub fn last_landing_time(
        &self,
    ) -> Option<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> {
        self.results.iter().rev().find_map(|(time, result)| {
            result
                .time_to_ground()
                .and_then(|time_to_ground| time.checked_add_signed(time_to_ground))
                .map(|landing_time| (*time, landing_time))
        })
    }
}

impl std::fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{: <8} - {:} frames accepted - {:} rejected - {:} outside time window",
            self.name, self.accepted, self.rejected, self.skipped
        )?;
        match self.burst_time {
            Some(burst_time) => write!(
                f,
                " - burst at {:} - {:} estimates",
                burst_time.format(&crate::DATETIME_FORMAT),
                self.estimates()
            )?,
            None => write!(f, " - freefall not detected")?,
        }
        if let Some((_, landing_time)) = self.last_landing_time() {
            write!(
                f,
                " - last estimated landing: {:}",
                landing_time.format(&crate::DATETIME_FORMAT)
            )?;
        }
        Ok(())
    }
}

/// Feed frames to the session in order, skipping those outside `[start_time, end_time]`.
pub fn replay_frames(
    session: &mut crate::location::track::FlightSession,
    frames: Vec<crate::location::TelemetryFrame>,
    start_time: Option<chrono::DateTime<chrono::Utc>>,
    end_time: Option<chrono::DateTime<chrono::Utc>>,
) -> ReplaySummary {
    let mut summary = ReplaySummary {
        name: session.name.to_owned(),
        ..Default::default()
    };

    for frame in frames {
        if let Some(start_time) = start_time {
            if frame.time < start_time {
                log::trace!(
                    "skipped frame from before {:}; {:}",
                    start_time.to_rfc3339(),
                    frame.time.to_rfc3339()
                );
                summary.skipped += 1;
                continue;
            }
        }

        if let Some(end_time) = end_time {
            if frame.time > end_time {
                log::trace!(
                    "skipped frame from after {:}; {:}",
                    end_time.to_rfc3339(),
                    frame.time.to_rfc3339()
                );
                summary.skipped += 1;
                continue;
            }
        }

        let time = frame.time;
        let result = session.update(frame);
        if result.is_rejected() {
            summary.rejected += 1;
        } else {
            summary.accepted += 1;
            log::debug!("{:}", frame_update(session, &result));
        }
        summary.results.push((time, result));
    }

    summary.burst_time = session.burst_time();
    summary
}

fn frame_update(
    session: &crate::location::track::FlightSession,
    result: &crate::location::track::EstimateResult,
) -> String {
    let history = session.history();
    let mut message = format!("{: <8} - frame #{:}", session.name, history.len());

    if let Some(frame) = history.last() {
        message += &format!(
            " ({:.5}, {:.5}",
            frame.location.x(),
            frame.location.y()
        );
        if let Some(altitude) = frame.altitude {
            message += &format!(", {:.1} m", altitude);
        }
        message += ")";
        message += &format!("; frame time is {:}", frame.time.to_rfc3339());

        if let Some(time_to_ground) = result.time_to_ground() {
            message += &format!(
                " - {:} - estimated landing: {:}",
                session.method(),
                crate::utilities::duration_string(time_to_ground),
            );
            if let Some(landing_time) = frame.time.checked_add_signed(time_to_ground) {
                message += &format!(" ({:})", landing_time.format(&crate::DATETIME_FORMAT));
            }
            return message;
        }
    }

    message += &format!(" - {:}", result);
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::track::EstimateResult;
    use chrono::TimeZone;

    fn fixture_frames() -> Vec<crate::location::TelemetryFrame> {
        let path = std::path::PathBuf::from(format!(
            "{:}/{:}",
            env!("CARGO_MANIFEST_DIR"),
            "data/telemetry/M2913209_RS92.log"
        ));
        crate::connection::file::TelemetryTextFile::new(path)
            .unwrap()
            .read_frames_from_file()
            .unwrap()
    }

    fn session(method: crate::prediction::EstimationMethod) -> crate::location::track::FlightSession {
        crate::location::track::FlightSession::new(
            String::from("M2913209"),
            300.0,
            method,
            &crate::configuration::estimation::EstimationConfiguration::default(),
        )
    }

    #[test]
    fn test_replay_fixture() {
        let mut session = session(crate::prediction::EstimationMethod::RawVelocity);

        let summary = replay_frames(&mut session, fixture_frames(), None, None);

        assert_eq!(summary.accepted, 234);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.results.len(), 234);

        // peak at frame 159 with the score capped at 10; the 14th frame below it
        // brings the score to -4 and the next one confirms
        assert!(summary.results[..174]
            .iter()
            .all(|(_, result)| *result == EstimateResult::NotInFreefall));
        assert_eq!(
            summary.burst_time,
            Some(chrono::Utc.with_ymd_and_hms(2017, 12, 27, 0, 47, 20).unwrap())
        );
        assert!(summary.results[174..233]
            .iter()
            .all(|(_, result)| result.seconds().is_some_and(|seconds| seconds > 0.0)));
        assert_eq!(summary.results[233].1, EstimateResult::AtOrBelowLanding);
        assert_eq!(summary.estimates(), 59);
        assert!(summary.last_landing_time().is_some());
    }

    #[test]
    fn test_every_method_estimates_the_fixture() {
        for method in [
            crate::prediction::EstimationMethod::RawVelocity,
            crate::prediction::EstimationMethod::SplineExtrapolation,
            crate::prediction::EstimationMethod::AtmosphericDensity,
            crate::prediction::EstimationMethod::RecursiveStateEstimate,
        ] {
            let mut session = session(method);
            let summary = replay_frames(&mut session, fixture_frames(), None, None);
            assert!(summary.estimates() > 0, "{:} gave no estimates", method);
            // last frame is 290 m, below the landing site
            assert_eq!(summary.results[233].1.seconds(), None);
        }
    }

    #[test]
    fn test_time_window() {
        let frames = fixture_frames();
        let start_time = frames[100].time;
        let end_time = frames[200].time;
        let mut session = session(crate::prediction::EstimationMethod::RawVelocity);

        let summary = replay_frames(&mut session, frames, Some(start_time), Some(end_time));

        assert_eq!(summary.accepted, 101);
        assert_eq!(summary.skipped, 133);
        assert_eq!(summary.results.first().map(|(time, _)| *time), Some(start_time));
        assert_eq!(summary.results.last().map(|(time, _)| *time), Some(end_time));
        assert_eq!(summary.results[73].1, EstimateResult::NotInFreefall);
        assert!(summary.results[74].1.seconds().is_some());
    }

    #[test]
    fn test_out_of_order_frames_are_counted() {
        let mut frames = fixture_frames();
        frames.swap(10, 11);
        let mut session = session(crate::prediction::EstimationMethod::RawVelocity);

        let summary = replay_frames(&mut session, frames, None, None);

        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.accepted, 233);
        assert!(summary.results[11].1.is_rejected());
    }

    #[test]
    fn test_summary_display() {
        let mut session = session(crate::prediction::EstimationMethod::RawVelocity);
        let summary = replay_frames(&mut session, vec![], None, None);
        assert_eq!(
            summary.to_string(),
            "M2913209 - 0 frames accepted - 0 rejected - 0 outside time window - freefall not detected"
        );
    }

    #[test]
    fn test_unrepresentable_landing_time() {
        // implausibly high payload; the atmospheric model runs off the calendar
        let frames: Vec<crate::location::TelemetryFrame> = (0..14)
            .map(|second| {
                let altitude = if second <= 3 {
                    899700.0 + 100.0 * second as f64
                } else {
                    900300.0 - 100.0 * second as f64
                };
                crate::location::TelemetryFrame::new(
                    chrono::Utc.with_ymd_and_hms(2017, 12, 27, 0, 0, 0).unwrap()
                        + chrono::Duration::seconds(second),
                    -34.9,
                    138.5,
                    Some(altitude),
                )
            })
            .collect();
        let mut session = session(crate::prediction::EstimationMethod::AtmosphericDensity);

        let summary = replay_frames(&mut session, frames, None, None);

        let seconds = summary.results[13].1.seconds().unwrap();
        assert!(seconds > 1e20);
        assert_eq!(summary.results[13].1.time_to_ground(), None);
        assert_eq!(summary.last_landing_time(), None);
        let message = summary.to_string();
        assert!(message.contains("2 estimates"));
        assert!(!message.contains("last estimated landing"));
    }
}
