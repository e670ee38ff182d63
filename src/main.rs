use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    // configuration file to read
    configuration_filename: std::path::PathBuf,

    // estimation method (1: raw velocity, 2: cubic spline, 3: atmospheric density, 4: Kalman)
    #[arg(long)]
    method: Option<u8>,

    // MSL altitude of the expected landing site, in meters
    #[arg(long)]
    landing_altitude: Option<f64>,
}

fn log_fitted_curve(
    times: &[f64],
    altitudes: &[f64],
    spline: &falltime::prediction::spline::CubicSpline,
) {
    if let (Some(first), Some(last)) = (times.first(), times.last()) {
        log::debug!(
            "fitted {:} samples from {:.1} s to {:.1} s after burst; curve ends at {:.1} m (observed {:.1} m)",
            altitudes.len(),
            first,
            last,
            spline.evaluate(*last),
            altitudes.last().copied().unwrap_or(f64::NAN),
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(falltime::LOG_LEVEL.to_level_filter())
        .parse_default_env()
        .init();

    let arguments = Cli::parse();

    let mut configuration =
        falltime::configuration::RunConfiguration::from_file(&arguments.configuration_filename)?;

    // reject an unknown method before touching any telemetry
    if let Some(method) = arguments.method {
        configuration.method = falltime::prediction::EstimationMethod::try_from(method)?;
    }
    if let Some(landing_altitude) = arguments.landing_altitude {
        configuration.landing_altitude = landing_altitude;
    }

    let connection = configuration.telemetry.to_connection();
    let frames = connection.read_frames()?;
    log::info!(
        "read {:} frames from {:}",
        frames.len(),
        configuration.telemetry.path.to_string_lossy()
    );

    let mut session = falltime::location::track::FlightSession::new(
        configuration.name.to_owned(),
        configuration.landing_altitude,
        configuration.method,
        &configuration.estimation,
    );
    if configuration.estimation.spline.debug_curve {
        session.set_curve_observer(Box::new(log_fitted_curve));
    }

    let summary = falltime::retrieve::replay_frames(
        &mut session,
        frames,
        configuration.time.start,
        configuration.time.end,
    );
    log::info!("{:}", summary);

    Ok(())
}
