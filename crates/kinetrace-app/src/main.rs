//! KineTrace - motion analysis from tracked trajectories.
//!
//! Loads a trajectory file, computes its kinematics under a uniform
//! calibration and writes the series as CSV.

mod export;

use anyhow::{bail, Context, Result};
use kinetrace_core::{AngleUnit, FrameRate, UniformCalibration};
use kinetrace_kinematics::{analyze_trajectory, KinematicsConfig, Quantity};
use kinetrace_tracking::TrajectoryFile;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "\
Usage: kinetrace <trajectory.json> [options]

Options:
  --out <file.csv>          Write CSV here instead of stdout
  --fps <rate>              Capture frame rate (default 30)
  --scale <px-per-unit>     Pixels per calibrated length unit (default 1)
  --origin <x,y>            Pixel position of the calibrated origin
  --y-up                    Calibrated Y axis points up
  --radians                 Report angles in radians instead of degrees
  --calibration <file>      Load the calibration from JSON (overrides the above)
  --config <file>           Load the kinematics configuration from JSON";

#[derive(Debug, Default)]
struct Options {
    input: PathBuf,
    output: Option<PathBuf>,
    calibration: UniformCalibration,
    calibration_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut options = Options::default();
    let mut input = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().with_context(|| format!("{} needs a value", name));
        match arg.as_str() {
            "--out" => options.output = Some(PathBuf::from(value("--out")?)),
            "--fps" => {
                let fps: f64 = value("--fps")?.parse().context("--fps is not a number")?;
                if !(fps.is_finite() && fps > 0.0) {
                    bail!("--fps must be positive");
                }
                options.calibration.frame_rate = FrameRate::from_fps_f64(fps);
            }
            "--scale" => {
                let scale: f64 = value("--scale")?.parse().context("--scale is not a number")?;
                if !(scale.is_finite() && scale > 0.0) {
                    bail!("--scale must be positive");
                }
                options.calibration.pixels_per_unit = scale;
            }
            "--origin" => {
                let raw = value("--origin")?;
                let (x, y) = raw.split_once(',').context("--origin expects x,y")?;
                options.calibration.origin = [
                    x.trim().parse().context("invalid origin x")?,
                    y.trim().parse().context("invalid origin y")?,
                ];
            }
            "--y-up" => options.calibration.y_up = true,
            "--radians" => options.calibration.angle_unit = AngleUnit::Radians,
            "--calibration" => options.calibration_file = Some(PathBuf::from(value("--calibration")?)),
            "--config" => options.config_file = Some(PathBuf::from(value("--config")?)),
            "-h" | "--help" => bail!("{}", USAGE),
            other if other.starts_with("--") => bail!("Unknown option {}\n\n{}", other, USAGE),
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    bail!("Only one trajectory file can be given\n\n{}", USAGE);
                }
            }
        }
    }

    options.input = input.with_context(|| format!("Missing trajectory file\n\n{}", USAGE))?;
    options.calibration.validate()?;
    Ok(options)
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = parse_args(std::env::args().skip(1))?;
    run(&options)
}

fn run(options: &Options) -> Result<()> {
    let file = TrajectoryFile::load_from_file(&options.input)
        .with_context(|| format!("Failed to load {}", options.input.display()))?;

    let calibration = match &options.calibration_file {
        Some(path) => {
            let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_slice(&data).with_context(|| format!("Invalid calibration in {}", path.display()))?
        }
        None => options.calibration.clone(),
    };

    let config = match &options.config_file {
        Some(path) => {
            let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            KinematicsConfig::from_json(&data)?
        }
        None => KinematicsConfig::default(),
    };

    info!(
        trajectory = %file.trajectory.id,
        points = file.trajectory.len(),
        fps = %calibration.frame_rate,
        "Analyzing trajectory"
    );
    let kinematics = analyze_trajectory(&file.trajectory, &calibration, &config)?;

    if let Some(speed) = kinematics.get(Quantity::Speed) {
        let defined = speed.iter().filter(|v| v.is_finite()).count();
        info!(samples = speed.len(), defined, "Speed series ready");
    }

    match &options.output {
        Some(path) => {
            let out = std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            export::write_csv(&kinematics, std::io::BufWriter::new(out))?;
            info!(path = %path.display(), "Wrote kinematics");
        }
        None => export::write_csv(&kinematics, std::io::stdout().lock())?,
    }
    Ok(())
}
