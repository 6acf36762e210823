//! Linear kinematics: distance, displacement, velocity and acceleration.
//!
//! Derivatives are centered finite differences. Velocity at sample i uses
//! positions i-1 and i+1, acceleration uses velocities i-1 and i+1, so the
//! first and last one (velocity) or two (acceleration) samples are undefined.

use kinetrace_core::{Calibration, Point2};

use crate::config::KinematicsConfig;
use crate::error::KinematicsResult;
use crate::moving_average::MovingAverage;
use crate::padding::mark_undefined;
use crate::series::{Quantity, TimeSeriesCollection};
use crate::trajectory::CalibratedTrajectory;

#[derive(Debug, Clone, Copy)]
enum Component {
    Magnitude,
    Horizontal,
    Vertical,
}

impl Component {
    fn of(self, v: Point2) -> f64 {
        match self {
            Self::Magnitude => v.length(),
            Self::Horizontal => v.x,
            Self::Vertical => v.y,
        }
    }
}

const VELOCITIES: [(Quantity, Component); 3] = [
    (Quantity::Speed, Component::Magnitude),
    (Quantity::HorizontalVelocity, Component::Horizontal),
    (Quantity::VerticalVelocity, Component::Vertical),
];

const ACCELERATIONS: [(Quantity, Quantity); 3] = [
    (Quantity::Acceleration, Quantity::Speed),
    (Quantity::HorizontalAcceleration, Quantity::HorizontalVelocity),
    (Quantity::VerticalAcceleration, Quantity::VerticalVelocity),
];

/// Build the linear series of a calibrated trajectory.
pub fn linear_kinematics<C>(
    traj: &CalibratedTrajectory,
    calibration: &C,
    config: &KinematicsConfig,
) -> KinematicsResult<TimeSeriesCollection>
where
    C: Calibration + ?Sized,
{
    let mut tsc = TimeSeriesCollection::new(traj.times.clone());
    tsc.insert(Quantity::XRaw, traj.raw_xs.clone())?;
    tsc.insert(Quantity::YRaw, traj.raw_ys.clone())?;
    tsc.insert(Quantity::X, traj.xs().to_vec())?;
    tsc.insert(Quantity::Y, traj.ys().to_vec())?;
    if traj.is_empty() {
        return Ok(tsc);
    }

    let points = traj.points();
    compute_distances(&mut tsc, &points, calibration)?;
    compute_velocities(&mut tsc, &points, calibration, config)?;
    compute_accelerations(&mut tsc, calibration, config)?;
    Ok(tsc)
}

fn compute_distances<C: Calibration + ?Sized>(
    tsc: &mut TimeSeriesCollection,
    points: &[Point2],
    calibration: &C,
) -> KinematicsResult<()> {
    let origin = points[0];
    let mut distance = 0.0;
    let mut total = Vec::with_capacity(points.len());
    let mut horizontal = Vec::with_capacity(points.len());
    let mut vertical = Vec::with_capacity(points.len());

    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            distance += points[i - 1].distance(*p);
        }
        total.push(calibration.convert_length(distance));
        horizontal.push(calibration.convert_length(p.x - origin.x));
        vertical.push(calibration.convert_length(p.y - origin.y));
    }

    tsc.insert(Quantity::TotalDistance, total)?;
    tsc.insert(Quantity::HorizontalDisplacement, horizontal)?;
    tsc.insert(Quantity::VerticalDisplacement, vertical)?;
    Ok(())
}

fn compute_velocities<C: Calibration + ?Sized>(
    tsc: &mut TimeSeriesCollection,
    points: &[Point2],
    calibration: &C,
    config: &KinematicsConfig,
) -> KinematicsResult<()> {
    let n = points.len();
    let t = calibration.time_span(2);
    let smoother = MovingAverage::new(config.velocity_span_ms);
    let rate = calibration.capture_frames_per_second();

    for (quantity, component) in VELOCITIES {
        let mut values = vec![kinetrace_core::UNDEFINED; n];
        for i in 1..n.saturating_sub(1) {
            let d = component.of(points[i + 1] - points[i - 1]);
            values[i] = calibration.convert_speed(d / t);
        }
        mark_undefined(&mut values, 1);
        if config.smooth_derivatives {
            values = smoother.smooth(&values, rate, 1);
        }
        tsc.insert(quantity, values)?;
    }
    Ok(())
}

fn compute_accelerations<C: Calibration + ?Sized>(
    tsc: &mut TimeSeriesCollection,
    calibration: &C,
    config: &KinematicsConfig,
) -> KinematicsResult<()> {
    let n = tsc.len();
    let t = calibration.time_span(2);
    let smoother = MovingAverage::new(config.acceleration_span_ms);
    let rate = calibration.capture_frames_per_second();

    for (quantity, velocity) in ACCELERATIONS {
        let v = &tsc[velocity];
        let mut values = vec![kinetrace_core::UNDEFINED; n];
        for i in 2..n.saturating_sub(2) {
            values[i] = calibration.convert_acceleration_from_velocity((v[i + 1] - v[i - 1]) / t);
        }
        mark_undefined(&mut values, 2);
        if config.smooth_derivatives {
            values = smoother.smooth(&values, rate, 2);
        }
        tsc.insert(quantity, values)?;
    }
    Ok(())
}
