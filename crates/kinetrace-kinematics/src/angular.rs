//! Angular kinematics of a trajectory around its best-fit circle.
//!
//! Each sample's angle is measured about the circle center from the +X
//! axis. The displacement between two samples is the smaller of the two
//! arcs, so motion faster than half a turn per sample is misread.

use std::f64::consts::TAU;

use kinetrace_core::{Calibration, Point2};

use crate::circle::Circle;
use crate::error::KinematicsResult;
use crate::padding::mark_undefined;
use crate::series::{Quantity, TimeSeriesCollection};
use crate::trajectory::CalibratedTrajectory;

/// Angle from `o→a` to `o→b`, in radians, in (-π, π].
pub fn signed_angle(o: Point2, a: Point2, b: Point2) -> f64 {
    let u = a - o;
    let v = b - o;
    u.perp_dot(v).atan2(u.dot(v))
}

/// Angle of `p` about `center` from the +X axis, in [0, 2π).
pub fn absolute_angle(center: Point2, p: Point2) -> f64 {
    let angle = signed_angle(center, center + Point2::X, p);
    if angle < 0.0 {
        TAU + angle
    } else {
        angle
    }
}

/// Unsigned minimal-arc distance between two absolute angles.
#[inline]
pub fn arc_displacement(from: f64, to: f64) -> f64 {
    let d = (to - from).abs();
    d.min(TAU - d)
}

/// Build the angular series of a trajectory about `circle`.
///
/// Returns `None` if the circle is empty.
pub fn angular_kinematics<C>(
    traj: &CalibratedTrajectory,
    circle: &Circle,
    calibration: &C,
) -> KinematicsResult<Option<TimeSeriesCollection>>
where
    C: Calibration + ?Sized,
{
    if circle.is_empty() || traj.is_empty() {
        return Ok(None);
    }

    let n = traj.len();
    let radius = circle.radius;
    let angles: Vec<f64> = traj
        .points()
        .into_iter()
        .map(|p| absolute_angle(circle.center, p))
        .collect();
    let step = |i: usize| arc_displacement(angles[i - 1], angles[i]);

    let mut tsc = TimeSeriesCollection::new(traj.times.clone());

    let mut displacement = vec![0.0; n];
    let mut total = vec![0.0; n];
    let mut sum = 0.0;
    for i in 1..n {
        let d = step(i);
        sum += d;
        displacement[i] = calibration.convert_angle(d);
        total[i] = calibration.convert_angle(sum);
    }
    tsc.insert(
        Quantity::AngularPosition,
        angles.iter().map(|&a| calibration.convert_angle(a)).collect(),
    )?;
    tsc.insert(Quantity::AngularDisplacement, displacement)?;
    tsc.insert(Quantity::TotalAngularDisplacement, total)?;

    // Velocities, in rad/s before conversion.
    let t = calibration.time_span(2);
    let mut omega = vec![kinetrace_core::UNDEFINED; n];
    for i in 1..n.saturating_sub(1) {
        omega[i] = (step(i) + step(i + 1)) / t;
    }
    mark_undefined(&mut omega, 1);

    let angular_velocity = omega.iter().map(|&w| calibration.convert_angular_velocity(w)).collect();
    let tangential_velocity = omega.iter().map(|&w| calibration.convert_speed(w * radius)).collect();
    let centripetal = omega
        .iter()
        .map(|&w| calibration.convert_acceleration(w * w * radius))
        .collect();
    tsc.insert(Quantity::AngularVelocity, angular_velocity)?;
    tsc.insert(Quantity::TangentialVelocity, tangential_velocity)?;
    tsc.insert(Quantity::CentripetalAcceleration, centripetal)?;

    // Accelerations from the mean velocities over [i-2, i] and [i, i+2].
    let mut alpha = vec![kinetrace_core::UNDEFINED; n];
    for i in 2..n.saturating_sub(2) {
        let before = (step(i - 1) + step(i)) / t;
        let after = (step(i + 1) + step(i + 2)) / t;
        alpha[i] = (after - before) / t;
    }
    mark_undefined(&mut alpha, 2);

    let mut angular_acceleration = Vec::with_capacity(n);
    let mut tangential = Vec::with_capacity(n);
    let mut resultant = Vec::with_capacity(n);
    for i in 0..n {
        let at = alpha[i] * radius;
        let ac = omega[i] * omega[i] * radius;
        angular_acceleration.push(calibration.convert_angular_acceleration(alpha[i]));
        tangential.push(calibration.convert_acceleration(at));
        resultant.push(calibration.convert_acceleration(at.hypot(ac)));
    }
    tsc.insert(Quantity::AngularAcceleration, angular_acceleration)?;
    tsc.insert(Quantity::TangentialAcceleration, tangential)?;
    tsc.insert(Quantity::ResultantAcceleration, resultant)?;

    Ok(Some(tsc))
}
