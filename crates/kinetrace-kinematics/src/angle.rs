//! Kinematics of an angle defined by three tracked points.
//!
//! The angle is formed at the origin `o` between the legs to `a` and `b`.
//! All three trajectories must be sampled at the same times.

use std::f64::consts::TAU;

use kinetrace_core::{Calibration, Point2};
use serde::{Deserialize, Serialize};

use crate::angular::signed_angle;
use crate::error::{KinematicsError, KinematicsResult};
use crate::padding::mark_undefined;
use crate::series::{Quantity, TimeSeriesCollection};
use crate::trajectory::CalibratedTrajectory;

/// How the angle value is derived from the three points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AngleOptions {
    /// Keep negative angles instead of wrapping to [0, 2π).
    pub signed: bool,
    /// Measure from leg `a` to leg `b` instead of `b` to `a`.
    pub ccw: bool,
    /// Measure the supplementary angle, against the extension of leg `a`
    /// beyond the origin.
    pub supplementary: bool,
}

/// The three trajectories defining an angle.
#[derive(Debug, Clone, Copy)]
pub struct AngleTrajectories<'a> {
    pub origin: &'a CalibratedTrajectory,
    pub leg_a: &'a CalibratedTrajectory,
    pub leg_b: &'a CalibratedTrajectory,
}

impl AngleTrajectories<'_> {
    fn check_aligned(&self) -> KinematicsResult<()> {
        let times = &self.origin.times;
        if &self.leg_a.times != times || &self.leg_b.times != times {
            return Err(KinematicsError::MisalignedTrajectories(format!(
                "origin {} samples, leg a {}, leg b {}",
                times.len(),
                self.leg_a.times.len(),
                self.leg_b.times.len()
            )));
        }
        Ok(())
    }

    fn at(&self, i: usize) -> (Point2, Point2, Point2) {
        // The origin decides whether filtered data is used for all three.
        if self.origin.can_filter() {
            (
                self.origin.coordinates(i),
                self.leg_a.coordinates(i),
                self.leg_b.coordinates(i),
            )
        } else {
            (
                self.origin.raw_coordinates(i),
                self.leg_a.raw_coordinates(i),
                self.leg_b.raw_coordinates(i),
            )
        }
    }
}

/// Angle value at one sample, in radians.
pub fn angle_value(o: Point2, a: Point2, b: Point2, options: AngleOptions) -> f64 {
    let (a, b) = if options.supplementary {
        (b, 2.0 * o - a)
    } else {
        (a, b)
    };
    let angle = if options.ccw {
        signed_angle(o, a, b)
    } else {
        signed_angle(o, b, a)
    };
    if !options.signed && angle < 0.0 {
        TAU + angle
    } else {
        angle
    }
}

/// Build the angular series of a three-point angle.
///
/// Tangential and centripetal quantities use the length of leg `b` as the
/// radius at each sample.
pub fn angle_kinematics<C>(
    trajectories: AngleTrajectories<'_>,
    options: AngleOptions,
    calibration: &C,
) -> KinematicsResult<TimeSeriesCollection>
where
    C: Calibration + ?Sized,
{
    trajectories.check_aligned()?;
    let n = trajectories.origin.len();
    let mut tsc = TimeSeriesCollection::new(trajectories.origin.times.clone());

    let mut positions = Vec::with_capacity(n);
    let mut radii = Vec::with_capacity(n);
    for i in 0..n {
        let (o, a, b) = trajectories.at(i);
        positions.push(angle_value(o, a, b, options));
        radii.push(o.distance(b));
    }

    let first = positions.first().copied().unwrap_or_default();
    let displacement = (0..n)
        .map(|i| if i == 0 { 0.0 } else { positions[i] - positions[i - 1] })
        .map(|d| calibration.convert_angle(d))
        .collect();
    let total = positions
        .iter()
        .map(|p| calibration.convert_angle(p - first))
        .collect();
    tsc.insert(
        Quantity::AngularPosition,
        positions.iter().map(|&p| calibration.convert_angle(p)).collect(),
    )?;
    tsc.insert(Quantity::AngularDisplacement, displacement)?;
    tsc.insert(Quantity::TotalAngularDisplacement, total)?;

    let t = calibration.time_span(2);
    let mut omega = vec![kinetrace_core::UNDEFINED; n];
    for i in 1..n.saturating_sub(1) {
        omega[i] = (positions[i + 1] - positions[i - 1]) / t;
    }
    mark_undefined(&mut omega, 1);

    let mut alpha = vec![kinetrace_core::UNDEFINED; n];
    for i in 2..n.saturating_sub(2) {
        alpha[i] = (omega[i + 1] - omega[i - 1]) / t;
    }
    mark_undefined(&mut alpha, 2);

    let mut angular_velocity = Vec::with_capacity(n);
    let mut tangential_velocity = Vec::with_capacity(n);
    let mut angular_acceleration = Vec::with_capacity(n);
    let mut tangential = Vec::with_capacity(n);
    let mut centripetal = Vec::with_capacity(n);
    let mut resultant = Vec::with_capacity(n);
    for i in 0..n {
        let r = radii[i];
        angular_velocity.push(calibration.convert_angular_velocity(omega[i]));
        tangential_velocity.push(calibration.convert_speed(r * omega[i]));

        // Acceleration-level quantities share the wider undefined margin.
        let (at, ac) = if alpha[i].is_nan() {
            (kinetrace_core::UNDEFINED, kinetrace_core::UNDEFINED)
        } else {
            (r * alpha[i], r * omega[i] * omega[i])
        };
        angular_acceleration.push(calibration.convert_angular_acceleration(alpha[i]));
        tangential.push(calibration.convert_acceleration(at));
        centripetal.push(calibration.convert_acceleration(ac));
        resultant.push(calibration.convert_acceleration(at.hypot(ac)));
    }
    tsc.insert(Quantity::AngularVelocity, angular_velocity)?;
    tsc.insert(Quantity::TangentialVelocity, tangential_velocity)?;
    tsc.insert(Quantity::AngularAcceleration, angular_acceleration)?;
    tsc.insert(Quantity::TangentialAcceleration, tangential)?;
    tsc.insert(Quantity::CentripetalAcceleration, centripetal)?;
    tsc.insert(Quantity::ResultantAcceleration, resultant)?;

    Ok(tsc)
}
