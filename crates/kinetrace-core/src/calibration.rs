//! Calibration collaborator interface.
//!
//! The calibration model (plane mapping, lens distortion, unit systems) is
//! owned by the surrounding application. The core only queries it through
//! [`Calibration`]. [`UniformCalibration`] is a plain scale + origin
//! implementation used by the command line tool and tests.

use serde::{Deserialize, Serialize};

use crate::error::{KineTraceError, Result};
use crate::geometry::Point2;
use crate::time::{FrameRate, Timestamp};

/// Queries the kinematics engine makes against the calibration.
///
/// Raw quantities handed to the `convert_*` methods are expressed in
/// calibrated length units, seconds and radians.
pub trait Calibration: Send + Sync {
    /// Map a raw pixel position at a given time to calibrated coordinates.
    fn map_to_calibrated(&self, point: Point2, timestamp: Timestamp) -> Point2;

    /// Elapsed time, in seconds, covered by `intervals` sample intervals.
    fn time_span(&self, intervals: u32) -> f64;

    /// Capture rate of the footage, used as the sampling frequency.
    fn capture_frames_per_second(&self) -> f64;

    fn convert_length(&self, value: f64) -> f64;
    fn convert_speed(&self, value: f64) -> f64;
    fn convert_acceleration(&self, value: f64) -> f64;

    /// Convert an acceleration obtained by differentiating already
    /// converted velocities.
    fn convert_acceleration_from_velocity(&self, value: f64) -> f64 {
        value
    }

    fn convert_angle(&self, radians: f64) -> f64;
    fn convert_angular_velocity(&self, radians_per_second: f64) -> f64;
    fn convert_angular_acceleration(&self, radians_per_second_sq: f64) -> f64;
}

/// Unit used for reported angular quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    #[inline]
    fn convert(self, value: f64) -> f64 {
        match self {
            Self::Degrees => value.to_degrees(),
            Self::Radians => value,
        }
    }
}

/// Uniform scale calibration: one length unit per `pixels_per_unit` pixels,
/// measured from `origin`.
///
/// `pixels_per_unit` must be finite and positive; deserialization rejects
/// anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "UniformCalibrationData")]
pub struct UniformCalibration {
    /// Pixel position of the calibrated origin.
    pub origin: [f64; 2],
    /// Pixels per calibrated length unit.
    pub pixels_per_unit: f64,
    /// Flip the vertical axis so that calibrated Y points up.
    pub y_up: bool,
    /// Capture frame rate of the footage.
    pub frame_rate: FrameRate,
    /// Unit of reported angles.
    pub angle_unit: AngleUnit,
}

#[derive(Deserialize)]
struct UniformCalibrationData {
    origin: [f64; 2],
    pixels_per_unit: f64,
    y_up: bool,
    frame_rate: FrameRate,
    angle_unit: AngleUnit,
}

impl TryFrom<UniformCalibrationData> for UniformCalibration {
    type Error = KineTraceError;

    fn try_from(data: UniformCalibrationData) -> Result<Self> {
        let calibration = Self {
            origin: data.origin,
            pixels_per_unit: data.pixels_per_unit,
            y_up: data.y_up,
            frame_rate: data.frame_rate,
            angle_unit: data.angle_unit,
        };
        calibration.validate()?;
        Ok(calibration)
    }
}

impl UniformCalibration {
    /// Check the scale, origin and frame rate.
    pub fn validate(&self) -> Result<()> {
        if !(self.pixels_per_unit.is_finite() && self.pixels_per_unit > 0.0) {
            return Err(KineTraceError::InvalidParameter(format!(
                "pixels_per_unit must be positive, got {}",
                self.pixels_per_unit
            )));
        }
        if !self.origin.iter().all(|v| v.is_finite()) {
            return Err(KineTraceError::InvalidParameter("origin must be finite".into()));
        }
        FrameRate::try_new(self.frame_rate.numerator, self.frame_rate.denominator)?;
        Ok(())
    }

    /// 1:1 pixel calibration at the given frame rate, angles in radians.
    pub fn identity(frame_rate: FrameRate) -> Self {
        Self {
            origin: [0.0, 0.0],
            pixels_per_unit: 1.0,
            y_up: false,
            frame_rate,
            angle_unit: AngleUnit::Radians,
        }
    }
}

impl Default for UniformCalibration {
    fn default() -> Self {
        Self {
            angle_unit: AngleUnit::Degrees,
            ..Self::identity(FrameRate::default())
        }
    }
}

impl Calibration for UniformCalibration {
    fn map_to_calibrated(&self, point: Point2, _timestamp: Timestamp) -> Point2 {
        let scale = 1.0 / self.pixels_per_unit;
        let x = (point.x - self.origin[0]) * scale;
        let y = (point.y - self.origin[1]) * scale;
        if self.y_up {
            Point2::new(x, -y)
        } else {
            Point2::new(x, y)
        }
    }

    fn time_span(&self, intervals: u32) -> f64 {
        self.frame_rate.span_seconds(intervals)
    }

    fn capture_frames_per_second(&self) -> f64 {
        self.frame_rate.to_fps_f64()
    }

    fn convert_length(&self, value: f64) -> f64 {
        value
    }

    fn convert_speed(&self, value: f64) -> f64 {
        value
    }

    fn convert_acceleration(&self, value: f64) -> f64 {
        value
    }

    fn convert_angle(&self, radians: f64) -> f64 {
        self.angle_unit.convert(radians)
    }

    fn convert_angular_velocity(&self, radians_per_second: f64) -> f64 {
        self.angle_unit.convert(radians_per_second)
    }

    fn convert_angular_acceleration(&self, radians_per_second_sq: f64) -> f64 {
        self.angle_unit.convert(radians_per_second_sq)
    }
}
