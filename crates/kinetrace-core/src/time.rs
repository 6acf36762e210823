//! Time representation for tracked samples.
//!
//! Samples carry an absolute timestamp in video ticks. Converting tick
//! distances into seconds is the calibration's job; frame rates are kept
//! rational so that NTSC rates produce exact sample intervals.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::error::{KineTraceError, Result};

/// Absolute timestamp of a sample, in video ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    #[inline]
    pub const fn ticks(self) -> i64 {
        self.0
    }
}

impl Add<i64> for Timestamp {
    type Output = Self;
    fn add(self, rhs: i64) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub for Timestamp {
    type Output = i64;
    fn sub(self, rhs: Self) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
///
/// Deserialized rates are checked with [`FrameRate::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FrameRateData")]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

#[derive(Deserialize)]
struct FrameRateData {
    numerator: u32,
    denominator: u32,
}

impl TryFrom<FrameRateData> for FrameRate {
    type Error = KineTraceError;

    fn try_from(data: FrameRateData) -> Result<Self> {
        Self::try_new(data.numerator, data.denominator)
    }
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Create a frame rate, rejecting a zero numerator or denominator.
    pub fn try_new(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(KineTraceError::InvalidParameter(format!(
                "frame rate {}/{} must be positive",
                numerator, denominator
            )));
        }
        Ok(Self::new(numerator, denominator))
    }

    /// Approximate a floating point rate, keeping three decimals.
    pub fn from_fps_f64(fps: f64) -> Self {
        let numerator = (fps * 1000.0).round().max(1.0) as u32;
        let reduced = Rational64::new(numerator as i64, 1000);
        Self::new(*reduced.numer() as u32, *reduced.denom() as u32)
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame in seconds, exact. `None` for a zero rate.
    #[inline]
    pub fn frame_duration(self) -> Option<Rational64> {
        (self.numerator != 0).then(|| Rational64::new(self.denominator as i64, self.numerator as i64))
    }

    /// Duration of `intervals` consecutive frame intervals, in seconds.
    ///
    /// Undefined (NaN) for a zero rate.
    pub fn span_seconds(self, intervals: u32) -> f64 {
        match self.frame_duration() {
            Some(duration) => {
                let span = duration * Rational64::from_integer(intervals as i64);
                *span.numer() as f64 / *span.denom() as f64
            }
            None => crate::UNDEFINED,
        }
    }

    /// Common frame rates
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_60: Self = Self::new(60, 1);
    pub const FPS_120: Self = Self::new(120, 1);
    pub const FPS_240: Self = Self::new(240, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}
