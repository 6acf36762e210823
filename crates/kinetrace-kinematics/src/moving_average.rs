//! Centered moving average used as a second smoothing pass on derivatives.
//!
//! Differentiating high frame rate footage amplifies digitization noise: the
//! time step shrinks faster than the spatial precision improves. Averaging
//! over a fixed time span brings the noise back to what a lower frame rate
//! would give.

use crate::padding::reflect_pad;

/// Centered moving average over a window expressed in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct MovingAverage {
    /// Width of the averaging window, in milliseconds.
    pub span_ms: f64,
}

impl MovingAverage {
    pub fn new(span_ms: f64) -> Self {
        Self { span_ms }
    }

    /// Number of samples on each side of the center for a given rate.
    ///
    /// 0 when half the span does not exceed one sampling interval.
    pub fn half_window(&self, sampling_rate: f64) -> usize {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 || self.span_ms <= 0.0 {
            return 0;
        }
        let interval_ms = 1000.0 / sampling_rate;
        let half_span = self.span_ms / 2.0;
        if half_span <= interval_ms {
            return 0;
        }
        (half_span / interval_ms).round() as usize
    }

    /// Smooth a series whose first and last `undefined_margin` values are
    /// the undefined sentinel.
    ///
    /// Sentinel positions are left as they are and never feed the
    /// reflection. The series is returned unchanged if the window would not
    /// span more than one sample each side, or if fewer than two defined
    /// values remain.
    pub fn smooth(&self, samples: &[f64], sampling_rate: f64, undefined_margin: usize) -> Vec<f64> {
        let half = self.half_window(sampling_rate);
        let n = samples.len();
        if half == 0 || n <= 2 * undefined_margin + 1 {
            return samples.to_vec();
        }

        let defined = &samples[undefined_margin..n - undefined_margin];
        if defined.iter().any(|v| !v.is_finite()) {
            return samples.to_vec();
        }

        let padded = reflect_pad(defined, half);
        let width = 2 * half + 1;

        let mut out = samples.to_vec();
        let mut sum: f64 = padded[..width].iter().sum();
        out[undefined_margin] = sum / width as f64;
        for i in 1..defined.len() {
            sum += padded[i + width - 1] - padded[i - 1];
            out[undefined_margin + i] = sum / width as f64;
        }
        out
    }
}
