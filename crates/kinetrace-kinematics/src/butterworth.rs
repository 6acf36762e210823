//! Zero-phase Butterworth low-pass filter with automatic cutoff selection.
//!
//! A second order low-pass is applied forward then backward over the series,
//! which cancels the phase lag. The cutoff is chosen by sweeping candidate
//! frequencies between 0.5 Hz and Nyquist and scoring how much structure is
//! left in the residuals (Durbin-Watson). An ideal cutoff leaves residuals
//! that look like white noise.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::padding::reflect_pad;

/// Samples reflected at each end before filtering.
pub const DEFAULT_PADDING: usize = 10;

/// Series this short or shorter are not filtered.
pub const MIN_FILTER_SAMPLES: usize = 10;

/// Lowest candidate cutoff, in Hz.
pub const MIN_CUTOFF_HZ: f64 = 0.5;

/// Number of times the filter is applied (forward + backward).
const PASSES: f64 = 2.0;

/// Residual energy, relative to the signal energy, under which the filter
/// is considered to have reproduced the signal exactly.
const NEGLIGIBLE_RESIDUAL: f64 = 1e-20;

/// The outcome of filtering with one candidate cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringResult {
    /// Cutoff frequency in Hz.
    pub cutoff: f64,
    pub data: Vec<f64>,
    /// Normalized Durbin-Watson score, `|2 - DW| / 2`. Lower is better.
    pub score: f64,
}

/// Every tested cutoff of one series, with the automatic choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSeries {
    pub results: Vec<FilteringResult>,
    /// Candidate with the lowest score.
    pub best_index: usize,
    selected: usize,
}

impl FilteredSeries {
    fn new(results: Vec<FilteringResult>, best_index: usize) -> Self {
        Self {
            results,
            best_index,
            selected: best_index,
        }
    }

    /// Override the automatic choice. Returns false if `index` is not a
    /// tested candidate.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.results.len() {
            return false;
        }
        self.selected = index;
        true
    }

    /// Revert to the automatic choice.
    pub fn select_best(&mut self) {
        self.selected = self.best_index;
    }

    #[inline]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn best(&self) -> &FilteringResult {
        &self.results[self.best_index]
    }

    pub fn selected(&self) -> &FilteringResult {
        &self.results[self.selected]
    }
}

/// Second order Butterworth low-pass applied with zero phase.
#[derive(Debug, Clone, Copy)]
pub struct ButterworthFilter {
    pub padding: usize,
}

impl Default for ButterworthFilter {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Coefficients {
    a0: f64,
    a1: f64,
    a2: f64,
    b1: f64,
    b2: f64,
}

impl Coefficients {
    fn low_pass(sampling_rate: f64, cutoff: f64) -> Self {
        // Filtering twice lowers the -3 dB point; move the cutoff up so the
        // cascade has the requested one.
        let correction = (2f64.powf(1.0 / PASSES) - 1.0).powf(0.25);
        let omega = (std::f64::consts::PI * cutoff / sampling_rate).tan() / correction;
        let k1 = std::f64::consts::SQRT_2 * omega;
        let k2 = omega * omega;
        let a0 = k2 / (1.0 + k1 + k2);
        let a1 = 2.0 * a0;
        let a2 = a0;
        let k3 = 2.0 * a0 / k2;
        let b1 = -2.0 * a0 + k3;
        let b2 = 1.0 - a0 - a1 - a2 - b1;
        Self { a0, a1, a2, b1, b2 }
    }

    /// One causal pass. The first two outputs are the inputs, which also
    /// seed the recursion.
    fn run(&self, input: &[f64], output: &mut Vec<f64>) {
        output.clear();
        if input.len() < 2 {
            output.extend_from_slice(input);
            return;
        }

        let (mut x0, mut x1) = (input[1], input[0]);
        let (mut y0, mut y1) = (input[1], input[0]);
        output.push(input[0]);
        output.push(input[1]);

        for &x in &input[2..] {
            let x2 = x1;
            x1 = x0;
            x0 = x;
            let y2 = y1;
            y1 = y0;
            y0 = self.a0 * x0 + self.a1 * x1 + self.a2 * x2 + self.b1 * y1 + self.b2 * y2;
            output.push(y0);
        }
    }
}

impl ButterworthFilter {
    /// Filter `samples` at a single cutoff frequency, with zero phase.
    pub fn filter(&self, samples: &[f64], sampling_rate: f64, cutoff: f64) -> Vec<f64> {
        if samples.is_empty() {
            return Vec::new();
        }

        let coefficients = Coefficients::low_pass(sampling_rate, cutoff);
        let padded = reflect_pad(samples, self.padding);

        let mut forward = Vec::with_capacity(padded.len());
        coefficients.run(&padded, &mut forward);

        forward.reverse();
        let mut backward = Vec::with_capacity(padded.len());
        coefficients.run(&forward, &mut backward);
        backward.reverse();

        backward[self.padding..self.padding + samples.len()].to_vec()
    }

    /// Filter `samples` at `tests` cutoffs evenly spaced from 0.5 Hz toward
    /// Nyquist and pick the one whose residuals are least autocorrelated.
    ///
    /// Returns `None` if the series is too short to filter or no candidate
    /// produced a finite score.
    pub fn filter_series(&self, samples: &[f64], sampling_rate: f64, tests: usize) -> Option<FilteredSeries> {
        if samples.len() <= MIN_FILTER_SAMPLES || tests == 0 {
            return None;
        }

        let cutoffs = candidate_cutoffs(sampling_rate, tests);
        let results: Vec<FilteringResult> = cutoffs
            .into_par_iter()
            .filter_map(|cutoff| {
                let data = self.filter(samples, sampling_rate, cutoff);
                let score = normalized_durbin_watson(samples, &data);
                score.is_finite().then_some(FilteringResult { cutoff, data, score })
            })
            .collect();

        let best_index = results
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.score.total_cmp(&b.score))
            .map(|(i, _)| i)?;

        debug!(
            samples = samples.len(),
            candidates = results.len(),
            cutoff = results[best_index].cutoff,
            score = results[best_index].score,
            "Selected filter cutoff"
        );

        Some(FilteredSeries::new(results, best_index))
    }
}

/// Cutoffs from 0.5 Hz in `tests` equal steps strictly below Nyquist.
pub fn candidate_cutoffs(sampling_rate: f64, tests: usize) -> Vec<f64> {
    let nyquist = sampling_rate / 2.0;
    if nyquist.is_nan() || nyquist <= MIN_CUTOFF_HZ || tests == 0 {
        return Vec::new();
    }
    let step = (nyquist - MIN_CUTOFF_HZ) / tests as f64;
    (0..tests).map(|i| MIN_CUTOFF_HZ + step * i as f64).collect()
}

/// `|2 - DW| / 2` of the residuals between a series and its filtered form.
///
/// 0 means the residuals show no first-order autocorrelation. A filter that
/// reproduces the series exactly leaves no residual and also scores 0.
pub fn normalized_durbin_watson(raw: &[f64], filtered: &[f64]) -> f64 {
    let residuals: Vec<f64> = raw.iter().zip(filtered).map(|(r, f)| r - f).collect();

    let energy: f64 = residuals.iter().map(|e| e * e).sum();
    let scale: f64 = raw.iter().map(|r| r * r).sum::<f64>().max(1.0);
    if energy <= NEGLIGIBLE_RESIDUAL * scale {
        return 0.0;
    }

    let differences: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    let dw = differences / energy;
    (2.0 - dw).abs() / 2.0
}
