//! Template matching tracker using normalized cross-correlation.
//!
//! To find the point in frame I:
//! - take the template stored in the point found in frame I-1,
//! - score every placement of it inside a search window centered on the
//!   previous position,
//! - refine the best placement to sub-pixel accuracy,
//! - store a template in the new point for frame I+1.

use kinetrace_core::{GrayImage, PixelRect, Point2, Timestamp};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{TrackingError, TrackingResult};
use crate::params::TrackerParameters;
use crate::point::{Template, TrackedPoint};
use crate::strategy::{TrackOutcome, TrackerOverlay, TrackingStrategy};

/// Peaks at or above this score are exact matches and are not refined.
const EXACT_MATCH: f64 = 1.0 - 1e-6;

/// Correlation score of every placement of a template inside a search area.
///
/// Cell (u, v) holds the score of the template whose top-left corner sits
/// at `(search.x + u, search.y + v)`.
#[derive(Debug, Clone)]
pub struct ScoreMap {
    pub width: usize,
    pub height: usize,
    pub scores: Vec<f64>,
}

impl ScoreMap {
    /// Score every placement of `template` that fits entirely in `search`.
    ///
    /// Returns `None` if the template does not fit. Placements over a
    /// uniform area (zero variance) score 0.
    pub fn compute(frame: &GrayImage, search: PixelRect, template: &Template) -> Option<Self> {
        let tw = template.width as i32;
        let th = template.height as i32;
        if tw == 0 || th == 0 || search.width < tw || search.height < th {
            return None;
        }

        let width = (search.width - tw + 1) as usize;
        let height = (search.height - th + 1) as usize;
        let n = (tw * th) as f64;

        let t_mean = template.pixels.iter().map(|&v| v as f64).sum::<f64>() / n;
        let t_dev: Vec<f64> = template
            .pixels
            .iter()
            .map(|&v| v as f64 - t_mean)
            .collect();
        let t_norm: f64 = t_dev.iter().map(|d| d * d).sum();

        let rows: Vec<Vec<f64>> = (0..height)
            .into_par_iter()
            .map(|v| {
                (0..width)
                    .map(|u| {
                        let ox = search.x + u as i32;
                        let oy = search.y + v as i32;
                        let mut sum = 0.0;
                        let mut sum_sq = 0.0;
                        let mut cross = 0.0;
                        for ty in 0..th {
                            for tx in 0..tw {
                                let i = frame.get(ox + tx, oy + ty) as f64;
                                sum += i;
                                sum_sq += i * i;
                                // The template deviations sum to zero, so the
                                // window mean drops out of the cross term.
                                cross += i * t_dev[(ty * tw + tx) as usize];
                            }
                        }
                        let i_norm = (sum_sq - sum * sum / n).max(0.0);
                        let denom = (t_norm * i_norm).sqrt();
                        if denom > 1e-12 {
                            cross / denom
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        Some(Self {
            width,
            height,
            scores: rows.concat(),
        })
    }

    #[inline]
    pub fn at(&self, u: usize, v: usize) -> f64 {
        self.scores[v * self.width + u]
    }

    /// Location and value of the best finite score.
    pub fn peak(&self) -> Option<(usize, usize, f64)> {
        let mut best: Option<(usize, usize, f64)> = None;
        for v in 0..self.height {
            for u in 0..self.width {
                let s = self.at(u, v);
                if !s.is_finite() {
                    continue;
                }
                if best.map_or(true, |(_, _, b)| s > b) {
                    best = Some((u, v, s));
                }
            }
        }
        best
    }

    /// Score-weighted centroid of the cells within `radius` of the peak.
    ///
    /// The neighborhood is clipped to the map, so border peaks are refined
    /// too. The peak itself is returned when a neighbor is not finite.
    ///
    /// Unlike a plain centroid, cells scoring below `gate` are ignored and
    /// callers skip refinement for exact matches.
    pub fn refine(&self, peak_u: usize, peak_v: usize, radius: u32, gate: f64) -> (f64, f64) {
        let peak = (peak_u as f64, peak_v as f64);
        if radius == 0 {
            return peak;
        }

        let r = radius as i64;
        let mut sx = 0.0;
        let mut sy = 0.0;
        let mut sum = 0.0;
        for dv in -r..=r {
            for du in -r..=r {
                let u = peak_u as i64 + du;
                let v = peak_v as i64 + dv;
                if u < 0 || v < 0 || u >= self.width as i64 || v >= self.height as i64 {
                    continue;
                }
                let value = self.at(u as usize, v as usize);
                if !value.is_finite() {
                    return peak;
                }
                if value < gate {
                    continue;
                }
                sx += du as f64 * value;
                sy += dv as f64 * value;
                sum += value;
            }
        }

        if sum <= 0.0 {
            return peak;
        }
        (peak.0 + sx / sum, peak.1 + sy / sum)
    }
}

/// Tracker locating a point by normalized cross-correlation of its template.
#[derive(Debug, Clone, Default)]
pub struct CorrelationTracker {
    params: TrackerParameters,
}

impl CorrelationTracker {
    pub fn new(params: TrackerParameters) -> Self {
        Self {
            params: params.normalized(),
        }
    }

    fn miss(
        &self,
        last: &TrackedPoint,
        timestamp: Timestamp,
        frame: Option<&GrayImage>,
        history: &[TrackedPoint],
    ) -> TrackOutcome {
        TrackOutcome {
            point: self.create_point(false, last.position, 0.0, timestamp, frame, history),
            matched: false,
        }
    }
}

impl TrackingStrategy for CorrelationTracker {
    fn parameters(&self) -> &TrackerParameters {
        &self.params
    }

    fn track(
        &self,
        history: &[TrackedPoint],
        frame: Option<&GrayImage>,
        timestamp: Timestamp,
    ) -> TrackingResult<TrackOutcome> {
        let last = history.last().ok_or(TrackingError::EmptyHistory)?;
        if timestamp <= last.timestamp {
            return Err(TrackingError::NonIncreasingTimestamp {
                last: last.timestamp,
                given: timestamp,
            });
        }
        // An empty frame carries no pixels to match against.
        let frame = frame.filter(|f| !f.is_empty());

        let (template, image) = match (last.template.as_ref(), frame) {
            (Some(t), Some(f)) if t.size() == self.params.block_window => (t, f),
            _ => {
                debug!(
                    timestamp = %timestamp,
                    "Track failed: no frame, or last point has no usable template"
                );
                return Ok(self.miss(last, timestamp, frame, history));
            }
        };

        // Matching runs on the integer pixel grid; the fractional part of
        // the previous position is re-injected at the end.
        let aligned = last.position.floor();
        let fract = last.position - aligned;
        let search = PixelRect::around(aligned.x as i32, aligned.y as i32, self.params.search_window)
            .intersection(image.bounds());

        let map = search.and_then(|s| ScoreMap::compute(image, s, template).map(|m| (s, m)));
        let Some((search, map)) = map else {
            debug!(timestamp = %timestamp, "Track failed: search window does not fit the template");
            return Ok(self.miss(last, timestamp, frame, history));
        };

        let best = map.peak().filter(|&(_, _, s)| s > self.params.similarity_threshold);
        let Some((peak_u, peak_v, max)) = best else {
            debug!(
                timestamp = %timestamp,
                threshold = self.params.similarity_threshold,
                "Track failed: no candidate above the similarity threshold"
            );
            return Ok(self.miss(last, timestamp, frame, history));
        };

        let (u, v) = if max >= EXACT_MATCH {
            (peak_u as f64, peak_v as f64)
        } else {
            // Only neighbors that would have passed on their own contribute.
            let gate = if max >= self.params.template_update_threshold {
                self.params.template_update_threshold
            } else {
                self.params.similarity_threshold
            };
            map.refine(peak_u, peak_v, self.params.refinement_neighborhood, gate)
        };

        let position = Point2::new(
            search.x as f64 + u + (template.width / 2) as f64 + fract.x,
            search.y as f64 + v + (template.height / 2) as f64 + fract.y,
        );
        debug!(
            timestamp = %timestamp,
            dx = position.x - last.position.x,
            dy = position.y - last.position.y,
            score = max,
            "Tracked point"
        );

        Ok(TrackOutcome {
            point: self.create_point(false, position, max, timestamp, frame, history),
            matched: true,
        })
    }

    fn create_point(
        &self,
        manual: bool,
        position: Point2,
        similarity: f64,
        timestamp: Timestamp,
        frame: Option<&GrayImage>,
        history: &[TrackedPoint],
    ) -> TrackedPoint {
        let similarity = if manual { 1.0 } else { similarity.clamp(0.0, 1.0) };
        let frame = frame.filter(|f| !f.is_empty());

        let previous = history
            .last()
            .filter(|_| !manual && self.params.keeps_template(similarity))
            .and_then(|p| {
                p.template
                    .as_ref()
                    .filter(|t| t.size() == self.params.block_window)
                    .map(|t| (t, p.template_age))
            });

        let (template, template_age) = match previous {
            Some((t, age)) => (Some(t.clone()), age + 1),
            None => (
                frame.map(|f| Template::capture(f, position, self.params.block_window)),
                0,
            ),
        };

        TrackedPoint {
            position,
            timestamp,
            template,
            similarity,
            template_age,
            manual,
        }
    }

    fn overlay(&self, point: &TrackedPoint) -> TrackerOverlay {
        let x = point.position.x.floor() as i32;
        let y = point.position.y.floor() as i32;
        TrackerOverlay {
            search: PixelRect::around(x, y, self.params.search_window),
            block: PixelRect::around(x, y, self.params.block_window),
            similarity: point.similarity,
            template_age: point.template_age,
        }
    }

    fn edit_rectangle(&self, position: Point2) -> PixelRect {
        PixelRect::around(
            position.x.floor() as i32,
            position.y.floor() as i32,
            self.params.search_window,
        )
    }
}
