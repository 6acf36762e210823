//! Calibrated coordinates of a trajectory, raw and filtered.

use kinetrace_core::{Calibration, Point2, Timestamp};
use kinetrace_tracking::Trajectory;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::butterworth::{ButterworthFilter, FilteredSeries, MIN_FILTER_SAMPLES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// A trajectory mapped to calibrated space, with optional per-axis filter
/// sweeps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibratedTrajectory {
    pub times: Vec<Timestamp>,
    pub raw_xs: Vec<f64>,
    pub raw_ys: Vec<f64>,
    pub filter_x: Option<FilteredSeries>,
    pub filter_y: Option<FilteredSeries>,
}

impl CalibratedTrajectory {
    /// Map timed pixel positions to calibrated coordinates.
    pub fn from_samples<C>(samples: impl IntoIterator<Item = (Point2, Timestamp)>, calibration: &C) -> Self
    where
        C: Calibration + ?Sized,
    {
        let mut traj = Self::default();
        for (position, timestamp) in samples {
            let p = calibration.map_to_calibrated(position, timestamp);
            traj.times.push(timestamp);
            traj.raw_xs.push(p.x);
            traj.raw_ys.push(p.y);
        }
        traj
    }

    pub fn from_trajectory<C>(trajectory: &Trajectory, calibration: &C) -> Self
    where
        C: Calibration + ?Sized,
    {
        Self::from_samples(
            trajectory.points().iter().map(|p| (p.position, p.timestamp)),
            calibration,
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Run the cutoff sweep on both axes, in parallel.
    ///
    /// Trajectories of 10 samples or fewer are left unfiltered.
    pub fn filter(&mut self, sampling_rate: f64, cutoff_tests: usize) {
        self.filter_x = None;
        self.filter_y = None;
        if self.len() <= MIN_FILTER_SAMPLES {
            debug!(samples = self.len(), "Trajectory too short to filter");
            return;
        }

        let filter = ButterworthFilter::default();
        let (xs, ys) = (&self.raw_xs, &self.raw_ys);
        let (fx, fy) = rayon::join(
            || filter.filter_series(xs, sampling_rate, cutoff_tests),
            || filter.filter_series(ys, sampling_rate, cutoff_tests),
        );
        self.filter_x = fx;
        self.filter_y = fy;
    }

    /// Both axes have a filtered series.
    #[inline]
    pub fn can_filter(&self) -> bool {
        self.filter_x.is_some() && self.filter_y.is_some()
    }

    /// Override the automatic cutoff of one axis.
    pub fn select_cutoff(&mut self, axis: Axis, index: usize) -> bool {
        let series = match axis {
            Axis::X => self.filter_x.as_mut(),
            Axis::Y => self.filter_y.as_mut(),
        };
        series.map_or(false, |s| s.select(index))
    }

    /// X coordinates used for kinematics: filtered if available, else raw.
    pub fn xs(&self) -> &[f64] {
        match (&self.filter_x, &self.filter_y) {
            (Some(fx), Some(_)) => &fx.selected().data,
            _ => &self.raw_xs,
        }
    }

    pub fn ys(&self) -> &[f64] {
        match (&self.filter_x, &self.filter_y) {
            (Some(_), Some(fy)) => &fy.selected().data,
            _ => &self.raw_ys,
        }
    }

    #[inline]
    pub fn coordinates(&self, index: usize) -> Point2 {
        Point2::new(self.xs()[index], self.ys()[index])
    }

    #[inline]
    pub fn raw_coordinates(&self, index: usize) -> Point2 {
        Point2::new(self.raw_xs[index], self.raw_ys[index])
    }

    /// Coordinates used for kinematics, as points.
    pub fn points(&self) -> Vec<Point2> {
        self.xs()
            .iter()
            .zip(self.ys())
            .map(|(&x, &y)| Point2::new(x, y))
            .collect()
    }
}
