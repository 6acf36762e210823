//! Trajectory analysis: filtering, differentiation and unit conversion.
//!
//! The analysis is a batch pass over a whole trajectory. [`KinematicsStore`]
//! holds the latest complete result so that readers never observe a
//! partially computed set of series.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use kinetrace_core::{Calibration, Point2, Timestamp};
use kinetrace_tracking::Trajectory;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::angular::angular_kinematics;
use crate::circle::{fit_circle, Circle};
use crate::config::KinematicsConfig;
use crate::error::KinematicsResult;
use crate::linear::linear_kinematics;
use crate::series::{Quantity, TimeSeriesCollection};
use crate::trajectory::CalibratedTrajectory;

/// Everything derived from one trajectory.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryKinematics {
    /// Calibrated coordinates and per-axis filter sweeps.
    pub coordinates: CalibratedTrajectory,
    /// Best-fit circle; empty if the points are degenerate.
    pub circle: Circle,
    pub series: TimeSeriesCollection,
}

impl TrajectoryKinematics {
    #[inline]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, quantity: Quantity) -> Option<&[f64]> {
        self.series.get(quantity)
    }

    /// Value of `quantity` at sample `index`.
    pub fn value(&self, quantity: Quantity, index: usize) -> Option<f64> {
        self.series.value(quantity, index)
    }

    #[inline]
    pub fn is_filtered(&self) -> bool {
        self.coordinates.can_filter()
    }

    #[inline]
    pub fn has_angular(&self) -> bool {
        self.series.contains(Quantity::AngularVelocity)
    }
}

/// Analyze a tracked trajectory.
pub fn analyze_trajectory<C>(
    trajectory: &Trajectory,
    calibration: &C,
    config: &KinematicsConfig,
) -> KinematicsResult<TrajectoryKinematics>
where
    C: Calibration + ?Sized,
{
    analyze_samples(
        trajectory.points().iter().map(|p| (p.position, p.timestamp)),
        calibration,
        config,
    )
}

/// Analyze timed pixel positions.
pub fn analyze_samples<C>(
    samples: impl IntoIterator<Item = (Point2, Timestamp)>,
    calibration: &C,
    config: &KinematicsConfig,
) -> KinematicsResult<TrajectoryKinematics>
where
    C: Calibration + ?Sized,
{
    config.validate()?;
    let mut coordinates = CalibratedTrajectory::from_samples(samples, calibration);
    coordinates.filter(
        calibration.capture_frames_per_second(),
        config.effective_cutoff_tests(),
    );
    analyze_calibrated(coordinates, calibration, config)
}

/// Compute the series from already calibrated and filtered coordinates.
///
/// Used to recompute after overriding a cutoff with
/// [`CalibratedTrajectory::select_cutoff`], without sweeping again.
pub fn analyze_calibrated<C>(
    coordinates: CalibratedTrajectory,
    calibration: &C,
    config: &KinematicsConfig,
) -> KinematicsResult<TrajectoryKinematics>
where
    C: Calibration + ?Sized,
{
    let mut series = linear_kinematics(&coordinates, calibration, config)?;

    let circle = fit_circle(&coordinates.points());
    match angular_kinematics(&coordinates, &circle, calibration)? {
        Some(angular) => series.merge(angular)?,
        None if coordinates.len() >= 3 => {
            debug!(samples = coordinates.len(), "No rotation circle, angular series omitted");
        }
        None => {}
    }

    info!(
        samples = coordinates.len(),
        filtered = coordinates.can_filter(),
        cutoff_x = coordinates.filter_x.as_ref().map(|f| f.selected().cutoff),
        cutoff_y = coordinates.filter_y.as_ref().map(|f| f.selected().cutoff),
        radius = circle.radius,
        "Computed trajectory kinematics"
    );

    Ok(TrajectoryKinematics {
        coordinates,
        circle,
        series,
    })
}

/// Latest kinematics of a trajectory, swapped in atomically.
///
/// Every recomputation takes a generation number when it is requested. A
/// result is only published if no later request has published first, so a
/// slow analysis of an outdated trajectory never replaces a newer one.
#[derive(Debug, Clone, Default)]
pub struct KinematicsStore {
    current: Arc<RwLock<Published>>,
    requested: Arc<AtomicU64>,
}

#[derive(Debug, Default)]
struct Published {
    generation: u64,
    kinematics: Arc<TrajectoryKinematics>,
}

impl KinematicsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current result. Cheap; the result itself is shared.
    pub fn snapshot(&self) -> Arc<TrajectoryKinematics> {
        Arc::clone(&self.current.read().kinematics)
    }

    /// Generation of the current result; 0 until something is published.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    fn next_generation(&self) -> u64 {
        self.requested.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a complete result as the newest one.
    pub fn publish(&self, kinematics: TrajectoryKinematics) -> Arc<TrajectoryKinematics> {
        let generation = self.next_generation();
        self.publish_generation(generation, Arc::new(kinematics))
    }

    /// Store `kinematics` unless a later generation is already current.
    fn publish_generation(
        &self,
        generation: u64,
        kinematics: Arc<TrajectoryKinematics>,
    ) -> Arc<TrajectoryKinematics> {
        let mut current = self.current.write();
        if generation < current.generation {
            debug!(
                generation,
                current = current.generation,
                samples = kinematics.len(),
                "Dropped stale kinematics"
            );
            return kinematics;
        }
        *current = Published {
            generation,
            kinematics: Arc::clone(&kinematics),
        };
        debug!(generation, samples = kinematics.len(), "Published kinematics");
        kinematics
    }

    fn recompute_generation<C>(
        &self,
        generation: u64,
        trajectory: &Trajectory,
        calibration: &C,
        config: &KinematicsConfig,
    ) -> KinematicsResult<Arc<TrajectoryKinematics>>
    where
        C: Calibration + ?Sized,
    {
        let kinematics = analyze_trajectory(trajectory, calibration, config)?;
        Ok(self.publish_generation(generation, Arc::new(kinematics)))
    }

    /// Recompute on the calling thread and publish.
    ///
    /// Returns the computed result. It is not published if a request made
    /// after this one has already been published.
    pub fn recompute<C>(
        &self,
        trajectory: &Trajectory,
        calibration: &C,
        config: &KinematicsConfig,
    ) -> KinematicsResult<Arc<TrajectoryKinematics>>
    where
        C: Calibration + ?Sized,
    {
        let generation = self.next_generation();
        self.recompute_generation(generation, trajectory, calibration, config)
    }

    /// Recompute on the rayon pool and publish when done.
    ///
    /// The request is ordered at call time. The receiver yields the computed
    /// result, or the error if the analysis failed, in which case the
    /// previous result stays current.
    pub fn recompute_in_background<C>(
        &self,
        trajectory: Trajectory,
        calibration: Arc<C>,
        config: KinematicsConfig,
    ) -> Receiver<KinematicsResult<Arc<TrajectoryKinematics>>>
    where
        C: Calibration + ?Sized + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let generation = self.next_generation();
        let store = self.clone();
        rayon::spawn(move || {
            let result = store.recompute_generation(generation, &trajectory, calibration.as_ref(), &config);
            if let Err(e) = &result {
                warn!(trajectory = %trajectory.id, generation, error = %e, "Kinematics recomputation failed");
            }
            // The caller may have dropped the receiver; the result is
            // published either way.
            let _ = tx.send(result);
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Sender;
    use kinetrace_core::{FrameRate, UniformCalibration};
    use kinetrace_tracking::TrackedPoint;
    use std::sync::Once;

    fn trajectory(n: usize) -> Trajectory {
        Trajectory::from_points(
            (0..n)
                .map(|i| TrackedPoint::orphan(Point2::new(i as f64, 0.0), Timestamp::new(i as i64)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_short_trajectory_is_not_filtered() {
        let cal = UniformCalibration::identity(FrameRate::FPS_30);
        let k = analyze_trajectory(&trajectory(6), &cal, &KinematicsConfig::default()).unwrap();
        assert!(!k.is_filtered());
        assert_eq!(k.len(), 6);
        // Collinear samples have no rotation circle.
        assert!(k.circle.is_empty());
        assert!(!k.has_angular());
        assert_eq!(k.get(Quantity::X), Some(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0][..]));
    }

    #[test]
    fn test_single_sample() {
        let cal = UniformCalibration::identity(FrameRate::FPS_30);
        let k = analyze_trajectory(&trajectory(1), &cal, &KinematicsConfig::default()).unwrap();
        assert_eq!(k.len(), 1);
        assert!(k.value(Quantity::Speed, 0).unwrap().is_nan());
        assert_eq!(k.value(Quantity::TotalDistance, 0), Some(0.0));
    }

    #[test]
    fn test_circular_motion_has_angular_series() {
        let cal = UniformCalibration::identity(FrameRate::FPS_30);
        let samples = (0..20).map(|i| {
            let a = i as f64 * 0.1;
            (Point2::new(100.0 + 30.0 * a.cos(), 100.0 + 30.0 * a.sin()), Timestamp::new(i))
        });
        let k = analyze_samples(samples, &cal, &KinematicsConfig::default()).unwrap();
        assert!(k.is_filtered());
        assert!(k.has_angular());
        assert!((k.circle.radius - 30.0).abs() < 1.0);
        for q in k.series.quantities() {
            assert_eq!(k.series[q].len(), 20);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cal = UniformCalibration::identity(FrameRate::FPS_30);
        let config = KinematicsConfig {
            cutoff_tests: 0,
            ..Default::default()
        };
        assert!(analyze_trajectory(&trajectory(3), &cal, &config).is_err());
    }

    #[test]
    fn test_store_swaps_complete_results() {
        let store = KinematicsStore::new();
        assert!(store.snapshot().is_empty());

        let cal = UniformCalibration::identity(FrameRate::FPS_30);
        let before = store.snapshot();
        store
            .recompute(&trajectory(5), &cal, &KinematicsConfig::default())
            .unwrap();
        // Earlier snapshots are unaffected by the swap.
        assert!(before.is_empty());
        assert_eq!(store.snapshot().len(), 5);
    }

    #[test]
    fn test_background_recompute() {
        let store = KinematicsStore::new();
        let cal = Arc::new(UniformCalibration::identity(FrameRate::FPS_30));
        let rx = store.recompute_in_background(trajectory(12), cal, KinematicsConfig::default());
        let published = rx.recv().unwrap().unwrap();
        assert_eq!(published.len(), 12);
        assert!(Arc::ptr_eq(&published, &store.snapshot()));
        assert_eq!(store.generation(), 1);
    }

    /// Holds the first position mapping until released.
    struct GatedCalibration {
        inner: UniformCalibration,
        entered: Sender<()>,
        release: Receiver<()>,
        once: Once,
    }

    impl Calibration for GatedCalibration {
        fn map_to_calibrated(&self, point: Point2, timestamp: Timestamp) -> Point2 {
            self.once.call_once(|| {
                let _ = self.entered.send(());
                let _ = self.release.recv();
            });
            self.inner.map_to_calibrated(point, timestamp)
        }

        fn time_span(&self, intervals: u32) -> f64 {
            self.inner.time_span(intervals)
        }

        fn capture_frames_per_second(&self) -> f64 {
            self.inner.capture_frames_per_second()
        }

        fn convert_length(&self, value: f64) -> f64 {
            self.inner.convert_length(value)
        }

        fn convert_speed(&self, value: f64) -> f64 {
            self.inner.convert_speed(value)
        }

        fn convert_acceleration(&self, value: f64) -> f64 {
            self.inner.convert_acceleration(value)
        }

        fn convert_angle(&self, radians: f64) -> f64 {
            self.inner.convert_angle(radians)
        }

        fn convert_angular_velocity(&self, radians_per_second: f64) -> f64 {
            self.inner.convert_angular_velocity(radians_per_second)
        }

        fn convert_angular_acceleration(&self, radians_per_second_sq: f64) -> f64 {
            self.inner.convert_angular_acceleration(radians_per_second_sq)
        }
    }

    #[test]
    fn test_late_stale_result_is_not_published() {
        let store = KinematicsStore::new();
        let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
        let (release_tx, release_rx) = crossbeam_channel::bounded(1);
        let slow = Arc::new(GatedCalibration {
            inner: UniformCalibration::identity(FrameRate::FPS_30),
            entered: entered_tx,
            release: release_rx,
            once: Once::new(),
        });

        // The older request blocks mid-analysis.
        let old = store.recompute_in_background(trajectory(40), slow, KinematicsConfig::default());
        entered_rx.recv().unwrap();

        // A newer request for the edited trajectory finishes first.
        let cal = UniformCalibration::identity(FrameRate::FPS_30);
        let newer = store
            .recompute(&trajectory(5), &cal, &KinematicsConfig::default())
            .unwrap();
        assert_eq!(store.generation(), 2);

        release_tx.send(()).unwrap();
        let stale = old.recv().unwrap().unwrap();
        assert_eq!(stale.len(), 40);

        assert_eq!(store.generation(), 2);
        assert_eq!(store.snapshot().len(), 5);
        assert!(Arc::ptr_eq(&newer, &store.snapshot()));
    }

    #[test]
    fn test_publish_orders_by_generation() {
        let store = KinematicsStore::new();
        let cal = UniformCalibration::identity(FrameRate::FPS_30);
        let config = KinematicsConfig::default();
        let first = store.next_generation();
        let second = store.next_generation();

        let k = analyze_trajectory(&trajectory(3), &cal, &config).unwrap();
        store.publish_generation(second, Arc::new(k));
        let k = analyze_trajectory(&trajectory(7), &cal, &config).unwrap();
        store.publish_generation(first, Arc::new(k));
        assert_eq!(store.snapshot().len(), 3);

        // Plain publishes always become current.
        let k = analyze_trajectory(&trajectory(4), &cal, &config).unwrap();
        store.publish(k);
        assert_eq!(store.snapshot().len(), 4);
        assert_eq!(store.generation(), 3);
    }
}
