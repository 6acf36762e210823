//! Append-ordered sequence of tracked samples.

use kinetrace_core::{GrayImage, Point2, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{TrackingError, TrackingResult};
use crate::point::TrackedPoint;
use crate::strategy::TrackingStrategy;

/// The trajectory of one tracked point.
///
/// A trajectory always holds at least one point, and timestamps strictly
/// increase along it. Samples can only be removed by [`Trajectory::chop`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrajectoryData")]
pub struct Trajectory {
    pub id: Uuid,
    points: Vec<TrackedPoint>,
}

/// Unvalidated form used for deserialization.
#[derive(Deserialize)]
struct TrajectoryData {
    id: Uuid,
    points: Vec<TrackedPoint>,
}

impl TryFrom<TrajectoryData> for Trajectory {
    type Error = TrackingError;

    fn try_from(data: TrajectoryData) -> TrackingResult<Self> {
        let mut trajectory = Self::from_points(data.points)?;
        trajectory.id = data.id;
        Ok(trajectory)
    }
}

impl Trajectory {
    /// Start a trajectory from its first point.
    pub fn new(first: TrackedPoint) -> Self {
        Self {
            id: Uuid::new_v4(),
            points: vec![first],
        }
    }

    /// Build a trajectory from existing samples, validating ordering.
    pub fn from_points(points: Vec<TrackedPoint>) -> TrackingResult<Self> {
        let mut iter = points.into_iter();
        let first = iter.next().ok_or(TrackingError::EmptyHistory)?;
        let mut trajectory = Self::new(first);
        for point in iter {
            trajectory.push(point)?;
        }
        Ok(trajectory)
    }

    #[inline]
    pub fn points(&self) -> &[TrackedPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; provided for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn first(&self) -> &TrackedPoint {
        &self.points[0]
    }

    #[inline]
    pub fn last(&self) -> &TrackedPoint {
        &self.points[self.points.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&TrackedPoint> {
        self.points.get(index)
    }

    pub fn positions(&self) -> impl ExactSizeIterator<Item = Point2> + '_ {
        self.points.iter().map(|p| p.position)
    }

    pub fn timestamps(&self) -> impl ExactSizeIterator<Item = Timestamp> + '_ {
        self.points.iter().map(|p| p.timestamp)
    }

    /// Append a sample after the last one.
    pub fn push(&mut self, point: TrackedPoint) -> TrackingResult<()> {
        let last = self.last().timestamp;
        if point.timestamp <= last {
            return Err(TrackingError::NonIncreasingTimestamp {
                last,
                given: point.timestamp,
            });
        }
        self.points.push(point);
        Ok(())
    }

    /// Drop every sample after `index`. Returns the number removed.
    pub fn chop(&mut self, index: usize) -> TrackingResult<usize> {
        self.check_index(index)?;
        let removed = self.points.len() - index - 1;
        self.points.truncate(index + 1);
        if removed > 0 {
            info!(trajectory = %self.id, index, removed, "Chopped trajectory");
        }
        Ok(removed)
    }

    /// Index of the sample whose timestamp is closest to `timestamp`.
    /// Ties go to the earlier sample.
    pub fn closest_index(&self, timestamp: Timestamp) -> usize {
        match self.points.binary_search_by_key(&timestamp, |p| p.timestamp) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) if i >= self.points.len() => self.points.len() - 1,
            Err(i) => {
                let before = timestamp - self.points[i - 1].timestamp;
                let after = self.points[i].timestamp - timestamp;
                if after < before {
                    i
                } else {
                    i - 1
                }
            }
        }
    }

    /// Move a sample to new coordinates, rebuilding its template as if the
    /// user had placed it manually.
    ///
    /// If the tracker is configured to reset on move, samples after the
    /// edited one are dropped.
    pub fn move_point<S: TrackingStrategy + ?Sized>(
        &mut self,
        index: usize,
        position: Point2,
        strategy: &S,
        frame: Option<&GrayImage>,
    ) -> TrackingResult<()> {
        self.check_index(index)?;
        let timestamp = self.points[index].timestamp;
        let rebuilt = strategy.create_point(
            true,
            position,
            1.0,
            timestamp,
            frame,
            &self.points[..index],
        );
        self.points[index] = rebuilt;
        if strategy.parameters().reset_on_move {
            self.chop(index)?;
        }
        Ok(())
    }

    /// Replace the last sample's tracking data with a manual snapshot taken
    /// at the same position in `frame`, the frame shown at that sample's
    /// timestamp.
    pub fn rebuild_last_template<S: TrackingStrategy + ?Sized>(
        &mut self,
        strategy: &S,
        frame: &GrayImage,
    ) {
        let n = self.points.len();
        let last = &self.points[n - 1];
        let rebuilt = strategy.create_point(
            true,
            last.position,
            1.0,
            last.timestamp,
            Some(frame),
            &self.points[..n - 1],
        );
        self.points[n - 1] = rebuilt;
    }

    /// Drop the templates of every sample.
    pub fn strip_templates(&mut self) {
        for point in &mut self.points {
            point.reset_track_data();
        }
    }

    /// Diagonal of the bounding box of the raw positions.
    pub fn flat_extent(&self) -> f64 {
        let (min, max) = self.positions().fold(
            (Point2::splat(f64::INFINITY), Point2::splat(f64::NEG_INFINITY)),
            |(min, max), p| (min.min(p), max.max(p)),
        );
        (max - min).length()
    }

    fn check_index(&self, index: usize) -> TrackingResult<()> {
        if index >= self.points.len() {
            return Err(TrackingError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationTracker;
    use crate::params::TrackerParameters;

    fn orphan(x: f64, t: i64) -> TrackedPoint {
        TrackedPoint::orphan(Point2::new(x, 0.0), Timestamp::new(t))
    }

    fn line(n: i64) -> Trajectory {
        Trajectory::from_points((0..n).map(|i| orphan(i as f64, i * 10)).collect()).unwrap()
    }

    #[test]
    fn test_push_requires_increasing_time() {
        let mut traj = Trajectory::new(orphan(0.0, 10));
        assert!(traj.push(orphan(1.0, 20)).is_ok());
        assert!(matches!(
            traj.push(orphan(2.0, 20)),
            Err(TrackingError::NonIncreasingTimestamp { .. })
        ));
        assert_eq!(traj.len(), 2);
        assert!(!traj.is_empty());
    }

    #[test]
    fn test_from_points_rejects_empty() {
        assert!(matches!(
            Trajectory::from_points(Vec::new()),
            Err(TrackingError::EmptyHistory)
        ));
    }

    #[test]
    fn test_chop() {
        let mut traj = line(10);
        assert_eq!(traj.chop(3).unwrap(), 6);
        assert_eq!(traj.len(), 4);
        assert_eq!(traj.last().timestamp, Timestamp::new(30));
        assert_eq!(traj.chop(3).unwrap(), 0);
        assert!(traj.chop(4).is_err());
    }

    #[test]
    fn test_closest_index() {
        let traj = line(5);
        assert_eq!(traj.closest_index(Timestamp::new(-5)), 0);
        assert_eq!(traj.closest_index(Timestamp::new(20)), 2);
        assert_eq!(traj.closest_index(Timestamp::new(24)), 2);
        assert_eq!(traj.closest_index(Timestamp::new(25)), 2);
        assert_eq!(traj.closest_index(Timestamp::new(26)), 3);
        assert_eq!(traj.closest_index(Timestamp::new(1000)), 4);
    }

    #[test]
    fn test_move_point_rebuilds_template() {
        let frame = GrayImage::from_fn(64, 64, |x, y| ((x * 7 + y * 13) % 17) as f32);
        let tracker = CorrelationTracker::default();
        let mut traj = line(5);
        traj.move_point(2, Point2::new(30.0, 30.0), &tracker, Some(&frame)).unwrap();

        let moved = &traj.points()[2];
        assert_eq!(moved.position, Point2::new(30.0, 30.0));
        assert!(moved.manual);
        assert!(moved.has_template());
        assert_eq!(moved.similarity, 1.0);
        assert_eq!(traj.len(), 5);
    }

    #[test]
    fn test_move_point_with_reset_chops() {
        let tracker = CorrelationTracker::new(TrackerParameters {
            reset_on_move: true,
            ..Default::default()
        });
        let mut traj = line(5);
        traj.move_point(1, Point2::new(3.0, 3.0), &tracker, None).unwrap();
        assert_eq!(traj.len(), 2);
        assert!(traj.move_point(7, Point2::ZERO, &tracker, None).is_err());
    }

    #[test]
    fn test_flat_extent() {
        let traj = Trajectory::from_points(vec![
            TrackedPoint::orphan(Point2::new(1.0, 1.0), Timestamp::new(0)),
            TrackedPoint::orphan(Point2::new(4.0, 2.0), Timestamp::new(1)),
            TrackedPoint::orphan(Point2::new(2.0, 5.0), Timestamp::new(2)),
        ])
        .unwrap();
        assert!((traj.flat_extent() - 5.0).abs() < 1e-12);
        assert_eq!(Trajectory::new(orphan(3.0, 0)).flat_extent(), 0.0);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = serde_json::json!({ "id": Uuid::nil(), "points": [] });
        assert!(serde_json::from_value::<Trajectory>(json).is_err());

        let traj = line(3);
        let json = serde_json::to_value(&traj).unwrap();
        let back: Trajectory = serde_json::from_value(json).unwrap();
        assert_eq!(back, traj);
    }
}
