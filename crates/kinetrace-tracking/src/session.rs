//! Continuous tracking of one trajectory across frames.

use kinetrace_core::{FrameSource, GrayImage, Point2, Timestamp};
use tracing::{debug, info};

use crate::error::TrackingResult;
use crate::strategy::TrackingStrategy;
use crate::trajectory::Trajectory;

/// Where a tracking session stands.
///
/// `Manual → Matched` on a successful correlation, `→ UnmatchedFallback` on
/// a miss, `→ Stopped` when the caller ends tracking. A new manual point
/// restarts the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Manual,
    Matched,
    UnmatchedFallback,
    Stopped,
}

/// Drives a [`Trajectory`] forward one frame at a time.
pub struct TrackingSession<S: TrackingStrategy> {
    strategy: S,
    trajectory: Trajectory,
    state: TrackingState,
}

impl<S: TrackingStrategy> TrackingSession<S> {
    /// Start a new trajectory from a user-placed point.
    pub fn start(strategy: S, position: Point2, timestamp: Timestamp, frame: Option<&GrayImage>) -> Self {
        let first = strategy.create_point(true, position, 1.0, timestamp, frame, &[]);
        let trajectory = Trajectory::new(first);
        info!(trajectory = %trajectory.id, timestamp = %timestamp, "Tracking session started");
        Self {
            strategy,
            trajectory,
            state: TrackingState::Manual,
        }
    }

    /// Continue tracking an existing trajectory from its last point.
    pub fn resume(strategy: S, trajectory: Trajectory) -> Self {
        Self {
            strategy,
            trajectory,
            state: TrackingState::Manual,
        }
    }

    #[inline]
    pub fn state(&self) -> TrackingState {
        self.state
    }

    #[inline]
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    #[inline]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn into_trajectory(self) -> Trajectory {
        self.trajectory
    }

    /// Track the point into the frame at `timestamp`.
    ///
    /// A stopped session ignores frames until a manual point is placed. A
    /// last point without a template yields a miss; use [`Self::track_source`]
    /// to resume such a point from its own frame.
    pub fn track_frame(&mut self, frame: Option<&GrayImage>, timestamp: Timestamp) -> TrackingResult<TrackingState> {
        if self.state == TrackingState::Stopped {
            debug!(timestamp = %timestamp, "Session stopped, frame ignored");
            return Ok(self.state);
        }

        let outcome = self.strategy.track(self.trajectory.points(), frame, timestamp)?;
        self.trajectory.push(outcome.point)?;
        self.state = if outcome.matched {
            TrackingState::Matched
        } else {
            TrackingState::UnmatchedFallback
        };
        Ok(self.state)
    }

    /// Track through the given timestamps, stopping on the first miss.
    ///
    /// Returns the number of frames successfully matched.
    pub fn track_source<F: FrameSource + ?Sized>(
        &mut self,
        source: &F,
        timestamps: impl IntoIterator<Item = Timestamp>,
    ) -> TrackingResult<usize> {
        // An orphan tail is snapshotted on its own frame when available.
        if !self.trajectory.last().has_template() {
            if let Some(frame) = source.frame_at(self.trajectory.last().timestamp) {
                self.trajectory.rebuild_last_template(&self.strategy, frame);
            }
        }

        let mut matched = 0;
        for timestamp in timestamps {
            if timestamp <= self.trajectory.last().timestamp {
                continue;
            }
            match self.track_frame(source.frame_at(timestamp), timestamp)? {
                TrackingState::Matched => matched += 1,
                _ => {
                    self.stop();
                    break;
                }
            }
        }
        info!(
            trajectory = %self.trajectory.id,
            matched,
            points = self.trajectory.len(),
            "Tracking pass finished"
        );
        Ok(matched)
    }

    /// Place a point manually at `timestamp`.
    ///
    /// Samples at or after `timestamp` are discarded. Placing at the first
    /// sample's time moves that sample instead.
    pub fn place_manual(&mut self, position: Point2, timestamp: Timestamp, frame: Option<&GrayImage>) -> TrackingResult<()> {
        let keep = self
            .trajectory
            .points()
            .iter()
            .rposition(|p| p.timestamp < timestamp)
            .unwrap_or(0);
        self.trajectory.chop(keep)?;

        if self.trajectory.last().timestamp >= timestamp {
            self.trajectory.move_point(keep, position, &self.strategy, frame)?;
        } else {
            let point = self.strategy.create_point(
                true,
                position,
                1.0,
                timestamp,
                frame,
                self.trajectory.points(),
            );
            self.trajectory.push(point)?;
        }
        self.state = TrackingState::Manual;
        Ok(())
    }

    /// End continuous tracking.
    pub fn stop(&mut self) {
        if self.state != TrackingState::Stopped {
            debug!(trajectory = %self.trajectory.id, from = ?self.state, "Tracking stopped");
        }
        self.state = TrackingState::Stopped;
    }
}
