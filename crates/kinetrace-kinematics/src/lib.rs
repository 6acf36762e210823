//! KineTrace Kinematics - From pixel trajectories to physical quantities.
//!
//! This crate turns a tracked trajectory into calibrated kinematic series:
//! - Zero-phase Butterworth filtering with automatic cutoff selection
//! - Linear distance, velocity and acceleration
//! - Angular kinematics around a best-fit circle
//! - Three-point angle kinematics
//!
//! Every series has one value per trajectory sample. Values that cannot be
//! computed near the ends are NaN.

pub mod angle;
pub mod angular;
pub mod butterworth;
pub mod circle;
pub mod config;
pub mod engine;
pub mod error;
pub mod linear;
pub mod moving_average;
pub mod padding;
pub mod series;
pub mod trajectory;

pub use angle::{angle_kinematics, AngleOptions, AngleTrajectories};
pub use angular::angular_kinematics;
pub use butterworth::{ButterworthFilter, FilteredSeries, FilteringResult};
pub use circle::{fit_circle, Circle};
pub use config::{KinematicsConfig, MAX_CUTOFF_TESTS};
pub use engine::{analyze_calibrated, analyze_samples, analyze_trajectory, KinematicsStore, TrajectoryKinematics};
pub use error::{KinematicsError, KinematicsResult};
pub use linear::linear_kinematics;
pub use moving_average::MovingAverage;
pub use series::{Quantity, TimeSeriesCollection};
pub use trajectory::{Axis, CalibratedTrajectory};
