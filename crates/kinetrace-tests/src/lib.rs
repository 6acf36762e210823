//! Integration test crate for KineTrace.
//!
//! This crate exists solely to hold cross-crate integration tests: frames
//! go through the tracker, trajectories through the kinematics engine.

#[cfg(test)]
mod tracking;

#[cfg(test)]
mod kinematics;
