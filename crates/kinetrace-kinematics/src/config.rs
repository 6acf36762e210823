//! Kinematics engine configuration.

use kinetrace_core::KineTraceError;
use serde::{Deserialize, Serialize};

use crate::error::{KinematicsError, KinematicsResult};

/// Upper bound on tested cutoffs per axis.
pub const MAX_CUTOFF_TESTS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    /// Cutoff frequencies tested per axis by the filter sweep.
    pub cutoff_tests: usize,
    /// Apply the moving average to velocity and acceleration series.
    pub smooth_derivatives: bool,
    /// Averaging span for velocities, in milliseconds.
    pub velocity_span_ms: f64,
    /// Averaging span for accelerations, in milliseconds.
    pub acceleration_span_ms: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            cutoff_tests: 100,
            smooth_derivatives: true,
            velocity_span_ms: 40.0,
            acceleration_span_ms: 50.0,
        }
    }
}

impl KinematicsConfig {
    /// Number of cutoffs actually tested.
    #[inline]
    pub fn effective_cutoff_tests(&self) -> usize {
        self.cutoff_tests.min(MAX_CUTOFF_TESTS)
    }

    pub fn validate(&self) -> KinematicsResult<()> {
        if self.cutoff_tests == 0 {
            return Err(KinematicsError::InvalidConfig(
                "cutoff_tests must be at least 1".into(),
            ));
        }
        for (name, span) in [
            ("velocity_span_ms", self.velocity_span_ms),
            ("acceleration_span_ms", self.acceleration_span_ms),
        ] {
            if !span.is_finite() || span < 0.0 {
                return Err(KinematicsError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {span}"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take their
    /// default value.
    pub fn from_json(data: &[u8]) -> KinematicsResult<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| KinematicsError::InvalidConfig(format!("Invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> KinematicsResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| KineTraceError::Serialization(format!("Failed to serialize config: {}", e)).into())
    }
}
