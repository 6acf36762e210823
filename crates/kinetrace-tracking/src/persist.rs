//! Trajectory files.
//!
//! A trajectory is stored as JSON together with the tracker parameters it
//! was tracked with, so that a reloaded trajectory can resume tracking under
//! the same settings.

use kinetrace_core::KineTraceError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::TrackingResult;
use crate::params::TrackerParameters;
use crate::trajectory::Trajectory;

/// Format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// A saved trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryFile {
    pub version: u32,
    /// Application version that wrote this file.
    pub app_version: String,
    /// Tracker configuration the trajectory was tracked with.
    pub parameters: TrackerParameters,
    pub trajectory: Trajectory,
}

impl TrajectoryFile {
    pub fn new(trajectory: Trajectory, parameters: TrackerParameters) -> Self {
        Self {
            version: FORMAT_VERSION,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            parameters,
            trajectory,
        }
    }

    /// Drop template blobs, keeping coordinates and scores only.
    ///
    /// Points loaded from such a file are orphans; tracking re-snapshots
    /// their template from the frame.
    pub fn without_templates(mut self) -> Self {
        self.trajectory.strip_templates();
        self
    }

    pub fn to_json(&self) -> TrackingResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| {
            KineTraceError::Serialization(format!("Failed to serialize trajectory: {}", e)).into()
        })
    }

    /// Parse a trajectory file.
    ///
    /// Sample ordering is checked while parsing the trajectory. Files of
    /// another format version and templates whose pixel buffer does not
    /// match their size are rejected.
    pub fn from_json(data: &[u8]) -> TrackingResult<Self> {
        let file: Self = serde_json::from_slice(data)
            .map_err(|e| KineTraceError::Serialization(format!("Invalid trajectory file: {}", e)))?;

        if file.version != FORMAT_VERSION {
            return Err(KineTraceError::Serialization(format!(
                "Unsupported trajectory file version {} (expected {})",
                file.version, FORMAT_VERSION
            ))
            .into());
        }

        for (index, point) in file.trajectory.points().iter().enumerate() {
            let Some(template) = point.template.as_ref() else {
                continue;
            };
            if template.pixels.len() != (template.width * template.height) as usize {
                return Err(KineTraceError::Serialization(format!(
                    "Template of point {} holds {} pixels for a {}x{} block",
                    index,
                    template.pixels.len(),
                    template.width,
                    template.height
                ))
                .into());
            }
            if template.size() != file.parameters.block_window {
                // Tracking ignores it and captures a new one.
                warn!(
                    index,
                    width = template.width,
                    height = template.height,
                    "Template size differs from the block window"
                );
            }
        }
        Ok(file)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> TrackingResult<()> {
        let data = self.to_json()?;
        std::fs::write(path, data).map_err(KineTraceError::from)?;
        info!(path = %path.display(), points = self.trajectory.len(), "Saved trajectory");
        Ok(())
    }

    pub fn load_from_file(path: &std::path::Path) -> TrackingResult<Self> {
        let data = std::fs::read(path).map_err(KineTraceError::from)?;
        let file = Self::from_json(&data)?;
        info!(
            path = %path.display(),
            trajectory = %file.trajectory.id,
            points = file.trajectory.len(),
            "Loaded trajectory"
        );
        Ok(file)
    }
}
