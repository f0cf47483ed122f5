//! Run configuration.

use serde::Deserialize;

use crate::boundary::BoundaryConfig;
use crate::error::ConfigError;
use crate::fiber::FiberConfig;
use crate::stepping::{RecordMode, VolumeIdRules};

/// Everything a run needs besides the geometry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptrackConfig {
    pub boundary: BoundaryConfig,
    pub fibers: FiberConfig,
    /// `(volume name, ID)` rules, first match wins.
    pub volume_ids: VolumeIdRules,
    /// Record every step, not only those depositing energy in a
    /// classified volume.
    pub record_all_steps: bool,
    pub record_mode: RecordMode,
    /// Number of hit counters; detections need IDs below it.
    pub volume_count: usize,
}

impl Default for OptrackConfig {
    fn default() -> Self {
        Self {
            boundary: BoundaryConfig::default(),
            fibers: FiberConfig::default(),
            volume_ids: VolumeIdRules::default(),
            record_all_steps: false,
            record_mode: RecordMode::StepWise,
            volume_count: 1,
        }
    }
}

impl OptrackConfig {
    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range or inconsistent value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.boundary.validate()?;
        self.fibers.validate()?;
        if self.volume_count == 0 {
            return Err(ConfigError::Invalid(
                "volume_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
