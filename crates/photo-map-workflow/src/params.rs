//! JSON configuration for the calibration workflow.

use photo_map_core::{DEFAULT_SMOOTHER_WINDOW, MAX_WALKING_SPEED_MPS};
use photo_map_quality::QualityParams;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum WorkflowIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] WorkflowConfigError),
}

/// Parameter validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WorkflowConfigError {
    #[error("sample_capacity ({capacity}) must be >= min_lock_samples ({min})")]
    WindowTooSmall { capacity: usize, min: usize },
    #[error("min_lock_samples ({lock}) must be >= quality.min_samples ({score})")]
    LockBelowScoring { lock: usize, score: usize },
    #[error("{name} must be finite and > 0")]
    NonPositive { name: &'static str },
}

/// Workflow tunables. Every field falls back to its default when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowParams {
    /// Raw fixes averaged into one smoothed fix.
    pub smoother_window: usize,
    /// Smoothed fixes kept for scoring; oldest dropped first.
    pub sample_capacity: usize,
    /// Window size at which validation steps start scoring and may lock.
    pub min_lock_samples: usize,
    /// Raw fixes reported faster than this are dropped before smoothing.
    pub max_walking_speed_mps: f64,
    /// Marker hit radius in screen pixels at zoom 1.
    pub hit_radius_px: f64,
    /// Seconds without a lock in A-validation before suggesting an edit.
    pub advisory_after_secs: f64,
    pub quality: QualityParams,
}

impl Default for WorkflowParams {
    fn default() -> Self {
        Self {
            smoother_window: DEFAULT_SMOOTHER_WINDOW,
            sample_capacity: 30,
            min_lock_samples: 20,
            max_walking_speed_mps: MAX_WALKING_SPEED_MPS,
            hit_radius_px: 15.0,
            advisory_after_secs: 20.0,
            quality: QualityParams::default(),
        }
    }
}

impl WorkflowParams {
    pub fn validate(&self) -> Result<(), WorkflowConfigError> {
        if self.sample_capacity < self.min_lock_samples {
            return Err(WorkflowConfigError::WindowTooSmall {
                capacity: self.sample_capacity,
                min: self.min_lock_samples,
            });
        }
        if self.min_lock_samples < self.quality.min_samples {
            return Err(WorkflowConfigError::LockBelowScoring {
                lock: self.min_lock_samples,
                score: self.quality.min_samples,
            });
        }
        for (name, v) in [
            ("max_walking_speed_mps", self.max_walking_speed_mps),
            ("hit_radius_px", self.hit_radius_px),
            ("advisory_after_secs", self.advisory_after_secs),
            ("quality.dispersion_scale_m", self.quality.dispersion_scale_m),
            ("quality.pixel_error_scale", self.quality.pixel_error_scale),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(WorkflowConfigError::NonPositive { name });
            }
        }
        Ok(())
    }

    /// Load and validate a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, WorkflowIoError> {
        let raw = fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&raw)?;
        params.validate()?;
        Ok(params)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), WorkflowIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
