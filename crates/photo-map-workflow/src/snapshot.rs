//! Persisted calibration state.
//!
//! The autosave collaborator stores this shape; the workflow reduces to it and
//! can be rebuilt from it without replaying events.

use crate::Step;
use photo_map_core::{AnchorId, CalibrationAnchor};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Only persisted version understood.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error(transparent)]
    UnknownStep(#[from] crate::step::UnknownStep),
    #[error("step {0} cannot be restored")]
    UnreachableStep(Step),
    #[error("step {step} requires anchor {anchor}")]
    MissingAnchor { step: Step, anchor: AnchorId },
    #[error("anchor {0} has non-finite coordinates")]
    NonFiniteAnchor(AnchorId),
}

/// Serialized calibration: step plus the two anchors.
///
/// Field names follow the autosave format (`pointA`, `pointB`); the older
/// `v` / `calibrationStep` spellings are accepted on input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(alias = "v")]
    pub version: u32,
    #[serde(alias = "calibrationStep")]
    pub step: u8,
    #[serde(default)]
    pub point_a: Option<CalibrationAnchor>,
    #[serde(default)]
    pub point_b: Option<CalibrationAnchor>,
    /// Milliseconds since the Unix epoch, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<u64>,
}

impl PersistedState {
    pub fn new(
        step: Step,
        point_a: Option<CalibrationAnchor>,
        point_b: Option<CalibrationAnchor>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            step: step.into(),
            point_a,
            point_b,
            saved_at: None,
        }
    }

    pub fn with_saved_at(mut self, millis: u64) -> Self {
        self.saved_at = Some(millis);
        self
    }

    #[inline]
    pub fn anchor(&self, id: AnchorId) -> Option<&CalibrationAnchor> {
        match id {
            AnchorId::A => self.point_a.as_ref(),
            AnchorId::B => self.point_b.as_ref(),
        }
    }

    /// Check the snapshot is something the workflow could have produced.
    ///
    /// Returns the step to resume at.
    pub fn validate(&self) -> Result<Step, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        let step = Step::try_from(self.step)?;
        if step == Step::RefiningC {
            return Err(SnapshotError::UnreachableStep(step));
        }
        for id in [AnchorId::A, AnchorId::B] {
            if self.anchor(id).is_some_and(|a| !a.is_finite()) {
                return Err(SnapshotError::NonFiniteAnchor(id));
            }
        }
        for &anchor in step.required_anchors() {
            if self.anchor(anchor).is_none() {
                return Err(SnapshotError::MissingAnchor { step, anchor });
            }
        }
        Ok(step)
    }

    /// Parse and validate.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let state: Self = serde_json::from_str(raw)?;
        state.validate()?;
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
