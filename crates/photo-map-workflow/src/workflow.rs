use crate::event::{Effect, Event, Status};
use crate::overlay::{hit_test, Marker, MarkerColor};
use crate::state::WorkflowState;
use crate::{PersistedState, Step, WorkflowConfigError, WorkflowParams};
use photo_map_core::{AnchorId, GeoPoint, ImagePoint, ProjectionDebug};
use photo_map_quality::QualityOutcome;
use serde::{Deserialize, Serialize};

/// Progress of the active validation loop, for the QA overlay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaOverlay {
    pub step: Step,
    pub sample_count: usize,
    pub min_samples: usize,
    pub seconds_elapsed: u64,
    /// Last composite score, `None` until the window first reaches `min_samples`.
    pub qa_percent: Option<f64>,
    pub locked: bool,
}

/// Calibration workflow for one loaded map image.
///
/// Owns all mutable state; feed it events one at a time and read the outbound
/// views after each.
#[derive(Clone, Debug, Default)]
pub struct CalibrationWorkflow {
    state: WorkflowState,
}

impl CalibrationWorkflow {
    pub fn new(params: WorkflowParams) -> Result<Self, WorkflowConfigError> {
        params.validate()?;
        Ok(Self {
            state: WorkflowState::new(params),
        })
    }

    /// Start from a persisted snapshot. An invalid snapshot starts fresh.
    pub fn restored(
        params: WorkflowParams,
        snapshot: PersistedState,
        at_ms: u64,
    ) -> Result<Self, WorkflowConfigError> {
        let mut wf = Self::new(params)?;
        wf.handle(Event::Restore { snapshot, at_ms });
        Ok(wf)
    }

    /// Process one event to completion.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        self.state.apply(&event)
    }

    #[inline]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    #[inline]
    pub fn step(&self) -> Step {
        self.state().step()
    }

    #[inline]
    pub fn current_fix(&self) -> Option<GeoPoint> {
        self.state().current_fix()
    }

    /// Anchors for drawing: A in blue, B in green.
    pub fn markers(&self) -> Vec<Marker> {
        let projection = self.state().projection();
        [AnchorId::A, AnchorId::B]
            .into_iter()
            .filter_map(|id| {
                projection.anchor(id).map(|a| Marker {
                    id,
                    image: a.image,
                    color: MarkerColor::for_anchor(id),
                })
            })
            .collect()
    }

    /// Marker under a tap, using the configured hit radius at `zoom`.
    pub fn marker_at(&self, tap: ImagePoint, zoom: f64) -> Option<AnchorId> {
        hit_test(&self.markers(), tap, zoom, self.state().params().hit_radius_px)
    }

    #[inline]
    pub fn live_position(&self) -> Option<ImagePoint> {
        self.state().live_position()
    }

    #[inline]
    pub fn status(&self) -> &Status {
        self.state().status()
    }

    pub fn status_text(&self) -> String {
        self.status().to_string()
    }

    pub fn debug_snapshot(&self) -> Option<ProjectionDebug> {
        self.state().projection().debug_snapshot()
    }

    #[inline]
    pub fn last_quality(&self) -> Option<&QualityOutcome> {
        self.state().last_quality()
    }

    /// QA overlay, `None` outside the two validation steps.
    pub fn qa_overlay(&self) -> Option<QaOverlay> {
        let state = self.state();
        let step = state.step();
        if !step.is_validation() {
            return None;
        }
        let quality = state.last_quality().and_then(QualityOutcome::result);
        Some(QaOverlay {
            step,
            sample_count: state.sample_count(),
            min_samples: state.params().min_lock_samples,
            seconds_elapsed: state.qa_elapsed_secs().unwrap_or(0.0).round() as u64,
            qa_percent: quality.map(|r| r.score),
            locked: quality.is_some_and(|r| r.locked),
        })
    }

    /// Reduce to the persisted shape.
    pub fn snapshot(&self) -> PersistedState {
        self.state().snapshot()
    }
}
