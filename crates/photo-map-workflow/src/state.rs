//! Owned workflow state and the transition function.
//!
//! Every event is handled to completion by [`transition`], or in place by
//! [`WorkflowState::apply`]; nothing here reads
//! a clock or performs I/O, so a recorded event stream always replays to the
//! same state.

use crate::event::{Effect, Event, Status};
use crate::{PersistedState, Step, WorkflowParams};
use log::{debug, info, warn};
use photo_map_core::{
    AnchorId, GeoPoint, GeoProjection, GpsSmoother, ImagePoint, Projection, RawFix, SpeedGate,
};
use photo_map_quality::{point_a_quality, stability_score, QualityOutcome};
use std::collections::VecDeque;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Bounded FIFO of smoothed fixes collected for scoring.
#[derive(Clone, Debug)]
pub struct SampleWindow {
    capacity: usize,
    samples: VecDeque<GeoPoint>,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, fix: GeoPoint) {
        self.samples.push_back(fix);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first. Rotates the ring buffer into one slice, hence `&mut`.
    pub fn contiguous(&mut self) -> &[GeoPoint] {
        self.samples.make_contiguous()
    }
}

/// Everything the workflow mutates, in one value.
#[derive(Clone, Debug)]
pub struct WorkflowState {
    params: WorkflowParams,
    step: Step,
    projection: GeoProjection,
    gate: SpeedGate,
    smoother: GpsSmoother,
    current_fix: Option<GeoPoint>,
    window: SampleWindow,
    qa_started_ms: Option<u64>,
    last_quality: Option<QualityOutcome>,
    advisory_shown: bool,
    live_position: Option<ImagePoint>,
    status: Status,
    now_ms: u64,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new(WorkflowParams::default())
    }
}

/// Apply one event to `state`, returning the new state and what changed.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(state)))]
pub fn transition(mut state: WorkflowState, event: &Event) -> (WorkflowState, Vec<Effect>) {
    let effects = state.apply(event);
    (state, effects)
}

impl WorkflowState {
    pub fn new(params: WorkflowParams) -> Self {
        Self {
            gate: SpeedGate::new(params.max_walking_speed_mps),
            smoother: GpsSmoother::new(params.smoother_window),
            window: SampleWindow::new(params.sample_capacity),
            params,
            step: Step::AwaitingA,
            projection: GeoProjection::new(),
            current_fix: None,
            qa_started_ms: None,
            last_quality: None,
            advisory_shown: false,
            live_position: None,
            status: Status::TapAnchorA,
            now_ms: 0,
        }
    }

    #[inline]
    pub fn params(&self) -> &WorkflowParams {
        &self.params
    }

    #[inline]
    pub fn step(&self) -> Step {
        self.step
    }

    #[inline]
    pub fn projection(&self) -> &GeoProjection {
        &self.projection
    }

    /// Latest smoothed fix.
    #[inline]
    pub fn current_fix(&self) -> Option<GeoPoint> {
        self.current_fix
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    #[inline]
    pub fn smoother(&self) -> &GpsSmoother {
        &self.smoother
    }

    #[inline]
    pub fn last_quality(&self) -> Option<&QualityOutcome> {
        self.last_quality.as_ref()
    }

    #[inline]
    pub fn live_position(&self) -> Option<ImagePoint> {
        self.live_position
    }

    #[inline]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Time of the most recent event.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Seconds since the current validation loop started, with millisecond
    /// resolution.
    pub fn qa_elapsed_secs(&self) -> Option<f64> {
        self.qa_started_ms
            .map(|start| self.now_ms.saturating_sub(start) as f64 / 1000.0)
    }

    /// Reduce to the persisted shape.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState::new(
            self.step,
            self.projection.anchor_a().copied(),
            self.projection.anchor_b().copied(),
        )
    }

    /// Handle one event in place.
    pub fn apply(&mut self, event: &Event) -> Vec<Effect> {
        self.now_ms = self.now_ms.max(event.at_ms());
        let mut fx = Vec::new();
        match event {
            Event::ImageLoaded { .. } | Event::ResetSession { .. } => {
                self.reset(&mut fx);
                self.set_status(Status::TapAnchorA, &mut fx);
            }
            Event::Tap { image, hit, .. } => self.on_tap(*image, *hit, &mut fx),
            Event::GpsFix { fix, .. } => self.on_fix(fix, &mut fx),
            Event::Restore { snapshot, .. } => self.on_restore(snapshot, &mut fx),
        }
        fx
    }

    fn reset(&mut self, fx: &mut Vec<Effect>) {
        let had_anchors =
            self.projection.anchor_a().is_some() || self.projection.anchor_b().is_some();
        self.projection.reset();
        self.smoother.reset();
        self.window.clear();
        self.stop_qa();
        fx.push(Effect::SmootherReset);
        if had_anchors {
            fx.push(Effect::AnchorsChanged);
        }
        self.enter(Step::AwaitingA, fx);
    }

    fn on_tap(&mut self, image: ImagePoint, hit: Option<AnchorId>, fx: &mut Vec<Effect>) {
        let Some(fix) = self.current_fix else {
            debug!("tap ignored: no fix yet");
            self.set_status(Status::WaitingForFix, fx);
            return;
        };

        if let Some(id) = hit {
            if self.step.allows_marker_edit() {
                self.enter(Step::editing(id), fx);
                self.set_status(Status::Editing(id), fx);
                return;
            }
        }

        match self.step {
            Step::AwaitingA => {
                self.projection.set_anchor_a(image, fix);
                fx.push(Effect::AnchorsChanged);
                self.enter(Step::StabilizingA, fx);
                self.set_status(Status::HoldStillAtA, fx);
            }
            Step::StabilizingA => {
                self.enter(Step::AwaitingB, fx);
                self.set_status(Status::TapAnchorB, fx);
            }
            Step::AwaitingB => {
                self.projection.set_anchor_b(image, fix);
                fx.push(Effect::AnchorsChanged);
                let calibration = self.recompute(fx);
                self.enter(Step::ValidatingA, fx);
                self.set_status(status_after(calibration, Status::ValidatingA), fx);
            }
            Step::EditingA => {
                self.projection.set_anchor_a(image, fix);
                fx.push(Effect::AnchorsChanged);
                let calibration = self.recompute(fx);
                self.enter(Step::ValidatingA, fx);
                self.set_status(status_after(calibration, Status::ValidatingA), fx);
            }
            Step::EditingB => {
                self.projection.set_anchor_b(image, fix);
                fx.push(Effect::AnchorsChanged);
                let calibration = self.recompute(fx);
                self.enter(Step::Navigating, fx);
                self.set_status(status_after(calibration, Status::Navigating), fx);
            }
            Step::Navigating | Step::ValidatingA | Step::RefiningC => {
                debug!("tap ignored in step {}", self.step);
            }
        }
    }

    fn on_fix(&mut self, raw: &RawFix, fx: &mut Vec<Effect>) {
        if !self.gate.accepts(raw) {
            debug!(
                "fix dropped: lat={} lon={} speed={:?}",
                raw.lat, raw.lon, raw.speed_mps
            );
            return;
        }
        self.smoother.add(raw.position());
        let Some(fix) = self.smoother.average() else {
            return;
        };
        self.current_fix = Some(fix);
        self.window.push(fix);
        self.refresh_live_position(fx);

        match self.step {
            Step::StabilizingA => self.score_stability(fx),
            Step::ValidatingA => self.score_point_a(fx),
            _ => {}
        }
    }

    fn score_stability(&mut self, fx: &mut Vec<Effect>) {
        if self.window.len() < self.params.min_lock_samples {
            return;
        }
        let Some(a) = self.projection.anchor_a().copied() else {
            return;
        };
        let outcome = stability_score(self.window.contiguous(), a.world, &self.params.quality);
        self.record_quality(outcome, fx);
        if outcome.is_locked() {
            info!("anchor A stable (score {:.3})", outcome.score());
            self.enter(Step::AwaitingB, fx);
            self.set_status(Status::StabilityLocked, fx);
        }
    }

    fn score_point_a(&mut self, fx: &mut Vec<Effect>) {
        if self.window.len() >= self.params.min_lock_samples {
            if let Some(a) = self.projection.anchor_a().copied() {
                let projection = &self.projection;
                let outcome = point_a_quality(
                    self.window.contiguous(),
                    a.world,
                    a.image,
                    |p| projection.project(p),
                    &self.params.quality,
                );
                self.record_quality(outcome, fx);
                if outcome.is_locked() {
                    info!("anchor A validated (score {:.3})", outcome.score());
                    self.enter(Step::Navigating, fx);
                    self.set_status(Status::ValidationLocked, fx);
                    return;
                }
            }
        }

        if let Some(elapsed) = self.qa_elapsed_secs() {
            if elapsed > self.params.advisory_after_secs && !self.advisory_shown {
                self.advisory_shown = true;
                self.set_status(
                    Status::ValidationSlow {
                        seconds: elapsed.floor() as u64,
                    },
                    fx,
                );
            }
        }
    }

    fn on_restore(&mut self, snapshot: &PersistedState, fx: &mut Vec<Effect>) {
        self.reset(fx);
        let step = match snapshot.validate() {
            Ok(step) => step,
            Err(err) => {
                warn!("snapshot rejected: {err}");
                self.set_status(Status::SnapshotRejected, fx);
                return;
            }
        };

        for id in [AnchorId::A, AnchorId::B] {
            if let Some(anchor) = snapshot.anchor(id) {
                self.projection.set_anchor(id, *anchor);
            }
        }
        fx.push(Effect::AnchorsChanged);
        if self.projection.anchor_a().is_some() && self.projection.anchor_b().is_some() {
            self.recompute(fx);
        }
        self.enter(step, fx);
        info!("restored snapshot at step {step}");
        self.set_status(Status::Restored(step), fx);
    }

    fn recompute(&mut self, fx: &mut Vec<Effect>) -> Projection {
        let calibration = self.projection.compute();
        fx.push(Effect::Calibrated(calibration));
        calibration
    }

    /// Switch step. Entering or leaving a validation loop restarts its
    /// bookkeeping; every entry clears the sample window. Validation and
    /// editing steps also start from an empty smoother so fixes from the
    /// previous spot do not leak into the new phase.
    fn enter(&mut self, to: Step, fx: &mut Vec<Effect>) {
        let from = self.step;
        self.step = to;
        self.window.clear();
        if to.is_validation() || to.is_editing() {
            self.smoother.reset();
            fx.push(Effect::SmootherReset);
        }
        if to.is_validation() {
            self.start_qa();
        } else {
            self.stop_qa();
        }
        if from != to {
            debug!("step {from} -> {to}");
            fx.push(Effect::StepChanged { from, to });
        }
        self.refresh_live_position(fx);
    }

    fn start_qa(&mut self) {
        self.qa_started_ms = Some(self.now_ms);
        self.last_quality = None;
        self.advisory_shown = false;
    }

    fn stop_qa(&mut self) {
        self.qa_started_ms = None;
        self.last_quality = None;
        self.advisory_shown = false;
    }

    fn record_quality(&mut self, outcome: QualityOutcome, fx: &mut Vec<Effect>) {
        self.last_quality = Some(outcome);
        fx.push(Effect::Quality(outcome));
    }

    fn refresh_live_position(&mut self, fx: &mut Vec<Effect>) {
        let live = if self.step.shows_live_position() {
            self.current_fix.and_then(|fix| self.projection.project(fix))
        } else {
            None
        };
        if live != self.live_position || live.is_some() {
            self.live_position = live;
            fx.push(Effect::LivePosition(live));
        }
    }

    fn set_status(&mut self, status: Status, fx: &mut Vec<Effect>) {
        if status != self.status {
            self.status = status.clone();
            fx.push(Effect::Status(status));
        }
    }
}

fn status_after(calibration: Projection, ok: Status) -> Status {
    match calibration {
        Projection::Degenerate(reason) => Status::Degenerate(reason),
        _ => ok,
    }
}
