//! Offline replay of recorded event traces.
//!
//! A trace is a JSON array of [`Event`]s. Because the workflow is a pure
//! function of its events, replaying a trace reproduces exactly what the
//! device showed.

use photo_map_core::{ImagePoint, ProjectionDebug};
use photo_map_quality::QualityOutcome;
use photo_map_workflow::{
    CalibrationWorkflow, Dispatcher, Event, PersistedState, QaOverlay, SnapshotError, Step,
    WorkflowConfigError, WorkflowIoError, WorkflowParams,
};
use serde::Serialize;
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("params: {0}")]
    Params(#[from] WorkflowIoError),
    #[error(transparent)]
    Config(#[from] WorkflowConfigError),
    #[error("snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// What the workflow exposed right after one event.
#[derive(Clone, Debug, Serialize)]
pub struct ReplayFrame {
    pub index: usize,
    pub at_ms: u64,
    pub event: &'static str,
    pub step: Step,
    pub status: String,
    pub live_position: Option<ImagePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa: Option<QaOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityOutcome>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub frames: Vec<ReplayFrame>,
    pub final_step: Step,
    pub final_status: String,
    pub transform: Option<ProjectionDebug>,
    pub snapshot: PersistedState,
}

impl ReplayReport {
    pub fn to_json_pretty(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Parse a trace file: a JSON array of events.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<Event>, ReplayError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Feed `events` through a fresh workflow, optionally restored from
/// `snapshot` first, and record a frame per event.
pub fn replay(
    events: Vec<Event>,
    params: WorkflowParams,
    snapshot: Option<PersistedState>,
) -> Result<ReplayReport, WorkflowConfigError> {
    let workflow = match snapshot {
        Some(snapshot) => CalibrationWorkflow::restored(params, snapshot, 0)?,
        None => CalibrationWorkflow::new(params)?,
    };

    let mut dispatcher = Dispatcher::new(workflow);
    for event in events {
        dispatcher.push(event);
    }
    log::debug!("replaying {} events", dispatcher.pending());

    let mut frames = Vec::with_capacity(dispatcher.pending());
    dispatcher.drain_with(|wf, event, _| {
        frames.push(ReplayFrame {
            index: frames.len(),
            at_ms: event.at_ms(),
            event: event_kind(event),
            step: wf.step(),
            status: wf.status_text(),
            live_position: wf.live_position(),
            qa: wf.qa_overlay(),
            quality: wf.last_quality().copied(),
        });
    });

    let wf = dispatcher.into_workflow();
    log::info!("replay finished at step {}", wf.step());
    Ok(ReplayReport {
        frames,
        final_step: wf.step(),
        final_status: wf.status_text(),
        transform: wf.debug_snapshot(),
        snapshot: wf.snapshot(),
    })
}

/// Load params, snapshot and trace from disk and replay them.
pub fn replay_files(
    trace: impl AsRef<Path>,
    params: Option<&Path>,
    snapshot: Option<&Path>,
) -> Result<ReplayReport, ReplayError> {
    let params = match params {
        Some(path) => WorkflowParams::load_json(path)?,
        None => WorkflowParams::default(),
    };
    let snapshot = snapshot.map(PersistedState::load_json).transpose()?;
    let events = load_trace(trace)?;
    Ok(replay(events, params, snapshot)?)
}

fn event_kind(event: &Event) -> &'static str {
    match event {
        Event::ImageLoaded { .. } => "image_loaded",
        Event::ResetSession { .. } => "reset_session",
        Event::Tap { .. } => "tap",
        Event::GpsFix { .. } => "gps_fix",
        Event::Restore { .. } => "restore",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_map_core::{GeoPoint, RawFix};

    fn fixes_at(p: GeoPoint, from_ms: u64, n: u64) -> impl Iterator<Item = Event> {
        (0..n).map(move |i| Event::GpsFix {
            fix: RawFix::new(p.lat, p.lon),
            at_ms: from_ms + i * 100,
        })
    }

    #[test]
    fn frames_follow_events() {
        let a = GeoPoint::new(46.0, 7.0);
        let mut events: Vec<Event> = fixes_at(a, 0, 5).collect();
        events.push(Event::Tap {
            image: ImagePoint::new(50.0, 60.0),
            hit: None,
            at_ms: 600,
        });
        events.extend(fixes_at(a, 700, 20));

        let report = replay(events, WorkflowParams::default(), None).expect("replay");
        assert_eq!(report.frames.len(), 26);
        assert_eq!(report.frames[5].event, "tap");
        assert_eq!(report.frames[5].step, Step::StabilizingA);
        assert!(report.frames[5].qa.is_some());
        assert_eq!(report.final_step, Step::AwaitingB);
        assert_eq!(report.frames[24].step, Step::StabilizingA);
        assert!(report.frames[25].status.contains("stable"));
        assert_eq!(report.snapshot.step, 1);
        assert!(report.transform.is_none());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = WorkflowParams {
            sample_capacity: 5,
            ..WorkflowParams::default()
        };
        assert!(matches!(
            replay(Vec::new(), params, None),
            Err(WorkflowConfigError::WindowTooSmall { .. })
        ));
    }

    #[test]
    fn trace_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("trace.json");
        fs::write(
            &path,
            r#"[
                {"type": "image_loaded", "at_ms": 0},
                {"type": "gps_fix", "fix": {"lat": 46.0, "lon": 7.0, "speedMetersPerSecond": 0.4}, "at_ms": 100},
                {"type": "tap", "image": {"x": 10, "y": 20}, "at_ms": 200}
            ]"#,
        )
        .expect("write trace");

        let events = load_trace(&path).expect("trace");
        assert_eq!(events.len(), 3);
        let report = replay_files(&path, None, None).expect("replay");
        assert_eq!(report.final_step, Step::StabilizingA);
        assert!(report.to_json_pretty().expect("json").contains("\"final_step\": 7"));
    }
}
