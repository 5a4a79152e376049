use crate::{PersistedState, Step};
use photo_map_core::{AnchorId, DegenerateGeometry, ImagePoint, Projection, RawFix};
use photo_map_quality::QualityOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inbound event. `at_ms` is monotonic time since session start, supplied by
/// the environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new map image was loaded.
    ImageLoaded { at_ms: u64 },
    /// The user restarted calibration.
    ResetSession { at_ms: u64 },
    /// A tap, already converted to image coordinates. `hit` is the marker the
    /// renderer matched under the tap, if any.
    Tap {
        image: ImagePoint,
        #[serde(default)]
        hit: Option<AnchorId>,
        at_ms: u64,
    },
    /// A raw device fix.
    GpsFix { fix: RawFix, at_ms: u64 },
    /// Rehydrate from a persisted snapshot. Invalid snapshots start fresh.
    Restore { snapshot: PersistedState, at_ms: u64 },
}

impl Event {
    #[inline]
    pub fn at_ms(&self) -> u64 {
        match self {
            Event::ImageLoaded { at_ms }
            | Event::ResetSession { at_ms }
            | Event::Tap { at_ms, .. }
            | Event::GpsFix { at_ms, .. }
            | Event::Restore { at_ms, .. } => *at_ms,
        }
    }
}

/// Observable consequence of handling one event.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    StepChanged { from: Step, to: Step },
    Status(Status),
    /// New live marker position; `None` hides it.
    LivePosition(Option<ImagePoint>),
    /// Anchors were set, replaced or cleared. Redraw markers, autosave.
    AnchorsChanged,
    /// Result of recomputing the transform after an anchor change.
    Calibrated(Projection),
    /// A validation step scored its sample window.
    Quality(QualityOutcome),
    SmootherReset,
}

/// What the user is being told. The text is for display only.
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    WaitingForFix,
    TapAnchorA,
    HoldStillAtA,
    TapAnchorB,
    StabilityLocked,
    ValidatingA,
    Navigating,
    ValidationLocked,
    Editing(AnchorId),
    Degenerate(DegenerateGeometry),
    ValidationSlow { seconds: u64 },
    Restored(Step),
    SnapshotRejected,
}

impl Status {
    /// Resting instruction for a step.
    pub fn for_step(step: Step) -> Status {
        match step {
            Step::AwaitingA => Status::TapAnchorA,
            Step::AwaitingB => Status::TapAnchorB,
            Step::Navigating | Step::RefiningC => Status::Navigating,
            Step::EditingA => Status::Editing(AnchorId::A),
            Step::EditingB => Status::Editing(AnchorId::B),
            Step::ValidatingA => Status::ValidatingA,
            Step::StabilizingA => Status::HoldStillAtA,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::WaitingForFix => f.write_str("Waiting for GPS fix…"),
            Status::TapAnchorA => f.write_str("Tap the spot you are standing on (point A)"),
            Status::HoldStillAtA => {
                f.write_str("Hold still at A while GPS settles, or tap to continue")
            }
            Status::TapAnchorB => f.write_str("Walk to a second spot and tap it (point B)"),
            Status::StabilityLocked => {
                f.write_str("Point A is stable. Walk to a second spot and tap it (point B)")
            }
            Status::ValidatingA => f.write_str("Return to point A and hold still to validate"),
            Status::Navigating => f.write_str("Navigation active"),
            Status::ValidationLocked => f.write_str("Calibration validated. Navigation active"),
            Status::Editing(id) => write!(f, "Tap the new position of point {id}"),
            Status::Degenerate(reason) => {
                write!(f, "Calibration failed ({reason}). Tap a marker to move it")
            }
            Status::ValidationSlow { seconds } => write!(
                f,
                "Still validating after {seconds}s. If marker A looks wrong, tap it to move it"
            ),
            Status::Restored(step) => write!(f, "Calibration restored at step {}", u8::from(*step)),
            Status::SnapshotRejected => f.write_str("Saved calibration unusable. Tap point A"),
        }
    }
}
