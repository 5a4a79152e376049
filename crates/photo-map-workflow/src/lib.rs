//! Calibration workflow for aligning a photographed map with live GPS.
//!
//! The workflow sequences two anchor taps, validates anchor A statistically,
//! and then projects every smoothed fix onto the image:
//!
//! | Step | Meaning |
//! |---|---|
//! | 0 | awaiting tap for anchor A |
//! | 7 | A set; waiting for its GPS to settle (tap to skip) |
//! | 1 | awaiting tap for anchor B |
//! | 5 | both set; validating A against the transform |
//! | 2 | navigating |
//! | 3 / 4 | replacing A / B after tapping its marker |
//! | 6 | reserved for point-C refinement, never entered |
//!
//! State lives in one owned [`WorkflowState`] value advanced by the pure
//! [`transition`] function. [`CalibrationWorkflow`] wraps it with the views a
//! renderer needs, and [`Dispatcher`] serializes events from several sources.
//!
//! ## Quickstart
//!
//! ```
//! use photo_map_core::{ImagePoint, RawFix};
//! use photo_map_workflow::{CalibrationWorkflow, Event, Step, WorkflowParams};
//!
//! let mut wf = CalibrationWorkflow::new(WorkflowParams::default()).expect("valid params");
//! wf.handle(Event::GpsFix { fix: RawFix::new(46.0, 7.0), at_ms: 0 });
//! wf.handle(Event::Tap { image: ImagePoint::new(120.0, 80.0), hit: None, at_ms: 500 });
//! assert_eq!(wf.step(), Step::StabilizingA);
//! ```

mod dispatcher;
mod event;
mod overlay;
mod params;
mod snapshot;
mod state;
mod step;
mod workflow;

pub use dispatcher::Dispatcher;
pub use event::{Effect, Event, Status};
pub use overlay::{hit_test, north_vector, Marker, MarkerColor, ScaleBar};
pub use params::{WorkflowConfigError, WorkflowIoError, WorkflowParams};
pub use snapshot::{PersistedState, SnapshotError, SNAPSHOT_VERSION};
pub use state::{transition, SampleWindow, WorkflowState};
pub use step::{Step, UnknownStep};
pub use workflow::{CalibrationWorkflow, QaOverlay};
