//! High-level facade for the `photo-map-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the geometry, scoring and workflow crates
//! - [`replay`]: run a recorded event trace through the workflow and collect
//!   what a renderer would have shown after each event
//!
//! ## Quickstart
//!
//! ```
//! use photo_map::workflow::{Event, Step, WorkflowParams};
//! use photo_map::core::{ImagePoint, RawFix};
//!
//! let events = vec![
//!     Event::GpsFix { fix: RawFix::new(46.0, 7.0), at_ms: 0 },
//!     Event::Tap { image: ImagePoint::new(10.0, 10.0), hit: None, at_ms: 100 },
//! ];
//! let report = photo_map::replay::replay(events, WorkflowParams::default(), None)
//!     .expect("valid params");
//! assert_eq!(report.final_step, Step::StabilizingA);
//! ```
//!
//! ## API map
//! - `photo_map::core`: anchors, tangent-plane projection, GPS smoothing.
//! - `photo_map::quality`: stability and reprojection scoring.
//! - `photo_map::workflow`: the calibration state machine and its snapshot.
//! - `photo_map::replay`: offline trace replay, used by the `photo-map` binary.

pub use photo_map_core as core;
pub use photo_map_quality as quality;
pub use photo_map_workflow as workflow;

pub use photo_map_core::{CalibrationAnchor, GeoPoint, GeoProjection, ImagePoint, Projection};
pub use photo_map_workflow::{CalibrationWorkflow, Event, PersistedState, Step, WorkflowParams};

pub mod replay;
