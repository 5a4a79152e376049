use approx::assert_abs_diff_eq;
use photo_map_core::{
    AnchorId, CalibrationAnchor, DegenerateGeometry, GeoPoint, ImagePoint, Projection, RawFix,
};
use photo_map_workflow::{
    CalibrationWorkflow, Effect, Event, MarkerColor, PersistedState, Status, Step, WorkflowParams,
};

const A_WORLD: GeoPoint = GeoPoint {
    lat: 46.0,
    lon: 7.0,
};
// Roughly 77 m east of A.
const B_WORLD: GeoPoint = GeoPoint {
    lat: 46.0,
    lon: 7.001,
};

fn a_image() -> ImagePoint {
    ImagePoint::new(100.0, 100.0)
}

fn b_image() -> ImagePoint {
    ImagePoint::new(200.0, 100.0)
}

/// Drives a workflow with a fake monotonic clock.
struct Session {
    wf: CalibrationWorkflow,
    now_ms: u64,
}

impl Session {
    fn new() -> Self {
        env_logger::builder().is_test(true).try_init().ok();
        Self {
            wf: CalibrationWorkflow::new(WorkflowParams::default()).expect("default params"),
            now_ms: 0,
        }
    }

    fn advance(&mut self, ms: u64) -> u64 {
        self.now_ms += ms;
        self.now_ms
    }

    fn fix(&mut self, at: GeoPoint) -> Vec<Effect> {
        let at_ms = self.advance(100);
        self.wf.handle(Event::GpsFix {
            fix: RawFix::new(at.lat, at.lon),
            at_ms,
        })
    }

    /// Enough identical fixes to flush the smoother.
    fn stand_at(&mut self, at: GeoPoint) {
        for _ in 0..WorkflowParams::default().smoother_window {
            self.fix(at);
        }
    }

    fn tap(&mut self, image: ImagePoint) -> Vec<Effect> {
        let hit = self.wf.marker_at(image, 1.0);
        let at_ms = self.advance(100);
        self.wf.handle(Event::Tap { image, hit, at_ms })
    }

    /// Runs the happy path up to navigation.
    fn calibrated() -> Self {
        let mut s = Self::new();
        s.stand_at(A_WORLD);
        s.tap(a_image());
        for _ in 0..20 {
            s.fix(A_WORLD);
        }
        s.stand_at(B_WORLD);
        s.tap(b_image());
        for _ in 0..40 {
            s.fix(A_WORLD);
        }
        assert_eq!(s.wf.step(), Step::Navigating);
        s
    }
}

#[test]
fn tap_without_fix_waits() {
    let mut s = Session::new();
    let fx = s.tap(a_image());
    assert_eq!(s.wf.step(), Step::AwaitingA);
    assert_eq!(s.wf.status(), &Status::WaitingForFix);
    assert!(fx.contains(&Effect::Status(Status::WaitingForFix)));
    assert!(s.wf.markers().is_empty());
}

#[test]
fn full_calibration_trace() {
    let mut s = Session::new();
    s.stand_at(A_WORLD);
    assert_eq!(s.wf.current_fix(), Some(A_WORLD));

    let fx = s.tap(a_image());
    assert_eq!(s.wf.step(), Step::StabilizingA);
    assert!(fx.contains(&Effect::StepChanged {
        from: Step::AwaitingA,
        to: Step::StabilizingA,
    }));
    assert!(fx.contains(&Effect::AnchorsChanged));

    for _ in 0..19 {
        s.fix(A_WORLD);
    }
    assert_eq!(s.wf.step(), Step::StabilizingA);
    let overlay = s.wf.qa_overlay().expect("overlay while stabilizing");
    assert_eq!(overlay.sample_count, 19);
    assert_eq!(overlay.min_samples, 20);
    assert_eq!(overlay.qa_percent, None);

    s.fix(A_WORLD);
    assert_eq!(s.wf.step(), Step::AwaitingB);
    assert_eq!(s.wf.status(), &Status::StabilityLocked);
    assert!(s.wf.qa_overlay().is_none());

    s.stand_at(B_WORLD);
    let fx = s.tap(b_image());
    assert_eq!(s.wf.step(), Step::ValidatingA);
    assert!(fx
        .iter()
        .any(|e| matches!(e, Effect::Calibrated(Projection::Ready(_)))));
    assert!(s.wf.state().projection().is_ready());

    // The live marker sits on B while standing there.
    let live = s.wf.live_position().expect("live position in validation");
    assert_abs_diff_eq!(live.x, 200.0, epsilon = 1e-6);
    assert_abs_diff_eq!(live.y, 100.0, epsilon = 1e-6);

    for _ in 0..40 {
        s.fix(A_WORLD);
        if s.wf.step() == Step::Navigating {
            break;
        }
    }
    assert_eq!(s.wf.step(), Step::Navigating);
    assert_eq!(s.wf.status(), &Status::ValidationLocked);

    let live = s.wf.live_position().expect("live position while navigating");
    assert_abs_diff_eq!(live.x, 100.0, epsilon = 1e-6);
    assert_abs_diff_eq!(live.y, 100.0, epsilon = 1e-6);

    let debug = s.wf.debug_snapshot().expect("transform");
    assert!(debug.scale > 0.0);
    assert_abs_diff_eq!(debug.rotation_radians, 0.0, epsilon = 1e-9);
}

#[test]
fn validation_starts_from_a_clean_smoother() {
    let mut s = Session::new();
    s.stand_at(A_WORLD);
    s.tap(a_image());
    s.tap(ImagePoint::new(400.0, 400.0));
    s.stand_at(B_WORLD);
    let fx = s.tap(b_image());
    assert_eq!(s.wf.step(), Step::ValidatingA);
    assert!(fx.contains(&Effect::SmootherReset));
    assert!(s.wf.state().smoother().is_empty());

    // Fixes from B do not leak into A's samples, so the minimum count locks.
    for _ in 0..19 {
        s.fix(A_WORLD);
    }
    assert_eq!(s.wf.step(), Step::ValidatingA);
    s.fix(A_WORLD);
    assert_eq!(s.wf.step(), Step::Navigating);
}

#[test]
fn tapping_skips_stabilization() {
    let mut s = Session::new();
    s.stand_at(A_WORLD);
    s.tap(a_image());
    s.tap(ImagePoint::new(400.0, 400.0));
    assert_eq!(s.wf.step(), Step::AwaitingB);
    assert_eq!(s.wf.status(), &Status::TapAnchorB);
}

#[test]
fn marker_hit_while_navigating_edits_that_anchor() {
    let mut s = Session::calibrated();

    let markers = s.wf.markers();
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].color, MarkerColor::Blue);
    assert_eq!(markers[1].color, MarkerColor::Green);

    let fx = s.tap(ImagePoint::new(103.0, 104.0));
    assert_eq!(s.wf.step(), Step::EditingA);
    assert_eq!(s.wf.status(), &Status::Editing(AnchorId::A));
    assert!(fx.contains(&Effect::SmootherReset));
    assert!(s.wf.state().smoother().is_empty());

    // Replacing A goes back through validation.
    s.stand_at(A_WORLD);
    s.tap(ImagePoint::new(102.0, 98.0));
    assert_eq!(s.wf.step(), Step::ValidatingA);
    let a = s.wf.state().projection().anchor_a().expect("A");
    assert_eq!(a.image, ImagePoint::new(102.0, 98.0));
}

#[test]
fn editing_b_returns_to_navigation() {
    let mut s = Session::calibrated();
    s.tap(b_image());
    assert_eq!(s.wf.step(), Step::EditingB);

    s.stand_at(B_WORLD);
    s.tap(ImagePoint::new(210.0, 100.0));
    assert_eq!(s.wf.step(), Step::Navigating);
    assert_eq!(
        s.wf.state().projection().anchor_b().expect("B").image,
        ImagePoint::new(210.0, 100.0)
    );
}

#[test]
fn tap_away_from_markers_is_ignored_while_navigating() {
    let mut s = Session::calibrated();
    let fx = s.tap(ImagePoint::new(600.0, 600.0));
    assert!(fx.is_empty());
    assert_eq!(s.wf.step(), Step::Navigating);
}

#[test]
fn coincident_gps_reports_degenerate_and_never_locks() {
    let mut s = Session::new();
    s.stand_at(A_WORLD);
    s.tap(a_image());
    s.tap(ImagePoint::new(300.0, 300.0));
    // B tapped without walking: same GPS as A.
    s.tap(b_image());
    assert_eq!(s.wf.step(), Step::ValidatingA);
    assert_eq!(
        s.wf.status(),
        &Status::Degenerate(DegenerateGeometry::CoincidentWorldPoints)
    );
    assert!(s.wf.live_position().is_none());

    for _ in 0..30 {
        s.fix(A_WORLD);
    }
    assert_eq!(s.wf.step(), Step::ValidatingA);
    let overlay = s.wf.qa_overlay().expect("overlay");
    assert!(!overlay.locked);
}

#[test]
fn slow_validation_shows_advisory_once() {
    let mut s = Session::new();
    s.stand_at(A_WORLD);
    s.tap(a_image());
    s.tap(ImagePoint::new(300.0, 300.0));
    s.stand_at(B_WORLD);
    s.tap(b_image());
    assert_eq!(s.wf.step(), Step::ValidatingA);

    // Standing at B, nowhere near A.
    s.advance(19_000);
    s.fix(B_WORLD);
    assert_eq!(s.wf.status(), &Status::ValidatingA);

    s.advance(2_000);
    let fx = s.fix(B_WORLD);
    assert!(fx
        .iter()
        .any(|e| matches!(e, Effect::Status(Status::ValidationSlow { .. }))));
    assert!(matches!(s.wf.status(), Status::ValidationSlow { seconds: 21 }));

    s.advance(5_000);
    let fx = s.fix(B_WORLD);
    assert!(!fx.iter().any(|e| matches!(e, Effect::Status(_))));
    assert_eq!(s.wf.qa_overlay().expect("overlay").seconds_elapsed, 26);
}

#[test]
fn fast_fixes_are_dropped() {
    let mut s = Session::new();
    let fx = s.wf.handle(Event::GpsFix {
        fix: RawFix::new(46.0, 7.0).with_speed(8.0),
        at_ms: 10,
    });
    assert!(fx.is_empty());
    assert_eq!(s.wf.current_fix(), None);

    s.wf.handle(Event::GpsFix {
        fix: RawFix::new(46.0, 7.0).with_speed(1.2),
        at_ms: 20,
    });
    assert_eq!(s.wf.current_fix(), Some(A_WORLD));
}

#[test]
fn image_reload_clears_calibration_but_keeps_fix() {
    let mut s = Session::calibrated();
    let fx = s.wf.handle(Event::ImageLoaded { at_ms: s.now_ms });
    assert_eq!(s.wf.step(), Step::AwaitingA);
    assert!(fx.contains(&Effect::AnchorsChanged));
    assert!(s.wf.markers().is_empty());
    assert!(s.wf.live_position().is_none());
    assert!(!s.wf.state().projection().is_ready());
    assert_eq!(s.wf.current_fix(), Some(A_WORLD));
    assert_eq!(s.wf.status(), &Status::TapAnchorA);
}

#[test]
fn snapshot_restores_navigation() {
    let saved = Session::calibrated().wf.snapshot();
    assert_eq!(saved.step, 2);

    let wf = CalibrationWorkflow::restored(WorkflowParams::default(), saved.clone(), 0)
        .expect("params");
    assert_eq!(wf.step(), Step::Navigating);
    assert_eq!(wf.status(), &Status::Restored(Step::Navigating));
    assert!(wf.state().projection().is_ready());
    assert_eq!(wf.snapshot(), saved);
}

#[test]
fn inconsistent_snapshot_starts_fresh() {
    let only_a = PersistedState::new(
        Step::ValidatingA,
        Some(CalibrationAnchor::new(a_image(), A_WORLD)),
        None,
    );
    let wf = CalibrationWorkflow::restored(WorkflowParams::default(), only_a, 0).expect("params");
    assert_eq!(wf.step(), Step::AwaitingA);
    assert_eq!(wf.status(), &Status::SnapshotRejected);
    assert!(wf.markers().is_empty());
}

#[test]
fn replaying_events_is_deterministic() {
    let mut events = Vec::new();
    let mut t = 0;
    let mut push_fix = |events: &mut Vec<Event>, p: GeoPoint| {
        t += 100;
        events.push(Event::GpsFix {
            fix: RawFix::new(p.lat, p.lon),
            at_ms: t,
        });
    };
    for _ in 0..5 {
        push_fix(&mut events, A_WORLD);
    }
    events.push(Event::Tap {
        image: a_image(),
        hit: None,
        at_ms: 1_000,
    });
    for _ in 0..25 {
        push_fix(&mut events, A_WORLD);
    }

    let run = |events: &[Event]| {
        let mut wf = CalibrationWorkflow::default();
        let effects: Vec<_> = events.iter().cloned().flat_map(|e| wf.handle(e)).collect();
        (wf.snapshot(), effects)
    };
    assert_eq!(run(&events), run(&events));
}
