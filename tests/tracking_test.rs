use std::collections::BTreeMap;
use std::sync::Arc;

use visittrack_rs::geometry::Polygon;
use visittrack_rs::tracker::replay::{ReplayEntry, ReplayFactory, ReplayScript, ReplayTrack};
use visittrack_rs::{
    BackendError, BoxFormat, Frame, Rect, Section, SectionForest, SectionId, Session,
    SessionConfig, TargetId, TrackingBackend, TrackingError, VisitUpdate,
};

/// Reports a 4x4 box around a scripted center per frame; unscripted frames are losses.
struct PathBackend {
    centers: BTreeMap<u64, (f64, f64)>,
}

impl TrackingBackend for PathBackend {
    fn init(&mut self, _frame: &Frame<'_>, _bbox: Rect) -> Result<(), BackendError> {
        Ok(())
    }

    fn update(&mut self, frame: &Frame<'_>) -> Option<Rect> {
        self.centers
            .get(&frame.index)
            .map(|&(x, y)| Rect::from_center(x, y, 4.0, 4.0))
    }
}

fn frame(index: u64) -> Frame<'static> {
    // One frame per second keeps dwell times equal to frame counts
    Frame::blank(index, index as f64, 100, 100)
}

#[test]
fn test_electronics_visit() {
    let centers: BTreeMap<u64, (f64, f64)> = (11..=60)
        .map(|i| (i, if i <= 40 { (5.0, 5.0) } else { (50.0, 50.0) }))
        .collect();
    let factory = move |_id: TargetId| -> Box<dyn TrackingBackend> {
        Box::new(PathBackend {
            centers: centers.clone(),
        })
    };
    let layout = SectionForest::new(
        vec![Section::new(1, "Electronics", Polygon::rectangle(0.0, 0.0, 10.0, 10.0))],
        4,
    )
    .unwrap();
    let mut session = Session::with_layout(SessionConfig::default(), Arc::new(factory), layout);

    let id = session
        .start_target(Rect::from_center(5.0, 5.0, 4.0, 4.0), &frame(10))
        .unwrap();

    let mut updates = Vec::new();
    for i in 11..=45 {
        updates.extend(session.process_frame(&frame(i)).unwrap().visits);
    }

    assert_eq!(updates.len(), 2);
    assert!(matches!(&updates[0], VisitUpdate::Opened(e) if e.enter_frame == 10));
    let VisitUpdate::Closed(event) = &updates[1] else {
        panic!("expected the visit to close");
    };
    assert_eq!(event.target, id);
    assert_eq!(event.section, SectionId(1));
    assert_eq!(event.enter_time, 10.0);
    assert_eq!(event.exit_time, Some(41.0));
    assert_eq!(event.dwell(), Some(31.0));

    assert_eq!(session.visits().closed_events().count(), 1);
    assert!(session.open_visits().is_empty());
    assert_eq!(session.visits().time_in_section(id, SectionId(1)), 31.0);
}

#[test]
fn test_border_flicker_yields_one_visit() {
    // Shopper hovers on the border: two frames over the line, then back
    let mut centers = BTreeMap::new();
    for i in 1..=30u64 {
        let x = if i > 3 && i % 3 != 0 { 15.0 } else { 5.0 };
        centers.insert(i, (x, 5.0));
    }
    for i in 31..=40u64 {
        centers.insert(i, (15.0, 5.0));
    }
    let factory = move |_id: TargetId| -> Box<dyn TrackingBackend> {
        Box::new(PathBackend {
            centers: centers.clone(),
        })
    };
    let layout = SectionForest::new(
        vec![
            Section::new(1, "Electronics", Polygon::rectangle(0.0, 0.0, 10.0, 10.0)),
            Section::new(2, "Groceries", Polygon::rectangle(10.0, 0.0, 20.0, 10.0)),
        ],
        4,
    )
    .unwrap();
    let mut session = Session::with_layout(SessionConfig::default(), Arc::new(factory), layout);
    let id = session
        .start_target(Rect::from_center(5.0, 5.0, 4.0, 4.0), &frame(0))
        .unwrap();
    for i in 1..=40 {
        session.process_frame(&frame(i)).unwrap();
    }

    assert_eq!(
        session.visits().visit_sequence(id),
        vec![SectionId(1), SectionId(2)]
    );
    let electronics: Vec<_> = session
        .visits()
        .events()
        .iter()
        .filter(|e| e.section == SectionId(1))
        .collect();
    assert_eq!(electronics.len(), 1);
    // Last inside observation is frame 30, so the exit is frame 31
    assert_eq!(electronics[0].exit_frame, Some(31));
}

#[test]
fn test_nested_layout_file_and_atomic_reload() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("store.json");
    std::fs::write(
        &nested,
        r#"{"sections": [
            {"id": 1, "name": "Store", "parent_id": null,
             "polygon": [[0, 0], [100, 0], [100, 100], [0, 100]]},
            {"id": 2, "name": "Electronics", "parent_id": 1,
             "polygon": [[0, 0], [50, 0], [50, 50], [0, 50]]},
            {"id": 3, "name": "TV shelf", "parent_id": 2,
             "polygon": [[0, 0], [10, 0], [10, 10], [0, 10]]}
        ]}"#,
    )
    .unwrap();
    let overlapping = dir.path().join("broken.json");
    std::fs::write(
        &overlapping,
        r#"{"sections": [
            {"id": 1, "name": "A", "polygon": [[0, 0], [10, 0], [10, 10], [0, 10]]},
            {"id": 2, "name": "B", "polygon": [[5, 5], [15, 5], [15, 15], [5, 15]]}
        ]}"#,
    )
    .unwrap();

    let centers: BTreeMap<u64, (f64, f64)> = (1..=5).map(|i| (i, (5.0, 5.0))).collect();
    let factory = move |_id: TargetId| -> Box<dyn TrackingBackend> {
        Box::new(PathBackend {
            centers: centers.clone(),
        })
    };
    let mut session = Session::new(SessionConfig::default(), Arc::new(factory));
    session.load_layout(&nested).unwrap();

    match session.load_layout(&overlapping) {
        Err(TrackingError::InvalidLayout { ids, .. }) => {
            assert_eq!(ids, vec![SectionId(1), SectionId(2)]);
        }
        other => panic!("expected InvalidLayout, got {other:?}"),
    }
    assert_eq!(session.layout().len(), 3);

    let id = session
        .start_target(Rect::from_center(5.0, 5.0, 4.0, 4.0), &frame(0))
        .unwrap();
    session.process_frame(&frame(1)).unwrap();
    session.process_frame(&frame(2)).unwrap();
    let report = session.process_frame(&frame(3)).unwrap();
    assert_eq!(
        report.assignments[&id],
        vec![SectionId(3), SectionId(2), SectionId(1)]
    );
    // Shelf, department and store visits are open at once
    assert_eq!(session.open_visits().len(), 3);

    // save -> load -> save is byte-identical
    let saved = dir.path().join("saved.json");
    session.layout().save(&saved).unwrap();
    let reloaded = SectionForest::load(&saved, 4).unwrap();
    assert_eq!(
        reloaded.to_json().unwrap(),
        std::fs::read_to_string(&saved).unwrap()
    );
}

fn track(frames: std::ops::RangeInclusive<u64>, tlwh: impl Fn(u64) -> [f64; 4]) -> ReplayTrack {
    ReplayTrack {
        track: frames
            .map(|frame| ReplayEntry {
                frame,
                bbox: Some(tlwh(frame)),
            })
            .collect(),
    }
}

#[test]
fn test_replay_conversion() {
    // Default store on 640x480: Entrance (0,0)-(160,60), Clothing (320,0)-(480,240),
    // Checkout (0,320)-(320,480)
    let script = ReplayScript {
        format: BoxFormat::Tlwh,
        targets: vec![
            track(2..=11, |_| [390.0, 80.0, 20.0, 40.0]),
            track(0..=11, |f| {
                if f <= 5 {
                    [70.0, 10.0, 20.0, 40.0]
                } else {
                    [90.0, 380.0, 20.0, 40.0]
                }
            }),
        ],
    }
    .in_selection_order();

    let mut config = SessionConfig::default();
    config.analytics.entrance = Some(SectionId(1));
    config.analytics.checkout = Some(SectionId(7));
    let mut session = Session::with_layout(
        config,
        Arc::new(ReplayFactory::new(&script)),
        SectionForest::default_store(640, 480),
    );

    let selections = script.selections();
    for index in 0..=11 {
        let frame = Frame::blank(index, index as f64 / 30.0, 640, 480);
        session.process_frame(&frame).unwrap();
        for (_, bbox) in selections.iter().flatten().filter(|(at, _)| *at == index) {
            session.start_target(*bbox, &frame).unwrap();
        }
    }

    let shopper = TargetId(1);
    assert_eq!(
        session.visits().visit_sequence(shopper),
        vec![SectionId(1), SectionId(7)]
    );
    assert_eq!(session.visits().visit_sequence(TargetId(2)), vec![SectionId(4)]);

    let export = session.export();
    let conversion = export.analytics.conversion.as_ref().unwrap();
    assert_eq!(conversion.tracked_targets, 2);
    assert_eq!(conversion.entered, 1);
    assert_eq!(conversion.converted, 1);
    assert_eq!(conversion.rate, Some(0.5));

    assert_eq!(export.visits.len(), 3);
    assert!(export.visits.iter().all(|v| v.exit_frame.is_some()));
    assert_eq!(export.analytics.popularity[0].section, SectionId(1));
    let pattern = &export.analytics.targets[0].pattern;
    assert_eq!(export.analytics.targets[0].target, shopper);
    assert_eq!(pattern.sections_visited, 2);
    assert_eq!(pattern.backtracking_score, 0.0);
    assert_eq!(export.analytics.heatmap.total(), 22);
    assert_eq!(export.paths.len(), 2);
}
