//! Integration tests for the tracker.
//!
//! Drives kinetrace-tracking sessions over synthetic kinetrace-core frames
//! and round-trips the resulting trajectories through storage.

use std::collections::BTreeMap;

use kinetrace_core::{GrayImage, Point2, Timestamp};
use kinetrace_tracking::{
    CorrelationTracker, TrackedPoint, TrackerParameters, TrackingSession, TrackingState, TrajectoryFile,
};

// ── Helpers ────────────────────────────────────────────────────

/// Two overlapping blobs on a flat background, centered on `(cx, cy)`.
fn marker_frame(cx: i32, cy: i32) -> GrayImage {
    GrayImage::from_fn(160, 160, |x, y| {
        let dx = x as f32 - cx as f32;
        let dy = y as f32 - cy as f32;
        let main = (-(dx * dx + dy * dy) / 18.0).exp();
        let side = (-((dx - 4.0).powi(2) + (dy + 3.0).powi(2)) / 8.0).exp();
        0.2 + 0.6 * main + 0.3 * side
    })
}

/// Marker moving 2 px right and 1 px down per frame from (70, 70).
fn moving_marker(frames: i64) -> BTreeMap<Timestamp, GrayImage> {
    (0..frames)
        .map(|t| (Timestamp::new(t), marker_frame(70 + 2 * t as i32, 70 + t as i32)))
        .collect()
}

fn expected(t: usize) -> Point2 {
    Point2::new(70.0 + 2.0 * t as f64, 70.0 + t as f64)
}

fn track(frames: &BTreeMap<Timestamp, GrayImage>) -> TrackingSession<CorrelationTracker> {
    let mut session = TrackingSession::start(
        CorrelationTracker::default(),
        expected(0),
        Timestamp::new(0),
        frames.get(&Timestamp::new(0)),
    );
    let rest: Vec<Timestamp> = frames.keys().copied().skip(1).collect();
    session.track_source(frames, rest).unwrap();
    session
}

// ── Tracking ───────────────────────────────────────────────────

#[test]
fn session_follows_moving_marker() {
    let frames = moving_marker(6);
    let session = track(&frames);

    assert_eq!(session.state(), TrackingState::Matched);
    let traj = session.trajectory();
    assert_eq!(traj.len(), 6);
    for (i, p) in traj.points().iter().enumerate() {
        assert!((p.position - expected(i)).length() < 0.1, "sample {} at {:?}", i, p.position);
        assert!(p.similarity >= 0.99);
    }
    assert!(traj.points()[0].manual);
    assert!(traj.points()[1..].iter().all(|p| !p.manual));
}

#[test]
fn lost_marker_falls_back_to_last_position() {
    let mut frames = moving_marker(4);
    frames.insert(Timestamp::new(4), GrayImage::from_fn(160, 160, |_, _| 0.2));
    let session = track(&frames);

    // The miss ends the pass.
    assert_eq!(session.state(), TrackingState::Stopped);
    let traj = session.trajectory();
    assert_eq!(traj.len(), 5);
    assert_eq!(traj.last().position, traj.points()[3].position);
}

#[test]
fn manual_correction_resumes_tracking() {
    let frames = moving_marker(6);
    let mut session = TrackingSession::start(
        CorrelationTracker::default(),
        expected(0),
        Timestamp::new(0),
        frames.get(&Timestamp::new(0)),
    );
    session.track_frame(frames.get(&Timestamp::new(1)), Timestamp::new(1)).unwrap();
    session
        .place_manual(expected(2), Timestamp::new(2), frames.get(&Timestamp::new(2)))
        .unwrap();
    assert_eq!(session.state(), TrackingState::Manual);

    for t in 3..6 {
        let state = session.track_frame(frames.get(&Timestamp::new(t)), Timestamp::new(t)).unwrap();
        assert_eq!(state, TrackingState::Matched);
    }
    let traj = session.trajectory();
    assert_eq!(traj.len(), 6);
    assert!(traj.points()[2].manual);
    assert!((traj.last().position - expected(5)).length() < 0.1);
}

// ── Persistence ────────────────────────────────────────────────

#[test]
fn tracked_trajectory_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marker.json");

    let traj = track(&moving_marker(4)).into_trajectory();
    TrajectoryFile::new(traj.clone(), TrackerParameters::default())
        .save_to_file(&path)
        .unwrap();
    let loaded = TrajectoryFile::load_from_file(&path).unwrap();

    assert_eq!(loaded.trajectory, traj);
    assert_eq!(loaded.parameters, TrackerParameters::default());
}

#[test]
fn stripped_trajectory_resumes_from_orphans() {
    let frames = moving_marker(6);
    let traj = track(&frames).into_trajectory();
    let data = TrajectoryFile::new(traj, TrackerParameters::default())
        .without_templates()
        .to_json()
        .unwrap();

    let mut loaded = TrajectoryFile::from_json(&data).unwrap().trajectory;
    assert!(loaded.points().iter().all(|p| !p.has_template()));

    // Drop the last two samples and track them again from the orphan tail.
    loaded.chop(3).unwrap();
    let mut session = TrackingSession::resume(CorrelationTracker::default(), loaded);
    session.track_source(&frames, [Timestamp::new(4), Timestamp::new(5)]).unwrap();
    assert_eq!(session.trajectory().len(), 6);
    assert!((session.trajectory().last().position - expected(5)).length() < 0.1);
}

#[test]
fn future_version_file_is_rejected() {
    let traj = track(&moving_marker(3)).into_trajectory();
    let mut file = TrajectoryFile::new(traj, TrackerParameters::default());
    file.version += 1;
    let data = serde_json::to_vec(&file).unwrap();

    let err = TrajectoryFile::from_json(&data).unwrap_err();
    assert!(err.to_string().contains("version"));
}

#[test]
fn out_of_order_json_is_rejected() {
    let json = serde_json::json!({
        "version": 1,
        "app_version": "0.1.0",
        "parameters": TrackerParameters::default(),
        "trajectory": {
            "id": "00000000-0000-0000-0000-000000000000",
            "points": [
                TrackedPoint::orphan(Point2::new(0.0, 0.0), Timestamp::new(5)),
                TrackedPoint::orphan(Point2::new(1.0, 0.0), Timestamp::new(5)),
            ],
        },
    });
    let data = serde_json::to_vec(&json).unwrap();
    assert!(TrajectoryFile::from_json(&data).is_err());
}
