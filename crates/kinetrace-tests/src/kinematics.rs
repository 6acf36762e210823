//! Integration tests for the kinematics engine.
//!
//! Exercises kinetrace-kinematics on trajectories built through
//! kinetrace-tracking, under kinetrace-core calibrations.

use std::f64::consts::{PI, SQRT_2};

use kinetrace_core::{AngleUnit, FrameRate, GrayImage, Point2, Timestamp, UniformCalibration};
use kinetrace_kinematics::{
    analyze_calibrated, analyze_samples, analyze_trajectory, Axis, KinematicsConfig, Quantity,
};
use kinetrace_tracking::{CorrelationTracker, TrackedPoint, TrackingSession, Trajectory};
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────

fn trajectory(points: impl IntoIterator<Item = Point2>) -> Trajectory {
    Trajectory::from_points(
        points
            .into_iter()
            .enumerate()
            .map(|(i, p)| TrackedPoint::orphan(p, Timestamp::new(i as i64)))
            .collect(),
    )
    .unwrap()
}

/// Deterministic uniform noise in [-amplitude, amplitude].
fn noise(n: usize, amplitude: f64) -> Vec<f64> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            (2.0 * unit - 1.0) * amplitude
        })
        .collect()
}

fn rms(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v * v, c + 1));
    (sum / count.max(1) as f64).sqrt()
}

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {}, got {}",
        expected,
        tolerance,
        actual
    );
}

// ── Linear kinematics ──────────────────────────────────────────

#[test]
fn calibrated_diagonal_motion() {
    // Pixel motion (+2, -2) per frame is (+1, +1) calibrated units with the
    // Y axis flipped up.
    let cal = UniformCalibration {
        origin: [10.0, 50.0],
        pixels_per_unit: 2.0,
        y_up: true,
        ..UniformCalibration::identity(FrameRate::FPS_30)
    };
    let traj = trajectory((0..10).map(|i| Point2::new(10.0 + 2.0 * i as f64, 50.0 - 2.0 * i as f64)));
    let k = analyze_trajectory(&traj, &cal, &KinematicsConfig::default()).unwrap();

    assert!(!k.is_filtered());
    assert_eq!(k.len(), 10);
    assert_close(k.value(Quantity::X, 4).unwrap(), 4.0, 1e-12);
    assert_close(k.value(Quantity::Y, 4).unwrap(), 4.0, 1e-12);
    assert_close(k.value(Quantity::TotalDistance, 9).unwrap(), 9.0 * SQRT_2, 1e-9);
    assert_close(k.value(Quantity::VerticalDisplacement, 9).unwrap(), 9.0, 1e-12);

    let speed = k.get(Quantity::Speed).unwrap();
    assert!(speed[0].is_nan() && speed[9].is_nan());
    for v in &speed[1..9] {
        assert_close(*v, 30.0 * SQRT_2, 1e-9);
    }
    for v in &k.get(Quantity::VerticalVelocity).unwrap()[1..9] {
        assert_close(*v, 30.0, 1e-9);
    }

    let acc = k.get(Quantity::Acceleration).unwrap();
    assert!(acc[..2].iter().chain(&acc[8..]).all(|a| a.is_nan()));
    for a in &acc[2..8] {
        assert_close(*a, 0.0, 1e-9);
    }
}

#[test]
fn uniform_motion_end_to_end() {
    // Long enough to be filtered; the sweep keeps the line intact.
    let cal = UniformCalibration::identity(FrameRate::FPS_30);
    let traj = trajectory((0..15).map(|i| Point2::new(i as f64, 0.0)));
    let k = analyze_trajectory(&traj, &cal, &KinematicsConfig::default()).unwrap();

    assert!(k.is_filtered());
    let speed = k.get(Quantity::Speed).unwrap();
    assert!(speed[0].is_nan() && speed[14].is_nan());
    for v in &speed[1..14] {
        assert_close(*v, 30.0, 0.05);
    }
    for (i, d) in k.get(Quantity::HorizontalDisplacement).unwrap().iter().enumerate() {
        assert_close(*d, i as f64, 0.01);
    }
    assert_close(k.value(Quantity::TotalDistance, 14).unwrap(), 14.0, 0.01);
}

#[test]
fn noisy_trajectory_is_filtered() {
    let fps = 30.0;
    let n = 60;
    let clean: Vec<f64> = (0..n)
        .map(|i| 100.0 + 20.0 * (2.0 * PI * 0.5 * i as f64 / fps).sin())
        .collect();
    let jitter_x = noise(n, 0.5);
    let jitter_y = noise(2 * n, 0.5);
    let samples = (0..n).map(|i| {
        (
            Point2::new(clean[i] + jitter_x[i], 40.0 + jitter_y[n + i]),
            Timestamp::new(i as i64),
        )
    });

    let cal = UniformCalibration::identity(FrameRate::FPS_30);
    let k = analyze_samples(samples, &cal, &KinematicsConfig::default()).unwrap();
    assert!(k.is_filtered());

    let fx = k.coordinates.filter_x.as_ref().unwrap();
    assert!(!fx.results.is_empty() && fx.results.len() <= 100);
    let best = fx.best();
    assert!(fx.results.iter().all(|r| r.score >= best.score));
    assert!(best.cutoff >= 0.5 && best.cutoff < fps / 2.0);

    // Raw coordinates are kept alongside the filtered ones.
    let raw = k.get(Quantity::XRaw).unwrap();
    assert_close(raw[7], clean[7] + jitter_x[7], 1e-12);
    assert_eq!(k.get(Quantity::X).unwrap(), &best.data[..]);

    let interior = 10..n - 10;
    let filtered = k.get(Quantity::X).unwrap();
    let filtered_error = rms(interior.clone().map(|i| filtered[i] - clean[i]));
    let raw_error = rms(interior.map(|i| raw[i] - clean[i]));
    assert!(filtered_error < raw_error, "{} vs {}", filtered_error, raw_error);
}

#[test]
fn cutoff_override_is_recomputed() {
    let cal = UniformCalibration::identity(FrameRate::FPS_30);
    let jitter = noise(20, 1.0);
    let samples = (0..20).map(|i| (Point2::new(i as f64 + jitter[i], 0.0), Timestamp::new(i as i64)));
    let config = KinematicsConfig::default();
    let k = analyze_samples(samples, &cal, &config).unwrap();

    let mut coordinates = k.coordinates.clone();
    assert!(coordinates.select_cutoff(Axis::X, 0));
    assert!(!coordinates.select_cutoff(Axis::X, 1000));
    let lowest = coordinates.filter_x.as_ref().unwrap().results[0].data.clone();

    let k = analyze_calibrated(coordinates, &cal, &config).unwrap();
    assert_eq!(k.get(Quantity::X).unwrap(), &lowest[..]);
}

proptest! {
    #[test]
    fn series_match_trajectory_length(
        n in 1usize..24,
        radius in 5.0f64..200.0,
        step in 0.05f64..0.5,
    ) {
        let cal = UniformCalibration::identity(FrameRate::FPS_30);
        let samples = (0..n).map(|i| {
            let a = step * i as f64;
            (Point2::new(radius * a.cos(), radius * a.sin()), Timestamp::new(i as i64))
        });
        let k = analyze_samples(samples, &cal, &KinematicsConfig::default()).unwrap();

        prop_assert_eq!(k.len(), n);
        for q in k.series.quantities() {
            prop_assert_eq!(k.series[q].len(), n);
        }

        let speed = k.get(Quantity::Speed).unwrap();
        let acc = k.get(Quantity::Acceleration).unwrap();
        if n <= 2 {
            prop_assert!(speed.iter().all(|v| v.is_nan()));
        } else {
            prop_assert!(speed[0].is_nan() && speed[n - 1].is_nan());
            prop_assert!(speed[1..n - 1].iter().all(|v| v.is_finite()));
        }
        if n <= 4 {
            prop_assert!(acc.iter().all(|v| v.is_nan()));
        } else {
            prop_assert!(acc[1].is_nan() && acc[n - 2].is_nan());
            prop_assert!(acc[2..n - 2].iter().all(|v| v.is_finite()));
        }
    }
}

// ── Angular kinematics ─────────────────────────────────────────

#[test]
fn rotation_about_fitted_circle() {
    let cal = UniformCalibration::identity(FrameRate::FPS_30);
    let traj = trajectory((0..10).map(|i| {
        let a = 0.2 * i as f64;
        Point2::new(200.0 + 50.0 * a.cos(), 120.0 + 50.0 * a.sin())
    }));
    let k = analyze_trajectory(&traj, &cal, &KinematicsConfig::default()).unwrap();

    assert!(k.has_angular());
    assert!((k.circle.center - Point2::new(200.0, 120.0)).length() < 1e-6);
    assert_close(k.circle.radius, 50.0, 1e-6);

    let omega = k.get(Quantity::AngularVelocity).unwrap();
    assert!(omega[0].is_nan() && omega[9].is_nan());
    for w in &omega[1..9] {
        assert_close(*w, 6.0, 1e-6);
    }
    for v in &k.get(Quantity::TangentialVelocity).unwrap()[1..9] {
        assert_close(*v, 300.0, 1e-4);
    }
    for a in &k.get(Quantity::CentripetalAcceleration).unwrap()[1..9] {
        assert_close(*a, 1800.0, 1e-3);
    }
    assert_close(k.value(Quantity::TotalAngularDisplacement, 9).unwrap(), 1.8, 1e-9);
}

#[test]
fn angles_reported_in_degrees() {
    let cal = UniformCalibration {
        angle_unit: AngleUnit::Degrees,
        ..UniformCalibration::identity(FrameRate::FPS_30)
    };
    let traj = trajectory((0..8).map(|i| {
        let a = 0.1 * i as f64;
        Point2::new(30.0 * a.cos(), 30.0 * a.sin())
    }));
    let k = analyze_trajectory(&traj, &cal, &KinematicsConfig::default()).unwrap();

    assert_close(k.value(Quantity::AngularPosition, 3).unwrap(), 0.3f64.to_degrees(), 1e-6);
    assert_close(k.value(Quantity::AngularVelocity, 3).unwrap(), 3.0f64.to_degrees(), 1e-4);
    // Linear quantities are not affected by the angle unit.
    assert_close(k.value(Quantity::TangentialVelocity, 3).unwrap(), 90.0, 1e-4);
}

// ── Tracking to kinematics ─────────────────────────────────────

#[test]
fn tracked_marker_velocity() {
    let frame = |t: i64| {
        let cx = 60.0 + 3.0 * t as f32;
        GrayImage::from_fn(160, 120, move |x, y| {
            let (dx, dy) = (x as f32 - cx, y as f32 - 60.0);
            0.1 + 0.8 * (-(dx * dx + 2.0 * dy * dy) / 20.0).exp() + 0.002 * y as f32
        })
    };
    let frames: std::collections::BTreeMap<_, _> =
        (0..8).map(|t| (Timestamp::new(t), frame(t))).collect();

    let mut session = TrackingSession::start(
        CorrelationTracker::default(),
        Point2::new(60.0, 60.0),
        Timestamp::new(0),
        frames.get(&Timestamp::new(0)),
    );
    let matched = session.track_source(&frames, (1..8).map(Timestamp::new)).unwrap();
    assert_eq!(matched, 7);

    let cal = UniformCalibration::identity(FrameRate::FPS_30);
    let k = analyze_trajectory(session.trajectory(), &cal, &KinematicsConfig::default()).unwrap();
    for v in &k.get(Quantity::HorizontalVelocity).unwrap()[1..7] {
        assert_close(*v, 90.0, 3.0);
    }
    for v in &k.get(Quantity::VerticalVelocity).unwrap()[1..7] {
        assert_close(*v, 0.0, 3.0);
    }
}
