//! Integration test: the `portrait` driver over `linear` + `rk4`.
//!
//! A successful run reports every integer from 0 to 100 exactly once
//! and writes one record per reporting boundary. A failing run stops
//! short of 100 and leaves the artifact partially written.

use std::fs;
use std::path::Path;

use dynsys_core::{ArgValue, RunError};
use dynsys_host::{Job, Ode, RecordingProgress, Solver};
use dynsys_models::{Dopri5, Linear, Portrait, Rk4};
use dynsys_test_utils::fixtures::{Exploding, Liar, Panicking, Stalling};
use dynsys_test_utils::{job_factory, ode_factory, solver_factory, ROTATION};

fn rotation() -> Ode {
    let mut ode = ode_factory::<Linear>()
        .create([("n", ArgValue::Integer(2))])
        .unwrap();
    ode.set_p(&ROTATION).unwrap();
    ode.set_x(&[0.0, 1.0]).unwrap();
    ode
}

fn rk4(h_max: f64) -> Solver {
    solver_factory::<Rk4>()
        .create([("h_max", ArgValue::Real(h_max))])
        .unwrap()
}

fn portrait(t_step: f64, t_end: f64, file: &Path) -> Job {
    job_factory::<Portrait>()
        .create([
            ("t_step", ArgValue::Real(t_step)),
            ("t_end", ArgValue::Real(t_end)),
            ("file", ArgValue::from(file.to_string_lossy().into_owned())),
        ])
        .unwrap()
}

fn parse_records(text: &str) -> Vec<Vec<f64>> {
    text.lines()
        .skip(1)
        .map(|line| line.split(' ').map(|v| v.parse().unwrap()).collect())
        .collect()
}

#[test]
fn progress_is_every_integer_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotation.dat");
    let mut ode = rotation();
    let mut progress = RecordingProgress::new();

    portrait(0.01, 1.0, &path)
        .run(&mut ode, &mut rk4(0.01), &mut progress)
        .unwrap();

    let expected: Vec<u8> = (0..=100).collect();
    assert_eq!(progress.values(), &expected[..]);
    assert_eq!(ode.t(), 1.0);
}

#[test]
fn artifact_holds_header_and_trajectory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotation.dat");
    let mut ode = rotation();

    portrait(0.25, 2.0, &path)
        .run(&mut ode, &mut rk4(0.01), &mut RecordingProgress::new())
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().next(), Some("t x[0] x[1]"));
    let records = parse_records(&text);
    assert_eq!(records.len(), 9);
    for (k, record) in records.iter().enumerate() {
        let t = 0.25 * k as f64;
        assert_eq!(record.len(), 3);
        assert!((record[0] - t).abs() < 1e-6, "t = {}", record[0]);
        assert!((record[1] - t.sin()).abs() < 2e-6, "x0 at {t}: {}", record[1]);
        assert!((record[2] - t.cos()).abs() < 2e-6, "x1 at {t}: {}", record[2]);
    }
}

#[test]
fn half_step_portrait_of_a_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portrait.txt");
    let mut ode = rotation();
    let mut progress = RecordingProgress::new();

    portrait(0.5, 1.0, &path)
        .run(&mut ode, &mut rk4(0.01), &mut progress)
        .unwrap();

    let expected: Vec<u8> = (0..=100).collect();
    assert_eq!(progress.values(), &expected[..]);

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().next(), Some("t x[0] x[1]"));
    let records = parse_records(&text);
    let times: Vec<f64> = records.iter().map(|r| r[0]).collect();
    assert_eq!(times, [0.0, 0.5, 1.0]);

    assert_eq!(ode.t(), 1.0);
    assert!((ode.x()[0] - 1f64.sin()).abs() < 1e-8, "{:?}", ode.x());
    assert!((ode.x()[1] - 1f64.cos()).abs() < 1e-8, "{:?}", ode.x());
}

#[cfg(target_os = "linux")]
#[test]
fn full_device_fails_before_reporting_100() {
    let mut progress = RecordingProgress::new();
    let err = portrait(0.5, 1.0, Path::new("/dev/full"))
        .run(&mut rotation(), &mut rk4(0.01), &mut progress)
        .unwrap_err();
    assert!(matches!(err, RunError::Io { .. }), "{err:?}");
    assert!(!progress.values().contains(&100), "{:?}", progress.values());
}

#[test]
fn run_starts_from_current_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.dat");
    let mut ode = rotation();
    ode.set_t(0.5);
    let mut progress = RecordingProgress::new();

    portrait(0.1, 1.0, &path)
        .run(&mut ode, &mut rk4(0.01), &mut progress)
        .unwrap();

    let records = parse_records(&fs::read_to_string(&path).unwrap());
    assert_eq!(records.first().map(|r| r[0]), Some(0.5));
    assert_eq!(records.last().map(|r| r[0]), Some(1.0));
    assert_eq!(records.len(), 6);
    assert_eq!(progress.values().len(), 101);
}

#[test]
fn adaptive_solver_reports_the_same_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dopri5.dat");
    let mut ode = rotation();
    let mut solver = solver_factory::<Dopri5>()
        .create([("h_max", ArgValue::Real(0.5)), ("eps", ArgValue::Real(1e-8))])
        .unwrap();
    let mut progress = RecordingProgress::new();

    portrait(0.1, 1.0, &path)
        .run(&mut ode, &mut solver, &mut progress)
        .unwrap();

    let records = parse_records(&fs::read_to_string(&path).unwrap());
    let times: Vec<f64> = records.iter().map(|r| r[0]).collect();
    let expected: Vec<f64> = (0..=10).map(|k| k as f64 / 10.0).collect();
    assert_eq!(times, expected);
    assert_eq!(progress.values().last(), Some(&100));
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn non_finite_state_fails_without_completing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exploding.dat");
    let mut ode = ode_factory::<Exploding>()
        .create([("t_fail", ArgValue::Real(0.5))])
        .unwrap();
    let mut progress = RecordingProgress::new();

    let err = portrait(0.1, 1.0, &path)
        .run(&mut ode, &mut rk4(0.01), &mut progress)
        .unwrap_err();

    assert!(matches!(err, RunError::Numerical(_)), "{err:?}");
    assert!(!progress.values().contains(&100));
    assert_eq!(progress.values().first(), Some(&0));

    // Records up to the failing interval were flushed on drop.
    let records = parse_records(&fs::read_to_string(&path).unwrap());
    assert!(records.len() >= 2 && records.len() < 11, "{}", records.len());
    assert!(records.iter().all(|r| r[0] <= 0.5 + 1e-9));
}

#[test]
fn stalled_solver_hits_step_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stalled.dat");
    let mut stalling = solver_factory::<Stalling>()
        .create(Vec::<(String, ArgValue)>::new())
        .unwrap();

    let err = portrait(0.1, 1.0, &path)
        .run(&mut rotation(), &mut stalling, &mut RecordingProgress::new())
        .unwrap_err();

    let RunError::StepLimit { reason } = err else {
        panic!("expected step limit, got {err:?}");
    };
    assert!(reason.contains("no progress at t = 0"), "{reason}");
}

#[test]
fn short_report_is_a_protocol_error() {
    let liar = job_factory::<Liar>()
        .create([("lie", ArgValue::from("short"))])
        .unwrap();
    let mut progress = RecordingProgress::new();
    let err = liar
        .run(&mut rotation(), &mut rk4(0.01), &mut progress)
        .unwrap_err();
    assert!(matches!(err, RunError::Protocol { .. }), "{err:?}");
    assert_eq!(progress.values().last(), Some(&50));
}

#[test]
fn overflow_and_regression_are_protocol_errors() {
    for lie in ["overflow", "backwards"] {
        let liar = job_factory::<Liar>()
            .create([("lie", ArgValue::from(lie))])
            .unwrap();
        let mut progress = RecordingProgress::new();
        let err = liar
            .run(&mut rotation(), &mut rk4(0.01), &mut progress)
            .unwrap_err();
        assert!(matches!(err, RunError::Protocol { .. }), "{lie}: {err:?}");
        // The offending value never reaches the sink.
        assert!(progress.values().iter().all(|&p| p <= 100));
        assert!(progress.values().windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn driver_panic_is_contained() {
    let job = job_factory::<Panicking>()
        .create(Vec::<(String, ArgValue)>::new())
        .unwrap();
    let err = job
        .run(&mut rotation(), &mut rk4(0.01), &mut RecordingProgress::new())
        .unwrap_err();
    let RunError::Plugin { code, reason } = err else {
        panic!("expected plugin failure, got {err:?}");
    };
    assert_eq!(code, dynsys_abi::DsStatus::Panicked as i32);
    assert!(reason.contains("driver gave up"), "{reason}");
}
