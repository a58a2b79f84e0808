//! Integration test: running jobs off the calling thread.
//!
//! Threaded runs stream progress through a channel and hand the
//! instances back on join. Supervised processes speak the stdout
//! protocol and can be killed.

use dynsys_core::{ArgValue, RunError};
use dynsys_host::spawn_run;
use dynsys_models::{Linear, Portrait, Rk4};
use dynsys_test_utils::fixtures::Exploding;
use dynsys_test_utils::{job_factory, ode_factory, solver_factory, ROTATION};

#[test]
fn threaded_run_streams_progress_and_returns_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threaded.dat");
    let mut ode = ode_factory::<Linear>()
        .create([("n", ArgValue::Integer(2))])
        .unwrap();
    ode.set_p(&ROTATION).unwrap();
    ode.set_x(&[0.0, 1.0]).unwrap();
    let solver = solver_factory::<Rk4>()
        .create([("h_max", ArgValue::Real(0.01))])
        .unwrap();
    let job = job_factory::<Portrait>()
        .create([
            ("t_step", ArgValue::Real(0.05)),
            ("t_end", ArgValue::Real(1.0)),
            ("file", ArgValue::from(path.to_string_lossy().into_owned())),
        ])
        .unwrap();

    let run = spawn_run(job, ode, solver).unwrap();
    // The sender lives in the run thread; iteration ends when it returns.
    let seen: Vec<u8> = run.progress().iter().collect();
    let finished = run.join().unwrap();

    finished.result.unwrap();
    assert_eq!(seen, (0..=100).collect::<Vec<u8>>());
    assert_eq!(finished.ode.t(), 1.0);
    assert_eq!(finished.solver.name(), "rk4");
    assert!(path.is_file());
}

#[test]
fn threaded_failure_is_reported_on_join() {
    let dir = tempfile::tempdir().unwrap();
    let ode = ode_factory::<Exploding>()
        .create([("t_fail", ArgValue::Real(0.2))])
        .unwrap();
    let solver = solver_factory::<Rk4>()
        .create([("h_max", ArgValue::Real(0.01))])
        .unwrap();
    let job = job_factory::<Portrait>()
        .create([
            ("t_step", ArgValue::Real(0.1)),
            ("t_end", ArgValue::Real(1.0)),
            (
                "file",
                ArgValue::from(dir.path().join("x.dat").to_string_lossy().into_owned()),
            ),
        ])
        .unwrap();

    let run = spawn_run(job, ode, solver).unwrap();
    let seen: Vec<u8> = run.progress().iter().collect();
    let finished = run.join().unwrap();

    assert!(matches!(finished.result, Err(RunError::Numerical(_))));
    assert!(!seen.contains(&100));
    assert!(finished.ode.t() < 0.2 + 1e-9);
}

#[cfg(unix)]
mod process {
    use std::process::Command;
    use std::time::{Duration, Instant};

    use dynsys_host::{RunOutcome, SupervisedProcess};

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[test]
    fn full_report_with_success_is_completed() {
        let process =
            SupervisedProcess::spawn(sh("i=0; while [ $i -le 100 ]; do echo $i; i=$((i+1)); done"))
                .unwrap();
        let progress = process.progress().clone();
        assert_eq!(process.wait().unwrap(), RunOutcome::Completed);
        assert_eq!(progress.iter().count(), 101);
    }

    #[test]
    fn noise_is_ignored() {
        let process =
            SupervisedProcess::spawn(sh("echo 0; echo starting up; echo 50x; echo 100")).unwrap();
        let progress = process.progress().clone();
        assert_eq!(process.wait().unwrap(), RunOutcome::Completed);
        assert_eq!(progress.iter().collect::<Vec<_>>(), [0, 100]);
    }

    #[test]
    fn failure_exit_is_incomplete() {
        let process = SupervisedProcess::spawn(sh("echo 0; echo 42; exit 3")).unwrap();
        assert_eq!(
            process.wait().unwrap(),
            RunOutcome::Incomplete {
                exit_code: Some(3),
                last_progress: Some(42)
            }
        );
    }

    #[test]
    fn success_without_100_is_incomplete() {
        let process = SupervisedProcess::spawn(sh("echo 0; echo 99")).unwrap();
        assert_eq!(
            process.wait().unwrap(),
            RunOutcome::Incomplete {
                exit_code: Some(0),
                last_progress: Some(99)
            }
        );
    }

    #[test]
    fn cancel_kills_a_stuck_run() {
        let mut process = SupervisedProcess::spawn(sh("echo 0; exec sleep 30")).unwrap();
        let first = process
            .progress()
            .recv_timeout(Duration::from_secs(10))
            .unwrap();
        assert_eq!(first, 0);
        process.cancel().unwrap();
        assert_eq!(
            process.wait().unwrap(),
            RunOutcome::Cancelled {
                last_progress: Some(0)
            }
        );
    }

    #[test]
    fn stdout_held_by_a_grandchild_does_not_block_wait() {
        let process = SupervisedProcess::spawn(sh("echo 0; echo 100; sleep 5 &")).unwrap();
        let started = Instant::now();
        assert_eq!(process.wait().unwrap(), RunOutcome::Completed);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn dropping_an_unwaited_handle_kills_and_reaps_the_child() {
        let process = SupervisedProcess::spawn(sh("echo 0; exec sleep 30")).unwrap();
        process
            .progress()
            .recv_timeout(Duration::from_secs(10))
            .unwrap();
        let proc_entry = std::path::PathBuf::from(format!("/proc/{}", process.id()));
        assert!(proc_entry.exists());
        drop(process);
        assert!(!proc_entry.exists());
    }
}
