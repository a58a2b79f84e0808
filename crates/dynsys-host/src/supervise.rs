//! Running jobs where they can be watched and, for processes, killed.
//!
//! A job's run blocks and has no cancellation point. [`spawn_run`]
//! moves a run onto its own thread so the caller can watch progress;
//! [`SupervisedProcess`] runs a job binary as a child process, reads
//! the progress protocol from its stdout, and can kill it.

use std::fmt;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use dynsys_abi::DsStatus;
use dynsys_core::RunError;
use tracing::{debug, warn};

use crate::job::Job;
use crate::ode::Ode;
use crate::progress::{parse_progress_line, ChannelProgress, ProgressLog};
use crate::solver::Solver;

// ── Threads ─────────────────────────────────────────────────────

/// Instances handed back by [`ThreadedRun::join`].
#[derive(Debug)]
pub struct FinishedRun {
    /// The ODE, in whatever state the run left it.
    pub ode: Ode,
    /// The solver.
    pub solver: Solver,
    /// Outcome of the run.
    pub result: Result<(), RunError>,
}

/// A run executing on a dedicated thread.
///
/// The thread owns the instances, so nothing else can drive them
/// meanwhile. It cannot be cancelled; only processes can.
pub struct ThreadedRun {
    handle: JoinHandle<FinishedRun>,
    progress: Receiver<u8>,
}

/// Start `job` on a new thread, moving the instances in.
pub fn spawn_run(job: Job, mut ode: Ode, mut solver: Solver) -> io::Result<ThreadedRun> {
    let (mut sink, progress) = ChannelProgress::unbounded();
    let handle = thread::Builder::new()
        .name(format!("dynsys-run-{}", job.name()))
        .spawn(move || {
            let result = job.run(&mut ode, &mut solver, &mut sink);
            FinishedRun {
                ode,
                solver,
                result,
            }
        })?;
    Ok(ThreadedRun { handle, progress })
}

impl ThreadedRun {
    /// Progress values as the run emits them. Disconnects when the
    /// run ends.
    pub fn progress(&self) -> &Receiver<u8> {
        &self.progress
    }

    /// `true` once the thread has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run and take the instances back.
    ///
    /// # Errors
    ///
    /// [`RunError::Plugin`] with the `Panicked` code if the run thread
    /// itself panicked; the instances are lost in that case.
    pub fn join(self) -> Result<FinishedRun, RunError> {
        self.handle.join().map_err(|_| RunError::Plugin {
            code: DsStatus::Panicked as i32,
            reason: "run thread panicked".into(),
        })
    }
}

impl fmt::Debug for ThreadedRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedRun")
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

// ── Processes ───────────────────────────────────────────────────

/// How a supervised process ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Exited successfully after reporting `100`.
    Completed,
    /// Exited without both a success status and a `100`.
    Incomplete {
        /// Exit code, `None` if killed by a signal.
        exit_code: Option<i32>,
        /// Last progress value seen.
        last_progress: Option<u8>,
    },
    /// Killed by [`SupervisedProcess::cancel`]. Any artifact may be
    /// partially written.
    Cancelled {
        /// Last progress value seen.
        last_progress: Option<u8>,
    },
}

impl RunOutcome {
    fn classify(status: ExitStatus, log: &ProgressLog, cancelled: bool) -> Self {
        if cancelled && !(status.success() && log.completed()) {
            return Self::Cancelled {
                last_progress: log.last(),
            };
        }
        if status.success() && log.completed() {
            Self::Completed
        } else {
            Self::Incomplete {
                exit_code: status.code(),
                last_progress: log.last(),
            }
        }
    }
}

/// How long [`SupervisedProcess::wait`] lets the progress reader drain
/// after the child exits. A grandchild holding stdout open would
/// otherwise block the wait forever.
const READER_GRACE: Duration = Duration::from_secs(1);

/// A job running in a child process that speaks the progress protocol
/// on stdout.
///
/// Dropping a handle that was never waited on kills and reaps the child.
#[derive(Debug)]
pub struct SupervisedProcess {
    child: Child,
    progress: Receiver<u8>,
    log: Arc<Mutex<ProgressLog>>,
    reader: Option<JoinHandle<()>>,
    cancelled: bool,
    reaped: bool,
}

impl SupervisedProcess {
    /// Spawn `command` with stdout captured.
    pub fn spawn(mut command: Command) -> io::Result<Self> {
        let mut child = command.stdout(Stdio::piped()).spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
        let (tx, progress) = crossbeam_channel::unbounded();
        let log = Arc::new(Mutex::new(ProgressLog::new()));
        let shared = Arc::clone(&log);
        let pid = child.id();
        let reader = thread::Builder::new()
            .name(format!("dynsys-progress-{pid}"))
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            debug!(pid, error = %e, "progress stream closed");
                            break;
                        }
                    };
                    let Some(percent) = parse_progress_line(&line) else {
                        debug!(pid, %line, "ignoring non-progress output");
                        continue;
                    };
                    let mut log = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if log.record(percent) {
                        let _ = tx.send(percent);
                    } else {
                        warn!(pid, percent, last = ?log.last(), "out-of-order progress ignored");
                    }
                }
            });
        let reader = match reader {
            Ok(reader) => reader,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };
        Ok(Self {
            child,
            progress,
            log,
            reader: Some(reader),
            cancelled: false,
            reaped: false,
        })
    }

    /// OS process id.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Accepted progress values as they arrive.
    pub fn progress(&self) -> &Receiver<u8> {
        &self.progress
    }

    /// Forcibly terminate the child.
    pub fn cancel(&mut self) -> io::Result<()> {
        self.cancelled = true;
        match self.child.kill() {
            Ok(()) => Ok(()),
            // Already exited.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Wait for the child to exit and classify the run.
    pub fn wait(mut self) -> io::Result<RunOutcome> {
        let status = self.child.wait()?;
        self.reaped = true;
        if let Some(reader) = self.reader.take() {
            let deadline = Instant::now() + READER_GRACE;
            while !reader.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            if reader.is_finished() {
                let _ = reader.join();
            } else {
                warn!(pid = self.child.id(), "stdout still open after exit; reader detached");
            }
        }
        let log = self
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let outcome = RunOutcome::classify(status, &log, self.cancelled);
        if outcome != RunOutcome::Completed {
            warn!(pid = self.child.id(), ?outcome, "supervised run did not complete");
        }
        Ok(outcome)
    }
}

impl Drop for SupervisedProcess {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        if let Ok(None) = self.child.try_wait() {
            debug!(pid = self.child.id(), "killing unwaited child");
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
