use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::error::{AdapterError, AdapterResult};

/// Exit code reported for a call that hit its wall-clock bound.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

const TERM_GRACE: Duration = Duration::from_secs(2);

/// A fully assembled command line plus its per-call environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub timeout: Duration,
    pub label: String,
}

/// Result of exactly one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ExecutionOutcome {
    pub fn timed_out(&self) -> bool {
        !self.success && self.exit_code == TIMEOUT_EXIT_CODE
    }

    /// stdout followed by stderr, newline separated when both are present.
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        if !self.stderr.trim().is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }

    pub fn failure(&self) -> Option<AdapterError> {
        if self.success {
            None
        } else if self.timed_out() {
            Some(AdapterError::Timeout {
                secs: self.duration.as_secs(),
            })
        } else {
            Some(AdapterError::NonZeroExit {
                code: self.exit_code,
            })
        }
    }
}

struct Pipes {
    stdout: Receiver<String>,
    stderr: Receiver<String>,
}

fn read_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            let _ = p.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

impl Pipes {
    fn take(child: &mut Child) -> Self {
        Self {
            stdout: read_pipe(child.stdout.take()),
            stderr: read_pipe(child.stderr.take()),
        }
    }

    /// Both streams, or `None` when a writer still holds a pipe at `deadline`.
    fn collect_by(&self, deadline: Instant) -> Option<(String, String)> {
        let left = || deadline.saturating_duration_since(Instant::now());
        let stdout = self.stdout.recv_timeout(left()).ok()?;
        let stderr = self.stderr.recv_timeout(left()).ok()?;
        Some((stdout, stderr))
    }

    fn settle(&self, grace: Duration) -> bool {
        let until = Instant::now() + grace;
        let done = |rx: &Receiver<String>| {
            !matches!(
                rx.recv_timeout(until.saturating_duration_since(Instant::now())),
                Err(RecvTimeoutError::Timeout)
            )
        };
        done(&self.stdout) && done(&self.stderr)
    }
}

#[cfg(unix)]
fn signal_group(pgid: u32, sig: libc::c_int) {
    // SAFETY: plain kill(2) on the process group we created at spawn.
    unsafe {
        libc::kill(-(pgid as libc::pid_t), sig);
    }
}

/// Stops whatever is left of the group once the direct child is gone.
#[cfg(unix)]
fn stop_group(pgid: u32, pipes: &Pipes) {
    signal_group(pgid, libc::SIGTERM);
    if !pipes.settle(TERM_GRACE) {
        signal_group(pgid, libc::SIGKILL);
        pipes.settle(TERM_GRACE);
    }
}

#[cfg(not(unix))]
fn stop_group(_pgid: u32, pipes: &Pipes) {
    pipes.settle(TERM_GRACE);
}

#[cfg(unix)]
fn terminate(child: &mut Child, pipes: &Pipes) {
    let pgid = child.id();
    signal_group(pgid, libc::SIGTERM);
    if !matches!(child.wait_timeout(TERM_GRACE), Ok(Some(_))) {
        let _ = child.kill();
        let _ = child.wait();
    }
    stop_group(pgid, pipes);
}

#[cfg(not(unix))]
fn terminate(child: &mut Child, pipes: &Pipes) {
    let _ = child.kill();
    let _ = child.wait();
    pipes.settle(TERM_GRACE);
}

fn build_command(inv: &Invocation) -> AdapterResult<Command> {
    let (program, args) = inv
        .argv
        .split_first()
        .ok_or_else(|| AdapterError::invalid("empty argv"))?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in &inv.envs {
        cmd.env(k, v);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    Ok(cmd)
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

fn timed_out(inv: &Invocation, started: Instant) -> ExecutionOutcome {
    ExecutionOutcome {
        success: false,
        stdout: String::new(),
        stderr: format!("{} timed out after {}s", inv.label, inv.timeout.as_secs()),
        exit_code: TIMEOUT_EXIT_CODE,
        duration: started.elapsed(),
    }
}

/// Runs `inv` to completion or until its timeout, whichever comes first.
///
/// The bound covers the output pipes too: a background process that keeps
/// them open past the deadline counts as a timeout, and the whole process
/// group is stopped. A timeout is not an error: it yields a failed outcome
/// with exit code [`TIMEOUT_EXIT_CODE`] and a synthesized stderr. Only a
/// process that could not be started or waited on is reported as `Err`.
pub fn run_with_timeout(inv: &Invocation) -> AdapterResult<ExecutionOutcome> {
    let mut cmd = build_command(inv)?;
    let started = Instant::now();
    let deadline = started + inv.timeout;
    let mut child = cmd
        .spawn()
        .map_err(|e| AdapterError::Spawn(format!("{}: {e}", inv.label)))?;
    let pgid = child.id();
    let pipes = Pipes::take(&mut child);

    let status = match child.wait_timeout(inv.timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            terminate(&mut child, &pipes);
            return Ok(timed_out(inv, started));
        }
        Err(e) => {
            terminate(&mut child, &pipes);
            return Err(AdapterError::Spawn(format!(
                "{} wait failed: {e}",
                inv.label
            )));
        }
    };
    let Some((stdout, stderr)) = pipes.collect_by(deadline) else {
        stop_group(pgid, &pipes);
        return Ok(timed_out(inv, started));
    };
    let code = exit_code(status);
    Ok(ExecutionOutcome {
        success: code == 0,
        stdout,
        stderr,
        exit_code: code,
        duration: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, timeout_secs: u64) -> Invocation {
        Invocation {
            argv: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            envs: vec![("AUTOLOCAL_PROBE".to_string(), "on".to_string())],
            timeout: Duration::from_secs(timeout_secs),
            label: "sh".to_string(),
        }
    }

    #[test]
    fn captures_streams_and_exit_code() {
        let out = run_with_timeout(&sh("echo out; echo err >&2; exit 3", 10)).expect("run");
        assert!(!out.success);
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert_eq!(out.failure(), Some(AdapterError::NonZeroExit { code: 3 }));
    }

    #[test]
    fn env_overrides_reach_the_child_only() {
        let out = run_with_timeout(&sh("printf %s \"$AUTOLOCAL_PROBE\"", 10)).expect("run");
        assert!(out.success);
        assert_eq!(out.stdout, "on");
        assert!(std::env::var("AUTOLOCAL_PROBE").is_err());
    }

    #[test]
    fn timeout_yields_sentinel_outcome_near_the_bound() {
        let out = run_with_timeout(&sh("sleep 5", 1)).expect("run");
        assert!(out.timed_out());
        assert_eq!(out.exit_code, TIMEOUT_EXIT_CODE);
        assert!(out.stderr.contains("timed out after 1s"), "{}", out.stderr);
        assert!(out.duration >= Duration::from_secs(1));
        assert!(out.duration < Duration::from_secs(4), "{:?}", out.duration);
        assert!(matches!(out.failure(), Some(AdapterError::Timeout { .. })));
    }

    #[test]
    fn background_writer_holding_pipes_counts_as_timeout() {
        let out = run_with_timeout(&sh("sleep 6 & echo '[1]'", 1)).expect("run");
        assert!(out.timed_out(), "{out:?}");
        assert_eq!(out.stdout, "");
        assert!(out.duration < Duration::from_secs(4), "{:?}", out.duration);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let inv = Invocation {
            argv: vec!["/nonexistent/autolocal-wp".to_string()],
            envs: Vec::new(),
            timeout: Duration::from_secs(1),
            label: "wp".to_string(),
        };
        assert!(matches!(run_with_timeout(&inv), Err(AdapterError::Spawn(_))));
    }

    #[test]
    fn combined_text_appends_stderr_on_new_line() {
        let out = ExecutionOutcome {
            success: true,
            stdout: "[1]".to_string(),
            stderr: "Warning: x".to_string(),
            exit_code: 0,
            duration: Duration::ZERO,
        };
        assert_eq!(out.combined(), "[1]\nWarning: x");
    }
}
