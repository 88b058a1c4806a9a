//! Child process driver for generation calls.
//!
//! One shape of invocation: pipe the prompt to stdin, wait with a timeout,
//! and capture stdout/stderr with a memory bound. The prompt is written from
//! its own thread while the readers drain the output pipes, so neither a
//! stdin-ignoring backend nor an output-heavy one can deadlock the call.

use std::io::{self, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured output of one generation command invocation.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn stdout_truncated_notice(&self, label: &str) -> String {
        if self.stdout_truncated > 0 {
            format!(
                "\n[{label} stdout truncated {} bytes]\n",
                self.stdout_truncated
            )
        } else {
            String::new()
        }
    }

    pub fn stderr_truncated_notice(&self, label: &str) -> String {
        if self.stderr_truncated > 0 {
            format!(
                "\n[{label} stderr truncated {} bytes]\n",
                self.stderr_truncated
            )
        } else {
            String::new()
        }
    }
}

/// Run a generation command: prompt on stdin, bounded stdout/stderr capture,
/// hard timeout.
///
/// A backend that exits or closes stdin without draining the prompt is not a
/// failure by itself; its exit status and stdout decide the outcome, so a
/// broken pipe on the prompt write is ignored. `output_limit_bytes` bounds the
/// bytes kept per stream; the rest is drained and counted, not stored.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_generation_command(
    mut cmd: Command,
    prompt: &[u8],
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<ProcessOutput> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning generation command");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(err = %err, "failed to spawn generation command");
            return Err(err).context("spawn generation command");
        }
    };

    let mut child_stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin was not piped"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let prompt = prompt.to_vec();
    let stdin_handle = thread::spawn(move || {
        if let Err(err) = child_stdin.write_all(&prompt) {
            if err.kind() == io::ErrorKind::BrokenPipe {
                debug!("generator closed stdin before the prompt was fully written");
            } else {
                warn!(err = %err, "failed to write prompt to generator stdin");
            }
        }
        // Dropping the handle closes the pipe and signals end of prompt.
    });
    let stdout_handle = thread::spawn(move || drain_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || drain_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for generator")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "generation command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill generator")?;
            child.wait().context("wait generator after kill")?
        }
    };

    let _ = stdin_handle.join();
    let (stdout, stdout_truncated) = join_reader(stdout_handle).context("collect stdout")?;
    let (stderr, stderr_truncated) = join_reader(stderr_handle).context("collect stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "generator output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "generation command finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    handle
        .join()
        .unwrap_or_else(|_| Err(anyhow!("output reader thread panicked")))
}

/// Read a stream to the end, keeping at most `limit` bytes.
///
/// Bytes beyond the limit are still drained (so the child never blocks on a
/// full pipe) and returned as a discard count.
fn drain_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut discarded = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read generator output")?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        let take = n.min(room);
        kept.extend_from_slice(&chunk[..take]);
        discarded += n - take;
    }

    Ok((kept, discarded))
}
