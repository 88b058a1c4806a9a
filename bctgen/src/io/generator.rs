//! Generator abstraction for the external text-generation capability.
//!
//! The [`Generator`] trait decouples the orchestrator from the actual backend
//! (currently an LLM CLI driven as a child process). Tests use scripted
//! generators that return predetermined messages without spawning processes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::response::parse_messages;
use crate::core::types::GenerationRequest;
use crate::io::config::GeneratorConfig;
use crate::io::process::{ProcessOutput, run_generation_command};

/// The generation call errored, timed out, or returned a malformed batch.
///
/// Transient by contract: the orchestrator retries the call exactly once
/// before marking the code failed. Any error that is *not* downcastable to
/// this type aborts the whole run instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    pub detail: String,
}

impl GenerationError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "generation failed: {}", self.detail)
    }
}

impl std::error::Error for GenerationError {}

/// Abstraction over text-generation backends.
///
/// A successful call returns exactly `request.count` message strings.
pub trait Generator {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>>;
}

/// Generator that spawns a configured LLM command per call.
///
/// `{system_prompt}` and `{count}` are substituted into the command arguments,
/// the per-code user prompt is piped to stdin, and stdout is parsed as a
/// numbered list. Each call writes a process log under `logs_dir`.
pub struct CommandGenerator {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
    logs_dir: PathBuf,
}

impl CommandGenerator {
    pub fn new(config: &GeneratorConfig, logs_dir: PathBuf) -> Self {
        Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            output_limit_bytes: config.output_limit_bytes,
            logs_dir,
        }
    }

    fn build_command(&self, request: &GenerationRequest) -> Command {
        let mut cmd = Command::new(&self.command[0]);
        for arg in &self.command[1..] {
            let arg = arg
                .replace("{system_prompt}", &request.prompt.system)
                .replace("{count}", &request.count.to_string());
            cmd.arg(arg);
        }
        cmd
    }
}

impl Generator for CommandGenerator {
    #[instrument(skip_all, fields(code = %request.code, count = request.count))]
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>> {
        info!(command = %self.command[0], "starting generation call");

        let cmd = self.build_command(request);
        let output = run_generation_command(
            cmd,
            request.prompt.user.as_bytes(),
            self.timeout,
            self.output_limit_bytes,
        )
        // Spawn failures (missing binary) count as transient service errors,
        // not run-fatal ones, so the retry-then-skip policy applies.
        .map_err(|err| anyhow!(GenerationError::new(format!("{err:#}"))))?;

        write_generator_log(
            &self.logs_dir.join(format!("{}.log", request.code)),
            &output,
            self.output_limit_bytes,
        )?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "generation timed out");
            return Err(anyhow!(GenerationError::new(format!(
                "timed out after {:?}",
                self.timeout
            ))));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "generation command failed");
            return Err(anyhow!(GenerationError::new(format!(
                "command exited with status {:?}",
                output.status.code()
            ))));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let messages = parse_messages(&stdout);
        if messages.len() != request.count as usize {
            warn!(
                expected = request.count,
                got = messages.len(),
                "wrong number of messages in response"
            );
            return Err(anyhow!(GenerationError::new(format!(
                "expected {} messages, got {}",
                request.count,
                messages.len()
            ))));
        }

        debug!(messages = messages.len(), "generation call completed");
        Ok(messages)
    }
}

fn write_generator_log(path: &Path, output: &ProcessOutput, output_limit: usize) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create generator log dir {}", parent.display()))?;
    }
    let mut buf = String::new();
    buf.push_str("=== stdout ===\n");
    buf.push_str(&String::from_utf8_lossy(&output.stdout));
    buf.push_str(&output.stdout_truncated_notice("generator"));
    buf.push_str("\n=== stderr ===\n");
    buf.push_str(&String::from_utf8_lossy(&output.stderr));
    buf.push_str(&output.stderr_truncated_notice("generator"));
    if output.timed_out {
        buf.push_str("\n[generator timed out]\n");
    }

    if buf.len() > output_limit {
        // The lossy-decoded output can place a multibyte char across the
        // limit; cut on a char boundary so the slice stays valid.
        let mut cut = output_limit;
        while !buf.is_char_boundary(cut) {
            cut -= 1;
        }
        let truncated = format!(
            "{}\n[truncated {} bytes]\n",
            &buf[..cut],
            buf.len() - cut
        );
        fs::write(path, truncated)
            .with_context(|| format!("write generator log {}", path.display()))?;
        return Ok(());
    }

    fs::write(path, buf).with_context(|| format!("write generator log {}", path.display()))
}
