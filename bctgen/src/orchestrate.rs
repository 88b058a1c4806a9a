//! Per-code generation loop: request, retry once, append, checkpoint.
//!
//! Codes are processed sequentially in taxonomy order, one generation call in
//! flight at a time. Each code moves through
//! `Pending -> Requesting -> {Succeeded, Retrying -> {Succeeded, Failed}}`:
//! a [`GenerationError`] is retried exactly once immediately; if the retry
//! also fails the code is recorded as failed and the run moves on, so a single
//! bad code cannot block the remaining ~90 codes. Any other error (notably
//! persistence failures) aborts the run instead.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument, warn};

use crate::core::template::ParsedTemplate;
use crate::core::types::{
    CodeOutcome, CodeStatus, GenerationRequest, RunReport, TaxonomyEntry,
};
use crate::io::generator::{GenerationError, Generator};
use crate::io::layout::DatasetPaths;
use crate::io::run_state::{RunState, load_run_state, write_run_state};
use crate::io::table::DatasetTable;

/// Options for one `generate` invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Dataset (prompt configuration) name; selects the output directory.
    pub dataset: String,
    /// Messages to request per taxonomy code. Must be > 0.
    pub count: u32,
    /// Continue an interrupted run, skipping codes already recorded complete.
    /// A plain run resets the bookkeeping and processes every code again,
    /// appending to the existing tables.
    pub resume: bool,
}

/// Drive one full generation run over the taxonomy.
///
/// Returns the explicit per-code outcome list rather than logging outcomes as
/// side effects, so callers can report failed codes and choose an exit code.
#[instrument(skip_all, fields(dataset = %options.dataset, codes = taxonomy.len(), count = options.count))]
pub fn run_generation<G: Generator>(
    data_dir: &Path,
    generator: &G,
    template: &ParsedTemplate,
    taxonomy: &[TaxonomyEntry],
    options: &RunOptions,
) -> Result<RunReport> {
    if options.count == 0 {
        return Err(anyhow!("count must be > 0"));
    }
    if taxonomy.is_empty() {
        return Err(anyhow!("taxonomy has no codes"));
    }

    let paths = DatasetPaths::new(data_dir, &options.dataset);
    let mut state = if options.resume {
        load_run_state(&paths.run_state_path)?
    } else {
        RunState::default()
    };
    if !options.resume {
        // Reset bookkeeping up front so an interrupted fresh run resumes
        // from this run's progress, not a previous run's.
        write_run_state(&paths.run_state_path, &state)?;
    }

    info!(resume = options.resume, "starting generation run");
    let mut outcomes = Vec::with_capacity(taxonomy.len());
    for entry in taxonomy {
        if state.is_completed(&entry.no) {
            info!(code = %entry.no, "already complete, skipping");
            outcomes.push(CodeOutcome {
                code: entry.no.clone(),
                status: CodeStatus::AlreadyDone,
            });
            continue;
        }

        let request = GenerationRequest {
            prompt: template.spec.for_code(entry, options.count),
            code: entry.no.clone(),
            count: options.count,
        };

        let status = match generate_with_retry(generator, &request)? {
            Ok(messages) => {
                let rows = persist_messages(&paths, &entry.no, &messages)?;
                state.mark_completed(&entry.no);
                write_run_state(&paths.run_state_path, &state)
                    .context("record completed code")?;
                info!(code = %entry.no, rows, "code complete");
                CodeStatus::Succeeded { rows }
            }
            Err(failure) => {
                warn!(code = %entry.no, error = %failure.detail, "code failed after retry, skipping");
                CodeStatus::Failed {
                    error: failure.detail,
                }
            }
        };
        outcomes.push(CodeOutcome {
            code: entry.no.clone(),
            status,
        });
    }

    Ok(RunReport {
        dataset: options.dataset.clone(),
        count_per_code: options.count,
        outcomes,
    })
}

/// Call the generator, retrying exactly once on a transient failure.
///
/// The outer `Result` carries fatal errors; the inner one reports the
/// retry-exhausted failure for this code only.
fn generate_with_retry<G: Generator>(
    generator: &G,
    request: &GenerationRequest,
) -> Result<Result<Vec<String>, GenerationError>> {
    match generator.generate(request) {
        Ok(messages) => Ok(Ok(messages)),
        Err(err) => {
            let Some(first) = err.downcast_ref::<GenerationError>().cloned() else {
                return Err(err);
            };
            info!(code = %request.code, error = %first.detail, "generation failed, retrying once");
            match generator.generate(request) {
                Ok(messages) => Ok(Ok(messages)),
                Err(err) => match err.downcast_ref::<GenerationError>().cloned() {
                    Some(second) => Ok(Err(second)),
                    None => Err(err),
                },
            }
        }
    }
}

/// Append all messages for one code and flush before returning.
fn persist_messages(paths: &DatasetPaths, code: &str, messages: &[String]) -> Result<u32> {
    let mut table = DatasetTable::open(&paths.dir, code)?;
    for message in messages {
        table.append(message)?;
    }
    table.close()?;
    Ok(messages.len() as u32)
}
