//! Shared deterministic types for the generation pipeline.
//!
//! These types define stable contracts between components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use serde::{Deserialize, Serialize};

use crate::core::template::PromptSpec;

/// One row of the BCT taxonomy.
///
/// `no` is the opaque code identifier used for table naming and labeling;
/// `label` and `definition` only feed prompt placeholder substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub no: String,
    pub label: String,
    pub definition: String,
}

/// Parameters for one generation call.
///
/// Built per orchestrator iteration and consumed immediately; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Instruction pair already specialized for `code`.
    pub prompt: PromptSpec,
    /// Taxonomy code the resulting messages are labeled with.
    pub code: String,
    /// Number of messages the generator must return. Always > 0.
    pub count: u32,
}

/// Final state of one code after the orchestrator processed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CodeStatus {
    /// Generation succeeded (possibly on the retry) and all rows were appended.
    Succeeded { rows: u32 },
    /// Both the call and its single retry failed; the code was skipped.
    Failed { error: String },
    /// Run state already recorded this code as complete (`--resume`).
    AlreadyDone,
}

/// Outcome of one taxonomy code within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeOutcome {
    pub code: String,
    #[serde(flatten)]
    pub status: CodeStatus,
}

/// Summary of a full generation run, one entry per taxonomy code in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Dataset (prompt configuration) name.
    pub dataset: String,
    /// Messages requested per code.
    pub count_per_code: u32,
    pub outcomes: Vec<CodeOutcome>,
}

impl RunReport {
    /// Codes that failed both attempts, in taxonomy order.
    pub fn failed_codes(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, CodeStatus::Failed { .. }))
            .map(|outcome| outcome.code.as_str())
            .collect()
    }

    /// Total rows appended during this run (excludes resumed codes).
    pub fn rows_written(&self) -> u32 {
        self.outcomes
            .iter()
            .map(|outcome| match outcome.status {
                CodeStatus::Succeeded { rows } => rows,
                _ => 0,
            })
            .sum()
    }
}
