//! Test-only helpers: scripted generators and taxonomy fixtures.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::types::{GenerationRequest, TaxonomyEntry};
use crate::io::generator::{GenerationError, Generator};

/// One scripted response for [`ScriptedGenerator`].
#[derive(Debug, Clone)]
pub enum ScriptedCall {
    /// Return these messages.
    Messages(Vec<String>),
    /// Fail with a retryable [`GenerationError`].
    Fail(String),
    /// Fail with a non-retryable error (aborts the run).
    Fatal(String),
}

/// Generator double that returns predetermined responses in order.
///
/// Running out of scripted responses is a test bug and panics.
pub struct ScriptedGenerator {
    script: RefCell<VecDeque<ScriptedCall>>,
    calls: Cell<u32>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<ScriptedCall>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: Cell::new(0),
        }
    }

    /// Number of generate calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>> {
        self.calls.set(self.calls.get() + 1);
        let call = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left for code {}", request.code));
        match call {
            ScriptedCall::Messages(messages) => Ok(messages),
            ScriptedCall::Fail(detail) => Err(anyhow!(GenerationError::new(detail))),
            ScriptedCall::Fatal(detail) => Err(anyhow!(detail)),
        }
    }
}

/// Owned message batch from string literals.
pub fn messages(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

/// Deterministic taxonomy entry keyed by its code.
pub fn entry(no: &str) -> TaxonomyEntry {
    TaxonomyEntry {
        no: no.to_string(),
        label: format!("{no} label"),
        definition: format!("{no} definition"),
    }
}
