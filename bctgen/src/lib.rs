//! Synthetic dataset generator for behavior-change messages.
//!
//! This crate generates a labeled dataset of short behavioral-change messages,
//! one CSV table per code of the BCT Taxonomy v1, by driving an external
//! text-generation command once per code. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (template parsing, response
//!   parsing, report types). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, process execution,
//!   configuration). Isolated to enable scripted doubles in tests.
//!
//! [`orchestrate`] coordinates core logic with I/O to implement the
//! `generate` CLI command.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod orchestrate;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
