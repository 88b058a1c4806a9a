//! I/O helpers for generation runs.

pub mod config;
pub mod generator;
pub mod layout;
pub mod process;
pub mod run_state;
pub mod table;
pub mod taxonomy;
