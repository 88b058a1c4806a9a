//! Pure, deterministic logic with no I/O.

pub mod response;
pub mod template;
pub mod types;
