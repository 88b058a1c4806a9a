//! Stable exit codes for bctgen CLI commands.

/// Command succeeded and every code produced its rows.
pub const OK: i32 = 0;
/// Command failed due to invalid template/config/taxonomy or a persistence error.
pub const INVALID: i32 = 1;
/// `bctgen generate` finished but at least one code failed both attempts.
pub const PARTIAL: i32 = 2;
