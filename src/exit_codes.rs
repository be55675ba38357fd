//! Exit code policy for cloak.
//!
#![allow(dead_code)] // Constants defined for policy documentation, used selectively
//!
//! ## Findings (0-1)
//!
//! - `0` = Success
//! - `1` = Completed with warnings (per-cell errors degraded to
//!   pass-through, or weak-uniqueness columns)
//!
//! ## Operational Failures (10+)
//!
//! Operational failures use codes >= 10 to distinguish from findings:
//! - `10` = General operational failure
//! - `11` = Vault unavailable
//! - `12` = Configuration error
//!
//! This separation allows automation to distinguish between:
//! - "The run had degraded cells" (findings, 1)
//! - "We couldn't run at all" (operational failure, 10+)

/// Exit code: success, nothing degraded
pub const SUCCESS: i32 = 0;

/// Exit code: completed, but some cells degraded or uniqueness weakened
pub const WARNING: i32 = 1;

/// Exit code: general operational failure
pub const OPERATIONAL_FAILURE: i32 = 10;

/// Exit code: vault unavailable
pub const VAULT_FAILURE: i32 = 11;

/// Exit code: configuration error
pub const CONFIG_ERROR: i32 = 12;

/// Exit code: interrupted by Ctrl+C (SIGINT)
pub const INTERRUPTED: i32 = 130;
