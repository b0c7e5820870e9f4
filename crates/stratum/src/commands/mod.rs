//! Command implementations for the Stratum CLI
//!
//! Each command module handles the CLI interface and delegates to
//! stratum-config for the actual work.

pub mod check;
pub mod read;
