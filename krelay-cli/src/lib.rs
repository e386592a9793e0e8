//! Support library for the krelay CLI binary.
//!
//! Exposes the CLI and logging modules so doctests and integration tests can
//! drive commands without forking a subprocess.

pub mod cli;
pub mod logging;
