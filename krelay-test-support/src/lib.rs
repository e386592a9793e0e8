//! Shared test utilities used across krelay crates.

pub mod kast;
pub mod tracing;

#[cfg(unix)]
pub mod toolchain;
