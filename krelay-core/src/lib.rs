//! krelay core library.
//!
//! Holds everything the `krelay` dispatcher needs beyond argument handling:
//! the KAST JSON model and readers, the coverage-log rule pipeline
//! (instrumentation stripping, minimization, pretty printing), module import
//! graphs, and subprocess invocation of the toolchain executables.

pub mod coverage;
mod error;
pub mod graph;
pub mod kast;
pub mod minimize;
pub mod pretty;
pub mod toolchain;

pub use crate::{
    error::{KastError, KastErrorCode, Result, ToolchainError, ToolchainErrorCode},
    kast::{KDefinition, KInner, KRule},
    pretty::SymbolTable,
    toolchain::{KTool, ProcessOutput, ToolInvocation, Toolchain},
};
