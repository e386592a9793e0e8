//! Error types for the krelay core library.
//!
//! Defines error enums exposed by the public API, their stable machine-readable
//! codes, and a convenient result alias.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Error produced while reading or transforming KAST terms.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KastError {
    /// Reading or writing a KAST artefact failed.
    #[error("failed to access `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The file did not contain a well-formed KAST JSON document.
    #[error("`{path}` is not valid KAST JSON: {source}")]
    Json {
        /// Path of the malformed document.
        path: PathBuf,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// The document decoded, but its term had the wrong node type.
    #[error("`{path}` holds a `{found}` term where a `{expected}` was expected")]
    UnexpectedNode {
        /// Path of the offending document.
        path: PathBuf,
        /// Node type the caller asked for.
        expected: &'static str,
        /// Node type actually present.
        found: String,
    },
    /// No rule in the definition carries the requested identifier.
    #[error("no rule with id `{id}` in definition")]
    RuleNotFound {
        /// Identifier that was looked up.
        id: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`KastError`] variants.
    enum KastErrorCode for KastError {
        /// Reading or writing a KAST artefact failed.
        Io => Io { .. } => "KAST_IO",
        /// The file did not contain a well-formed KAST JSON document.
        Json => Json { .. } => "KAST_INVALID_JSON",
        /// The document decoded, but its term had the wrong node type.
        UnexpectedNode => UnexpectedNode { .. } => "KAST_UNEXPECTED_NODE",
        /// No rule in the definition carries the requested identifier.
        RuleNotFound => RuleNotFound { .. } => "KAST_RULE_NOT_FOUND",
    }
}

/// Error produced while invoking a toolchain executable.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The executable could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Executable that failed to start.
        program: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}

define_error_codes! {
    /// Stable codes describing [`ToolchainError`] variants.
    enum ToolchainErrorCode for ToolchainError {
        /// The executable could not be started.
        Spawn => Spawn { .. } => "TOOLCHAIN_SPAWN_FAILED",
    }
}

/// Convenient alias for results returned by the KAST API.
pub type Result<T> = core::result::Result<T, KastError>;
