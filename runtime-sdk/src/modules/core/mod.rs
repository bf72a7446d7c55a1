//! Core definitions shared by all modules.
use thiserror::Error;

/// Unique module name.
pub const MODULE_NAME: &str = "core";

/// Errors emitted by the core module.
#[derive(Error, Debug, evm_runtime_sdk_macros::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    #[sdk_error(code = 1)]
    InvalidArgument(#[source] anyhow::Error),

    #[error("invalid method: {0}")]
    #[sdk_error(code = 2)]
    InvalidMethod(String),

    #[error("invariant violation: {0}")]
    #[sdk_error(code = 3)]
    InvariantViolation(String),
}
