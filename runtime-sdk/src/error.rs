//! Error types.

/// An error that gets propagated to the caller.
///
/// It extends `std::error::Error` with a codespace and error code so that errors can be matched
/// by callers independently of their message, the same way registered errors are matched on a
/// Cosmos chain (e.g. `sdk/5` for insufficient funds).
pub trait Error: std::error::Error {
    /// Codespace (usually the module name) that defines the error.
    fn codespace(&self) -> &str;

    /// Error code uniquely identifying the error within its codespace.
    fn code(&self) -> u32;
}
