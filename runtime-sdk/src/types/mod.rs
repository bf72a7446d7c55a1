//! Common types.
pub mod address;
pub mod token;
