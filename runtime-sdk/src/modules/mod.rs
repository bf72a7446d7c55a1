//! Modules included with the SDK.

pub mod auth;
pub mod bank;
pub mod core;
