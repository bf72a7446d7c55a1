//! EVM runtime SDK.
//!
//! State, storage, events and the native auth and bank modules that chain modules are built on.
#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod logger;
pub mod module;
pub mod modules;
pub mod state;
pub mod storage;
pub mod testing;
pub mod types;

pub use cbor;
pub use evm_runtime_sdk_macros::*;

pub use crate::{
    module::{InvariantRegistry, MethodRegistry},
    state::State,
};
