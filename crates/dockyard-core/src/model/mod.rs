//! Model definitions
//!
//! The manifest and service types consumed by the build orchestrator.

mod manifest;
mod service;

pub use manifest::*;
pub use service::*;
