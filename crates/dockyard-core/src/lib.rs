//! Dockyard core
//!
//! Manifest model, destination tags, build content hashes and run order.

pub mod error;
pub mod loader;
pub mod model;

pub use error::{ManifestError, Result};
pub use loader::{load_manifest, parse_manifest};
pub use model::*;
