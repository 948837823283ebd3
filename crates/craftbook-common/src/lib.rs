//! # Craftbook Common
//!
//! Common types and utilities shared across the Craftbook crates.
//!
//! This crate provides foundational types used by the calculator and the
//! surrounding services:
//! - Namespaced item and tag name handling
//! - Game version labels for table bundles
//! - The requested-item model handed over by the request-parsing layer
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod names;
pub mod request;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::names::*;
    pub use crate::request::*;
    pub use crate::version::*;
}

pub use prelude::*;
