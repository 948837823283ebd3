//! # Craftbook Calc
//!
//! Recipe-tree resolution and shopping-list aggregation for Craftbook.
//!
//! This crate implements the calculator core consumed by the surrounding
//! services:
//! - Recipe and tag data model with JSON ingestion
//! - Immutable recipe book with the by-result index
//! - Ingredient normalization with recursive tag expansion
//! - Recipe tree construction with cycle containment and efficiency scoring
//! - Shopping list aggregation with leftover accounting
//!
//! The calculator is synchronous and side-effect free: a [`book::RecipeBook`]
//! is built once per game version by the data-loading layer, then any number
//! of resolution or aggregation calls may run against it concurrently.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod book;
pub mod normalize;
pub mod recipe;
pub mod shopping;
pub mod tree;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::book::*;
    pub use crate::normalize::*;
    pub use crate::recipe::*;
    pub use crate::shopping::*;
    pub use crate::tree::*;
}

pub use prelude::*;
