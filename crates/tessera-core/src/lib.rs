//! Tessera Core
//!
//! Shared error type and strongly-typed identifiers for Tessera.
//! This crate has minimal dependencies so that every other crate in the
//! workspace can speak the same error vocabulary.

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::*;
