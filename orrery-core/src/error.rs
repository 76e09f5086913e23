//! Error Types
//!
//! The build pass itself cannot fail: missing or dangling references are
//! absence, and the corresponding nodes are simply omitted. The only
//! fallible surface is the public entry point, which must be handed a
//! scene root that actually exists.

use thiserror::Error;

/// Errors produced when requesting a graph build.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// The requested scene root is not in the database.
    #[error("scene {name:?} not found in database")]
    SceneNotFound {
        /// The scene name that failed to resolve.
        name: String,
    },
}
