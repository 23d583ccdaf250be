//! Shared utilities for modsort.
//!
//! This crate provides cross-cutting concerns used by all other modsort crates:
//! error types, filesystem helpers, and terminal status lines.

pub mod errors;
pub mod fs;
pub mod progress;
