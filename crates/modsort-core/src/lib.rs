//! Core data types for modsort.
//!
//! This crate defines the values that flow through load order resolution:
//! mod identities, discovered mod records, diagnostic findings, the global
//! configuration, and the saved selection formats read and written by the
//! persistence layer.
//!
//! Nothing in here touches the constraint graph; that lives in
//! `modsort-resolver`.

pub mod config;
pub mod finding;
pub mod id;
pub mod record;
pub mod selection;

pub use finding::{Finding, FindingKind, MissingCause, Severity};
pub use id::ModId;
pub use record::{ModRecord, ModSource, Relation};
pub use selection::ActiveSelection;
