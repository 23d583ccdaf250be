use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all modsort operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ModsortError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed configuration file.
    #[error("Config error: {message}")]
    #[diagnostic(help("Check ~/.modsort/config.toml for syntax errors"))]
    Config { message: String },

    /// A saved selection (modlist) could not be read or written.
    #[error("Selection error: {message}")]
    Selection { message: String },

    /// A source directory could not be scanned.
    #[error("Scan error: {message}")]
    Scan { message: String },

    /// Load order resolution did not produce a usable order.
    #[error("Load order resolution failed: {message}")]
    #[diagnostic(help("Run `modsort check` to list every finding"))]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type ModsortResult<T> = miette::Result<T>;
